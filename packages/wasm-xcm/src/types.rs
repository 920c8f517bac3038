//! Shared types for cross-chain transfers

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Chain name as used in the registry (e.g. "Acala", "AssetHubPolkadot")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chain(pub String);

impl Chain {
    pub fn new(name: impl Into<String>) -> Self {
        Chain(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Chain {
    fn from(s: &str) -> Self {
        Chain(s.to_string())
    }
}

/// XCM protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Version {
    V3,
    V4,
    V5,
}

impl Version {
    /// Variant name used in versioned wrappers ("V3", "V4", ...)
    pub fn as_str(self) -> &'static str {
        match self {
            Version::V3 => "V3",
            Version::V4 => "V4",
            Version::V5 => "V5",
        }
    }
}

/// Consensus ecosystem a chain belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ecosystem {
    Polkadot,
    Kusama,
    Westend,
}

/// Account addressing scheme of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountScheme {
    /// 32-byte accounts, SS58 encoded
    #[default]
    Substrate,
    /// 20-byte accounts, 0x-prefixed hex
    Evm,
}

/// Deserialize u128 from a number, a decimal string or a 0x hex string
pub fn deserialize_u128<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    struct U128Visitor;

    impl<'de> de::Visitor<'de> for U128Visitor {
        type Value = u128;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a u128 as number or string")
        }

        fn visit_u64<E>(self, value: u64) -> Result<u128, E>
        where
            E: de::Error,
        {
            Ok(value as u128)
        }

        fn visit_u128<E>(self, value: u128) -> Result<u128, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<u128, E>
        where
            E: de::Error,
        {
            if value >= 0 {
                Ok(value as u128)
            } else {
                Err(E::custom("negative values not allowed"))
            }
        }

        fn visit_f64<E>(self, value: f64) -> Result<u128, E>
        where
            E: de::Error,
        {
            // JS numbers arrive as f64 through serde-wasm-bindgen
            if value >= 0.0 && value.fract() == 0.0 && value <= 9_007_199_254_740_991.0 {
                Ok(value as u128)
            } else {
                Err(E::custom("amount must be a safe non-negative integer"))
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<u128, E>
        where
            E: de::Error,
        {
            parse_u128(value).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(U128Visitor)
}

pub fn deserialize_u128_optional<'de, D>(deserializer: D) -> Result<Option<u128>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_u128")] u128);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

/// Serialize u128 as a decimal string (JS numbers lose precision above 2^53)
pub fn serialize_u128<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn serialize_u128_optional<S>(value: &Option<u128>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_str(&v.to_string()),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn parse_u128(value: &str) -> Result<u128, String> {
    let trimmed = value.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u128::from_str_radix(hex, 16).map_err(|e| e.to_string());
    }
    trimmed.replace(',', "").parse().map_err(|e: std::num::ParseIntError| e.to_string())
}
