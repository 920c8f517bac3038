//! Asset registry and chain metadata
//!
//! Static per-chain tables, loaded once and read-only afterwards. The builtin
//! tables are embedded from `data/registry.json`; tests and embedders can
//! load their own with [`Registry::from_json`].
//!
//! Asset locations in the tables use one of two forms:
//! - `parents >= 1`: canonical, as seen from a sibling parachain
//! - `parents == 0`: local to the chain that lists the asset
//!
//! [`AssetInfo::canonical_location`] lifts both into canonical form.

pub mod resolver;

use crate::error::XcmError;
use crate::location::{to_canonical, Junction, Location, NetworkId, Vantage};
use crate::types::{
    deserialize_u128_optional, serialize_u128_optional, AccountScheme, Chain, Ecosystem, Version,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

pub use resolver::{CurrencySpecifier, ResolvedCurrency, SymbolTag};

const BUILTIN_REGISTRY: &str = include_str!("../../data/registry.json");

/// Per chain-and-asset record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    /// Chain-local identifier (numeric or string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default)]
    pub is_native: bool,
    #[serde(default)]
    pub is_fee_asset: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_u128_optional",
        serialize_with = "serialize_u128_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub existential_deposit: Option<u128>,
    /// Alternative name used for foreign-abstract lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl AssetInfo {
    /// Whether this asset can be referenced in a call at all
    pub fn is_referenceable(&self) -> bool {
        self.is_native
            || self.location.is_some()
            || self.asset_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Location of the asset in canonical (sibling parachain) form
    pub fn canonical_location(&self, chain: &ChainMeta) -> Result<Location, XcmError> {
        let vantage = chain.vantage();
        if let Some(location) = &self.location {
            return to_canonical(vantage, location);
        }
        if self.is_native {
            return to_canonical(vantage, &Location::here());
        }
        let id = self.asset_id.as_deref().unwrap_or_default();
        let index: u128 = id.parse().map_err(|_| {
            XcmError::InvalidCurrency(format!(
                "Asset {} on {} has no location and a non-numeric id {}",
                self.symbol, chain.name, id
            ))
        })?;
        to_canonical(vantage, &Location::with_junction(0, Junction::GeneralIndex(index)))
    }
}

/// Default transfer pallet of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferPallet {
    XcmPallet,
    PolkadotXcm,
    XTokens,
}

impl TransferPallet {
    pub fn as_str(self) -> &'static str {
        match self {
            TransferPallet::XcmPallet => "XcmPallet",
            TransferPallet::PolkadotXcm => "PolkadotXcm",
            TransferPallet::XTokens => "XTokens",
        }
    }
}

/// Static chain metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainMeta {
    pub name: Chain,
    /// `None` for relay chains
    #[serde(default)]
    pub para_id: Option<u32>,
    pub ecosystem: Ecosystem,
    pub relay_chain_symbol: String,
    pub native_asset_symbol: String,
    #[serde(default)]
    pub ss58_prefix: u16,
    #[serde(default)]
    pub account_scheme: AccountScheme,
    pub xcm_pallet: TransferPallet,
    #[serde(default)]
    pub supported_pallets: Vec<String>,
    pub max_xcm_version: Version,
    #[serde(default)]
    pub is_exchange: bool,
    #[serde(default)]
    pub is_system_chain: bool,
    #[serde(default = "default_true")]
    pub supports_payment_info: bool,
    /// Chains of another consensus reachable over a bridge
    #[serde(default)]
    pub bridged_to: Vec<Chain>,
    /// RPC endpoints, first is preferred
    #[serde(default)]
    pub providers: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl ChainMeta {
    pub fn is_relay(&self) -> bool {
        self.para_id.is_none()
    }

    pub fn network(&self) -> NetworkId {
        network_of(self.ecosystem)
    }

    pub fn vantage(&self) -> Vantage {
        Vantage {
            para_id: self.para_id,
            network: self.network(),
        }
    }

    pub fn supports_pallet(&self, pallet: &str) -> bool {
        self.supported_pallets.iter().any(|p| p == pallet)
    }

    pub fn is_bridged_to(&self, other: &Chain) -> bool {
        self.bridged_to.contains(other)
    }
}

pub fn network_of(ecosystem: Ecosystem) -> NetworkId {
    match ecosystem {
        Ecosystem::Polkadot => NetworkId::Polkadot,
        Ecosystem::Kusama => NetworkId::Kusama,
        Ecosystem::Westend => NetworkId::Westend,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainEntry {
    #[serde(flatten)]
    meta: ChainMeta,
    #[serde(default)]
    native_assets: Vec<AssetInfo>,
    #[serde(default)]
    other_assets: Vec<AssetInfo>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    chains: Vec<ChainEntry>,
}

/// Read-only asset registry
#[derive(Debug, Clone)]
pub struct Registry {
    chains: BTreeMap<Chain, ChainEntry>,
}

impl Registry {
    /// Parse a registry and check its integrity
    pub fn from_json(json: &str) -> Result<Self, XcmError> {
        let file: RegistryFile = serde_json::from_str(json)
            .map_err(|e| XcmError::Internal(format!("Invalid registry data: {}", e)))?;

        let mut chains = BTreeMap::new();
        for entry in file.chains {
            let name = entry.meta.name.clone();
            if chains.insert(name.clone(), entry).is_some() {
                return Err(XcmError::Internal(format!(
                    "Chain {} is listed twice in registry",
                    name
                )));
            }
        }

        let registry = Registry { chains };
        registry.check_integrity()?;
        debug!(chains = registry.chains.len(), "Loaded asset registry");
        Ok(registry)
    }

    /// Registry embedded in the crate, parsed on first use
    pub fn builtin() -> Result<&'static Registry, XcmError> {
        static BUILTIN: OnceLock<Result<Registry, XcmError>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| Registry::from_json(BUILTIN_REGISTRY))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Every asset must be native or carry an id or a location
    pub fn check_integrity(&self) -> Result<(), XcmError> {
        for (chain, entry) in &self.chains {
            if let Some(asset) = entry
                .native_assets
                .iter()
                .chain(&entry.other_assets)
                .find(|a| !a.is_referenceable())
            {
                return Err(XcmError::Internal(format!(
                    "Asset {} on {} has neither assetId nor location and is not native",
                    asset.symbol, chain
                )));
            }
            if entry.native_assets.iter().any(|a| !a.is_native) {
                return Err(XcmError::Internal(format!(
                    "Chain {} lists a non-native asset among its native assets",
                    chain
                )));
            }
        }
        Ok(())
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainMeta> {
        self.chains.values().map(|e| &e.meta)
    }

    pub fn chain_meta(&self, chain: &Chain) -> Result<&ChainMeta, XcmError> {
        self.entry(chain).map(|e| &e.meta)
    }

    /// Assets of a chain, native first
    pub fn list_assets(&self, chain: &Chain) -> Result<Vec<&AssetInfo>, XcmError> {
        let entry = self.entry(chain)?;
        Ok(entry
            .native_assets
            .iter()
            .chain(&entry.other_assets)
            .collect())
    }

    pub fn native_assets(&self, chain: &Chain) -> Result<&[AssetInfo], XcmError> {
        Ok(&self.entry(chain)?.native_assets)
    }

    pub fn other_assets(&self, chain: &Chain) -> Result<&[AssetInfo], XcmError> {
        Ok(&self.entry(chain)?.other_assets)
    }

    /// Assets usable to pay fees on a chain
    pub fn fee_assets(&self, chain: &Chain) -> Result<Vec<&AssetInfo>, XcmError> {
        Ok(self
            .list_assets(chain)?
            .into_iter()
            .filter(|a| a.is_native || a.is_fee_asset)
            .collect())
    }

    /// Relay chain of an ecosystem
    pub fn relay_chain(&self, ecosystem: Ecosystem) -> Result<&ChainMeta, XcmError> {
        self.chains()
            .find(|c| c.ecosystem == ecosystem && c.is_relay())
            .ok_or_else(|| {
                XcmError::ChainNotSupported(format!("No relay chain registered for {:?}", ecosystem))
            })
    }

    /// Exchange chains of an ecosystem, ordered by name
    pub fn exchanges(&self, ecosystem: Ecosystem) -> Vec<&ChainMeta> {
        self.chains()
            .filter(|c| c.ecosystem == ecosystem && c.is_exchange)
            .collect()
    }

    fn entry(&self, chain: &Chain) -> Result<&ChainEntry, XcmError> {
        self.chains
            .get(chain)
            .ok_or_else(|| XcmError::ChainNotSupported(format!("Unknown chain {}", chain)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixture_registry;

    #[test]
    fn test_builtin_registry_integrity() {
        let registry = Registry::builtin().unwrap();
        registry.check_integrity().unwrap();
        for chain in registry.chains() {
            for asset in registry.list_assets(&chain.name).unwrap() {
                assert!(
                    asset.is_native || asset.asset_id.is_some() || asset.location.is_some(),
                    "{} on {}",
                    asset.symbol,
                    chain.name
                );
            }
        }
    }

    #[test]
    fn test_builtin_canonical_locations_resolve() {
        let registry = Registry::builtin().unwrap();
        for chain in registry.chains() {
            for asset in registry.list_assets(&chain.name).unwrap() {
                asset.canonical_location(chain).unwrap();
            }
        }
    }

    #[test]
    fn test_integrity_rejects_unreferenceable_asset() {
        let json = r#"{ "chains": [{
            "name": "Broken", "paraId": 3000, "ecosystem": "Polkadot",
            "relayChainSymbol": "DOT", "nativeAssetSymbol": "BRK",
            "xcmPallet": "PolkadotXcm", "maxXcmVersion": "V4",
            "otherAssets": [{ "symbol": "LOST", "decimals": 10 }]
        }] }"#;
        let err = Registry::from_json(json).unwrap_err();
        assert!(err.to_string().contains("LOST"));
    }

    #[test]
    fn test_list_assets_native_first() {
        let registry = Registry::builtin().unwrap();
        let assets = registry.list_assets(&Chain::from("Acala")).unwrap();
        assert_eq!(assets[0].symbol, "ACA");
        assert!(assets[0].is_native);
        assert!(assets.iter().skip_while(|a| a.is_native).all(|a| !a.is_native));
    }

    #[test]
    fn test_unknown_chain() {
        let registry = Registry::builtin().unwrap();
        let err = registry.chain_meta(&Chain::from("Atlantis")).unwrap_err();
        assert!(matches!(err, XcmError::ChainNotSupported(_)));
    }

    #[test]
    fn test_canonical_location_forms() {
        let registry = fixture_registry();
        let chain_a = registry.chain_meta(&Chain::from("ChainA")).unwrap();
        let assets = registry.list_assets(&chain_a.name).unwrap();

        // Native asset of a parachain is the chain itself
        let native = assets.iter().find(|a| a.symbol == "AAA").unwrap();
        assert_eq!(
            native.canonical_location(chain_a).unwrap(),
            Location::with_junction(1, Junction::Parachain(2000))
        );

        // Relay token keeps its canonical form
        let dot = assets.iter().find(|a| a.symbol == "DOT").unwrap();
        assert_eq!(dot.canonical_location(chain_a).unwrap(), Location::parent());

        // Id-only assets become a general index under the chain
        let local = assets.iter().find(|a| a.symbol == "LOC").unwrap();
        assert_eq!(
            local.canonical_location(chain_a).unwrap(),
            Location::new(1, vec![Junction::Parachain(2000), Junction::GeneralIndex(7)]).unwrap()
        );
    }

    #[test]
    fn test_exchanges_sorted() {
        let registry = Registry::builtin().unwrap();
        let names: Vec<_> = registry
            .exchanges(Ecosystem::Polkadot)
            .iter()
            .map(|c| c.name.to_string())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"Hydration".to_string()));
    }
}
