//! Plan types for call building
//!
//! A plan says what to do (transfer, claim, identity, channel). The builder
//! validates it against the registry and turns it into an encoded call.

use crate::error::XcmError;
use crate::fees::check_existential_deposit;
use crate::location::{Junction, Location};
use crate::registry::{ChainMeta, CurrencySpecifier, ResolvedCurrency};
use crate::types::{
    deserialize_u128, deserialize_u128_optional, serialize_u128, serialize_u128_optional, Chain,
    Version,
};
use crate::xcm::Asset;
use serde::{Deserialize, Serialize};

/// Where a transfer sits in a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferMode {
    #[default]
    Direct,
    /// Origin to an exchange chain
    ToExchange,
    /// Exchange chain to the destination
    FromExchange,
}

/// Explicit pallet and method, bypassing automatic selection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPallet {
    pub pallet: String,
    pub method: String,
}

/// Asset used to pay delivery and execution fees
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeAsset {
    pub currency: CurrencySpecifier,
    #[serde(
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub amount: u128,
}

/// Cross-chain transfer request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPlan {
    pub from: Chain,
    pub to: Chain,
    pub currency: CurrencySpecifier,
    /// Amount in the asset's smallest unit
    #[serde(
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub amount: u128,
    /// Recipient on the destination chain
    pub address: String,
    #[serde(default)]
    pub mode: TransferMode,
    /// Overrides the configured XCM version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xcm_version: Option<Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_asset: Option<FeeAsset>,
    #[serde(default)]
    pub skip_ed_normalization: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_pallet: Option<CustomPallet>,
}

/// Pallet and method a transfer is routed through
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRoute {
    pub pallet: String,
    pub method: String,
}

impl CallRoute {
    pub fn new(pallet: &str, method: &str) -> Self {
        CallRoute {
            pallet: pallet.to_string(),
            method: method.to_string(),
        }
    }
}

/// Transfer that passed validation, ready to compose
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedTransfer {
    pub origin: ChainMeta,
    pub destination: ChainMeta,
    pub currency: ResolvedCurrency,
    /// Amount as the caller asked for it
    #[serde(serialize_with = "serialize_u128")]
    pub requested_amount: u128,
    /// Amount after existential deposit normalization
    #[serde(serialize_with = "serialize_u128")]
    pub amount: u128,
    pub amount_normalized: bool,
    pub below_existential_deposit: bool,
    #[serde(skip)]
    pub existential_deposit: Option<u128>,
    #[serde(skip)]
    pub skip_ed_normalization: bool,
    #[serde(skip)]
    pub fee_asset: Option<Asset>,
    #[serde(skip)]
    pub beneficiary: Junction,
    pub version: Version,
    pub mode: TransferMode,
    pub route: CallRoute,
}

impl ValidatedTransfer {
    /// Transferred asset in canonical form
    pub fn asset(&self) -> Asset {
        Asset::new(self.currency.location().clone(), self.amount)
    }

    pub fn beneficiary_location(&self) -> Location {
        Location::with_junction(0, self.beneficiary)
    }

    /// Re-check the existential deposit once the execution fee is known
    ///
    /// Returns whether the amount changed, in which case the call has to be
    /// composed again.
    pub fn account_for_fee(&mut self, fee: u128) -> Result<bool, XcmError> {
        let deposit = check_existential_deposit(
            self.requested_amount,
            fee,
            self.existential_deposit,
            self.skip_ed_normalization,
        )?;
        let changed = deposit.amount != self.amount;
        self.amount = deposit.amount;
        self.amount_normalized = deposit.normalized;
        self.below_existential_deposit = deposit.below_existential_deposit;
        Ok(changed)
    }
}

/// Utility batch flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchMode {
    /// All or nothing (`batch_all`)
    #[default]
    Atomic,
    /// Stop at the first failure, keeping earlier calls (`batch`)
    StopOnError,
    /// Run every call regardless of failures (`force_batch`)
    ContinueOnError,
}

impl BatchMode {
    pub fn method(self) -> &'static str {
        match self {
            BatchMode::Atomic => "batch_all",
            BatchMode::StopOnError => "batch",
            BatchMode::ContinueOnError => "force_batch",
        }
    }
}

/// One asset to claim back from the trap
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimAsset {
    pub currency: CurrencySpecifier,
    #[serde(
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub amount: u128,
}

/// Claim of trapped assets on one chain
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPlan {
    pub chain: Chain,
    pub assets: Vec<ClaimAsset>,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xcm_version: Option<Version>,
    /// Return only the call hash
    #[serde(default)]
    pub hash_only: bool,
}

/// Identity fields; each is at most 32 bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityFields {
    pub display: Option<String>,
    pub legal: Option<String>,
    pub web: Option<String>,
    pub matrix: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub discord: Option<String>,
}

/// Set an identity on the people chain and request judgement
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPlan {
    pub from: Chain,
    pub identity: IdentityFields,
    pub reg_index: u32,
    #[serde(
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub max_registrar_fee: u128,
    /// Fee withdrawn on the people chain; configured default when absent
    #[serde(
        default,
        deserialize_with = "deserialize_u128_optional",
        serialize_with = "serialize_u128_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub xcm_fee: Option<u128>,
}

/// Open an HRMP channel between two parachains
///
/// Numbers are signed so out-of-range input is rejected with a clear error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelOpenPlan {
    pub from: Chain,
    pub to: Chain,
    pub max_capacity: i64,
    pub max_message_size: i64,
}

/// Force-clean the HRMP channels of a parachain
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelClosePlan {
    pub from: Chain,
    pub inbound: i64,
    pub outbound: i64,
}
