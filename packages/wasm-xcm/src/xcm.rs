//! XCM protocol values
//!
//! Assets, filters and instructions are kept version-agnostic and converted
//! to `scale_value` shapes for a specific [`Version`] only when a call is
//! composed. The shapes mirror the runtime types so the dynamic encoder can
//! match them against chain metadata.

use crate::location::{Junction, Location, NetworkId};
use crate::types::Version;
use serde::{Deserialize, Serialize};
use subxt_core::ext::scale_value::Value;

/// Fungible asset at a location
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Asset {
    pub location: Location,
    pub amount: u128,
}

impl Asset {
    pub fn new(location: Location, amount: u128) -> Self {
        Asset { location, amount }
    }
}

/// Selection of assets from the holding register
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetFilter {
    Definite(Vec<Asset>),
    /// Everything, up to `n` distinct assets
    AllCounted(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weight {
    pub ref_time: u64,
    pub proof_size: u64,
}

impl Weight {
    pub fn from_ref_time(ref_time: u64) -> Self {
        Weight {
            ref_time,
            proof_size: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightLimit {
    Unlimited,
    Limited(Weight),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    WithdrawAsset(Vec<Asset>),
    BuyExecution {
        fees: Asset,
        weight_limit: WeightLimit,
    },
    DepositAsset {
        assets: AssetFilter,
        beneficiary: Location,
    },
    DepositReserveAsset {
        assets: AssetFilter,
        dest: Location,
        xcm: Vec<Instruction>,
    },
    InitiateReserveWithdraw {
        assets: AssetFilter,
        reserve: Location,
        xcm: Vec<Instruction>,
    },
    ExchangeAsset {
        give: AssetFilter,
        want: Vec<Asset>,
        maximal: bool,
    },
    /// Dispatched from the sender's sovereign account
    Transact {
        require_weight_at_most: Weight,
        call: Vec<u8>,
    },
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::WithdrawAsset(_) => "WithdrawAsset",
            Instruction::BuyExecution { .. } => "BuyExecution",
            Instruction::DepositAsset { .. } => "DepositAsset",
            Instruction::DepositReserveAsset { .. } => "DepositReserveAsset",
            Instruction::InitiateReserveWithdraw { .. } => "InitiateReserveWithdraw",
            Instruction::ExchangeAsset { .. } => "ExchangeAsset",
            Instruction::Transact { .. } => "Transact",
        }
    }
}

// =============================================================================
// Versioned wrappers
// =============================================================================

pub fn versioned_location(location: &Location, version: Version) -> Value<()> {
    Value::unnamed_variant(version.as_str(), [location_value(location, version)])
}

pub fn versioned_asset(asset: &Asset, version: Version) -> Value<()> {
    Value::unnamed_variant(version.as_str(), [asset_value(asset, version)])
}

/// Versioned asset list; assets are sorted as the runtime requires
pub fn versioned_assets(assets: &[Asset], version: Version) -> Value<()> {
    Value::unnamed_variant(version.as_str(), [assets_value(assets, version)])
}

pub fn versioned_xcm(instructions: &[Instruction], version: Version) -> Value<()> {
    Value::unnamed_variant(version.as_str(), [xcm_value(instructions, version)])
}

/// Sort and merge assets by location, summing duplicate amounts
pub fn sorted_assets(assets: &[Asset]) -> Vec<Asset> {
    let mut sorted: Vec<Asset> = Vec::with_capacity(assets.len());
    let mut input = assets.to_vec();
    input.sort();
    for asset in input {
        match sorted.last_mut() {
            Some(last) if last.location == asset.location => {
                last.amount = last.amount.saturating_add(asset.amount);
            }
            _ => sorted.push(asset),
        }
    }
    sorted
}

// =============================================================================
// Locations
// =============================================================================

pub fn location_value(location: &Location, version: Version) -> Value<()> {
    Value::named_composite([
        ("parents", Value::u128(location.parents as u128)),
        ("interior", interior_value(location.junctions(), version)),
    ])
}

fn interior_value(junctions: &[Junction], version: Version) -> Value<()> {
    if junctions.is_empty() {
        return Value::unnamed_variant("Here", []);
    }
    let name = format!("X{}", junctions.len());
    let items = junctions.iter().map(|j| junction_value(j, version));
    match version {
        // X2(Junction, Junction)
        Version::V3 => Value::unnamed_variant(name, items),
        // X2([Junction; 2])
        Version::V4 | Version::V5 => {
            Value::unnamed_variant(name, [Value::unnamed_composite(items)])
        }
    }
}

fn junction_value(junction: &Junction, version: Version) -> Value<()> {
    match junction {
        Junction::Parachain(id) => Value::unnamed_variant("Parachain", [Value::u128(*id as u128)]),
        Junction::AccountId32 { network, id } => Value::named_variant(
            "AccountId32",
            [
                ("network", option_value(network.map(|n| network_value(&n, version)))),
                ("id", Value::from_bytes(id)),
            ],
        ),
        Junction::AccountIndex64 { network, index } => Value::named_variant(
            "AccountIndex64",
            [
                ("network", option_value(network.map(|n| network_value(&n, version)))),
                ("index", Value::u128(*index as u128)),
            ],
        ),
        Junction::AccountKey20 { network, key } => Value::named_variant(
            "AccountKey20",
            [
                ("network", option_value(network.map(|n| network_value(&n, version)))),
                ("key", Value::from_bytes(key)),
            ],
        ),
        Junction::PalletInstance(i) => {
            Value::unnamed_variant("PalletInstance", [Value::u128(*i as u128)])
        }
        Junction::GeneralIndex(i) => Value::unnamed_variant("GeneralIndex", [Value::u128(*i)]),
        Junction::GeneralKey { length, data } => Value::named_variant(
            "GeneralKey",
            [
                ("length", Value::u128(*length as u128)),
                ("data", Value::from_bytes(data)),
            ],
        ),
        Junction::OnlyChild => Value::unnamed_variant("OnlyChild", []),
        Junction::GlobalConsensus(n) => {
            Value::unnamed_variant("GlobalConsensus", [network_value(n, version)])
        }
    }
}

fn network_value(network: &NetworkId, _version: Version) -> Value<()> {
    match network {
        NetworkId::ByGenesis(hash) => {
            Value::unnamed_variant("ByGenesis", [Value::from_bytes(hash)])
        }
        NetworkId::Ethereum { chain_id } => Value::named_variant(
            "Ethereum",
            [("chain_id", Value::u128(*chain_id as u128))],
        ),
        other => Value::unnamed_variant(other.variant_name(), []),
    }
}

// =============================================================================
// Assets
// =============================================================================

fn asset_id_value(location: &Location, version: Version) -> Value<()> {
    match version {
        Version::V3 => Value::unnamed_variant("Concrete", [location_value(location, version)]),
        Version::V4 | Version::V5 => {
            Value::unnamed_composite([location_value(location, version)])
        }
    }
}

pub fn asset_value(asset: &Asset, version: Version) -> Value<()> {
    Value::named_composite([
        ("id", asset_id_value(&asset.location, version)),
        (
            "fun",
            Value::unnamed_variant("Fungible", [Value::u128(asset.amount)]),
        ),
    ])
}

fn assets_value(assets: &[Asset], version: Version) -> Value<()> {
    let items = sorted_assets(assets)
        .iter()
        .map(|a| asset_value(a, version))
        .collect::<Vec<_>>();
    Value::unnamed_composite([Value::unnamed_composite(items)])
}

fn filter_value(filter: &AssetFilter, version: Version) -> Value<()> {
    match filter {
        AssetFilter::Definite(assets) => {
            Value::unnamed_variant("Definite", [assets_value(assets, version)])
        }
        AssetFilter::AllCounted(n) => Value::unnamed_variant(
            "Wild",
            [Value::unnamed_variant("AllCounted", [Value::u128(*n as u128)])],
        ),
    }
}

// =============================================================================
// Weights and instructions
// =============================================================================

pub fn weight_value(weight: &Weight) -> Value<()> {
    Value::named_composite([
        ("ref_time", Value::u128(weight.ref_time as u128)),
        ("proof_size", Value::u128(weight.proof_size as u128)),
    ])
}

pub fn weight_limit_value(limit: &WeightLimit) -> Value<()> {
    match limit {
        WeightLimit::Unlimited => Value::unnamed_variant("Unlimited", []),
        WeightLimit::Limited(w) => Value::unnamed_variant("Limited", [weight_value(w)]),
    }
}

fn xcm_value(instructions: &[Instruction], version: Version) -> Value<()> {
    let items = instructions
        .iter()
        .map(|i| instruction_value(i, version))
        .collect::<Vec<_>>();
    Value::unnamed_composite([Value::unnamed_composite(items)])
}

fn instruction_value(instruction: &Instruction, version: Version) -> Value<()> {
    let name = instruction.name();
    match instruction {
        Instruction::WithdrawAsset(assets) => {
            Value::unnamed_variant(name, [assets_value(assets, version)])
        }
        Instruction::BuyExecution { fees, weight_limit } => Value::named_variant(
            name,
            [
                ("fees", asset_value(fees, version)),
                ("weight_limit", weight_limit_value(weight_limit)),
            ],
        ),
        Instruction::DepositAsset {
            assets,
            beneficiary,
        } => Value::named_variant(
            name,
            [
                ("assets", filter_value(assets, version)),
                ("beneficiary", location_value(beneficiary, version)),
            ],
        ),
        Instruction::DepositReserveAsset { assets, dest, xcm } => Value::named_variant(
            name,
            [
                ("assets", filter_value(assets, version)),
                ("dest", location_value(dest, version)),
                ("xcm", xcm_value(xcm, version)),
            ],
        ),
        Instruction::InitiateReserveWithdraw {
            assets,
            reserve,
            xcm,
        } => Value::named_variant(
            name,
            [
                ("assets", filter_value(assets, version)),
                ("reserve", location_value(reserve, version)),
                ("xcm", xcm_value(xcm, version)),
            ],
        ),
        Instruction::ExchangeAsset {
            give,
            want,
            maximal,
        } => Value::named_variant(
            name,
            [
                ("give", filter_value(give, version)),
                ("want", assets_value(want, version)),
                ("maximal", Value::bool(*maximal)),
            ],
        ),
        Instruction::Transact {
            require_weight_at_most,
            call,
        } => {
            let origin_kind = Value::unnamed_variant("SovereignAccount", []);
            let call = Value::named_composite([("encoded", Value::from_bytes(call))]);
            match version {
                Version::V3 | Version::V4 => Value::named_variant(
                    name,
                    [
                        ("origin_kind", origin_kind),
                        ("require_weight_at_most", weight_value(require_weight_at_most)),
                        ("call", call),
                    ],
                ),
                Version::V5 => Value::named_variant(
                    name,
                    [
                        ("origin_kind", origin_kind),
                        (
                            "fallback_max_weight",
                            option_value(Some(weight_value(require_weight_at_most))),
                        ),
                        ("call", call),
                    ],
                ),
            }
        }
    }
}

pub fn option_value(value: Option<Value<()>>) -> Value<()> {
    match value {
        Some(v) => Value::unnamed_variant("Some", [v]),
        None => Value::unnamed_variant("None", []),
    }
}
