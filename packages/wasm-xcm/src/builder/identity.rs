//! Identity registration on the people chain
//!
//! The identity pallet lives on the ecosystem's people chain. From the relay
//! chain or Asset Hub the calls are wrapped in an XCM `send` that pays for
//! execution on the people chain and transacts both calls there.

use super::batch::utility_batch;
use super::calls::{EncodedCall, XcmCall};
use super::encode_on;
use super::types::{BatchMode, IdentityFields, IdentityPlan};
use crate::client::{ChainClient, ConnectionGuard};
use crate::config::{Feature, XcmConfig};
use crate::error::XcmError;
use crate::fees::validate_pallet;
use crate::location::{chain_location, Location};
use crate::registry::{ChainMeta, Registry};
use crate::types::{Ecosystem, Version};
use crate::xcm::{
    option_value, versioned_location, versioned_xcm, Asset, Instruction, Weight,
    WeightLimit,
};
use subxt_core::ext::scale_value::Value;
use tracing::info;

/// Chains allowed to register an identity
const IDENTITY_ORIGINS: [&str; 6] = [
    "Polkadot",
    "AssetHubPolkadot",
    "PeoplePolkadot",
    "Kusama",
    "AssetHubKusama",
    "PeopleKusama",
];

const SET_IDENTITY_WEIGHT: Weight = Weight {
    ref_time: 1_000_000_000,
    proof_size: 50_000,
};

const REQUEST_JUDGEMENT_WEIGHT: Weight = Weight {
    ref_time: 500_000_000,
    proof_size: 50_000,
};

/// Longest value an identity field can hold
const MAX_FIELD_BYTES: usize = 32;

/// Origin and people chain for a plan
pub fn identity_chains<'r>(
    plan: &IdentityPlan,
    registry: &'r Registry,
    config: &XcmConfig,
) -> Result<(&'r ChainMeta, &'r ChainMeta), XcmError> {
    config.ensure_enabled(Feature::Identity)?;
    if !IDENTITY_ORIGINS.contains(&plan.from.as_str()) {
        return Err(XcmError::ChainNotSupported(format!(
            "Identity cannot be set from {}",
            plan.from
        )));
    }
    let origin = registry.chain_meta(&plan.from)?;
    let people = match origin.ecosystem {
        Ecosystem::Polkadot => "PeoplePolkadot",
        Ecosystem::Kusama => "PeopleKusama",
        Ecosystem::Westend => {
            return Err(XcmError::ChainNotSupported(format!(
                "No people chain registered for {:?}",
                origin.ecosystem
            )))
        }
    };
    let people = registry.chain_meta(&people.into())?;
    validate_pallet(people, "Identity")?;
    Ok((origin, people))
}

fn data_value(name: &str, field: &Option<String>) -> Result<Value<()>, XcmError> {
    match field.as_deref() {
        None | Some("") => Ok(Value::unnamed_variant("None", [])),
        Some(text) if text.len() > MAX_FIELD_BYTES => Err(XcmError::InvalidParameter(format!(
            "Identity field {} is longer than {} bytes",
            name, MAX_FIELD_BYTES
        ))),
        Some(text) => Ok(Value::unnamed_variant(
            format!("Raw{}", text.len()),
            [Value::from_bytes(text.as_bytes())],
        )),
    }
}

pub fn set_identity_call(fields: &IdentityFields) -> Result<XcmCall, XcmError> {
    let info = Value::named_composite([
        ("display", data_value("display", &fields.display)?),
        ("legal", data_value("legal", &fields.legal)?),
        ("web", data_value("web", &fields.web)?),
        ("matrix", data_value("matrix", &fields.matrix)?),
        ("email", data_value("email", &fields.email)?),
        ("pgp_fingerprint", option_value(None)),
        ("image", data_value("image", &fields.image)?),
        ("twitter", data_value("twitter", &fields.twitter)?),
        ("github", data_value("github", &fields.github)?),
        ("discord", data_value("discord", &fields.discord)?),
    ]);
    Ok(XcmCall::new("Identity", "set_identity", [("info", info)]))
}

pub fn request_judgement_call(plan: &IdentityPlan) -> XcmCall {
    XcmCall::new(
        "Identity",
        "request_judgement",
        [
            ("reg_index", Value::u128(plan.reg_index as u128)),
            ("max_fee", Value::u128(plan.max_registrar_fee)),
        ],
    )
}

/// Weight bought on the people chain, covering both transacts
fn execution_weight() -> Weight {
    Weight {
        ref_time: SET_IDENTITY_WEIGHT.ref_time + REQUEST_JUDGEMENT_WEIGHT.ref_time,
        proof_size: SET_IDENTITY_WEIGHT.proof_size + REQUEST_JUDGEMENT_WEIGHT.proof_size,
    }
}

/// `send` from `origin` that transacts both encoded calls on `people`
pub fn compose_identity_send(
    origin: &ChainMeta,
    people: &ChainMeta,
    set_identity: Vec<u8>,
    request_judgement: Vec<u8>,
    fee: u128,
    version: Version,
) -> Result<XcmCall, XcmError> {
    validate_pallet(origin, origin.xcm_pallet.as_str())?;

    // Relay token as seen from the people chain
    let fee_asset = Location::parent();
    let message = [
        Instruction::WithdrawAsset(vec![Asset::new(fee_asset.clone(), fee)]),
        Instruction::BuyExecution {
            fees: Asset::new(fee_asset, fee / 2),
            weight_limit: WeightLimit::Limited(execution_weight()),
        },
        Instruction::Transact {
            require_weight_at_most: SET_IDENTITY_WEIGHT,
            call: set_identity,
        },
        Instruction::Transact {
            require_weight_at_most: REQUEST_JUDGEMENT_WEIGHT,
            call: request_judgement,
        },
    ];

    let dest = chain_location(origin.vantage(), people.vantage());
    Ok(XcmCall::new(
        origin.xcm_pallet.as_str(),
        "send",
        [
            ("dest", versioned_location(&dest, version)),
            ("message", versioned_xcm(&message, version)),
        ],
    ))
}

/// Build the identity call on the plan's origin
///
/// Both identity calls are encoded against the people chain runtime; the
/// people chain connection is released before the origin is contacted.
pub async fn build_identity(
    plan: &IdentityPlan,
    registry: &Registry,
    client: &dyn ChainClient,
    config: &XcmConfig,
) -> Result<EncodedCall, XcmError> {
    let (origin, people) = identity_chains(plan, registry, config)?;
    let set_identity = set_identity_call(&plan.identity)?;
    let request_judgement = request_judgement_call(plan);

    if origin.name == people.name {
        validate_pallet(people, "Utility")?;
        let call = utility_batch(&[set_identity, request_judgement], BatchMode::Atomic);
        return encode_on(client, people, &call).await;
    }

    let (set_data, judgement_data) = {
        let connection = ConnectionGuard::acquire(client, people).await?;
        (
            connection.encode_call(&set_identity)?,
            connection.encode_call(&request_judgement)?,
        )
    };

    let version = config
        .xcm_version
        .min(origin.max_xcm_version)
        .min(people.max_xcm_version);
    let fee = plan.xcm_fee.unwrap_or(config.identity_xcm_fee);
    info!(from = %origin.name, people = %people.name, fee, "Sending identity to people chain");
    let call = compose_identity_send(origin, people, set_data, judgement_data, fee, version)?;
    encode_on(client, origin, &call).await
}
