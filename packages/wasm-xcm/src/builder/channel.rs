//! HRMP channel management through relay chain sudo

use super::calls::{EncodedCall, XcmCall};
use super::encode_on;
use super::types::{ChannelClosePlan, ChannelOpenPlan};
use crate::client::ChainClient;
use crate::config::{Feature, XcmConfig};
use crate::error::XcmError;
use crate::fees::validate_pallet;
use crate::registry::{ChainMeta, Registry};
use crate::types::Chain;
use subxt_core::ext::scale_value::Value;

fn parachain<'r>(registry: &'r Registry, chain: &Chain) -> Result<(&'r ChainMeta, u32), XcmError> {
    let meta = registry.chain_meta(chain)?;
    match meta.para_id {
        Some(para_id) => Ok((meta, para_id)),
        None => Err(XcmError::ChainNotSupported(format!(
            "{} is not a parachain",
            chain
        ))),
    }
}

fn channel_param(name: &str, value: i64) -> Result<u32, XcmError> {
    u32::try_from(value).map_err(|_| {
        XcmError::InvalidParameter(format!("{} must fit in u32, got {}", name, value))
    })
}

fn sudo(call: &XcmCall) -> XcmCall {
    XcmCall::new("Sudo", "sudo", [("call", call.as_runtime_call_value())])
}

/// Relay-side sudo call opening a channel `from` -> `to`
pub fn compose_channel_open<'r>(
    plan: &ChannelOpenPlan,
    registry: &'r Registry,
    config: &XcmConfig,
) -> Result<(&'r ChainMeta, XcmCall), XcmError> {
    config.ensure_enabled(Feature::Channels)?;
    let (origin, sender) = parachain(registry, &plan.from)?;
    let (destination, recipient) = parachain(registry, &plan.to)?;
    if sender == recipient {
        return Err(XcmError::InvalidParameter(
            "Channel sender and recipient must differ".to_string(),
        ));
    }
    if origin.ecosystem != destination.ecosystem {
        return Err(XcmError::IncompatibleChains(format!(
            "{} and {} share no relay chain",
            origin.name, destination.name
        )));
    }
    let max_capacity = channel_param("maxCapacity", plan.max_capacity)?;
    let max_message_size = channel_param("maxMessageSize", plan.max_message_size)?;

    let relay = registry.relay_chain(origin.ecosystem)?;
    validate_pallet(relay, "Sudo")?;
    validate_pallet(relay, "ParasSudoWrapper")?;

    let establish = XcmCall::new(
        "ParasSudoWrapper",
        "sudo_establish_hrmp_channel",
        [
            ("sender", Value::u128(sender as u128)),
            ("recipient", Value::u128(recipient as u128)),
            ("max_capacity", Value::u128(max_capacity as u128)),
            ("max_message_size", Value::u128(max_message_size as u128)),
        ],
    );
    Ok((relay, sudo(&establish)))
}

/// Relay-side sudo call cleaning every channel of `from`
pub fn compose_channel_close<'r>(
    plan: &ChannelClosePlan,
    registry: &'r Registry,
    config: &XcmConfig,
) -> Result<(&'r ChainMeta, XcmCall), XcmError> {
    config.ensure_enabled(Feature::Channels)?;
    let (origin, para) = parachain(registry, &plan.from)?;
    let inbound = channel_param("inbound", plan.inbound)?;
    let outbound = channel_param("outbound", plan.outbound)?;

    let relay = registry.relay_chain(origin.ecosystem)?;
    validate_pallet(relay, "Sudo")?;
    validate_pallet(relay, "Hrmp")?;

    let clean = XcmCall::new(
        "Hrmp",
        "force_clean_hrmp",
        [
            ("para", Value::u128(para as u128)),
            ("num_inbound", Value::u128(inbound as u128)),
            ("num_outbound", Value::u128(outbound as u128)),
        ],
    );
    Ok((relay, sudo(&clean)))
}

pub async fn build_channel_open(
    plan: &ChannelOpenPlan,
    registry: &Registry,
    client: &dyn ChainClient,
    config: &XcmConfig,
) -> Result<EncodedCall, XcmError> {
    let (relay, call) = compose_channel_open(plan, registry, config)?;
    encode_on(client, relay, &call).await
}

pub async fn build_channel_close(
    plan: &ChannelClosePlan,
    registry: &Registry,
    client: &dyn ChainClient,
    config: &XcmConfig,
) -> Result<EncodedCall, XcmError> {
    let (relay, call) = compose_channel_close(plan, registry, config)?;
    encode_on(client, relay, &call).await
}
