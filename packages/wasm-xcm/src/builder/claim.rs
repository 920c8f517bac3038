//! Claiming assets trapped by a failed message

use super::calls::{EncodedCall, XcmCall};
use super::encode_on;
use super::types::ClaimPlan;
use crate::client::ChainClient;
use crate::config::{Feature, XcmConfig};
use crate::error::XcmError;
use crate::fees::{validate_pallet, validate_recipient};
use crate::location::{localize, Location};
use crate::registry::{ChainMeta, Registry, TransferPallet};
use crate::types::Chain;
use crate::xcm::{versioned_assets, versioned_location, Asset};
use serde::Serialize;

/// Full call, or only its hash when the caller asked for one
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClaimOutput {
    Call(EncodedCall),
    Hash { chain: Chain, hash: String },
}

/// `claim_assets` on the chain holding the trapped assets
pub fn compose_claim<'r>(
    plan: &ClaimPlan,
    registry: &'r Registry,
    config: &XcmConfig,
) -> Result<(&'r ChainMeta, XcmCall), XcmError> {
    config.ensure_enabled(Feature::Claim)?;
    let chain = registry.chain_meta(&plan.chain)?;
    if plan.assets.is_empty() {
        return Err(XcmError::MissingParameter("assets".to_string()));
    }

    let pallet = if chain.is_relay() {
        TransferPallet::XcmPallet
    } else {
        TransferPallet::PolkadotXcm
    };
    validate_pallet(chain, pallet.as_str())?;
    let beneficiary = validate_recipient(chain, &plan.address)?;

    let vantage = chain.vantage();
    let mut assets = Vec::with_capacity(plan.assets.len());
    for claim in &plan.assets {
        if claim.amount == 0 {
            return Err(XcmError::AmountTooLow(
                "claimed amount must be greater than zero".to_string(),
            ));
        }
        let resolved = registry.resolve(&chain.name, &claim.currency)?;
        assets.push(Asset::new(localize(vantage, resolved.location()), claim.amount));
    }

    let version = plan
        .xcm_version
        .unwrap_or(config.xcm_version)
        .min(chain.max_xcm_version);
    let call = XcmCall::new(
        pallet.as_str(),
        "claim_assets",
        [
            ("assets", versioned_assets(&assets, version)),
            (
                "beneficiary",
                versioned_location(&Location::with_junction(0, beneficiary), version),
            ),
        ],
    );
    Ok((chain, call))
}

pub async fn build_claim(
    plan: &ClaimPlan,
    registry: &Registry,
    client: &dyn ChainClient,
    config: &XcmConfig,
) -> Result<ClaimOutput, XcmError> {
    let (chain, call) = compose_claim(plan, registry, config)?;
    let encoded = encode_on(client, chain, &call).await?;
    if plan.hash_only {
        return Ok(ClaimOutput::Hash {
            chain: encoded.chain.clone(),
            hash: format!("0x{}", hex::encode(encoded.hash())),
        });
    }
    Ok(ClaimOutput::Call(encoded))
}
