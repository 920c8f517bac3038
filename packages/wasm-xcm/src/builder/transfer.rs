//! Standard cross-chain transfers
//!
//! [`validate_transfer`] checks a plan against the registry without touching
//! the network; [`compose_transfer`] turns the result into a call. Only
//! [`build_transfer`] needs a chain connection, to encode.

use super::calls::{EncodedCall, XcmCall};
use super::encode_on;
use super::types::{CallRoute, CustomPallet, TransferMode, TransferPlan, ValidatedTransfer};
use crate::client::ChainClient;
use crate::config::XcmConfig;
use crate::error::XcmError;
use crate::fees::{
    check_existential_deposit, validate_chain_pair, validate_destination_asset, validate_pallet,
    validate_recipient,
};
use crate::location::{chain_location, localize, Location};
use crate::registry::{ChainMeta, Registry, ResolvedCurrency, TransferPallet};
use crate::xcm::{
    sorted_assets, versioned_asset, versioned_assets, versioned_location, weight_limit_value,
    Asset, WeightLimit,
};
use subxt_core::ext::scale_value::Value;
use tracing::debug;

/// Check a plan and resolve everything a call needs
pub fn validate_transfer(
    plan: &TransferPlan,
    registry: &Registry,
    config: &XcmConfig,
) -> Result<ValidatedTransfer, XcmError> {
    if plan.amount == 0 {
        return Err(XcmError::AmountTooLow("amount must be greater than zero".to_string()));
    }

    let origin = registry.chain_meta(&plan.from)?;
    let destination = registry.chain_meta(&plan.to)?;
    validate_chain_pair(origin, destination)?;
    match plan.mode {
        TransferMode::ToExchange if !destination.is_exchange => {
            return Err(XcmError::RoutingResolution(format!(
                "{} is not an exchange chain",
                destination.name
            )))
        }
        TransferMode::FromExchange if !origin.is_exchange => {
            return Err(XcmError::RoutingResolution(format!(
                "{} is not an exchange chain",
                origin.name
            )))
        }
        _ => {}
    }

    let currency = registry.resolve(&origin.name, &plan.currency)?;
    if let Some(symbol) = currency.symbol() {
        validate_destination_asset(registry, destination, symbol)?;
    }
    let beneficiary = validate_recipient(destination, &plan.address)?;

    let version = plan
        .xcm_version
        .unwrap_or(config.xcm_version)
        .min(origin.max_xcm_version)
        .min(destination.max_xcm_version);

    let fee_asset = match &plan.fee_asset {
        Some(fee) => {
            let resolved = registry.resolve(&origin.name, &fee.currency)?;
            Some(Asset::new(resolved.location().clone(), fee.amount))
        }
        None => None,
    };

    let route = select_route(
        origin,
        destination,
        &currency,
        fee_asset.is_some(),
        plan.custom_pallet.as_ref(),
    );
    validate_pallet(origin, &route.pallet)?;

    // Fee is unknown until the call is estimated; see `account_for_fee`
    let existential_deposit = registry.existential_deposit(&destination.name, &currency)?;
    let skip_ed_normalization = plan.skip_ed_normalization || config.skip_ed_normalization;
    let deposit =
        check_existential_deposit(plan.amount, 0, existential_deposit, skip_ed_normalization)?;

    debug!(
        from = %origin.name,
        to = %destination.name,
        pallet = %route.pallet,
        method = %route.method,
        ?version,
        "Validated transfer"
    );

    Ok(ValidatedTransfer {
        origin: origin.clone(),
        destination: destination.clone(),
        currency,
        requested_amount: plan.amount,
        amount: deposit.amount,
        amount_normalized: deposit.normalized,
        below_existential_deposit: deposit.below_existential_deposit,
        existential_deposit,
        skip_ed_normalization,
        fee_asset,
        beneficiary,
        version,
        mode: plan.mode,
        route,
    })
}

/// Relay token moving between the relay chain and system chains
fn is_teleport(origin: &ChainMeta, destination: &ChainMeta, currency: &ResolvedCurrency) -> bool {
    let trusted = |c: &ChainMeta| c.is_relay() || c.is_system_chain;
    origin.ecosystem == destination.ecosystem
        && *currency.location() == Location::parent()
        && trusted(origin)
        && trusted(destination)
}

fn select_route(
    origin: &ChainMeta,
    destination: &ChainMeta,
    currency: &ResolvedCurrency,
    has_fee_asset: bool,
    custom: Option<&CustomPallet>,
) -> CallRoute {
    if let Some(custom) = custom {
        return CallRoute::new(&custom.pallet, &custom.method);
    }

    let pallet = origin.xcm_pallet;
    if pallet == TransferPallet::XTokens {
        let method = if has_fee_asset {
            "transfer_multiassets"
        } else {
            "transfer_multiasset"
        };
        return CallRoute::new(pallet.as_str(), method);
    }

    let method = if is_teleport(origin, destination, currency) {
        "limited_teleport_assets"
    } else if origin.ecosystem != destination.ecosystem {
        "transfer_assets"
    } else {
        "limited_reserve_transfer_assets"
    };
    CallRoute::new(pallet.as_str(), method)
}

/// Build the transfer call for a validated plan
pub fn compose_transfer(transfer: &ValidatedTransfer) -> Result<XcmCall, XcmError> {
    let vantage = transfer.origin.vantage();
    let version = transfer.version;
    let dest = chain_location(vantage, transfer.destination.vantage());

    let local = |asset: Asset| Asset::new(localize(vantage, &asset.location), asset.amount);
    let main = local(transfer.asset());
    let fee = transfer.fee_asset.clone().map(local);

    let mut assets = vec![main.clone()];
    assets.extend(fee.clone());
    let assets = sorted_assets(&assets);

    let fee_location = fee.as_ref().map_or(&main.location, |f| &f.location);
    let fee_item = assets
        .iter()
        .position(|a| a.location == *fee_location)
        .ok_or_else(|| XcmError::Internal("Fee asset missing from asset list".to_string()))?;

    let route = &transfer.route;
    let call = if route.pallet == TransferPallet::XTokens.as_str() {
        let dest = dest.appended(transfer.beneficiary)?;
        let weight_limit = weight_limit_value(&WeightLimit::Unlimited);
        if route.method == "transfer_multiassets" {
            XcmCall::new(
                &route.pallet,
                &route.method,
                [
                    ("assets", versioned_assets(&assets, version)),
                    ("fee_item", Value::u128(fee_item as u128)),
                    ("dest", versioned_location(&dest, version)),
                    ("dest_weight_limit", weight_limit),
                ],
            )
        } else {
            XcmCall::new(
                &route.pallet,
                &route.method,
                [
                    ("asset", versioned_asset(&main, version)),
                    ("dest", versioned_location(&dest, version)),
                    ("dest_weight_limit", weight_limit),
                ],
            )
        }
    } else {
        XcmCall::new(
            &route.pallet,
            &route.method,
            [
                ("dest", versioned_location(&dest, version)),
                (
                    "beneficiary",
                    versioned_location(&transfer.beneficiary_location(), version),
                ),
                ("assets", versioned_assets(&assets, version)),
                ("fee_asset_item", Value::u128(fee_item as u128)),
                ("weight_limit", weight_limit_value(&WeightLimit::Unlimited)),
            ],
        )
    };

    debug!(call = %call.name(), dest = %dest, "Composed transfer");
    Ok(call)
}

/// Validate, compose and encode a transfer on its origin chain
pub async fn build_transfer(
    plan: &TransferPlan,
    registry: &Registry,
    client: &dyn ChainClient,
    config: &XcmConfig,
) -> Result<EncodedCall, XcmError> {
    let transfer = validate_transfer(plan, registry, config)?;
    let call = compose_transfer(&transfer)?;
    encode_on(client, &transfer.origin, &call).await
}
