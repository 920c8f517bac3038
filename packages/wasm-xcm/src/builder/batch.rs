//! Utility batches of transfers from one origin

use super::calls::{EncodedCall, XcmCall};
use super::encode_on;
use super::transfer::compose_transfer;
use super::types::{BatchMode, ValidatedTransfer};
use crate::client::ChainClient;
use crate::error::XcmError;
use crate::fees::validate_pallet;
use crate::registry::ChainMeta;
use subxt_core::ext::scale_value::Value;

/// `Utility.<mode>` over already composed calls
pub fn utility_batch(calls: &[XcmCall], mode: BatchMode) -> XcmCall {
    XcmCall::new(
        "Utility",
        mode.method(),
        [(
            "calls",
            Value::unnamed_composite(calls.iter().map(XcmCall::as_runtime_call_value)),
        )],
    )
}

/// Compose a batch; every transfer must share the origin chain
pub fn compose_batch(transfers: &[ValidatedTransfer], mode: BatchMode) -> Result<XcmCall, XcmError> {
    let origin = batch_origin(transfers)?;
    validate_pallet(origin, "Utility")?;

    let calls = transfers
        .iter()
        .map(compose_transfer)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(utility_batch(&calls, mode))
}

pub async fn build_batch(
    transfers: &[ValidatedTransfer],
    mode: BatchMode,
    client: &dyn ChainClient,
) -> Result<EncodedCall, XcmError> {
    let call = compose_batch(transfers, mode)?;
    encode_on(client, batch_origin(transfers)?, &call).await
}

fn batch_origin(transfers: &[ValidatedTransfer]) -> Result<&ChainMeta, XcmError> {
    let first = transfers
        .first()
        .ok_or_else(|| XcmError::BatchValidation("Batch is empty".to_string()))?;
    if let Some(other) = transfers.iter().find(|t| t.origin.name != first.origin.name) {
        return Err(XcmError::BatchValidation(format!(
            "Batch mixes origins {} and {}",
            first.origin.name, other.origin.name
        )));
    }
    Ok(&first.origin)
}
