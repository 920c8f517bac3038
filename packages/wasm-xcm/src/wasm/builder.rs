//! WASM bindings for call building
//!
//! BuilderNamespace composes calls from plans and encodes them against the
//! runtime metadata of the executing chain, passed in as hex by the caller.

use crate::builder::calls::RuntimeEncoder;
use crate::builder::channel::{compose_channel_close, compose_channel_open};
use crate::builder::claim::compose_claim;
use crate::builder::types::{
    BatchMode, ChannelClosePlan, ChannelOpenPlan, ClaimPlan, TransferPlan, ValidatedTransfer,
};
use crate::builder::{
    compose_batch, compose_transfer, validate_transfer, ClaimOutput, EncodedCall, XcmCall,
};
use crate::error::XcmError;
use crate::registry::{ChainMeta, Registry};
use crate::wasm::try_into_js_value::TryIntoJsValue;
use crate::wasm::{config_from_js, from_js};
use wasm_bindgen::prelude::*;

/// Namespace for building operations
#[wasm_bindgen]
pub struct BuilderNamespace;

#[wasm_bindgen]
impl BuilderNamespace {
    /// Validate and compose a transfer without encoding it
    ///
    /// # Returns
    /// `{ module, method, parameters, amount, amountNormalized, belowExistentialDeposit }`
    ///
    /// # Example Plan
    /// ```json
    /// {
    ///   "from": "Acala",
    ///   "to": "Hydration",
    ///   "currency": { "symbol": "DOT" },
    ///   "amount": "10000000000",
    ///   "address": "5EGoFA95omzemRssELLDjVenNZ68aXyUeqtKQScXSEBvVJkr"
    /// }
    /// ```
    #[wasm_bindgen(js_name = composeTransfer)]
    pub fn compose_transfer_wasm(plan: JsValue, config: JsValue) -> Result<JsValue, JsValue> {
        let transfer = validated(plan, config)?;
        let call = compose_transfer(&transfer)?;
        Ok(crate::js_obj!(
            "module" => call.module,
            "method" => call.method,
            "parameters" => call.parameters(),
            "amount" => transfer.amount,
            "amountNormalized" => transfer.amount_normalized,
            "belowExistentialDeposit" => transfer.below_existential_deposit,
        )?)
    }

    /// Build a transfer encoded against the origin chain's metadata
    ///
    /// # Returns
    /// `{ chain, module, method, parameters, hex }`
    #[wasm_bindgen(js_name = buildTransfer)]
    pub fn build_transfer_wasm(
        plan: JsValue,
        metadata_hex: &str,
        config: JsValue,
    ) -> Result<JsValue, JsValue> {
        let transfer = validated(plan, config)?;
        let call = compose_transfer(&transfer)?;
        let encoded = encode_with(metadata_hex, &transfer.origin, &call)?;
        Ok(encoded.try_to_js_value()?)
    }

    /// Build a utility batch of transfers sharing one origin
    ///
    /// `mode` is `atomic` (default), `stopOnError` or `continueOnError`.
    #[wasm_bindgen(js_name = buildBatch)]
    pub fn build_batch_wasm(
        plans: JsValue,
        mode: JsValue,
        metadata_hex: &str,
        config: JsValue,
    ) -> Result<JsValue, JsValue> {
        let registry = Registry::builtin()?;
        let config = config_from_js(config)?;
        let plans: Vec<TransferPlan> = from_js(plans, "plans")?;
        let mode: BatchMode = if mode.is_undefined() || mode.is_null() {
            BatchMode::default()
        } else {
            from_js(mode, "batch mode")?
        };

        let transfers = plans
            .iter()
            .map(|plan| validate_transfer(plan, registry, &config))
            .collect::<Result<Vec<_>, _>>()?;
        let call = compose_batch(&transfers, mode)?;
        let origin = transfers
            .first()
            .map(|t| &t.origin)
            .ok_or_else(|| XcmError::BatchValidation("Batch is empty".to_string()))?;
        let encoded = encode_with(metadata_hex, origin, &call)?;
        Ok(encoded.try_to_js_value()?)
    }

    /// Build a claim of trapped assets, or just its hash when `hashOnly` is set
    #[wasm_bindgen(js_name = buildClaim)]
    pub fn build_claim_wasm(
        plan: JsValue,
        metadata_hex: &str,
        config: JsValue,
    ) -> Result<JsValue, JsValue> {
        let registry = Registry::builtin()?;
        let config = config_from_js(config)?;
        let plan: ClaimPlan = from_js(plan, "claim")?;
        let (chain, call) = compose_claim(&plan, registry, &config)?;
        let encoded = encode_with(metadata_hex, chain, &call)?;
        let output = if plan.hash_only {
            ClaimOutput::Hash {
                chain: encoded.chain.clone(),
                hash: format!("0x{}", hex::encode(encoded.hash())),
            }
        } else {
            ClaimOutput::Call(encoded)
        };
        Ok(output.try_to_js_value()?)
    }

    /// Open an HRMP channel; encoded against the relay chain's metadata
    #[wasm_bindgen(js_name = buildChannelOpen)]
    pub fn build_channel_open_wasm(
        plan: JsValue,
        metadata_hex: &str,
        config: JsValue,
    ) -> Result<JsValue, JsValue> {
        let registry = Registry::builtin()?;
        let config = config_from_js(config)?;
        let plan: ChannelOpenPlan = from_js(plan, "channel")?;
        let (relay, call) = compose_channel_open(&plan, registry, &config)?;
        Ok(encode_with(metadata_hex, relay, &call)?.try_to_js_value()?)
    }

    /// Force-clean the HRMP channels of a parachain
    #[wasm_bindgen(js_name = buildChannelClose)]
    pub fn build_channel_close_wasm(
        plan: JsValue,
        metadata_hex: &str,
        config: JsValue,
    ) -> Result<JsValue, JsValue> {
        let registry = Registry::builtin()?;
        let config = config_from_js(config)?;
        let plan: ChannelClosePlan = from_js(plan, "channel")?;
        let (relay, call) = compose_channel_close(&plan, registry, &config)?;
        Ok(encode_with(metadata_hex, relay, &call)?.try_to_js_value()?)
    }
}

fn validated(plan: JsValue, config: JsValue) -> Result<ValidatedTransfer, XcmError> {
    let registry = Registry::builtin()?;
    let config = config_from_js(config)?;
    let plan: TransferPlan = from_js(plan, "plan")?;
    validate_transfer(&plan, registry, &config)
}

fn encode_with(
    metadata_hex: &str,
    chain: &ChainMeta,
    call: &XcmCall,
) -> Result<EncodedCall, XcmError> {
    let encoder = RuntimeEncoder::from_hex(metadata_hex)?;
    let data = encoder.encode(call)?;
    Ok(EncodedCall::new(&chain.name, call, data))
}
