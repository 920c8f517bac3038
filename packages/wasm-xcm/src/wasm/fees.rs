//! WASM bindings for amount checks against existential deposits

use crate::error::XcmError;
use crate::fees::{
    query_min_transferable_amount, query_transferable_amount, query_verify_ed_on_destination,
    AmountQuery,
};
use crate::registry::Registry;
use crate::types::parse_u128;
use crate::wasm::from_js;
use wasm_bindgen::prelude::*;

/// Namespace for amount limits; amounts cross the boundary as decimal strings
///
/// # Example query
/// ```json
/// {
///   "origin": "Acala",
///   "destination": "Hydration",
///   "currency": { "symbol": "DOT" },
///   "balance": "10000000000",
///   "originFee": "120000000",
///   "destinationFee": "30000000"
/// }
/// ```
#[wasm_bindgen]
pub struct FeesNamespace;

#[wasm_bindgen]
impl FeesNamespace {
    #[wasm_bindgen(js_name = transferableAmount)]
    pub fn transferable_amount(query: JsValue) -> Result<String, JsValue> {
        let registry = Registry::builtin()?;
        let query: AmountQuery = from_js(query, "query")?;
        Ok(query_transferable_amount(registry, &query)?.to_string())
    }

    #[wasm_bindgen(js_name = minTransferableAmount)]
    pub fn min_transferable_amount(query: JsValue) -> Result<String, JsValue> {
        let registry = Registry::builtin()?;
        let query: AmountQuery = from_js(query, "query")?;
        Ok(query_min_transferable_amount(registry, &query)?.to_string())
    }

    /// Whether `amount` still clears the destination deposit after its fee
    #[wasm_bindgen(js_name = verifyEdOnDestination)]
    pub fn verify_ed_on_destination(query: JsValue, amount: &str) -> Result<bool, JsValue> {
        let registry = Registry::builtin()?;
        let query: AmountQuery = from_js(query, "query")?;
        let amount = parse_u128(amount)
            .map_err(|e| XcmError::InvalidParameter(format!("Invalid amount: {}", e)))?;
        Ok(query_verify_ed_on_destination(registry, &query, amount)?)
    }
}
