//! WASM bindings for location handling

use crate::location::{extract_asset_reference, flatten, localize, normalize, Location};
use crate::registry::Registry;
use crate::types::Chain;
use crate::wasm::from_js;
use crate::wasm::try_into_js_value::TryIntoJsValue;
use wasm_bindgen::prelude::*;

/// Namespace for location parsing and transforms
#[wasm_bindgen]
pub struct LocationNamespace;

#[wasm_bindgen]
impl LocationNamespace {
    /// Prefix a chain-local location with the chain that produced it
    ///
    /// # Arguments
    /// * `location` - Location in any accepted JSON form
    /// * `para_id` - Parachain the location is local to
    #[wasm_bindgen]
    pub fn normalize(location: JsValue, para_id: u32) -> Result<JsValue, JsValue> {
        let location: Location = from_js(location, "location")?;
        Ok(normalize(&location, para_id)?.try_to_js_value()?)
    }

    /// Junction list of an interior (`"Here"`, `{"X2": [...]}` or an array)
    #[wasm_bindgen]
    pub fn flatten(interior: JsValue) -> Result<JsValue, JsValue> {
        let raw: serde_json::Value = from_js(interior, "interior")?;
        Ok(flatten(&raw)?.try_to_js_value()?)
    }

    /// Location an asset refers to, from a versioned or bare asset object
    #[wasm_bindgen(js_name = extractAssetReference)]
    pub fn extract_asset_reference(asset: JsValue) -> Result<JsValue, JsValue> {
        let raw: serde_json::Value = from_js(asset, "asset")?;
        Ok(extract_asset_reference(&raw)?.try_to_js_value()?)
    }

    /// Canonical location as seen from a registered chain
    #[wasm_bindgen]
    pub fn localize(chain: &str, location: JsValue) -> Result<JsValue, JsValue> {
        let registry = Registry::builtin()?;
        let meta = registry.chain_meta(&Chain::from(chain))?;
        let location: Location = from_js(location, "location")?;
        Ok(localize(meta.vantage(), &location).try_to_js_value()?)
    }
}
