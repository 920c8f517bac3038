//! WASM bindings for the asset registry

use crate::registry::{CurrencySpecifier, Registry};
use crate::types::Chain;
use crate::wasm::from_js;
use crate::wasm::try_into_js_value::TryIntoJsValue;
use wasm_bindgen::prelude::*;

/// Namespace for registry lookups against the built-in asset tables
#[wasm_bindgen]
pub struct AssetsNamespace;

#[wasm_bindgen]
impl AssetsNamespace {
    /// Names of every registered chain
    #[wasm_bindgen(js_name = listChains)]
    pub fn list_chains() -> Result<Vec<String>, JsValue> {
        let registry = Registry::builtin()?;
        Ok(registry.chains().map(|c| c.name.to_string()).collect())
    }

    /// Assets of a chain, native first
    #[wasm_bindgen(js_name = listAssets)]
    pub fn list_assets(chain: &str) -> Result<JsValue, JsValue> {
        let registry = Registry::builtin()?;
        let assets: Vec<_> = registry
            .list_assets(&Chain::from(chain))?
            .into_iter()
            .cloned()
            .collect();
        Ok(assets.try_to_js_value()?)
    }

    /// Native and fee-eligible assets of a chain
    #[wasm_bindgen(js_name = feeAssets)]
    pub fn fee_assets(chain: &str) -> Result<JsValue, JsValue> {
        let registry = Registry::builtin()?;
        let assets: Vec<_> = registry
            .fee_assets(&Chain::from(chain))?
            .into_iter()
            .cloned()
            .collect();
        Ok(assets.try_to_js_value()?)
    }

    /// Resolve a currency on a chain
    ///
    /// # Example currency
    /// ```json
    /// { "symbol": { "type": "Foreign", "value": "USDT" } }
    /// ```
    #[wasm_bindgen(js_name = resolveCurrency)]
    pub fn resolve_currency(chain: &str, currency: JsValue) -> Result<JsValue, JsValue> {
        let registry = Registry::builtin()?;
        let currency: CurrencySpecifier = from_js(currency, "currency")?;
        let resolved = registry.resolve(&Chain::from(chain), &currency)?;
        Ok(resolved.try_to_js_value()?)
    }

    /// Display decimals; `undefined` when unknown
    #[wasm_bindgen(js_name = assetDecimals)]
    pub fn asset_decimals(chain: &str, currency: JsValue) -> Result<Option<u8>, JsValue> {
        let registry = Registry::builtin()?;
        let currency: CurrencySpecifier = from_js(currency, "currency")?;
        Ok(registry.asset_decimals(&Chain::from(chain), &currency)?)
    }

    #[wasm_bindgen(js_name = supportsSymbol)]
    pub fn supports_symbol(chain: &str, symbol: &str) -> Result<bool, JsValue> {
        let registry = Registry::builtin()?;
        Ok(registry.supports_symbol(&Chain::from(chain), symbol))
    }
}
