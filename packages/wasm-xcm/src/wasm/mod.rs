//! WASM bindings for wasm-xcm
//!
//! Thin `#[wasm_bindgen]` namespaces that deserialize JS input, delegate to
//! the core and convert results back. Everything here is synchronous; calls
//! are encoded against runtime metadata handed in by the caller.

pub mod assets;
pub mod builder;
pub mod fees;
pub mod location;
pub mod try_into_js_value;

pub use assets::AssetsNamespace;
pub use builder::BuilderNamespace;
pub use fees::FeesNamespace;
pub use location::LocationNamespace;

use crate::config::XcmConfig;
use crate::error::XcmError;
use serde::de::DeserializeOwned;
use wasm_bindgen::JsValue;

/// Deserialize a JS argument, naming it in the error
pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, XcmError> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| XcmError::InvalidParameter(format!("Invalid {}: {}", what, e)))
}

/// Configuration from an optional JS object; defaults when absent
pub(crate) fn config_from_js(value: JsValue) -> Result<XcmConfig, XcmError> {
    if value.is_undefined() || value.is_null() {
        return Ok(XcmConfig::default());
    }
    let raw: serde_json::Value = from_js(value, "config")?;
    XcmConfig::from_json(&raw.to_string())
}
