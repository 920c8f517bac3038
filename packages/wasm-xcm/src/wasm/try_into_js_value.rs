//! Rust to JavaScript value conversion
//!
//! Amounts are u128 and cross the boundary as BigInt; locations and
//! junctions use their JSON form so JS sees the same shape it sends in.

use crate::builder::{ClaimOutput, EncodedCall};
use crate::location::{Junction, Location};
use crate::registry::{AssetInfo, ResolvedCurrency};
use crate::types::Chain;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Error type for JS conversion failures
#[derive(Debug, Clone)]
pub struct JsConversionError(String);

impl JsConversionError {
    pub fn new(msg: &str) -> Self {
        JsConversionError(msg.to_string())
    }
}

impl std::fmt::Display for JsConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<JsConversionError> for JsValue {
    fn from(err: JsConversionError) -> Self {
        js_sys::Error::new(&err.0).into()
    }
}

/// Trait for converting Rust types to JavaScript values
pub trait TryIntoJsValue {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError>;
}

impl TryIntoJsValue for String {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        Ok(JsValue::from_str(self))
    }
}

impl TryIntoJsValue for &str {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        Ok(JsValue::from_str(self))
    }
}

impl TryIntoJsValue for bool {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        Ok(JsValue::from_bool(*self))
    }
}

impl TryIntoJsValue for u8 {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        Ok(JsValue::from_f64(*self as f64))
    }
}

impl TryIntoJsValue for u128 {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        // BigInt::from only covers 64 bits
        let s = self.to_string();
        js_sys::BigInt::new(&JsValue::from_str(&s))
            .map(|b| b.into())
            .map_err(|_| JsConversionError::new("Failed to create BigInt"))
    }
}

impl<T: TryIntoJsValue> TryIntoJsValue for Option<T> {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        match self {
            Some(v) => v.try_to_js_value(),
            None => Ok(JsValue::undefined()),
        }
    }
}

impl<T: TryIntoJsValue> TryIntoJsValue for Vec<T> {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        let arr = js_sys::Array::new();
        for item in self {
            arr.push(&item.try_to_js_value()?);
        }
        Ok(arr.into())
    }
}

impl TryIntoJsValue for serde_json::Value {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        // Plain objects rather than `Map`s
        self.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| JsConversionError::new(&format!("JSON conversion error: {}", e)))
    }
}

impl TryIntoJsValue for Chain {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        Ok(JsValue::from_str(self.as_str()))
    }
}

impl TryIntoJsValue for Location {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        self.to_json().try_to_js_value()
    }
}

impl TryIntoJsValue for Junction {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        self.to_json().try_to_js_value()
    }
}

impl TryIntoJsValue for AssetInfo {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        crate::js_obj!(
            "symbol" => self.symbol,
            "decimals" => self.decimals,
            "assetId" => self.asset_id,
            "location" => self.location,
            "isNative" => self.is_native,
            "isFeeAsset" => self.is_fee_asset,
            "existentialDeposit" => self.existential_deposit,
            "alias" => self.alias,
        )
    }
}

impl TryIntoJsValue for ResolvedCurrency {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        let kind = match self {
            ResolvedCurrency::Registered { .. } => "registered",
            ResolvedCurrency::Unregistered { .. } => "unregistered",
            ResolvedCurrency::Overridden { .. } => "overridden",
        };
        crate::js_obj!(
            "type" => kind,
            "location" => self.location().clone(),
            "asset" => self.asset().cloned(),
        )
    }
}

impl TryIntoJsValue for EncodedCall {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        crate::js_obj!(
            "chain" => self.chain,
            "module" => self.module,
            "method" => self.method,
            "parameters" => self.parameters,
            "hex" => self.hex(),
        )
    }
}

impl TryIntoJsValue for ClaimOutput {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        match self {
            ClaimOutput::Call(call) => call.try_to_js_value(),
            ClaimOutput::Hash { chain, hash } => crate::js_obj!(
                "chain" => chain.clone(),
                "hash" => hash.clone(),
            ),
        }
    }
}

/// Macro for building JavaScript objects
#[macro_export]
macro_rules! js_obj {
    ( $( $key:expr => $value:expr ),* $(,)? ) => {{
        use $crate::wasm::try_into_js_value::{TryIntoJsValue, JsConversionError};
        let obj = js_sys::Object::new();
        $(
            js_sys::Reflect::set(
                &obj,
                &wasm_bindgen::JsValue::from_str($key),
                &TryIntoJsValue::try_to_js_value(&$value)?
            ).map_err(|_| JsConversionError::new(&format!("Failed to set property: {}", $key)))?;
        )*
        Ok::<wasm_bindgen::JsValue, JsConversionError>(obj.into())
    }};
}

// WASM tests - only run in wasm32 target
#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_amount_becomes_bigint() {
        let value = 10_000_000_000_000_000_000u128.try_to_js_value().unwrap();
        assert!(value.is_bigint());
    }

    #[wasm_bindgen_test]
    fn test_location_is_plain_object() {
        let value = Location::parent().try_to_js_value().unwrap();
        assert!(value.is_object());
        let parents = js_sys::Reflect::get(&value, &JsValue::from_str("parents")).unwrap();
        assert_eq!(parents.as_f64(), Some(1.0));
    }

    #[wasm_bindgen_test]
    fn test_option_conversion() {
        let none: Option<String> = None;
        assert!(none.try_to_js_value().unwrap().is_undefined());
    }
}
