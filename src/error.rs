/// Errors raised at the boundary with the browser's JS APIs
use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("browser call failed: {0}")]
    Js(String),

    #[error("failed to convert browser data: {0}")]
    Serde(String),
}

impl From<JsValue> for BridgeError {
    fn from(value: JsValue) -> Self {
        BridgeError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

impl From<serde_wasm_bindgen::Error> for BridgeError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        BridgeError::Serde(err.to_string())
    }
}

impl From<BridgeError> for JsValue {
    fn from(err: BridgeError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
