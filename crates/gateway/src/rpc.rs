use kodi_voice_core::errors::GatewayError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<&'a Value>,
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, id: u64, params: Option<&'a Value>) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, method, id, params }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Extracts `result` from a response body. An `error` object wins over a `result`.
pub fn decode_response(method: &str, body: &str) -> Result<Value, GatewayError> {
    let response: RpcResponse = serde_json::from_str(body)
        .map_err(|error| GatewayError::Decode(format!("`{method}`: {error}")))?;

    if let Some(error) = response.error {
        return Err(GatewayError::Rpc {
            method: method.to_owned(),
            code: error.code,
            message: error.message,
        });
    }

    response.result.ok_or_else(|| GatewayError::MissingResult(method.to_owned()))
}
