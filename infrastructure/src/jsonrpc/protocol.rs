//! JSON-RPC 2.0 message types for the tool-call protocol.
//!
//! # Protocol Overview
//!
//! - **Requests**: client → broker, `{jsonrpc, id, method, params}`
//! - **Notifications**: client → broker, no `id`, never answered
//! - **Responses**: broker → client, `{jsonrpc, id, result}` or
//!   `{jsonrpc, id, error:{code, message, data?}}`
//!
//! Each message is one line of JSON. Batches are not supported.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

use super::error::DispatchError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol revision advertised in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Scalar request id.
///
/// Numbers are kept exactly as received, so `1.5` or `2^64 - 1` echo back
/// unchanged. `1` and `1.0` are distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(Number),
    String(String),
}

impl RequestId {
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(RequestId::Number(n.clone())),
            Value::String(s) => Some(RequestId::String(s.clone())),
            _ => None,
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Exactly one of `result` / `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    Result(Value),
    Error(RpcError),
}

/// JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    /// `null` only when the request id could not be determined
    pub id: Option<RequestId>,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            payload: ResponsePayload::Result(result),
        }
    }

    pub fn failure(id: Option<RequestId>, error: &DispatchError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: ResponsePayload::Error(error.to_rpc_error()),
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            ResponsePayload::Result(value) => Some(value),
            ResponsePayload::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RpcError> {
        match &self.payload {
            ResponsePayload::Result(_) => None,
            ResponsePayload::Error(error) => Some(error),
        }
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Request {
        id: RequestId,
        method: String,
        params: Option<Value>,
    },
    Notification {
        method: String,
        params: Option<Value>,
    },
}

/// A frame that must be answered with an error.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameError {
    pub id: Option<RequestId>,
    pub error: DispatchError,
}

impl FrameError {
    fn new(id: Option<RequestId>, error: DispatchError) -> Self {
        Self { id, error }
    }
}

/// Decode one line into a request or notification.
pub fn parse_frame(line: &[u8]) -> Result<Incoming, FrameError> {
    let value: Value = serde_json::from_slice(line)
        .map_err(|e| FrameError::new(None, DispatchError::RequestMalformed(e.to_string())))?;
    classify_message(value)
}

/// Classify a parsed JSON value by inspecting `jsonrpc`, `id` and `method`.
pub fn classify_message(value: Value) -> Result<Incoming, FrameError> {
    let Value::Object(mut object) = value else {
        return Err(FrameError::new(
            None,
            DispatchError::RequestInvalid("message must be a JSON object".to_string()),
        ));
    };

    let id = match object.get("id") {
        None => None,
        Some(raw) => match RequestId::from_value(raw) {
            Some(id) => Some(id),
            None => {
                return Err(FrameError::new(
                    None,
                    DispatchError::RequestInvalid(
                        "id must be a string or a number".to_string(),
                    ),
                ));
            }
        },
    };

    let invalid = |reason: &str| FrameError::new(id.clone(), DispatchError::RequestInvalid(reason.to_string()));

    if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(invalid("jsonrpc must be \"2.0\""));
    }

    let method = match object.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => return Err(invalid("method must be a non-empty string")),
    };

    let params = match object.remove("params") {
        None | Some(Value::Null) => None,
        Some(params @ (Value::Object(_) | Value::Array(_))) => Some(params),
        Some(_) => return Err(invalid("params must be an object or an array")),
    };

    Ok(match id {
        Some(id) => Incoming::Request { id, method, params },
        None => Incoming::Notification { method, params },
    })
}

/// `tools/call` params
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// `initialize` result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: &'static str,
    pub capabilities: Value,
    pub server_info: ServerInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_request() {
        let incoming = parse_frame(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).unwrap();
        assert_eq!(
            incoming,
            Incoming::Request {
                id: RequestId::from(1),
                method: "ping".to_string(),
                params: None
            }
        );
    }

    #[test]
    fn classify_string_id() {
        let incoming =
            parse_frame(br#"{"jsonrpc":"2.0","id":"abc","method":"tools/list","params":{}}"#).unwrap();
        assert!(matches!(
            incoming,
            Incoming::Request { id: RequestId::String(ref s), .. } if s == "abc"
        ));
    }

    #[test]
    fn classify_notification() {
        let incoming =
            parse_frame(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(matches!(incoming, Incoming::Notification { .. }));
    }

    #[test]
    fn malformed_json() {
        let err = parse_frame(b"not json").unwrap_err();
        assert_eq!(err.id, None);
        assert_eq!(err.error.code(), -32700);
    }

    #[test]
    fn wrong_version_keeps_id() {
        let err = parse_frame(br#"{"jsonrpc":"1.0","id":7,"method":"ping"}"#).unwrap_err();
        assert_eq!(err.id, Some(RequestId::from(7)));
        assert_eq!(err.error.code(), -32600);
    }

    #[test]
    fn non_object_is_invalid() {
        let err = parse_frame(b"[1,2,3]").unwrap_err();
        assert_eq!(err.error.code(), -32600);
    }

    #[test]
    fn object_id_is_invalid() {
        let err = parse_frame(br#"{"jsonrpc":"2.0","id":{},"method":"ping"}"#).unwrap_err();
        assert_eq!(err.id, None);
        assert_eq!(err.error.code(), -32600);
    }

    #[test]
    fn fractional_and_wide_ids_echo_back() {
        for raw in ["1.5", "18446744073709551615", "-3"] {
            let line = format!(r#"{{"jsonrpc":"2.0","id":{},"method":"ping"}}"#, raw);
            let Incoming::Request { id, .. } = parse_frame(line.as_bytes()).unwrap() else {
                panic!("expected a request for id {}", raw);
            };
            let response = JsonRpcResponse::success(id, json!({}));
            let text = serde_json::to_string(&response).unwrap();
            assert!(text.contains(&format!(r#""id":{}"#, raw)), "{}", text);
        }
    }

    #[test]
    fn fractional_id_errors_keep_id() {
        let err = parse_frame(br#"{"jsonrpc":"1.0","id":2.5,"method":"ping"}"#).unwrap_err();
        let id = err.id.expect("id preserved");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!(2.5));
    }

    #[test]
    fn scalar_params_are_invalid() {
        let err = parse_frame(br#"{"jsonrpc":"2.0","id":1,"method":"ping","params":3}"#).unwrap_err();
        assert_eq!(err.error.code(), -32600);
    }

    #[test]
    fn success_wire_shape() {
        let response = JsonRpcResponse::success(RequestId::from(1), json!({"tools": []}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 1, "result": {"tools": []}}));
    }

    #[test]
    fn error_wire_shape_with_null_id() {
        let response =
            JsonRpcResponse::failure(None, &DispatchError::RequestMalformed("eof".to_string()));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], -32700);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn response_parses_back() {
        let response = JsonRpcResponse::failure(
            Some(RequestId::String("x".to_string())),
            &DispatchError::ToolUnknown("no_such".to_string()),
        );
        let text = serde_json::to_string(&response).unwrap();
        let parsed: JsonRpcResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, response);

        let ok = JsonRpcResponse::success(RequestId::from(3), json!({"content": []}));
        let parsed: JsonRpcResponse = serde_json::from_str(&serde_json::to_string(&ok).unwrap()).unwrap();
        assert_eq!(parsed, ok);
    }
}
