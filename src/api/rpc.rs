use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::AppState;
use crate::color::Color;
use crate::error::Error;
use crate::strip::NO_PRESET;

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const SERVER_ERROR: i32 = -32000;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    method: String,
    #[serde(default)]
    params: Value,
    /// Absent for notifications. An explicit `null` id still gets a response.
    #[serde(default, deserialize_with = "present")]
    id: Option<Value>,
}

fn present<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
    id: Value,
}

impl RpcResponse {
    fn new(outcome: Result<Value, RpcError>, id: Value) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            jsonrpc: "2.0",
            result,
            error,
            id,
        }
    }
}

impl From<Error> for RpcError {
    fn from(err: Error) -> Self {
        Self {
            code: SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SetStateParams {
    strip: String,
    #[serde(default)]
    state: Value,
    #[serde(default = "no_preset")]
    preset: i32,
}

#[derive(Debug, Deserialize)]
struct SetPixelParams {
    strip: String,
    #[serde(default)]
    red: f64,
    #[serde(default)]
    green: f64,
    #[serde(default)]
    blue: f64,
    #[serde(default)]
    white: f64,
    #[serde(default)]
    index: Option<i64>,
    #[serde(default = "transmit_default")]
    transmit: Value,
}

fn no_preset() -> i32 {
    NO_PRESET
}

fn transmit_default() -> Value {
    json!(1)
}

/// Macros pass `TRANSMIT=1`; anything but 1 (or `true`) buffers only.
fn is_transmit(value: &Value) -> bool {
    value.as_f64() == Some(1.0) || value.as_bool() == Some(true)
}

fn params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError {
        code: INVALID_PARAMS,
        message: e.to_string(),
    })
}

pub(super) async fn handle(State(state): State<AppState>, body: Bytes) -> Response {
    let request: RpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let error = RpcError {
                code: PARSE_ERROR,
                message: e.to_string(),
            };
            return Json(RpcResponse::new(Err(error), Value::Null)).into_response();
        }
    };

    debug!("rpc: {}", request.method);
    let outcome = dispatch(&state, &request.method, request.params).await;

    match request.id {
        Some(id) => Json(RpcResponse::new(outcome, id)).into_response(),
        None => {
            if let Err(error) = outcome {
                warn!("rpc notification {} failed: {}", request.method, error.message);
            }
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

async fn dispatch(state: &AppState, method: &str, raw: Value) -> Result<Value, RpcError> {
    if method == "notify_status_update" {
        // Host notifications carry `[status, eventtime]`.
        let snapshot = match raw {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        state.manager.handle_status_update(&snapshot).await?;
        return Ok(json!("ok"));
    }

    let suffix = method
        .strip_prefix("set_")
        .and_then(|rest| rest.strip_prefix(&*state.feature));
    match suffix {
        Some("_state") => {
            let p: SetStateParams = params(raw)?;
            state.manager.set_state(&p.strip, &p.state, p.preset).await?;
        }
        Some("") => {
            let p: SetPixelParams = params(raw)?;
            let color = Color::new(p.red, p.green, p.blue, p.white);
            state
                .manager
                .set_pixel(&p.strip, color, p.index, is_transmit(&p.transmit))
                .await?;
        }
        _ => {
            return Err(RpcError {
                code: METHOD_NOT_FOUND,
                message: format!("Method not found: {method}"),
            });
        }
    }
    Ok(json!("ok"))
}
