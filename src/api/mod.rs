//! HTTP surface: printer-host style endpoints under `/machine/<feature>/`
//! and a JSON-RPC endpoint for remote methods and status notifications.

mod args;
mod http;
mod rpc;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use serde_json::json;

use crate::error::Error;
use crate::manager::StripManager;

pub use args::RequestArgs;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub manager: Arc<StripManager>,
    /// Endpoint path segment and remote method suffix, e.g. `rpi_neopixel`.
    pub feature: Arc<str>,
}

/// Build the service router.
pub fn router(manager: Arc<StripManager>, feature: &str) -> Router {
    let base = format!("/machine/{feature}");
    let state = AppState {
        manager,
        feature: Arc::from(feature),
    };

    Router::new()
        .route(&format!("{base}/strips"), get(http::list_strips))
        .route(&format!("{base}/status"), get(http::batch_status))
        .route(&format!("{base}/on"), post(http::batch_on))
        .route(&format!("{base}/off"), post(http::batch_off))
        .route(
            &format!("{base}/strip"),
            get(http::strip_get).post(http::strip_post),
        )
        .route("/server/jsonrpc", post(rpc::handle))
        .with_state(state)
}

/// Successful response body, `{"result": ...}`.
#[derive(Debug, Serialize)]
pub(crate) struct Envelope<T> {
    result: T,
}

pub(crate) fn respond<T: Serialize>(result: T) -> Json<Envelope<T>> {
    Json(Envelope { result })
}

/// [`Error`] rendered as `{"error": {"code", "message"}}`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::StripNotFound(_) => StatusCode::NOT_FOUND,
            Error::Driver { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("request failed: {}", self.0);
        } else {
            log::info!("request rejected: {}", self.0);
        }
        let body = json!({
            "error": { "code": status.as_u16(), "message": self.0.to_string() }
        });
        (status, Json(body)).into_response()
    }
}
