use std::collections::BTreeMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{RawQuery, State};

use super::{ApiError, AppState, Envelope, RequestArgs, respond};
use crate::manager::{Action, BatchEntry, StripList};
use crate::strip::{NO_PRESET, StripStatus};

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

pub(super) async fn list_strips(State(state): State<AppState>) -> Json<Envelope<StripList>> {
    respond(state.manager.list_strips().await)
}

pub(super) async fn batch_status(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<BTreeMap<String, BatchEntry>> {
    batch(&state, query.as_deref(), b"", Action::Status).await
}

pub(super) async fn batch_on(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> ApiResult<BTreeMap<String, BatchEntry>> {
    batch(&state, query.as_deref(), &body, Action::On).await
}

pub(super) async fn batch_off(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> ApiResult<BTreeMap<String, BatchEntry>> {
    batch(&state, query.as_deref(), &body, Action::Off).await
}

/// Strip names are the argument keys; their values are ignored.
async fn batch(
    state: &AppState,
    query: Option<&str>,
    body: &[u8],
    action: Action,
) -> ApiResult<BTreeMap<String, BatchEntry>> {
    let args = RequestArgs::from_parts(query, body)?;
    let result = state.manager.batch_request(&args.keys(), action).await?;
    Ok(respond(result))
}

pub(super) async fn strip_get(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<BTreeMap<String, StripStatus>> {
    let args = RequestArgs::from_parts(query.as_deref(), b"")?;
    let name = args.get_str("strip")?;
    let status = state.manager.strip_status(&name).await?;
    Ok(respond(BTreeMap::from([(name, status)])))
}

pub(super) async fn strip_post(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> ApiResult<BTreeMap<String, StripStatus>> {
    let args = RequestArgs::from_parts(query.as_deref(), &body)?;
    let name = args.get_str("strip")?;
    if !state.manager.contains(&name) {
        return Err(crate::Error::StripNotFound(name).into());
    }
    let preset = preset_arg(&args)?;
    let action = args.get_str("action")?;

    let status = state.manager.strip_action(&name, &action, preset).await?;
    Ok(respond(BTreeMap::from([(name, status)])))
}

fn preset_arg(args: &RequestArgs) -> Result<i32, ApiError> {
    let preset = args.get_int("preset", i64::from(NO_PRESET))?;
    i32::try_from(preset).map_err(|_| {
        ApiError(crate::Error::InvalidArgument {
            name: "preset".to_string(),
            reason: format!("{preset} is out of range"),
        })
    })
}
