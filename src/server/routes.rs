//! Request handlers. Blocking stage work runs on the blocking thread pool.

use std::fmt::Display;
use std::path::PathBuf;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use super::AppState;
use crate::collector;
use crate::trainer::{self, TrainError, TriggerPayload};

#[derive(Debug, Serialize)]
pub(crate) struct CollectResponse {
    message: &'static str,
    csv_path: PathBuf,
    trigger_status: u16,
}

pub(crate) async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub(crate) async fn collect(State(state): State<AppState>) -> Response {
    let AppState { config, trigger } = state;
    let result =
        tokio::task::spawn_blocking(move || collector::collect(&config, trigger.as_ref())).await;
    match result {
        Ok(Ok(outcome)) => Json(CollectResponse {
            message: "Success",
            csv_path: outcome.csv_path,
            trigger_status: outcome.trigger_status,
        })
        .into_response(),
        Ok(Err(err)) => internal_error(&err),
        Err(err) => internal_error(&err),
    }
}

pub(crate) async fn train(State(state): State<AppState>, body: Bytes) -> Response {
    let Ok(payload) = serde_json::from_slice::<TriggerPayload>(&body) else {
        return bad_request(&TrainError::InvalidInput(state.config.variant));
    };
    let config = state.config;
    let result = tokio::task::spawn_blocking(move || trainer::train(&config, &payload)).await;
    match result {
        Ok(Ok(outcome)) => Json(outcome).into_response(),
        Ok(Err(err)) if err.is_client_error() => bad_request(&err),
        Ok(Err(err)) => internal_error(&err),
        Err(err) => internal_error(&err),
    }
}

fn bad_request(err: &TrainError) -> Response {
    warn!(error = %err, "Rejected training request");
    (StatusCode::BAD_REQUEST, err.to_string()).into_response()
}

fn internal_error(err: &dyn Display) -> Response {
    error!(error = %err, "Pipeline stage failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Internal Server Error: {err}"),
    )
        .into_response()
}
