use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::PlayauthError;
use crate::oauth::{build_authorize_url, ExchangeRequest};

use super::AppState;

type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/settings", get(get_settings).put(put_settings))
        .route("/authorizeUrl", get(authorize_url))
        .route("/requestToken", post(request_token))
        .fallback(not_found)
        .with_state(state)
}

async fn get_settings(State(state): State<SharedState>) -> Response {
    Json(state.settings.get()).into_response()
}

async fn put_settings(State(state): State<SharedState>, body: String) -> Response {
    let patch: serde_json::Value = match serde_json::from_str(&body) {
        Ok(patch) => patch,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "invalid_json", e.to_string()),
    };

    let settings = state.settings.clone();
    let merged = tokio::task::spawn_blocking(move || settings.merge(patch))
        .await
        .unwrap_or_else(|e| Err(PlayauthError::IoError(std::io::Error::other(e))));

    match merged {
        Ok(settings) => {
            tracing::info!("settings updated");
            (StatusCode::OK, Json(settings)).into_response()
        }
        Err(e @ PlayauthError::InvalidInput(_)) => {
            error_response(StatusCode::BAD_REQUEST, e.code(), e.to_string())
        }
        Err(e) => {
            tracing::error!("failed to persist settings: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.code(), e.to_string())
        }
    }
}

async fn authorize_url(State(state): State<SharedState>) -> Response {
    let credentials = state.settings.credentials();
    let url = build_authorize_url(
        &state.verifications,
        &state.endpoints.authorize_url,
        &credentials,
    );
    (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response()
}

async fn request_token(State(state): State<SharedState>, body: String) -> Response {
    let request: ExchangeRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "invalid_request", e.to_string())
        }
    };

    match state.gateway.exchange(&request).await {
        Ok(token) => (StatusCode::OK, Json(token)).into_response(),
        Err(e) => {
            let status = StatusCode::from_u16(e.status()).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(e.body())).into_response()
        }
    }
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        "",
    )
        .into_response()
}

fn error_response(status: StatusCode, error: &str, description: String) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": error,
            "error_description": description,
        })),
    )
        .into_response()
}
