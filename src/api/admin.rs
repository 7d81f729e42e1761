//! Admin surface: login, session check, entry listing, CSV export.
//!
//! Everything except `/api/admin/me` is gated by the [`AdminSession`]
//! extractor; `me` inspects the cookie itself because it reports
//! authentication state instead of erroring on it.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::auth::{AdminSession, Sessions};
use crate::csv;
use crate::error::ApiError;
use crate::server::AppState;
use crate::store::Entry;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Candidate admin password.
    #[serde(default)]
    pub password: String,
}

/// Login success body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Always `true`; failures use the error shape instead.
    pub success: bool,
}

/// Session check body.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// Whether the request carried a valid session cookie.
    pub authenticated: bool,
}

/// Entry listing body.
#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    /// All entries, newest first.
    pub entries: Vec<Entry>,
}

/// `POST /api/admin/login`
#[tracing::instrument(name = "admin_login", skip_all)]
pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request: LoginRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::bad_request("Invalid JSON"))?;
    if request.password.is_empty() {
        return Err(ApiError::bad_request("Password required"));
    }
    if !state.sessions.validate_credential(&request.password) {
        tracing::warn!("Admin login rejected");
        return Err(ApiError::unauthorized("Invalid password"));
    }

    let token = state
        .sessions
        .issue()
        .map_err(|e| ApiError::internal("Failed to create session").with_source(e.into()))?;
    tracing::info!("Admin login succeeded");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, Sessions::session_cookie(&token))],
        Json(LoginResponse { success: true }),
    )
        .into_response())
}

/// `GET /api/admin/me` — never errors; absent, expired, and forged cookies
/// all read as unauthenticated.
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Json<MeResponse> {
    Json(MeResponse {
        authenticated: state.sessions.authenticated(&headers),
    })
}

/// `GET /api/admin/entries`
#[tracing::instrument(name = "admin_list_entries", skip_all)]
pub async fn entries(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<EntriesResponse>, ApiError> {
    let entries = state
        .store
        .list_entries()
        .await
        .map_err(|e| ApiError::internal("Failed to load entries").with_source(e.into()))?;
    Ok(Json(EntriesResponse { entries }))
}

/// `GET /api/admin/export-csv`
#[tracing::instrument(name = "admin_export_csv", skip_all)]
pub async fn export_csv(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let entries = state
        .store
        .list_entries()
        .await
        .map_err(|e| ApiError::internal("Failed to load entries").with_source(e.into()))?;
    let document = csv::render_entries(&entries);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"entries.csv\"",
            ),
        ],
        document,
    )
        .into_response())
}
