//! HTTP request handlers.

use crate::catalog::{BookForm, Direction, Record, SortKey};
use crate::error::{AppError, Result};
use crate::server::AppState;
use crate::session::SessionState;
use crate::store::User;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::Html,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// WEB PAGES
// ============================================================================

/// Index page (simple HTML), routed by the session gate.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let body = match state.gate.current() {
        SessionState::Loading => "<p>Loading…</p>".to_string(),
        SessionState::Authenticated(_) => format!(
            "<p><strong>{}</strong> books in the catalog.</p>\
             <p>API root: <code>/api/books</code></p>",
            state.view.len()
        ),
        SessionState::Unauthenticated => {
            "<p>Sign in via <code>POST /api/auth/login</code> to manage the catalog.</p>"
                .to_string()
        }
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 600px; margin: 2rem auto; padding: 0 1rem; }}
        h1 {{ color: #333; }}
        code {{ background: #e8e8e8; padding: 0.2rem 0.4rem; border-radius: 4px; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    {body}
</body>
</html>"#,
        title = state.config.server.title,
        body = body,
    );

    Html(html)
}

// ============================================================================
// AUTH API
// ============================================================================

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
    user_id: String,
    email: String,
}

/// Register request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
}

/// Auth login.
pub async fn auth_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (user, token) = state.auth.login(&req.email, &req.password)?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        email: user.email,
    }))
}

/// Auth register. The new account is not signed in; log in separately.
pub async fn auth_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state.auth.register(&req.email, &req.password)?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Auth logout.
pub async fn auth_logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    if let Some(token) = extract_token(&headers) {
        state.auth.logout(&token)?;
    }
    Ok(StatusCode::OK)
}

/// Get current user info.
pub async fn auth_me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<User>> {
    let user = get_authenticated_user(&state, &headers)?;
    Ok(Json(user))
}

// ============================================================================
// CATALOG API
// ============================================================================

/// Book list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct BookListParams {
    /// Sort key; absent leaves the catalog's current order.
    sort: Option<SortKey>,
    /// Sort direction.
    #[serde(default)]
    dir: Direction,
    /// Case-insensitive search over title and author.
    #[serde(default)]
    q: String,
}

/// List the catalog, sorted and filtered.
pub async fn books_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BookListParams>,
) -> Result<Json<Vec<Record>>> {
    get_authenticated_user(&state, &headers)?;

    let records = state.view.sorted_filtered(params.sort, params.dir, &params.q);
    Ok(Json(records))
}

/// Create a record.
pub async fn books_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<BookForm>,
) -> Result<(StatusCode, Json<Record>)> {
    get_authenticated_user(&state, &headers)?;

    let record = state.view.submit(&form, None)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Update an existing record.
pub async fn books_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(form): Json<BookForm>,
) -> Result<Json<Record>> {
    get_authenticated_user(&state, &headers)?;

    let record = state.view.submit(&form, Some(&id))?;
    Ok(Json(record))
}

/// Delete a record. Deleting an unknown ID still returns OK.
pub async fn books_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    get_authenticated_user(&state, &headers)?;

    state.view.delete(&id)?;
    Ok(StatusCode::OK)
}

/// Reorder request.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    dragged_id: String,
    target_id: String,
}

/// Move a record before another in the in-memory view only.
pub async fn books_reorder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ReorderRequest>,
) -> Result<StatusCode> {
    get_authenticated_user(&state, &headers)?;

    state.view.move_before(&req.dragged_id, &req.target_id);
    Ok(StatusCode::OK)
}

// ============================================================================
// IMAGE API
// ============================================================================

/// Encoded image response.
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    data_uri: String,
}

/// Encode an uploaded cover image into a data URI.
///
/// The raw image bytes are the request body; the declared type is the
/// Content-Type header.
pub async fn images_encode(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImageResponse>> {
    get_authenticated_user(&state, &headers)?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::validation("image", "wrong-type"))?;

    let data_uri = state.encoder.encode(&body, content_type)?;
    Ok(Json(ImageResponse { data_uri }))
}

// ============================================================================
// HELPERS
// ============================================================================

/// Extract bearer token from headers.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Get authenticated user from token.
fn get_authenticated_user(state: &AppState, headers: &HeaderMap) -> Result<User> {
    let token = extract_token(headers)
        .ok_or_else(|| AppError::validation("authorization", "missing-token"))?;

    state
        .auth
        .validate_token(&token)?
        .ok_or_else(|| AppError::validation("authorization", "invalid-token"))
}
