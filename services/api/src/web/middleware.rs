//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use companion_core::entitlements::AuthContext;
use std::sync::Arc;
use tracing::error;

use crate::web::state::AppState;

/// Middleware that validates the auth session cookie and resolves the
/// caller's identity and plan.
///
/// If valid, inserts an `AuthContext` into request extensions so handlers
/// receive identity and entitlements as an explicit value. If invalid or
/// missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract cookie header
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Parse session ID from cookie
    let auth_session_id = cookie_header
        .split(';')
        .find_map(|c| {
            let c = c.trim();
            c.strip_prefix("session=")
        })
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 3. Validate auth session in database, get user_id
    let user_id = state
        .db
        .validate_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to validate auth session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    // 4. Resolve the caller's plan once, here at the boundary
    let plan = state.db.get_user_plan(user_id).await.map_err(|e| {
        error!("Failed to load plan for user {}: {:?}", user_id, e);
        StatusCode::UNAUTHORIZED
    })?;

    // 5. Insert the full auth context into request extensions
    req.extensions_mut().insert(AuthContext { user_id, plan });

    // 6. Continue to the handler
    Ok(next.run(req).await)
}
