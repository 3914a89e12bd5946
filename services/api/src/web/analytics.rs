//! services/api/src/web/analytics.rs
//!
//! The Pro analytics endpoint: fetches the caller's raw rows and hands them
//! to the pure aggregator in the core crate.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::Utc;
use companion_core::analytics::{compute_snapshot, AnalyticsInput};
use companion_core::entitlements::AuthContext;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::web::{port_error_response, state::AppState};

/// The caller's analytics dashboard data. Pro plan only.
#[utoipa::path(
    get,
    path = "/me/analytics",
    responses(
        (status = 200, description = "Derived analytics snapshot"),
        (status = 403, description = "Analytics require the Pro plan"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn my_analytics_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !ctx.plan.can_view_analytics() {
        return Err((
            StatusCode::FORBIDDEN,
            "Analytics are available on the Pro plan".to_string(),
        ));
    }

    let sessions = state
        .db
        .get_sessions_by_user(ctx.user_id, None)
        .await
        .map_err(|e| {
            error!("Failed to fetch sessions for analytics: {:?}", e);
            port_error_response(e)
        })?;

    let companions_created = state
        .db
        .count_companions_by_author(ctx.user_id)
        .await
        .map_err(port_error_response)?;

    let streak = state
        .db
        .get_or_create_streak(ctx.user_id)
        .await
        .map_err(port_error_response)?;

    let quiz_scores: HashMap<Uuid, u32> = state
        .db
        .get_quiz_scores(ctx.user_id)
        .await
        .map_err(port_error_response)?
        .into_iter()
        .map(|r| (r.session_id, r.score))
        .collect();

    let snapshot = compute_snapshot(&AnalyticsInput {
        sessions: &sessions,
        companions_created,
        streak: &streak,
        quiz_scores: &quiz_scores,
        today: Utc::now().date_naive(),
    });

    Ok(Json(snapshot))
}
