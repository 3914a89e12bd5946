//! services/api/src/web/sessions.rs
//!
//! Handlers for session-history writes and reads, plus the streak endpoint.
//! Completing a session appends to the history and then advances the user's
//! streak through the adapter's atomic conditional update.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use companion_core::domain::SessionRecord;
use companion_core::entitlements::AuthContext;
use companion_core::streak::{streak_status, StreakStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::{port_error_response, state::AppState};

const DEFAULT_SESSION_LIMIT: usize = 10;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, IntoParams)]
pub struct SessionListParams {
    pub limit: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub companion_id: Uuid,
    pub subject: String,
    pub duration: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<SessionRecord> for SessionResponse {
    fn from(s: SessionRecord) -> Self {
        Self {
            id: s.id,
            companion_id: s.companion_id,
            subject: s.subject,
            duration: s.duration,
            created_at: s.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StreakResponse {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    /// "active_today", "safe", or "at_risk".
    pub status: String,
}

fn status_label(status: StreakStatus) -> &'static str {
    match status {
        StreakStatus::ActiveToday => "active_today",
        StreakStatus::Safe => "safe",
        StreakStatus::AtRisk => "at_risk",
    }
}

#[derive(Serialize, ToSchema)]
pub struct CompleteSessionResponse {
    pub session: SessionResponse,
    pub streak: StreakResponse,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Record a completed session with a companion and advance the streak.
#[utoipa::path(
    post,
    path = "/companions/{id}/sessions",
    params(("id" = Uuid, Path, description = "Companion id")),
    responses(
        (status = 201, description = "Session recorded", body = CompleteSessionResponse),
        (status = 404, description = "Companion not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn complete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(companion_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 404 for a bogus companion id before anything is written.
    state
        .db
        .get_companion_by_id(companion_id)
        .await
        .map_err(port_error_response)?;

    let session = state
        .db
        .add_session(ctx.user_id, companion_id)
        .await
        .map_err(|e| {
            error!("Failed to record session: {:?}", e);
            port_error_response(e)
        })?;

    let today = Utc::now().date_naive();
    let streak = state
        .db
        .advance_streak(ctx.user_id, today)
        .await
        .map_err(|e| {
            error!("Failed to advance streak for {}: {:?}", ctx.user_id, e);
            port_error_response(e)
        })?;

    let response = CompleteSessionResponse {
        session: SessionResponse::from(session),
        streak: StreakResponse {
            status: status_label(streak_status(&streak, today)).to_string(),
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            last_activity_date: streak.last_activity_date,
        },
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// The caller's session history, newest first.
#[utoipa::path(
    get,
    path = "/me/sessions",
    params(SessionListParams),
    responses(
        (status = 200, description = "The caller's sessions", body = [SessionResponse])
    )
)]
pub async fn my_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<SessionListParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let limit = params.limit.unwrap_or(DEFAULT_SESSION_LIMIT);
    let sessions = state
        .db
        .get_sessions_by_user(ctx.user_id, Some(limit))
        .await
        .map_err(|e| {
            error!("Failed to fetch sessions: {:?}", e);
            port_error_response(e)
        })?;

    let response: Vec<SessionResponse> = sessions.into_iter().map(SessionResponse::from).collect();
    Ok(Json(response))
}

/// Most recent sessions across all users, for the landing page.
#[utoipa::path(
    get,
    path = "/sessions/recent",
    params(SessionListParams),
    responses(
        (status = 200, description = "Recent sessions", body = [SessionResponse])
    )
)]
pub async fn recent_sessions_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionListParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let limit = params.limit.unwrap_or(DEFAULT_SESSION_LIMIT);
    let sessions = state.db.get_recent_sessions(limit).await.map_err(|e| {
        error!("Failed to fetch recent sessions: {:?}", e);
        port_error_response(e)
    })?;

    let response: Vec<SessionResponse> = sessions.into_iter().map(SessionResponse::from).collect();
    Ok(Json(response))
}

/// The caller's streak record, created zeroed on first access.
#[utoipa::path(
    get,
    path = "/me/streak",
    responses(
        (status = 200, description = "The caller's streak", body = StreakResponse)
    )
)]
pub async fn my_streak_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let streak = state
        .db
        .get_or_create_streak(ctx.user_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch streak: {:?}", e);
            port_error_response(e)
        })?;

    let today = Utc::now().date_naive();
    Ok(Json(StreakResponse {
        status: status_label(streak_status(&streak, today)).to_string(),
        current_streak: streak.current_streak,
        longest_streak: streak.longest_streak,
        last_activity_date: streak.last_activity_date,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{session_for, state_with, StubDb};
    use axum::extract::State;
    use companion_core::entitlements::Plan;

    #[tokio::test]
    async fn session_list_limit_is_pushed_into_the_port() {
        let user_id = Uuid::new_v4();
        let db = Arc::new(StubDb {
            sessions: (0..5).map(|_| session_for(user_id)).collect(),
            ..Default::default()
        });
        let state = state_with(db.clone());
        let ctx = AuthContext {
            user_id,
            plan: Plan::Free,
        };

        let result = my_sessions_handler(
            State(state),
            Extension(ctx),
            Query(SessionListParams { limit: Some(2) }),
        )
        .await;

        assert!(result.is_ok());
        // The cap reaches the query instead of being applied in memory.
        assert_eq!(db.recorded_limits.lock().unwrap().as_slice(), &[Some(2)]);
    }

    #[tokio::test]
    async fn session_list_defaults_its_limit() {
        let user_id = Uuid::new_v4();
        let db = Arc::new(StubDb::default());
        let state = state_with(db.clone());
        let ctx = AuthContext {
            user_id,
            plan: Plan::Free,
        };

        let result =
            my_sessions_handler(State(state), Extension(ctx), Query(SessionListParams { limit: None }))
                .await;

        assert!(result.is_ok());
        assert_eq!(
            db.recorded_limits.lock().unwrap().as_slice(),
            &[Some(DEFAULT_SESSION_LIMIT)]
        );
    }
}
