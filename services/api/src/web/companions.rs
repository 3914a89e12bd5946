//! services/api/src/web/companions.rs
//!
//! Handlers for creating, listing, fetching, and deleting companions.
//! Creation is gated by the caller's plan limit; deletion is owner-only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use companion_core::domain::Companion;
use companion_core::entitlements::AuthContext;
use companion_core::ports::{CompanionQuery, NewCompanion, PortError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::{port_error_response, state::AppState};

const DEFAULT_PAGE_SIZE: usize = 10;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateCompanionRequest {
    pub name: String,
    pub subject: String,
    pub topic: String,
    /// Session length in minutes.
    pub duration: i32,
}

#[derive(Deserialize, IntoParams)]
pub struct CompanionListParams {
    /// Case-insensitive substring filter on subject.
    pub subject: Option<String>,
    /// Case-insensitive substring filter on topic or name.
    pub topic: Option<String>,
    /// 1-based page number.
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct CompanionResponse {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub topic: String,
    pub duration: i32,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Companion> for CompanionResponse {
    fn from(c: Companion) -> Self {
        Self {
            id: c.id,
            name: c.name,
            subject: c.subject,
            topic: c.topic,
            duration: c.duration,
            author_id: c.author_id,
            created_at: c.created_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a new companion, subject to the caller's plan limit.
#[utoipa::path(
    post,
    path = "/companions",
    request_body = CreateCompanionRequest,
    responses(
        (status = 201, description = "Companion created", body = CompanionResponse),
        (status = 403, description = "Companion limit reached for the caller's plan"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_companion_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateCompanionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owned = state
        .db
        .count_companions_by_author(ctx.user_id)
        .await
        .map_err(port_error_response)?;

    if !ctx.can_create_companion(owned) {
        return Err((
            StatusCode::FORBIDDEN,
            "Companion limit reached for your plan".to_string(),
        ));
    }

    let companion = state
        .db
        .create_companion(
            ctx.user_id,
            NewCompanion {
                name: req.name,
                subject: req.subject,
                topic: req.topic,
                duration: req.duration,
            },
        )
        .await
        .map_err(|e| {
            error!("Failed to create companion: {:?}", e);
            port_error_response(e)
        })?;

    Ok((StatusCode::CREATED, Json(CompanionResponse::from(companion))))
}

/// List the caller's companions with optional subject/topic filters.
#[utoipa::path(
    get,
    path = "/companions",
    params(CompanionListParams),
    responses(
        (status = 200, description = "Filtered companion list", body = [CompanionResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_companions_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<CompanionListParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let query = CompanionQuery {
        subject: params.subject,
        topic: params.topic,
        page: params.page.unwrap_or(1),
        limit: params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    };

    let companions = state
        .db
        .list_companions(ctx.user_id, &query)
        .await
        .map_err(|e| {
            error!("Failed to list companions: {:?}", e);
            port_error_response(e)
        })?;

    let response: Vec<CompanionResponse> =
        companions.into_iter().map(CompanionResponse::from).collect();
    Ok(Json(response))
}

/// Fetch a single companion by id.
#[utoipa::path(
    get,
    path = "/companions/{id}",
    params(("id" = Uuid, Path, description = "Companion id")),
    responses(
        (status = 200, description = "The companion", body = CompanionResponse),
        (status = 404, description = "Companion not found")
    )
)]
pub async fn get_companion_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let companion = state
        .db
        .get_companion_by_id(id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(CompanionResponse::from(companion)))
}

/// Delete a companion the caller owns.
#[utoipa::path(
    delete,
    path = "/companions/{id}",
    params(("id" = Uuid, Path, description = "Companion id")),
    responses(
        (status = 204, description = "Companion deleted"),
        (status = 403, description = "Caller does not own this companion"),
        (status = 404, description = "Companion not found")
    )
)]
pub async fn delete_companion_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // Ownership check before the delete; another user's companion is 403.
    let companion = state
        .db
        .get_companion_by_id(id)
        .await
        .map_err(port_error_response)?;

    if companion.author_id != ctx.user_id {
        return Err(port_error_response(PortError::Unauthorized));
    }

    state
        .db
        .delete_companion(id)
        .await
        .map_err(|e| {
            error!("Failed to delete companion {}: {:?}", id, e);
            port_error_response(e)
        })?;

    Ok(StatusCode::NO_CONTENT)
}
