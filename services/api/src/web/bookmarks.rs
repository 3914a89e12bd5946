//! services/api/src/web/bookmarks.rs
//!
//! Bookmark toggle and listing handlers. A failed bookmark fetch degrades to
//! an empty list rather than failing the caller's page.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use companion_core::entitlements::AuthContext;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::companions::CompanionResponse;
use crate::web::{port_error_response, state::AppState};

#[derive(Serialize, ToSchema)]
pub struct ToggleBookmarkResponse {
    pub bookmarked: bool,
}

/// Toggle a bookmark on a companion.
#[utoipa::path(
    put,
    path = "/companions/{id}/bookmark",
    params(("id" = Uuid, Path, description = "Companion id")),
    responses(
        (status = 200, description = "New bookmark state", body = ToggleBookmarkResponse),
        (status = 404, description = "Companion not found")
    )
)]
pub async fn toggle_bookmark_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(companion_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // Toggling a bookmark on a missing companion is a 404, not a dangling row.
    state
        .db
        .get_companion_by_id(companion_id)
        .await
        .map_err(port_error_response)?;

    let bookmarked = state
        .db
        .toggle_bookmark(ctx.user_id, companion_id)
        .await
        .map_err(|e| {
            error!("Failed to toggle bookmark: {:?}", e);
            port_error_response(e)
        })?;

    Ok(Json(ToggleBookmarkResponse { bookmarked }))
}

/// The caller's bookmarked companions, newest bookmark first.
#[utoipa::path(
    get,
    path = "/me/bookmarks",
    responses(
        (status = 200, description = "Bookmarked companions", body = [CompanionResponse])
    )
)]
pub async fn my_bookmarks_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Json<Vec<CompanionResponse>> {
    // A bookmark fetch failure should not take down the page it decorates.
    let companions = match state.db.get_bookmarked_companions(ctx.user_id).await {
        Ok(companions) => companions,
        Err(e) => {
            error!("Failed to fetch bookmarks for {}: {:?}", ctx.user_id, e);
            Vec::new()
        }
    };
    Json(companions.into_iter().map(CompanionResponse::from).collect())
}
