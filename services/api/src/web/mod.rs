pub mod analytics;
pub mod auth;
pub mod bookmarks;
pub mod companions;
pub mod middleware;
pub mod quiz;
pub mod rest;
pub mod sessions;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use middleware::require_auth;

use axum::http::StatusCode;
use companion_core::ports::PortError;

/// Maps a port error onto the HTTP status taxonomy shared by all handlers.
pub(crate) fn port_error_response(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        PortError::Unauthorized => (StatusCode::FORBIDDEN, "Unauthorized".to_string()),
        PortError::Unexpected(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
    }
}
