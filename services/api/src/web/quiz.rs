//! services/api/src/web/quiz.rs
//!
//! Quiz generation and result-recording handlers. Generation is Pro-gated
//! and never silently downgrades: a short or malformed batch is an explicit
//! error the client turns into a retry prompt.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use companion_core::domain::QuizResult;
use companion_core::entitlements::AuthContext;
use companion_core::ports::PortError;
use companion_core::quiz::{validate_questions, QuizError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{port_error_response, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct GenerateQuizRequest {
    pub subject: String,
    pub topic: String,
}

/// The generated question set. `correct_answer` and `explanation` ship to
/// the client because scoring happens client-side in a single linear pass.
#[derive(Serialize, ToSchema)]
pub struct GenerateQuizResponse {
    pub questions: serde_json::Value,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordQuizResultRequest {
    pub session_id: Uuid,
    /// Percentage score, 0..=100.
    pub score: u32,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Generate a validated 10-question quiz for a subject/topic pair.
#[utoipa::path(
    post,
    path = "/quiz/generate",
    request_body = GenerateQuizRequest,
    responses(
        (status = 200, description = "Validated question set", body = GenerateQuizResponse),
        (status = 403, description = "Quizzes require the Pro plan"),
        (status = 422, description = "The provider returned too few valid questions"),
        (status = 502, description = "The generation provider failed")
    )
)]
pub async fn generate_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !ctx.plan.can_take_quizzes() {
        return Err((
            StatusCode::FORBIDDEN,
            "Quizzes are available on the Pro plan".to_string(),
        ));
    }

    let raw = state
        .quiz_adapter
        .generate_questions(&req.subject, &req.topic)
        .await
        .map_err(|e| match e {
            PortError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            other => {
                error!("Quiz generation failed for '{}': {:?}", req.topic, other);
                (
                    StatusCode::BAD_GATEWAY,
                    "Quiz generation failed. Please try again.".to_string(),
                )
            }
        })?;

    let questions = validate_questions(raw).map_err(|e: QuizError| {
        error!("Quiz validation failed for '{}': {}", req.topic, e);
        (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })?;

    info!(
        "Generated {} quiz questions for '{}' / '{}'",
        questions.len(),
        req.subject,
        req.topic
    );

    // Serialized through the core type's camelCase wire format.
    let questions = serde_json::to_value(&questions)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(GenerateQuizResponse { questions }))
}

/// Record a quiz score against a study session.
#[utoipa::path(
    post,
    path = "/quiz/results",
    request_body = RecordQuizResultRequest,
    responses(
        (status = 201, description = "Result recorded"),
        (status = 400, description = "Score out of range"),
        (status = 403, description = "Session belongs to another user"),
        (status = 404, description = "Session not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn record_quiz_result_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<RecordQuizResultRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.score > 100 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Score must be between 0 and 100".to_string(),
        ));
    }

    // A result attaches to one of the caller's own sessions: a bogus id is a
    // 404, someone else's session a 403.
    let session = state
        .db
        .get_session_by_id(req.session_id)
        .await
        .map_err(port_error_response)?;
    if session.user_id != ctx.user_id {
        return Err(port_error_response(PortError::Unauthorized));
    }

    state
        .db
        .save_quiz_result(QuizResult {
            user_id: ctx.user_id,
            session_id: req.session_id,
            score: req.score,
        })
        .await
        .map_err(|e| {
            error!("Failed to save quiz result: {:?}", e);
            port_error_response(e)
        })?;

    Ok(StatusCode::CREATED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{session_for, state_with, StubDb};
    use axum::extract::State;
    use companion_core::entitlements::Plan;

    fn ctx(user_id: Uuid) -> AuthContext {
        AuthContext {
            user_id,
            plan: Plan::Pro,
        }
    }

    #[tokio::test]
    async fn recording_against_unknown_session_is_not_found() {
        let db = Arc::new(StubDb::default());
        let state = state_with(db.clone());

        let result = record_quiz_result_handler(
            State(state),
            Extension(ctx(Uuid::new_v4())),
            Json(RecordQuizResultRequest {
                session_id: Uuid::new_v4(),
                score: 80,
            }),
        )
        .await;

        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(db.saved_results.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn recording_against_another_users_session_is_forbidden() {
        let owner = Uuid::new_v4();
        let session = session_for(owner);
        let session_id = session.id;
        let db = Arc::new(StubDb {
            sessions: vec![session],
            ..Default::default()
        });
        let state = state_with(db.clone());

        let result = record_quiz_result_handler(
            State(state),
            Extension(ctx(Uuid::new_v4())),
            Json(RecordQuizResultRequest { session_id, score: 80 }),
        )
        .await;

        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::FORBIDDEN);
        // The other user's recorded score is untouched.
        assert!(db.saved_results.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn recording_against_own_session_saves_the_result() {
        let user_id = Uuid::new_v4();
        let session = session_for(user_id);
        let session_id = session.id;
        let db = Arc::new(StubDb {
            sessions: vec![session],
            ..Default::default()
        });
        let state = state_with(db.clone());

        let result = record_quiz_result_handler(
            State(state),
            Extension(ctx(user_id)),
            Json(RecordQuizResultRequest { session_id, score: 90 }),
        )
        .await;

        assert!(result.is_ok());
        let saved = db.saved_results.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].user_id, user_id);
        assert_eq!(saved[0].session_id, session_id);
        assert_eq!(saved[0].score, 90);
    }
}
