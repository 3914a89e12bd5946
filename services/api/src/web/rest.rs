//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, aggregating every
//! documented handler and schema in the web layer.

use utoipa::OpenApi;

use crate::web::{analytics, auth, bookmarks, companions, quiz, sessions};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        companions::create_companion_handler,
        companions::list_companions_handler,
        companions::get_companion_handler,
        companions::delete_companion_handler,
        sessions::complete_session_handler,
        sessions::my_sessions_handler,
        sessions::recent_sessions_handler,
        sessions::my_streak_handler,
        bookmarks::toggle_bookmark_handler,
        bookmarks::my_bookmarks_handler,
        quiz::generate_quiz_handler,
        quiz::record_quiz_result_handler,
        analytics::my_analytics_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            companions::CreateCompanionRequest,
            companions::CompanionResponse,
            sessions::SessionResponse,
            sessions::StreakResponse,
            sessions::CompleteSessionResponse,
            bookmarks::ToggleBookmarkResponse,
            quiz::GenerateQuizRequest,
            quiz::GenerateQuizResponse,
            quiz::RecordQuizResultRequest,
        )
    ),
    tags(
        (name = "Learning Companion API", description = "API endpoints for companions, study sessions, streaks, quizzes, and analytics.")
    )
)]
pub struct ApiDoc;
