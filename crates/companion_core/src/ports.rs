//! crates/companion_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{Companion, QuizResult, SessionRecord, StreakRecord, User, UserCredentials};
use crate::entitlements::Plan;
use crate::quiz::QuizQuestion;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Query Parameter Types
//=========================================================================================

/// Substring filters and range pagination for the companion library.
#[derive(Debug, Clone, Default)]
pub struct CompanionQuery {
    /// Case-insensitive substring match on `subject`.
    pub subject: Option<String>,
    /// Case-insensitive substring match on `topic` or `name`.
    pub topic: Option<String>,
    /// 1-based page number.
    pub page: usize,
    pub limit: usize,
}

/// Fields required to create a companion; the author comes from the caller's
/// identity, never from the payload.
#[derive(Debug, Clone)]
pub struct NewCompanion {
    pub name: String,
    pub subject: String,
    pub topic: String,
    pub duration: i32,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        plan: Plan,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_plan(&self, user_id: Uuid) -> PortResult<Plan>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Companion Management ---
    async fn create_companion(
        &self,
        author_id: Uuid,
        companion: NewCompanion,
    ) -> PortResult<Companion>;

    async fn get_companion_by_id(&self, companion_id: Uuid) -> PortResult<Companion>;

    /// Companions owned by `author_id` matching the query filters, newest first.
    async fn list_companions(
        &self,
        author_id: Uuid,
        query: &CompanionQuery,
    ) -> PortResult<Vec<Companion>>;

    async fn count_companions_by_author(&self, author_id: Uuid) -> PortResult<usize>;

    async fn delete_companion(&self, companion_id: Uuid) -> PortResult<()>;

    // --- Session History ---
    /// Appends a completed session. Returns the stored row joined to its
    /// companion's subject and duration.
    async fn add_session(&self, user_id: Uuid, companion_id: Uuid) -> PortResult<SessionRecord>;

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<SessionRecord>;

    /// The user's sessions, newest first, capped at `limit` when given.
    async fn get_sessions_by_user(
        &self,
        user_id: Uuid,
        limit: Option<usize>,
    ) -> PortResult<Vec<SessionRecord>>;

    /// Most recent sessions across all users, for the landing page.
    async fn get_recent_sessions(&self, limit: usize) -> PortResult<Vec<SessionRecord>>;

    // --- Streaks ---
    /// Fetches the user's streak record, creating a zeroed one if absent.
    async fn get_or_create_streak(&self, user_id: Uuid) -> PortResult<StreakRecord>;

    /// Conditionally advances the streak for a session completed on `today`.
    ///
    /// The write must be atomic: when `last_activity_date` is already `today`
    /// the row is untouched and the current record returned, so concurrent
    /// completions on the same day cannot double-count.
    async fn advance_streak(&self, user_id: Uuid, today: NaiveDate) -> PortResult<StreakRecord>;

    // --- Bookmarks ---
    /// Adds or removes a bookmark; returns whether the companion is now
    /// bookmarked.
    async fn toggle_bookmark(&self, user_id: Uuid, companion_id: Uuid) -> PortResult<bool>;

    /// The user's bookmarked companions, newest bookmark first.
    async fn get_bookmarked_companions(&self, user_id: Uuid) -> PortResult<Vec<Companion>>;

    // --- Quiz Results ---
    async fn save_quiz_result(&self, result: QuizResult) -> PortResult<()>;

    /// All of the user's recorded quiz scores keyed by session id.
    async fn get_quiz_scores(&self, user_id: Uuid) -> PortResult<Vec<QuizResult>>;
}

#[async_trait]
pub trait QuizGenerationService: Send + Sync {
    /// Requests a batch of raw multiple-choice questions for a subject/topic
    /// pair. Validation of the batch is the caller's job.
    async fn generate_questions(
        &self,
        subject: &str,
        topic: &str,
    ) -> PortResult<Vec<QuizQuestion>>;
}
