//! services/api/src/web/test_support.rs
//!
//! In-memory port stubs for exercising handlers without a database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use companion_core::domain::{
    Companion, QuizResult, SessionRecord, StreakRecord, User, UserCredentials,
};
use companion_core::entitlements::Plan;
use companion_core::ports::{
    CompanionQuery, DatabaseService, NewCompanion, PortError, PortResult, QuizGenerationService,
};
use companion_core::quiz::QuizQuestion;
use uuid::Uuid;

use crate::config::Config;
use crate::web::state::AppState;

fn not_wired() -> PortError {
    PortError::Unexpected("not wired in this test".to_string())
}

/// A canned session row owned by `user_id`.
pub(crate) fn session_for(user_id: Uuid) -> SessionRecord {
    SessionRecord {
        id: Uuid::new_v4(),
        user_id,
        companion_id: Uuid::new_v4(),
        subject: "maths".to_string(),
        duration: Some(30),
        created_at: Utc::now() - Duration::days(1),
    }
}

/// Database stub backed by a fixed session list. Unconfigured operations
/// fail loudly so a test cannot silently depend on them.
#[derive(Default)]
pub(crate) struct StubDb {
    pub sessions: Vec<SessionRecord>,
    pub recorded_limits: Mutex<Vec<Option<usize>>>,
    pub saved_results: Mutex<Vec<QuizResult>>,
}

#[async_trait]
impl DatabaseService for StubDb {
    async fn create_user_with_email(
        &self,
        _email: &str,
        _hashed_password: &str,
        _plan: Plan,
    ) -> PortResult<User> {
        Err(not_wired())
    }

    async fn get_user_by_email(&self, _email: &str) -> PortResult<UserCredentials> {
        Err(not_wired())
    }

    async fn get_user_plan(&self, _user_id: Uuid) -> PortResult<Plan> {
        Err(not_wired())
    }

    async fn create_auth_session(
        &self,
        _session_id: &str,
        _user_id: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        Err(not_wired())
    }

    async fn validate_auth_session(&self, _session_id: &str) -> PortResult<Uuid> {
        Err(not_wired())
    }

    async fn delete_auth_session(&self, _session_id: &str) -> PortResult<()> {
        Err(not_wired())
    }

    async fn create_companion(
        &self,
        _author_id: Uuid,
        _companion: NewCompanion,
    ) -> PortResult<Companion> {
        Err(not_wired())
    }

    async fn get_companion_by_id(&self, _companion_id: Uuid) -> PortResult<Companion> {
        Err(not_wired())
    }

    async fn list_companions(
        &self,
        _author_id: Uuid,
        _query: &CompanionQuery,
    ) -> PortResult<Vec<Companion>> {
        Err(not_wired())
    }

    async fn count_companions_by_author(&self, _author_id: Uuid) -> PortResult<usize> {
        Err(not_wired())
    }

    async fn delete_companion(&self, _companion_id: Uuid) -> PortResult<()> {
        Err(not_wired())
    }

    async fn add_session(&self, _user_id: Uuid, _companion_id: Uuid) -> PortResult<SessionRecord> {
        Err(not_wired())
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<SessionRecord> {
        self.sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    async fn get_sessions_by_user(
        &self,
        user_id: Uuid,
        limit: Option<usize>,
    ) -> PortResult<Vec<SessionRecord>> {
        self.recorded_limits.lock().unwrap().push(limit);
        let mut sessions: Vec<SessionRecord> = self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        if let Some(limit) = limit {
            sessions.truncate(limit);
        }
        Ok(sessions)
    }

    async fn get_recent_sessions(&self, _limit: usize) -> PortResult<Vec<SessionRecord>> {
        Err(not_wired())
    }

    async fn get_or_create_streak(&self, _user_id: Uuid) -> PortResult<StreakRecord> {
        Err(not_wired())
    }

    async fn advance_streak(&self, _user_id: Uuid, _today: NaiveDate) -> PortResult<StreakRecord> {
        Err(not_wired())
    }

    async fn toggle_bookmark(&self, _user_id: Uuid, _companion_id: Uuid) -> PortResult<bool> {
        Err(not_wired())
    }

    async fn get_bookmarked_companions(&self, _user_id: Uuid) -> PortResult<Vec<Companion>> {
        Err(not_wired())
    }

    async fn save_quiz_result(&self, result: QuizResult) -> PortResult<()> {
        self.saved_results.lock().unwrap().push(result);
        Ok(())
    }

    async fn get_quiz_scores(&self, _user_id: Uuid) -> PortResult<Vec<QuizResult>> {
        Err(not_wired())
    }
}

pub(crate) struct StubQuiz;

#[async_trait]
impl QuizGenerationService for StubQuiz {
    async fn generate_questions(
        &self,
        _subject: &str,
        _topic: &str,
    ) -> PortResult<Vec<QuizQuestion>> {
        Err(not_wired())
    }
}

/// Builds an `AppState` over the stub ports, keeping the stub handle around
/// for assertions.
pub(crate) fn state_with(db: Arc<StubDb>) -> Arc<AppState> {
    let config = Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        log_level: tracing::Level::INFO,
        openai_api_key: None,
        quiz_model: "test-model".to_string(),
        cors_origin: "http://localhost:3000".to_string(),
    };
    Arc::new(AppState {
        db,
        config: Arc::new(config),
        quiz_adapter: Arc::new(StubQuiz),
    })
}
