//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use companion_core::domain::{
    Companion, QuizResult, SessionRecord as Session, StreakRecord, User, UserCredentials,
};
use companion_core::entitlements::Plan;
use companion_core::ports::{CompanionQuery, DatabaseService, NewCompanion, PortError, PortResult};
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn parse_plan(raw: &str) -> Plan {
    // Unknown rows fall back to the free tier rather than failing the request.
    raw.parse().unwrap_or(Plan::Free)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: Option<String>,
    plan: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
            plan: parse_plan(&self.plan),
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
    plan: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
            plan: parse_plan(&self.plan),
        }
    }
}

#[derive(FromRow)]
struct CompanionRecord {
    id: Uuid,
    name: String,
    subject: String,
    topic: String,
    duration: i32,
    author_id: Uuid,
    created_at: DateTime<Utc>,
}
impl CompanionRecord {
    fn to_domain(self) -> Companion {
        Companion {
            id: self.id,
            name: self.name,
            subject: self.subject,
            topic: self.topic,
            duration: self.duration,
            author_id: self.author_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    user_id: Uuid,
    companion_id: Uuid,
    subject: Option<String>,
    duration: Option<i32>,
    created_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> Session {
        Session {
            id: self.id,
            user_id: self.user_id,
            companion_id: self.companion_id,
            subject: self.subject.unwrap_or_default(),
            duration: self.duration,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct StreakRow {
    user_id: Uuid,
    current_streak: i32,
    longest_streak: i32,
    last_activity_date: Option<NaiveDate>,
}
impl StreakRow {
    fn to_domain(self) -> StreakRecord {
        StreakRecord {
            user_id: self.user_id,
            current_streak: self.current_streak.max(0) as u32,
            longest_streak: self.longest_streak.max(0) as u32,
            last_activity_date: self.last_activity_date,
        }
    }
}

#[derive(FromRow)]
struct QuizResultRecord {
    user_id: Uuid,
    session_id: Uuid,
    score: i32,
}
impl QuizResultRecord {
    fn to_domain(self) -> QuizResult {
        QuizResult {
            user_id: self.user_id,
            session_id: self.session_id,
            score: self.score.max(0) as u32,
        }
    }
}

const SESSION_COLUMNS: &str =
    "s.id, s.user_id, s.companion_id, c.subject, c.duration, s.created_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        plan: Plan,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password, plan) VALUES ($1, $2, $3, $4) \
             RETURNING user_id, email, plan",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .bind(plan.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Validation("An account with this email already exists".to_string())
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password, plan FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_plan(&self, user_id: Uuid) -> PortResult<Plan> {
        let plan: (String,) = sqlx::query_as("SELECT plan FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("User {} not found", user_id))
                }
                _ => unexpected(e),
            })?;
        Ok(parse_plan(&plan.0))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: (Uuid,) = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => unexpected(e),
        })?;
        Ok(row.0)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_companion(
        &self,
        author_id: Uuid,
        companion: NewCompanion,
    ) -> PortResult<Companion> {
        let record = sqlx::query_as::<_, CompanionRecord>(
            "INSERT INTO companions (id, name, subject, topic, duration, author_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, name, subject, topic, duration, author_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&companion.name)
        .bind(&companion.subject)
        .bind(&companion.topic)
        .bind(companion.duration)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_companion_by_id(&self, companion_id: Uuid) -> PortResult<Companion> {
        let record = sqlx::query_as::<_, CompanionRecord>(
            "SELECT id, name, subject, topic, duration, author_id, created_at \
             FROM companions WHERE id = $1",
        )
        .bind(companion_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Companion {} not found", companion_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_companions(
        &self,
        author_id: Uuid,
        query: &CompanionQuery,
    ) -> PortResult<Vec<Companion>> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, name, subject, topic, duration, author_id, created_at \
             FROM companions WHERE author_id = ",
        );
        builder.push_bind(author_id);

        if let Some(subject) = &query.subject {
            builder.push(" AND subject ILIKE ");
            builder.push_bind(format!("%{}%", subject));
        }
        if let Some(topic) = &query.topic {
            builder.push(" AND (topic ILIKE ");
            builder.push_bind(format!("%{}%", topic));
            builder.push(" OR name ILIKE ");
            builder.push_bind(format!("%{}%", topic));
            builder.push(")");
        }

        let page = query.page.max(1);
        let limit = query.limit.max(1);
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(((page - 1) * limit) as i64);

        let records: Vec<CompanionRecord> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_companions_by_author(&self, author_id: Uuid) -> PortResult<usize> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM companions WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(row.0.max(0) as usize)
    }

    async fn delete_companion(&self, companion_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM companions WHERE id = $1")
            .bind(companion_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Companion {} not found",
                companion_id
            )));
        }
        Ok(())
    }

    async fn add_session(&self, user_id: Uuid, companion_id: Uuid) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "WITH inserted AS ( \
                 INSERT INTO session_history (id, user_id, companion_id) \
                 VALUES ($1, $2, $3) \
                 RETURNING id, user_id, companion_id, created_at \
             ) \
             SELECT i.id, i.user_id, i.companion_id, c.subject, c.duration, i.created_at \
             FROM inserted i LEFT JOIN companions c ON c.id = i.companion_id",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(companion_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM session_history s \
             LEFT JOIN companions c ON c.id = s.companion_id \
             WHERE s.id = $1",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Session {} not found", session_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_sessions_by_user(
        &self,
        user_id: Uuid,
        limit: Option<usize>,
    ) -> PortResult<Vec<Session>> {
        // LIMIT NULL means no limit in Postgres.
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM session_history s \
             LEFT JOIN companions c ON c.id = s.companion_id \
             WHERE s.user_id = $1 ORDER BY s.created_at DESC LIMIT $2",
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .bind(limit.map(|l| l as i64))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_recent_sessions(&self, limit: usize) -> PortResult<Vec<Session>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM session_history s \
             LEFT JOIN companions c ON c.id = s.companion_id \
             ORDER BY s.created_at DESC LIMIT $1",
            SESSION_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_or_create_streak(&self, user_id: Uuid) -> PortResult<StreakRecord> {
        let record = sqlx::query_as::<_, StreakRow>(
            "INSERT INTO user_streaks (user_id, current_streak, longest_streak, last_activity_date) \
             VALUES ($1, 0, 0, NULL) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING user_id, current_streak, longest_streak, last_activity_date",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn advance_streak(&self, user_id: Uuid, today: NaiveDate) -> PortResult<StreakRecord> {
        // Row must exist before the conditional update.
        self.get_or_create_streak(user_id).await?;

        // Single atomic statement: the WHERE clause makes the update a no-op
        // when the streak was already advanced today, so concurrent session
        // completions cannot double-count a day.
        let updated = sqlx::query_as::<_, StreakRow>(
            "UPDATE user_streaks SET \
                 current_streak = CASE \
                     WHEN last_activity_date = $2 - 1 THEN current_streak + 1 \
                     ELSE 1 \
                 END, \
                 longest_streak = GREATEST(longest_streak, CASE \
                     WHEN last_activity_date = $2 - 1 THEN current_streak + 1 \
                     ELSE 1 \
                 END), \
                 last_activity_date = $2 \
             WHERE user_id = $1 AND last_activity_date IS DISTINCT FROM $2 \
             RETURNING user_id, current_streak, longest_streak, last_activity_date",
        )
        .bind(user_id)
        .bind(today)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match updated {
            Some(record) => Ok(record.to_domain()),
            // Already advanced today; return the row as-is.
            None => self.get_or_create_streak(user_id).await,
        }
    }

    async fn toggle_bookmark(&self, user_id: Uuid, companion_id: Uuid) -> PortResult<bool> {
        let deleted = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND companion_id = $2")
            .bind(user_id)
            .bind(companion_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO bookmarks (user_id, companion_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(companion_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(true)
    }

    async fn get_bookmarked_companions(&self, user_id: Uuid) -> PortResult<Vec<Companion>> {
        let records = sqlx::query_as::<_, CompanionRecord>(
            "SELECT c.id, c.name, c.subject, c.topic, c.duration, c.author_id, c.created_at \
             FROM bookmarks b JOIN companions c ON c.id = b.companion_id \
             WHERE b.user_id = $1 ORDER BY b.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn save_quiz_result(&self, result: QuizResult) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO quiz_results (user_id, session_id, score) VALUES ($1, $2, $3) \
             ON CONFLICT (session_id) DO UPDATE SET score = EXCLUDED.score",
        )
        .bind(result.user_id)
        .bind(result.session_id)
        .bind(result.score as i32)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_quiz_scores(&self, user_id: Uuid) -> PortResult<Vec<QuizResult>> {
        let records = sqlx::query_as::<_, QuizResultRecord>(
            "SELECT user_id, session_id, score FROM quiz_results WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
