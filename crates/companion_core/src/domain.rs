//! crates/companion_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::entitlements::Plan;

/// A configured AI tutoring persona owned by a creating user.
#[derive(Debug, Clone)]
pub struct Companion {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub topic: String,
    /// Nominal session length in minutes.
    pub duration: i32,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One completed interaction with a companion, joined to the companion's
/// subject and duration. Append-only.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub companion_id: Uuid,
    pub subject: String,
    /// Companion duration in minutes. `None` when the joined companion row
    /// carried no duration; the aggregator substitutes a default.
    pub duration: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Consecutive-day activity counter for one user.
///
/// Invariant: `longest_streak >= current_streak` after any update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakRecord {
    pub user_id: Uuid,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
}

impl StreakRecord {
    /// A zeroed record, created on a user's first visit.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
        }
    }
}

/// A user's bookmark of a companion.
#[derive(Debug, Clone)]
pub struct Bookmark {
    pub user_id: Uuid,
    pub companion_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A recorded quiz outcome, keyed by the study session it followed.
#[derive(Debug, Clone)]
pub struct QuizResult {
    pub user_id: Uuid,
    pub session_id: Uuid,
    /// Percentage score, 0..=100.
    pub score: u32,
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub plan: Plan,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub plan: Plan,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
