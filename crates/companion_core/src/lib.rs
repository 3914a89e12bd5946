pub mod analytics;
pub mod domain;
pub mod entitlements;
pub mod ports;
pub mod quiz;
pub mod streak;

pub use analytics::{compute_snapshot, AnalyticsInput, AnalyticsSnapshot, ScoreBasis};
pub use domain::{
    AuthSession, Bookmark, Companion, QuizResult, SessionRecord, StreakRecord, User,
    UserCredentials,
};
pub use entitlements::{AuthContext, Plan};
pub use ports::{
    CompanionQuery, DatabaseService, NewCompanion, PortError, PortResult, QuizGenerationService,
};
pub use quiz::{QuizPhase, QuizQuestion, QuizSession};
pub use streak::{advance_streak, streak_status, StreakStatus};
