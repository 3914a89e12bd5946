//! crates/companion_core/src/entitlements.rs
//!
//! Plan-based capability gating. Handlers resolve the caller's plan once at
//! the auth boundary and pass an explicit `AuthContext` down; nothing in the
//! core reads identity from ambient state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tier controlling companion limits and paid features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Core,
    Pro,
}

impl Plan {
    /// Maximum number of companions the plan may create, `None` = unlimited.
    pub fn companion_limit(self) -> Option<usize> {
        match self {
            Plan::Free => Some(3),
            Plan::Core => Some(10),
            Plan::Pro => None,
        }
    }

    /// The analytics dashboard is a paid feature.
    pub fn can_view_analytics(self) -> bool {
        matches!(self, Plan::Pro)
    }

    /// Generated quizzes are a paid feature.
    pub fn can_take_quizzes(self) -> bool {
        matches!(self, Plan::Pro)
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "core" => Ok(Plan::Core),
            "pro" => Ok(Plan::Pro),
            other => Err(format!("'{}' is not a known plan", other)),
        }
    }
}

impl Plan {
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Core => "core",
            Plan::Pro => "pro",
        }
    }
}

/// The authenticated caller's identity and entitlements, resolved once per
/// request and passed explicitly to every operation that needs it.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub plan: Plan,
}

impl AuthContext {
    /// Whether the caller may create one more companion given how many they
    /// already own.
    pub fn can_create_companion(&self, owned_count: usize) -> bool {
        match self.plan.companion_limit() {
            Some(limit) => owned_count < limit,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(plan: Plan) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            plan,
        }
    }

    #[test]
    fn free_plan_caps_at_three_companions() {
        let c = ctx(Plan::Free);
        assert!(c.can_create_companion(2));
        assert!(!c.can_create_companion(3));
        assert!(!c.can_create_companion(10));
    }

    #[test]
    fn core_plan_caps_at_ten_companions() {
        let c = ctx(Plan::Core);
        assert!(c.can_create_companion(9));
        assert!(!c.can_create_companion(10));
    }

    #[test]
    fn pro_plan_is_unlimited_and_unlocks_paid_features() {
        let c = ctx(Plan::Pro);
        assert!(c.can_create_companion(1000));
        assert!(c.plan.can_view_analytics());
        assert!(c.plan.can_take_quizzes());
        assert!(!Plan::Free.can_view_analytics());
        assert!(!Plan::Core.can_take_quizzes());
    }

    #[test]
    fn plan_round_trips_through_str() {
        for plan in [Plan::Free, Plan::Core, Plan::Pro] {
            assert_eq!(plan.as_str().parse::<Plan>().unwrap(), plan);
        }
        assert!("gold".parse::<Plan>().is_err());
    }
}
