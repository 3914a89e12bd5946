//! crates/companion_core/src/analytics.rs
//!
//! The analytics aggregator: pure, deterministic derivations over a user's
//! already-fetched session, companion, streak, and quiz-result rows. Nothing
//! here is cached; a snapshot is recomputed from scratch on every request.
//!
//! Sessions without a recorded quiz result get an *estimated* score derived
//! deterministically from the session id, and the snapshot is labeled with
//! its [`ScoreBasis`] so callers can surface "estimated" to the user instead
//! of presenting synthetic numbers as real ones.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{SessionRecord, StreakRecord};

/// Companion duration assumed when the joined row carries none, in minutes.
const DEFAULT_SESSION_MINUTES: u32 = 30;

/// Estimated scores fall in `[ESTIMATE_BASE, ESTIMATE_BASE + 25)`.
const ESTIMATE_BASE: u32 = 70;

/// Number of most-recent sessions that get the estimation recency bonus.
const RECENCY_BONUS_WINDOW: usize = 10;

//=========================================================================================
// Snapshot Types
//=========================================================================================

/// Whether the score-derived fields of a snapshot rest on recorded quiz
/// results or on deterministic estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBasis {
    /// Every session in the input had a recorded quiz score.
    Recorded,
    /// At least one session score was synthesized.
    Estimated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyProgress {
    /// Calendar month label, e.g. "Mar 2026".
    pub month: String,
    pub sessions: u32,
    /// Mean session score for the month, 0 when the month had no sessions.
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectStats {
    pub subject: String,
    pub sessions: u32,
    pub avg_score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictedGoal {
    pub goal: String,
    /// Heuristic likelihood, 0..=100.
    pub probability: u32,
    pub timeframe: String,
}

/// Derived metrics for one user. Computed on demand, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSnapshot {
    pub total_sessions: u32,
    pub total_minutes: u32,
    pub average_score: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub companions_created: u32,
    /// Distinct subjects in first-appearance order.
    pub subjects_studied: Vec<String>,
    /// Session counts for the trailing 7 days, oldest first; index 6 = today.
    pub weekly_progress: [u32; 7],
    /// The trailing 6 calendar months, oldest first.
    pub monthly_progress: Vec<MonthlyProgress>,
    /// Per-subject stats, descending by session count; ties keep
    /// first-appearance order.
    pub top_subjects: Vec<SubjectStats>,
    pub recent_achievements: Vec<Achievement>,
    /// Sessions completed in the trailing 7 days.
    pub learning_velocity: u32,
    pub consistency_score: u32,
    /// Subject -> 0..=100 mastery blend of volume and score.
    pub mastery_level: BTreeMap<String, u32>,
    pub predicted_goals: Vec<PredictedGoal>,
    pub score_basis: ScoreBasis,
}

/// Raw rows the aggregator consumes, fetched by the caller.
#[derive(Debug)]
pub struct AnalyticsInput<'a> {
    pub sessions: &'a [SessionRecord],
    pub companions_created: usize,
    pub streak: &'a StreakRecord,
    /// Recorded quiz scores keyed by session id.
    pub quiz_scores: &'a HashMap<Uuid, u32>,
    pub today: NaiveDate,
}

//=========================================================================================
// Aggregation
//=========================================================================================

/// Computes the full analytics snapshot for one user.
///
/// A user with zero sessions gets the fixed demo snapshot so a brand-new
/// dashboard is populated rather than all-zero.
pub fn compute_snapshot(input: &AnalyticsInput<'_>) -> AnalyticsSnapshot {
    if input.sessions.is_empty() {
        return demo_snapshot(input.today);
    }

    let scores = per_session_scores(input.sessions, input.quiz_scores);
    let score_basis = if input.sessions.iter().all(|s| input.quiz_scores.contains_key(&s.id)) {
        ScoreBasis::Recorded
    } else {
        ScoreBasis::Estimated
    };

    let total_sessions = input.sessions.len() as u32;
    let total_minutes: u32 = input
        .sessions
        .iter()
        .map(|s| s.duration.map_or(DEFAULT_SESSION_MINUTES, |d| d.max(0) as u32))
        .sum();
    let average_score = mean(input.sessions.iter().map(|s| scores[&s.id]));

    let subjects_studied = subjects_in_first_seen_order(input.sessions);
    let weekly_progress = weekly_histogram(input.sessions, input.today);
    let monthly_progress = monthly_histogram(input.sessions, &scores, input.today);
    let top_subjects = subject_stats(input.sessions, &scores, &subjects_studied);

    let learning_velocity: u32 = weekly_progress.iter().sum();
    let consistency_score = consistency(&weekly_progress, input.streak.current_streak);
    let mastery_level = top_subjects
        .iter()
        .map(|s| (s.subject.clone(), mastery(s.sessions, s.avg_score)))
        .collect();

    let recent_achievements = achievements(
        total_sessions,
        input.streak.current_streak,
        average_score,
        input.companions_created as u32,
        subjects_studied.len() as u32,
        learning_velocity,
        input.today,
    );
    let predicted_goals = predicted_goals(
        total_sessions,
        input.streak.current_streak,
        average_score,
        &top_subjects,
        learning_velocity,
    );

    AnalyticsSnapshot {
        total_sessions,
        total_minutes,
        average_score,
        current_streak: input.streak.current_streak,
        longest_streak: input.streak.longest_streak,
        companions_created: input.companions_created as u32,
        subjects_studied,
        weekly_progress,
        monthly_progress,
        top_subjects,
        recent_achievements,
        learning_velocity,
        consistency_score,
        mastery_level,
        predicted_goals,
        score_basis,
    }
}

/// Per-subject mastery: volume component capped at 50, score component
/// capped at 50, total capped at 100.
pub fn mastery(sessions: u32, avg_score: u32) -> u32 {
    let session_weight = (sessions * 5).min(50);
    let score_weight = (f64::from(avg_score) * 0.5).round() as u32;
    (session_weight + score_weight).min(100)
}

/// Blend of recent activity frequency (max 70) and streak bonus (max 30).
pub fn consistency(weekly_progress: &[u32; 7], current_streak: u32) -> u32 {
    let active_days = weekly_progress.iter().filter(|&&d| d > 0).count() as u32;
    let base = (f64::from(active_days) / 7.0 * 70.0).round() as u32;
    let streak_bonus = (current_streak * 2).min(30);
    (base + streak_bonus).min(100)
}

//=========================================================================================
// Score Synthesis
//=========================================================================================

/// Resolves a score for every session: the recorded quiz result when one
/// exists, otherwise a deterministic estimate.
fn per_session_scores(
    sessions: &[SessionRecord],
    quiz_scores: &HashMap<Uuid, u32>,
) -> HashMap<Uuid, u32> {
    // Recency ranks: 0 = newest session.
    let mut by_recency: Vec<&SessionRecord> = sessions.iter().collect();
    by_recency.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    by_recency
        .iter()
        .enumerate()
        .map(|(rank, s)| {
            let score = quiz_scores
                .get(&s.id)
                .copied()
                .unwrap_or_else(|| estimated_score(s.id, rank));
            (s.id, score)
        })
        .collect()
}

/// Deterministic stand-in score in `[70, 95)`. Recent sessions get a small
/// bonus; the remaining spread comes from the session id so the same stored
/// rows always produce the same snapshot.
fn estimated_score(session_id: Uuid, recency_rank: usize) -> u32 {
    let recent_bonus = if recency_rank < RECENCY_BONUS_WINDOW { 5 } else { 0 };
    let variation = (session_id.as_u128() % 20) as u32;
    ESTIMATE_BASE + recent_bonus + variation
}

fn mean(scores: impl Iterator<Item = u32>) -> u32 {
    let (sum, count) = scores.fold((0u64, 0u64), |(s, c), v| (s + u64::from(v), c + 1));
    if count == 0 {
        0
    } else {
        ((sum as f64) / (count as f64)).round() as u32
    }
}

//=========================================================================================
// Histograms and Subject Stats
//=========================================================================================

fn subjects_in_first_seen_order(sessions: &[SessionRecord]) -> Vec<String> {
    let mut seen = Vec::new();
    for session in sessions {
        if !seen.contains(&session.subject) {
            seen.push(session.subject.clone());
        }
    }
    seen
}

fn weekly_histogram(sessions: &[SessionRecord], today: NaiveDate) -> [u32; 7] {
    let mut days = [0u32; 7];
    for (i, slot) in days.iter_mut().enumerate() {
        let date = today - Days::new((6 - i) as u64);
        *slot = sessions
            .iter()
            .filter(|s| s.created_at.date_naive() == date)
            .count() as u32;
    }
    days
}

fn monthly_histogram(
    sessions: &[SessionRecord],
    scores: &HashMap<Uuid, u32>,
    today: NaiveDate,
) -> Vec<MonthlyProgress> {
    (0..6)
        .map(|i| {
            let month_date = today - Months::new(5 - i);
            let in_month: Vec<&SessionRecord> = sessions
                .iter()
                .filter(|s| {
                    let d = s.created_at.date_naive();
                    d.year() == month_date.year() && d.month() == month_date.month()
                })
                .collect();
            let score = mean(in_month.iter().map(|s| scores[&s.id]));
            MonthlyProgress {
                month: month_date.format("%b %Y").to_string(),
                sessions: in_month.len() as u32,
                score,
            }
        })
        .collect()
}

fn subject_stats(
    sessions: &[SessionRecord],
    scores: &HashMap<Uuid, u32>,
    subjects: &[String],
) -> Vec<SubjectStats> {
    let mut stats: Vec<SubjectStats> = subjects
        .iter()
        .map(|subject| {
            let subject_sessions: Vec<&SessionRecord> = sessions
                .iter()
                .filter(|s| &s.subject == subject)
                .collect();
            SubjectStats {
                subject: subject.clone(),
                sessions: subject_sessions.len() as u32,
                avg_score: mean(subject_sessions.iter().map(|s| scores[&s.id])),
            }
        })
        .collect();
    // Stable sort keeps first-appearance order among ties.
    stats.sort_by(|a, b| b.sessions.cmp(&a.sessions));
    stats
}

//=========================================================================================
// Achievements
//=========================================================================================

/// Evaluates the fixed achievement ladder. Each tier contributes at most one
/// entry at the highest threshold reached; at most 4 entries total; a default
/// "Getting Started" entry when nothing unlocked.
fn achievements(
    total_sessions: u32,
    current_streak: u32,
    average_score: u32,
    companions_created: u32,
    subjects_count: u32,
    sessions_this_week: u32,
    today: NaiveDate,
) -> Vec<Achievement> {
    let week_ago = today - Days::new(7);
    let mut unlocked = Vec::new();

    let mut push = |title: &str, description: String, date: NaiveDate, icon: &str| {
        unlocked.push(Achievement {
            title: title.to_string(),
            description,
            date,
            icon: icon.to_string(),
        });
    };

    // Streak tier
    if current_streak >= 30 {
        push(
            "Streak Legend",
            format!("Incredible {}-day learning streak!", current_streak),
            today,
            "🏆",
        );
    } else if current_streak >= 14 {
        push(
            "Two Week Warrior",
            format!("Maintained a {}-day learning streak!", current_streak),
            today,
            "🔥",
        );
    } else if current_streak >= 7 {
        push(
            "Week Warrior",
            format!("Achieved a {}-day learning streak!", current_streak),
            today,
            "⚡",
        );
    }

    // Session-count tier
    if total_sessions >= 100 {
        push(
            "Century Club",
            format!("Completed {} learning sessions!", total_sessions),
            week_ago,
            "💯",
        );
    } else if total_sessions >= 50 {
        push(
            "Half Century Hero",
            format!("Reached {} learning sessions!", total_sessions),
            week_ago,
            "🎯",
        );
    } else if total_sessions >= 25 {
        push(
            "Quarter Century",
            format!("Completed {} sessions!", total_sessions),
            week_ago,
            "🌟",
        );
    }

    // Score tier
    if average_score >= 95 {
        push(
            "Perfectionist",
            format!("Outstanding {}% average score!", average_score),
            today,
            "⭐",
        );
    } else if average_score >= 90 {
        push(
            "Excellence Master",
            format!("Achieved {}% average quiz score!", average_score),
            today,
            "🌟",
        );
    } else if average_score >= 80 {
        push(
            "High Achiever",
            format!("Great {}% average performance!", average_score),
            today,
            "📈",
        );
    }

    // Companion-count tier
    if companions_created >= 20 {
        push(
            "Companion Master",
            format!("Created {} learning companions!", companions_created),
            week_ago,
            "🎓",
        );
    } else if companions_created >= 10 {
        push(
            "Companion Creator",
            format!("Built {} learning companions!", companions_created),
            week_ago,
            "🤖",
        );
    } else if companions_created >= 5 {
        push(
            "Builder",
            format!("Created {} companions!", companions_created),
            week_ago,
            "🔨",
        );
    }

    // Subject-diversity tier
    if subjects_count >= 5 {
        push(
            "Renaissance Learner",
            format!("Explored {} different subjects!", subjects_count),
            week_ago,
            "🎨",
        );
    } else if subjects_count >= 3 {
        push(
            "Multi-Subject Explorer",
            format!("Studied {} different subjects!", subjects_count),
            week_ago,
            "🗺️",
        );
    }

    // Recent-activity tier
    if sessions_this_week >= 5 {
        push(
            "Weekly Champion",
            format!("Completed {} sessions this week!", sessions_this_week),
            today,
            "🏅",
        );
    }

    if unlocked.is_empty() {
        unlocked.push(Achievement {
            title: "Getting Started".to_string(),
            description: "Welcome to your learning journey!".to_string(),
            date: today,
            icon: "🚀".to_string(),
        });
    }

    unlocked.truncate(4);
    unlocked
}

//=========================================================================================
// Predicted Goals
//=========================================================================================

/// Simple projection heuristics over streak/score/session/subject gaps.
/// At most 4 entries, in fixed priority order.
fn predicted_goals(
    total_sessions: u32,
    current_streak: u32,
    average_score: u32,
    subject_stats: &[SubjectStats],
    learning_velocity: u32,
) -> Vec<PredictedGoal> {
    let mut goals = Vec::new();
    let weekly_average = f64::from(learning_velocity) / 7.0;

    // Streak milestones: probability scales with current momentum.
    if current_streak < 30 {
        let probability = if current_streak > 0 {
            (current_streak * 2 + 50).min(90)
        } else {
            30
        };
        goals.push(PredictedGoal {
            goal: "Achieve 30-day learning streak".to_string(),
            probability,
            timeframe: format!("{} days", 30 - current_streak),
        });
    } else if current_streak < 60 {
        goals.push(PredictedGoal {
            goal: "Reach 60-day streak milestone".to_string(),
            probability: (current_streak + 20).min(85),
            timeframe: format!("{} days", 60 - current_streak),
        });
    }

    // Score improvement
    if average_score > 0 && average_score < 90 {
        let improvement_potential = (90 - average_score).max(10);
        goals.push(PredictedGoal {
            goal: "Reach 90% average quiz score".to_string(),
            probability: 100u32.saturating_sub(improvement_potential * 2).max(40),
            timeframe: "2-3 months".to_string(),
        });
    } else if (90..95).contains(&average_score) {
        goals.push(PredictedGoal {
            goal: "Achieve 95% mastery level".to_string(),
            probability: 70,
            timeframe: "1-2 months".to_string(),
        });
    }

    // Next session milestone
    let next_milestone = match total_sessions {
        0..=49 => 50,
        50..=99 => 100,
        100..=249 => 250,
        _ => 500,
    };
    if total_sessions < next_milestone {
        let sessions_needed = next_milestone - total_sessions;
        let weeks_needed = if weekly_average > 0.0 {
            (f64::from(sessions_needed) / weekly_average).ceil() as u32
        } else {
            12
        };
        let probability = if weekly_average >= 2.0 {
            ((weekly_average * 15.0 + 40.0) as u32).min(90)
        } else {
            50
        };
        goals.push(PredictedGoal {
            goal: format!("Complete {} total sessions", next_milestone),
            probability,
            timeframe: format!("{} weeks", weeks_needed),
        });
    }

    // Weakest subject with enough history to matter
    if let Some(weakest) = subject_stats.last() {
        if weakest.avg_score < 85 && weakest.sessions >= 3 {
            let improvement_needed = 85 - weakest.avg_score;
            goals.push(PredictedGoal {
                goal: format!("Master {} (85%+ average)", weakest.subject),
                probability: 70u32.saturating_sub(improvement_needed).max(35),
                timeframe: "1-2 months".to_string(),
            });
        }
    }

    // Cadence
    if weekly_average < 3.0 {
        goals.push(PredictedGoal {
            goal: "Maintain 3+ sessions per week".to_string(),
            probability: if weekly_average >= 2.0 { 75 } else { 55 },
            timeframe: "4 weeks".to_string(),
        });
    }

    goals.truncate(4);
    goals
}

//=========================================================================================
// Demo Snapshot
//=========================================================================================

/// The fixed snapshot shown to users with no sessions yet. Month labels track
/// `today` so the chart always shows the trailing half year; everything else
/// is constant.
pub fn demo_snapshot(today: NaiveDate) -> AnalyticsSnapshot {
    let monthly_counts = [(18, 82), (22, 85), (25, 88), (28, 86), (21, 89), (13, 91)];
    let monthly_progress = monthly_counts
        .iter()
        .enumerate()
        .map(|(i, &(sessions, score))| MonthlyProgress {
            month: (today - Months::new(5 - i as u32)).format("%b %Y").to_string(),
            sessions,
            score,
        })
        .collect();

    let top_subjects = vec![
        SubjectStats { subject: "coding".into(), sessions: 45, avg_score: 92 },
        SubjectStats { subject: "maths".into(), sessions: 38, avg_score: 85 },
        SubjectStats { subject: "science".into(), sessions: 25, avg_score: 88 },
        SubjectStats { subject: "language".into(), sessions: 12, avg_score: 83 },
        SubjectStats { subject: "history".into(), sessions: 7, avg_score: 79 },
    ];

    let mastery_level = [
        ("coding", 95),
        ("maths", 82),
        ("science", 78),
        ("language", 65),
        ("history", 58),
    ]
    .into_iter()
    .map(|(s, v)| (s.to_string(), v))
    .collect();

    AnalyticsSnapshot {
        total_sessions: 127,
        total_minutes: 3810,
        average_score: 87,
        current_streak: 12,
        longest_streak: 28,
        companions_created: 15,
        subjects_studied: vec![
            "maths".into(),
            "science".into(),
            "coding".into(),
            "language".into(),
            "history".into(),
        ],
        weekly_progress: [2, 3, 1, 4, 2, 3, 2],
        monthly_progress,
        top_subjects,
        recent_achievements: vec![
            Achievement {
                title: "Streak Master".into(),
                description: "Achieved 12-day learning streak!".into(),
                date: today,
                icon: "🔥".into(),
            },
            Achievement {
                title: "Code Warrior".into(),
                description: "Completed 45 coding sessions with 92% average!".into(),
                date: today - Days::new(3),
                icon: "💻".into(),
            },
            Achievement {
                title: "Century Club".into(),
                description: "Reached 100+ total learning sessions!".into(),
                date: today - Days::new(8),
                icon: "💯".into(),
            },
            Achievement {
                title: "Companion Creator".into(),
                description: "Created 15 unique learning companions!".into(),
                date: today - Days::new(13),
                icon: "🎓".into(),
            },
        ],
        learning_velocity: 17,
        consistency_score: 85,
        mastery_level,
        predicted_goals: vec![
            PredictedGoal {
                goal: "Achieve 30-day learning streak".into(),
                probability: 78,
                timeframe: "18 days".into(),
            },
            PredictedGoal {
                goal: "Reach 90% average quiz score".into(),
                probability: 85,
                timeframe: "2-3 weeks".into(),
            },
            PredictedGoal {
                goal: "Complete 200 total sessions".into(),
                probability: 92,
                timeframe: "6-8 weeks".into(),
            },
            PredictedGoal {
                goal: "Master History (85%+ average)".into(),
                probability: 65,
                timeframe: "1-2 months".into(),
            },
        ],
        score_basis: ScoreBasis::Estimated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn session_on(date: NaiveDate, subject: &str, duration: Option<i32>) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            companion_id: Uuid::new_v4(),
            subject: subject.to_string(),
            duration,
            created_at: Utc
                .with_ymd_and_hms(date.year(), date.month(), date.day(), 12, 0, 0)
                .unwrap(),
        }
    }

    fn streak(current: u32, longest: u32) -> StreakRecord {
        StreakRecord {
            user_id: Uuid::new_v4(),
            current_streak: current,
            longest_streak: longest,
            last_activity_date: Some(today()),
        }
    }

    #[test]
    fn zero_sessions_yields_demo_snapshot() {
        let scores = HashMap::new();
        let snapshot = compute_snapshot(&AnalyticsInput {
            sessions: &[],
            companions_created: 0,
            streak: &StreakRecord::new(Uuid::new_v4()),
            quiz_scores: &scores,
            today: today(),
        });
        assert_eq!(snapshot.total_sessions, 127);
        assert_eq!(snapshot.weekly_progress, [2, 3, 1, 4, 2, 3, 2]);
        assert_eq!(snapshot.monthly_progress.len(), 6);
        assert_eq!(snapshot.monthly_progress[5].month, "Mar 2026");
        assert_eq!(snapshot.score_basis, ScoreBasis::Estimated);
    }

    #[test]
    fn totals_use_default_duration_when_missing() {
        let sessions = vec![
            session_on(today(), "maths", Some(45)),
            session_on(today(), "maths", None),
        ];
        let scores = HashMap::new();
        let snapshot = compute_snapshot(&AnalyticsInput {
            sessions: &sessions,
            companions_created: 1,
            streak: &streak(1, 1),
            quiz_scores: &scores,
            today: today(),
        });
        assert_eq!(snapshot.total_sessions, 2);
        assert_eq!(snapshot.total_minutes, 75);
    }

    #[test]
    fn recorded_scores_take_priority_over_estimates() {
        let sessions = vec![session_on(today(), "science", Some(30))];
        let scores: HashMap<Uuid, u32> = [(sessions[0].id, 100)].into_iter().collect();
        let snapshot = compute_snapshot(&AnalyticsInput {
            sessions: &sessions,
            companions_created: 1,
            streak: &streak(1, 1),
            quiz_scores: &scores,
            today: today(),
        });
        assert_eq!(snapshot.average_score, 100);
        assert_eq!(snapshot.score_basis, ScoreBasis::Recorded);
    }

    #[test]
    fn estimated_scores_are_deterministic_and_bounded() {
        let sessions: Vec<SessionRecord> =
            (0..30).map(|_| session_on(today(), "coding", Some(30))).collect();
        let scores = HashMap::new();
        let input = AnalyticsInput {
            sessions: &sessions,
            companions_created: 1,
            streak: &streak(1, 1),
            quiz_scores: &scores,
            today: today(),
        };
        let first = compute_snapshot(&input);
        let second = compute_snapshot(&input);
        assert_eq!(first.average_score, second.average_score);
        assert_eq!(first.monthly_progress, second.monthly_progress);
        assert!((70..95).contains(&first.average_score));
        assert_eq!(first.score_basis, ScoreBasis::Estimated);
    }

    #[test]
    fn weekly_histogram_is_oldest_first() {
        let sessions = vec![
            session_on(today(), "maths", Some(30)),
            session_on(today(), "maths", Some(30)),
            session_on(today() - Days::new(6), "maths", Some(30)),
            // Outside the window entirely.
            session_on(today() - Days::new(10), "maths", Some(30)),
        ];
        let scores = HashMap::new();
        let snapshot = compute_snapshot(&AnalyticsInput {
            sessions: &sessions,
            companions_created: 1,
            streak: &streak(1, 1),
            quiz_scores: &scores,
            today: today(),
        });
        assert_eq!(snapshot.weekly_progress, [1, 0, 0, 0, 0, 0, 2]);
        assert_eq!(snapshot.learning_velocity, 3);
    }

    #[test]
    fn top_subjects_sorted_by_count_with_stable_ties() {
        let sessions = vec![
            session_on(today(), "history", Some(30)),
            session_on(today(), "coding", Some(30)),
            session_on(today(), "coding", Some(30)),
            session_on(today(), "language", Some(30)),
        ];
        let scores = HashMap::new();
        let snapshot = compute_snapshot(&AnalyticsInput {
            sessions: &sessions,
            companions_created: 1,
            streak: &streak(1, 1),
            quiz_scores: &scores,
            today: today(),
        });
        let order: Vec<&str> = snapshot.top_subjects.iter().map(|s| s.subject.as_str()).collect();
        // coding leads; history and language tie and keep discovery order.
        assert_eq!(order, vec!["coding", "history", "language"]);
        assert_eq!(snapshot.subjects_studied, vec!["history", "coding", "language"]);
    }

    #[test]
    fn mastery_is_bounded_for_any_input() {
        for sessions in [0, 1, 7, 10, 50, 10_000] {
            for avg in [0, 1, 50, 99, 100] {
                let m = mastery(sessions, avg);
                assert!(m <= 100, "mastery({}, {}) = {}", sessions, avg, m);
            }
        }
        // Both components cap at 50.
        assert_eq!(mastery(10_000, 100), 100);
        assert_eq!(mastery(0, 0), 0);
        assert_eq!(mastery(4, 80), 60);
    }

    #[test]
    fn consistency_is_bounded() {
        assert_eq!(consistency(&[0; 7], 0), 0);
        assert_eq!(consistency(&[1; 7], 100), 100);
        for streak in [0, 1, 5, 15, 500] {
            let c = consistency(&[2, 0, 1, 0, 3, 0, 1], streak);
            assert!(c <= 100);
        }
        // 4 active days of 7 plus a 3-day streak.
        assert_eq!(consistency(&[2, 0, 1, 0, 3, 0, 1], 3), 46);
    }

    #[test]
    fn achievement_ladder_takes_highest_tier_and_caps_at_four() {
        let unlocked = achievements(120, 31, 96, 25, 6, 6, today());
        assert_eq!(unlocked.len(), 4);
        let titles: Vec<&str> = unlocked.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Streak Legend", "Century Club", "Perfectionist", "Companion Master"]
        );
    }

    #[test]
    fn no_unlocks_yields_getting_started() {
        let unlocked = achievements(1, 1, 50, 1, 1, 1, today());
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].title, "Getting Started");
    }

    #[test]
    fn predicted_goals_capped_at_four_with_bounded_probabilities() {
        let stats = vec![
            SubjectStats { subject: "coding".into(), sessions: 9, avg_score: 88 },
            SubjectStats { subject: "history".into(), sessions: 4, avg_score: 60 },
        ];
        let goals = predicted_goals(40, 6, 75, &stats, 4);
        assert!(goals.len() <= 4);
        assert!(!goals.is_empty());
        for g in &goals {
            assert!(g.probability <= 100);
        }
        assert_eq!(goals[0].goal, "Achieve 30-day learning streak");
        assert_eq!(goals[0].probability, 62);
        assert_eq!(goals[0].timeframe, "24 days");
    }
}
