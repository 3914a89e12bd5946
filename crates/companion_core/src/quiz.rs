//! crates/companion_core/src/quiz.rs
//!
//! Quiz question validation and the single-pass quiz lifecycle.
//!
//! Generation itself is an adapter concern (one chat completion per quiz);
//! this module owns the contract on what comes back: a batch passes only if
//! at least [`MIN_VALID_QUESTIONS`] survive per-question validation, and a
//! passing batch is truncated to [`QUIZ_SIZE`]. A short batch is an error,
//! never silently served.

use serde::{Deserialize, Serialize};

/// Number of questions in a quiz session.
pub const QUIZ_SIZE: usize = 10;

/// Minimum valid questions a generated batch must contain.
pub const MIN_VALID_QUESTIONS: usize = 8;

/// A validated multiple-choice question.
///
/// Serialized in camelCase to match the generation contract and the web
/// client's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    /// Exactly 4 options after validation.
    pub options: Vec<String>,
    /// Index into `options`, 0..=3.
    pub correct_answer: usize,
    pub explanation: String,
}

impl QuizQuestion {
    /// Per-question validation rules from the generation contract.
    fn is_valid(&self) -> bool {
        !self.id.is_empty()
            && self.question.len() > 10
            && self.options.len() == 4
            && self.options.iter().all(|opt| opt.len() > 3)
            && self.correct_answer < 4
            && self.explanation.len() > 10
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("Only {0} valid questions generated")]
    TooFewValidQuestions(usize),
    #[error("Quiz has not been completed")]
    NotCompleted,
    #[error("Question {index} has no recorded answer")]
    Unanswered { index: usize },
    #[error("Option index {0} is out of range")]
    InvalidOption(usize),
    #[error("Quiz is already complete")]
    AlreadyCompleted,
}

/// Filters a generated batch down to valid questions, requiring at least
/// [`MIN_VALID_QUESTIONS`] survivors and truncating to [`QUIZ_SIZE`].
pub fn validate_questions(raw: Vec<QuizQuestion>) -> Result<Vec<QuizQuestion>, QuizError> {
    let mut valid: Vec<QuizQuestion> = raw.into_iter().filter(QuizQuestion::is_valid).collect();
    if valid.len() < MIN_VALID_QUESTIONS {
        return Err(QuizError::TooFewValidQuestions(valid.len()));
    }
    valid.truncate(QUIZ_SIZE);
    Ok(valid)
}

//=========================================================================================
// Lifecycle State Machine
//=========================================================================================

/// Where a quiz session is in its single linear pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    NotStarted,
    InProgress,
    Completed,
}

/// Final result of a completed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    pub percentage: u32,
}

impl std::fmt::Display for QuizScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}, {}%", self.correct, self.total, self.percentage)
    }
}

/// A client-side quiz run over a fixed question set.
///
/// The question sequence is immutable once started; "Next" requires an answer
/// for the current question, "Previous" is free, and advancing past the last
/// question completes the pass. Retaking reuses the same questions.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    selected_answers: Vec<Option<usize>>,
    current_index: usize,
    phase: QuizPhase,
}

impl QuizSession {
    /// Starts a session over an already-validated question set.
    pub fn start(raw: Vec<QuizQuestion>) -> Result<Self, QuizError> {
        let questions = validate_questions(raw)?;
        let selected_answers = vec![None; questions.len()];
        Ok(Self {
            questions,
            selected_answers,
            current_index: 0,
            phase: QuizPhase::InProgress,
        })
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn current_question(&self) -> &QuizQuestion {
        &self.questions[self.current_index]
    }

    pub fn selected_answer(&self, index: usize) -> Option<usize> {
        self.selected_answers.get(index).copied().flatten()
    }

    /// Records the chosen option for the current question. Re-selecting
    /// overwrites the previous choice.
    pub fn select_answer(&mut self, option: usize) -> Result<(), QuizError> {
        if self.phase != QuizPhase::InProgress {
            return Err(QuizError::AlreadyCompleted);
        }
        if option >= 4 {
            return Err(QuizError::InvalidOption(option));
        }
        self.selected_answers[self.current_index] = Some(option);
        Ok(())
    }

    /// Advances to the next question; past the last question the session
    /// completes. Requires an answer for the current question.
    pub fn next(&mut self) -> Result<QuizPhase, QuizError> {
        if self.phase != QuizPhase::InProgress {
            return Err(QuizError::AlreadyCompleted);
        }
        if self.selected_answers[self.current_index].is_none() {
            return Err(QuizError::Unanswered { index: self.current_index });
        }
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
        } else {
            self.phase = QuizPhase::Completed;
        }
        Ok(self.phase)
    }

    /// Steps back one question. Freely navigable; a no-op at index 0.
    pub fn previous(&mut self) {
        if self.phase == QuizPhase::InProgress {
            self.current_index = self.current_index.saturating_sub(1);
        }
    }

    /// Tallies the completed pass.
    pub fn score(&self) -> Result<QuizScore, QuizError> {
        if self.phase != QuizPhase::Completed {
            return Err(QuizError::NotCompleted);
        }
        let correct = self
            .questions
            .iter()
            .zip(&self.selected_answers)
            .filter(|(q, answer)| **answer == Some(q.correct_answer))
            .count();
        let total = self.questions.len();
        let percentage = ((correct as f64 / total as f64) * 100.0).round() as u32;
        Ok(QuizScore { correct, total, percentage })
    }

    /// Restarts at question 0 with cleared answers, keeping the same question
    /// set. No re-generation.
    pub fn retake(&mut self) {
        self.selected_answers = vec![None; self.questions.len()];
        self.current_index = 0;
        self.phase = QuizPhase::InProgress;
    }
}

//=========================================================================================
// Generation Prompt
//=========================================================================================

/// System instructions for the quiz-generation model.
pub fn generation_system_prompt(subject: &str, topic: &str) -> String {
    format!(
        "You are an expert {} educator. Generate exactly 10 quiz questions about {}. \
         Return only valid JSON array with no extra text.",
        subject, topic
    )
}

/// User prompt requesting exactly [`QUIZ_SIZE`] four-option questions as a
/// raw JSON array.
pub fn generation_user_prompt(subject: &str, topic: &str) -> String {
    format!(
        r#"Create exactly 10 multiple choice questions about "{topic}" in {subject}.

REQUIREMENTS:
- Questions must be specific to "{topic}" concepts
- Each question needs exactly 4 realistic answer options
- Test real knowledge: definitions, applications, examples, problem-solving
- Make questions challenging but fair for intermediate learners
- All options should be plausible (avoid obvious wrong answers)

Return ONLY a JSON array:
[
  {{
    "id": "1",
    "question": "Specific question about {topic}?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctAnswer": 0,
    "explanation": "Why this answer is correct"
  }}
]

Generate exactly 10 questions for: {topic}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, correct: usize) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            question: "What is the base case in recursion?".to_string(),
            options: vec![
                "The stopping condition".to_string(),
                "The first call".to_string(),
                "The return type".to_string(),
                "The loop counter".to_string(),
            ],
            correct_answer: correct,
            explanation: "The base case stops the recursion.".to_string(),
        }
    }

    fn batch(n: usize) -> Vec<QuizQuestion> {
        (0..n).map(|i| question(&format!("{}", i + 1), i % 4)).collect()
    }

    #[test]
    fn validation_accepts_ten_and_truncates_excess() {
        assert_eq!(validate_questions(batch(10)).unwrap().len(), 10);
        assert_eq!(validate_questions(batch(13)).unwrap().len(), 10);
        assert_eq!(validate_questions(batch(8)).unwrap().len(), 8);
    }

    #[test]
    fn validation_rejects_fewer_than_eight_valid() {
        let err = validate_questions(batch(7)).unwrap_err();
        assert_eq!(err, QuizError::TooFewValidQuestions(7));
        assert_eq!(err.to_string(), "Only 7 valid questions generated");
    }

    #[test]
    fn invalid_entries_are_discarded_before_the_count_check() {
        let mut raw = batch(9);
        raw.push(QuizQuestion {
            id: String::new(), // invalid: empty id
            ..question("x", 0)
        });
        raw.push(QuizQuestion {
            options: vec!["A".into(), "B".into()], // invalid: 2 short options
            ..question("y", 0)
        });
        raw.push(QuizQuestion {
            correct_answer: 4, // invalid: out of range
            ..question("z", 0)
        });
        raw.push(QuizQuestion {
            question: "Short?".into(), // invalid: too short
            ..question("w", 0)
        });
        raw.push(QuizQuestion {
            explanation: "Because.".into(), // invalid: too short
            ..question("v", 0)
        });
        let valid = validate_questions(raw).unwrap();
        assert_eq!(valid.len(), 9);
    }

    #[test]
    fn next_requires_an_answer() {
        let mut session = QuizSession::start(batch(10)).unwrap();
        assert_eq!(session.next().unwrap_err(), QuizError::Unanswered { index: 0 });
        session.select_answer(1).unwrap();
        assert_eq!(session.next().unwrap(), QuizPhase::InProgress);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn previous_is_free_and_stops_at_zero() {
        let mut session = QuizSession::start(batch(10)).unwrap();
        session.previous();
        assert_eq!(session.current_index(), 0);
        session.select_answer(0).unwrap();
        session.next().unwrap();
        session.previous();
        assert_eq!(session.current_index(), 0);
        // The earlier answer is still recorded.
        assert_eq!(session.selected_answer(0), Some(0));
    }

    #[test]
    fn perfect_pass_scores_ten_of_ten() {
        let mut session = QuizSession::start(batch(10)).unwrap();
        for _ in 0..10 {
            let correct = session.current_question().correct_answer;
            session.select_answer(correct).unwrap();
            session.next().unwrap();
        }
        assert_eq!(session.phase(), QuizPhase::Completed);
        let score = session.score().unwrap();
        assert_eq!(score.correct, 10);
        assert_eq!(score.percentage, 100);
        assert_eq!(score.to_string(), "10/10, 100%");
    }

    #[test]
    fn wrong_answers_count_against_the_score() {
        let mut session = QuizSession::start(batch(10)).unwrap();
        for i in 0..10 {
            let correct = session.current_question().correct_answer;
            // Miss every other question.
            let choice = if i % 2 == 0 { correct } else { (correct + 1) % 4 };
            session.select_answer(choice).unwrap();
            session.next().unwrap();
        }
        let score = session.score().unwrap();
        assert_eq!(score.correct, 5);
        assert_eq!(score.percentage, 50);
    }

    #[test]
    fn retake_clears_answers_but_keeps_questions() {
        let mut session = QuizSession::start(batch(10)).unwrap();
        for _ in 0..10 {
            session.select_answer(0).unwrap();
            session.next().unwrap();
        }
        let original_questions = session.questions().to_vec();

        session.retake();
        assert_eq!(session.phase(), QuizPhase::InProgress);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.questions(), original_questions.as_slice());
        assert!((0..10).all(|i| session.selected_answer(i).is_none()));
    }

    #[test]
    fn score_is_unavailable_until_the_pass_completes() {
        let mut session = QuizSession::start(batch(10)).unwrap();
        assert_eq!(session.score().unwrap_err(), QuizError::NotCompleted);
        session.select_answer(0).unwrap();
        session.next().unwrap();
        // Still mid-pass.
        assert_eq!(session.score().unwrap_err(), QuizError::NotCompleted);
    }

    #[test]
    fn completed_session_rejects_further_input() {
        let mut session = QuizSession::start(batch(10)).unwrap();
        for _ in 0..10 {
            session.select_answer(0).unwrap();
            session.next().unwrap();
        }
        assert_eq!(session.select_answer(0).unwrap_err(), QuizError::AlreadyCompleted);
        assert_eq!(session.next().unwrap_err(), QuizError::AlreadyCompleted);
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let mut session = QuizSession::start(batch(10)).unwrap();
        assert_eq!(session.select_answer(4).unwrap_err(), QuizError::InvalidOption(4));
    }
}
