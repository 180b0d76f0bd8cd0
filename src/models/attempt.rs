// src/models/attempt.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    exam::{ExamSummary, ExamType, PublicExam},
    score::ScoreResult,
};

/// Question id -> selected choice index. Absent entries are unanswered.
pub type AnswerMap = HashMap<String, u32>;

/// A user's attempt at an exam.
/// Created (no `finished_at`) until finished; terminal afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    pub exam_id: String,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub answers: AnswerMap,
    pub score: Option<f64>,
    pub details: Option<ScoreResult>,
}

impl Attempt {
    pub fn new(exam_id: &str, user_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            exam_id: exam_id.to_owned(),
            user_id: user_id.to_owned(),
            started_at: Utc::now(),
            finished_at: None,
            answers: AnswerMap::new(),
            score: None,
            details: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

/// Field-level change for a partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Set(T),
    Unset,
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Set(v) => *slot = Some(v),
            Patch::Unset => *slot = None,
        }
    }
}

/// Partial update of an attempt document. Each field is set, unset or kept
/// independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttemptUpdate {
    pub answers: Patch<AnswerMap>,
    pub finished_at: Patch<DateTime<Utc>>,
    pub score: Patch<f64>,
    pub details: Patch<ScoreResult>,
}

impl AttemptUpdate {
    pub fn is_empty(&self) -> bool {
        self.answers.is_keep()
            && self.finished_at.is_keep()
            && self.score.is_keep()
            && self.details.is_keep()
    }

    /// Applies the update to an in-memory attempt. Unsetting answers clears the map.
    pub fn apply(self, attempt: &mut Attempt) {
        match self.answers {
            Patch::Keep => {}
            Patch::Set(answers) => attempt.answers = answers,
            Patch::Unset => attempt.answers.clear(),
        }
        self.finished_at.apply_to(&mut attempt.finished_at);
        self.score.apply_to(&mut attempt.score);
        self.details.apply_to(&mut attempt.details);
    }
}

/// DTO for submitting a single answer.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(min = 1, max = 100))]
    pub question_id: String,
    pub selected_answer: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub message: String,
    pub question_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartAttemptResponse {
    pub id: String,
    pub exam_id: String,
    pub started_at: DateTime<Utc>,
    pub exam: PublicExam,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinishAttemptResponse {
    pub attempt_id: String,
    pub score: f64,
    pub details: ScoreResult,
}

/// Attempt with materialized details plus a summary of its exam.
#[derive(Debug, Serialize, Deserialize)]
pub struct AttemptResults {
    #[serde(flatten)]
    pub attempt: Attempt,
    pub exam: ExamSummary,
}

/// Row of a user's attempt history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptHistoryItem {
    pub attempt_id: String,
    pub exam_id: String,
    pub exam_name: String,
    pub exam_type: Option<ExamType>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub is_completed: bool,
}
