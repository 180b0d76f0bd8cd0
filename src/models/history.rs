// src/models/history.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::score::AnswerStatus;

/// Outcome of the most recent interaction between a user and a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Correct,
    Incorrect,
    Unanswered,
}

impl From<AnswerStatus> for Outcome {
    fn from(status: AnswerStatus) -> Self {
        match status {
            AnswerStatus::Correct => Outcome::Correct,
            AnswerStatus::Incorrect => Outcome::Incorrect,
            AnswerStatus::Unanswered => Outcome::Unanswered,
        }
    }
}

/// One record per (user, question) pair. Upserted on every finished attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user_id: String,
    pub question_id: String,
    pub theme_id: String,
    pub outcome: Outcome,
    pub last_seen: DateTime<Utc>,
    pub times_answered: u32,
}
