// src/models/question.rs

use serde::{Deserialize, Serialize};

/// Difficulty tag attached to a question by its author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "difficulty", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// A question from the bank.
/// Owned by the question CRUD surface; the exam engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,

    /// Theme the question belongs to.
    pub theme_id: String,

    pub text: String,

    /// Ordered choice texts (e.g., ["Option A", "Option B"]).
    pub choices: Vec<String>,

    /// Zero-based index into `choices`.
    pub correct_answer: u32,

    #[serde(default)]
    pub difficulty: Difficulty,

    #[serde(default)]
    pub tags: Vec<String>,
}
