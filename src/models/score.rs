// src/models/score.rs

use serde::{Deserialize, Serialize};

use crate::models::exam::ExamType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "answer_status", rename_all = "lowercase")]
pub enum AnswerStatus {
    Correct,
    Incorrect,
    #[default]
    Unanswered,
}

/// Per-question line of a score result.
///
/// Carries enough denormalized data to render a review screen without
/// joining against the exam. Fields are optional because records written by
/// older versions may lack them; the result materializer fills them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionResult {
    pub question_id: String,
    pub question_text: Option<String>,
    pub choices: Vec<String>,
    pub theme_id: Option<String>,
    pub selected_answer: Option<u32>,
    pub correct_answer: Option<u32>,
    pub is_correct: bool,
    pub status: AnswerStatus,
}

/// Output of the scoring engine. Derived data, recomputable at any time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreResult {
    pub total_questions: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub raw_score: f64,
    pub final_score: f64,
    pub scale: u32,
    pub exam_type: ExamType,
    pub results: Vec<QuestionResult>,
}
