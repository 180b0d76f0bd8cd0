// src/models/exam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::Question;

/// Closed set of exam shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "exam_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamType {
    #[default]
    Theory,
    TheoryTopic,
    TheoryMixed,
    Practical,
    /// Composite 40-question exam (12 general + 28 specific).
    Simulacro,
}

impl ExamType {
    /// Maximum achievable final score for this exam type.
    pub fn scale(self) -> u32 {
        match self {
            ExamType::Simulacro => 100,
            _ => 70,
        }
    }

    pub fn default_name(self) -> &'static str {
        match self {
            ExamType::Theory | ExamType::TheoryTopic => "Teoría por Tema",
            ExamType::TheoryMixed => "Teoría Mixta",
            ExamType::Practical => "Supuesto Práctico",
            ExamType::Simulacro => "Simulacro Completo",
        }
    }
}

/// Frozen copy of the scoring-relevant fields of a question.
/// Never changes after the exam is created, even if the source question does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSnapshot {
    pub question_id: String,
    pub text: String,
    #[serde(default)]
    pub choices: Vec<String>,
    pub correct_answer: u32,
    /// Missing on exams created before themes were tracked per snapshot.
    #[serde(default)]
    pub theme_id: Option<String>,
}

impl From<&Question> for QuestionSnapshot {
    fn from(q: &Question) -> Self {
        Self {
            question_id: q.id.clone(),
            text: q.text.clone(),
            choices: q.choices.clone(),
            correct_answer: q.correct_answer,
            theme_id: Some(q.theme_id.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    #[serde(rename = "type")]
    pub exam_type: ExamType,
    pub name: String,
    pub theme_ids: Vec<String>,
    pub questions: Vec<QuestionSnapshot>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Exam {
    pub fn snapshot(&self, question_id: &str) -> Option<&QuestionSnapshot> {
        self.questions.iter().find(|q| q.question_id == question_id)
    }

    pub fn summary(&self) -> ExamSummary {
        ExamSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            exam_type: self.exam_type,
            question_count: self.questions.len(),
        }
    }
}

/// DTO for sending a snapshot to the client (excludes the correct answer).
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub question_id: String,
    pub text: String,
    pub choices: Vec<String>,
    pub theme_id: Option<String>,
}

/// DTO for sending an exam to the client while it is being taken.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicExam {
    pub id: String,
    #[serde(rename = "type")]
    pub exam_type: ExamType,
    pub name: String,
    pub theme_ids: Vec<String>,
    pub questions: Vec<PublicQuestion>,
    pub created_at: DateTime<Utc>,
}

impl From<Exam> for PublicExam {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id,
            exam_type: exam.exam_type,
            name: exam.name,
            theme_ids: exam.theme_ids,
            questions: exam
                .questions
                .into_iter()
                .map(|q| PublicQuestion {
                    question_id: q.question_id,
                    text: q.text,
                    choices: q.choices,
                    theme_id: q.theme_id,
                })
                .collect(),
            created_at: exam.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub exam_type: ExamType,
    pub question_count: usize,
}

fn default_question_count() -> u32 {
    10
}

/// DTO for generating an exam.
/// `theme_ids` and `theme_codes` are merged; both are ignored for a simulacro.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateExamRequest {
    #[serde(rename = "type", default)]
    pub exam_type: ExamType,

    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[serde(default)]
    pub theme_ids: Vec<String>,

    #[serde(default)]
    pub theme_codes: Vec<String>,

    #[serde(default = "default_question_count")]
    #[validate(range(min = 1, max = 200))]
    pub question_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}
