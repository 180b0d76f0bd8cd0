// src/store/mod.rs

//! Collaborator boundaries of the exam engine.
//!
//! Questions and themes are read-only here; exams and attempts are owned by
//! the engine; history and analytics are written after an attempt finishes.

pub mod memory;
pub mod postgres;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, AttemptUpdate},
        exam::Exam,
        history::{HistoryEntry, Outcome},
        question::Question,
        score::QuestionResult,
        theme::{Theme, ThemeCategory},
    },
};

#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn list_by_themes(&self, theme_ids: &[String]) -> Result<Vec<Question>, AppError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<Question>, AppError>;
}

#[async_trait]
pub trait ThemeSource: Send + Sync {
    async fn list_by_category(&self, category: ThemeCategory) -> Result<Vec<Theme>, AppError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<Theme>, AppError>;
    async fn get_by_code(&self, code: &str) -> Result<Option<Theme>, AppError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Keyed by question id.
    async fn get_history_for_user_and_themes(
        &self,
        user_id: &str,
        theme_ids: &[String],
    ) -> Result<HashMap<String, HistoryEntry>, AppError>;

    async fn upsert_interaction(
        &self,
        user_id: &str,
        question_id: &str,
        theme_id: &str,
        outcome: Outcome,
    ) -> Result<(), AppError>;
}

#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn record_attempt_results(
        &self,
        attempt_id: &str,
        user_id: &str,
        results: &[QuestionResult],
    ) -> Result<(), AppError>;
}

#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn create_exam(&self, exam: &Exam) -> Result<(), AppError>;
    async fn get_exam(&self, id: &str) -> Result<Option<Exam>, AppError>;
    /// Newest first.
    async fn list_exams_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<Exam>, AppError>;

    async fn create_attempt(&self, attempt: &Attempt) -> Result<(), AppError>;
    async fn get_attempt(&self, id: &str) -> Result<Option<Attempt>, AppError>;
    /// Returns false when nothing was changed (unknown id or empty update).
    async fn update_attempt(&self, id: &str, update: AttemptUpdate) -> Result<bool, AppError>;
    /// Newest first.
    async fn list_attempts_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Attempt>, AppError>;
}

/// Bundle of collaborator handles the services are built from.
#[derive(Clone)]
pub struct Stores {
    pub questions: Arc<dyn QuestionSource>,
    pub themes: Arc<dyn ThemeSource>,
    pub history: Arc<dyn HistoryStore>,
    pub analytics: Arc<dyn AnalyticsSink>,
    pub exams: Arc<dyn ExamStore>,
}

impl Stores {
    /// All collaborators backed by the same in-memory store.
    pub fn memory(store: Arc<memory::MemoryStore>) -> Self {
        Self {
            questions: store.clone(),
            themes: store.clone(),
            history: store.clone(),
            analytics: store.clone(),
            exams: store,
        }
    }

    pub fn postgres(store: postgres::PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            questions: store.clone(),
            themes: store.clone(),
            history: store.clone(),
            analytics: store.clone(),
            exams: store,
        }
    }
}
