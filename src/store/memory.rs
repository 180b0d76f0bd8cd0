// src/store/memory.rs

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

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
    store::{AnalyticsSink, ExamStore, HistoryStore, QuestionSource, ThemeSource},
};

/// Results handed to the analytics sink for one finished attempt.
#[derive(Debug, Clone)]
pub struct RecordedResults {
    pub attempt_id: String,
    pub user_id: String,
    pub results: Vec<QuestionResult>,
}

/// Process-local implementation of every collaborator.
/// Used by the test suites and for running the service without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    questions: RwLock<Vec<Question>>,
    themes: RwLock<Vec<Theme>>,
    history: RwLock<HashMap<(String, String), HistoryEntry>>,
    analytics: RwLock<Vec<RecordedResults>>,
    exams: RwLock<Vec<Exam>>,
    attempts: RwLock<Vec<Attempt>>,
    attempt_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_theme(&self, theme: Theme) {
        self.themes.write().await.push(theme);
    }

    /// Inserts or replaces a question by id.
    pub async fn put_question(&self, question: Question) {
        let mut questions = self.questions.write().await;
        match questions.iter_mut().find(|q| q.id == question.id) {
            Some(existing) => *existing = question,
            None => questions.push(question),
        }
    }

    pub async fn insert_history(&self, entry: HistoryEntry) {
        let key = (entry.user_id.clone(), entry.question_id.clone());
        self.history.write().await.insert(key, entry);
    }

    pub async fn history_entry(&self, user_id: &str, question_id: &str) -> Option<HistoryEntry> {
        self.history
            .read()
            .await
            .get(&(user_id.to_owned(), question_id.to_owned()))
            .cloned()
    }

    pub async fn recorded_results(&self) -> Vec<RecordedResults> {
        self.analytics.read().await.clone()
    }

    /// Number of successful attempt updates so far.
    pub fn attempt_writes(&self) -> usize {
        self.attempt_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionSource for MemoryStore {
    async fn list_by_themes(&self, theme_ids: &[String]) -> Result<Vec<Question>, AppError> {
        Ok(self
            .questions
            .read()
            .await
            .iter()
            .filter(|q| theme_ids.contains(&q.theme_id))
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Question>, AppError> {
        Ok(self.questions.read().await.iter().find(|q| q.id == id).cloned())
    }
}

#[async_trait]
impl ThemeSource for MemoryStore {
    async fn list_by_category(&self, category: ThemeCategory) -> Result<Vec<Theme>, AppError> {
        Ok(self
            .themes
            .read()
            .await
            .iter()
            .filter(|t| t.category == category)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Theme>, AppError> {
        Ok(self.themes.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Theme>, AppError> {
        Ok(self.themes.read().await.iter().find(|t| t.code == code).cloned())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn get_history_for_user_and_themes(
        &self,
        user_id: &str,
        theme_ids: &[String],
    ) -> Result<HashMap<String, HistoryEntry>, AppError> {
        Ok(self
            .history
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id && theme_ids.contains(&e.theme_id))
            .map(|e| (e.question_id.clone(), e.clone()))
            .collect())
    }

    async fn upsert_interaction(
        &self,
        user_id: &str,
        question_id: &str,
        theme_id: &str,
        outcome: Outcome,
    ) -> Result<(), AppError> {
        let mut history = self.history.write().await;
        let now = Utc::now();
        history
            .entry((user_id.to_owned(), question_id.to_owned()))
            .and_modify(|e| {
                e.theme_id = theme_id.to_owned();
                e.outcome = outcome;
                e.last_seen = now;
                e.times_answered += 1;
            })
            .or_insert_with(|| HistoryEntry {
                user_id: user_id.to_owned(),
                question_id: question_id.to_owned(),
                theme_id: theme_id.to_owned(),
                outcome,
                last_seen: now,
                times_answered: 1,
            });
        Ok(())
    }
}

#[async_trait]
impl AnalyticsSink for MemoryStore {
    async fn record_attempt_results(
        &self,
        attempt_id: &str,
        user_id: &str,
        results: &[QuestionResult],
    ) -> Result<(), AppError> {
        self.analytics.write().await.push(RecordedResults {
            attempt_id: attempt_id.to_owned(),
            user_id: user_id.to_owned(),
            results: results.to_vec(),
        });
        Ok(())
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn create_exam(&self, exam: &Exam) -> Result<(), AppError> {
        self.exams.write().await.push(exam.clone());
        Ok(())
    }

    async fn get_exam(&self, id: &str) -> Result<Option<Exam>, AppError> {
        Ok(self.exams.read().await.iter().find(|e| e.id == id).cloned())
    }

    async fn list_exams_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<Exam>, AppError> {
        let mut exams: Vec<Exam> = self
            .exams
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| e.created_by == user_id)
            .cloned()
            .collect();
        exams.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        exams.truncate(limit);
        Ok(exams)
    }

    async fn create_attempt(&self, attempt: &Attempt) -> Result<(), AppError> {
        self.attempts.write().await.push(attempt.clone());
        Ok(())
    }

    async fn get_attempt(&self, id: &str) -> Result<Option<Attempt>, AppError> {
        Ok(self.attempts.read().await.iter().find(|a| a.id == id).cloned())
    }

    async fn update_attempt(&self, id: &str, update: AttemptUpdate) -> Result<bool, AppError> {
        if update.is_empty() {
            return Ok(false);
        }
        let mut attempts = self.attempts.write().await;
        let Some(attempt) = attempts.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        update.apply(attempt);
        self.attempt_writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn list_attempts_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Attempt>, AppError> {
        let mut attempts: Vec<Attempt> = self
            .attempts
            .read()
            .await
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        attempts.truncate(limit);
        Ok(attempts)
    }
}
