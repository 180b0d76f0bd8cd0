// src/services/attempts.rs

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        attempt::{
            Attempt, AttemptHistoryItem, AttemptResults, AttemptUpdate, FinishAttemptResponse,
            Patch, StartAttemptResponse, SubmitAnswerResponse,
        },
        exam::Exam,
        history::Outcome,
        score::QuestionResult,
    },
    services::{results::ResultMaterializer, scoring::score_attempt},
    store::{AnalyticsSink, ExamStore, HistoryStore},
};

const EXAM_NOT_FOUND: &str = "Exam not found";
const ATTEMPT_NOT_FOUND: &str = "Attempt not found";
const NOT_AUTHORIZED: &str = "Not authorized";
const ALREADY_FINISHED: &str = "Attempt already finished";
const UNKNOWN_THEME: &str = "unknown";

/// Post-commit hook for finished attempts.
///
/// Runs only after the attempt is durably marked finished. Its errors are
/// returned to the caller to be logged, never to undo the finish.
pub struct ResultReporter {
    history: Arc<dyn HistoryStore>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl ResultReporter {
    pub fn new(history: Arc<dyn HistoryStore>, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { history, analytics }
    }

    /// Hands results to the analytics sink and upserts one history entry per question.
    /// Both steps run even if the other fails; the first error is returned.
    pub async fn report(
        &self,
        attempt_id: &str,
        user_id: &str,
        results: &[QuestionResult],
    ) -> Result<(), AppError> {
        let analytics = self
            .analytics
            .record_attempt_results(attempt_id, user_id, results)
            .await;

        let mut history = Ok(());
        for result in results {
            let theme_id = result.theme_id.as_deref().unwrap_or(UNKNOWN_THEME);
            if let Err(e) = self
                .history
                .upsert_interaction(user_id, &result.question_id, theme_id, Outcome::from(result.status))
                .await
            {
                tracing::warn!(
                    "Failed to record history for question {} (user {}): {}",
                    result.question_id,
                    user_id,
                    e
                );
                if history.is_ok() {
                    history = Err(e);
                }
            }
        }

        analytics.and(history)
    }
}

/// Attempt state machine: Created -> Finished.
pub struct AttemptService {
    exams: Arc<dyn ExamStore>,
    reporter: ResultReporter,
    materializer: ResultMaterializer,
}

impl AttemptService {
    pub fn new(
        exams: Arc<dyn ExamStore>,
        history: Arc<dyn HistoryStore>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        Self {
            reporter: ResultReporter::new(history, analytics),
            materializer: ResultMaterializer::new(exams.clone()),
            exams,
        }
    }

    async fn load_exam(&self, exam_id: &str) -> Result<Exam, AppError> {
        self.exams
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound(EXAM_NOT_FOUND.to_string()))
    }

    /// Loads an attempt and checks that `user_id` owns it.
    async fn load_owned(&self, attempt_id: &str, user_id: &str) -> Result<Attempt, AppError> {
        let attempt = self
            .exams
            .get_attempt(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound(ATTEMPT_NOT_FOUND.to_string()))?;

        if attempt.user_id != user_id {
            return Err(AppError::Forbidden(NOT_AUTHORIZED.to_string()));
        }
        Ok(attempt)
    }

    /// Like `load_owned`, and the attempt must still be open.
    async fn load_open(&self, attempt_id: &str, user_id: &str) -> Result<Attempt, AppError> {
        let attempt = self.load_owned(attempt_id, user_id).await?;
        if attempt.is_finished() {
            return Err(AppError::InvalidState(ALREADY_FINISHED.to_string()));
        }
        Ok(attempt)
    }

    pub async fn start(&self, exam_id: &str, user_id: &str) -> Result<StartAttemptResponse, AppError> {
        let exam = self.load_exam(exam_id).await?;

        let attempt = Attempt::new(exam_id, user_id);
        self.exams.create_attempt(&attempt).await?;
        tracing::info!("Attempt created: {} for exam {} by {}", attempt.id, exam_id, user_id);

        Ok(StartAttemptResponse {
            id: attempt.id,
            exam_id: attempt.exam_id,
            started_at: attempt.started_at,
            exam: exam.into(),
        })
    }

    /// Records (or overwrites) the answer for one question.
    /// Answers for questions outside the exam are stored but never scored.
    pub async fn submit_answer(
        &self,
        attempt_id: &str,
        question_id: &str,
        selected_answer: u32,
        user_id: &str,
    ) -> Result<SubmitAnswerResponse, AppError> {
        let attempt = self.load_open(attempt_id, user_id).await?;

        let mut answers = attempt.answers;
        answers.insert(question_id.to_owned(), selected_answer);

        let update = AttemptUpdate {
            answers: Patch::Set(answers),
            ..Default::default()
        };
        self.exams.update_attempt(attempt_id, update).await?;

        Ok(SubmitAnswerResponse {
            message: "Answer recorded".to_string(),
            question_id: question_id.to_owned(),
        })
    }

    /// Scores the attempt and marks it finished.
    ///
    /// * Finish timestamp, score and details are written in a single update.
    /// * Analytics and history reporting happen afterwards and cannot fail the call.
    pub async fn finish(&self, attempt_id: &str, user_id: &str) -> Result<FinishAttemptResponse, AppError> {
        let attempt = self.load_open(attempt_id, user_id).await?;
        let exam = self.load_exam(&attempt.exam_id).await?;

        let details = score_attempt(&exam.questions, &attempt.answers, exam.exam_type);

        let update = AttemptUpdate {
            finished_at: Patch::Set(Utc::now()),
            score: Patch::Set(details.final_score),
            details: Patch::Set(details.clone()),
            ..Default::default()
        };
        if !self.exams.update_attempt(attempt_id, update).await? {
            return Err(AppError::NotFound(ATTEMPT_NOT_FOUND.to_string()));
        }
        tracing::info!(
            "Attempt finished: {} score {} ({}/{} correct)",
            attempt_id,
            details.final_score,
            details.correct,
            details.total_questions
        );

        if let Err(e) = self.reporter.report(attempt_id, user_id, &details.results).await {
            tracing::error!("Failed to record analytics for attempt {}: {}", attempt_id, e);
        }

        Ok(FinishAttemptResponse {
            attempt_id: attempt_id.to_owned(),
            score: details.final_score,
            details,
        })
    }

    /// Results of any attempt the user owns, backfilling stored details when missing.
    pub async fn results(&self, attempt_id: &str, user_id: &str) -> Result<AttemptResults, AppError> {
        let mut attempt = self.load_owned(attempt_id, user_id).await?;
        let exam = self.load_exam(&attempt.exam_id).await?;

        let backfilled = attempt.details.is_none();
        let details = self.materializer.materialize(&attempt, &exam).await?;
        if backfilled {
            attempt.score = Some(details.final_score);
        }
        attempt.details = Some(details);

        Ok(AttemptResults {
            attempt,
            exam: exam.summary(),
        })
    }

    /// Newest-first attempt summaries for a user.
    pub async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<AttemptHistoryItem>, AppError> {
        let attempts = self.exams.list_attempts_by_user(user_id, limit).await?;

        let mut items = Vec::with_capacity(attempts.len());
        for attempt in attempts {
            let exam = self.exams.get_exam(&attempt.exam_id).await?;
            items.push(AttemptHistoryItem {
                exam_name: exam
                    .as_ref()
                    .map_or_else(|| "Unknown".to_string(), |e| e.name.clone()),
                exam_type: exam.as_ref().map(|e| e.exam_type),
                is_completed: attempt.is_finished(),
                attempt_id: attempt.id,
                exam_id: attempt.exam_id,
                started_at: attempt.started_at,
                finished_at: attempt.finished_at,
                score: attempt.score,
            });
        }

        Ok(items)
    }
}
