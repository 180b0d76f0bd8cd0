// src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, types::Json};

use crate::{
    error::AppError,
    models::{
        attempt::{AnswerMap, Attempt, AttemptUpdate, Patch},
        exam::{Exam, ExamType, QuestionSnapshot},
        history::{HistoryEntry, Outcome},
        question::{Difficulty, Question},
        score::{QuestionResult, ScoreResult},
        theme::{Theme, ThemeCategory},
    },
    store::{AnalyticsSink, ExamStore, HistoryStore, QuestionSource, ThemeSource},
};

/// Postgres-backed collaborators. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: String,
    theme_id: String,
    text: String,
    choices: Json<Vec<String>>,
    correct_answer: i32,
    difficulty: Difficulty,
    tags: Json<Vec<String>>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: row.id,
            theme_id: row.theme_id,
            text: row.text,
            choices: row.choices.0,
            correct_answer: u32::try_from(row.correct_answer).unwrap_or_default(),
            difficulty: row.difficulty,
            tags: row.tags.0,
        }
    }
}

#[derive(FromRow)]
struct ThemeRow {
    id: String,
    code: String,
    name: String,
    category: ThemeCategory,
}

impl From<ThemeRow> for Theme {
    fn from(row: ThemeRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
            category: row.category,
        }
    }
}

#[derive(FromRow)]
struct HistoryRow {
    user_id: String,
    question_id: String,
    theme_id: String,
    outcome: Outcome,
    last_seen: DateTime<Utc>,
    times_answered: i32,
}

#[derive(FromRow)]
struct ExamRow {
    id: String,
    exam_type: ExamType,
    name: String,
    theme_ids: Json<Vec<String>>,
    questions: Json<Vec<QuestionSnapshot>>,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl From<ExamRow> for Exam {
    fn from(row: ExamRow) -> Self {
        Self {
            id: row.id,
            exam_type: row.exam_type,
            name: row.name,
            theme_ids: row.theme_ids.0,
            questions: row.questions.0,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct AttemptRow {
    id: String,
    exam_id: String,
    user_id: String,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    answers: Json<AnswerMap>,
    score: Option<f64>,
    details: Option<Json<ScoreResult>>,
}

impl From<AttemptRow> for Attempt {
    fn from(row: AttemptRow) -> Self {
        Self {
            id: row.id,
            exam_id: row.exam_id,
            user_id: row.user_id,
            started_at: row.started_at,
            finished_at: row.finished_at,
            answers: row.answers.0,
            score: row.score,
            details: row.details.map(|d| d.0),
        }
    }
}

const QUESTION_COLUMNS: &str =
    "SELECT id, theme_id, text, choices, correct_answer, difficulty, tags FROM questions";
const EXAM_COLUMNS: &str =
    "SELECT id, exam_type, name, theme_ids, questions, created_by, created_at FROM exams";
const ATTEMPT_COLUMNS: &str = "SELECT id, exam_id, user_id, started_at, finished_at, answers, score, details FROM attempts";

#[async_trait]
impl QuestionSource for PgStore {
    async fn list_by_themes(&self, theme_ids: &[String]) -> Result<Vec<Question>, AppError> {
        let rows: Vec<QuestionRow> = sqlx::query_as(&format!(
            "{} WHERE theme_id = ANY($1) ORDER BY created_at",
            QUESTION_COLUMNS
        ))
        .bind(theme_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions by themes: {:?}", e);
            AppError::from(e)
        })?;

        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Question>, AppError> {
        let row: Option<QuestionRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", QUESTION_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Question::from))
    }
}

#[async_trait]
impl ThemeSource for PgStore {
    async fn list_by_category(&self, category: ThemeCategory) -> Result<Vec<Theme>, AppError> {
        let rows: Vec<ThemeRow> = sqlx::query_as(
            "SELECT id, code, name, category FROM themes WHERE category = $1 ORDER BY code",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Theme::from).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Theme>, AppError> {
        let row: Option<ThemeRow> =
            sqlx::query_as("SELECT id, code, name, category FROM themes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Theme::from))
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Theme>, AppError> {
        let row: Option<ThemeRow> =
            sqlx::query_as("SELECT id, code, name, category FROM themes WHERE code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Theme::from))
    }
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn get_history_for_user_and_themes(
        &self,
        user_id: &str,
        theme_ids: &[String],
    ) -> Result<HashMap<String, HistoryEntry>, AppError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT user_id, question_id, theme_id, outcome, last_seen, times_answered
            FROM question_history
            WHERE user_id = $1 AND theme_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(theme_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let entry = HistoryEntry {
                    user_id: r.user_id,
                    question_id: r.question_id.clone(),
                    theme_id: r.theme_id,
                    outcome: r.outcome,
                    last_seen: r.last_seen,
                    times_answered: u32::try_from(r.times_answered).unwrap_or_default(),
                };
                (r.question_id, entry)
            })
            .collect())
    }

    async fn upsert_interaction(
        &self,
        user_id: &str,
        question_id: &str,
        theme_id: &str,
        outcome: Outcome,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO question_history (user_id, question_id, theme_id, outcome, last_seen, times_answered)
            VALUES ($1, $2, $3, $4, NOW(), 1)
            ON CONFLICT (user_id, question_id) DO UPDATE SET
                theme_id = EXCLUDED.theme_id,
                outcome = EXCLUDED.outcome,
                last_seen = EXCLUDED.last_seen,
                times_answered = question_history.times_answered + 1
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .bind(theme_id)
        .bind(outcome)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsSink for PgStore {
    async fn record_attempt_results(
        &self,
        attempt_id: &str,
        user_id: &str,
        results: &[QuestionResult],
    ) -> Result<(), AppError> {
        if results.is_empty() {
            return Ok(());
        }

        let mut query_builder = sqlx::QueryBuilder::<Postgres>::new(
            "INSERT INTO attempt_results (attempt_id, user_id, question_id, theme_id, status, is_correct) ",
        );
        query_builder.push_values(results, |mut b, r| {
            b.push_bind(attempt_id.to_owned())
                .push_bind(user_id.to_owned())
                .push_bind(r.question_id.clone())
                .push_bind(r.theme_id.clone())
                .push_bind(r.status)
                .push_bind(r.is_correct);
        });

        query_builder.build().execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ExamStore for PgStore {
    async fn create_exam(&self, exam: &Exam) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO exams (id, exam_type, name, theme_ids, questions, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&exam.id)
        .bind(exam.exam_type)
        .bind(&exam.name)
        .bind(Json(&exam.theme_ids))
        .bind(Json(&exam.questions))
        .bind(&exam.created_by)
        .bind(exam.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert exam: {:?}", e);
            AppError::from(e)
        })?;
        Ok(())
    }

    async fn get_exam(&self, id: &str) -> Result<Option<Exam>, AppError> {
        let row: Option<ExamRow> = sqlx::query_as(&format!("{} WHERE id = $1", EXAM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Exam::from))
    }

    async fn list_exams_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<Exam>, AppError> {
        let rows: Vec<ExamRow> = sqlx::query_as(&format!(
            "{} WHERE created_by = $1 ORDER BY created_at DESC LIMIT $2",
            EXAM_COLUMNS
        ))
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Exam::from).collect())
    }

    async fn create_attempt(&self, attempt: &Attempt) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO attempts (id, exam_id, user_id, started_at, finished_at, answers, score, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&attempt.id)
        .bind(&attempt.exam_id)
        .bind(&attempt.user_id)
        .bind(attempt.started_at)
        .bind(attempt.finished_at)
        .bind(Json(&attempt.answers))
        .bind(attempt.score)
        .bind(attempt.details.as_ref().map(Json))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_attempt(&self, id: &str) -> Result<Option<Attempt>, AppError> {
        let row: Option<AttemptRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", ATTEMPT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Attempt::from))
    }

    async fn update_attempt(&self, id: &str, update: AttemptUpdate) -> Result<bool, AppError> {
        if update.is_empty() {
            return Ok(false);
        }

        // Dynamic SET clause, one assignment per touched field
        let mut query_builder = sqlx::QueryBuilder::<Postgres>::new("UPDATE attempts SET ");
        let mut separated = query_builder.separated(", ");

        match update.answers {
            Patch::Keep => {}
            Patch::Set(answers) => {
                separated.push("answers = ");
                separated.push_bind_unseparated(Json(answers));
            }
            Patch::Unset => {
                separated.push("answers = '{}'::jsonb");
            }
        }
        match update.finished_at {
            Patch::Keep => {}
            Patch::Set(ts) => {
                separated.push("finished_at = ");
                separated.push_bind_unseparated(ts);
            }
            Patch::Unset => {
                separated.push("finished_at = NULL");
            }
        }
        match update.score {
            Patch::Keep => {}
            Patch::Set(score) => {
                separated.push("score = ");
                separated.push_bind_unseparated(score);
            }
            Patch::Unset => {
                separated.push("score = NULL");
            }
        }
        match update.details {
            Patch::Keep => {}
            Patch::Set(details) => {
                separated.push("details = ");
                separated.push_bind_unseparated(Json(details));
            }
            Patch::Unset => {
                separated.push("details = NULL");
            }
        }

        query_builder.push(" WHERE id = ");
        query_builder.push_bind(id.to_owned());

        let result = query_builder.build().execute(&self.pool).await.map_err(|e| {
            tracing::error!("Failed to update attempt {}: {:?}", id, e);
            AppError::from(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_attempts_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Attempt>, AppError> {
        let rows: Vec<AttemptRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 ORDER BY started_at DESC LIMIT $2",
            ATTEMPT_COLUMNS
        ))
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Attempt::from).collect())
    }
}
