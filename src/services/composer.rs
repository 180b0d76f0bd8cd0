// src/services/composer.rs

use std::sync::Arc;

use chrono::Utc;

use crate::{
    config::{SIMULACRO_GENERAL_COUNT, SIMULACRO_QUESTION_COUNT, SIMULACRO_SPECIFIC_COUNT},
    error::AppError,
    models::{
        exam::{Exam, ExamType, GenerateExamRequest, QuestionSnapshot},
        question::Question,
        theme::ThemeCategory,
    },
    services::selector::QuestionSelector,
    store::{ExamStore, ThemeSource},
};

/// Builds exams from selected questions and stores them.
pub struct ExamComposer {
    selector: QuestionSelector,
    themes: Arc<dyn ThemeSource>,
    exams: Arc<dyn ExamStore>,
}

impl ExamComposer {
    pub fn new(
        selector: QuestionSelector,
        themes: Arc<dyn ThemeSource>,
        exams: Arc<dyn ExamStore>,
    ) -> Self {
        Self {
            selector,
            themes,
            exams,
        }
    }

    /// Entry point for exam generation requests.
    /// A `SIMULACRO` request ignores themes and count and uses the fixed shape.
    pub async fn generate(&self, req: GenerateExamRequest, user_id: &str) -> Result<Exam, AppError> {
        if req.exam_type == ExamType::Simulacro {
            return self.generate_simulacro(req.name, user_id).await;
        }

        let theme_ids = self.resolve_themes(&req.theme_ids, &req.theme_codes).await?;
        let name = req
            .name
            .unwrap_or_else(|| req.exam_type.default_name().to_string());

        self.generate_standard(req.exam_type, name, theme_ids, req.question_count as usize, user_id)
            .await
    }

    /// Merges explicit theme ids with ids looked up by code, in request order.
    async fn resolve_themes(&self, ids: &[String], codes: &[String]) -> Result<Vec<String>, AppError> {
        let mut theme_ids: Vec<String> = Vec::with_capacity(ids.len() + codes.len());

        for id in ids {
            if self.themes.get_by_id(id).await?.is_none() {
                return Err(AppError::Validation(format!("Unknown theme id: {}", id)));
            }
            if !theme_ids.contains(id) {
                theme_ids.push(id.clone());
            }
        }

        for code in codes {
            let theme = self
                .themes
                .get_by_code(code)
                .await?
                .ok_or_else(|| AppError::Validation(format!("Unknown theme code: {}", code)))?;
            if !theme_ids.contains(&theme.id) {
                theme_ids.push(theme.id);
            }
        }

        Ok(theme_ids)
    }

    /// Standard exam: one selector pass over the union of the themes.
    pub async fn generate_standard(
        &self,
        exam_type: ExamType,
        name: String,
        theme_ids: Vec<String>,
        question_count: usize,
        user_id: &str,
    ) -> Result<Exam, AppError> {
        if theme_ids.is_empty() {
            return Err(AppError::Validation(
                "At least one theme must be specified".to_string(),
            ));
        }

        let questions = self.selector.select(&theme_ids, question_count, user_id).await?;
        if questions.len() < question_count {
            return Err(AppError::InsufficientQuestions {
                category: None,
                found: questions.len(),
                required: question_count,
            });
        }

        self.store_exam(exam_type, name, theme_ids, &questions, user_id)
            .await
    }

    /// Simulacro: 12 questions from GENERAL themes followed by 28 from SPECIFIC themes.
    pub async fn generate_simulacro(
        &self,
        name: Option<String>,
        user_id: &str,
    ) -> Result<Exam, AppError> {
        let general_ids = self.theme_ids_for(ThemeCategory::General).await?;
        let specific_ids = self.theme_ids_for(ThemeCategory::Specific).await?;

        let general = self
            .pick_block(ThemeCategory::General, &general_ids, SIMULACRO_GENERAL_COUNT, user_id)
            .await?;
        let specific = self
            .pick_block(ThemeCategory::Specific, &specific_ids, SIMULACRO_SPECIFIC_COUNT, user_id)
            .await?;

        let mut questions = general;
        questions.extend(specific);
        debug_assert_eq!(questions.len(), SIMULACRO_QUESTION_COUNT);

        let mut theme_ids = general_ids;
        theme_ids.extend(specific_ids);

        let name = name.unwrap_or_else(|| ExamType::Simulacro.default_name().to_string());
        self.store_exam(ExamType::Simulacro, name, theme_ids, &questions, user_id)
            .await
    }

    async fn theme_ids_for(&self, category: ThemeCategory) -> Result<Vec<String>, AppError> {
        let themes = self.themes.list_by_category(category).await?;
        if themes.is_empty() {
            return Err(AppError::MissingThemeCategory(category));
        }
        Ok(themes.into_iter().map(|t| t.id).collect())
    }

    async fn pick_block(
        &self,
        category: ThemeCategory,
        theme_ids: &[String],
        required: usize,
        user_id: &str,
    ) -> Result<Vec<Question>, AppError> {
        let questions = self.selector.select(theme_ids, required, user_id).await?;
        if questions.len() < required {
            return Err(AppError::InsufficientQuestions {
                category: Some(category),
                found: questions.len(),
                required,
            });
        }
        Ok(questions)
    }

    async fn store_exam(
        &self,
        exam_type: ExamType,
        name: String,
        theme_ids: Vec<String>,
        questions: &[Question],
        user_id: &str,
    ) -> Result<Exam, AppError> {
        let exam = Exam {
            id: uuid::Uuid::new_v4().to_string(),
            exam_type,
            name,
            theme_ids,
            questions: questions.iter().map(QuestionSnapshot::from).collect(),
            created_by: user_id.to_owned(),
            created_at: Utc::now(),
        };

        self.exams.create_exam(&exam).await?;
        tracing::info!(
            "Exam created: {} ({:?}, {} questions) by {}",
            exam.id,
            exam.exam_type,
            exam.questions.len(),
            user_id
        );

        Ok(exam)
    }

    pub async fn get_exam(&self, exam_id: &str) -> Result<Exam, AppError> {
        self.exams
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))
    }

    pub async fn list_exams(&self, user_id: &str, limit: usize) -> Result<Vec<Exam>, AppError> {
        self.exams.list_exams_by_user(user_id, limit).await
    }
}
