// src/handlers/exams.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    config::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT},
    error::AppError,
    models::exam::{GenerateExamRequest, ListParams, PublicExam},
    services::composer::ExamComposer,
    utils::jwt::Claims,
};

/// Generates an exam for the current user.
///
/// * `type = SIMULACRO` builds the fixed 12 + 28 composite exam.
/// * Any other type draws `question_count` questions from the given themes.
/// * Returns 201 with the exam summary.
pub async fn generate_exam(
    State(composer): State<Arc<ExamComposer>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GenerateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let exam = composer.generate(payload, &claims.sub).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": exam.id,
            "type": exam.exam_type,
            "name": exam.name,
            "theme_ids": exam.theme_ids,
            "question_count": exam.questions.len(),
            "created_at": exam.created_at,
        })),
    ))
}

/// Fetches an exam without its answer key.
pub async fn get_exam(
    State(composer): State<Arc<ExamComposer>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exam = composer.get_exam(&id).await?;
    Ok(Json(PublicExam::from(exam)))
}

/// Lists exams created by the current user, newest first.
pub async fn list_my_exams(
    State(composer): State<Arc<ExamComposer>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let exams = composer.list_exams(&claims.sub, limit).await?;

    let summaries: Vec<_> = exams.iter().map(|e| e.summary()).collect();
    Ok(Json(summaries))
}
