// src/handlers/attempts.rs

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
    models::{attempt::SubmitAnswerRequest, exam::ListParams},
    services::attempts::AttemptService,
    utils::jwt::Claims,
};

/// Starts a new attempt at an exam. Returns 201 with the exam (answers hidden).
pub async fn start_attempt(
    State(attempts): State<Arc<AttemptService>>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let started = attempts.start(&exam_id, &claims.sub).await?;
    Ok((StatusCode::CREATED, Json(started)))
}

/// Records the answer to one question of an open attempt.
pub async fn submit_answer(
    State(attempts): State<Arc<AttemptService>>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<String>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let recorded = attempts
        .submit_answer(
            &attempt_id,
            &payload.question_id,
            payload.selected_answer,
            &claims.sub,
        )
        .await?;
    Ok(Json(recorded))
}

/// Finishes an attempt and returns its score.
pub async fn finish_attempt(
    State(attempts): State<Arc<AttemptService>>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let finished = attempts.finish(&attempt_id, &claims.sub).await?;
    Ok(Json(finished))
}

/// Returns a finished attempt with its score details and exam summary.
pub async fn get_results(
    State(attempts): State<Arc<AttemptService>>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let results = attempts.results(&attempt_id, &claims.sub).await?;
    Ok(Json(results))
}

/// Lists the current user's attempts, newest first.
pub async fn list_history(
    State(attempts): State<Arc<AttemptService>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let history = attempts.history(&claims.sub, limit).await?;
    Ok(Json(history))
}
