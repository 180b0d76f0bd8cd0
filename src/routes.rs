// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempts, exams},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Every exam and attempt route requires a bearer token.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (services, config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            axum::http::HeaderValue::from_static("http://localhost:3000"),
            axum::http::HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let exam_routes = Router::new()
        .route("/", post(exams::generate_exam).get(exams::list_my_exams))
        .route("/{id}", get(exams::get_exam))
        .route("/{id}/attempts", post(attempts::start_attempt));

    let attempt_routes = Router::new()
        .route("/", get(attempts::list_history))
        .route("/{id}/answers", put(attempts::submit_answer))
        .route("/{id}/finish", post(attempts::finish_attempt))
        .route("/{id}/results", get(attempts::get_results));

    Router::new()
        .nest("/api/exams", exam_routes)
        .nest("/api/attempts", attempt_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
