// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;
use rand::rngs::StdRng;

use crate::{
    config::Config,
    services::{attempts::AttemptService, composer::ExamComposer, selector::QuestionSelector},
    store::Stores,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub composer: Arc<ExamComposer>,
    pub attempts: Arc<AttemptService>,
}

impl AppState {
    /// Wires the services on top of the given collaborators.
    /// `rng` drives the shuffle of unseen questions.
    pub fn new(config: Config, stores: Stores, rng: StdRng) -> Self {
        let selector = QuestionSelector::new(stores.questions, stores.history.clone(), rng);
        let composer = ExamComposer::new(selector, stores.themes, stores.exams.clone());
        let attempts = AttemptService::new(stores.exams, stores.history, stores.analytics);

        Self {
            config,
            composer: Arc::new(composer),
            attempts: Arc::new(attempts),
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<ExamComposer> {
    fn from_ref(state: &AppState) -> Self {
        state.composer.clone()
    }
}

impl FromRef<AppState> for Arc<AttemptService> {
    fn from_ref(state: &AppState) -> Self {
        state.attempts.clone()
    }
}
