pub mod dto;
pub mod error;
pub mod handlers;

pub use dto::*;
pub use error::{ApiError, ApiResult};

use axum::{
    routing::{get, post},
    Router,
};
use evalboard_storage::Stores;
use evalboard_workflow::{ChatProvider, EvalGenerator, EvalJudge, EvalRunner, WorkflowSettings};
use std::sync::Arc;

/// Shared handler state: the stores plus the three model-calling services.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub generator: Arc<EvalGenerator>,
    pub runner: Arc<EvalRunner>,
    pub judge: Arc<EvalJudge>,
}

impl AppState {
    pub fn new(stores: Stores, provider: Arc<dyn ChatProvider>, settings: &WorkflowSettings) -> Self {
        Self {
            generator: Arc::new(EvalGenerator::new(stores.clone(), provider.clone(), settings)),
            runner: Arc::new(EvalRunner::new(stores.clone(), provider.clone(), settings)),
            judge: Arc::new(EvalJudge::new(stores.clone(), provider, settings)),
            stores,
        }
    }
}

/// The JSON procedures, meant to be nested under `/api/v1`.
pub fn routes(state: AppState) -> Router {
    Router::new()
        // Models
        .route("/models", post(handlers::models::create).get(handlers::models::list))
        .route(
            "/models/:id",
            get(handlers::models::get)
                .patch(handlers::models::update)
                .delete(handlers::models::delete),
        )
        .route("/models/:id/stats", get(handlers::models::stats))
        // Evals
        .route("/evals/generate", post(handlers::evals::generate))
        .route("/evals/query", post(handlers::evals::list))
        .route(
            "/evals/:id",
            get(handlers::evals::get)
                .patch(handlers::evals::update)
                .delete(handlers::evals::delete),
        )
        // Results
        .route("/results", get(handlers::results::list))
        .route("/results/run", post(handlers::results::run))
        .route("/results/run-batch", post(handlers::results::run_batch))
        .route(
            "/results/:id",
            get(handlers::results::get)
                .patch(handlers::results::update)
                .delete(handlers::results::delete),
        )
        // Judgments
        .route("/judgments", get(handlers::judgments::list))
        .route("/judgments/judge", post(handlers::judgments::judge))
        .route("/judgments/leaderboard", get(handlers::judgments::leaderboard))
        .route(
            "/judgments/:id",
            get(handlers::judgments::get)
                .patch(handlers::judgments::update)
                .delete(handlers::judgments::delete),
        )
        .with_state(state)
}

/// `GET /health`, served outside the versioned prefix.
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .with_state(state)
}
