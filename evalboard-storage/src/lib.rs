pub mod memory;
pub mod postgres;
pub mod repositories;

pub use memory::MemoryStore;
pub use postgres::*;
pub use repositories::*;

use evalboard_core::{EvalStore, HealthCheck, JudgmentStore, ModelStore, ResultStore};
use sqlx::PgPool;
use std::sync::Arc;

/// Handles to every entity store, shared by the services and HTTP layer.
#[derive(Clone)]
pub struct Stores {
    pub models: Arc<dyn ModelStore>,
    pub evals: Arc<dyn EvalStore>,
    pub results: Arc<dyn ResultStore>,
    pub judgments: Arc<dyn JudgmentStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            models: Arc::new(ModelRepository::new(pool.clone())),
            evals: Arc::new(EvalRepository::new(pool.clone())),
            results: Arc::new(ResultRepository::new(pool.clone())),
            judgments: Arc::new(JudgmentRepository::new(pool.clone())),
            health: Arc::new(PostgresHealthCheck::new(pool)),
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    pub fn from_memory(store: MemoryStore) -> Self {
        Self {
            models: Arc::new(store.clone()),
            evals: Arc::new(store.clone()),
            results: Arc::new(store.clone()),
            judgments: Arc::new(store.clone()),
            health: Arc::new(store),
        }
    }
}
