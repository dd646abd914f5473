use futures::future::join_all;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Result of one unit of a fan-out. A failed unit may still have produced a
/// row (for example an error-tagged eval).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum UnitOutcome<T> {
    Succeeded { row: T },
    Failed { reason: String, row: Option<T> },
}

impl<T> UnitOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, UnitOutcome::Succeeded { .. })
    }

    pub fn row(&self) -> Option<&T> {
        match self {
            UnitOutcome::Succeeded { row } => Some(row),
            UnitOutcome::Failed { row, .. } => row.as_ref(),
        }
    }

    pub fn into_row(self) -> Option<T> {
        match self {
            UnitOutcome::Succeeded { row } => Some(row),
            UnitOutcome::Failed { row, .. } => row,
        }
    }
}

/// Outcomes of a whole fan-out, in submission order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchReport<T> {
    pub outcomes: Vec<UnitOutcome<T>>,
}

impl<T> BatchReport<T> {
    pub fn new(outcomes: Vec<UnitOutcome<T>>) -> Self {
        Self { outcomes }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Every persisted row, failed units included.
    pub fn rows(&self) -> Vec<&T> {
        self.outcomes.iter().filter_map(UnitOutcome::row).collect()
    }

    pub fn into_rows(self) -> Vec<T> {
        self.outcomes
            .into_iter()
            .filter_map(UnitOutcome::into_row)
            .collect()
    }

    pub fn failures(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                UnitOutcome::Failed { reason, .. } => Some(reason.as_str()),
                UnitOutcome::Succeeded { .. } => None,
            })
            .collect()
    }
}

/// Runs a batch of independent futures to completion with at most
/// `max_concurrency` in flight. No unit cancels its siblings.
#[derive(Debug, Clone)]
pub struct BatchExecutor {
    max_concurrency: usize,
}

impl BatchExecutor {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Results come back in the order the units were given.
    pub async fn execute<F, T>(&self, units: Vec<F>) -> Vec<T>
    where
        F: Future<Output = T>,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let gated = units.into_iter().map(|unit| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // Never closed, so the permit is always granted.
                let _permit = semaphore.acquire().await;
                unit.await
            }
        });

        join_all(gated).await
    }
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(8)
    }
}
