pub mod eval;
pub mod judgment;
pub mod model;
pub mod result;

pub use eval::*;
pub use judgment::*;
pub use model::*;
pub use result::*;

use axum::extract::FromRequest;
use evalboard_workflow::BatchReport;
use serde::Serialize;

use crate::error::ApiError;

/// `axum::Json` whose rejections render as [`ApiError::Validation`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Response body for fan-out procedures: every persisted row plus counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse<T> {
    pub rows: Vec<T>,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<String>,
}

impl<T> From<BatchReport<T>> for BatchResponse<T> {
    fn from(report: BatchReport<T>) -> Self {
        let succeeded = report.succeeded();
        let failed = report.failed();
        let failures = report.failures().into_iter().map(str::to_string).collect();
        Self {
            rows: report.into_rows(),
            succeeded,
            failed,
            failures,
        }
    }
}
