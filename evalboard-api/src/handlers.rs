pub mod evals;
pub mod health;
pub mod judgments;
pub mod models;
pub mod results;
