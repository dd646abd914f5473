pub mod eval;
pub mod judgment;
pub mod model;
pub mod result;

pub use eval::EvalRepository;
pub use judgment::JudgmentRepository;
pub use model::ModelRepository;
pub use result::ResultRepository;
