pub mod ids;
pub mod model;
pub mod eval;
pub mod result;
pub mod judgment;
pub mod filter;
pub mod stats;

pub use ids::*;
pub use model::*;
pub use eval::*;
pub use result::*;
pub use judgment::*;
pub use filter::*;
pub use stats::*;
