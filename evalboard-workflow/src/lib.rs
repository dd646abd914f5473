pub mod executor;
pub mod provider;
pub mod tasks;

pub use executor::*;
pub use provider::*;
pub use tasks::*;
