pub mod cards;
pub mod engine;
pub mod types;

pub use engine::resolve;
pub use types::*;
