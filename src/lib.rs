
pub mod branch;
pub mod config;
pub mod error;
pub mod history;
pub mod predictor;
pub mod stats;

pub use branch::*;
pub use error::*;
pub use history::*;
pub use predictor::*;
