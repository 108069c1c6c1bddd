pub mod error;
pub mod fx;
pub mod types;
pub mod wacc;

pub use error::WaccError;
pub use types::*;

/// Standard result type for all WACC operations
pub type WaccCalcResult<T> = Result<T, WaccError>;
