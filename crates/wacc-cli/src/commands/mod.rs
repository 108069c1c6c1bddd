pub mod fx;
pub mod wacc;
