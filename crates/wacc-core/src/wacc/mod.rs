pub mod calculator;
pub mod engine;
pub mod sources;

pub use calculator::{calculate_wacc, formula_terms, summary_rows, WaccInput, WaccOutput};
pub use engine::{checked_firm_value, compute_wacc, DebtSource, EquityInput, WaccResult};
