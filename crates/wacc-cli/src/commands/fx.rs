use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use wacc_core::fx::{self, FxGrowth};
use wacc_core::types::with_metadata;

/// Arguments for an FX rate projection
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ProjectFxArgs {
    /// Current rate (home units per foreign unit)
    #[arg(long)]
    pub rate: Decimal,

    /// Expected annual change (e.g. 0.03 for +3%)
    #[arg(long)]
    pub growth: Decimal,

    /// Horizon in years
    #[arg(long, default_value = "1")]
    pub years: u32,

    /// Treat --rate as a foreign-per-home quote and invert it first
    #[arg(long)]
    pub invert: bool,
}

#[derive(Serialize)]
struct FxProjection {
    current_rate: Decimal,
    projected_rate: Decimal,
    change_pct: Decimal,
}

pub fn run_project_fx(args: ProjectFxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let current = if args.invert {
        fx::invert_quote(args.rate)?
    } else {
        args.rate
    };
    let growth = FxGrowth {
        annual_rate: args.growth,
        horizon_years: args.years,
    };
    let projected = fx::project_rate(current, &growth)?;

    let projection = FxProjection {
        current_rate: current,
        projected_rate: projected,
        change_pct: (projected / current - Decimal::ONE) * Decimal::ONE_HUNDRED,
    };
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(serde_json::to_value(with_metadata(
        "Compound FX projection: rate * (1 + g)^n",
        &growth,
        Vec::new(),
        elapsed,
        projection,
    ))?)
}
