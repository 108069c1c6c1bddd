use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::time::Instant;

use wacc_core::fx::{FxGrowth, FxTable};
use wacc_core::types::{with_metadata, Currency};
use wacc_core::wacc::sources::CapitalSource;
use wacc_core::wacc::{self, DebtSource, EquityInput, WaccInput};

use crate::input;

/// Arguments for a direct engine run
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ComputeArgs {
    /// Market value of equity
    #[arg(long, default_value = "0")]
    pub equity_value: Decimal,

    /// Cost of equity (e.g. 0.10 for 10%)
    #[arg(long, default_value = "0")]
    pub cost_of_equity: Decimal,

    /// Debt source as PRINCIPAL@RATE (repeatable, e.g. --debt 400@0.05)
    #[arg(long = "debt", value_parser = parse_debt_source)]
    pub debt: Vec<DebtSource>,

    /// Marginal corporate tax rate
    #[arg(long, default_value = "0")]
    pub tax_rate: Decimal,
}

/// Arguments for the full calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CalculateArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Reporting currency
    #[arg(long, default_value = "USD")]
    pub home_currency: Currency,

    /// Equity source as AMOUNT@COST[@CURRENCY] (repeatable)
    #[arg(long = "equity", value_parser = parse_source_flag)]
    pub equity: Vec<SourceFlag>,

    /// Debt source as AMOUNT@RATE[@CURRENCY] (repeatable)
    #[arg(long = "debt", value_parser = parse_source_flag)]
    pub debt: Vec<SourceFlag>,

    /// FX rate as CURRENCY=RATE, home units per one foreign unit (repeatable)
    #[arg(long = "fx", value_parser = parse_fx_rate)]
    pub fx: Vec<(Currency, Decimal)>,

    /// Marginal corporate tax rate
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Expected annual FX rate change applied to foreign sources
    #[arg(long)]
    pub fx_growth: Option<Decimal>,

    /// Horizon in years for the FX growth projection
    #[arg(long, default_value = "1")]
    pub fx_years: u32,
}

/// A capital source given on the command line; no currency means home currency
#[derive(Debug, Clone)]
pub struct SourceFlag {
    pub amount: Decimal,
    pub cost: Decimal,
    pub currency: Option<Currency>,
}

/// Arguments for the exported summary
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub calculation: CalculateArgs,
}

pub fn run_compute(args: ComputeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let equity = EquityInput {
        value: args.equity_value,
        cost_of_equity: args.cost_of_equity,
    };
    if equity.value < Decimal::ZERO || args.debt.iter().any(|d| d.principal < Decimal::ZERO) {
        return Err("equity value and debt principals cannot be negative".into());
    }
    if wacc::checked_firm_value(&equity, &args.debt).is_none() {
        return Err("equity value plus debt principals exceeds the representable range".into());
    }

    let assumptions = json!({
        "equity": &equity,
        "debt_sources": &args.debt,
        "tax_rate": args.tax_rate,
    });

    let value = match wacc::compute_wacc(&equity, &args.debt, args.tax_rate) {
        Some(result) => {
            let elapsed = start.elapsed().as_micros() as u64;
            serde_json::to_value(with_metadata(
                "WACC engine",
                &assumptions,
                Vec::new(),
                elapsed,
                result,
            ))?
        }
        None => {
            tracing::debug!("firm value is zero, weights undefined");
            let elapsed = start.elapsed().as_micros() as u64;
            serde_json::to_value(with_metadata(
                "WACC engine",
                &assumptions,
                vec!["Firm value is zero: enter equity and/or debt capital".to_string()],
                elapsed,
                json!({ "wacc": "undefined", "firm_value": Decimal::ZERO }),
            ))?
        }
    };
    Ok(value)
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let wacc_input = resolve_input(args)?;
    let result = wacc::calculate_wacc(&wacc_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let wacc_input = resolve_input(args.calculation)?;
    let result = wacc::calculate_wacc(&wacc_input)?;
    let rows = wacc::summary_rows(&result.result);
    Ok(json!({
        "results": rows,
        "warnings": result.warnings,
    }))
}

fn resolve_input(args: CalculateArgs) -> Result<WaccInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_input(path);
    }
    if args.equity.is_empty() && args.debt.is_empty() {
        if let Some(data) = input::stdin::read_stdin()? {
            return Ok(data);
        }
    }

    let fx_rates = if args.fx.is_empty() {
        None
    } else {
        Some(
            args.fx
                .iter()
                .fold(FxTable::new(), |table, (currency, rate)| table.with_rate(currency, *rate)),
        )
    };

    Ok(WaccInput {
        tax_rate: args
            .tax_rate
            .ok_or("--tax-rate is required (or provide --input)")?,
        equity_sources: with_currency(args.equity, &args.home_currency),
        debt_sources: with_currency(args.debt, &args.home_currency),
        fx_rates,
        fx_growth: args.fx_growth.map(|annual_rate| FxGrowth {
            annual_rate,
            horizon_years: args.fx_years,
        }),
        home_currency: args.home_currency,
    })
}

fn with_currency(sources: Vec<SourceFlag>, home: &Currency) -> Vec<CapitalSource> {
    sources
        .into_iter()
        .map(|flag| CapitalSource {
            currency: flag.currency.unwrap_or_else(|| home.clone()),
            ..CapitalSource::home(flag.amount, flag.cost)
        })
        .collect()
}

fn parse_amount_at_rate(s: &str) -> Result<(Decimal, Decimal), String> {
    let (amount, rate) = s
        .split_once('@')
        .ok_or_else(|| format!("expected AMOUNT@RATE, got '{s}'"))?;
    let amount: Decimal = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount '{amount}': {e}"))?;
    let rate: Decimal = rate
        .trim()
        .parse()
        .map_err(|e| format!("invalid rate '{rate}': {e}"))?;
    Ok((amount, rate))
}

fn parse_debt_source(s: &str) -> Result<DebtSource, String> {
    let (principal, rate) = parse_amount_at_rate(s)?;
    Ok(DebtSource { principal, rate })
}

fn parse_source_flag(s: &str) -> Result<SourceFlag, String> {
    let (value, currency) = match s.matches('@').count() {
        2 => {
            let (value, code) = s.rsplit_once('@').unwrap_or((s, ""));
            (value, Some(code.trim().parse::<Currency>()?))
        }
        _ => (s, None),
    };
    let (amount, cost) = parse_amount_at_rate(value)?;
    Ok(SourceFlag {
        amount,
        cost,
        currency,
    })
}

fn parse_fx_rate(s: &str) -> Result<(Currency, Decimal), String> {
    let (code, rate) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CURRENCY=RATE, got '{s}'"))?;
    let currency: Currency = code.trim().parse()?;
    let rate: Decimal = rate
        .trim()
        .parse()
        .map_err(|e| format!("invalid FX rate '{rate}': {e}"))?;
    Ok((currency, rate))
}
