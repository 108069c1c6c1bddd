use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::WaccError;
use crate::fx::{FxGrowth, FxTable};
use crate::types::{with_metadata, ComputationOutput, Currency, Money, Rate};
use crate::wacc::engine::{checked_firm_value, compute_wacc};
use crate::wacc::sources::{aggregate_sources, CapitalKind, CapitalSource, SourceBreakdown};
use crate::WaccCalcResult;

/// Input parameters for a multi-source, multi-currency WACC calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccInput {
    /// Reporting currency every source is converted into
    #[serde(default)]
    pub home_currency: Currency,
    /// Marginal corporate tax rate
    pub tax_rate: Rate,
    #[serde(default)]
    pub equity_sources: Vec<CapitalSource>,
    #[serde(default)]
    pub debt_sources: Vec<CapitalSource>,
    /// FX rates (home per foreign) for sources without an explicit rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx_rates: Option<FxTable>,
    /// Optional projection applied to every foreign rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx_growth: Option<FxGrowth>,
}

/// Output of the WACC calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccOutput {
    pub home_currency: Currency,
    /// Total equity in home currency (E)
    pub total_equity: Money,
    /// Total debt in home currency (D)
    pub total_debt: Money,
    /// E + D (V)
    pub firm_value: Money,
    pub equity_weight: Rate,
    pub debt_weight: Rate,
    /// Value-weighted cost across equity sources (Re)
    pub cost_of_equity: Rate,
    /// Principal-weighted pre-tax cost across debt sources (Rd)
    pub cost_of_debt: Rate,
    /// Rd * (1 - T)
    pub after_tax_cost_of_debt: Rate,
    pub tax_rate: Rate,
    /// 1 - T
    pub tax_shield: Rate,
    /// Weighted average cost of capital
    pub wacc: Rate,
    pub equity_sources: Vec<SourceBreakdown>,
    pub debt_sources: Vec<SourceBreakdown>,
    pub capital_structure: Vec<CapitalStructureRow>,
    pub formula: FormulaTerms,
}

/// One line of the combined capital structure view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalStructureRow {
    pub capital_type: String,
    pub value: Money,
    pub weight_pct: Decimal,
    /// Pre-tax cost, absent on the total line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_pct: Option<Decimal>,
    pub after_tax_cost_pct: Decimal,
}

/// Which terms of `WACC = E/V × Re + D/V × Rd × (1 - T)` carry a value.
///
/// A front end highlights populated terms when it renders the formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaTerms {
    pub equity: bool,
    pub firm_value: bool,
    pub cost_of_equity: bool,
    pub debt: bool,
    pub cost_of_debt: bool,
    pub tax_rate: bool,
}

impl FormulaTerms {
    /// Symbols of the populated terms, in formula order.
    pub fn active_symbols(&self) -> Vec<&'static str> {
        [
            (self.equity, "E"),
            (self.firm_value, "V"),
            (self.cost_of_equity, "Re"),
            (self.debt, "D"),
            (self.cost_of_debt, "Rd"),
            (self.tax_rate, "T"),
        ]
        .into_iter()
        .filter_map(|(active, symbol)| active.then_some(symbol))
        .collect()
    }
}

/// One metric of the exported summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub metric: String,
    pub value: String,
    pub unit: String,
}

/// Calculate WACC across any number of equity and debt sources.
///
/// Every source is converted into the home currency (optionally at a
/// projected FX rate), each side is blended by value, and the blended
/// figures go through the engine:
///
/// WACC = E/V * Re + D/V * Rd * (1 - T)
///
/// A zero firm value yields `WaccError::UndefinedWeights`.
pub fn calculate_wacc(input: &WaccInput) -> WaccCalcResult<ComputationOutput<WaccOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // --- Validation ---
    validate_wacc_input(input)?;

    let fx_table = input.fx_rates.as_ref();
    let fx_growth = input.fx_growth.as_ref();
    let home = &input.home_currency;

    // --- Aggregate both sides in home currency ---
    let equity = aggregate_sources(
        CapitalKind::Equity,
        &input.equity_sources,
        home,
        fx_table,
        fx_growth,
    )?;
    let debt = aggregate_sources(
        CapitalKind::Debt,
        &input.debt_sources,
        home,
        fx_table,
        fx_growth,
    )?;

    // --- Engine ---
    let equity_input = equity.as_equity();
    let debt_sources = debt.as_debt_sources();
    if checked_firm_value(&equity_input, &debt_sources).is_none() {
        return Err(WaccError::InvalidInput {
            field: "firm_value".into(),
            reason: "Equity plus debt exceeds the representable range".into(),
        });
    }
    let result = compute_wacc(&equity_input, &debt_sources, input.tax_rate)
        .ok_or(WaccError::UndefinedWeights)?;

    let tax_shield = Decimal::ONE - input.tax_rate;
    let cost_of_debt = result.weighted_debt_cost;
    let after_tax_cost_of_debt = cost_of_debt * tax_shield;

    debug!(
        firm_value = %result.firm_value,
        equity_weight = %result.equity_weight,
        debt_weight = %result.debt_weight,
        wacc = %result.wacc,
        "computed wacc"
    );

    // --- Reasonableness warnings ---
    if debt.total_value.is_zero() {
        warnings.push("No debt capital entered: WACC equals the cost of equity".into());
    }
    if equity.total_value.is_zero() {
        warnings.push("No equity capital entered: WACC reflects debt financing only".into());
    }
    if result.wacc > dec!(0.20) {
        warnings.push(format!(
            "WACC of {} exceeds 20%; verify cost inputs",
            result.wacc
        ));
    }
    if let Some(growth) = fx_growth.filter(|g| g.is_active()) {
        let has_foreign = equity
            .sources
            .iter()
            .chain(debt.sources.iter())
            .any(|s| s.fx_rate.is_some());
        if has_foreign {
            warnings.push(format!(
                "FX rates projected {} year(s) at {} per year",
                growth.horizon_years, growth.annual_rate
            ));
        }
    }
    for label in equity.table_priced.iter().chain(debt.table_priced.iter()) {
        warnings.push(format!("{label} converted using the fx_rates table"));
    }

    let capital_structure = capital_structure_rows(
        equity.total_value,
        result.total_debt,
        result.firm_value,
        result.equity_weight,
        result.debt_weight,
        equity.blended_cost,
        cost_of_debt,
        after_tax_cost_of_debt,
        result.wacc,
    );

    let formula = formula_terms(
        equity.total_value,
        result.total_debt,
        result.firm_value,
        equity.blended_cost,
        cost_of_debt,
        input.tax_rate,
    );

    let output = WaccOutput {
        home_currency: home.clone(),
        total_equity: equity.total_value,
        total_debt: result.total_debt,
        firm_value: result.firm_value,
        equity_weight: result.equity_weight,
        debt_weight: result.debt_weight,
        cost_of_equity: equity.blended_cost,
        cost_of_debt,
        after_tax_cost_of_debt,
        tax_rate: input.tax_rate,
        tax_shield,
        wacc: result.wacc,
        equity_sources: equity.sources,
        debt_sources: debt.sources,
        capital_structure,
        formula,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "WACC from value-weighted capital sources",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Flag each formula term that carries a non-zero value.
pub fn formula_terms(
    equity: Money,
    debt: Money,
    firm_value: Money,
    cost_of_equity: Rate,
    cost_of_debt: Rate,
    tax_rate: Rate,
) -> FormulaTerms {
    FormulaTerms {
        equity: equity > Decimal::ZERO,
        firm_value: firm_value > Decimal::ZERO,
        cost_of_equity: cost_of_equity > Decimal::ZERO,
        debt: debt > Decimal::ZERO,
        cost_of_debt: cost_of_debt > Decimal::ZERO,
        tax_rate: tax_rate > Decimal::ZERO,
    }
}

/// Metric/value/unit rows for exporting a calculation.
pub fn summary_rows(output: &WaccOutput) -> Vec<SummaryRow> {
    let home = output.home_currency.to_string();
    let money = |metric: &str, value: Money| SummaryRow {
        metric: metric.into(),
        value: format!("{value:.2}"),
        unit: home.clone(),
    };
    let pct = |metric: &str, value: Rate| SummaryRow {
        metric: metric.into(),
        value: format!("{:.4}%", value * dec!(100)),
        unit: "Percentage".into(),
    };

    vec![
        money("Total Equity (E)", output.total_equity),
        money("Total Debt (D)", output.total_debt),
        money("Total Firm Value (V)", output.firm_value),
        pct("Cost of Equity (Re)", output.cost_of_equity),
        pct("Cost of Debt (Rd)", output.cost_of_debt),
        pct("Tax Rate (T)", output.tax_rate),
        pct("After-Tax Cost of Debt", output.after_tax_cost_of_debt),
        pct("Equity Weight (E/V)", output.equity_weight),
        pct("Debt Weight (D/V)", output.debt_weight),
        pct("WACC", output.wacc),
    ]
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_wacc_input(input: &WaccInput) -> WaccCalcResult<()> {
    if input.tax_rate < Decimal::ZERO || input.tax_rate > Decimal::ONE {
        return Err(WaccError::InvalidInput {
            field: "tax_rate".into(),
            reason: "Tax rate must be between 0 and 1".into(),
        });
    }
    if let Some(table) = &input.fx_rates {
        table.validate()?;
    }
    if let Some(growth) = &input.fx_growth {
        growth.validate()?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn capital_structure_rows(
    equity: Money,
    debt: Money,
    firm_value: Money,
    equity_weight: Rate,
    debt_weight: Rate,
    cost_of_equity: Rate,
    cost_of_debt: Rate,
    after_tax_cost_of_debt: Rate,
    wacc: Rate,
) -> Vec<CapitalStructureRow> {
    let hundred = dec!(100);
    vec![
        CapitalStructureRow {
            capital_type: "Equity".into(),
            value: equity,
            weight_pct: equity_weight * hundred,
            cost_pct: Some(cost_of_equity * hundred),
            after_tax_cost_pct: cost_of_equity * hundred,
        },
        CapitalStructureRow {
            capital_type: "Debt".into(),
            value: debt,
            weight_pct: debt_weight * hundred,
            cost_pct: Some(cost_of_debt * hundred),
            after_tax_cost_pct: after_tax_cost_of_debt * hundred,
        },
        CapitalStructureRow {
            capital_type: "Total".into(),
            value: firm_value,
            weight_pct: hundred,
            cost_pct: None,
            after_tax_cost_pct: wacc * hundred,
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
