use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::ImmoError;
use crate::property::{LoanTerms, PropertyFinancials};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::ImmoResult;

use super::cashflow::compute_cashflow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCell {
    pub monthly_cashflow: Money,
    pub annual_cashflow: Money,
    pub self_sustaining: bool,
}

/// Monthly cashflow over a grid of interest rates (rows) × equity levels (columns).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityMatrix {
    pub rate_candidates: Vec<Percent>,
    pub equity_candidates: Vec<Money>,
    pub amortization_rate_pct: Percent,
    /// `cells[rate_index][equity_index]`
    pub cells: Vec<Vec<SensitivityCell>>,
    /// (rate_index, equity_index) of the live values, when both are on the grid
    pub current_position: Option<(usize, usize)>,
}

impl SensitivityMatrix {
    pub fn cell(&self, rate_index: usize, equity_index: usize) -> Option<&SensitivityCell> {
        self.cells.get(rate_index)?.get(equity_index)
    }

    /// Number of self-sustaining cells in the grid.
    pub fn self_sustaining_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| c.self_sustaining)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub financials: PropertyFinancials,
    pub loan: LoanTerms,
}

/// Evaluate the cashflow for every (rate, equity) pair.
///
/// Each cell is an independent `compute_cashflow` call, so the live cell is
/// identical to the single-point result.
pub fn build_matrix(
    financials: &PropertyFinancials,
    amortization_rate_pct: Percent,
    rate_candidates: &[Percent],
    equity_candidates: &[Money],
    current: Option<(Percent, Money)>,
    config: &EngineConfig,
) -> ImmoResult<SensitivityMatrix> {
    financials.validate()?;
    if rate_candidates.is_empty() || equity_candidates.is_empty() {
        return Err(ImmoError::InsufficientData(
            "Sensitivity matrix needs at least one rate and one equity candidate".into(),
        ));
    }

    let cells = rate_candidates
        .iter()
        .map(|&rate| {
            equity_candidates
                .iter()
                .map(|&equity| {
                    let loan = LoanTerms::new(equity, rate, amortization_rate_pct);
                    let cf = compute_cashflow(financials, &loan, config)?;
                    Ok(SensitivityCell {
                        monthly_cashflow: cf.monthly_cashflow,
                        annual_cashflow: cf.annual_cashflow,
                        self_sustaining: cf.self_sustaining,
                    })
                })
                .collect::<ImmoResult<Vec<_>>>()
        })
        .collect::<ImmoResult<Vec<_>>>()?;

    let current_position = current.and_then(|(rate, equity)| {
        let r = rate_candidates.iter().position(|c| *c == rate)?;
        let e = equity_candidates.iter().position(|c| *c == equity)?;
        Some((r, e))
    });

    Ok(SensitivityMatrix {
        rate_candidates: rate_candidates.to_vec(),
        equity_candidates: equity_candidates.to_vec(),
        amortization_rate_pct,
        cells,
        current_position,
    })
}

/// Rates around the live rate, floored at the configured minimum, ascending.
/// Offsets that land on the same rate after flooring yield a single row.
pub fn default_rate_candidates(rate: Percent, config: &EngineConfig) -> Vec<Percent> {
    let mut rates: Vec<Percent> = Vec::with_capacity(config.sensitivity_rate_offsets.len());
    for offset in &config.sensitivity_rate_offsets {
        let shifted = rate + *offset;
        let candidate = if offset.is_sign_negative() && !offset.is_zero() {
            shifted.max(config.sensitivity_min_rate_pct)
        } else {
            shifted
        };
        if !rates.contains(&candidate) {
            rates.push(candidate);
        }
    }
    rates.sort();
    rates
}

/// Equity levels as shares of the purchase price.
pub fn default_equity_candidates(price: Money, config: &EngineConfig) -> Vec<Money> {
    config
        .sensitivity_equity_pcts
        .iter()
        .map(|pct| price * *pct / dec!(100))
        .collect()
}

/// Default grid around the live loan terms. The live equity is added as a
/// column when it is not one of the default shares, so the current cell is
/// always on the grid.
pub fn live_matrix(
    financials: &PropertyFinancials,
    loan: &LoanTerms,
    config: &EngineConfig,
) -> ImmoResult<SensitivityMatrix> {
    let rates = default_rate_candidates(loan.interest_rate_pct, config);
    let mut equities = default_equity_candidates(financials.purchase_price, config);
    if !equities.contains(&loan.equity) {
        equities.push(loan.equity);
        equities.sort();
    }

    build_matrix(
        financials,
        loan.amortization_rate_pct,
        &rates,
        &equities,
        Some((loan.interest_rate_pct, loan.equity)),
        config,
    )
}

/// Default grid around the live loan terms, wrapped with metadata.
pub fn sensitivity_analysis(
    input: &SensitivityInput,
    config: &EngineConfig,
) -> ImmoResult<ComputationOutput<SensitivityMatrix>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    input.loan.validate(&input.financials)?;

    let matrix = live_matrix(&input.financials, &input.loan, config)?;

    if matrix.self_sustaining_count() == 0 {
        warnings.push("No combination in the grid reaches a non-negative cashflow".into());
    }
    log::debug!(
        "sensitivity: {}x{} grid, current={:?}",
        matrix.rate_candidates.len(),
        matrix.equity_candidates.len(),
        matrix.current_position
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Sensitivity Matrix (interest rate x equity)",
        input,
        warnings,
        elapsed,
        matrix,
    ))
}
