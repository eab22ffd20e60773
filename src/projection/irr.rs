//! Internal Rate of Return (IRR) calculation
//!
//! Used for investment performance of a projected holding period.

use crate::config::EngineDefaults;
use crate::error::{EngineError, EngineResult};

/// Bisection search settings
#[derive(Debug, Clone, Copy)]
pub struct IrrSolver {
    /// Lower bound of the annual rate interval (fraction)
    pub lower: f64,
    /// Upper bound of the annual rate interval (fraction)
    pub upper: f64,
    pub max_iterations: u32,
    /// Stop once |NPV| is below this amount
    pub npv_tolerance: f64,
}

impl Default for IrrSolver {
    fn default() -> Self {
        Self::from_defaults(&EngineDefaults::default())
    }
}

impl IrrSolver {
    pub fn from_defaults(defaults: &EngineDefaults) -> Self {
        Self {
            lower: defaults.irr_lower_bound,
            upper: defaults.irr_upper_bound,
            max_iterations: defaults.irr_max_iterations,
            npv_tolerance: defaults.irr_npv_tolerance,
        }
    }

    /// IRR of a level investment profile, as a percentage.
    ///
    /// `-initial_outlay`, then `annual_cashflow` for each of `years` years, plus
    /// `terminal_value` in the final year. Assumes NPV decreases with the rate,
    /// which holds for this profile with non-negative inflows. Returns 0 when
    /// `years <= 0`.
    pub fn solve(
        &self,
        initial_outlay: f64,
        annual_cashflow: f64,
        terminal_value: f64,
        years: i32,
    ) -> f64 {
        if years <= 0 {
            return 0.0;
        }

        let npv =
            |rate: f64| level_npv(rate, initial_outlay, annual_cashflow, terminal_value, years);
        self.bisect(npv) * 100.0
    }

    /// IRR of an arbitrary yearly series (index 0 = today), as a percentage.
    ///
    /// Rejects series whose IRR is not unique or does not exist: no sign
    /// change, more than one sign change, or no root inside the search interval.
    pub fn solve_series(&self, cashflows: &[f64]) -> EngineResult<f64> {
        if cashflows.len() < 2 {
            return Err(EngineError::numeric("IRR requires at least 2 cash flows"));
        }
        if cashflows.iter().any(|cf| !cf.is_finite()) {
            return Err(EngineError::numeric("IRR cash flows must be finite"));
        }

        match sign_changes(cashflows) {
            0 => return Err(EngineError::numeric("IRR undefined: cash flows never change sign")),
            1 => {}
            n => {
                return Err(EngineError::numeric(format!(
                    "IRR not unique: cash flows change sign {} times",
                    n
                )))
            }
        }

        let npv = |rate: f64| series_npv(rate, cashflows);
        let (npv_low, npv_high) = (npv(self.lower), npv(self.upper));
        if npv_low * npv_high > 0.0 {
            return Err(EngineError::numeric(format!(
                "IRR outside [{:.0}%, {:.0}%]",
                self.lower * 100.0,
                self.upper * 100.0
            )));
        }

        // a single sign change starting negative gives a decreasing NPV;
        // flip the series when it starts positive so the same bisection applies
        let rate = if npv_low >= npv_high {
            self.bisect(npv)
        } else {
            self.bisect(|rate| -npv(rate))
        };
        Ok(rate * 100.0)
    }

    /// Bisection assuming `npv` decreases over the interval
    fn bisect<F: Fn(f64) -> f64>(&self, npv: F) -> f64 {
        let mut low = self.lower;
        let mut high = self.upper;
        let mut mid = (low + high) / 2.0;

        for _ in 0..self.max_iterations {
            mid = (low + high) / 2.0;
            let value = npv(mid);

            if value.abs() < self.npv_tolerance {
                break;
            }

            // positive NPV: the root sits at a higher rate
            if value > 0.0 {
                low = mid;
            } else {
                high = mid;
            }
        }

        mid
    }
}

/// IRR of a level profile with the default solver settings (percentage)
pub fn solve(
    initial_outlay: f64,
    annual_cashflow: f64,
    terminal_value: f64,
    years: i32,
) -> f64 {
    IrrSolver::default().solve(initial_outlay, annual_cashflow, terminal_value, years)
}

/// NPV of a yearly series (index 0 undiscounted) at `rate_pct` percent
pub fn npv(rate_pct: f64, cashflows: &[f64]) -> EngineResult<f64> {
    let rate = rate_pct / 100.0;
    if !rate.is_finite() || rate <= -1.0 {
        return Err(EngineError::numeric(format!(
            "discount rate of {}% leaves no finite discount factor",
            rate_pct
        )));
    }

    let value = series_npv(rate, cashflows);
    if !value.is_finite() {
        return Err(EngineError::numeric(format!("NPV at {}%", rate_pct)));
    }
    Ok(value)
}

/// NPV of the level profile, using the annuity factor so the cost does not
/// grow with `years`
fn level_npv(
    rate: f64,
    initial_outlay: f64,
    annual_cashflow: f64,
    terminal_value: f64,
    years: i32,
) -> f64 {
    let discount = (1.0 + rate).powi(-years);
    let annuity_factor = if rate == 0.0 {
        years as f64
    } else {
        (1.0 - discount) / rate
    };
    -initial_outlay + annual_cashflow * annuity_factor + terminal_value * discount
}

fn series_npv(rate: f64, cashflows: &[f64]) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// Sign changes in a series, ignoring zero entries
fn sign_changes(cashflows: &[f64]) -> usize {
    let mut changes = 0;
    let mut previous: Option<bool> = None;
    for &cf in cashflows.iter().filter(|cf| **cf != 0.0) {
        let positive = cf > 0.0;
        if let Some(prev) = previous {
            if prev != positive {
                changes += 1;
            }
        }
        previous = Some(positive);
    }
    changes
}
