//! Investment performance ratios
//!
//! Each ratio is total: a zero denominator yields 0 (or `Payback::Never`),
//! never NaN and never an error.

use serde::{Deserialize, Serialize};

/// Time for cumulative cashflow to repay the initial outlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Payback {
    Years(f64),
    /// Non-positive cashflow: the outlay is never recovered
    Never,
}

impl Payback {
    /// Years as a float, infinite for `Never`
    pub fn as_years(&self) -> f64 {
        match self {
            Payback::Years(years) => *years,
            Payback::Never => f64::INFINITY,
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Payback::Never)
    }
}

impl From<Option<f64>> for Payback {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(years) if years.is_finite() => Payback::Years(years),
            _ => Payback::Never,
        }
    }
}

impl From<Payback> for Option<f64> {
    fn from(value: Payback) -> Self {
        match value {
            Payback::Years(years) => Some(years),
            Payback::Never => None,
        }
    }
}

fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let pct = numerator / denominator * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}

/// Annual revenue over property value
pub fn gross_yield_pct(annual_revenue: f64, property_value: f64) -> f64 {
    ratio_pct(annual_revenue, property_value)
}

/// Annual cashflow over property value
pub fn net_yield_pct(annual_cashflow: f64, property_value: f64) -> f64 {
    ratio_pct(annual_cashflow, property_value)
}

pub fn payback_years(initial_outlay: f64, annual_cashflow: f64) -> Payback {
    if annual_cashflow > 0.0 {
        Payback::from(Some(initial_outlay / annual_cashflow))
    } else {
        Payback::Never
    }
}

/// Annual cashflow over the cash invested
pub fn cash_on_cash_pct(annual_cashflow: f64, initial_outlay: f64) -> f64 {
    ratio_pct(annual_cashflow, initial_outlay)
}

pub fn loan_to_value_pct(outstanding_debt: f64, property_value: f64) -> f64 {
    ratio_pct(outstanding_debt, property_value)
}

/// Share of revenue absorbed by loan instalments
pub fn debt_service_ratio_pct(annual_debt_service: f64, annual_revenue: f64) -> f64 {
    ratio_pct(annual_debt_service, annual_revenue)
}
