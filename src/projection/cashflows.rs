//! Projection output structures

use crate::money::{round_cents, round_pct};
use serde::{Deserialize, Serialize};

/// Projected figures for one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearProjection {
    /// 1-indexed projection year
    pub year: u32,

    /// Gross potential rent, before vacancy
    pub revenue: f64,
    pub charges: f64,
    pub debt_service: f64,

    /// Rent after vacancy, less charges and debt service, plus any net sale proceeds
    pub cashflow: f64,

    pub property_value: f64,
    pub outstanding_debt: f64,
    pub net_worth: f64,

    /// Net proceeds of the resale, only in the resale year
    #[serde(default)]
    pub net_sale_proceeds: f64,
}

impl YearProjection {
    /// Year after the portfolio was sold: nothing left but the cash from the sale
    pub fn liquidated(year: u32, cash: f64) -> Self {
        Self {
            year,
            revenue: 0.0,
            charges: 0.0,
            debt_service: 0.0,
            cashflow: 0.0,
            property_value: 0.0,
            outstanding_debt: 0.0,
            net_worth: cash,
            net_sale_proceeds: 0.0,
        }
    }

    fn is_finite(&self) -> bool {
        [
            self.revenue,
            self.charges,
            self.debt_service,
            self.cashflow,
            self.property_value,
            self.outstanding_debt,
            self.net_worth,
            self.net_sale_proceeds,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Copy with money rounded to cents for presentation
    pub fn rounded(&self) -> Self {
        Self {
            year: self.year,
            revenue: round_cents(self.revenue),
            charges: round_cents(self.charges),
            debt_service: round_cents(self.debt_service),
            cashflow: round_cents(self.cashflow),
            property_value: round_cents(self.property_value),
            outstanding_debt: round_cents(self.outstanding_debt),
            net_worth: round_cents(self.net_worth),
            net_sale_proceeds: round_cents(self.net_sale_proceeds),
        }
    }
}

/// Totals and return metrics over a projection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub total_cashflow: f64,
    /// NPV of the equity series at the discount rate
    pub npv_at_discount_rate: f64,
    /// Cashflow after a flat tax on profitable years
    pub after_tax_cashflow: f64,
    /// Final-year net worth in today's money
    pub real_terminal_net_worth: f64,
    /// None when the equity series has no unique IRR
    pub irr_pct: Option<f64>,
}

impl ProjectionSummary {
    pub fn rounded(&self) -> Self {
        Self {
            total_cashflow: round_cents(self.total_cashflow),
            npv_at_discount_rate: round_cents(self.npv_at_discount_rate),
            after_tax_cashflow: round_cents(self.after_tax_cashflow),
            real_terminal_net_worth: round_cents(self.real_terminal_net_worth),
            irr_pct: self.irr_pct.map(round_pct),
        }
    }
}

/// Complete projection result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub years: Vec<YearProjection>,
    pub summary: ProjectionSummary,
}

impl ProjectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_year(&mut self, year: YearProjection) {
        self.years.push(year);
    }

    pub fn last(&self) -> Option<&YearProjection> {
        self.years.last()
    }

    pub(crate) fn all_finite(years: &[YearProjection]) -> bool {
        years.iter().all(YearProjection::is_finite)
    }

    pub fn rounded(&self) -> Self {
        Self {
            years: self.years.iter().map(YearProjection::rounded).collect(),
            summary: self.summary.rounded(),
        }
    }
}
