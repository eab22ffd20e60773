//! Engine inputs: current portfolio aggregates and economic hypotheses

use serde::{Deserialize, Serialize};

/// Portfolio aggregates as of the projection start, summed by the caller
/// from current properties, leases, loans and charges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub monthly_revenue: f64,
    pub monthly_recurring_charges: f64,
    pub monthly_debt_service: f64,
    pub property_value: f64,
    pub acquisition_cost: f64,
}

impl PortfolioSnapshot {
    pub fn annual_revenue(&self) -> f64 {
        self.monthly_revenue * 12.0
    }

    pub fn annual_charges(&self) -> f64 {
        self.monthly_recurring_charges * 12.0
    }

    pub fn annual_debt_service(&self) -> f64 {
        self.monthly_debt_service * 12.0
    }

    /// Revenue less recurring charges and debt service, annualized
    pub fn annual_cashflow(&self) -> f64 {
        (self.monthly_revenue - self.monthly_recurring_charges - self.monthly_debt_service) * 12.0
    }
}

/// Economic hypotheses for a projection.
///
/// Every rate is a plain percentage (2.0 means 2%). `discount_rate_pct` and
/// `tax_rate_pct` fall back to the engine defaults when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionHypotheses {
    pub inflation_pct: f64,
    pub vacancy_pct: f64,
    pub rent_growth_pct: f64,
    pub charge_growth_pct: f64,
    #[serde(default)]
    pub discount_rate_pct: Option<f64>,
    #[serde(default)]
    pub tax_rate_pct: Option<f64>,
    pub annual_maintenance_reserve: f64,
    #[serde(default)]
    pub include_resale: bool,
    #[serde(default)]
    pub resale_year: i32,
    pub property_appreciation_pct: f64,
    pub sale_costs_pct: f64,
}
