//! Performance summary of a portfolio, always recomputed from current data

use super::ratios::{self, Payback};
use crate::loan::LoanBook;
use crate::money::round_pct;
use crate::projection::{PortfolioSnapshot, ProjectionResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub gross_yield_pct: f64,
    pub net_yield_pct: f64,
    pub payback_years: Payback,
    pub cash_on_cash_pct: f64,
    pub loan_to_value_pct: f64,
    pub debt_service_ratio_pct: f64,
    pub irr_pct: Option<f64>,
}

impl PerformanceSummary {
    /// Ratios from a snapshot and the debt outstanding today.
    ///
    /// Cashflow is revenue less recurring charges and debt service; the
    /// acquisition cost is the initial outlay.
    pub fn compute(snapshot: &PortfolioSnapshot, outstanding_debt: f64, irr_pct: Option<f64>) -> Self {
        let annual_revenue = snapshot.annual_revenue();
        let annual_cashflow = snapshot.annual_cashflow();

        Self {
            gross_yield_pct: ratios::gross_yield_pct(annual_revenue, snapshot.property_value),
            net_yield_pct: ratios::net_yield_pct(annual_cashflow, snapshot.property_value),
            payback_years: ratios::payback_years(snapshot.acquisition_cost, annual_cashflow),
            cash_on_cash_pct: ratios::cash_on_cash_pct(annual_cashflow, snapshot.acquisition_cost),
            loan_to_value_pct: ratios::loan_to_value_pct(outstanding_debt, snapshot.property_value),
            debt_service_ratio_pct: ratios::debt_service_ratio_pct(
                snapshot.annual_debt_service(),
                annual_revenue,
            ),
            irr_pct,
        }
    }

    /// Ratios for a portfolio whose debt comes from its loan book, with the
    /// IRR taken from a projection run when one is supplied.
    ///
    /// As in the projection engine, a non-empty book replaces the snapshot's
    /// monthly debt service with the instalments of the loans running at `as_of`.
    pub fn from_portfolio(
        snapshot: &PortfolioSnapshot,
        loans: &LoanBook,
        as_of: NaiveDate,
        projection: Option<&ProjectionResult>,
    ) -> Self {
        let outstanding = loans.total_outstanding(as_of);
        let irr_pct = projection.and_then(|p| p.summary.irr_pct);

        if loans.is_empty() {
            return Self::compute(snapshot, outstanding, irr_pct);
        }
        let snapshot = PortfolioSnapshot {
            monthly_debt_service: loans.monthly_debt_service(as_of),
            ..snapshot.clone()
        };
        Self::compute(&snapshot, outstanding, irr_pct)
    }

    pub fn rounded(&self) -> Self {
        Self {
            gross_yield_pct: round_pct(self.gross_yield_pct),
            net_yield_pct: round_pct(self.net_yield_pct),
            payback_years: match self.payback_years {
                Payback::Years(years) => Payback::Years(round_pct(years)),
                Payback::Never => Payback::Never,
            },
            cash_on_cash_pct: round_pct(self.cash_on_cash_pct),
            loan_to_value_pct: round_pct(self.loan_to_value_pct),
            debt_service_ratio_pct: round_pct(self.debt_service_ratio_pct),
            irr_pct: self.irr_pct.map(round_pct),
        }
    }
}
