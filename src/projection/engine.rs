//! Multi-year cash-flow projection of a property portfolio

use super::cashflows::{ProjectionResult, ProjectionSummary, YearProjection};
use super::hypotheses::{PortfolioSnapshot, ProjectionHypotheses};
use super::irr::{self, IrrSolver};
use crate::config::EngineDefaults;
use crate::error::{EngineError, EngineResult};
use crate::loan::{outstanding, LoanTerms};
use chrono::NaiveDate;
use log::{debug, warn};

/// Hypotheses normalized to annual fractions
#[derive(Debug, Clone, Copy)]
struct Rates {
    vacancy: f64,
    rent_growth: f64,
    charge_growth: f64,
    appreciation: f64,
    sale_costs: f64,
    discount_pct: f64,
    tax: f64,
    inflation: f64,
}

/// Per-loan figures fixed at the projection start
#[derive(Debug, Clone)]
struct LoanAtStart<'a> {
    terms: &'a LoanTerms,
    months_elapsed: u32,
    months_remaining: u32,
    annual_payment: f64,
}

/// Main projection engine
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    defaults: EngineDefaults,
    irr: IrrSolver,
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new(EngineDefaults::default())
    }
}

impl ProjectionEngine {
    /// Create a new projection engine with the given defaults
    pub fn new(defaults: EngineDefaults) -> Self {
        let irr = IrrSolver::from_defaults(&defaults);
        Self { defaults, irr }
    }

    /// Project the portfolio year by year from `start`.
    ///
    /// Loans are summed in slice order; pass them in a stable order (see
    /// `LoanBook::terms`). When no loans are given, the snapshot's monthly
    /// debt service is carried unchanged every year and no debt is tracked.
    /// Always returns exactly `duration_years` entries or an error.
    pub fn project(
        &self,
        snapshot: &PortfolioSnapshot,
        hypotheses: &ProjectionHypotheses,
        duration_years: i32,
        loans: &[LoanTerms],
        start: NaiveDate,
    ) -> EngineResult<Vec<YearProjection>> {
        let rates = self.validate(snapshot, hypotheses, duration_years, loans)?;
        let duration = duration_years as u32;

        debug!(
            "projecting {} years from {} with {} loans (vacancy {:.2}, rent growth {:.4})",
            duration,
            start,
            loans.len(),
            rates.vacancy,
            rates.rent_growth
        );

        let loans_at_start: Vec<LoanAtStart> = loans
            .iter()
            .map(|terms| {
                let months_elapsed = terms.months_elapsed(start);
                LoanAtStart {
                    terms,
                    months_elapsed,
                    months_remaining: terms.term_months - months_elapsed,
                    annual_payment: terms.total_monthly_payment() * 12.0,
                }
            })
            .collect();

        let resale_year = if hypotheses.include_resale {
            Some(hypotheses.resale_year as u32)
        } else {
            None
        };

        let mut years = Vec::with_capacity(duration as usize);
        let mut cash_after_sale: Option<f64> = None;

        for year in 1..=duration {
            if let Some(cash) = cash_after_sale {
                years.push(YearProjection::liquidated(year, cash));
                continue;
            }

            let mut projected = self.project_year(snapshot, hypotheses, &rates, &loans_at_start, year);

            if resale_year == Some(year) {
                let proceeds = projected.property_value * (1.0 - rates.sale_costs)
                    - projected.outstanding_debt;
                projected.net_sale_proceeds = proceeds;
                projected.cashflow += proceeds;
                cash_after_sale = Some(proceeds);
                debug!("resale in year {}: net proceeds {:.2}", year, proceeds);
            }

            years.push(projected);
        }

        if !ProjectionResult::all_finite(&years) {
            return Err(EngineError::numeric("projection produced a non-finite amount"));
        }

        Ok(years)
    }

    /// Run a projection and compute its summary metrics
    pub fn project_with_summary(
        &self,
        snapshot: &PortfolioSnapshot,
        hypotheses: &ProjectionHypotheses,
        duration_years: i32,
        loans: &[LoanTerms],
        start: NaiveDate,
    ) -> EngineResult<ProjectionResult> {
        let years = self.project(snapshot, hypotheses, duration_years, loans, start)?;
        let rates = self.normalize(hypotheses);

        let mut result = ProjectionResult::new();
        for year in years {
            result.add_year(year);
        }

        let total_cashflow: f64 = result.years.iter().map(|y| y.cashflow).sum();
        let after_tax_cashflow: f64 = result
            .years
            .iter()
            .map(|y| y.cashflow - y.cashflow.max(0.0) * rates.tax)
            .sum();

        let terminal = result.last().map(|y| y.net_worth).unwrap_or(0.0);
        let real_terminal_net_worth = if result.years.is_empty() {
            0.0
        } else {
            terminal / (1.0 + rates.inflation).powi(result.years.len() as i32)
        };
        if !real_terminal_net_worth.is_finite() {
            return Err(EngineError::numeric(format!(
                "deflating net worth at {}% inflation",
                hypotheses.inflation_pct
            )));
        }

        let series = equity_series(snapshot, &result.years, hypotheses.include_resale);
        let npv_at_discount_rate = irr::npv(rates.discount_pct, &series)?;

        let irr_pct = match self.irr.solve_series(&series) {
            Ok(rate) => Some(rate),
            Err(e) => {
                warn!("IRR not reported: {}", e);
                None
            }
        };

        result.summary = ProjectionSummary {
            total_cashflow,
            npv_at_discount_rate,
            after_tax_cashflow,
            real_terminal_net_worth,
            irr_pct,
        };

        Ok(result)
    }

    /// Figures for one year before any resale adjustment
    fn project_year(
        &self,
        snapshot: &PortfolioSnapshot,
        hypotheses: &ProjectionHypotheses,
        rates: &Rates,
        loans: &[LoanAtStart],
        year: u32,
    ) -> YearProjection {
        let elapsed_years = (year - 1) as i32;

        let revenue = snapshot.annual_revenue() * (1.0 + rates.rent_growth).powi(elapsed_years);

        let charges = snapshot.annual_charges() * (1.0 + rates.charge_growth).powi(elapsed_years)
            + hypotheses.annual_maintenance_reserve;

        let debt_service = if loans.is_empty() {
            snapshot.annual_debt_service()
        } else {
            loans
                .iter()
                .filter(|loan| year * 12 <= loan.months_remaining)
                .map(|loan| loan.annual_payment)
                .sum()
        };

        let cashflow = revenue * (1.0 - rates.vacancy) - charges - debt_service;

        // recomputed from the closed form each year, never accumulated
        let outstanding_debt: f64 = loans
            .iter()
            .map(|loan| {
                let elapsed = loan.months_elapsed.saturating_add(year * 12);
                outstanding::estimate_after_months(loan.terms, elapsed)
            })
            .sum();

        let property_value = snapshot.property_value * (1.0 + rates.appreciation).powi(year as i32);

        YearProjection {
            year,
            revenue,
            charges,
            debt_service,
            cashflow,
            property_value,
            outstanding_debt,
            net_worth: property_value - outstanding_debt,
            net_sale_proceeds: 0.0,
        }
    }

    fn normalize(&self, hypotheses: &ProjectionHypotheses) -> Rates {
        Rates {
            vacancy: hypotheses.vacancy_pct / 100.0,
            rent_growth: hypotheses.rent_growth_pct / 100.0,
            charge_growth: hypotheses.charge_growth_pct / 100.0,
            appreciation: hypotheses.property_appreciation_pct / 100.0,
            sale_costs: hypotheses.sale_costs_pct / 100.0,
            discount_pct: hypotheses
                .discount_rate_pct
                .unwrap_or(self.defaults.default_discount_rate_pct),
            tax: hypotheses
                .tax_rate_pct
                .unwrap_or(self.defaults.default_tax_rate_pct)
                / 100.0,
            inflation: hypotheses.inflation_pct / 100.0,
        }
    }

    /// Reject malformed inputs before any computation
    fn validate(
        &self,
        snapshot: &PortfolioSnapshot,
        hypotheses: &ProjectionHypotheses,
        duration_years: i32,
        loans: &[LoanTerms],
    ) -> EngineResult<Rates> {
        if duration_years < 0 {
            return Err(EngineError::projection_input(format!(
                "duration must not be negative, got {} years",
                duration_years
            )));
        }
        if duration_years as u32 > self.defaults.max_projection_years {
            return Err(EngineError::projection_input(format!(
                "duration of {} years exceeds the {}-year limit",
                duration_years, self.defaults.max_projection_years
            )));
        }

        if hypotheses.include_resale
            && (hypotheses.resale_year < 1 || hypotheses.resale_year > duration_years)
        {
            return Err(EngineError::projection_input(format!(
                "resale year {} outside 1..={}",
                hypotheses.resale_year, duration_years
            )));
        }

        for (name, value) in [
            ("monthlyRevenue", snapshot.monthly_revenue),
            ("monthlyRecurringCharges", snapshot.monthly_recurring_charges),
            ("monthlyDebtService", snapshot.monthly_debt_service),
            ("propertyValue", snapshot.property_value),
            ("acquisitionCost", snapshot.acquisition_cost),
            ("annualMaintenanceReserve", hypotheses.annual_maintenance_reserve),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::projection_input(format!(
                    "{} must be a non-negative amount, got {}",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("vacancyPct", hypotheses.vacancy_pct),
            ("saleCostsPct", hypotheses.sale_costs_pct),
            ("taxRatePct", hypotheses.tax_rate_pct.unwrap_or(self.defaults.default_tax_rate_pct)),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(EngineError::projection_input(format!(
                    "{} must be between 0 and 100, got {}",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("rentGrowthPct", hypotheses.rent_growth_pct),
            ("chargeGrowthPct", hypotheses.charge_growth_pct),
            ("propertyAppreciationPct", hypotheses.property_appreciation_pct),
            ("inflationPct", hypotheses.inflation_pct),
            (
                "discountRatePct",
                hypotheses
                    .discount_rate_pct
                    .unwrap_or(self.defaults.default_discount_rate_pct),
            ),
        ] {
            if !value.is_finite() || value < -100.0 {
                return Err(EngineError::projection_input(format!(
                    "{} must be at least -100, got {}",
                    name, value
                )));
            }
        }

        for terms in loans {
            terms.validate()?;
        }

        Ok(self.normalize(hypotheses))
    }
}

/// Equity view of a projection: acquisition cost out at year 0, yearly
/// cashflows after, and the final net worth when the portfolio is kept
fn equity_series(snapshot: &PortfolioSnapshot, years: &[YearProjection], sold: bool) -> Vec<f64> {
    let mut series = Vec::with_capacity(years.len() + 1);
    series.push(-snapshot.acquisition_cost);
    series.extend(years.iter().map(|y| y.cashflow));
    if !sold {
        if let (Some(last), Some(terminal)) = (series.last_mut(), years.last()) {
            *last += terminal.net_worth;
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot() -> PortfolioSnapshot {
        PortfolioSnapshot {
            monthly_revenue: 3_000.0,
            monthly_recurring_charges: 500.0,
            monthly_debt_service: 1_159.92,
            property_value: 320_000.0,
            acquisition_cost: 300_000.0,
        }
    }

    fn hypotheses() -> ProjectionHypotheses {
        ProjectionHypotheses {
            inflation_pct: 2.0,
            vacancy_pct: 5.0,
            rent_growth_pct: 1.5,
            charge_growth_pct: 2.0,
            discount_rate_pct: Some(4.0),
            tax_rate_pct: Some(30.0),
            annual_maintenance_reserve: 1_200.0,
            include_resale: false,
            resale_year: 0,
            property_appreciation_pct: 1.0,
            sale_costs_pct: 7.0,
        }
    }

    fn loan() -> LoanTerms {
        LoanTerms::new(200_000.0, 3.5, 240, date(2024, 1, 1)).unwrap()
    }

    #[test]
    fn test_length_and_order() {
        let engine = ProjectionEngine::default();
        for duration in [0, 1, 7, 25, 40] {
            let years = engine
                .project(&snapshot(), &hypotheses(), duration, &[loan()], date(2024, 1, 1))
                .unwrap();
            assert_eq!(years.len(), duration as usize);
            for (i, y) in years.iter().enumerate() {
                assert_eq!(y.year, i as u32 + 1);
            }
        }
    }

    #[test]
    fn test_first_year_figures() {
        let engine = ProjectionEngine::default();
        let years = engine
            .project(&snapshot(), &hypotheses(), 10, &[loan()], date(2024, 1, 1))
            .unwrap();
        let y1 = &years[0];

        assert_abs_diff_eq!(y1.revenue, 36_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(y1.charges, 6_000.0 + 1_200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(y1.debt_service, loan().annuity_payment() * 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            y1.cashflow,
            36_000.0 * 0.95 - 7_200.0 - loan().annuity_payment() * 12.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(y1.property_value, 320_000.0 * 1.01, epsilon = 1e-6);
        assert_abs_diff_eq!(
            y1.outstanding_debt,
            outstanding::estimate(&loan(), date(2025, 1, 1)),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(y1.net_worth, y1.property_value - y1.outstanding_debt, epsilon = 1e-9);

        // growth compounds from year 2
        assert_abs_diff_eq!(years[1].revenue, 36_000.0 * 1.015, epsilon = 1e-6);
        assert_abs_diff_eq!(years[1].charges, 6_000.0 * 1.02 + 1_200.0, epsilon = 1e-6);
    }

    #[test]
    fn test_debt_matches_estimator_and_decreases() {
        let engine = ProjectionEngine::default();
        let years = engine
            .project(&snapshot(), &hypotheses(), 25, &[loan()], date(2024, 1, 1))
            .unwrap();
        assert_abs_diff_eq!(years[9].outstanding_debt, 117_298.81, epsilon = 0.01);
        for pair in years.windows(2) {
            assert!(pair[1].outstanding_debt <= pair[0].outstanding_debt);
        }
        assert_eq!(years[19].outstanding_debt, 0.0);
        assert_eq!(years[24].outstanding_debt, 0.0);
    }

    #[test]
    fn test_month_end_start_debt_is_year_end_balance() {
        let terms = LoanTerms::new(200_000.0, 3.5, 240, date(2024, 2, 29)).unwrap();
        let rows = crate::loan::schedule::compute(&terms).unwrap();
        let engine = ProjectionEngine::default();

        let years = engine
            .project(&snapshot(), &hypotheses(), 5, &[terms.clone()], date(2024, 2, 29))
            .unwrap();
        for y in &years {
            let row = &rows[(y.year * 12 - 1) as usize];
            assert_abs_diff_eq!(y.outstanding_debt, row.remaining_balance, epsilon = 0.01);
        }

        // first instalment of a 31 January loan falls on 2 March: none paid at
        // the start, one paid a month later
        let earlier = LoanTerms::new(200_000.0, 3.5, 240, date(2024, 1, 31)).unwrap();
        let rows = crate::loan::schedule::compute(&earlier).unwrap();
        let years = engine
            .project(&snapshot(), &hypotheses(), 2, &[earlier.clone()], date(2024, 2, 29))
            .unwrap();
        assert_abs_diff_eq!(years[0].outstanding_debt, rows[11].remaining_balance, epsilon = 0.01);
        assert_abs_diff_eq!(years[1].outstanding_debt, rows[23].remaining_balance, epsilon = 0.01);

        let years = engine
            .project(&snapshot(), &hypotheses(), 1, &[earlier], date(2024, 3, 2))
            .unwrap();
        assert_abs_diff_eq!(years[0].outstanding_debt, rows[12].remaining_balance, epsilon = 0.01);
    }

    #[test]
    fn test_matured_loan_stops_debt_service() {
        // loan started 18 months before the projection: 222 months left
        let engine = ProjectionEngine::default();
        let years = engine
            .project(&snapshot(), &hypotheses(), 20, &[loan()], date(2025, 7, 1))
            .unwrap();
        let annual = loan().annuity_payment() * 12.0;
        // 18 * 12 = 216 <= 222, 19 * 12 = 228 > 222
        assert_abs_diff_eq!(years[17].debt_service, annual, epsilon = 1e-9);
        assert_eq!(years[18].debt_service, 0.0);
        assert_eq!(years[19].debt_service, 0.0);
    }

    #[test]
    fn test_debt_service_includes_insurance() {
        let insured = LoanTerms::with_insurance(200_000.0, 3.5, 240, 0.36, date(2024, 1, 1)).unwrap();
        let engine = ProjectionEngine::default();
        let years = engine
            .project(&snapshot(), &hypotheses(), 1, &[insured.clone()], date(2024, 1, 1))
            .unwrap();
        assert_abs_diff_eq!(
            years[0].debt_service,
            (insured.annuity_payment() + 60.0) * 12.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_without_loans_uses_snapshot_debt_service() {
        let engine = ProjectionEngine::default();
        let years = engine
            .project(&snapshot(), &hypotheses(), 3, &[], date(2024, 1, 1))
            .unwrap();
        for y in &years {
            assert_abs_diff_eq!(y.debt_service, 1_159.92 * 12.0, epsilon = 1e-9);
            assert_eq!(y.outstanding_debt, 0.0);
        }
    }

    #[test]
    fn test_resale_year_and_after() {
        let engine = ProjectionEngine::default();
        let mut h = hypotheses();
        h.include_resale = true;
        h.resale_year = 5;

        let kept = engine
            .project(&snapshot(), &hypotheses(), 8, &[loan()], date(2024, 1, 1))
            .unwrap();
        let sold = engine
            .project(&snapshot(), &h, 8, &[loan()], date(2024, 1, 1))
            .unwrap();
        assert_eq!(sold.len(), 8);

        let y5 = &sold[4];
        let proceeds = y5.property_value * 0.93 - y5.outstanding_debt;
        assert_abs_diff_eq!(y5.net_sale_proceeds, proceeds, epsilon = 1e-9);
        assert_abs_diff_eq!(y5.cashflow, kept[4].cashflow + proceeds, epsilon = 1e-9);
        assert_abs_diff_eq!(y5.net_worth, kept[4].net_worth, epsilon = 1e-9);

        for y in &sold[5..] {
            assert_eq!(y.property_value, 0.0);
            assert_eq!(y.outstanding_debt, 0.0);
            assert_eq!(y.cashflow, 0.0);
            assert_abs_diff_eq!(y.net_worth, proceeds, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let engine = ProjectionEngine::default();
        let start = date(2024, 1, 1);

        let negative = engine.project(&snapshot(), &hypotheses(), -1, &[], start);
        assert!(matches!(negative, Err(EngineError::InvalidProjectionInput { .. })));

        let too_long = engine.project(&snapshot(), &hypotheses(), 101, &[], start);
        assert!(matches!(too_long, Err(EngineError::InvalidProjectionInput { .. })));

        let mut h = hypotheses();
        h.include_resale = true;
        h.resale_year = 11;
        let late_resale = engine.project(&snapshot(), &h, 10, &[], start);
        assert!(matches!(late_resale, Err(EngineError::InvalidProjectionInput { .. })));

        h.resale_year = 0;
        let no_year = engine.project(&snapshot(), &h, 10, &[], start);
        assert!(matches!(no_year, Err(EngineError::InvalidProjectionInput { .. })));

        let mut h = hypotheses();
        h.vacancy_pct = 120.0;
        assert!(engine.project(&snapshot(), &h, 10, &[], start).is_err());

        let mut s = snapshot();
        s.property_value = f64::NAN;
        assert!(engine.project(&s, &hypotheses(), 10, &[], start).is_err());

        let mut bad_loan = loan();
        bad_loan.principal = 0.0;
        let bad = engine.project(&snapshot(), &hypotheses(), 10, &[bad_loan], start);
        assert!(matches!(bad, Err(EngineError::InvalidLoanTerms { .. })));
    }

    #[test]
    fn test_deterministic() {
        let engine = ProjectionEngine::default();
        let loans = [loan(), LoanTerms::new(45_000.0, 1.7, 96, date(2021, 4, 10)).unwrap()];
        let a = engine
            .project(&snapshot(), &hypotheses(), 30, &loans, date(2024, 1, 1))
            .unwrap();
        let b = engine
            .project(&snapshot(), &hypotheses(), 30, &loans, date(2024, 1, 1))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_summary() {
        let engine = ProjectionEngine::default();
        let result = engine
            .project_with_summary(&snapshot(), &hypotheses(), 15, &[loan()], date(2024, 1, 1))
            .unwrap();
        assert_eq!(result.years.len(), 15);

        let total: f64 = result.years.iter().map(|y| y.cashflow).sum();
        assert_abs_diff_eq!(result.summary.total_cashflow, total, epsilon = 1e-9);
        assert!(result.summary.after_tax_cashflow <= total);

        let terminal = result.years[14].net_worth;
        assert_abs_diff_eq!(
            result.summary.real_terminal_net_worth,
            terminal / 1.02_f64.powi(15),
            epsilon = 1e-6
        );
        assert!(result.summary.irr_pct.is_some());
    }

    #[test]
    fn test_summary_discount_rate_of_minus_100_is_unstable() {
        let engine = ProjectionEngine::default();
        let mut h = hypotheses();
        h.discount_rate_pct = Some(-100.0);
        let result = engine.project_with_summary(&snapshot(), &h, 5, &[loan()], date(2024, 1, 1));
        assert!(matches!(result, Err(EngineError::NumericInstability { .. })));
    }

    #[test]
    fn test_summary_defaults_fill_missing_rates() {
        let defaults = EngineDefaults {
            default_tax_rate_pct: 50.0,
            ..Default::default()
        };
        let engine = ProjectionEngine::new(defaults);
        let mut h = hypotheses();
        h.tax_rate_pct = None;
        let result = engine
            .project_with_summary(&snapshot(), &h, 3, &[], date(2024, 1, 1))
            .unwrap();
        let expected: f64 = result
            .years
            .iter()
            .map(|y| if y.cashflow > 0.0 { y.cashflow * 0.5 } else { y.cashflow })
            .sum();
        assert_abs_diff_eq!(result.summary.after_tax_cashflow, expected, epsilon = 1e-9);
    }
}
