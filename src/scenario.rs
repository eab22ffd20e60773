//! Scenario runner for batch projections
//!
//! Holds one engine and evaluates many hypothesis sets against the same
//! portfolio, e.g. the base/stress/optimistic cases of a business plan or a
//! sensitivity sweep over one hypothesis. Scenarios run in parallel; results
//! come back in input order.

use crate::config::EngineDefaults;
use crate::error::EngineResult;
use crate::loan::{LoanBook, LoanTerms};
use crate::projection::{PortfolioSnapshot, ProjectionEngine, ProjectionHypotheses, ProjectionResult};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Named hypothesis set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub hypotheses: ProjectionHypotheses,
}

/// Projection of one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: ProjectionResult,
}

/// Hypothesis varied by a sensitivity sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensitivityField {
    Vacancy,
    RentGrowth,
    ChargeGrowth,
    PropertyAppreciation,
    DiscountRate,
    Inflation,
}

impl SensitivityField {
    fn apply(&self, hypotheses: &mut ProjectionHypotheses, value: f64) {
        match self {
            SensitivityField::Vacancy => hypotheses.vacancy_pct = value,
            SensitivityField::RentGrowth => hypotheses.rent_growth_pct = value,
            SensitivityField::ChargeGrowth => hypotheses.charge_growth_pct = value,
            SensitivityField::PropertyAppreciation => hypotheses.property_appreciation_pct = value,
            SensitivityField::DiscountRate => hypotheses.discount_rate_pct = Some(value),
            SensitivityField::Inflation => hypotheses.inflation_pct = value,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SensitivityField::Vacancy => "vacancyPct",
            SensitivityField::RentGrowth => "rentGrowthPct",
            SensitivityField::ChargeGrowth => "chargeGrowthPct",
            SensitivityField::PropertyAppreciation => "propertyAppreciationPct",
            SensitivityField::DiscountRate => "discountRatePct",
            SensitivityField::Inflation => "inflationPct",
        }
    }
}

/// Runs projections for one portfolio under many hypothesis sets
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    engine: ProjectionEngine,
}

impl ScenarioRunner {
    pub fn new(defaults: EngineDefaults) -> Self {
        Self {
            engine: ProjectionEngine::new(defaults),
        }
    }

    /// Run a single projection with summary
    pub fn run(
        &self,
        snapshot: &PortfolioSnapshot,
        hypotheses: &ProjectionHypotheses,
        duration_years: i32,
        loans: &LoanBook,
        start: NaiveDate,
    ) -> EngineResult<ProjectionResult> {
        self.engine
            .project_with_summary(snapshot, hypotheses, duration_years, &loans.terms(), start)
    }

    /// Run every scenario; fails if any scenario is invalid
    pub fn run_scenarios(
        &self,
        snapshot: &PortfolioSnapshot,
        scenarios: &[Scenario],
        duration_years: i32,
        loans: &LoanBook,
        start: NaiveDate,
    ) -> EngineResult<Vec<ScenarioOutcome>> {
        let terms = loans.terms();
        scenarios
            .par_iter()
            .map(|scenario| self.run_one(snapshot, scenario, duration_years, &terms, start))
            .collect()
    }

    /// Vary one hypothesis over `values`, keeping the rest of `base`
    pub fn sensitivity(
        &self,
        snapshot: &PortfolioSnapshot,
        base: &ProjectionHypotheses,
        field: SensitivityField,
        values: &[f64],
        duration_years: i32,
        loans: &LoanBook,
        start: NaiveDate,
    ) -> EngineResult<Vec<ScenarioOutcome>> {
        let scenarios: Vec<Scenario> = values
            .iter()
            .map(|&value| {
                let mut hypotheses = base.clone();
                field.apply(&mut hypotheses, value);
                Scenario {
                    name: format!("{}={}", field.label(), value),
                    hypotheses,
                }
            })
            .collect();

        self.run_scenarios(snapshot, &scenarios, duration_years, loans, start)
    }

    fn run_one(
        &self,
        snapshot: &PortfolioSnapshot,
        scenario: &Scenario,
        duration_years: i32,
        loans: &[LoanTerms],
        start: NaiveDate,
    ) -> EngineResult<ScenarioOutcome> {
        let result = self
            .engine
            .project_with_summary(snapshot, &scenario.hypotheses, duration_years, loans, start)?;
        Ok(ScenarioOutcome {
            name: scenario.name.clone(),
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::loan::Loan;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot() -> PortfolioSnapshot {
        PortfolioSnapshot {
            monthly_revenue: 4_200.0,
            monthly_recurring_charges: 650.0,
            monthly_debt_service: 0.0,
            property_value: 520_000.0,
            acquisition_cost: 480_000.0,
        }
    }

    fn base() -> ProjectionHypotheses {
        ProjectionHypotheses {
            inflation_pct: 2.0,
            vacancy_pct: 4.0,
            rent_growth_pct: 1.5,
            charge_growth_pct: 2.0,
            discount_rate_pct: Some(4.0),
            tax_rate_pct: None,
            annual_maintenance_reserve: 2_500.0,
            include_resale: false,
            resale_year: 0,
            property_appreciation_pct: 1.0,
            sale_costs_pct: 7.0,
        }
    }

    fn loans() -> LoanBook {
        LoanBook::new(vec![
            Loan {
                loan_id: 2,
                label: "works".into(),
                terms: LoanTerms::new(60_000.0, 2.1, 84, date(2023, 3, 1)).unwrap(),
            },
            Loan {
                loan_id: 1,
                label: "acquisition".into(),
                terms: LoanTerms::new(350_000.0, 3.2, 240, date(2022, 1, 1)).unwrap(),
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_scenarios_keep_input_order() {
        let runner = ScenarioRunner::default();
        let mut stress = base();
        stress.vacancy_pct = 15.0;
        let scenarios = vec![
            Scenario { name: "base".into(), hypotheses: base() },
            Scenario { name: "stress".into(), hypotheses: stress },
        ];

        let outcomes = runner
            .run_scenarios(&snapshot(), &scenarios, 20, &loans(), date(2024, 1, 1))
            .unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].name, "base");
        assert_eq!(outcomes[1].name, "stress");
        assert!(
            outcomes[1].result.summary.total_cashflow < outcomes[0].result.summary.total_cashflow
        );

        let single = runner
            .run(&snapshot(), &base(), 20, &loans(), date(2024, 1, 1))
            .unwrap();
        assert_eq!(single, outcomes[0].result);
    }

    #[test]
    fn test_invalid_scenario_fails_batch() {
        let runner = ScenarioRunner::default();
        let mut broken = base();
        broken.vacancy_pct = -5.0;
        let scenarios = vec![
            Scenario { name: "base".into(), hypotheses: base() },
            Scenario { name: "broken".into(), hypotheses: broken },
        ];
        let result = runner.run_scenarios(&snapshot(), &scenarios, 10, &loans(), date(2024, 1, 1));
        assert!(matches!(result, Err(EngineError::InvalidProjectionInput { .. })));
    }

    #[test]
    fn test_rent_growth_sensitivity() {
        let runner = ScenarioRunner::default();
        let outcomes = runner
            .sensitivity(
                &snapshot(),
                &base(),
                SensitivityField::RentGrowth,
                &[0.0, 1.0, 2.0, 3.0],
                25,
                &loans(),
                date(2024, 1, 1),
            )
            .unwrap();
        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[2].name, "rentGrowthPct=2");
        for pair in outcomes.windows(2) {
            assert!(pair[1].result.summary.total_cashflow > pair[0].result.summary.total_cashflow);
        }
    }
}
