//! Validation boundary between external requests and the engine
//!
//! Requests arrive as JSON produced by forms and exports, where numbers may be
//! JSON numbers or numeric strings. Everything is converted here into the
//! typed value objects before any computation runs:
//! - numbers: JSON number, or a string that parses as a finite decimal
//! - empty strings, `null` in required fields, and unparsable text are rejected
//! - money is rounded to cents
//! - dates are ISO `YYYY-MM-DD`

use crate::config::EngineDefaults;
use crate::error::{EngineError, EngineResult};
use crate::loan::{Loan, LoanBook, LoanTerms};
use crate::money::round_cents;
use crate::projection::{PortfolioSnapshot, ProjectionHypotheses};
use crate::scenario::Scenario;
use chrono::NaiveDate;
use serde::Deserialize;

/// A numeric field as received
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

fn number(field: &str, raw: Option<RawNumber>) -> EngineResult<f64> {
    optional_number(field, raw)?.ok_or_else(|| EngineError::input(field, "value is required"))
}

/// `None` only when the field is absent or null; empty text is an error
fn optional_number(field: &str, raw: Option<RawNumber>) -> EngineResult<Option<f64>> {
    let value = match raw {
        None => return Ok(None),
        Some(RawNumber::Number(v)) => v,
        Some(RawNumber::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(EngineError::input(field, "empty value"));
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| EngineError::input(field, format!("'{}' is not a number", text)))?
        }
    };

    if !value.is_finite() {
        return Err(EngineError::input(field, "value must be finite"));
    }
    Ok(Some(value))
}

fn money(field: &str, raw: Option<RawNumber>) -> EngineResult<f64> {
    number(field, raw).map(round_cents)
}

fn integer(field: &str, raw: Option<RawNumber>) -> EngineResult<i64> {
    optional_integer(field, raw)?.ok_or_else(|| EngineError::input(field, "value is required"))
}

fn optional_integer(field: &str, raw: Option<RawNumber>) -> EngineResult<Option<i64>> {
    match optional_number(field, raw)? {
        None => Ok(None),
        Some(v) if v.fract() == 0.0 && v.abs() < i32::MAX as f64 => Ok(Some(v as i64)),
        Some(v) => Err(EngineError::input(field, format!("{} is not a whole number", v))),
    }
}

fn date(field: &str, raw: Option<String>) -> EngineResult<NaiveDate> {
    let text = raw.ok_or_else(|| EngineError::input(field, "value is required"))?;
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| EngineError::input(field, format!("'{}' is not a YYYY-MM-DD date", text)))
}

/// Loan terms as received
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTermsInput {
    pub principal: Option<RawNumber>,
    pub annual_rate_pct: Option<RawNumber>,
    pub term_months: Option<RawNumber>,
    pub annual_insurance_rate_pct: Option<RawNumber>,
    pub start_date: Option<String>,
}

impl LoanTermsInput {
    pub fn into_terms(self, defaults: &EngineDefaults) -> EngineResult<LoanTerms> {
        let principal = money("principal", self.principal)?;
        let annual_rate_pct = number("annualRatePct", self.annual_rate_pct)?;
        let term_months = integer("termMonths", self.term_months)?;
        let insurance = optional_number("annualInsuranceRatePct", self.annual_insurance_rate_pct)?
            .unwrap_or(defaults.default_insurance_rate_pct);
        let start_date = date("startDate", self.start_date)?;

        LoanTerms::with_insurance(principal, annual_rate_pct, term_months, insurance, start_date)
    }
}

/// A recorded loan as received
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanInput {
    pub loan_id: u32,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub terms: LoanTermsInput,
}

impl LoanInput {
    pub fn into_loan(self, defaults: &EngineDefaults) -> EngineResult<Loan> {
        let loan_id = self.loan_id;
        let terms = self.terms.into_terms(defaults).map_err(|e| match e {
            EngineError::InvalidLoanTerms { reason } => EngineError::InvalidLoanTerms {
                reason: format!("loan {}: {}", loan_id, reason),
            },
            EngineError::InvalidInput { field, reason } => EngineError::InvalidInput {
                field: format!("loans[{}].{}", loan_id, field),
                reason,
            },
            other => other,
        })?;
        Ok(Loan {
            loan_id,
            label: self.label.unwrap_or_default(),
            terms,
        })
    }
}

/// Build an ordered loan book from received loans
pub fn loan_book(loans: Vec<LoanInput>, defaults: &EngineDefaults) -> EngineResult<LoanBook> {
    let loans = loans
        .into_iter()
        .map(|loan| loan.into_loan(defaults))
        .collect::<EngineResult<Vec<_>>>()?;
    LoanBook::new(loans)
}

/// Portfolio aggregates as received
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInput {
    pub monthly_revenue: Option<RawNumber>,
    pub monthly_recurring_charges: Option<RawNumber>,
    pub monthly_debt_service: Option<RawNumber>,
    pub property_value: Option<RawNumber>,
    pub acquisition_cost: Option<RawNumber>,
}

impl SnapshotInput {
    pub fn into_snapshot(self) -> EngineResult<PortfolioSnapshot> {
        let snapshot = PortfolioSnapshot {
            monthly_revenue: money("monthlyRevenue", self.monthly_revenue)?,
            monthly_recurring_charges: money("monthlyRecurringCharges", self.monthly_recurring_charges)?,
            monthly_debt_service: money("monthlyDebtService", self.monthly_debt_service)?,
            property_value: money("propertyValue", self.property_value)?,
            acquisition_cost: money("acquisitionCost", self.acquisition_cost)?,
        };

        for (field, value) in [
            ("monthlyRevenue", snapshot.monthly_revenue),
            ("monthlyRecurringCharges", snapshot.monthly_recurring_charges),
            ("monthlyDebtService", snapshot.monthly_debt_service),
            ("propertyValue", snapshot.property_value),
            ("acquisitionCost", snapshot.acquisition_cost),
        ] {
            if value < 0.0 {
                return Err(EngineError::input(field, "amount must not be negative"));
            }
        }

        Ok(snapshot)
    }
}

/// Projection hypotheses as received.
///
/// `discountRatePct` and `taxRatePct` may be omitted (engine defaults apply);
/// `resaleYear` and `saleCostsPct` are only required when `includeResale` is set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HypothesesInput {
    pub inflation_pct: Option<RawNumber>,
    pub vacancy_pct: Option<RawNumber>,
    pub rent_growth_pct: Option<RawNumber>,
    pub charge_growth_pct: Option<RawNumber>,
    pub discount_rate_pct: Option<RawNumber>,
    pub tax_rate_pct: Option<RawNumber>,
    pub annual_maintenance_reserve: Option<RawNumber>,
    #[serde(default)]
    pub include_resale: bool,
    pub resale_year: Option<RawNumber>,
    pub property_appreciation_pct: Option<RawNumber>,
    pub sale_costs_pct: Option<RawNumber>,
}

impl HypothesesInput {
    pub fn into_hypotheses(self) -> EngineResult<ProjectionHypotheses> {
        let (resale_year, sale_costs_pct) = if self.include_resale {
            (
                integer("resaleYear", self.resale_year)? as i32,
                number("saleCostsPct", self.sale_costs_pct)?,
            )
        } else {
            (
                optional_integer("resaleYear", self.resale_year)?.unwrap_or(0) as i32,
                optional_number("saleCostsPct", self.sale_costs_pct)?.unwrap_or(0.0),
            )
        };

        Ok(ProjectionHypotheses {
            inflation_pct: number("inflationPct", self.inflation_pct)?,
            vacancy_pct: number("vacancyPct", self.vacancy_pct)?,
            rent_growth_pct: number("rentGrowthPct", self.rent_growth_pct)?,
            charge_growth_pct: number("chargeGrowthPct", self.charge_growth_pct)?,
            discount_rate_pct: optional_number("discountRatePct", self.discount_rate_pct)?,
            tax_rate_pct: optional_number("taxRatePct", self.tax_rate_pct)?,
            annual_maintenance_reserve: money("annualMaintenanceReserve", self.annual_maintenance_reserve)?,
            include_resale: self.include_resale,
            resale_year,
            property_appreciation_pct: number("propertyAppreciationPct", self.property_appreciation_pct)?,
            sale_costs_pct,
        })
    }
}

/// Named hypothesis set as received
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioInput {
    pub name: String,
    pub hypotheses: HypothesesInput,
}

/// Projection request as received
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRequest {
    pub snapshot: SnapshotInput,
    pub hypotheses: HypothesesInput,
    pub duration_years: Option<RawNumber>,
    pub start_date: Option<String>,
    #[serde(default)]
    pub loans: Vec<LoanInput>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioInput>,
}

/// Validated projection request
#[derive(Debug, Clone)]
pub struct ProjectionCase {
    pub snapshot: PortfolioSnapshot,
    pub hypotheses: ProjectionHypotheses,
    pub duration_years: i32,
    pub start_date: NaiveDate,
    pub loans: LoanBook,
    pub scenarios: Vec<Scenario>,
}

impl ProjectionRequest {
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_case(self, defaults: &EngineDefaults) -> EngineResult<ProjectionCase> {
        let scenarios = self
            .scenarios
            .into_iter()
            .map(|s| {
                Ok(Scenario {
                    name: s.name,
                    hypotheses: s.hypotheses.into_hypotheses()?,
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(ProjectionCase {
            snapshot: self.snapshot.into_snapshot()?,
            hypotheses: self.hypotheses.into_hypotheses()?,
            duration_years: integer("durationYears", self.duration_years)? as i32,
            start_date: date("startDate", self.start_date)?,
            loans: loan_book(self.loans, defaults)?,
            scenarios,
        })
    }
}

/// Performance request as received; hypotheses and a duration enable the IRR
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRequest {
    pub snapshot: SnapshotInput,
    pub as_of: Option<String>,
    #[serde(default)]
    pub loans: Vec<LoanInput>,
    #[serde(default)]
    pub hypotheses: Option<HypothesesInput>,
    #[serde(default)]
    pub duration_years: Option<RawNumber>,
}

/// Validated performance request
#[derive(Debug, Clone)]
pub struct PerformanceCase {
    pub snapshot: PortfolioSnapshot,
    pub as_of: NaiveDate,
    pub loans: LoanBook,
    /// Present when an IRR should be computed from a projection
    pub projection: Option<(ProjectionHypotheses, i32)>,
}

impl PerformanceRequest {
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_case(self, defaults: &EngineDefaults) -> EngineResult<PerformanceCase> {
        let projection = match self.hypotheses {
            Some(h) => Some((
                h.into_hypotheses()?,
                integer("durationYears", self.duration_years)? as i32,
            )),
            None => None,
        };

        Ok(PerformanceCase {
            snapshot: self.snapshot.into_snapshot()?,
            as_of: date("asOf", self.as_of)?,
            loans: loan_book(self.loans, defaults)?,
            projection,
        })
    }
}
