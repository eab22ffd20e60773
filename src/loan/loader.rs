//! Load recorded loans from CSV
//!
//! Expected columns:
//! `LoanId,Label,Principal,AnnualRatePct,TermMonths,InsuranceRatePct,StartDate`
//! with ISO dates. An empty `InsuranceRatePct` falls back to the configured
//! default.

use super::book::{Loan, LoanBook};
use super::terms::LoanTerms;
use crate::config::EngineDefaults;
use crate::error::{EngineError, EngineResult};
use crate::money::round_cents;
use chrono::NaiveDate;
use csv::Reader;
use std::path::Path;

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "LoanId")]
    loan_id: u32,
    #[serde(rename = "Label", default)]
    label: String,
    #[serde(rename = "Principal")]
    principal: f64,
    #[serde(rename = "AnnualRatePct")]
    annual_rate_pct: f64,
    #[serde(rename = "TermMonths")]
    term_months: i64,
    #[serde(rename = "InsuranceRatePct", default)]
    insurance_rate_pct: Option<f64>,
    #[serde(rename = "StartDate")]
    start_date: String,
}

impl CsvRow {
    fn to_loan(self, defaults: &EngineDefaults) -> EngineResult<Loan> {
        let start_date = NaiveDate::parse_from_str(self.start_date.trim(), "%Y-%m-%d")
            .map_err(|e| {
                EngineError::input(
                    "StartDate",
                    format!("loan {}: '{}' is not a date ({})", self.loan_id, self.start_date, e),
                )
            })?;

        let terms = LoanTerms::with_insurance(
            round_cents(self.principal),
            self.annual_rate_pct,
            self.term_months,
            self.insurance_rate_pct
                .unwrap_or(defaults.default_insurance_rate_pct),
            start_date,
        )
        .map_err(|e| match e {
            EngineError::InvalidLoanTerms { reason } => EngineError::InvalidLoanTerms {
                reason: format!("loan {}: {}", self.loan_id, reason),
            },
            other => other,
        })?;

        Ok(Loan {
            loan_id: self.loan_id,
            label: self.label,
            terms,
        })
    }
}

/// Load all loans from a CSV file
pub fn load_loans<P: AsRef<Path>>(path: P, defaults: &EngineDefaults) -> EngineResult<Vec<Loan>> {
    let reader = Reader::from_path(path)?;
    read_loans(reader, defaults)
}

/// Load loans from any reader (e.g. string buffer, uploaded file)
pub fn load_loans_from_reader<R: std::io::Read>(
    reader: R,
    defaults: &EngineDefaults,
) -> EngineResult<Vec<Loan>> {
    read_loans(Reader::from_reader(reader), defaults)
}

/// Load a CSV file straight into an ordered loan book
pub fn load_loan_book<P: AsRef<Path>>(path: P, defaults: &EngineDefaults) -> EngineResult<LoanBook> {
    LoanBook::new(load_loans(path, defaults)?)
}

fn read_loans<R: std::io::Read>(
    mut reader: Reader<R>,
    defaults: &EngineDefaults,
) -> EngineResult<Vec<Loan>> {
    let mut loans = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        loans.push(row.to_loan(defaults)?);
    }

    Ok(loans)
}
