//! Set of recorded loans kept in identifier order
//!
//! Portfolio totals are summed in `loan_id` order so that floating-point
//! rounding is reproducible from one run to the next.

use super::outstanding;
use super::schedule::{self, AmortizationRow};
use super::terms::LoanTerms;
use crate::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A recorded loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub loan_id: u32,
    #[serde(default)]
    pub label: String,
    pub terms: LoanTerms,
}

/// Loans sorted by identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoanBook {
    loans: Vec<Loan>,
}

impl LoanBook {
    /// Build a book, validating every loan and rejecting duplicate ids
    pub fn new(mut loans: Vec<Loan>) -> EngineResult<Self> {
        for loan in &loans {
            loan.terms.validate().map_err(|e| match e {
                EngineError::InvalidLoanTerms { reason } => EngineError::InvalidLoanTerms {
                    reason: format!("loan {}: {}", loan.loan_id, reason),
                },
                other => other,
            })?;
        }

        loans.sort_by_key(|loan| loan.loan_id);
        if let Some(pair) = loans.windows(2).find(|w| w[0].loan_id == w[1].loan_id) {
            return Err(EngineError::input(
                "loanId",
                format!("duplicate loan id {}", pair[0].loan_id),
            ));
        }

        Ok(Self { loans })
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Loan> {
        self.loans.iter()
    }

    pub fn get(&self, loan_id: u32) -> Option<&Loan> {
        self.loans
            .binary_search_by_key(&loan_id, |loan| loan.loan_id)
            .ok()
            .map(|idx| &self.loans[idx])
    }

    /// Loan terms in identifier order, as consumed by the projection engine
    pub fn terms(&self) -> Vec<LoanTerms> {
        self.loans.iter().map(|loan| loan.terms.clone()).collect()
    }

    /// Total outstanding principal across the book
    pub fn total_outstanding(&self, as_of: NaiveDate) -> f64 {
        self.loans
            .iter()
            .map(|loan| outstanding::estimate(&loan.terms, as_of))
            .sum()
    }

    /// Outstanding principal per loan, in identifier order
    pub fn outstanding_by_loan(&self, as_of: NaiveDate) -> Vec<(u32, f64)> {
        self.loans
            .iter()
            .map(|loan| (loan.loan_id, outstanding::estimate(&loan.terms, as_of)))
            .collect()
    }

    /// Monthly instalments plus insurance of the loans still running at `as_of`
    pub fn monthly_debt_service(&self, as_of: NaiveDate) -> f64 {
        self.loans
            .iter()
            .filter(|loan| {
                let elapsed = super::terms::months_between(loan.terms.start_date, as_of);
                elapsed < loan.terms.term_months as i64
            })
            .map(|loan| loan.terms.total_monthly_payment())
            .sum()
    }

    /// Amortization schedule of one loan
    pub fn schedule(&self, loan_id: u32) -> EngineResult<Vec<AmortizationRow>> {
        let loan = self
            .get(loan_id)
            .ok_or_else(|| EngineError::input("loanId", format!("unknown loan id {}", loan_id)))?;
        schedule::compute(&loan.terms)
    }
}
