//! Month-by-month amortization schedule

use super::terms::{add_months, LoanTerms};
use crate::error::{EngineError, EngineResult};
use crate::money::round_cents;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One month of an amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    /// 1-indexed month
    pub month_index: u32,
    /// Instalment date (start date + month_index months)
    pub date: NaiveDate,
    /// Principal + interest instalment
    pub payment: f64,
    pub principal_portion: f64,
    pub interest_portion: f64,
    pub insurance_portion: f64,
    pub remaining_balance: f64,
}

impl AmortizationRow {
    /// Instalment plus insurance
    pub fn total_payment(&self) -> f64 {
        self.payment + self.insurance_portion
    }

    /// Copy with amounts rounded to cents, for output
    pub fn rounded(&self) -> Self {
        Self {
            payment: round_cents(self.payment),
            principal_portion: round_cents(self.principal_portion),
            interest_portion: round_cents(self.interest_portion),
            insurance_portion: round_cents(self.insurance_portion),
            remaining_balance: round_cents(self.remaining_balance),
            ..self.clone()
        }
    }
}

/// Schedule rows aggregated per loan year (months 1-12 = year 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualLoanSummary {
    pub loan_year: u32,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub insurance_paid: f64,
    pub closing_balance: f64,
}

impl AnnualLoanSummary {
    pub fn rounded(&self) -> Self {
        Self {
            loan_year: self.loan_year,
            principal_paid: round_cents(self.principal_paid),
            interest_paid: round_cents(self.interest_paid),
            insurance_paid: round_cents(self.insurance_paid),
            closing_balance: round_cents(self.closing_balance),
        }
    }
}

/// Interest and insurance paid over a date window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidInWindow {
    pub principal: f64,
    pub interest: f64,
    pub insurance: f64,
}

/// Build the full amortization schedule.
///
/// The last row takes whatever balance is left as its principal portion and
/// closes at exactly zero; the residual is not re-amortized.
pub fn compute(terms: &LoanTerms) -> EngineResult<Vec<AmortizationRow>> {
    terms.validate()?;

    let r = terms.monthly_rate();
    let payment = terms.annuity_payment();
    let insurance = terms.monthly_insurance();

    if !payment.is_finite() || !insurance.is_finite() {
        return Err(EngineError::numeric(format!(
            "amortization payment for principal {} at {}%",
            terms.principal, terms.annual_rate_pct
        )));
    }

    let mut rows = Vec::with_capacity(terms.term_months as usize);
    let mut balance = terms.principal;

    for month in 1..=terms.term_months {
        let interest = balance * r;

        let (row_payment, principal_portion) = if month == terms.term_months {
            (balance + interest, balance)
        } else {
            (payment, payment - interest)
        };

        balance -= principal_portion;
        balance = if month == terms.term_months {
            0.0
        } else {
            balance.max(0.0)
        };

        rows.push(AmortizationRow {
            month_index: month,
            date: add_months(terms.start_date, month),
            payment: row_payment,
            principal_portion,
            interest_portion: interest,
            insurance_portion: insurance,
            remaining_balance: balance,
        });
    }

    Ok(rows)
}

/// Aggregate schedule rows per loan year
pub fn annual_summary(rows: &[AmortizationRow]) -> Vec<AnnualLoanSummary> {
    let mut years: Vec<AnnualLoanSummary> = Vec::new();

    for row in rows {
        let loan_year = (row.month_index - 1) / 12 + 1;
        match years.last_mut() {
            Some(current) if current.loan_year == loan_year => {
                current.principal_paid += row.principal_portion;
                current.interest_paid += row.interest_portion;
                current.insurance_paid += row.insurance_portion;
                current.closing_balance = row.remaining_balance;
            }
            _ => years.push(AnnualLoanSummary {
                loan_year,
                principal_paid: row.principal_portion,
                interest_paid: row.interest_portion,
                insurance_paid: row.insurance_portion,
                closing_balance: row.remaining_balance,
            }),
        }
    }

    years
}

/// Principal, interest and insurance of the instalments dated within
/// `[from, to]` (inclusive), e.g. a fiscal year for the annual report
pub fn paid_between(terms: &LoanTerms, from: NaiveDate, to: NaiveDate) -> EngineResult<PaidInWindow> {
    let rows = compute(terms)?;
    let paid = rows
        .iter()
        .filter(|row| row.date >= from && row.date <= to)
        .fold(PaidInWindow::default(), |mut acc, row| {
            acc.principal += row.principal_portion;
            acc.interest += row.interest_portion;
            acc.insurance += row.insurance_portion;
            acc
        });
    Ok(paid)
}
