//! Closed-form outstanding principal at a point in time

use super::terms::LoanTerms;
use chrono::NaiveDate;
use log::warn;

/// Remaining principal of a loan as of `as_of`, without building a schedule.
///
/// Insurance is excluded. Non-finite results are treated as zero so one
/// malformed loan cannot poison a portfolio total.
pub fn estimate(terms: &LoanTerms, as_of: NaiveDate) -> f64 {
    estimate_after_months(terms, terms.months_elapsed(as_of))
}

/// Remaining principal once `elapsed` instalments have been paid.
///
/// Equal to `schedule::compute(terms)[elapsed - 1].remaining_balance`.
pub fn estimate_after_months(terms: &LoanTerms, elapsed: u32) -> f64 {
    let balance = if elapsed >= terms.term_months {
        0.0
    } else if elapsed == 0 {
        terms.principal
    } else {
        let remaining = terms.term_months - elapsed;
        let r = terms.monthly_rate();
        if r == 0.0 {
            terms.principal * remaining as f64 / terms.term_months as f64
        } else {
            let payment = terms.annuity_payment();
            let growth = (1.0 + r).powf(remaining as f64);
            payment * (growth - 1.0) / (r * growth)
        }
    };

    if !balance.is_finite() {
        warn!(
            "non-finite outstanding balance for principal {} at {}% (treated as 0)",
            terms.principal, terms.annual_rate_pct
        );
        return 0.0;
    }

    balance.max(0.0)
}

/// Principal repaid between the loan start and `as_of`
pub fn repaid_to_date(terms: &LoanTerms, as_of: NaiveDate) -> f64 {
    (terms.principal - estimate(terms, as_of)).max(0.0)
}
