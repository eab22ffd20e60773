//! Loan terms and the month arithmetic shared by every loan calculation

use crate::error::{EngineError, EngineResult};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Terms of a recorded loan.
///
/// Rates are plain percentages (3.5 means 3.5%). Insurance is charged on the
/// original principal, not on the declining balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredLoanTerms")]
pub struct LoanTerms {
    pub principal: f64,
    pub annual_rate_pct: f64,
    pub term_months: u32,
    pub annual_insurance_rate_pct: f64,
    pub start_date: NaiveDate,
}

/// Serialized form, checked before it becomes `LoanTerms`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLoanTerms {
    principal: f64,
    annual_rate_pct: f64,
    term_months: i64,
    #[serde(default)]
    annual_insurance_rate_pct: f64,
    start_date: NaiveDate,
}

impl TryFrom<StoredLoanTerms> for LoanTerms {
    type Error = EngineError;

    fn try_from(stored: StoredLoanTerms) -> EngineResult<Self> {
        Self::with_insurance(
            stored.principal,
            stored.annual_rate_pct,
            stored.term_months,
            stored.annual_insurance_rate_pct,
            stored.start_date,
        )
    }
}

impl LoanTerms {
    /// Build validated loan terms without insurance
    pub fn new(
        principal: f64,
        annual_rate_pct: f64,
        term_months: i64,
        start_date: NaiveDate,
    ) -> EngineResult<Self> {
        Self::with_insurance(principal, annual_rate_pct, term_months, 0.0, start_date)
    }

    /// Build validated loan terms with an annual insurance rate
    pub fn with_insurance(
        principal: f64,
        annual_rate_pct: f64,
        term_months: i64,
        annual_insurance_rate_pct: f64,
        start_date: NaiveDate,
    ) -> EngineResult<Self> {
        if term_months <= 0 {
            return Err(EngineError::loan_terms(format!(
                "term must be positive, got {} months",
                term_months
            )));
        }
        let term_months = u32::try_from(term_months).map_err(|_| {
            EngineError::loan_terms(format!("term of {} months is out of range", term_months))
        })?;

        let terms = Self {
            principal,
            annual_rate_pct,
            term_months,
            annual_insurance_rate_pct,
            start_date,
        };
        terms.validate()?;
        Ok(terms)
    }

    /// Check the loan invariants
    pub fn validate(&self) -> EngineResult<()> {
        if !self.principal.is_finite() || self.principal <= 0.0 {
            return Err(EngineError::loan_terms(format!(
                "principal must be positive, got {}",
                self.principal
            )));
        }
        if self.term_months == 0 {
            return Err(EngineError::loan_terms("term must be positive, got 0 months"));
        }
        if !self.annual_rate_pct.is_finite() || self.annual_rate_pct < 0.0 {
            return Err(EngineError::loan_terms(format!(
                "annual rate must be a non-negative percentage, got {}",
                self.annual_rate_pct
            )));
        }
        if !self.annual_insurance_rate_pct.is_finite() || self.annual_insurance_rate_pct < 0.0 {
            return Err(EngineError::loan_terms(format!(
                "insurance rate must be a non-negative percentage, got {}",
                self.annual_insurance_rate_pct
            )));
        }
        Ok(())
    }

    /// Monthly interest rate as a fraction
    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate_pct / 100.0 / 12.0
    }

    /// Monthly insurance rate as a fraction
    pub fn monthly_insurance_rate(&self) -> f64 {
        self.annual_insurance_rate_pct / 100.0 / 12.0
    }

    /// Principal + interest instalment (insurance excluded)
    pub fn annuity_payment(&self) -> f64 {
        annuity_payment(self.principal, self.monthly_rate(), self.term_months)
    }

    /// Constant monthly insurance premium
    pub fn monthly_insurance(&self) -> f64 {
        self.principal * self.monthly_insurance_rate()
    }

    /// Total monthly outflow: instalment plus insurance
    pub fn total_monthly_payment(&self) -> f64 {
        self.annuity_payment() + self.monthly_insurance()
    }

    /// Months elapsed since the loan start, clamped to `[0, term_months]`
    pub fn months_elapsed(&self, as_of: NaiveDate) -> u32 {
        let months = months_between(self.start_date, as_of).clamp(0, self.term_months as i64);
        months as u32
    }

    /// Date of the final instalment
    pub fn maturity_date(&self) -> NaiveDate {
        add_months(self.start_date, self.term_months)
    }
}

/// Standard annuity payment; linear repayment when the rate is zero
pub fn annuity_payment(principal: f64, monthly_rate: f64, term_months: u32) -> f64 {
    let n = term_months as f64;
    if monthly_rate == 0.0 {
        return principal / n;
    }
    let growth = (1.0 + monthly_rate).powf(n);
    principal * monthly_rate * growth / (growth - 1.0)
}

/// Whole months between two dates.
///
/// `(y2 - y1) * 12 + (m2 - m1)`, minus one when the day of month of `to` is
/// before that of `from`. Negative when `to` precedes `from`.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let mut months = (to.year() as i64 - from.year() as i64) * 12
        + (to.month() as i64 - from.month() as i64);
    if to.day() < from.day() {
        months -= 1;
    }
    months
}

/// Add calendar months, letting a day past the end of a shorter month roll
/// into the next one (31 January + 1 month = 2 or 3 March).
///
/// `months_between(date, add_months(date, k)) == k` for every date, so a
/// schedule row dated `start + k` months is exactly `k` months old.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.year() as i64 * 12 + date.month0() as i64 + months as i64;
    i32::try_from(total.div_euclid(12))
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, total.rem_euclid(12) as u32 + 1, 1))
        .and_then(|first| first.checked_add_days(Days::new(date.day0() as u64)))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_months_between() {
        assert_eq!(months_between(date(2024, 1, 1), date(2034, 1, 1)), 120);
        assert_eq!(months_between(date(2024, 1, 15), date(2024, 3, 14)), 1);
        assert_eq!(months_between(date(2024, 1, 15), date(2024, 3, 15)), 2);
        assert_eq!(months_between(date(2024, 5, 1), date(2024, 2, 1)), -3);
        assert_eq!(months_between(date(2023, 12, 31), date(2024, 1, 30)), 0);
    }

    #[test]
    fn test_add_months_rolls_past_month_end() {
        assert_eq!(add_months(date(2024, 1, 31), 1), date(2024, 3, 2));
        assert_eq!(add_months(date(2023, 1, 31), 1), date(2023, 3, 3));
        assert_eq!(add_months(date(2024, 1, 31), 2), date(2024, 3, 31));
        assert_eq!(add_months(date(2024, 2, 29), 12), date(2025, 3, 1));
        assert_eq!(add_months(date(2024, 11, 30), 3), date(2025, 3, 2));
        assert_eq!(add_months(date(2024, 6, 15), 0), date(2024, 6, 15));
    }

    #[test]
    fn test_add_months_agrees_with_months_between() {
        for start in [
            date(2024, 1, 31),
            date(2024, 2, 29),
            date(2023, 8, 30),
            date(2024, 3, 29),
            date(2024, 5, 1),
        ] {
            for k in 0..=480 {
                assert_eq!(months_between(start, add_months(start, k)), k as i64);
            }
        }
    }

    #[test]
    fn test_rejects_invalid_terms() {
        let start = date(2024, 1, 1);
        assert!(matches!(
            LoanTerms::new(0.0, 3.5, 240, start),
            Err(EngineError::InvalidLoanTerms { .. })
        ));
        assert!(matches!(
            LoanTerms::new(100_000.0, 3.5, 0, start),
            Err(EngineError::InvalidLoanTerms { .. })
        ));
        assert!(matches!(
            LoanTerms::new(100_000.0, -1.0, 120, start),
            Err(EngineError::InvalidLoanTerms { .. })
        ));
        assert!(matches!(
            LoanTerms::with_insurance(100_000.0, 2.0, 120, f64::NAN, start),
            Err(EngineError::InvalidLoanTerms { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let terms: LoanTerms = serde_json::from_str(
            r#"{"principal": 200000, "annualRatePct": 3.5, "termMonths": 240, "startDate": "2024-01-01"}"#,
        )
        .unwrap();
        assert_eq!(terms, LoanTerms::new(200_000.0, 3.5, 240, date(2024, 1, 1)).unwrap());

        for bad in [
            r#"{"principal": -5, "annualRatePct": 3.5, "termMonths": 240, "startDate": "2024-01-01"}"#,
            r#"{"principal": 1000, "annualRatePct": 3.5, "termMonths": 0, "startDate": "2024-01-01"}"#,
            r#"{"principal": 1000, "annualRatePct": -1, "termMonths": 12, "startDate": "2024-01-01"}"#,
        ] {
            assert!(serde_json::from_str::<LoanTerms>(bad).is_err());
        }
    }

    #[test]
    fn test_annuity_payment() {
        let terms = LoanTerms::new(200_000.0, 3.5, 240, date(2024, 1, 1)).unwrap();
        assert_abs_diff_eq!(terms.annuity_payment(), 1159.92, epsilon = 0.01);

        let zero = LoanTerms::new(120_000.0, 0.0, 120, date(2024, 1, 1)).unwrap();
        assert_abs_diff_eq!(zero.annuity_payment(), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_insurance_on_original_principal() {
        let terms =
            LoanTerms::with_insurance(200_000.0, 3.5, 240, 0.36, date(2024, 1, 1)).unwrap();
        assert_abs_diff_eq!(terms.monthly_insurance(), 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            terms.total_monthly_payment(),
            terms.annuity_payment() + 60.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_months_elapsed_clamped() {
        let terms = LoanTerms::new(50_000.0, 2.0, 24, date(2024, 6, 1)).unwrap();
        assert_eq!(terms.months_elapsed(date(2020, 1, 1)), 0);
        assert_eq!(terms.months_elapsed(date(2025, 6, 1)), 12);
        assert_eq!(terms.months_elapsed(date(2040, 1, 1)), 24);
        assert_eq!(terms.maturity_date(), date(2026, 6, 1));
    }
}
