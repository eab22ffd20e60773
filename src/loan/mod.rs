//! Loan terms, amortization schedules and outstanding principal

mod book;
mod terms;
pub mod loader;
pub mod outstanding;
pub mod schedule;

pub use book::{Loan, LoanBook};
pub use loader::{load_loan_book, load_loans, load_loans_from_reader};
pub use schedule::{AmortizationRow, AnnualLoanSummary, PaidInWindow};
pub use terms::{add_months, annuity_payment, months_between, LoanTerms};
