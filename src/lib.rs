//! SCI Finance Engine - numerical core for property holding companies
//!
//! This library provides:
//! - Loan amortization schedules and closed-form outstanding principal
//! - Multi-year cash-flow projections under economic hypotheses
//! - IRR and NPV
//! - Investment performance ratios (yields, payback, cash-on-cash, LTV)
//! - Parallel scenario and sensitivity runs

pub mod config;
pub mod error;
pub mod input;
pub mod loan;
pub mod money;
pub mod performance;
pub mod projection;
pub mod scenario;

// Re-export commonly used types
pub use config::EngineDefaults;
pub use error::{EngineError, EngineResult};
pub use loan::{AmortizationRow, Loan, LoanBook, LoanTerms};
pub use performance::{Payback, PerformanceSummary};
pub use projection::{
    IrrSolver, PortfolioSnapshot, ProjectionEngine, ProjectionHypotheses, ProjectionResult,
    ProjectionSummary, YearProjection,
};
pub use scenario::{Scenario, ScenarioOutcome, ScenarioRunner, SensitivityField};
