//! Multi-year projection engine and IRR

mod cashflows;
mod engine;
mod hypotheses;
pub mod irr;

pub use cashflows::{ProjectionResult, ProjectionSummary, YearProjection};
pub use engine::ProjectionEngine;
pub use hypotheses::{PortfolioSnapshot, ProjectionHypotheses};
pub use irr::IrrSolver;
