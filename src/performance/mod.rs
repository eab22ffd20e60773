//! Investment performance metrics

pub mod ratios;
mod summary;

pub use ratios::Payback;
pub use summary::PerformanceSummary;
