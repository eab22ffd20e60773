//! Engine defaults
//!
//! Values used when a request omits an optional hypothesis, plus the solver
//! and horizon limits. Loaded once and passed explicitly into the engine.

use crate::error::EngineResult;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::path::Path;

/// Environment variable overriding the default discount rate (percent)
pub const ENV_DISCOUNT_RATE_PCT: &str = "SCI_DISCOUNT_RATE_PCT";
/// Environment variable overriding the default tax rate (percent)
pub const ENV_TAX_RATE_PCT: &str = "SCI_TAX_RATE_PCT";
/// Environment variable overriding the projection horizon limit (years)
pub const ENV_MAX_PROJECTION_YEARS: &str = "SCI_MAX_PROJECTION_YEARS";

/// Named default configuration shared by every calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineDefaults {
    /// Annual borrower insurance rate used when a loan omits it (percent)
    pub default_insurance_rate_pct: f64,

    /// Discount rate used when hypotheses omit it (percent)
    pub default_discount_rate_pct: f64,

    /// Tax rate used when hypotheses omit it (percent)
    pub default_tax_rate_pct: f64,

    /// Longest projection horizon accepted
    pub max_projection_years: u32,

    /// IRR search interval, as annual fractions
    pub irr_lower_bound: f64,
    pub irr_upper_bound: f64,

    /// IRR bisection iteration cap
    pub irr_max_iterations: u32,

    /// IRR stops once |NPV| falls below this amount
    pub irr_npv_tolerance: f64,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            default_insurance_rate_pct: 0.0,
            default_discount_rate_pct: 4.0,
            default_tax_rate_pct: 0.0,
            max_projection_years: 100,
            irr_lower_bound: -0.5,
            irr_upper_bound: 1.0,
            irr_max_iterations: 50,
            irr_npv_tolerance: 0.01,
        }
    }
}

impl EngineDefaults {
    /// Load defaults from a JSON file; missing keys keep their default value
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let file = File::open(path)?;
        let defaults = serde_json::from_reader(file)?;
        Ok(defaults)
    }

    /// Apply environment overrides. Unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(rate) = env_f64(ENV_DISCOUNT_RATE_PCT) {
            self.default_discount_rate_pct = rate;
        }
        if let Some(rate) = env_f64(ENV_TAX_RATE_PCT) {
            self.default_tax_rate_pct = rate;
        }
        if let Some(years) = env::var(ENV_MAX_PROJECTION_YEARS)
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.max_projection_years = years;
        }
        self
    }
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
