//! Money helpers for the JSON/CSV boundary

/// Round an amount to whole cents (half away from zero)
pub fn round_cents(amount: f64) -> f64 {
    if !amount.is_finite() {
        return amount;
    }
    let rounded = (amount * 100.0).round() / 100.0;
    // avoid emitting -0.00
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Round a percentage for display (4 decimals)
pub fn round_pct(pct: f64) -> f64 {
    if !pct.is_finite() {
        return pct;
    }
    (pct * 10_000.0).round() / 10_000.0
}
