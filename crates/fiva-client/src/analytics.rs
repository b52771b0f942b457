//! Yield figures derived from pool quotes.
//!
//! `ratio` is PT received per unit of underlying spent, both at 9 decimals.
//! PT settles in underlying terms at maturity, so `ratio - 1` is the fixed
//! return until then. The SY index never enters the ratio.

use chrono::{DateTime, Utc};

use crate::units::SY_DECIMALS;

const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_PER_YEAR: f64 = 365.0;

/// PT received per underlying unit, with `underlying_in` rescaled from
/// `underlying_decimals` to PT precision. Zero input gives zero.
pub fn pt_per_underlying(pt_out: u128, underlying_in: u128, underlying_decimals: u32) -> f64 {
    if underlying_in == 0 {
        return 0.0;
    }
    let shift = SY_DECIMALS as i32 - underlying_decimals as i32;
    pt_out as f64 / (underlying_in as f64 * 10f64.powi(shift))
}

/// Fractional days from `now` until `maturity`; zero once matured.
pub fn days_until(maturity: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let secs = (maturity - now).num_seconds();
    if secs <= 0 {
        return 0.0;
    }
    secs as f64 / SECONDS_PER_DAY
}

/// Simple (non-compounded) annualised fixed APY in percent.
pub fn fixed_apy(ratio: f64, days_to_maturity: f64) -> f64 {
    if days_to_maturity <= 0.0 {
        return 0.0;
    }
    (ratio - 1.0) * DAYS_PER_YEAR / days_to_maturity * 100.0
}

/// Gain at maturity in percent.
pub fn gain_percent(ratio: f64) -> f64 {
    (ratio - 1.0) * 100.0
}
