//! Conversions between the underlying asset's precision and SY precision.
//!
//! SY always has 9 decimals. A rebasing underlying additionally carries an
//! index: the SY-per-underlying rate scaled by 10^6. An index of 0 marks a
//! non-rebasing underlying.
//!
//! ```text
//! index > 0:   sy = amount * 10^6 * 10^9 / index / 10^p
//!              amount = sy * index * 10^p / 10^9 / 10^6
//! index == 0:  sy = amount * 10^9 / 10^p
//!              amount = sy * 10^p / 10^9
//! ```
//!
//! All divisions floor. Intermediate products are computed in 256 bits so
//! that no realistic amount overflows.

use alloy_primitives::U256;

use crate::error::FivaError;

pub const SY_DECIMALS: u32 = 9;
pub const INDEX_DECIMALS: u32 = 6;

/// Largest supported underlying precision.
pub const MAX_DECIMALS: u32 = 30;

/// Decimals shown by [`to_user_representation`].
const DISPLAY_DECIMALS: u32 = 3;

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

fn check_decimals(decimals: u32) -> Result<(), FivaError> {
    if decimals > MAX_DECIMALS {
        return Err(FivaError::InvalidAmount(format!(
            "precision {decimals} exceeds {MAX_DECIMALS}"
        )));
    }
    Ok(())
}

fn narrow(value: U256) -> Result<u128, FivaError> {
    u128::try_from(value)
        .map_err(|_| FivaError::InvalidAmount(format!("{value} does not fit in 128 bits")))
}

/// Converts amounts for one SY market at one index snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitConverter {
    underlying_decimals: u32,
    index: u128,
}

impl UnitConverter {
    pub fn new(underlying_decimals: u32, index: u128) -> Result<Self, FivaError> {
        check_decimals(underlying_decimals)?;
        Ok(Self {
            underlying_decimals,
            index,
        })
    }

    pub fn underlying_decimals(&self) -> u32 {
        self.underlying_decimals
    }

    pub fn index(&self) -> u128 {
        self.index
    }

    pub fn is_rebasing(&self) -> bool {
        self.index > 0
    }

    pub fn underlying_to_sy(&self, amount: u128) -> Result<u128, FivaError> {
        let amount = U256::from(amount);
        let p = pow10(self.underlying_decimals);
        let sy = if self.is_rebasing() {
            amount * pow10(INDEX_DECIMALS) * pow10(SY_DECIMALS) / U256::from(self.index) / p
        } else {
            amount * pow10(SY_DECIMALS) / p
        };
        narrow(sy)
    }

    pub fn sy_to_underlying(&self, sy: u128) -> Result<u128, FivaError> {
        let sy = U256::from(sy);
        let p = pow10(self.underlying_decimals);
        let amount = if self.is_rebasing() {
            sy * U256::from(self.index) * p / pow10(SY_DECIMALS) / pow10(INDEX_DECIMALS)
        } else {
            sy * p / pow10(SY_DECIMALS)
        };
        narrow(amount)
    }
}

/// Render `amount` with three decimals, rounding half up. Display only.
pub fn to_user_representation(amount: u128, decimals: u32) -> Result<String, FivaError> {
    check_decimals(decimals)?;
    let amount = U256::from(amount);
    let thousandths = if decimals >= DISPLAY_DECIMALS {
        let scale = pow10(decimals - DISPLAY_DECIMALS);
        (amount + scale / U256::from(2u64)) / scale
    } else {
        amount * pow10(DISPLAY_DECIMALS - decimals)
    };
    let whole = thousandths / U256::from(1000u64);
    let frac = (thousandths % U256::from(1000u64)).as_limbs()[0];
    Ok(format!("{whole}.{frac:03}"))
}

/// Parse a decimal string such as `"12.5"` into integer units.
///
/// Fails on more fractional digits than `decimals` rather than truncating.
pub fn from_user_representation(input: &str, decimals: u32) -> Result<u128, FivaError> {
    check_decimals(decimals)?;
    let s = input.trim();
    let invalid = || FivaError::InvalidAmount(format!("{input:?} is not a decimal number"));

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(invalid());
    }
    if frac_part.len() > decimals as usize {
        return Err(FivaError::InvalidAmount(format!(
            "{input:?} has more than {decimals} decimal places"
        )));
    }

    let mut value = U256::ZERO;
    for b in int_part.bytes().chain(frac_part.bytes()) {
        value = value * U256::from(10u64) + U256::from(b - b'0');
        if value > U256::from(u128::MAX) {
            return Err(FivaError::InvalidAmount(format!("{input:?} is too large")));
        }
    }
    let padding = decimals - frac_part.len() as u32;
    narrow(value * pow10(padding))
}
