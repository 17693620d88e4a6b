//! Unit scale conversion between a confidential asset and the public asset it
//! wraps.
//!
//! Confidential amounts are `u64` with a coarser resolution than the underlying
//! asset. Going in truncates (the remainder is reported as dust), going out
//! multiplies back exactly.

use frame_support::pallet_prelude::*;

#[derive(Clone, Copy, Encode, Decode, TypeInfo, PartialEq, Eq, RuntimeDebug)]
pub enum ScaleError {
    /// Amount converts to zero confidential units.
    TooSmall,
    /// Amount does not fit in a `u64` of confidential units.
    TooLarge,
    /// Rate or payout overflows `u128`.
    Overflow,
}

/// Result of converting a public amount into confidential units.
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub struct Truncated {
    pub units: u64,
    /// `amount % rate`, left behind by the conversion.
    pub dust: u128,
}

/// `10^(underlying - confidential)` when the underlying asset is finer, else 1.
pub fn conversion_rate(
    underlying_decimals: u8,
    confidential_decimals: u8,
) -> Result<u128, ScaleError> {
    if underlying_decimals <= confidential_decimals {
        return Ok(1);
    }
    10u128
        .checked_pow(u32::from(underlying_decimals - confidential_decimals))
        .ok_or(ScaleError::Overflow)
}

pub fn to_confidential(amount: u128, rate: u128) -> Result<Truncated, ScaleError> {
    if rate == 0 {
        return Err(ScaleError::Overflow);
    }
    let units = amount / rate;
    if units == 0 {
        return Err(ScaleError::TooSmall);
    }
    let units = u64::try_from(units).map_err(|_| ScaleError::TooLarge)?;
    Ok(Truncated { units, dust: amount % rate })
}

pub fn to_underlying(units: u64, rate: u128) -> Result<u128, ScaleError> {
    u128::from(units).checked_mul(rate).ok_or(ScaleError::Overflow)
}
