//! Per-user simple interest.
//!
//! `interest = principal * INTEREST_RATE_BPS * elapsed / (SECONDS_PER_YEAR * BPS_DIVISOR)`
//!
//! Simple interest keeps the per-user state to two scalars (principal and
//! last accrual timestamp) and needs no global index shared across users.

use odra::casper_types::U256;

use crate::errors::VaultError;
use crate::math::{BPS_DIVISOR, INTEREST_RATE_BPS, SECONDS_PER_YEAR};

/// Interest owed on `principal` after `elapsed_secs` seconds.
/// Rounds up on any non-zero remainder so debt never accrues below its
/// nominal value. Fails with `Overflow` if the intermediate product does
/// not fit in a U256.
pub fn interest_due(principal: U256, elapsed_secs: u64) -> Result<U256, VaultError> {
    if principal == U256::zero() || elapsed_secs == 0 {
        return Ok(U256::zero());
    }

    let numerator = principal
        .checked_mul(U256::from(INTEREST_RATE_BPS))
        .and_then(|v| v.checked_mul(U256::from(elapsed_secs)))
        .ok_or(VaultError::Overflow)?;
    let denominator = U256::from(SECONDS_PER_YEAR as u128 * BPS_DIVISOR as u128);

    let mut interest = numerator / denominator;
    if numerator % denominator != U256::zero() {
        interest += U256::one();
    }
    Ok(interest)
}
