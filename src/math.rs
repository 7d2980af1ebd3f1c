//! Mixed-precision arithmetic between motes and wad.
//!
//! CSPR amounts live in motes (U512, 9 implied decimals); mCSPR amounts
//! live in wad (U256, 18 implied decimals). Every conversion site goes
//! through this module; there is no implicit coercion between the scales.
//!
//! Rounding policy: debt is never rounded below its nominal value and
//! collateral credited to a user is never rounded above it. Collateral
//! returned rounds down, required collateral rounds up.

use odra::casper_types::{U256, U512};

use crate::errors::VaultError;

/// 1 CSPR = 1e9 motes
pub const MOTES_PER_CSPR: u64 = 1_000_000_000;
/// Conversion factor from motes (9 dec) to wad (18 dec) = 1e9
pub const MOTES_TO_WAD_FACTOR: u128 = 1_000_000_000;
/// 1 wad = 1e18
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// LTV maximum = 80% = 8000 bps
pub const LTV_MAX_BPS: u64 = 8000;
/// Basis points divisor
pub const BPS_DIVISOR: u64 = 10_000;

/// Interest rate = 2% APR = 200 bps
pub const INTEREST_RATE_BPS: u64 = 200;
/// Seconds per year (365 days)
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Minimum delegation on Casper = 500 CSPR
pub const MIN_DELEGATION_MOTES: u64 = 500_000_000_000;

/// Convert motes (U512, 9 decimals) to wad (U256, 18 decimals).
/// Exact multiplication; fails if the result does not fit in a U256.
pub fn motes_to_wad(motes: U512) -> Result<U256, VaultError> {
    let wad = motes
        .checked_mul(U512::from(MOTES_TO_WAD_FACTOR))
        .ok_or(VaultError::Overflow)?;
    u512_to_u256(wad)
}

/// Convert wad (U256, 18 decimals) to motes (U512, 9 decimals).
/// Truncates toward zero.
pub fn wad_to_motes(wad: U256) -> U512 {
    u256_to_u512(wad / U256::from(MOTES_TO_WAD_FACTOR))
}

/// Convert wad to motes, rounding up on any non-zero remainder.
pub fn wad_to_motes_ceil(wad: U256) -> U512 {
    let factor = U256::from(MOTES_TO_WAD_FACTOR);
    let mut motes = wad / factor;
    if wad % factor != U256::zero() {
        motes += U256::one();
    }
    u256_to_u512(motes)
}

/// Maximum debt supportable by the given collateral, in wad (truncated).
pub fn max_borrow_wad(collateral_motes: U512) -> Result<U256, VaultError> {
    let collateral_wad = motes_to_wad(collateral_motes)?;
    let scaled = collateral_wad
        .checked_mul(U256::from(LTV_MAX_BPS))
        .ok_or(VaultError::Overflow)?;
    Ok(scaled / U256::from(BPS_DIVISOR))
}

/// Minimum collateral, in motes, that keeps the given debt at or below
/// the LTV cap. Rounds up at both the wad and the motes step.
pub fn min_collateral_for_debt(debt_wad: U256) -> Result<U512, VaultError> {
    let scaled = debt_wad
        .checked_mul(U256::from(BPS_DIVISOR))
        .ok_or(VaultError::Overflow)?;
    let ltv = U256::from(LTV_MAX_BPS);
    let mut min_wad = scaled / ltv;
    if scaled % ltv != U256::zero() {
        min_wad += U256::one();
    }
    Ok(wad_to_motes_ceil(min_wad))
}

fn u512_to_u256(value: U512) -> Result<U256, VaultError> {
    if value.bits() > 256 {
        return Err(VaultError::Overflow);
    }
    let mut bytes = [0u8; 64];
    value.to_little_endian(&mut bytes);
    Ok(U256::from_little_endian(&bytes[..32]))
}

fn u256_to_u512(value: U256) -> U512 {
    let mut bytes = [0u8; 32];
    value.to_little_endian(&mut bytes);
    U512::from_little_endian(&bytes)
}
