//! Vault error taxonomy.
//!
//! Every error aborts the current entrypoint; the host rolls back all
//! state written before the revert.

use odra::prelude::OdraError;

/// Errors raised by the Magni vault and its submodules.
#[derive(Debug)]
#[odra::odra_error]
pub enum VaultError {
    NoVault = 1,
    InsufficientCollateral = 2,
    LtvExceeded = 3,
    InsufficientDebt = 4,
    InsufficientAllowance = 5,
    WithdrawPending = 6,
    NoWithdrawPending = 7,
    UnbondingNotComplete = 8,
    /// Published for wrappers that enforce a per-call minimum; the core
    /// accepts any positive deposit.
    BelowMinDeposit = 9,
    ContractPaused = 10,
    Unauthorized = 11,
    InvalidValidatorKey = 12,
    ZeroAmount = 13,
    Overflow = 14,
}
