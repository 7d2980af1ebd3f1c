//! Domain event log.
//!
//! Events are emitted in the exact order the state transitions happen and
//! never for failed calls; the event stream is the authoritative external
//! view of the vault, and a consumer can rebuild any position from it.

use odra::prelude::*;
use odra::casper_types::{U256, U512};

#[odra::event]
pub struct Deposited {
    pub user: Address,
    pub amount_motes: U512,
    pub new_collateral_motes: U512,
}

#[odra::event]
pub struct Borrowed {
    pub user: Address,
    pub amount_wad: U256,
    pub new_debt_wad: U256,
}

#[odra::event]
pub struct Repaid {
    pub user: Address,
    pub amount_wad: U256,
    pub new_debt_wad: U256,
}

#[odra::event]
pub struct WithdrawRequested {
    pub user: Address,
    pub amount_motes: U512,
}

#[odra::event]
pub struct WithdrawFinalized {
    pub user: Address,
    pub amount_motes: U512,
}

#[odra::event]
pub struct InterestAccrued {
    pub user: Address,
    pub amount_wad: U256,
}

#[odra::event]
pub struct DelegationBatched {
    pub amount_motes: U512,
}

#[odra::event]
pub struct UndelegationRequested {
    pub amount_motes: U512,
}

#[odra::event]
pub struct ValidatorSet {
    pub new_validator_key: String,
}

#[odra::event]
pub struct Paused {
    pub by: Address,
}

#[odra::event]
pub struct Unpaused {
    pub by: Address,
}
