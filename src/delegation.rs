//! Pooled delegation to a single validator.
//!
//! Inbound deposits accumulate in `pending_to_delegate` until the pool
//! reaches Casper's minimum delegation, then the whole pool is delegated
//! in one batch. Outbound requests settle from the vault purse when it
//! covers them; otherwise the shortfall is undelegated and the caller
//! holds an unbonding ticket until the host reports enough liquidity.
//!
//! `pending_to_delegate` is a tracked subset of the vault purse, so purse
//! balance alone decides outbound availability. The adapter does not model
//! the unbonding clock; it only observes liquidity on each settle attempt.

use odra::prelude::*;
use odra::casper_types::{AsymmetricType, PublicKey, U512};
use alloc::vec::Vec;

use crate::errors::VaultError;
use crate::events;
use crate::math::MIN_DELEGATION_MOTES;

/// Outcome of reserving an outbound amount.
#[odra::odra_type]
#[derive(Default)]
pub enum Settlement {
    #[default]
    Liquid = 0,
    Unbonding = 1,
}

#[odra::module(events = [events::DelegationBatched, events::UndelegationRequested])]
pub struct DelegationAdapter {
    validator_public_key: Var<String>,
    pending_to_delegate: Var<U512>, // Motes waiting for the next batch
    total_delegated: Var<U512>,     // Tracked delegation to the validator
}

#[odra::module]
impl DelegationAdapter {
    pub fn init(&mut self, validator_public_key: String) {
        self.parse_validator_key(&validator_public_key);
        self.validator_public_key.set(validator_public_key);
        self.pending_to_delegate.set(U512::zero());
        self.total_delegated.set(U512::zero());
    }

    /// Replace the validator. Existing delegation is not migrated.
    pub fn set_validator(&mut self, new_key: String) {
        self.parse_validator_key(&new_key);
        self.validator_public_key.set(new_key);
    }

    /// Add inbound motes to the batching pool, delegating the whole pool
    /// once it reaches the minimum delegation.
    pub fn record_inbound(&mut self, amount: U512) {
        let pending = self.pending_to_delegate.get_or_default() + amount;
        if pending < U512::from(MIN_DELEGATION_MOTES) {
            self.pending_to_delegate.set(pending);
            return;
        }

        let validator = self.current_validator();
        self.env().delegate(validator, pending);
        self.total_delegated
            .set(self.total_delegated.get_or_default() + pending);
        self.pending_to_delegate.set(U512::zero());
        self.env().emit_event(events::DelegationBatched {
            amount_motes: pending,
        });
    }

    /// Reserve `amount` for an outbound transfer. Reserved motes leave the
    /// batching pool first so a later batch cannot delegate them away; if
    /// the purse cannot cover the amount, the shortfall is undelegated.
    pub fn request_outbound(&mut self, amount: U512) -> Settlement {
        let pending = self.pending_to_delegate.get_or_default();
        self.pending_to_delegate.set(pending.saturating_sub(amount));

        let liquid = self.env().self_balance();
        if liquid >= amount {
            return Settlement::Liquid;
        }

        let shortfall = amount - liquid;
        let delegated = self.total_delegated.get_or_default();
        let undelegate_amount = shortfall.min(delegated);
        if undelegate_amount > U512::zero() {
            let validator = self.current_validator();
            self.env().undelegate(validator, undelegate_amount);
            self.total_delegated.set(delegated - undelegate_amount);
            self.env().emit_event(events::UndelegationRequested {
                amount_motes: undelegate_amount,
            });
        }
        Settlement::Unbonding
    }

    /// Transfer `amount` to `recipient` if the purse covers it, otherwise
    /// revert with `UnbondingNotComplete`.
    pub fn try_settle(&mut self, recipient: Address, amount: U512) {
        if self.env().self_balance() < amount {
            self.env().revert(VaultError::UnbondingNotComplete);
        }
        self.env().transfer_tokens(&recipient, &amount);
    }

    pub fn liquid_balance(&self) -> U512 {
        self.env().self_balance()
    }

    pub fn pending_to_delegate(&self) -> U512 {
        self.pending_to_delegate.get_or_default()
    }

    pub fn total_delegated(&self) -> U512 {
        self.total_delegated.get_or_default()
    }

    /// Actual delegated amount as reported by the chain.
    pub fn delegated_amount(&self) -> U512 {
        let validator_key = self.validator_public_key.get_or_default();
        if validator_key.is_empty() {
            return U512::zero();
        }
        let validator = self.parse_validator_key(&validator_key);
        self.env().delegated_amount(validator)
    }

    pub fn validator_public_key(&self) -> String {
        self.validator_public_key.get_or_default()
    }

    fn current_validator(&self) -> PublicKey {
        let key = self.validator_public_key.get_or_default();
        if key.is_empty() {
            self.env().revert(VaultError::InvalidValidatorKey);
        }
        self.parse_validator_key(&key)
    }

    fn parse_validator_key(&self, validator_key: &str) -> PublicKey {
        match decode_public_key(validator_key) {
            Some(key) => key,
            None => self.env().revert(VaultError::InvalidValidatorKey),
        }
    }
}

/// Decode a hex-encoded Casper public key: a one-byte algorithm tag
/// (01 = Ed25519, 02 = Secp256k1) followed by the raw key bytes.
fn decode_public_key(hex: &str) -> Option<PublicKey> {
    let bytes = decode_hex(hex)?;
    let (tag, key) = bytes.split_first()?;
    match (*tag, key.len()) {
        (0x01, 32) => PublicKey::ed25519_from_bytes(key).ok(),
        (0x02, 33) => PublicKey::secp256k1_from_bytes(key).ok(),
        _ => None,
    }
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.is_empty() || hex.len() % 2 != 0 {
        return None;
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| u8::from_str_radix(core::str::from_utf8(pair).ok()?, 16).ok())
        .collect()
}
