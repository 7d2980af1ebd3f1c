//! Owner and pause control.

use odra::prelude::*;

use crate::errors::VaultError;
use crate::events;

/// Owner-restricted administration: set once at init, gate every
/// state-mutating user entrypoint behind the pause flag.
#[odra::module(events = [events::Paused, events::Unpaused])]
pub struct AdminControl {
    owner: Var<Address>,
    paused: Var<bool>,
}

#[odra::module]
impl AdminControl {
    pub fn init(&mut self, owner: Address) {
        self.owner.set(owner);
        self.paused.set(false);
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner.get()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get_or_default()
    }

    pub fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(VaultError::Unauthorized);
        }
    }

    pub fn require_not_paused(&self) {
        if self.paused.get_or_default() {
            self.env().revert(VaultError::ContractPaused);
        }
    }

    pub fn pause(&mut self) {
        self.require_owner();
        if self.paused.get_or_default() {
            self.env().revert(VaultError::ContractPaused);
        }
        self.paused.set(true);
        self.env().emit_event(events::Paused {
            by: self.env().caller(),
        });
    }

    pub fn unpause(&mut self) {
        self.require_owner();
        if !self.paused.get_or_default() {
            self.env().revert(VaultError::ContractPaused);
        }
        self.paused.set(false);
        self.env().emit_event(events::Unpaused {
            by: self.env().caller(),
        });
    }
}
