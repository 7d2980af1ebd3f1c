//! The synthetic debt token, mCSPR.
//!
//! A CEP-18 token whose supply is controlled by a single minter role held
//! by the vault: borrow mints, repay burns, nobody else touches supply.
//! The vault side only depends on the `DebtToken` slice of this surface.

use odra::prelude::*;
use odra::casper_types::U256;
use odra_modules::cep18::events::{
    Burn, DecreaseAllowance, IncreaseAllowance, Mint, SetAllowance, Transfer, TransferFrom,
};
use odra_modules::cep18_token::Cep18;

const TOKEN_SYMBOL: &str = "mCSPR";
const TOKEN_NAME: &str = "Magni CSPR";
const TOKEN_DECIMALS: u8 = 18;

/// The token operations the vault consumes.
#[odra::external_contract]
pub trait DebtToken {
    fn balance_of(&self, owner: Address) -> U256;
    fn total_supply(&self) -> U256;
    fn allowance(&self, owner: Address, spender: Address) -> U256;
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
    fn mint(&mut self, to: Address, amount: U256);
    fn burn(&mut self, from: Address, amount: U256);
}

/// Events beyond the CEP-18 standard set
pub mod events {
    use odra::prelude::*;

    #[odra::event]
    pub struct MinterSet {
        pub old_minter: Option<Address>,
        pub new_minter: Address,
    }
}

/// Errors for token operations (aligned with CEP-18 codes where applicable)
#[odra::odra_error]
pub enum TokenError {
    InsufficientBalance = 60001,
    InsufficientAllowance = 60002,
    CannotTargetSelfUser = 60003,
    Unauthorized = 60004,
}

#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        IncreaseAllowance,
        DecreaseAllowance,
        Transfer,
        TransferFrom,
        events::MinterSet
    ],
    errors = TokenError
)]
pub struct MCSPRToken {
    token: SubModule<Cep18>,
    minter: Var<Address>,
}

#[odra::module]
impl MCSPRToken {
    /// Deploys the token with zero supply. `minter` holds the mint/burn
    /// role until it hands it over via `set_minter`.
    pub fn init(&mut self, minter: Address) {
        self.token.init(
            TOKEN_SYMBOL.to_string(),
            TOKEN_NAME.to_string(),
            TOKEN_DECIMALS,
            U256::zero(),
        );
        self.minter.set(minter);
        self.env().emit_event(events::MinterSet {
            old_minter: None,
            new_minter: minter,
        });
    }

    // Standard CEP-18 surface, delegated to the odra-modules implementation.

    pub fn name(&self) -> String {
        self.token.name()
    }

    pub fn symbol(&self) -> String {
        self.token.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.token.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.token.total_supply()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.token.balance_of(&owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.token.allowance(&owner, &spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        self.token.transfer(&recipient, &amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        self.token.transfer_from(&owner, &recipient, &amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        self.token.approve(&spender, &amount);
    }

    pub fn increase_allowance(&mut self, spender: Address, amount: U256) {
        self.token.increase_allowance(&spender, &amount);
    }

    pub fn decrease_allowance(&mut self, spender: Address, amount: U256) {
        self.token.decrease_allowance(&spender, &amount);
    }

    // Supply control, restricted to the minter.

    /// Mint `amount` to `to`. Minter only.
    pub fn mint(&mut self, to: Address, amount: U256) {
        self.require_minter();
        self.token.raw_mint(&to, &amount);
    }

    /// Burn `amount` from `from`. Minter only.
    pub fn burn(&mut self, from: Address, amount: U256) {
        self.require_minter();
        self.token.raw_burn(&from, &amount);
    }

    // Minter role management.

    pub fn minter(&self) -> Option<Address> {
        self.minter.get()
    }

    /// Hand the mint/burn role over (only the current minter may call).
    pub fn set_minter(&mut self, new_minter: Address) {
        let old_minter = self.minter.get();
        if old_minter != Some(self.env().caller()) {
            self.env().revert(TokenError::Unauthorized);
        }
        self.minter.set(new_minter);
        self.env().emit_event(events::MinterSet {
            old_minter,
            new_minter,
        });
    }

    /// On Casper 2.0 a contract caller can surface under its entity or its
    /// package address, so after the exact comparison fails the package
    /// hashes are compared when both sides have one.
    fn require_minter(&self) {
        let caller = self.env().caller();
        let authorized = match self.minter.get() {
            Some(minter) if minter == caller => true,
            Some(minter) => match (
                minter.as_contract_package_hash(),
                caller.as_contract_package_hash(),
            ) {
                (Some(minter_pkg), Some(caller_pkg)) => minter_pkg == caller_pkg,
                _ => false,
            },
            None => false,
        };
        if !authorized {
            self.env().revert(TokenError::Unauthorized);
        }
    }
}
