//! Magni V2 CSPR Vault Contract
//!
//! A collateral-debt vault for CSPR on Casper Network.
//! - Users deposit CSPR as collateral (pooled and delegated to a validator)
//! - Users can borrow mCSPR (debt token) against collateral up to 80% LTV
//! - Debt accrues interest at 2% APR (simple interest, rounded up)
//! - Withdrawals use a 2-step process due to the staking unbonding delay;
//!   a request the purse can cover settles in the same call
//!
//! ## Units
//! - CSPR: motes (U512), 1 CSPR = 1e9 motes
//! - mCSPR: wad (U256), 18 decimals, 1 mCSPR = 1e18 wad
//!
//! ## Out of Scope
//! The leverage loop (mCSPR -> SwapPool -> CSPR -> re-deposit) is external.

use odra::prelude::*;
use odra::casper_types::{U256, U512};
use odra::ContractRef;

use crate::admin::AdminControl;
use crate::delegation::{DelegationAdapter, Settlement};
use crate::errors::VaultError;
use crate::events;
use crate::interest;
use crate::math;
use crate::tokens::DebtTokenContractRef;

/// Vault status for a user
#[odra::odra_type]
#[derive(Default)]
pub enum VaultStatus {
    #[default]
    None = 0,
    Active = 1,
    Withdrawing = 2,
}

/// Position info returned by get_position
#[odra::odra_type]
pub struct PositionInfo {
    pub collateral_motes: U512,
    pub collateral_wad: U256,
    pub debt_wad: U256,
    pub ltv_bps: u64,
    pub health_factor: u64,
    pub pending_withdraw_motes: U512,
    pub status: u8,
}

#[odra::module(
    events = [
        events::Deposited,
        events::Borrowed,
        events::Repaid,
        events::WithdrawRequested,
        events::WithdrawFinalized,
        events::InterestAccrued,
        events::DelegationBatched,
        events::UndelegationRequested,
        events::ValidatorSet,
        events::Paused,
        events::Unpaused
    ],
    errors = VaultError
)]
pub struct Magni {
    // Debt token reference
    debt_token: Var<Address>,

    // Per-user vault state
    collateral: Mapping<Address, U512>,      // User's collateral in motes
    debt_principal: Mapping<Address, U256>,  // User's debt in wad (18 dec)
    last_accrual_ts: Mapping<Address, u64>,  // Last interest accrual timestamp (seconds)
    vault_status: Mapping<Address, VaultStatus>,
    pending_withdraw: Mapping<Address, U512>, // Pending withdrawal amount

    // Global state
    total_collateral: Var<U512>,      // Sum of all collateral
    total_debt_principal: Var<U256>,  // Sum of all debt principal

    // Components
    admin: SubModule<AdminControl>,
    staking: SubModule<DelegationAdapter>,
}

#[odra::module]
impl Magni {
    // ==========================================
    // Initialization
    // ==========================================

    /// Initialize the Magni V2 vault contract
    pub fn init(&mut self, debt_token: Address, validator_public_key: String) {
        self.debt_token.set(debt_token);
        self.total_collateral.set(U512::zero());
        self.total_debt_principal.set(U256::zero());
        let caller = self.env().caller();
        self.admin.init(caller);
        self.staking.init(validator_public_key);
    }

    // ==========================================
    // User Functions
    // ==========================================

    /// Deposit CSPR as collateral.
    /// Creates the position on first deposit, otherwise adds to it.
    /// Rejected while a withdrawal is pending.
    #[odra(payable)]
    pub fn deposit(&mut self) {
        self.admin.require_not_paused();
        let caller = self.env().caller();
        let amount = self.env().attached_value();

        let status = self.vault_status.get(&caller).unwrap_or_default();
        if status == VaultStatus::Withdrawing {
            self.env().revert(VaultError::WithdrawPending);
        }
        if amount == U512::zero() {
            self.env().revert(VaultError::ZeroAmount);
        }

        self.accrue_interest(caller);

        let current = self.collateral.get(&caller).unwrap_or_default();
        let new_collateral = current + amount;
        self.collateral.set(&caller, new_collateral);

        let total = self.total_collateral.get_or_default();
        self.total_collateral.set(total + amount);

        self.vault_status.set(&caller, VaultStatus::Active);

        self.staking.record_inbound(amount);

        self.env().emit_event(events::Deposited {
            user: caller,
            amount_motes: amount,
            new_collateral_motes: new_collateral,
        });
    }

    /// Alias for deposit - add more collateral to an existing position
    #[odra(payable)]
    pub fn add_collateral(&mut self) {
        self.deposit();
    }

    /// Borrow mCSPR against collateral.
    /// Reverts if the resulting LTV exceeds 80%.
    pub fn borrow(&mut self, amount_wad: U256) {
        self.admin.require_not_paused();
        let caller = self.env().caller();

        if amount_wad == U256::zero() {
            self.env().revert(VaultError::ZeroAmount);
        }

        let status = self.vault_status.get(&caller).unwrap_or_default();
        if status == VaultStatus::None {
            self.env().revert(VaultError::NoVault);
        }
        if status == VaultStatus::Withdrawing {
            self.env().revert(VaultError::WithdrawPending);
        }

        self.accrue_interest(caller);

        let current_debt = self.debt_principal.get(&caller).unwrap_or_default();
        let new_debt = current_debt
            .checked_add(amount_wad)
            .unwrap_or_else(|| self.env().revert(VaultError::Overflow));

        let collateral_motes = self.collateral.get(&caller).unwrap_or_default();
        let max_debt = math::max_borrow_wad(collateral_motes)
            .unwrap_or_else(|e| self.env().revert(e));

        if new_debt > max_debt {
            self.env().revert(VaultError::LtvExceeded);
        }

        self.debt_principal.set(&caller, new_debt);
        let total = self.total_debt_principal.get_or_default();
        self.total_debt_principal.set(total + amount_wad);

        let mut token = self.debt_token_ref();
        token.mint(caller, amount_wad);

        self.env().emit_event(events::Borrowed {
            user: caller,
            amount_wad,
            new_debt_wad: new_debt,
        });
    }

    /// Repay mCSPR debt.
    /// Uses approve -> transfer_from -> burn pattern.
    /// Amounts above the current debt are capped at the debt.
    pub fn repay(&mut self, amount_wad: U256) {
        self.admin.require_not_paused();
        let caller = self.env().caller();

        if amount_wad == U256::zero() {
            self.env().revert(VaultError::ZeroAmount);
        }

        self.accrue_interest(caller);

        let current_debt = self.debt_principal.get(&caller).unwrap_or_default();
        if current_debt == U256::zero() {
            self.env().revert(VaultError::InsufficientDebt);
        }

        let repay_amount = if amount_wad > current_debt {
            current_debt
        } else {
            amount_wad
        };

        self.pull_and_burn(caller, repay_amount);

        let new_debt = current_debt - repay_amount;
        self.debt_principal.set(&caller, new_debt);
        let total = self.total_debt_principal.get_or_default();
        if total >= repay_amount {
            self.total_debt_principal.set(total - repay_amount);
        }

        self.env().emit_event(events::Repaid {
            user: caller,
            amount_wad: repay_amount,
            new_debt_wad: new_debt,
        });
    }

    /// Repay all debt including accrued interest.
    /// The approved allowance must cover the post-accrual debt.
    pub fn repay_all(&mut self) {
        self.admin.require_not_paused();
        let caller = self.env().caller();

        self.accrue_interest(caller);

        let current_debt = self.debt_principal.get(&caller).unwrap_or_default();
        if current_debt == U256::zero() {
            self.env().revert(VaultError::InsufficientDebt);
        }

        self.pull_and_burn(caller, current_debt);

        self.debt_principal.set(&caller, U256::zero());
        let total = self.total_debt_principal.get_or_default();
        if total >= current_debt {
            self.total_debt_principal.set(total - current_debt);
        }

        self.env().emit_event(events::Repaid {
            user: caller,
            amount_wad: current_debt,
            new_debt_wad: U256::zero(),
        });
    }

    /// Request withdrawal of collateral.
    /// Reverts if the remaining collateral would violate the LTV cap.
    /// Settles in the same call when the purse covers the amount,
    /// otherwise undelegates the shortfall and parks the position in
    /// the Withdrawing state until `finalize_withdraw`.
    pub fn request_withdraw(&mut self, amount_motes: U512) {
        self.admin.require_not_paused();
        let caller = self.env().caller();

        let status = self.vault_status.get(&caller).unwrap_or_default();
        if status == VaultStatus::Withdrawing {
            self.env().revert(VaultError::WithdrawPending);
        }
        if amount_motes == U512::zero() {
            self.env().revert(VaultError::ZeroAmount);
        }

        self.accrue_interest(caller);

        let current_collateral = self.collateral.get(&caller).unwrap_or_default();
        if amount_motes > current_collateral {
            self.env().revert(VaultError::InsufficientCollateral);
        }

        let remaining_collateral = current_collateral - amount_motes;
        let debt = self.debt_principal.get(&caller).unwrap_or_default();

        if debt > U256::zero() {
            let max_debt = math::max_borrow_wad(remaining_collateral)
                .unwrap_or_else(|e| self.env().revert(e));
            if debt > max_debt {
                self.env().revert(VaultError::LtvExceeded);
            }
        }

        self.collateral.set(&caller, remaining_collateral);
        let total = self.total_collateral.get_or_default();
        if total >= amount_motes {
            self.total_collateral.set(total - amount_motes);
        }

        self.settle_or_queue(caller, amount_motes, remaining_collateral, debt);
    }

    /// Withdraw the maximum collateral the LTV cap allows.
    /// The minimum collateral kept for the debt rounds up, so the
    /// position can never land above the cap.
    pub fn withdraw_max(&mut self) {
        self.admin.require_not_paused();
        let caller = self.env().caller();

        let status = self.vault_status.get(&caller).unwrap_or_default();
        if status == VaultStatus::None {
            self.env().revert(VaultError::NoVault);
        }
        if status == VaultStatus::Withdrawing {
            self.env().revert(VaultError::WithdrawPending);
        }

        self.accrue_interest(caller);

        let current_collateral = self.collateral.get(&caller).unwrap_or_default();
        if current_collateral == U512::zero() {
            self.env().revert(VaultError::InsufficientCollateral);
        }

        let debt = self.debt_principal.get(&caller).unwrap_or_default();

        let max_withdraw_motes = if debt == U256::zero() {
            current_collateral
        } else {
            let min_collateral = math::min_collateral_for_debt(debt)
                .unwrap_or_else(|e| self.env().revert(e));
            if min_collateral >= current_collateral {
                self.env().revert(VaultError::LtvExceeded);
            }
            current_collateral - min_collateral
        };

        let remaining_collateral = current_collateral - max_withdraw_motes;
        self.collateral.set(&caller, remaining_collateral);
        let total = self.total_collateral.get_or_default();
        if total >= max_withdraw_motes {
            self.total_collateral.set(total - max_withdraw_motes);
        }

        self.settle_or_queue(caller, max_withdraw_motes, remaining_collateral, debt);
    }

    /// Finalize a pending withdrawal after unbonding completes.
    pub fn finalize_withdraw(&mut self) {
        self.admin.require_not_paused();
        let caller = self.env().caller();

        let status = self.vault_status.get(&caller).unwrap_or_default();
        if status != VaultStatus::Withdrawing {
            self.env().revert(VaultError::NoWithdrawPending);
        }

        let pending = self.pending_withdraw.get(&caller).unwrap_or_default();
        if pending == U512::zero() {
            self.env().revert(VaultError::NoWithdrawPending);
        }

        // Reverts with UnbondingNotComplete while the purse cannot cover it
        self.staking.try_settle(caller, pending);

        self.pending_withdraw.set(&caller, U512::zero());

        let remaining_collateral = self.collateral.get(&caller).unwrap_or_default();
        let remaining_debt = self.debt_principal.get(&caller).unwrap_or_default();
        if remaining_collateral == U512::zero() && remaining_debt == U256::zero() {
            self.vault_status.set(&caller, VaultStatus::None);
        } else {
            self.vault_status.set(&caller, VaultStatus::Active);
        }

        self.env().emit_event(events::WithdrawFinalized {
            user: caller,
            amount_motes: pending,
        });
    }

    // ==========================================
    // View Functions
    // ==========================================

    /// Get complete position info for user
    pub fn get_position(&self, user: Address) -> PositionInfo {
        let collateral_motes = self.collateral.get(&user).unwrap_or_default();
        let collateral_wad = math::motes_to_wad(collateral_motes)
            .unwrap_or_else(|e| self.env().revert(e));
        let debt_wad = self.debt_with_interest(user);
        let pending_withdraw_motes = self.pending_withdraw.get(&user).unwrap_or_default();

        PositionInfo {
            collateral_motes,
            collateral_wad,
            debt_wad,
            ltv_bps: self.ltv_of(user),
            health_factor: self.health_factor_of(user),
            pending_withdraw_motes,
            status: self.status_of(user),
        }
    }

    /// Get collateral in motes
    pub fn collateral_of(&self, user: Address) -> U512 {
        self.collateral.get(&user).unwrap_or_default()
    }

    /// Get debt with accrued interest in wad (read-only projection)
    pub fn debt_of(&self, user: Address) -> U256 {
        self.debt_with_interest(user)
    }

    /// Get current LTV in basis points
    pub fn ltv_of(&self, user: Address) -> u64 {
        let collateral_motes = self.collateral.get(&user).unwrap_or_default();
        if collateral_motes == U512::zero() {
            return 0;
        }
        let collateral_wad = math::motes_to_wad(collateral_motes)
            .unwrap_or_else(|e| self.env().revert(e));
        let debt_wad = self.debt_with_interest(user);
        let ltv = debt_wad * U256::from(math::BPS_DIVISOR) / collateral_wad;
        ltv.as_u64()
    }

    /// Get health factor (scaled by 10000, >10000 = healthy)
    pub fn health_factor_of(&self, user: Address) -> u64 {
        let debt_wad = self.debt_with_interest(user);
        if debt_wad == U256::zero() {
            return u64::MAX;
        }
        let collateral_motes = self.collateral.get(&user).unwrap_or_default();
        let max_borrow = math::max_borrow_wad(collateral_motes)
            .unwrap_or_else(|e| self.env().revert(e));
        let hf = max_borrow * U256::from(math::BPS_DIVISOR) / debt_wad;
        if hf > U256::from(u64::MAX) {
            u64::MAX
        } else {
            hf.as_u64()
        }
    }

    /// Get pending withdraw amount
    pub fn pending_withdraw_of(&self, user: Address) -> U512 {
        self.pending_withdraw.get(&user).unwrap_or_default()
    }

    /// Get maximum withdrawable amount while keeping the LTV valid.
    /// Returns 0 if nothing can be withdrawn.
    pub fn max_withdraw_of(&self, user: Address) -> U512 {
        let current_collateral = self.collateral.get(&user).unwrap_or_default();
        if current_collateral == U512::zero() {
            return U512::zero();
        }

        let debt = self.debt_with_interest(user);
        if debt == U256::zero() {
            return current_collateral;
        }

        let min_collateral = math::min_collateral_for_debt(debt)
            .unwrap_or_else(|e| self.env().revert(e));
        if min_collateral >= current_collateral {
            return U512::zero();
        }
        current_collateral - min_collateral
    }

    /// Get vault status
    pub fn status_of(&self, user: Address) -> u8 {
        match self.vault_status.get(&user).unwrap_or_default() {
            VaultStatus::None => 0,
            VaultStatus::Active => 1,
            VaultStatus::Withdrawing => 2,
        }
    }

    /// Get the contract's liquid CSPR balance
    pub fn liquid_balance(&self) -> U512 {
        self.staking.liquid_balance()
    }

    /// Get total delegated amount (tracked)
    pub fn total_delegated(&self) -> U512 {
        self.staking.total_delegated()
    }

    /// Get actual delegated amount from chain
    pub fn delegated_amount(&self) -> U512 {
        self.staking.delegated_amount()
    }

    /// Get pending to delegate (batching pool)
    pub fn pending_to_delegate(&self) -> U512 {
        self.staking.pending_to_delegate()
    }

    /// Get total collateral across all users
    pub fn total_collateral(&self) -> U512 {
        self.total_collateral.get_or_default()
    }

    /// Get total debt principal across all users
    pub fn total_debt_principal(&self) -> U256 {
        self.total_debt_principal.get_or_default()
    }

    /// Get the debt token address
    pub fn debt_token(&self) -> Option<Address> {
        self.debt_token.get()
    }

    /// Get validator public key
    pub fn validator_public_key(&self) -> String {
        self.staking.validator_public_key()
    }

    /// Get contract owner
    pub fn owner(&self) -> Option<Address> {
        self.admin.owner()
    }

    /// Check if paused
    pub fn is_paused(&self) -> bool {
        self.admin.is_paused()
    }

    // ==========================================
    // Admin Functions
    // ==========================================

    /// Set validator public key (owner only).
    /// Existing delegation is not migrated.
    pub fn set_validator(&mut self, new_key: String) {
        self.admin.require_owner();
        self.staking.set_validator(new_key.clone());
        self.env().emit_event(events::ValidatorSet {
            new_validator_key: new_key,
        });
    }

    /// Pause contract (owner only)
    pub fn pause(&mut self) {
        self.admin.pause();
    }

    /// Unpause contract (owner only)
    pub fn unpause(&mut self) {
        self.admin.unpause();
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    /// Block time in seconds. The host clock ticks in milliseconds; the
    /// interest formula is specified at second granularity.
    fn now_seconds(&self) -> u64 {
        self.env().get_block_time() / 1000
    }

    /// Accrue interest for user (updates state).
    /// Interest is minted to the vault's own account so the token supply
    /// stays equal to the total debt principal.
    fn accrue_interest(&mut self, user: Address) {
        let now = self.now_seconds();
        let principal = self.debt_principal.get(&user).unwrap_or_default();
        if principal == U256::zero() {
            self.last_accrual_ts.set(&user, now);
            return;
        }

        let last_ts = self.last_accrual_ts.get(&user).unwrap_or(now);
        if now <= last_ts {
            return;
        }

        let interest = interest::interest_due(principal, now - last_ts)
            .unwrap_or_else(|e| self.env().revert(e));

        if interest > U256::zero() {
            let new_principal = principal + interest;
            self.debt_principal.set(&user, new_principal);

            let total = self.total_debt_principal.get_or_default();
            self.total_debt_principal.set(total + interest);

            let vault = self.env().self_address();
            let mut token = self.debt_token_ref();
            token.mint(vault, interest);

            self.env().emit_event(events::InterestAccrued {
                user,
                amount_wad: interest,
            });
        }

        self.last_accrual_ts.set(&user, now);
    }

    /// Calculate debt with interest (read-only, doesn't update state)
    fn debt_with_interest(&self, user: Address) -> U256 {
        let principal = self.debt_principal.get(&user).unwrap_or_default();
        if principal == U256::zero() {
            return U256::zero();
        }

        let now = self.now_seconds();
        let last_ts = self.last_accrual_ts.get(&user).unwrap_or(now);
        if now <= last_ts {
            return principal;
        }

        let interest = interest::interest_due(principal, now - last_ts)
            .unwrap_or_else(|e| self.env().revert(e));
        principal + interest
    }

    /// Pull `amount` of mCSPR from `from` and burn it.
    /// Requires a prior approve covering the amount.
    fn pull_and_burn(&mut self, from: Address, amount: U256) {
        let vault = self.env().self_address();
        let mut token = self.debt_token_ref();

        let allowance = token.allowance(from, vault);
        if allowance < amount {
            self.env().revert(VaultError::InsufficientAllowance);
        }

        token.transfer_from(from, vault, amount);
        token.burn(vault, amount);
    }

    /// Hand the withdrawn amount to the delegation adapter and settle it
    /// immediately when the reservation is liquid, otherwise park the
    /// position in the Withdrawing state.
    fn settle_or_queue(
        &mut self,
        caller: Address,
        amount_motes: U512,
        remaining_collateral: U512,
        debt: U256,
    ) {
        match self.staking.request_outbound(amount_motes) {
            Settlement::Liquid => {
                self.staking.try_settle(caller, amount_motes);
                self.pending_withdraw.set(&caller, U512::zero());
                if remaining_collateral == U512::zero() && debt == U256::zero() {
                    self.vault_status.set(&caller, VaultStatus::None);
                } else {
                    self.vault_status.set(&caller, VaultStatus::Active);
                }
                self.env().emit_event(events::WithdrawRequested {
                    user: caller,
                    amount_motes,
                });
                self.env().emit_event(events::WithdrawFinalized {
                    user: caller,
                    amount_motes,
                });
            }
            Settlement::Unbonding => {
                self.pending_withdraw.set(&caller, amount_motes);
                self.vault_status.set(&caller, VaultStatus::Withdrawing);
                self.env().emit_event(events::WithdrawRequested {
                    user: caller,
                    amount_motes,
                });
            }
        }
    }

    fn debt_token_ref(&self) -> DebtTokenContractRef {
        let addr = self.debt_token.get().expect("debt token not set");
        DebtTokenContractRef::new(self.env().clone(), addr)
    }
}
