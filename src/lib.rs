//! Magni V2 — CSPR Collateral/Debt Vault (Odra)
//!
//! This crate implements the Magni V2 vault on Casper using the Odra framework.
//! - mCSPR: synthetic token mintable only by the vault
//! - Magni: core vault contract (deposit/borrow/repay/withdraw) with pooled
//!   delegation of collateral to a configured validator

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

pub mod admin;
pub mod delegation;
pub mod errors;
pub mod events;
pub mod interest;
pub mod math;
pub mod tokens;
pub mod vault;
