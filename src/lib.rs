//! Fixed-Term Staking Pool (Odra)
//!
//! Casper contracts for a day-based staking pool with a pre-funded interest
//! budget.
//! - StakingPool: staking, operator-driven daily accrual, withdrawals
//! - FungibleToken: CEP-18 token for stake and interest assets
//!
//! A pool is parameterized at deployment by its stake asset (native CSPR or
//! CEP-18) and its withdrawal policy (locked until maturity or immediate).

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

pub mod accrual;
pub mod asset;
pub mod gate;
pub mod pool;
pub mod tokens;
