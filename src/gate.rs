//! Withdrawal policies.

use odra::prelude::*;

use crate::accrual::ScheduleProgress;

/// Chosen at pool construction, fixed afterwards.
#[odra::odra_type]
#[derive(Default)]
pub enum WithdrawalPolicy {
    /// Principal and interest stay locked until every day has been accrued.
    #[default]
    Locked = 0,
    /// Withdraw at any point once the pool is initialized.
    Immediate = 1,
}

impl WithdrawalPolicy {
    pub fn gate(&self) -> &'static dyn WithdrawalGate {
        match self {
            WithdrawalPolicy::Locked => &LockedUntilMaturity,
            WithdrawalPolicy::Immediate => &Anytime,
        }
    }
}

/// Decides whether `principal_withdraw` / `interest_withdraw` may run.
pub trait WithdrawalGate {
    fn permits(&self, progress: &ScheduleProgress) -> bool;
}

pub struct LockedUntilMaturity;

impl WithdrawalGate for LockedUntilMaturity {
    fn permits(&self, progress: &ScheduleProgress) -> bool {
        progress.initialized && progress.current_day == progress.staking_days
    }
}

pub struct Anytime;

impl WithdrawalGate for Anytime {
    fn permits(&self, progress: &ScheduleProgress) -> bool {
        progress.initialized
    }
}
