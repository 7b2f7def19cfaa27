//! Day-based accrual arithmetic
//!
//! Pure functions shared by every pool variant. Amounts are CEP-18 units
//! (U256), times are block time in milliseconds.
//!
//! Rounding: a staker's share is `daily / stake_total * balance`. The division
//! runs first, so both remainders (budget / days and daily / stake_total) stay
//! in the pool as dust.

use odra::casper_types::U256;

/// Progress through the fixed accrual schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleProgress {
    pub initialized: bool,
    pub current_day: u32,
    pub staking_days: u32,
}

impl ScheduleProgress {
    /// Every scheduled day has been accrued.
    pub fn is_complete(&self) -> bool {
        self.initialized && self.current_day >= self.staking_days
    }

    /// Index of the day the next `calculate` would commit, if any is left.
    pub fn next_day(&self) -> Option<u32> {
        if !self.initialized || self.is_complete() {
            return None;
        }
        Some(self.current_day + 1)
    }
}

/// Length of one accrual day. The remainder of the window is not spread.
pub fn day_duration(start: u64, end: u64, staking_days: u32) -> u64 {
    if staking_days == 0 || end <= start {
        return 0;
    }
    (end - start) / staking_days as u64
}

/// Nominal slice of the budget released per day.
pub fn daily_interest(interest_total: U256, staking_days: u32) -> U256 {
    if staking_days == 0 {
        return U256::zero();
    }
    interest_total / U256::from(staking_days)
}

/// Interest credited to one staker for one day.
///
/// Divides before multiplying. Reordering changes the result and must not be
/// done.
pub fn staker_share(daily: U256, stake_total: U256, balance: U256) -> U256 {
    if stake_total.is_zero() || balance.is_zero() {
        return U256::zero();
    }
    (daily / stake_total) * balance
}

/// The point a new day is measured from: the later of the schedule start
/// and the previous accrual.
pub fn accrual_anchor(start: u64, last_accrual: u64) -> u64 {
    start.max(last_accrual)
}

/// True once a full day has passed since `anchor`.
pub fn day_elapsed(now: u64, anchor: u64, duration: u64) -> bool {
    now >= anchor && now - anchor >= duration
}

/// True while `now` lies in `[start, end)`.
pub fn within_window(now: u64, start: u64, end: u64) -> bool {
    now >= start && now < end
}

/// Part of the daily slice that no staker received.
pub fn day_dust(daily: U256, distributed: U256) -> U256 {
    daily.saturating_sub(distributed)
}
