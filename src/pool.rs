//! Fixed-Term Staking Pool Contract
//!
//! Stakers lock a stake asset for a fixed number of days. The operator funds
//! an interest budget up front and triggers one accrual per elapsed day; each
//! accrual splits that day's slice of the budget across stakers pro-rata to
//! their balance at that instant.
//!
//! - Stake asset: native CSPR (payable) or a CEP-18 token
//! - Interest asset: always a CEP-18 token
//! - Withdrawal policy: locked until the last day, or immediate
//!
//! Every entrypoint either applies fully or reverts with no effect.
//!
//! ## Invariants
//! - `stake_total == Σ balance_of(s)` (checked on every accrual)
//! - `interest_credited_of(s) == Σ_d day_interest_of(s, d)
//!    == interest_of(s) + interest_withdrawn_of(s)`
//! - `interest_total - interest_rest == current_day * daily_interest`
//! - `day_interest_of(s, d)` is written at most once

use odra::casper_types::U256;
use odra::prelude::*;

use crate::accrual::{self, ScheduleProgress};
use crate::asset::{self, AssetAdapter, StakeAssetKind, TokenAsset};
use crate::gate::WithdrawalPolicy;
use alloc::boxed::Box;

// ==========================================
// Events
// ==========================================

pub mod events {
    use odra::casper_types::U256;
    use odra::prelude::*;

    #[odra::event]
    pub struct PoolInitialized {
        pub operator: Address,
        pub interest_total: U256,
        pub start_time: u64,
        pub end_time: u64,
        pub staking_days: u32,
        pub day_duration: u64,
    }

    #[odra::event]
    pub struct Staked {
        pub staker: Address,
        pub amount: U256,
        pub new_balance: U256,
        pub stake_total: U256,
    }

    #[odra::event]
    pub struct InterestCredited {
        pub staker: Address,
        pub day: u32,
        pub amount: U256,
    }

    #[odra::event]
    pub struct DayCalculated {
        pub day: u32,
        pub daily_interest: U256,
        pub stake_total: U256,
        pub distributed: U256,
        pub dust: U256,
        pub interest_rest: U256,
    }

    #[odra::event]
    pub struct PrincipalWithdrawn {
        pub staker: Address,
        pub amount: U256,
        pub new_balance: U256,
    }

    #[odra::event]
    pub struct InterestWithdrawn {
        pub staker: Address,
        pub amount: U256,
        pub new_interest: U256,
    }
}

// ==========================================
// Types
// ==========================================

/// Ledger entry of one staker, returned by `position_of`
#[odra::odra_type]
pub struct StakerPosition {
    pub balance: U256,
    pub interest_accrued: U256,
    pub interest_credited: U256,
    pub interest_withdrawn: U256,
}

/// Pool-wide state, returned by `pool_info`
#[odra::odra_type]
pub struct PoolInfo {
    pub is_initialize: bool,
    pub interest_total: U256,
    pub interest_rest: U256,
    pub stake_total: U256,
    pub start_time: u64,
    pub end_time: u64,
    pub staking_days: u32,
    pub day_duration: u64,
    pub current_day: u32,
    pub stakers_count: u32,
}

// ==========================================
// Errors
// ==========================================

#[odra::odra_error]
pub enum PoolError {
    // Lifecycle
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    InvalidSchedule = 4,
    OutsideStakingWindow = 5,
    ScheduleComplete = 6,
    DayNotElapsed = 7,
    WithdrawalLocked = 8,
    InvalidStakeAsset = 9,

    // Input
    ZeroAmount = 20,
    AttachedValueMismatch = 21,
    UnexpectedAttachedValue = 22,
    AmountOverflow = 23,

    // Insufficient funds
    InsufficientBalance = 30,
    InsufficientInterest = 31,
    InsufficientAllowance = 32,
    InsufficientFunds = 33,

    // Internal consistency
    CustodyShortfall = 40,
    DayAlreadyRecorded = 41,
    LedgerMismatch = 42,
}

// ==========================================
// Contract
// ==========================================

#[odra::module(
    events = [
        events::PoolInitialized,
        events::Staked,
        events::InterestCredited,
        events::DayCalculated,
        events::PrincipalWithdrawn,
        events::InterestWithdrawn
    ],
    errors = PoolError
)]
pub struct StakingPool {
    // Fixed at deployment
    operator: Var<Address>,
    stake_asset_kind: Var<StakeAssetKind>,
    stake_token: Var<Address>,
    stake_symbol: Var<String>,
    interest_token: Var<Address>,
    interest_symbol: Var<String>,
    withdrawal_policy: Var<WithdrawalPolicy>,

    // Fixed by initialize
    is_initialize: Var<bool>,
    interest_total: Var<U256>,
    start_time: Var<u64>,
    end_time: Var<u64>,
    staking_days: Var<u32>,
    day_duration: Var<u64>,

    // Accrual progress
    interest_rest: Var<U256>,
    current_day: Var<u32>,
    last_accrual_time: Var<u64>,
    interest_credited_total: Var<U256>,

    // Ledger
    stake_total: Var<U256>,
    balances: Mapping<Address, U256>,
    interest_accrued: Mapping<Address, U256>,
    interest_credited: Mapping<Address, U256>,
    interest_withdrawn: Mapping<Address, U256>,
    day_interest: Mapping<(Address, u32), U256>,

    // Everyone who ever staked, in first-stake order. Never shrinks.
    stakers: List<Address>,
    is_staker: Mapping<Address, bool>,
}

#[odra::module]
impl StakingPool {
    // ==========================================
    // Construction
    // ==========================================

    /// Deploy a pool. The deployer becomes the operator.
    ///
    /// `stake_token` must be set for a token-staked pool and absent for a
    /// native one.
    pub fn init(
        &mut self,
        stake_asset_kind: StakeAssetKind,
        stake_token: Option<Address>,
        stake_symbol: String,
        interest_token: Address,
        interest_symbol: String,
        withdrawal_policy: WithdrawalPolicy,
    ) {
        match (&stake_asset_kind, stake_token) {
            (StakeAssetKind::Native, None) => {}
            (StakeAssetKind::Token, Some(token)) => self.stake_token.set(token),
            _ => self.env().revert(PoolError::InvalidStakeAsset),
        }

        self.operator.set(self.env().caller());
        self.stake_asset_kind.set(stake_asset_kind);
        self.stake_symbol.set(stake_symbol);
        self.interest_token.set(interest_token);
        self.interest_symbol.set(interest_symbol);
        self.withdrawal_policy.set(withdrawal_policy);

        self.is_initialize.set(false);
        self.interest_total.set(U256::zero());
        self.interest_rest.set(U256::zero());
        self.stake_total.set(U256::zero());
        self.current_day.set(0);
        self.interest_credited_total.set(U256::zero());
    }

    /// Fix the schedule and pull the interest budget from the operator.
    /// Requires a prior `approve` of `interest_amount` on the interest token.
    pub fn initialize(&mut self, interest_amount: U256, start: u64, end: u64, days: u32) {
        if self.is_initialize.get_or_default() {
            self.env().revert(PoolError::AlreadyInitialized);
        }
        self.require_operator();

        if interest_amount.is_zero() {
            self.env().revert(PoolError::ZeroAmount);
        }
        if days == 0 || start >= end {
            self.env().revert(PoolError::InvalidSchedule);
        }
        let day_duration = accrual::day_duration(start, end, days);
        if day_duration == 0 {
            self.env().revert(PoolError::InvalidSchedule);
        }

        let operator = self.env().caller();
        self.interest_asset().pull(operator, interest_amount);

        self.interest_total.set(interest_amount);
        self.interest_rest.set(interest_amount);
        self.start_time.set(start);
        self.end_time.set(end);
        self.staking_days.set(days);
        self.day_duration.set(day_duration);
        self.current_day.set(0);
        self.last_accrual_time.set(start);
        self.is_initialize.set(true);

        self.env().emit_event(events::PoolInitialized {
            operator,
            interest_total: interest_amount,
            start_time: start,
            end_time: end,
            staking_days: days,
            day_duration,
        });
    }

    // ==========================================
    // Staker Functions
    // ==========================================

    /// Add `amount` to the caller's stake.
    ///
    /// Native pools expect exactly `amount` motes attached; token pools pull
    /// `amount` through a prior `approve` and reject attached value.
    #[odra(payable)]
    pub fn stake(&mut self, amount: U256) {
        self.require_initialized();

        let now = self.env().get_block_time();
        if !accrual::within_window(now, self.start_time.get_or_default(), self.end_time.get_or_default()) {
            self.env().revert(PoolError::OutsideStakingWindow);
        }
        if amount.is_zero() {
            self.env().revert(PoolError::ZeroAmount);
        }

        let caller = self.env().caller();
        self.stake_asset().pull(caller, amount);

        let new_balance = self
            .balance_of(caller)
            .checked_add(amount)
            .unwrap_or_else(|| self.env().revert(PoolError::AmountOverflow));
        let new_total = self
            .stake_total()
            .checked_add(amount)
            .unwrap_or_else(|| self.env().revert(PoolError::AmountOverflow));

        self.balances.set(&caller, new_balance);
        self.stake_total.set(new_total);
        self.register_staker(caller);

        self.env().emit_event(events::Staked {
            staker: caller,
            amount,
            new_balance,
            stake_total: new_total,
        });
    }

    /// Return `amount` of principal to the caller.
    pub fn principal_withdraw(&mut self, amount: U256) {
        self.require_withdrawable();
        if amount.is_zero() {
            self.env().revert(PoolError::ZeroAmount);
        }

        let caller = self.env().caller();
        let balance = self.balance_of(caller);
        if amount > balance {
            self.env().revert(PoolError::InsufficientBalance);
        }

        let total = self.stake_total();
        if total < amount {
            self.env().revert(PoolError::LedgerMismatch);
        }

        let new_balance = balance - amount;
        self.balances.set(&caller, new_balance);
        self.stake_total.set(total - amount);

        self.stake_asset().push(caller, amount);

        self.env().emit_event(events::PrincipalWithdrawn {
            staker: caller,
            amount,
            new_balance,
        });
    }

    /// Pay out `amount` of accrued interest to the caller.
    pub fn interest_withdraw(&mut self, amount: U256) {
        self.require_withdrawable();
        if amount.is_zero() {
            self.env().revert(PoolError::ZeroAmount);
        }

        let caller = self.env().caller();
        let accrued = self.interest_of(caller);
        if amount > accrued {
            self.env().revert(PoolError::InsufficientInterest);
        }

        let new_interest = accrued - amount;
        self.interest_accrued.set(&caller, new_interest);
        let withdrawn = self.interest_withdrawn_of(caller);
        self.interest_withdrawn.set(&caller, withdrawn + amount);

        self.interest_asset().push(caller, amount);

        self.env().emit_event(events::InterestWithdrawn {
            staker: caller,
            amount,
            new_interest,
        });
    }

    // ==========================================
    // Operator Functions
    // ==========================================

    /// Commit one day of accrual.
    ///
    /// The day's slice is split over the balances held right now; stakers
    /// with a zero balance get no entry for this day. Fails once every day
    /// has been accrued, or if less than a day has passed since the later of
    /// the start time and the previous accrual.
    pub fn calculate(&mut self) {
        self.require_operator();
        self.require_initialized();

        let progress = self.progress();
        let day = progress
            .next_day()
            .unwrap_or_else(|| self.env().revert(PoolError::ScheduleComplete));

        let now = self.env().get_block_time();
        let anchor = accrual::accrual_anchor(
            self.start_time.get_or_default(),
            self.last_accrual_time.get_or_default(),
        );
        if !accrual::day_elapsed(now, anchor, self.day_duration.get_or_default()) {
            self.env().revert(PoolError::DayNotElapsed);
        }

        let daily = accrual::daily_interest(self.interest_total(), progress.staking_days);
        let stake_total = self.stake_total();

        let mut distributed = U256::zero();
        let mut balance_sum = U256::zero();
        for index in 0..self.stakers.len() {
            let staker = match self.stakers.get(index) {
                Some(staker) => staker,
                None => self.env().revert(PoolError::LedgerMismatch),
            };
            let balance = self.balance_of(staker);
            balance_sum = balance_sum
                .checked_add(balance)
                .unwrap_or_else(|| self.env().revert(PoolError::LedgerMismatch));
            if balance.is_zero() {
                continue;
            }

            let share = accrual::staker_share(daily, stake_total, balance);
            self.credit_day(staker, day, share);
            distributed += share;
        }

        if balance_sum != stake_total || distributed > daily {
            self.env().revert(PoolError::LedgerMismatch);
        }

        let interest_rest = self
            .interest_rest()
            .checked_sub(daily)
            .unwrap_or_else(|| self.env().revert(PoolError::LedgerMismatch));
        self.interest_rest.set(interest_rest);
        self.interest_credited_total
            .set(self.interest_credited_total.get_or_default() + distributed);
        self.current_day.set(day);
        self.last_accrual_time.set(now);

        self.env().emit_event(events::DayCalculated {
            day,
            daily_interest: daily,
            stake_total,
            distributed,
            dust: accrual::day_dust(daily, distributed),
            interest_rest,
        });
    }

    // ==========================================
    // View Functions
    // ==========================================

    /// Current principal of `staker`
    pub fn balance_of(&self, staker: Address) -> U256 {
        self.balances.get(&staker).unwrap_or_default()
    }

    /// Interest credited to `staker` and not yet withdrawn
    pub fn interest_of(&self, staker: Address) -> U256 {
        self.interest_accrued.get(&staker).unwrap_or_default()
    }

    /// Interest credited to `staker` for `day` (1-based); zero if none
    pub fn day_interest_of(&self, staker: Address, day: u32) -> U256 {
        self.day_interest.get(&(staker, day)).unwrap_or_default()
    }

    /// Whether an entry was recorded for `staker` on `day`
    pub fn has_day_interest(&self, staker: Address, day: u32) -> bool {
        self.day_interest.get(&(staker, day)).is_some()
    }

    /// All interest ever credited to `staker`
    pub fn interest_credited_of(&self, staker: Address) -> U256 {
        self.interest_credited.get(&staker).unwrap_or_default()
    }

    /// All interest `staker` has withdrawn
    pub fn interest_withdrawn_of(&self, staker: Address) -> U256 {
        self.interest_withdrawn.get(&staker).unwrap_or_default()
    }

    pub fn position_of(&self, staker: Address) -> StakerPosition {
        StakerPosition {
            balance: self.balance_of(staker),
            interest_accrued: self.interest_of(staker),
            interest_credited: self.interest_credited_of(staker),
            interest_withdrawn: self.interest_withdrawn_of(staker),
        }
    }

    pub fn pool_info(&self) -> PoolInfo {
        PoolInfo {
            is_initialize: self.is_initialize(),
            interest_total: self.interest_total(),
            interest_rest: self.interest_rest(),
            stake_total: self.stake_total(),
            start_time: self.start_time(),
            end_time: self.end_time(),
            staking_days: self.staking_days(),
            day_duration: self.day_duration(),
            current_day: self.current_day(),
            stakers_count: self.stakers_count(),
        }
    }

    pub fn stake_total(&self) -> U256 {
        self.stake_total.get_or_default()
    }

    pub fn interest_total(&self) -> U256 {
        self.interest_total.get_or_default()
    }

    pub fn interest_rest(&self) -> U256 {
        self.interest_rest.get_or_default()
    }

    /// Budget released by completed days but credited to nobody
    pub fn undistributed_dust(&self) -> U256 {
        let released = self.interest_total() - self.interest_rest();
        released.saturating_sub(self.interest_credited_total.get_or_default())
    }

    pub fn staking_days(&self) -> u32 {
        self.staking_days.get_or_default()
    }

    pub fn current_day(&self) -> u32 {
        self.current_day.get_or_default()
    }

    pub fn is_initialize(&self) -> bool {
        self.is_initialize.get_or_default()
    }

    pub fn start_time(&self) -> u64 {
        self.start_time.get_or_default()
    }

    pub fn end_time(&self) -> u64 {
        self.end_time.get_or_default()
    }

    pub fn day_duration(&self) -> u64 {
        self.day_duration.get_or_default()
    }

    pub fn last_accrual_time(&self) -> u64 {
        self.last_accrual_time.get_or_default()
    }

    /// Whether the withdrawal policy lets stakers withdraw right now
    pub fn can_withdraw(&self) -> bool {
        self.withdrawal_policy
            .get_or_default()
            .gate()
            .permits(&self.progress())
    }

    pub fn stakers_count(&self) -> u32 {
        self.stakers.len()
    }

    pub fn staker_at(&self, index: u32) -> Option<Address> {
        self.stakers.get(index)
    }

    pub fn operator(&self) -> Option<Address> {
        self.operator.get()
    }

    pub fn stake_asset_kind(&self) -> StakeAssetKind {
        self.stake_asset_kind.get_or_default()
    }

    pub fn stake_token(&self) -> Option<Address> {
        self.stake_token.get()
    }

    pub fn interest_token(&self) -> Option<Address> {
        self.interest_token.get()
    }

    pub fn stake_symbol(&self) -> String {
        self.stake_symbol.get_or_default()
    }

    pub fn interest_symbol(&self) -> String {
        self.interest_symbol.get_or_default()
    }

    pub fn withdrawal_policy(&self) -> WithdrawalPolicy {
        self.withdrawal_policy.get_or_default()
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    fn require_operator(&self) {
        if self.operator.get() != Some(self.env().caller()) {
            self.env().revert(PoolError::Unauthorized);
        }
    }

    fn require_initialized(&self) {
        if !self.is_initialize.get_or_default() {
            self.env().revert(PoolError::NotInitialized);
        }
    }

    fn require_withdrawable(&self) {
        self.require_initialized();
        if !self.can_withdraw() {
            self.env().revert(PoolError::WithdrawalLocked);
        }
    }

    fn progress(&self) -> ScheduleProgress {
        ScheduleProgress {
            initialized: self.is_initialize.get_or_default(),
            current_day: self.current_day.get_or_default(),
            staking_days: self.staking_days.get_or_default(),
        }
    }

    fn register_staker(&mut self, staker: Address) {
        if self.is_staker.get(&staker).unwrap_or_default() {
            return;
        }
        self.is_staker.set(&staker, true);
        self.stakers.push(staker);
    }

    /// Record `share` for (`staker`, `day`). Each pair is written once.
    fn credit_day(&mut self, staker: Address, day: u32, share: U256) {
        let key = (staker, day);
        if self.day_interest.get(&key).is_some() {
            self.env().revert(PoolError::DayAlreadyRecorded);
        }
        self.day_interest.set(&key, share);

        let accrued = self.interest_of(staker);
        self.interest_accrued.set(&staker, accrued + share);
        let credited = self.interest_credited_of(staker);
        self.interest_credited.set(&staker, credited + share);

        self.env().emit_event(events::InterestCredited {
            staker,
            day,
            amount: share,
        });
    }

    fn stake_asset(&self) -> Box<dyn AssetAdapter> {
        asset::stake_adapter(
            self.env(),
            self.stake_asset_kind.get_or_default(),
            self.stake_token.get(),
        )
    }

    fn interest_asset(&self) -> TokenAsset {
        let token = self
            .interest_token
            .get()
            .unwrap_or_else(|| self.env().revert(PoolError::InvalidStakeAsset));
        TokenAsset::new(self.env(), token)
    }
}
