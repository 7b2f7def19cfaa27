//! Accrual arithmetic, no contracts involved

use odra::casper_types::U256;

use term_pool_casper::accrual::{
    accrual_anchor, daily_interest, day_duration, day_dust, day_elapsed, staker_share,
    within_window, ScheduleProgress,
};
use term_pool_casper::gate::WithdrawalPolicy;

fn u(value: u64) -> U256 {
    U256::from(value)
}

#[test]
fn test_day_duration() {
    assert_eq!(day_duration(0, 3_000, 3), 1_000);
    assert_eq!(day_duration(100, 3_102, 3), 1_000);
    assert_eq!(day_duration(100, 100, 3), 0);
    assert_eq!(day_duration(200, 100, 3), 0);
    assert_eq!(day_duration(0, 3_000, 0), 0);
}

#[test]
fn test_daily_interest_truncates() {
    assert_eq!(daily_interest(u(300), 3), u(100));
    assert_eq!(daily_interest(u(1_000), 3), u(333));
    assert_eq!(daily_interest(u(2), 3), U256::zero());
    assert_eq!(daily_interest(u(300), 0), U256::zero());
}

#[test]
fn test_share_divides_before_multiplying() {
    // 100 / 30 = 3, times 10
    assert_eq!(staker_share(u(100), u(30), u(10)), u(30));
    // Multiplying first would give 33
    assert_ne!(staker_share(u(100), u(30), u(10)), u(100) * u(10) / u(30));
    // Stake larger than the daily slice earns nothing
    assert_eq!(staker_share(u(100), u(101), u(50)), U256::zero());
    assert_eq!(staker_share(u(100), U256::zero(), u(10)), U256::zero());
    assert_eq!(staker_share(u(100), u(30), U256::zero()), U256::zero());
}

#[test]
fn test_shares_never_exceed_daily() {
    let daily = u(333);
    let balances = [u(7), u(11), u(13)];
    let total = balances.iter().fold(U256::zero(), |acc, b| acc + *b);
    let distributed = balances
        .iter()
        .fold(U256::zero(), |acc, b| acc + staker_share(daily, total, *b));

    assert_eq!(distributed, u(310));
    assert_eq!(day_dust(daily, distributed), u(23));
}

#[test]
fn test_anchor_and_elapsed() {
    assert_eq!(accrual_anchor(1_000, 0), 1_000);
    assert_eq!(accrual_anchor(1_000, 2_500), 2_500);

    assert!(!day_elapsed(999, 1_000, 100));
    assert!(!day_elapsed(1_099, 1_000, 100));
    assert!(day_elapsed(1_100, 1_000, 100));
    assert!(day_elapsed(5_000, 1_000, 100));
}

#[test]
fn test_window_is_half_open() {
    assert!(!within_window(99, 100, 200));
    assert!(within_window(100, 100, 200));
    assert!(within_window(199, 100, 200));
    assert!(!within_window(200, 100, 200));
}

#[test]
fn test_schedule_progress() {
    let fresh = ScheduleProgress {
        initialized: false,
        current_day: 0,
        staking_days: 0,
    };
    assert_eq!(fresh.next_day(), None);
    assert!(!fresh.is_complete());

    let mut progress = ScheduleProgress {
        initialized: true,
        current_day: 0,
        staking_days: 3,
    };
    assert_eq!(progress.next_day(), Some(1));
    progress.current_day = 2;
    assert_eq!(progress.next_day(), Some(3));
    progress.current_day = 3;
    assert_eq!(progress.next_day(), None);
    assert!(progress.is_complete());
}

#[test]
fn test_withdrawal_gates() {
    let mid = ScheduleProgress {
        initialized: true,
        current_day: 1,
        staking_days: 3,
    };
    let done = ScheduleProgress {
        current_day: 3,
        ..mid
    };
    let uninitialized = ScheduleProgress {
        initialized: false,
        ..done
    };

    let locked = WithdrawalPolicy::Locked.gate();
    assert!(!locked.permits(&mid));
    assert!(locked.permits(&done));
    assert!(!locked.permits(&uninitialized));

    let immediate = WithdrawalPolicy::Immediate.gate();
    assert!(immediate.permits(&mid));
    assert!(immediate.permits(&done));
    assert!(!immediate.permits(&uninitialized));
}
