//! Shared fixtures for pool tests

#![allow(dead_code)]

use odra::casper_types::{U256, U512};
use odra::host::{Deployer, HostEnv, HostRef};
use odra::prelude::*;

use term_pool_casper::asset::{amount_to_motes, StakeAssetKind};
use term_pool_casper::gate::WithdrawalPolicy;
use term_pool_casper::pool::{StakingPool, StakingPoolHostRef, StakingPoolInitArgs};
use term_pool_casper::tokens::{FungibleToken, FungibleTokenHostRef, FungibleTokenInitArgs};

/// One accrual day in test block time (ms)
pub const DAY_MS: u64 = 1_000;
/// Gap between initialize and the start of the staking window
pub const START_DELAY_MS: u64 = 5_000;
pub const STAKING_DAYS: u32 = 3;

const MOTES_PER_CSPR: u64 = 1_000_000_000;

/// `whole` tokens with 18 decimals
pub fn wad(whole: u64) -> U256 {
    U256::from(whole) * U256::exp10(18)
}

/// `whole` CSPR expressed in ledger units (motes)
pub fn cspr(whole: u64) -> U256 {
    U256::from(whole) * U256::from(MOTES_PER_CSPR)
}

pub fn motes(amount: U256) -> U512 {
    amount_to_motes(amount)
}

/// Share formula as published: divide first, then multiply
pub fn expected_share(daily: U256, stake_total: U256, balance: U256) -> U256 {
    daily / stake_total * balance
}

pub fn deploy_token(env: &HostEnv, symbol: &str, supply: U256) -> FungibleTokenHostRef {
    FungibleToken::deploy(
        env,
        FungibleTokenInitArgs {
            symbol: symbol.to_string(),
            name: format!("{} Token", symbol),
            decimals: 18,
            initial_supply: supply,
        },
    )
}

pub struct Fixture {
    pub env: HostEnv,
    pub pool: StakingPoolHostRef,
    pub interest: FungibleTokenHostRef,
    pub stake_token: Option<FungibleTokenHostRef>,
    pub operator: Address,
    pub stakers: [Address; 3],
    pub budget: U256,
}

impl Fixture {
    /// Deploy tokens and a pool. Nothing is initialized yet.
    pub fn deploy(env: &HostEnv, kind: StakeAssetKind, policy: WithdrawalPolicy, budget: U256) -> Self {
        let operator = env.get_account(0);
        let stakers = [env.get_account(1), env.get_account(2), env.get_account(3)];

        env.set_caller(operator);
        let interest = deploy_token(env, "INT", budget * U256::from(10u64));

        let stake_token = match kind {
            StakeAssetKind::Native => None,
            StakeAssetKind::Token => {
                let mut token = deploy_token(env, "STK", wad(10_000));
                for staker in stakers {
                    token.transfer(staker, wad(1_000));
                }
                Some(token)
            }
        };

        let (stake_token_addr, stake_symbol) = match &stake_token {
            Some(token) => (Some(token.address()), "STK".to_string()),
            None => (None, "CSPR".to_string()),
        };

        let pool = StakingPool::deploy(
            env,
            StakingPoolInitArgs {
                stake_asset_kind: kind,
                stake_token: stake_token_addr,
                stake_symbol,
                interest_token: interest.address(),
                interest_symbol: "INT".to_string(),
                withdrawal_policy: policy,
            },
        );

        Self {
            env: env.clone(),
            pool,
            interest,
            stake_token,
            operator,
            stakers,
            budget,
        }
    }

    /// Deploy and initialize a `STAKING_DAYS` schedule starting after `START_DELAY_MS`.
    pub fn initialized(env: &HostEnv, kind: StakeAssetKind, policy: WithdrawalPolicy, budget: U256) -> Self {
        let mut fx = Self::deploy(env, kind, policy, budget);
        fx.initialize();
        fx
    }

    pub fn start(&self) -> u64 {
        self.pool.start_time()
    }

    pub fn initialize(&mut self) {
        let start = self.env.block_time() + START_DELAY_MS;
        let end = start + DAY_MS * STAKING_DAYS as u64;
        self.env.set_caller(self.operator);
        self.interest.approve(self.pool.address(), self.budget);
        self.pool.initialize(self.budget, start, end, STAKING_DAYS);
    }

    /// Move block time to the start of the staking window.
    pub fn advance_to_start(&self) {
        let now = self.env.block_time();
        let start = self.start();
        if now < start {
            self.env.advance_block_time(start - now);
        }
    }

    pub fn next_day(&self) {
        self.env.advance_block_time(DAY_MS);
    }

    /// Stake from `staker`, funding the call the way the pool's asset needs.
    pub fn stake(&mut self, staker: Address, amount: U256) {
        self.env.set_caller(staker);
        match self.stake_token.as_mut() {
            Some(token) => {
                token.approve(self.pool.address(), amount);
                self.pool.stake(amount);
            }
            None => self.pool.with_tokens(motes(amount)).stake(amount),
        }
    }

    pub fn calculate(&mut self) {
        self.env.set_caller(self.operator);
        self.pool.calculate();
    }

    pub fn daily(&self) -> U256 {
        self.budget / U256::from(STAKING_DAYS)
    }

    /// Stake asset held by `owner`, in ledger units
    pub fn stake_asset_balance(&self, owner: Address) -> U256 {
        match &self.stake_token {
            Some(token) => token.balance_of(owner),
            None => {
                let motes = self.env.balance_of(&owner);
                term_pool_casper::asset::motes_to_amount(motes).unwrap_or_default()
            }
        }
    }

    /// Ledger invariants every test can lean on.
    pub fn assert_invariants(&self) {
        let pool = &self.pool;
        let current_day = pool.current_day();

        let mut balance_sum = U256::zero();
        let mut credited_sum = U256::zero();
        for index in 0..pool.stakers_count() {
            let staker = pool.staker_at(index).unwrap();
            balance_sum += pool.balance_of(staker);

            let mut days_sum = U256::zero();
            for day in 1..=current_day {
                days_sum += pool.day_interest_of(staker, day);
            }
            assert_eq!(pool.interest_credited_of(staker), days_sum);
            assert_eq!(
                pool.interest_of(staker) + pool.interest_withdrawn_of(staker),
                days_sum
            );
            credited_sum += days_sum;
        }
        assert_eq!(pool.stake_total(), balance_sum);

        let released = pool.interest_total() - pool.interest_rest();
        assert_eq!(released, self.daily() * U256::from(current_day));
        assert_eq!(pool.undistributed_dust(), released - credited_sum);
        assert!(current_day <= pool.staking_days());
    }
}
