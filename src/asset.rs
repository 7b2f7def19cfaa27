//! Asset adapters: how value enters and leaves pool custody.
//!
//! - `NativeCoin`: CSPR attached to a payable call, paid out with a native transfer
//! - `TokenAsset`: any CEP-18 contract, pulled with `transfer_from` after an approve
//!
//! Ledger amounts are U256. Native motes are U512 and are converted at this
//! boundary only.

use alloc::boxed::Box;
use odra::casper_types::{U256, U512};
use odra::prelude::*;
use odra::ContractRef;

use crate::pool::PoolError;

/// What the pool accepts as stake.
#[odra::odra_type]
#[derive(Default)]
pub enum StakeAssetKind {
    #[default]
    Native = 0,
    Token = 1,
}

/// CEP-18 entry points the pool relies on.
#[odra::external_contract]
pub trait Cep18Token {
    fn symbol(&self) -> String;
    fn balance_of(&self, owner: Address) -> U256;
    fn allowance(&self, owner: Address, spender: Address) -> U256;
    fn transfer(&mut self, recipient: Address, amount: U256);
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
}

/// Moves one asset in and out of the pool.
///
/// Every failure reverts the whole call, so an adapter never leaves the
/// ledger half-updated.
pub trait AssetAdapter {
    /// Brings `amount` into custody from `from`.
    fn pull(&self, from: Address, amount: U256);

    /// Sends `amount` out of custody to `to`. A shortfall here means the
    /// ledger is broken, not that the caller asked for too much.
    fn push(&self, to: Address, amount: U256);

    /// Amount of this asset currently held by the pool.
    fn custody(&self) -> U256;
}

pub struct NativeCoin {
    env: Rc<ContractEnv>,
}

impl NativeCoin {
    pub fn new(env: Rc<ContractEnv>) -> Self {
        Self { env }
    }
}

impl AssetAdapter for NativeCoin {
    fn pull(&self, _from: Address, amount: U256) {
        let attached = motes_to_amount(self.env.attached_value())
            .unwrap_or_else(|| self.env.revert(PoolError::AmountOverflow));
        if attached != amount {
            self.env.revert(PoolError::AttachedValueMismatch);
        }
    }

    fn push(&self, to: Address, amount: U256) {
        if self.custody() < amount {
            self.env.revert(PoolError::CustodyShortfall);
        }
        self.env.transfer_tokens(&to, &amount_to_motes(amount));
    }

    fn custody(&self) -> U256 {
        motes_to_amount(self.env.self_balance())
            .unwrap_or_else(|| self.env.revert(PoolError::AmountOverflow))
    }
}

pub struct TokenAsset {
    env: Rc<ContractEnv>,
    token: Address,
}

impl TokenAsset {
    pub fn new(env: Rc<ContractEnv>, token: Address) -> Self {
        Self { env, token }
    }

    fn contract(&self) -> Cep18TokenContractRef {
        Cep18TokenContractRef::new(self.env.clone(), self.token)
    }
}

impl AssetAdapter for TokenAsset {
    fn pull(&self, from: Address, amount: U256) {
        // Native value sent alongside a token stake would be stranded.
        if !self.env.attached_value().is_zero() {
            self.env.revert(PoolError::UnexpectedAttachedValue);
        }

        let mut token = self.contract();
        let self_address = self.env.self_address();

        if token.allowance(from, self_address) < amount {
            self.env.revert(PoolError::InsufficientAllowance);
        }
        if token.balance_of(from) < amount {
            self.env.revert(PoolError::InsufficientFunds);
        }

        token.transfer_from(from, self_address, amount);
    }

    fn push(&self, to: Address, amount: U256) {
        if self.custody() < amount {
            self.env.revert(PoolError::CustodyShortfall);
        }
        self.contract().transfer(to, amount);
    }

    fn custody(&self) -> U256 {
        self.contract().balance_of(self.env.self_address())
    }
}

/// Builds the stake-side adapter for a pool.
pub fn stake_adapter(
    env: Rc<ContractEnv>,
    kind: StakeAssetKind,
    token: Option<Address>,
) -> Box<dyn AssetAdapter> {
    match kind {
        StakeAssetKind::Native => Box::new(NativeCoin::new(env)),
        StakeAssetKind::Token => {
            let token = token.unwrap_or_else(|| env.revert(PoolError::InvalidStakeAsset));
            Box::new(TokenAsset::new(env, token))
        }
    }
}

/// Motes to ledger units; `None` if the value does not fit in U256.
pub fn motes_to_amount(motes: U512) -> Option<U256> {
    let mut bytes = [0u8; 64];
    motes.to_little_endian(&mut bytes);
    if bytes[32..].iter().any(|b| *b != 0) {
        return None;
    }
    Some(U256::from_little_endian(&bytes[..32]))
}

/// Ledger units to motes. Always fits.
pub fn amount_to_motes(amount: U256) -> U512 {
    let mut bytes = [0u8; 64];
    amount.to_little_endian(&mut bytes[..32]);
    U512::from_little_endian(&bytes)
}
