use crate::store::SnapshotStore;
use std::{
    collections::HashMap,
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::warn;

/// User identity on the transport doubles as the account key.
pub type AccountId = i64;

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum LedgerError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("insufficient funds: {available} available, {requested} requested")]
    InsufficientFunds { available: u64, requested: u64 },
}

/// Proof that a stake is reserved. Consumed exactly once, by value,
/// through `settle_win`, `settle_loss` or `release`. Holds live only
/// in memory: a crash mid-wager restarts from the last settled
/// balances, which releases every outstanding hold.
#[derive(Debug)]
#[must_use = "an unresolved hold keeps the stake locked until restart"]
pub struct Hold {
    account: AccountId,
    amount: u64,
}

impl Hold {
    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<AccountId, u64>,
    held: HashMap<AccountId, u64>,
}

impl LedgerState {
    fn balance(&self, account: AccountId) -> u64 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    fn held(&self, account: AccountId) -> u64 {
        self.held.get(&account).copied().unwrap_or(0)
    }

    fn drop_hold(&mut self, hold: &Hold) {
        let held = self
            .held
            .get_mut(&hold.account)
            .expect("a live hold implies a held entry");
        *held = held
            .checked_sub(hold.amount)
            .expect("held total covers every live hold");
        if *held == 0 {
            self.held.remove(&hold.account);
        }
    }
}

/// In-memory account balances with durable checkpoints. Every
/// reserve/settle/credit runs as one atomic critical section, so two
/// interleaved wagers on the same account cannot both pass the balance
/// check against a stale value.
pub struct BalanceLedger<S> {
    state: Mutex<LedgerState>,
    store: Arc<S>,
}

impl<S: SnapshotStore> BalanceLedger<S> {
    pub fn new(balances: HashMap<AccountId, u64>, store: Arc<S>) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                balances,
                held: HashMap::new(),
            }),
            store,
        }
    }

    /// 0 for unknown accounts; no side effect.
    pub async fn balance(&self, account: AccountId) -> u64 {
        self.state.lock().await.balance(account)
    }

    /// Reserves a stake against the un-held part of the balance. No
    /// durable mutation happens here; the stake is only at risk once
    /// settlement commits.
    pub async fn reserve(
        &self,
        account: AccountId,
        amount: u64,
    ) -> Result<Hold, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let mut state = self.state.lock().await;
        let available = state.balance(account).saturating_sub(state.held(account));
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                available,
                requested: amount,
            });
        }
        *state.held.entry(account).or_insert(0) += amount;
        Ok(Hold { account, amount })
    }

    /// Win path: the stake converts into `winnings` net of itself,
    /// i.e. the balance moves by `winnings - amount`.
    pub async fn settle_win(&self, hold: Hold, winnings: u64) -> u64 {
        let mut state = self.state.lock().await;
        let balance = state
            .balance(hold.account)
            .checked_sub(hold.amount)
            .expect("hold guarantees the stake is covered")
            + winnings;
        state.balances.insert(hold.account, balance);
        state.drop_hold(&hold);
        self.checkpoint(&state);
        balance
    }

    /// Loss path: the stake is charged in full.
    pub async fn settle_loss(&self, hold: Hold) -> u64 {
        let mut state = self.state.lock().await;
        let balance = state
            .balance(hold.account)
            .checked_sub(hold.amount)
            .expect("hold guarantees the stake is covered");
        state.balances.insert(hold.account, balance);
        state.drop_hold(&hold);
        self.checkpoint(&state);
        balance
    }

    /// Abort path: the stake returns untouched, nothing to persist.
    pub async fn release(&self, hold: Hold) {
        let mut state = self.state.lock().await;
        state.drop_hold(&hold);
    }

    /// Admin top-up. Authorization is the caller's concern.
    pub async fn credit(
        &self,
        account: AccountId,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let mut state = self.state.lock().await;
        let balance = state.balance(account).saturating_add(amount);
        state.balances.insert(account, balance);
        self.checkpoint(&state);
        Ok(balance)
    }

    /// Persistence failures never roll back the in-memory mutation;
    /// the last good document wins only across a restart.
    fn checkpoint(&self, state: &LedgerState) {
        if let Err(err) = self.store.save_balances(&state.balances) {
            warn!(error = %err, "failed to persist balances, in-memory state stays authoritative");
        }
    }
}
