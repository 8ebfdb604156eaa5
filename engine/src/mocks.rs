//! Shared test doubles.
//!
//! Available to integration tests of dependent crates through the `mocks`
//! feature.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sahra_types::{
    Account, AccountDelta, AccountId, GameSettings, Gift, GiftCategory, TransferIntent,
};
use tokio::sync::broadcast;

use crate::store::{Store, StoreError};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

struct Inner {
    accounts: HashMap<AccountId, Account>,
    /// Remaining commits to fail with [`StoreError::Unavailable`].
    fail_commits: u32,
}

/// In-memory [`Store`] with failure injection.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    changes: broadcast::Sender<Account>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                accounts: HashMap::new(),
                fail_commits: 0,
            })),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed an account without going through a commit (no notification).
    pub fn seed(&self, account: Account) {
        self.lock().accounts.insert(account.id.clone(), account);
    }

    /// Fail the next `n` commits with [`StoreError::Unavailable`].
    pub fn fail_next_commits(&self, n: u32) {
        self.lock().fail_commits = n;
    }

    /// Current stored record, if any.
    pub fn account(&self, id: &AccountId) -> Option<Account> {
        self.lock().accounts.get(id).cloned()
    }

    fn take_failure(inner: &mut Inner) -> bool {
        if inner.fail_commits > 0 {
            inner.fail_commits -= 1;
            true
        } else {
            false
        }
    }

    fn notify(&self, account: &Account) {
        let _ = self.changes.send(account.clone());
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_delta(account: &mut Account, delta: &AccountDelta) -> Result<(), StoreError> {
    account.coins = account
        .coins
        .checked_add_signed(delta.coins)
        .ok_or(StoreError::Rejected("coins would go negative"))?;
    if delta.agency != 0 {
        let balance = account
            .agency_balance
            .ok_or(StoreError::Rejected("not an agent"))?;
        account.agency_balance = Some(
            balance
                .checked_add_signed(delta.agency)
                .ok_or(StoreError::Rejected("agency balance would go negative"))?,
        );
    }
    account.wealth = account.wealth.saturating_add_signed(delta.wealth);
    account.charm = account.charm.saturating_add_signed(delta.charm);
    account.total_recharge = account.total_recharge.saturating_add_signed(delta.recharge);
    Ok(())
}

impl Store for MemoryStore {
    fn read_account(
        &self,
        id: &AccountId,
    ) -> impl Future<Output = Result<Option<Account>, StoreError>> + Send {
        let account = self.lock().accounts.get(id).cloned();
        async move { Ok(account) }
    }

    fn commit_account(
        &self,
        account: &Account,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let result = {
            let mut inner = self.lock();
            if Self::take_failure(&mut inner) {
                Err(StoreError::Unavailable)
            } else {
                inner
                    .accounts
                    .insert(account.id.clone(), account.clone());
                Ok(())
            }
        };
        if result.is_ok() {
            self.notify(account);
        }
        async move { result }
    }

    fn commit_delta(
        &self,
        id: &AccountId,
        delta: &AccountDelta,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let result = {
            let mut inner = self.lock();
            if Self::take_failure(&mut inner) {
                Err(StoreError::Unavailable)
            } else {
                match inner.accounts.get_mut(id) {
                    None => Err(StoreError::UnknownAccount(id.clone())),
                    Some(account) => apply_delta(account, delta).map(|()| account.clone()),
                }
            }
        };
        let result = result.map(|account| self.notify(&account));
        async move { result }
    }

    fn commit_transfer(
        &self,
        intent: &TransferIntent,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let result = {
            let mut inner = self.lock();
            if Self::take_failure(&mut inner) {
                Err(StoreError::Unavailable)
            } else {
                // Validate both legs against copies before touching the map
                // so a rejected transfer leaves neither account modified.
                let mut staged = Vec::with_capacity(2);
                let mut outcome = Ok(());
                for (id, delta) in intent.legs() {
                    match inner.accounts.get(&id) {
                        None => {
                            outcome = Err(StoreError::UnknownAccount(id));
                            break;
                        }
                        Some(account) => {
                            let mut updated = account.clone();
                            if let Err(err) = apply_delta(&mut updated, &delta) {
                                outcome = Err(err);
                                break;
                            }
                            staged.push(updated);
                        }
                    }
                }
                outcome.map(|()| {
                    for account in &staged {
                        inner.accounts.insert(account.id.clone(), account.clone());
                    }
                    staged
                })
            }
        };
        let result = match result {
            Ok(staged) => {
                for account in &staged {
                    self.notify(account);
                }
                Ok(())
            }
            Err(err) => Err(err),
        };
        async move { result }
    }

    fn subscribe(&self) -> broadcast::Receiver<Account> {
        self.changes.subscribe()
    }
}

/// An account with a known wallet, no agency privilege.
pub fn test_account(id: &str, coins: u64) -> Account {
    let mut account = Account::new(id, id);
    account.coins = coins;
    account
}

/// An agent account with a funded agency balance.
pub fn agent_account(id: &str, agency_balance: u64) -> Account {
    let mut account = test_account(id, 0);
    account.agency_balance = Some(agency_balance);
    account
}

/// A plain (non-lucky) gift.
pub fn test_gift(id: &str, cost: u64) -> Gift {
    Gift {
        id: id.to_string(),
        name: id.to_string(),
        icon: "🎁".to_string(),
        cost,
        category: GiftCategory::Popular,
        is_lucky: false,
    }
}

/// A lucky gift eligible for refund resolution.
pub fn lucky_gift(id: &str, cost: u64) -> Gift {
    let mut gift = test_gift(id, cost);
    gift.category = GiftCategory::Lucky;
    gift.is_lucky = true;
    gift
}

/// Settings with every random outcome forced to `win` and tier rolls
/// disabled, so payouts are exactly the flat refund percent.
pub fn forced_settings(win: bool) -> GameSettings {
    let rate = if win { 100.0 } else { 0.0 };
    GameSettings {
        slots_win_rate: rate,
        wheel_win_rate: rate,
        lucky_gift_win_rate: rate,
        lucky_tiers_enabled: false,
        ..GameSettings::default()
    }
}
