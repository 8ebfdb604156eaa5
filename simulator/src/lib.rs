//! Local backend: a codec-backed store plus a deterministic session
//! harness.
//!
//! Accounts are persisted as their wire encoding, so every commit
//! round-trips the codec exactly like the real backend. All sessions share
//! one store and observe each other through its change stream.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use commonware_codec::{DecodeExt, Encode};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sahra_engine::{Dispatcher, RoomContext, Store, StoreError};
use sahra_types::{Account, AccountDelta, AccountId, GameSettings, TransferIntent};
use tokio::sync::broadcast;
use tracing::warn;

const CHANGE_CHANNEL_CAPACITY: usize = 128;

struct Inner {
    blobs: HashMap<AccountId, Bytes>,
    /// Remaining commits to fail with [`StoreError::Unavailable`].
    fail_commits: u32,
}

/// Account store persisting encoded records.
#[derive(Clone)]
pub struct SimStore {
    inner: Arc<Mutex<Inner>>,
    changes: broadcast::Sender<Account>,
}

impl SimStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                blobs: HashMap::new(),
                fail_commits: 0,
            })),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an account without a commit (initial world state).
    pub fn seed(&self, account: Account) {
        self.lock()
            .blobs
            .insert(account.id.clone(), account.encode().freeze());
    }

    /// Fail the next `n` commits with [`StoreError::Unavailable`].
    pub fn fail_next_commits(&self, n: u32) {
        self.lock().fail_commits = n;
    }

    /// Decode one stored record; `None` when absent or unreadable.
    pub fn account(&self, id: &AccountId) -> Option<Account> {
        let blob = self.lock().blobs.get(id).cloned()?;
        match Account::decode(blob) {
            Ok(account) => Some(account),
            Err(err) => {
                warn!(account = %id, error = %err, "stored record is unreadable");
                None
            }
        }
    }

    /// Decode every stored record, skipping unreadable ones.
    pub fn accounts(&self) -> Vec<Account> {
        let blobs: Vec<Bytes> = self.lock().blobs.values().cloned().collect();
        blobs
            .into_iter()
            .filter_map(|blob| Account::decode(blob).ok())
            .collect()
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

    #[cfg(test)]
    fn insert_raw(&self, id: AccountId, blob: Bytes) {
        self.lock().blobs.insert(id, blob);
    }
}

impl Default for SimStore {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_record(id: &AccountId, blob: &Bytes) -> Result<Account, StoreError> {
    Account::decode(blob.clone()).map_err(|err| StoreError::InvalidRecord(format!("{id}: {err}")))
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

impl Store for SimStore {
    fn read_account(
        &self,
        id: &AccountId,
    ) -> impl Future<Output = Result<Option<Account>, StoreError>> + Send {
        let result = match self.lock().blobs.get(id) {
            None => Ok(None),
            Some(blob) => decode_record(id, blob).map(Some),
        };
        async move { result }
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
                    .blobs
                    .insert(account.id.clone(), account.encode().freeze());
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
                match inner.blobs.get(id).cloned() {
                    None => Err(StoreError::UnknownAccount(id.clone())),
                    Some(blob) => decode_record(id, &blob).and_then(|mut account| {
                        apply_delta(&mut account, delta)?;
                        inner
                            .blobs
                            .insert(account.id.clone(), account.encode().freeze());
                        Ok(account)
                    }),
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
                // Stage both legs before writing either, so a rejected
                // transfer leaves no trace.
                let staged: Result<Vec<Account>, StoreError> = intent
                    .legs()
                    .into_iter()
                    .map(|(id, delta)| {
                        let blob = inner
                            .blobs
                            .get(&id)
                            .ok_or_else(|| StoreError::UnknownAccount(id.clone()))?;
                        let mut account = decode_record(&id, blob)?;
                        apply_delta(&mut account, &delta)?;
                        Ok(account)
                    })
                    .collect();
                staged.map(|staged| {
                    for account in &staged {
                        inner
                            .blobs
                            .insert(account.id.clone(), account.encode().freeze());
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

/// Shared world plus a session factory.
pub struct Simulator {
    store: SimStore,
    settings: GameSettings,
    room: RoomContext,
}

impl Simulator {
    pub fn new(settings: GameSettings, room: RoomContext) -> Self {
        Self {
            store: SimStore::new(),
            settings,
            room,
        }
    }

    pub fn store(&self) -> SimStore {
        self.store.clone()
    }

    pub fn seed(&self, account: Account) {
        self.store.seed(account);
    }

    /// Open a session over the shared store, preloaded with every account
    /// currently persisted. `seed` fixes the session's randomness.
    pub fn session(&self, seed: u64) -> Dispatcher<SimStore, StdRng> {
        let mut dispatcher = Dispatcher::new(
            self.store.clone(),
            self.settings.clone(),
            self.room.clone(),
            StdRng::seed_from_u64(seed),
        );
        for account in self.store.accounts() {
            dispatcher.track(account);
        }
        dispatcher
    }
}
