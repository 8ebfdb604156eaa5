//! Wallet ledger: the single owning aggregate for account balances.
//!
//! Every balance mutation in the engine flows through [`Ledger::apply`]; no
//! component writes `coins`/`wealth`/`charm` directly. The ledger is a
//! local cache of the remote store's account documents; propagation of
//! successful deltas is the orchestrator's concern, not the ledger's.

use std::collections::HashMap;

use sahra_types::{Account, AccountDelta, AccountId};

use crate::{EngineError, Result};

#[derive(Debug, Default)]
pub struct Ledger {
    accounts: HashMap<AccountId, Account>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh an account record (registration, or a snapshot
    /// pushed by the store's change stream).
    pub fn insert(&mut self, account: Account) {
        self.accounts.insert(account.id.clone(), account);
    }

    pub fn get(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// Owned copy of the current record, for rollback snapshots.
    pub fn snapshot(&self, id: &AccountId) -> Result<Account> {
        self.accounts
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownAccount(id.clone()))
    }

    /// Overwrite an account with a previously captured snapshot.
    pub fn restore(&mut self, snapshot: Account) {
        self.accounts.insert(snapshot.id.clone(), snapshot);
    }

    /// Precondition check only: whether `id` can cover `amount` right now.
    /// Callers must still re-check at apply time; state may have moved.
    pub fn reserve(&self, id: &AccountId, amount: u64) -> Result<bool> {
        let account = self
            .accounts
            .get(id)
            .ok_or_else(|| EngineError::UnknownAccount(id.clone()))?;
        Ok(account.coins >= amount)
    }

    /// Apply a delta atomically: all new balances are computed first and
    /// written only if every field stays valid. A spend that would push
    /// `coins` (or `agency_balance`) negative is rejected, not clamped.
    pub fn apply(&mut self, id: &AccountId, delta: &AccountDelta) -> Result<&Account> {
        let account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownAccount(id.clone()))?;

        let coins = account.coins.checked_add_signed(delta.coins).ok_or(
            EngineError::InsufficientFunds {
                required: delta.coins.unsigned_abs(),
                available: account.coins,
            },
        )?;
        let agency_balance = if delta.agency != 0 {
            let balance = account
                .agency_balance
                .ok_or_else(|| EngineError::NotAnAgent(id.clone()))?;
            Some(balance.checked_add_signed(delta.agency).ok_or(
                EngineError::InsufficientAgencyFunds {
                    required: delta.agency.unsigned_abs(),
                    available: balance,
                },
            )?)
        } else {
            account.agency_balance
        };

        account.coins = coins;
        account.agency_balance = agency_balance;
        // Lifetime counters are never decremented by normal gameplay; a
        // negative delta saturates rather than underflows.
        account.wealth = account.wealth.saturating_add_signed(delta.wealth);
        account.charm = account.charm.saturating_add_signed(delta.charm);
        account.total_recharge = account.total_recharge.saturating_add_signed(delta.recharge);
        Ok(&*account)
    }

    /// Record an item purchase on the account.
    pub fn grant_item(&mut self, id: &AccountId, item_id: &str) -> Result<&Account> {
        let account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownAccount(id.clone()))?;
        if account.owned_items.iter().any(|owned| owned == item_id) {
            return Err(EngineError::AlreadyOwned(item_id.to_string()));
        }
        account.owned_items.push(item_id.to_string());
        Ok(&*account)
    }

    /// Record a VIP tier purchase on the account.
    pub fn set_vip_level(&mut self, id: &AccountId, level: u8) -> Result<&Account> {
        let account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownAccount(id.clone()))?;
        account.vip_level = level;
        Ok(&*account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sahra_types::Account;

    fn ledger_with(id: &str, coins: u64) -> Ledger {
        let mut account = Account::new(id, id);
        account.coins = coins;
        let mut ledger = Ledger::new();
        ledger.insert(account);
        ledger
    }

    #[test]
    fn test_apply_spend_and_credit() {
        let mut ledger = ledger_with("u1", 10_000);
        let id = AccountId::from("u1");

        let account = ledger.apply(&id, &AccountDelta::gift_spend(1_000)).unwrap();
        assert_eq!(account.coins, 9_000);
        assert_eq!(account.wealth, 1_000);

        let account = ledger.apply(&id, &AccountDelta::coins(500)).unwrap();
        assert_eq!(account.coins, 9_500);
    }

    #[test]
    fn test_overdraft_rejected_without_mutation() {
        let mut ledger = ledger_with("u1", 100);
        let id = AccountId::from("u1");

        let err = ledger
            .apply(&id, &AccountDelta::gift_spend(101))
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        // Nothing moved, including the wealth leg of the same delta.
        let account = ledger.get(&id).unwrap();
        assert_eq!(account.coins, 100);
        assert_eq!(account.wealth, 0);
    }

    #[test]
    fn test_reserve_is_only_a_precondition() {
        let ledger = ledger_with("u1", 100);
        let id = AccountId::from("u1");
        assert!(ledger.reserve(&id, 100).unwrap());
        assert!(!ledger.reserve(&id, 101).unwrap());
    }

    #[test]
    fn test_agency_delta_requires_privilege() {
        let mut ledger = ledger_with("u1", 0);
        let id = AccountId::from("u1");
        let err = ledger
            .apply(&id, &AccountDelta::agency_debit(10))
            .unwrap_err();
        assert!(matches!(err, EngineError::NotAnAgent(_)));
    }

    #[test]
    fn test_agency_overdraft_rejected() {
        let mut account = Account::new("agent", "Agent");
        account.agency_balance = Some(400);
        let mut ledger = Ledger::new();
        ledger.insert(account);
        let id = AccountId::from("agent");

        let err = ledger
            .apply(&id, &AccountDelta::agency_debit(500))
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientAgencyFunds { .. }));
        assert_eq!(ledger.get(&id).unwrap().agency_balance, Some(400));

        ledger.apply(&id, &AccountDelta::agency_debit(400)).unwrap();
        assert_eq!(ledger.get(&id).unwrap().agency_balance, Some(0));
    }

    #[test]
    fn test_unknown_account() {
        let mut ledger = Ledger::new();
        let err = ledger
            .apply(&AccountId::from("ghost"), &AccountDelta::coins(1))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownAccount(_)));
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let mut ledger = ledger_with("u1", 5_000);
        let id = AccountId::from("u1");
        let snapshot = ledger.snapshot(&id).unwrap();

        ledger.apply(&id, &AccountDelta::gift_spend(3_000)).unwrap();
        assert_eq!(ledger.get(&id).unwrap().coins, 2_000);

        ledger.restore(snapshot);
        let account = ledger.get(&id).unwrap();
        assert_eq!(account.coins, 5_000);
        assert_eq!(account.wealth, 0);
    }

    #[test]
    fn test_grant_item_rejects_duplicates() {
        let mut ledger = ledger_with("u1", 0);
        let id = AccountId::from("u1");
        ledger.grant_item(&id, "f_neon").unwrap();
        let err = ledger.grant_item(&id, "f_neon").unwrap_err();
        assert!(matches!(err, EngineError::AlreadyOwned(_)));
        assert_eq!(ledger.get(&id).unwrap().owned_items.len(), 1);
    }
}
