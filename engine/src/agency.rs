//! Agency bulk recharge: an agent funds another account's coins from a
//! dedicated agency balance.
//!
//! Unlike the gift path, this transfer is confirm-or-compensate: both legs
//! are applied locally first, the remote commit is awaited, and a remote
//! failure restores both accounts from exact pre-transfer snapshots.

use rand::Rng;
use sahra_types::{Account, AccountId, ChatContent, ChatEvent, RoomEvent, TransferIntent};
use tracing::{error, info};

use crate::dispatch::Dispatcher;
use crate::store::Store;
use crate::{EngineError, Result};

/// Confirmed balances after a committed agency transfer.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferResult {
    pub agent_balance: u64,
    pub target_coins: u64,
}

impl<S: Store, R: Rng> Dispatcher<S, R> {
    /// Transfer `amount` coins from the agent's agency balance to the
    /// target's wallet, counting it toward the target's lifetime recharge.
    ///
    /// Validation happens before any mutation: the agent must hold the
    /// agency privilege and sufficient agency balance, the target must
    /// exist, and self-transfers are rejected.
    pub async fn charge_via_agency(
        &mut self,
        agent: &AccountId,
        target: &AccountId,
        amount: u64,
    ) -> Result<TransferResult> {
        if amount == 0 {
            return Err(EngineError::InvalidTransfer("amount must be positive"));
        }
        if agent == target {
            return Err(EngineError::InvalidTransfer(
                "agent cannot recharge itself",
            ));
        }
        let ledger = self.accounts_mut();
        let agent_account = ledger
            .get(agent)
            .ok_or_else(|| EngineError::UnknownAccount(agent.clone()))?;
        let agent_name = agent_account.name.clone();
        let balance = agent_account
            .agency_balance
            .ok_or_else(|| EngineError::NotAnAgent(agent.clone()))?;
        if balance < amount {
            return Err(EngineError::InsufficientAgencyFunds {
                required: amount,
                available: balance,
            });
        }
        let target_name = ledger
            .get(target)
            .ok_or_else(|| EngineError::UnknownAccount(target.clone()))?
            .name
            .clone();

        // Exact records to fall back to if the remote commit fails.
        let agent_snapshot = ledger.snapshot(agent)?;
        let target_snapshot = ledger.snapshot(target)?;

        let intent = TransferIntent {
            agent: agent.clone(),
            target: target.clone(),
            amount,
        };
        for (id, delta) in intent.legs() {
            ledger.apply(&id, &delta)?;
        }

        let committed = self.store().commit_transfer(&intent).await;
        if let Err(err) = committed {
            error!(
                agent = %agent,
                target = %target,
                amount,
                error = %err,
                "agency transfer commit failed; rolling back"
            );
            self.rollback(agent_snapshot, target_snapshot);
            return Err(EngineError::Remote(err));
        }

        let ledger = self.accounts_mut();
        let agent_balance = ledger
            .snapshot(agent)?
            .agency_balance
            .unwrap_or_default();
        let target_coins = ledger.snapshot(target)?.coins;
        info!(agent = %agent, target = %target, amount, "agency transfer committed");

        self.emit(RoomEvent::AgencyRecharge {
            agent: agent.clone(),
            target: target.clone(),
            amount,
        });
        self.emit(RoomEvent::Chat(ChatEvent {
            sender: agent.clone(),
            sender_name: agent_name.clone(),
            content: ChatContent::System(format!(
                "{agent_name} recharged {amount} coins for {target_name}"
            )),
        }));

        Ok(TransferResult {
            agent_balance,
            target_coins,
        })
    }

    fn rollback(&mut self, agent_snapshot: Account, target_snapshot: Account) {
        let ledger = self.accounts_mut();
        ledger.restore(agent_snapshot);
        ledger.restore(target_snapshot);
    }
}
