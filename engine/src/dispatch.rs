//! Gift dispatch orchestration.
//!
//! The dispatcher composes the resolver, the wallet ledger, and the combo
//! aggregator for one client session. Local state always applies
//! synchronously; remote writes are queued to a background sync worker and
//! confirmed best-effort. A failed remote write on this path is logged and
//! surfaced but the optimistic local state is kept; only the agency
//! transfer path (see [`crate::agency`]) compensates on failure.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use rand::Rng;
use sahra_types::{
    Account, AccountDelta, AccountId, Announcement, AnnouncementKind, ChatContent, ChatEvent,
    GameSettings, Gift, RoomEvent, SlotSymbol, StoreItem, VipPackage, WheelOutcome,
    BROADCAST_THRESHOLD,
};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::combo::{self, Combo, ComboSnapshot, ComboTicker};
use crate::ledger::Ledger;
use crate::resolver;
use crate::store::Store;
use crate::{EngineError, Result, SlotSpin, SpinOutcome, WheelSpin};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The room this session is dispatching into (announcement metadata).
#[derive(Clone, Debug)]
pub struct RoomContext {
    pub id: String,
    pub title: String,
}

/// Outcome of one gift send.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchResult {
    pub total_cost: u64,
    /// Refund resolution for lucky gifts, `None` for plain gifts.
    pub lucky: Option<SpinOutcome>,
    pub combo: ComboSnapshot,
}

/// A queued remote write.
enum SyncOp {
    Delta(AccountId, AccountDelta),
    Account(Account),
}

/// Orchestrates economy operations for one client session.
pub struct Dispatcher<S: Store, R: Rng> {
    ledger: Ledger,
    store: S,
    settings: GameSettings,
    room: RoomContext,
    slot_table: Vec<SlotSymbol>,
    wheel_table: Vec<WheelOutcome>,
    wheel_bets: HashMap<AccountId, BTreeMap<String, u64>>,
    combo: Arc<Mutex<Combo>>,
    ticker: Option<ComboTicker>,
    events: broadcast::Sender<RoomEvent>,
    sync_tx: mpsc::UnboundedSender<SyncOp>,
    _sync_handle: JoinHandle<()>,
    rng: R,
}

impl<S: Store, R: Rng> Dispatcher<S, R> {
    /// Build a dispatcher. Must be called within a tokio runtime: the
    /// remote-sync worker is spawned immediately.
    pub fn new(store: S, settings: GameSettings, room: RoomContext, rng: R) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (sync_tx, sync_rx) = mpsc::unbounded_channel();
        let sync_handle = spawn_sync_worker(store.clone(), events.clone(), sync_rx);
        let wheel_table = WheelOutcome::default_table(
            settings.wheel_jackpot_multiplier,
            settings.wheel_normal_multiplier,
        );
        Self {
            ledger: Ledger::new(),
            store,
            settings,
            room,
            slot_table: SlotSymbol::default_table(),
            wheel_table,
            wheel_bets: HashMap::new(),
            combo: Arc::new(Mutex::new(Combo::default())),
            ticker: None,
            events,
            sync_tx,
            _sync_handle: sync_handle,
            rng,
        }
    }

    /// Events for the presentation collaborator.
    pub fn subscribe_events(&self) -> broadcast::Receiver<RoomEvent> {
        self.events.subscribe()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Adopt a settings document pushed by the store (admin updates).
    pub fn update_settings(&mut self, settings: GameSettings) {
        self.wheel_table = WheelOutcome::default_table(
            settings.wheel_jackpot_multiplier,
            settings.wheel_normal_multiplier,
        );
        self.settings = settings;
    }

    /// Refresh the local cache from a store change-stream snapshot. The
    /// store is the source of truth; last write wins.
    pub fn track(&mut self, account: Account) {
        self.ledger.insert(account);
    }

    /// Register a brand-new account locally and persist it.
    pub fn register(&mut self, account: Account) {
        self.queue(SyncOp::Account(account.clone()));
        self.ledger.insert(account);
    }

    /// Fetch an account from the store into the local cache. `false` when
    /// the store has no record for `id`.
    pub async fn load(&mut self, id: &AccountId) -> Result<bool> {
        match self.store.read_account(id).await? {
            Some(account) => {
                self.ledger.insert(account);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn combo_snapshot(&self) -> ComboSnapshot {
        combo::lock(&self.combo).snapshot()
    }

    /// Terminate the active streak (leaving the room, switching rooms).
    pub fn cancel_combo(&mut self) {
        combo::lock(&self.combo).cancel();
    }

    /// Send `quantity` of `gift` to `recipient` (or the whole room when
    /// `None`).
    ///
    /// Order of effects: funds validation (failure terminates the combo and
    /// mutates nothing), coin debit + wealth credit, combo update, lucky
    /// refund, recipient charm credit, chat event, announcement when the
    /// value reaches the broadcast threshold or on any lucky win.
    pub fn send_gift(
        &mut self,
        sender: &AccountId,
        gift: &Gift,
        quantity: u32,
        recipient: Option<&AccountId>,
    ) -> Result<DispatchResult> {
        if quantity == 0 {
            return Err(EngineError::InvalidBet("gift quantity must be positive"));
        }
        let total_cost = gift
            .cost
            .checked_mul(u64::from(quantity))
            .ok_or(EngineError::InvalidBet("gift value overflows"))?;

        let sender_account = self
            .ledger
            .get(sender)
            .ok_or_else(|| EngineError::UnknownAccount(sender.clone()))?;
        let sender_name = sender_account.name.clone();
        let available = sender_account.coins;
        let recipient_name = match recipient {
            Some(id) => self
                .ledger
                .get(id)
                .ok_or_else(|| EngineError::UnknownAccount(id.clone()))?
                .name
                .clone(),
            None => "everyone".to_string(),
        };

        if available < total_cost {
            // An unaffordable send ends the streak; no partial spend ever
            // occurs.
            combo::lock(&self.combo).cancel();
            return Err(EngineError::InsufficientFunds {
                required: total_cost,
                available,
            });
        }

        let mut sender_delta = AccountDelta::gift_spend(total_cost);
        self.ledger.apply(sender, &sender_delta)?;

        let combo_snapshot = combo::lock(&self.combo).note_send(&gift.id, recipient);
        self.ensure_ticker();

        let lucky = if gift.is_lucky {
            let outcome =
                resolver::resolve_lucky_refund(&mut self.rng, total_cost, &self.settings)?;
            if outcome.payout > 0 {
                let refund = AccountDelta::coins(outcome.payout as i64);
                self.ledger.apply(sender, &refund)?;
                sender_delta = sender_delta.merge(refund);
                self.emit(RoomEvent::LuckyWin {
                    account: sender.clone(),
                    amount: outcome.payout,
                });
            }
            Some(outcome)
        } else {
            None
        };
        let lucky_win = lucky.is_some_and(|outcome| outcome.payout > 0);

        if let Some(id) = recipient {
            let charm = AccountDelta::charm_credit(total_cost);
            self.ledger.apply(id, &charm)?;
            self.queue(SyncOp::Delta(id.clone(), charm));
        }
        self.queue(SyncOp::Delta(sender.clone(), sender_delta));

        let content = if lucky_win {
            ChatContent::LuckyWin {
                gift_id: gift.id.clone(),
                gift_name: gift.name.clone(),
                amount: lucky.map(|outcome| outcome.payout).unwrap_or(0),
            }
        } else {
            ChatContent::GiftSent {
                gift_id: gift.id.clone(),
                gift_name: gift.name.clone(),
                quantity,
                recipient_name: recipient_name.clone(),
            }
        };
        self.emit(RoomEvent::Chat(ChatEvent {
            sender: sender.clone(),
            sender_name: sender_name.clone(),
            content,
        }));

        if total_cost >= BROADCAST_THRESHOLD || lucky_win {
            let (kind, amount) = if lucky_win {
                (
                    AnnouncementKind::LuckyWin,
                    lucky.map(|outcome| outcome.payout).unwrap_or(0),
                )
            } else {
                (AnnouncementKind::Gift, total_cost)
            };
            self.emit(RoomEvent::Announcement(Announcement {
                sender_name,
                recipient_name,
                gift_name: gift.name.clone(),
                gift_icon: gift.icon.clone(),
                room_id: self.room.id.clone(),
                room_title: self.room.title.clone(),
                kind,
                amount,
            }));
        }

        Ok(DispatchResult {
            total_cost,
            lucky,
            combo: combo_snapshot,
        })
    }

    /// Buy a store cosmetic. Duplicates are rejected before any debit.
    pub fn buy_store_item(&mut self, buyer: &AccountId, item: &StoreItem) -> Result<()> {
        let account = self
            .ledger
            .get(buyer)
            .ok_or_else(|| EngineError::UnknownAccount(buyer.clone()))?;
        if account.owned_items.iter().any(|owned| owned == &item.id) {
            return Err(EngineError::AlreadyOwned(item.id.clone()));
        }
        if account.coins < item.price {
            return Err(EngineError::InsufficientFunds {
                required: item.price,
                available: account.coins,
            });
        }
        self.ledger.apply(buyer, &AccountDelta::purchase(item.price))?;
        self.ledger.grant_item(buyer, &item.id)?;
        let snapshot = self.ledger.snapshot(buyer)?;
        self.queue(SyncOp::Account(snapshot));
        Ok(())
    }

    /// Buy a VIP tier.
    pub fn buy_vip(&mut self, buyer: &AccountId, package: &VipPackage) -> Result<()> {
        let account = self
            .ledger
            .get(buyer)
            .ok_or_else(|| EngineError::UnknownAccount(buyer.clone()))?;
        if account.coins < package.cost {
            return Err(EngineError::InsufficientFunds {
                required: package.cost,
                available: account.coins,
            });
        }
        self.ledger
            .apply(buyer, &AccountDelta::purchase(package.cost))?;
        self.ledger.set_vip_level(buyer, package.level)?;
        let snapshot = self.ledger.snapshot(buyer)?;
        self.queue(SyncOp::Account(snapshot));
        Ok(())
    }

    /// One slot-machine spin: debit the bet, resolve, credit any payout.
    pub fn spin_slots(&mut self, player: &AccountId, bet: u64) -> Result<SlotSpin> {
        if bet == 0 {
            return Err(EngineError::InvalidBet("bet must be positive"));
        }
        let account = self
            .ledger
            .get(player)
            .ok_or_else(|| EngineError::UnknownAccount(player.clone()))?;
        if account.coins < bet {
            return Err(EngineError::InsufficientFunds {
                required: bet,
                available: account.coins,
            });
        }
        // Resolution is pure, so it runs before the debit: a configuration
        // error must fail before any coin moves.
        let spin = resolver::resolve_slot_spin(
            &mut self.rng,
            bet,
            self.settings.slots_win_rate,
            &self.slot_table,
        )?;
        let delta = AccountDelta::coins(spin.outcome.payout as i64 - bet as i64);
        self.ledger.apply(player, &delta)?;
        self.queue(SyncOp::Delta(player.clone(), delta));
        Ok(spin)
    }

    /// Stake coins on one wheel outcome for the current round. The stake is
    /// debited immediately.
    pub fn place_wheel_bet(
        &mut self,
        player: &AccountId,
        outcome_id: &str,
        amount: u64,
    ) -> Result<u64> {
        if amount == 0 {
            return Err(EngineError::InvalidBet("bet must be positive"));
        }
        if !self.wheel_table.iter().any(|outcome| outcome.id == outcome_id) {
            return Err(EngineError::InvalidBet("unknown wheel outcome"));
        }
        let account = self
            .ledger
            .get(player)
            .ok_or_else(|| EngineError::UnknownAccount(player.clone()))?;
        if account.coins < amount {
            return Err(EngineError::InsufficientFunds {
                required: amount,
                available: account.coins,
            });
        }
        let delta = AccountDelta::coins(-(amount as i64));
        self.ledger.apply(player, &delta)?;
        self.queue(SyncOp::Delta(player.clone(), delta));
        let staked = self
            .wheel_bets
            .entry(player.clone())
            .or_default()
            .entry(outcome_id.to_string())
            .or_insert(0);
        *staked += amount;
        Ok(*staked)
    }

    /// Spin the wheel for the player's staked round. Stakes on non-winning
    /// outcomes are forfeited; only the winning outcome's stake pays.
    pub fn resolve_wheel(&mut self, player: &AccountId) -> Result<WheelSpin> {
        let bets = self.wheel_bets.remove(player).unwrap_or_default();
        let spin = match resolver::resolve_wheel_spin(
            &mut self.rng,
            &bets,
            self.settings.wheel_win_rate,
            &self.wheel_table,
        ) {
            Ok(spin) => spin,
            Err(err) => {
                // Resolution failed before any payout; keep the round open.
                self.wheel_bets.insert(player.clone(), bets);
                return Err(err);
            }
        };
        if spin.outcome.payout > 0 {
            let delta = AccountDelta::coins(spin.outcome.payout as i64);
            self.ledger.apply(player, &delta)?;
            self.queue(SyncOp::Delta(player.clone(), delta));
        }
        Ok(spin)
    }

    pub(crate) fn accounts_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn emit(&self, event: RoomEvent) {
        // Nobody listening is fine; presentation may not have subscribed.
        let _ = self.events.send(event);
    }

    fn queue(&self, op: SyncOp) {
        if let SyncOp::Delta(_, delta) = &op {
            if delta.is_zero() {
                return;
            }
        }
        if self.sync_tx.send(op).is_err() {
            warn!("sync worker gone; dropping remote write");
        }
    }

    /// Make sure a live ticker is driving the combo countdown. Replacing a
    /// finished ticker aborts the old task first, so two timers never race
    /// over the same streak.
    fn ensure_ticker(&mut self) {
        let respawn = self.ticker.as_ref().map_or(true, ComboTicker::is_finished);
        if respawn {
            self.ticker = Some(ComboTicker::spawn(self.combo.clone(), self.events.clone()));
        }
    }
}

fn spawn_sync_worker<S: Store>(
    store: S,
    events: broadcast::Sender<RoomEvent>,
    mut rx: mpsc::UnboundedReceiver<SyncOp>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(op) = rx.recv().await {
            let (id, result) = match &op {
                SyncOp::Delta(id, delta) => (id.clone(), store.commit_delta(id, delta).await),
                SyncOp::Account(account) => {
                    (account.id.clone(), store.commit_account(account).await)
                }
            };
            match result {
                Ok(()) => debug!(account = %id, "remote commit applied"),
                Err(err) => {
                    // Kept asymmetry: plain sends are UI-first, so the
                    // optimistic local state stands even when the remote
                    // write is lost.
                    warn!(account = %id, error = %err, "remote commit failed");
                    let _ = events.send(RoomEvent::SyncFailed { account: id });
                }
            }
        }
    })
}
