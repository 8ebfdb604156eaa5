//! Gift-combo aggregation: a timed streak of identical repeated sends.
//!
//! The state machine itself is pure and tick-driven so it can be tested
//! headlessly; [`ComboTicker`] drives it from a fixed-period tokio timer
//! and is cancelled whenever it is dropped or the streak goes idle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sahra_types::{AccountId, RoomEvent, COMBO_TICK, COMBO_TICKS};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

/// Streak state. The combo key is the (gift, recipient) pair: a send with a
/// different key replaces the session instead of extending it.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Combo {
    #[default]
    Idle,
    Active {
        gift_id: String,
        recipient: Option<AccountId>,
        strikes: u32,
        remaining_ticks: u32,
    },
}

/// What one tick did to the streak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// No streak to count down.
    Idle,
    /// Still counting down.
    Running,
    /// This tick ran the countdown out; the streak is now idle.
    Expired,
}

/// Read-only projection for the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ComboSnapshot {
    pub active: bool,
    pub strikes: u32,
    pub remaining_secs: f64,
}

impl Combo {
    /// Fold a successful send into the streak: a matching key increments
    /// the strike count, anything else starts a fresh session. Either way
    /// the countdown resets to the full window.
    pub fn note_send(&mut self, gift_id: &str, recipient: Option<&AccountId>) -> ComboSnapshot {
        let strikes = match self {
            Combo::Active {
                gift_id: active_gift,
                recipient: active_recipient,
                strikes,
                ..
            } if active_gift == gift_id && active_recipient.as_ref() == recipient => *strikes + 1,
            _ => 1,
        };
        *self = Combo::Active {
            gift_id: gift_id.to_string(),
            recipient: recipient.cloned(),
            strikes,
            remaining_ticks: COMBO_TICKS,
        };
        self.snapshot()
    }

    /// Force the streak idle (insufficient funds, room exit).
    pub fn cancel(&mut self) {
        *self = Combo::Idle;
    }

    /// Count down one 50 ms tick.
    pub fn tick(&mut self) -> Tick {
        match self {
            Combo::Idle => Tick::Idle,
            Combo::Active {
                remaining_ticks, ..
            } => {
                *remaining_ticks -= 1;
                if *remaining_ticks == 0 {
                    *self = Combo::Idle;
                    Tick::Expired
                } else {
                    Tick::Running
                }
            }
        }
    }

    pub fn snapshot(&self) -> ComboSnapshot {
        match self {
            Combo::Idle => ComboSnapshot {
                active: false,
                strikes: 0,
                remaining_secs: 0.0,
            },
            Combo::Active {
                strikes,
                remaining_ticks,
                ..
            } => ComboSnapshot {
                active: true,
                strikes: *strikes,
                remaining_secs: f64::from(*remaining_ticks) * COMBO_TICK.as_secs_f64(),
            },
        }
    }
}

/// Lock a shared combo, recovering from a poisoned mutex (the state machine
/// holds no invariants a panicking ticker could break).
pub(crate) fn lock(combo: &Mutex<Combo>) -> MutexGuard<'_, Combo> {
    combo.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fixed-period driver for a shared [`Combo`].
///
/// One ticker exists per dispatcher; it exits as soon as the streak goes
/// idle (expiry or cancellation) and is aborted on drop so a replaced
/// session never leaves two timers racing over the same state.
pub struct ComboTicker {
    handle: JoinHandle<()>,
}

impl ComboTicker {
    pub fn spawn(combo: Arc<Mutex<Combo>>, events: broadcast::Sender<RoomEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(COMBO_TICK);
            // The first tick of a tokio interval fires immediately; skip it
            // so the window is a full five seconds.
            interval.tick().await;
            loop {
                interval.tick().await;
                match lock(&combo).tick() {
                    Tick::Running => {}
                    Tick::Idle => break,
                    Tick::Expired => {
                        debug!("combo streak expired");
                        let _ = events.send(RoomEvent::ComboExpired);
                        break;
                    }
                }
            }
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ComboTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sahra_types::COMBO_TICKS;

    #[test]
    fn test_first_send_starts_streak() {
        let mut combo = Combo::default();
        let snapshot = combo.note_send("rose", None);
        assert!(snapshot.active);
        assert_eq!(snapshot.strikes, 1);
        assert_eq!(snapshot.remaining_secs, 5.0);
    }

    #[test]
    fn test_matching_sends_increment_and_reset() {
        let mut combo = Combo::default();
        let recipient = AccountId::from("u2");
        combo.note_send("rose", Some(&recipient));
        for _ in 0..40 {
            combo.tick();
        }
        let snapshot = combo.note_send("rose", Some(&recipient));
        assert_eq!(snapshot.strikes, 2);
        assert_eq!(snapshot.remaining_secs, 5.0);
        let snapshot = combo.note_send("rose", Some(&recipient));
        assert_eq!(snapshot.strikes, 3);
    }

    #[test]
    fn test_key_change_replaces_streak() {
        let mut combo = Combo::default();
        let u2 = AccountId::from("u2");
        let u3 = AccountId::from("u3");
        combo.note_send("rose", Some(&u2));
        combo.note_send("rose", Some(&u2));

        // Different recipient: new session, not strike three.
        let snapshot = combo.note_send("rose", Some(&u3));
        assert_eq!(snapshot.strikes, 1);

        combo.note_send("rose", Some(&u3));
        // Different gift: new session again.
        let snapshot = combo.note_send("ring", Some(&u3));
        assert_eq!(snapshot.strikes, 1);
    }

    #[test]
    fn test_countdown_expires_to_idle() {
        let mut combo = Combo::default();
        combo.note_send("rose", None);
        for _ in 0..COMBO_TICKS - 1 {
            assert_eq!(combo.tick(), Tick::Running);
        }
        assert_eq!(combo.tick(), Tick::Expired);
        let snapshot = combo.snapshot();
        assert!(!snapshot.active);
        assert_eq!(snapshot.strikes, 0);
        assert_eq!(combo.tick(), Tick::Idle);
    }

    #[test]
    fn test_cancel_forces_idle() {
        let mut combo = Combo::default();
        combo.note_send("rose", None);
        combo.cancel();
        assert_eq!(combo, Combo::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_expires_streak_and_notifies() {
        let combo = Arc::new(Mutex::new(Combo::default()));
        lock(&combo).note_send("rose", None);
        let (events, mut rx) = broadcast::channel(8);
        let ticker = ComboTicker::spawn(combo.clone(), events);

        // Just short of the window: still active.
        tokio::time::sleep(std::time::Duration::from_millis(4_900)).await;
        assert!(lock(&combo).snapshot().active);

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(!lock(&combo).snapshot().active);
        assert_eq!(rx.try_recv().unwrap(), RoomEvent::ComboExpired);
        assert!(ticker.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stops_after_cancel() {
        let combo = Arc::new(Mutex::new(Combo::default()));
        lock(&combo).note_send("rose", None);
        let (events, mut rx) = broadcast::channel(8);
        let ticker = ComboTicker::spawn(combo.clone(), events);

        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        lock(&combo).cancel();
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(ticker.is_finished());
        assert!(rx.try_recv().is_err());
    }
}
