use std::time::Duration;

/// Maximum name length accepted when decoding account records.
pub const MAX_NAME_LENGTH: usize = 64;

/// Maximum identifier length accepted when decoding.
pub const MAX_ID_LENGTH: usize = 64;

/// Maximum owned-item entries accepted when decoding an account.
pub const MAX_OWNED_ITEMS: usize = 256;

/// Maximum lucky-multiplier tiers accepted when decoding settings.
pub const MAX_LUCKY_TIERS: usize = 32;

/// Coins granted to a freshly registered account.
pub const STARTING_COINS: u64 = 50_000;

/// Minimum gift value that triggers a room-wide announcement.
pub const BROADCAST_THRESHOLD: u64 = 5_000;

/// Length of a combo streak window.
pub const COMBO_WINDOW: Duration = Duration::from_secs(5);

/// Resolution of the combo countdown.
pub const COMBO_TICK: Duration = Duration::from_millis(50);

/// Ticks in a full combo window (5 s at 50 ms per tick).
pub const COMBO_TICKS: u32 = (COMBO_WINDOW.as_millis() / COMBO_TICK.as_millis()) as u32;

/// Outcome identifier of the wheel jackpot segment.
pub const WHEEL_JACKPOT_ID: &str = "777";
