use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};

use crate::{read_f64, read_string, string_encode_size, write_f64, write_string, MAX_LUCKY_TIERS,
    MAX_NAME_LENGTH};

/// One lucky-gift multiplier tier.
///
/// `chance` is a relative weight nominally in 0–100. Tier order is
/// semantic: selection walks the list in configured order accumulating
/// chances, so reordering changes which draws hit which tier. Chances are
/// deliberately not validated to sum to 100; under-100 configurations fall
/// through to the last tier, over-100 configurations starve the tail.
#[derive(Clone, Debug, PartialEq)]
pub struct LuckyTier {
    pub label: String,
    pub value: f64,
    pub chance: f64,
}

impl Write for LuckyTier {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.label, writer);
        write_f64(self.value, writer);
        write_f64(self.chance, writer);
    }
}

impl Read for LuckyTier {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            label: read_string(reader, MAX_NAME_LENGTH)?,
            value: read_f64(reader)?,
            chance: read_f64(reader)?,
        })
    }
}

impl EncodeSize for LuckyTier {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.label) + 8 + 8
    }
}

/// Operator-tunable knobs for every chance mechanism. Delivered by the
/// settings document of the remote store; the default mirrors the shipped
/// product configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSettings {
    /// Flat win rate for slot spins, percent.
    pub slots_win_rate: f64,
    /// Win-bias rate for the prize wheel, percent.
    pub wheel_win_rate: f64,
    /// Win rate for lucky-gift refunds, percent.
    pub lucky_gift_win_rate: f64,
    /// Flat refund on a lucky win when tiers are disabled, percent of cost.
    pub lucky_gift_refund_percent: f64,
    /// Whether lucky wins use the tiered multiplier table.
    pub lucky_tiers_enabled: bool,
    /// Tier table, in selection order.
    pub lucky_tiers: Vec<LuckyTier>,
    /// Multiplier paid by the wheel jackpot segment.
    pub wheel_jackpot_multiplier: u64,
    /// Multiplier paid by every other wheel segment.
    pub wheel_normal_multiplier: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            slots_win_rate: 35.0,
            wheel_win_rate: 45.0,
            lucky_gift_win_rate: 30.0,
            lucky_gift_refund_percent: 200.0,
            lucky_tiers_enabled: true,
            lucky_tiers: vec![
                LuckyTier {
                    label: "X10".to_string(),
                    value: 10.0,
                    chance: 70.0,
                },
                LuckyTier {
                    label: "X50".to_string(),
                    value: 50.0,
                    chance: 20.0,
                },
                LuckyTier {
                    label: "X100".to_string(),
                    value: 100.0,
                    chance: 8.0,
                },
                LuckyTier {
                    label: "X500".to_string(),
                    value: 500.0,
                    chance: 2.0,
                },
            ],
            wheel_jackpot_multiplier: 8,
            wheel_normal_multiplier: 2,
        }
    }
}

impl Write for GameSettings {
    fn write(&self, writer: &mut impl BufMut) {
        write_f64(self.slots_win_rate, writer);
        write_f64(self.wheel_win_rate, writer);
        write_f64(self.lucky_gift_win_rate, writer);
        write_f64(self.lucky_gift_refund_percent, writer);
        self.lucky_tiers_enabled.write(writer);
        self.lucky_tiers.write(writer);
        self.wheel_jackpot_multiplier.write(writer);
        self.wheel_normal_multiplier.write(writer);
    }
}

impl Read for GameSettings {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            slots_win_rate: read_f64(reader)?,
            wheel_win_rate: read_f64(reader)?,
            lucky_gift_win_rate: read_f64(reader)?,
            lucky_gift_refund_percent: read_f64(reader)?,
            lucky_tiers_enabled: bool::read(reader)?,
            lucky_tiers: Vec::<LuckyTier>::read_range(reader, 0..=MAX_LUCKY_TIERS)?,
            wheel_jackpot_multiplier: u64::read(reader)?,
            wheel_normal_multiplier: u64::read(reader)?,
        })
    }
}

impl EncodeSize for GameSettings {
    fn encode_size(&self) -> usize {
        8 + 8
            + 8
            + 8
            + self.lucky_tiers_enabled.encode_size()
            + self.lucky_tiers.encode_size()
            + self.wheel_jackpot_multiplier.encode_size()
            + self.wheel_normal_multiplier.encode_size()
    }
}
