use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};

use crate::WHEEL_JACKPOT_ID;

/// Gift catalog tabs matching the client gift picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GiftCategory {
    Popular = 0,
    Exclusive = 1,
    Lucky = 2,
}

impl Write for GiftCategory {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for GiftCategory {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Popular),
            1 => Ok(Self::Exclusive),
            2 => Ok(Self::Lucky),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for GiftCategory {
    const SIZE: usize = 1;
}

/// Static description of a purchasable gift. Owned by the catalog
/// collaborator; immutable for the duration of one operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Gift {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub cost: u64,
    pub category: GiftCategory,
    pub is_lucky: bool,
}

/// Cosmetic type sold in the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Frame,
    Bubble,
}

/// Store catalog entry (avatar frames, chat bubbles).
#[derive(Clone, Debug, PartialEq)]
pub struct StoreItem {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub price: u64,
}

/// One purchasable VIP tier.
#[derive(Clone, Debug, PartialEq)]
pub struct VipPackage {
    pub level: u8,
    pub name: String,
    pub cost: u64,
}

/// One reel symbol in the slot machine payout table.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotSymbol {
    pub id: String,
    pub icon: String,
    pub multiplier: u64,
}

impl SlotSymbol {
    /// The stock payout table.
    pub fn default_table() -> Vec<SlotSymbol> {
        [
            ("cherry", "🍒", 2),
            ("lemon", "🍋", 3),
            ("grape", "🍇", 5),
            ("diamond", "💎", 10),
            ("seven", "7️⃣", 20),
        ]
        .into_iter()
        .map(|(id, icon, multiplier)| SlotSymbol {
            id: id.to_string(),
            icon: icon.to_string(),
            multiplier,
        })
        .collect()
    }
}

/// One segment of the prize wheel. Several segments may share an id; bets
/// are keyed by id, so duplicates widen a symbol without splitting stakes.
#[derive(Clone, Debug, PartialEq)]
pub struct WheelOutcome {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub multiplier: u64,
}

impl WheelOutcome {
    /// The stock 8-segment wheel with multipliers taken from settings:
    /// the jackpot segment pays `jackpot_multiplier`, everything else
    /// `normal_multiplier`.
    pub fn default_table(jackpot_multiplier: u64, normal_multiplier: u64) -> Vec<WheelOutcome> {
        [
            ("watermelon", "Watermelon", "🍉"),
            ("grape", "Grape", "🍇"),
            (WHEEL_JACKPOT_ID, "Jackpot", "💎"),
            ("watermelon", "Watermelon", "🍉"),
            ("grape", "Grape", "🍇"),
            ("apple", "Apple", "🍎"),
            ("watermelon", "Watermelon", "🍉"),
            ("grape", "Grape", "🍇"),
        ]
        .into_iter()
        .map(|(id, label, icon)| WheelOutcome {
            id: id.to_string(),
            label: label.to_string(),
            icon: icon.to_string(),
            multiplier: if id == WHEEL_JACKPOT_ID {
                jackpot_multiplier
            } else {
                normal_multiplier
            },
        })
        .collect()
    }
}
