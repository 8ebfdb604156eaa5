//! Random outcome resolution for slots, the prize wheel, and lucky gifts.
//!
//! Every function here is pure: given a random source and a payout table it
//! decides win/loss and payout magnitude without touching any balance.
//! Callers inject the `Rng`, so statistical properties are testable with
//! fixed seeds.

use std::collections::BTreeMap;

use rand::Rng;
use sahra_types::{GameSettings, LuckyTier, SlotSymbol, WheelOutcome, WHEEL_JACKPOT_ID};

use crate::{EngineError, Result};

/// Result of one resolver invocation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpinOutcome {
    pub won: bool,
    pub multiplier: f64,
    /// `bet × multiplier` for the entry actually selected; 0 on loss.
    pub payout: u64,
}

impl SpinOutcome {
    fn loss() -> Self {
        Self {
            won: false,
            multiplier: 0.0,
            payout: 0,
        }
    }
}

/// One resolved slot spin. `reels` are indices into the payout table; on a
/// win all three match the paying symbol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotSpin {
    pub outcome: SpinOutcome,
    pub reels: [usize; 3],
}

/// One resolved wheel spin. `segment` is the index of the winning segment
/// in the outcome table.
#[derive(Clone, Debug, PartialEq)]
pub struct WheelSpin {
    pub outcome: SpinOutcome,
    pub segment: usize,
    pub outcome_id: String,
}

/// Draw one uniform value in [0, 100) and report whether it beat the rate.
///
/// A rate of 0 never wins, a rate of 100 (or more) always wins.
pub fn resolve_simple_win(rng: &mut impl Rng, win_rate_percent: f64) -> bool {
    rng.gen_range(0.0..100.0) < win_rate_percent
}

/// Select the tier a given roll in [0, 100) lands on.
///
/// Walks the tier list in its configured order accumulating `chance` and
/// returns the first tier whose cumulative chance reaches the roll. Rolls
/// past the cumulative total (chances summing under 100, or rounding at the
/// edge) land on the last tier.
pub fn weighted_tier_for_roll(tiers: &[LuckyTier], roll: f64) -> Result<&LuckyTier> {
    if tiers.is_empty() {
        return Err(EngineError::Config("empty lucky tier table"));
    }
    let mut cumulative = 0.0;
    for tier in tiers {
        cumulative += tier.chance;
        if cumulative >= roll {
            return Ok(tier);
        }
    }
    Ok(&tiers[tiers.len() - 1])
}

/// Draw a roll and select a tier by relative weight. Tier order matters and
/// must be preserved from configuration.
pub fn resolve_weighted_tier<'a>(
    rng: &mut impl Rng,
    tiers: &'a [LuckyTier],
) -> Result<&'a LuckyTier> {
    weighted_tier_for_roll(tiers, rng.gen_range(0.0..100.0))
}

/// Resolve one slot spin against a flat win rate.
///
/// On a win one symbol is drawn uniformly and shown on all three reels. On
/// a loss the reels are drawn independently, re-rolling the third until the
/// display is not a triple: a "no-win" spin must never present an
/// undeserved three-of-a-kind.
pub fn resolve_slot_spin(
    rng: &mut impl Rng,
    bet: u64,
    win_rate_percent: f64,
    table: &[SlotSymbol],
) -> Result<SlotSpin> {
    if table.len() < 2 {
        return Err(EngineError::Config("slot payout table needs two symbols"));
    }
    if resolve_simple_win(rng, win_rate_percent) {
        let index = rng.gen_range(0..table.len());
        let symbol = &table[index];
        return Ok(SlotSpin {
            outcome: SpinOutcome {
                won: true,
                multiplier: symbol.multiplier as f64,
                payout: bet * symbol.multiplier,
            },
            reels: [index; 3],
        });
    }

    let first = rng.gen_range(0..table.len());
    let second = rng.gen_range(0..table.len());
    let mut third = rng.gen_range(0..table.len());
    while first == second && third == first {
        third = rng.gen_range(0..table.len());
    }
    Ok(SlotSpin {
        outcome: SpinOutcome::loss(),
        reels: [first, second, third],
    })
}

/// Resolve one wheel spin for the given stakes.
///
/// The win/loss decision biases segment selection toward the jackpot: a win
/// lands on the configured jackpot segment when present (uniform fallback
/// otherwise), a loss lands uniformly anywhere. There is deliberately no
/// guard against a "loss" draw landing on a staked segment; the loss path
/// stays uniform. Payout covers only the stake on the winning outcome id;
/// stakes on every other outcome are forfeited.
pub fn resolve_wheel_spin(
    rng: &mut impl Rng,
    bets: &BTreeMap<String, u64>,
    win_rate_percent: f64,
    table: &[WheelOutcome],
) -> Result<WheelSpin> {
    if table.is_empty() {
        return Err(EngineError::Config("empty wheel outcome table"));
    }
    let won = resolve_simple_win(rng, win_rate_percent);
    let segment = if won {
        table
            .iter()
            .position(|outcome| outcome.id == WHEEL_JACKPOT_ID)
            .unwrap_or_else(|| rng.gen_range(0..table.len()))
    } else {
        rng.gen_range(0..table.len())
    };
    let winning = &table[segment];
    let staked = bets.get(&winning.id).copied().unwrap_or(0);
    Ok(WheelSpin {
        outcome: SpinOutcome {
            won,
            multiplier: winning.multiplier as f64,
            payout: staked * winning.multiplier,
        },
        segment,
        outcome_id: winning.id.clone(),
    })
}

/// Resolve the refund for one lucky-gift send.
///
/// Loss pays nothing. A win pays `total_cost × tier.value` through the
/// weighted tier table when tiers are enabled and configured, or the flat
/// `floor(total_cost × refund_percent / 100)` otherwise.
pub fn resolve_lucky_refund(
    rng: &mut impl Rng,
    total_cost: u64,
    settings: &GameSettings,
) -> Result<SpinOutcome> {
    if !resolve_simple_win(rng, settings.lucky_gift_win_rate) {
        return Ok(SpinOutcome::loss());
    }
    if settings.lucky_tiers_enabled && !settings.lucky_tiers.is_empty() {
        let tier = resolve_weighted_tier(rng, &settings.lucky_tiers)?;
        return Ok(SpinOutcome {
            won: true,
            multiplier: tier.value,
            payout: (total_cost as f64 * tier.value).floor() as u64,
        });
    }
    let percent = settings.lucky_gift_refund_percent;
    Ok(SpinOutcome {
        won: true,
        multiplier: percent / 100.0,
        payout: (total_cost as f64 * percent / 100.0).floor() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use sahra_types::{GameSettings, SlotSymbol, WheelOutcome};

    fn tiers() -> Vec<LuckyTier> {
        GameSettings::default().lucky_tiers
    }

    #[test]
    fn test_simple_win_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            assert!(!resolve_simple_win(&mut rng, 0.0));
            assert!(resolve_simple_win(&mut rng, 100.0));
        }
    }

    #[test]
    fn test_weighted_tier_cumulative_walk() {
        let tiers = tiers();
        // Cumulative chances: 70, 90, 98, 100.
        assert_eq!(weighted_tier_for_roll(&tiers, 0.0).unwrap().label, "X10");
        assert_eq!(weighted_tier_for_roll(&tiers, 70.0).unwrap().label, "X10");
        assert_eq!(weighted_tier_for_roll(&tiers, 75.0).unwrap().label, "X50");
        assert_eq!(weighted_tier_for_roll(&tiers, 95.0).unwrap().label, "X100");
        assert_eq!(weighted_tier_for_roll(&tiers, 99.5).unwrap().label, "X500");
    }

    #[test]
    fn test_weighted_tier_fall_through_selects_last() {
        // Chances sum to 50; anything above lands on the final tier.
        let tiers = vec![
            LuckyTier {
                label: "A".to_string(),
                value: 2.0,
                chance: 30.0,
            },
            LuckyTier {
                label: "B".to_string(),
                value: 5.0,
                chance: 20.0,
            },
        ];
        assert_eq!(weighted_tier_for_roll(&tiers, 99.0).unwrap().label, "B");
    }

    #[test]
    fn test_weighted_tier_empty_table_is_config_error() {
        let mut rng = StdRng::seed_from_u64(2);
        assert!(matches!(
            resolve_weighted_tier(&mut rng, &[]),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_weighted_tier_deterministic_with_seed() {
        let tiers = tiers();
        let picks = |seed: u64| -> Vec<String> {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..50)
                .map(|_| resolve_weighted_tier(&mut rng, &tiers).unwrap().label.clone())
                .collect()
        };
        assert_eq!(picks(7), picks(7));
        assert_ne!(picks(7), picks(8));
    }

    #[test]
    fn test_slot_win_pays_selected_symbol() {
        let table = SlotSymbol::default_table();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1_000 {
            let spin = resolve_slot_spin(&mut rng, 100, 100.0, &table).unwrap();
            assert!(spin.outcome.won);
            let [a, b, c] = spin.reels;
            assert_eq!(a, b);
            assert_eq!(b, c);
            assert_eq!(spin.outcome.payout, 100 * table[a].multiplier);
        }
    }

    #[test]
    fn test_slot_loss_never_shows_triple() {
        let table = SlotSymbol::default_table();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..10_000 {
            let spin = resolve_slot_spin(&mut rng, 100, 0.0, &table).unwrap();
            assert!(!spin.outcome.won);
            assert_eq!(spin.outcome.payout, 0);
            let [a, b, c] = spin.reels;
            assert!(!(a == b && b == c), "losing spin displayed a triple");
        }
    }

    #[test]
    fn test_slot_table_too_small_is_config_error() {
        let mut rng = StdRng::seed_from_u64(5);
        let one = vec![SlotSymbol {
            id: "cherry".to_string(),
            icon: "🍒".to_string(),
            multiplier: 2,
        }];
        assert!(matches!(
            resolve_slot_spin(&mut rng, 100, 50.0, &one),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            resolve_slot_spin(&mut rng, 100, 50.0, &[]),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_wheel_win_biases_to_jackpot() {
        let table = WheelOutcome::default_table(8, 2);
        let mut rng = StdRng::seed_from_u64(6);
        let mut bets = BTreeMap::new();
        bets.insert("777".to_string(), 1_000u64);
        for _ in 0..100 {
            let spin = resolve_wheel_spin(&mut rng, &bets, 100.0, &table).unwrap();
            assert_eq!(spin.outcome_id, "777");
            assert_eq!(spin.outcome.payout, 8_000);
        }
    }

    #[test]
    fn test_wheel_win_without_jackpot_segment_falls_back_uniform() {
        let table = vec![
            WheelOutcome {
                id: "apple".to_string(),
                label: "Apple".to_string(),
                icon: "🍎".to_string(),
                multiplier: 2,
            },
            WheelOutcome {
                id: "grape".to_string(),
                label: "Grape".to_string(),
                icon: "🍇".to_string(),
                multiplier: 2,
            },
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let bets = BTreeMap::new();
        for _ in 0..100 {
            let spin = resolve_wheel_spin(&mut rng, &bets, 100.0, &table).unwrap();
            assert!(spin.segment < table.len());
            // Nothing staked, so even a win pays nothing.
            assert_eq!(spin.outcome.payout, 0);
        }
    }

    #[test]
    fn test_wheel_pays_only_staked_outcome() {
        let table = WheelOutcome::default_table(8, 2);
        let mut rng = StdRng::seed_from_u64(8);
        let mut bets = BTreeMap::new();
        bets.insert("watermelon".to_string(), 500u64);
        // Forced win lands on the jackpot, which carries no stake.
        let spin = resolve_wheel_spin(&mut rng, &bets, 100.0, &table).unwrap();
        assert_eq!(spin.outcome_id, "777");
        assert_eq!(spin.outcome.payout, 0);
    }

    #[test]
    fn test_wheel_empty_table_is_config_error() {
        let mut rng = StdRng::seed_from_u64(9);
        assert!(matches!(
            resolve_wheel_spin(&mut rng, &BTreeMap::new(), 50.0, &[]),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_lucky_refund_loss_pays_nothing() {
        let mut settings = GameSettings::default();
        settings.lucky_gift_win_rate = 0.0;
        let mut rng = StdRng::seed_from_u64(10);
        let outcome = resolve_lucky_refund(&mut rng, 500, &settings).unwrap();
        assert!(!outcome.won);
        assert_eq!(outcome.payout, 0);
    }

    #[test]
    fn test_lucky_refund_flat_when_tiers_disabled() {
        let mut settings = GameSettings::default();
        settings.lucky_gift_win_rate = 100.0;
        settings.lucky_tiers_enabled = false;
        settings.lucky_gift_refund_percent = 200.0;
        let mut rng = StdRng::seed_from_u64(11);
        let outcome = resolve_lucky_refund(&mut rng, 500, &settings).unwrap();
        assert!(outcome.won);
        assert_eq!(outcome.payout, 1_000);
    }

    #[test]
    fn test_lucky_refund_tiered_payout_matches_selected_tier() {
        let mut settings = GameSettings::default();
        settings.lucky_gift_win_rate = 100.0;
        settings.lucky_tiers_enabled = true;
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..1_000 {
            let outcome = resolve_lucky_refund(&mut rng, 100, &settings).unwrap();
            assert!(outcome.won);
            assert_eq!(outcome.payout, (100.0 * outcome.multiplier) as u64);
            assert!(settings
                .lucky_tiers
                .iter()
                .any(|tier| tier.value == outcome.multiplier));
        }
    }

    #[test]
    fn test_lucky_refund_empty_tiers_falls_back_to_flat() {
        let mut settings = GameSettings::default();
        settings.lucky_gift_win_rate = 100.0;
        settings.lucky_tiers_enabled = true;
        settings.lucky_tiers.clear();
        settings.lucky_gift_refund_percent = 150.0;
        let mut rng = StdRng::seed_from_u64(13);
        let outcome = resolve_lucky_refund(&mut rng, 1_000, &settings).unwrap();
        assert_eq!(outcome.payout, 1_500);
    }
}
