use super::*;
use commonware_codec::Encode;
use commonware_codec::ReadExt;

#[test]
fn test_gift_category_roundtrip() {
    for category in [
        GiftCategory::Popular,
        GiftCategory::Exclusive,
        GiftCategory::Lucky,
    ] {
        let encoded = category.encode();
        let decoded = GiftCategory::read(&mut &encoded[..]).unwrap();
        assert_eq!(category, decoded);
    }
}

#[test]
fn test_account_roundtrip() {
    let mut account = Account::new("u1", "Sultan");
    account.coins = 12_345;
    account.wealth = 90_000;
    account.charm = 777;
    account.agency_balance = Some(1_000_000);
    account.total_recharge = 42;
    account.vip_level = 5;
    account.owned_items = vec!["f_neon".to_string(), "b_gold".to_string()];

    let encoded = account.encode();
    let decoded = Account::read(&mut &encoded[..]).unwrap();
    assert_eq!(account, decoded);
}

#[test]
fn test_delta_roundtrip_and_merge() {
    let spend = AccountDelta::gift_spend(1_000);
    let refund = AccountDelta::coins(2_000);
    let merged = spend.merge(refund);
    assert_eq!(merged.coins, 1_000);
    assert_eq!(merged.wealth, 1_000);

    let encoded = merged.encode();
    let decoded = AccountDelta::read(&mut &encoded[..]).unwrap();
    assert_eq!(merged, decoded);
}

#[test]
fn test_settings_roundtrip() {
    let settings = GameSettings::default();
    let encoded = settings.encode();
    let decoded = GameSettings::read(&mut &encoded[..]).unwrap();
    assert_eq!(settings, decoded);

    // The shipped tier table is ordered from the most to the least likely.
    assert_eq!(decoded.lucky_tiers.len(), 4);
    assert_eq!(decoded.lucky_tiers[0].label, "X10");
    assert_eq!(decoded.lucky_tiers[3].value, 500.0);
}

#[test]
fn test_transfer_intent_legs() {
    let intent = TransferIntent {
        agent: AccountId::from("agent"),
        target: AccountId::from("user"),
        amount: 500,
    };
    let [(agent, agent_leg), (target, target_leg)] = intent.legs();
    assert_eq!(agent.as_str(), "agent");
    assert_eq!(agent_leg.agency, -500);
    assert_eq!(target.as_str(), "user");
    assert_eq!(target_leg.coins, 500);
    assert_eq!(target_leg.recharge, 500);

    let encoded = intent.encode();
    let decoded = TransferIntent::read(&mut &encoded[..]).unwrap();
    assert_eq!(intent, decoded);
}

#[test]
fn test_new_account_starter_balances() {
    let account = Account::new("fresh", "Guest");
    assert_eq!(account.coins, STARTING_COINS);
    assert_eq!(account.wealth, 0);
    assert_eq!(account.charm, 0);
    assert!(!account.is_agent());
}
