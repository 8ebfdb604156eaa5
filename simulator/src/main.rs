//! Scripted local run: seeds a small room, plays a short gift and game
//! session, and logs every room event.

use rand::Rng;
use sahra_engine::RoomContext;
use sahra_simulator::Simulator;
use sahra_types::{Account, AccountId, GameSettings, Gift, GiftCategory, RoomEvent};
use tracing::info;

fn rose() -> Gift {
    Gift {
        id: "rose".to_string(),
        name: "Rose".to_string(),
        icon: "🌹".to_string(),
        cost: 100,
        category: GiftCategory::Popular,
        is_lucky: false,
    }
}

fn clover() -> Gift {
    Gift {
        id: "clover".to_string(),
        name: "Lucky Clover".to_string(),
        icon: "🍀".to_string(),
        cost: 500,
        category: GiftCategory::Lucky,
        is_lucky: true,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let simulator = Simulator::new(
        GameSettings::default(),
        RoomContext {
            id: "lobby".to_string(),
            title: "Starlight Lobby".to_string(),
        },
    );
    simulator.seed(Account::new("host", "Lina"));
    simulator.seed(Account::new("guest", "Yara"));
    let mut agent = Account::new("agent", "Marco");
    agent.agency_balance = Some(1_000_000);
    simulator.seed(agent);

    let mut session = simulator.session(rand::thread_rng().gen());
    let mut events = session.subscribe_events();
    let host = AccountId::from("host");
    let guest = AccountId::from("guest");
    let agent = AccountId::from("agent");

    // A short combo of roses, then a handful of lucky clovers.
    for _ in 0..3 {
        let result = session.send_gift(&host, &rose(), 1, Some(&guest))?;
        info!(strikes = result.combo.strikes, "rose sent");
    }
    for _ in 0..5 {
        let result = session.send_gift(&host, &clover(), 1, None)?;
        if let Some(outcome) = result.lucky {
            info!(won = outcome.won, payout = outcome.payout, "clover resolved");
        }
    }

    // A few rounds at the machines.
    for _ in 0..5 {
        let spin = session.spin_slots(&host, 50)?;
        info!(reels = ?spin.reels, payout = spin.outcome.payout, "slots");
    }
    session.place_wheel_bet(&host, "777", 100)?;
    session.place_wheel_bet(&host, "grape", 100)?;
    let spin = session.resolve_wheel(&host)?;
    info!(
        landed = %spin.outcome_id,
        payout = spin.outcome.payout,
        "wheel"
    );

    // The agency tops the guest up.
    let result = session.charge_via_agency(&agent, &guest, 25_000).await?;
    info!(
        agent_balance = result.agent_balance,
        target_coins = result.target_coins,
        "agency recharge"
    );

    while let Ok(event) = events.try_recv() {
        match event {
            RoomEvent::Chat(chat) => info!(sender = %chat.sender_name, "chat: {:?}", chat.content),
            RoomEvent::Announcement(announcement) => {
                info!(room = %announcement.room_title, amount = announcement.amount, "announcement")
            }
            other => info!("event: {other:?}"),
        }
    }

    let summary = session
        .ledger()
        .get(&host)
        .map(|account| (account.coins, account.wealth));
    info!(?summary, "host wallet after session");
    Ok(())
}
