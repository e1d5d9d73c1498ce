use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bj_capture::{ButtonName, ReplayFrame, ReplayTable, ScreenRect};
use bj_data::{HardCode, SoftCode, StrategyTable};
use bj_pilot::{watch_replay, ControlHandle, Pilot, PilotConfig};
use bj_state::Action;
use ButtonName::*;

fn rect(name: ButtonName) -> ScreenRect {
    let i = match name {
        HitAvailable => 0,
        StandAvailable => 1,
        DoubleAvailable => 2,
        SplitAvailable => 3,
        SurrenderAvailable => 4,
        RebetDealAvailable | RebetDealUnavailable => 5,
    };
    ScreenRect::new(400 + i * 140, 880, 520 + i * 140, 930)
}

fn frame(names: &[ButtonName], player: Option<&str>, dealer: Option<&str>) -> ReplayFrame {
    ReplayFrame {
        buttons: names.iter().map(|n| (*n, rect(*n))).collect(),
        player: player.map(str::to_string),
        dealer: dealer.map(str::to_string),
        specific: None,
    }
}

fn data_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

/// Run the loop against `replay` until the recording is used up, with a
/// virtual-time safety net.
async fn play_out(pilot: &mut Pilot<ReplayTable, ReplayTable>, replay: ReplayTable) {
    let control = pilot.control().clone();
    control.arm();
    tokio::select! {
        _ = async { tokio::join!(pilot.run(), watch_replay(replay, control.clone())) } => {}
        _ = tokio::time::sleep(Duration::from_secs(60)) => panic!("replay did not finish"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_hit_then_stand_hand() {
    let strategy = r#"{
        "split": {},
        "surrender": {},
        "soft": {},
        "hard": { "12": { "6": "H" }, "15": { "6": "S" } }
    }"#;
    let table = Arc::new(StrategyTable::from_json(strategy).unwrap());
    let replay = ReplayTable::new(vec![
        frame(&[RebetDealAvailable], None, None),
        frame(&[HitAvailable, StandAvailable, DoubleAvailable], Some("12"), Some("6")),
        frame(&[HitAvailable, StandAvailable], Some("15"), Some("6")),
    ]);

    let config = PilotConfig::default();
    let mut pilot = Pilot::from_config(
        replay.clone(),
        replay.clone(),
        table,
        &config,
        ControlHandle::new(),
    );
    play_out(&mut pilot, replay.clone()).await;

    assert_eq!(
        replay.clicked_buttons(),
        vec![RebetDealAvailable, HitAvailable, StandAvailable]
    );
    assert!(replay.clicks().iter().all(|c| c.button.is_some()));
    assert_eq!(pilot.stats().hands_played(), 1);
    assert_eq!(pilot.stats().bets_placed(), 1);
    assert_eq!(pilot.session().last_action, Action::Stand);
}

#[tokio::test(start_paused = true)]
async fn test_sample_session() {
    let config = PilotConfig::default();
    let table = StrategyTable::load(&data_path("strategy.json")).unwrap();
    let replay = ReplayTable::load(&data_path("replay-sample.json")).unwrap();
    let mut pilot = Pilot::from_config(
        replay.clone(),
        replay.clone(),
        Arc::new(table),
        &config,
        ControlHandle::new(),
    );
    play_out(&mut pilot, replay.clone()).await;

    assert!(replay.is_exhausted());
    assert_eq!(
        replay.clicked_buttons(),
        vec![
            RebetDealAvailable,
            DoubleAvailable,
            RebetDealAvailable,
            HitAvailable,
            StandAvailable,
            RebetDealAvailable,
            // 15 against 10 with an 8 showing is hit, not surrendered
            HitAvailable,
            StandAvailable,
            RebetDealAvailable,
            SplitAvailable,
            StandAvailable,
            HitAvailable,
            StandAvailable,
        ]
    );
    assert_eq!(pilot.stats().hands_played(), 4);
    assert_eq!(pilot.stats().bets_placed(), 6);
    assert!(pilot.session().in_split_hand);
}

#[test]
fn test_shipped_strategy_table() {
    let table = StrategyTable::load(&data_path("strategy.json")).unwrap();
    assert_eq!(table.hard("11", "6"), Some(HardCode::Double));
    assert_eq!(table.hard("16", "10"), Some(HardCode::Hit));
    assert_eq!(table.hard("13", "2"), Some(HardCode::Stand));
    assert_eq!(table.soft("8_18", "3"), Some(SoftCode::DoubleOrStand));
    assert_eq!(table.soft("8_18", "9"), Some(SoftCode::Hit));
    assert_eq!(table.split("16", "1_11"), Some(true));
    assert_eq!(table.split("18", "7"), Some(false));
    assert_eq!(table.surrender("15", "10"), Some(true));
    assert_eq!(table.surrender("16", "1_11"), Some(true));
    assert_eq!(table.surrender("14", "10"), Some(false));

    // Every player key has a column for every upcard
    for dealer in ["2", "3", "4", "5", "6", "7", "8", "9", "10", "1_11"] {
        for total in 4..=20 {
            assert!(table.hard(&total.to_string(), dealer).is_some());
        }
        for low in 1..=10 {
            assert!(table.soft(&format!("{}_{}", low, low + 10), dealer).is_some());
        }
    }
}
