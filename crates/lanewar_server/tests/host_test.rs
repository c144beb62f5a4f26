//! Integration tests for the multi-match host.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use lanewar_core::{Catalog, LaneRoutes, MatchConfig, SeatId, WorldState};
use lanewar_protocol::{GameAction, MsgPlayerConnect, MsgPlayerSettings};
use lanewar_server::{
    ClientId, HostConfig, MatchHost, MatchInput, MatchSession, NullRecorder, Outbound, ServerError,
    Simulation, StraightLine,
};

fn ai_match(game_uid: &str, config: MatchConfig) -> (MatchSession, Receiver<Outbound>) {
    let routes = Arc::new(LaneRoutes::builtin());
    let world = WorldState::new(game_uid, config, &routes).unwrap();
    let engine = Simulation::new(world, routes, Arc::new(Catalog::builtin()), Box::new(StraightLine));
    let (mut session, rx) = MatchSession::new(engine, Box::new(NullRecorder));
    for seat in [SeatId(0), SeatId(1)] {
        session.add_ai(seat, &MsgPlayerSettings::default()).unwrap();
    }
    (session, rx)
}

fn fast_config() -> MatchConfig {
    MatchConfig {
        turn_duration: 0.05,
        dedicated: false,
        ..MatchConfig::default()
    }
}

fn observer(game_uid: &str) -> MatchInput {
    MatchInput::Connect {
        client: ClientId(1),
        msg: MsgPlayerConnect {
            user_id: "watcher".into(),
            username: "watcher".into(),
            game_uid: game_uid.into(),
            nb_players: 2,
            observer: true,
        },
    }
}

#[tokio::test]
async fn test_host_runs_matches_independently() {
    let host = MatchHost::new(HostConfig {
        tick_rate: 100,
        ..HostConfig::default()
    });

    let mut receivers = Vec::new();
    for uid in ["m1", "m2", "m3"] {
        let (session, rx) = ai_match(uid, fast_config());
        host.spawn(session).unwrap();
        host.send(uid, observer(uid)).unwrap();
        receivers.push(rx);
    }
    assert_eq!(host.match_count(), 3);

    tokio::time::sleep(Duration::from_millis(400)).await;
    host.shutdown_all();

    let mut uids = host.match_ids();
    uids.sort();
    for uid in uids {
        let report = host.join(&uid).await.unwrap();
        assert_eq!(report.game_uid, uid);
        assert!(report.session.turns_executed > 0, "{uid} ran no turns");
        assert_eq!(u64::from(report.final_turn), report.session.turns_executed + 1);
        assert!(report.ticks.total_ticks > 0);
    }
    assert_eq!(host.match_count(), 0);

    for rx in &receivers {
        let starts = rx
            .try_iter()
            .filter(|o| o.envelope.action() == Some(GameAction::GameStart))
            .count();
        assert_eq!(starts, 1);
    }
}

#[tokio::test]
async fn test_host_rejects_duplicates_and_overflow() {
    let host = MatchHost::new(HostConfig {
        tick_rate: 50,
        max_matches: 1,
    });
    let (first, _rx1) = ai_match("solo", fast_config());
    host.spawn(first).unwrap();

    let (again, _rx2) = ai_match("solo", fast_config());
    assert!(matches!(host.spawn(again), Err(ServerError::HostFull { limit: 1 })));

    let roomy = MatchHost::new(HostConfig::default());
    let (a, _rx3) = ai_match("dup", fast_config());
    let (b, _rx4) = ai_match("dup", fast_config());
    roomy.spawn(a).unwrap();
    assert!(matches!(roomy.spawn(b), Err(ServerError::DuplicateMatch(_))));

    assert!(matches!(
        host.send("missing", MatchInput::Shutdown),
        Err(ServerError::UnknownMatch(_))
    ));

    host.shutdown_all();
    roomy.shutdown_all();
    host.join("solo").await.unwrap();
    roomy.join("dup").await.unwrap();
}

#[tokio::test]
async fn test_idle_match_expires_on_its_own() {
    let host = MatchHost::new(HostConfig {
        tick_rate: 100,
        ..HostConfig::default()
    });
    let (session, _rx) = ai_match(
        "idle",
        MatchConfig {
            game_expire_secs: 0.1,
            ..fast_config()
        },
    );
    host.spawn(session).unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), host.join("idle"))
        .await
        .expect("idle match should expire")
        .unwrap();
    assert_eq!(report.game_uid, "idle");
    assert_eq!(host.reap(), 0);
}
