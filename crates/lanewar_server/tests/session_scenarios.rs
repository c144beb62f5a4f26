//! End-to-end session scenarios driven through envelopes and ticks.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use lanewar_core::{
    Catalog, EntityCategory, LaneRoutes, MatchConfig, MatchState, SeatId, Team, Vec2, WorldState,
};
use lanewar_protocol::{
    DiffBatch, Envelope, GameAction, MsgChat, MsgPlayCard, MsgPlayer, MsgPlayerConnect,
    MsgPlayerSettings, ProtocolError,
};
use lanewar_server::{
    Admission, ClientId, MatchSession, NullRecorder, Outbound, ServerError, Simulation, StraightLine,
};

const TICK: f32 = 0.1;

fn session(config: MatchConfig) -> (MatchSession, Receiver<Outbound>) {
    let routes = Arc::new(LaneRoutes::builtin());
    let world = WorldState::new("scenario", config, &routes).unwrap();
    let engine = Simulation::new(world, routes, Arc::new(Catalog::builtin()), Box::new(StraightLine));
    MatchSession::new(engine, Box::new(NullRecorder))
}

fn join(session: &mut MatchSession, client: u32, user: &str) -> SeatId {
    session
        .connect(
            ClientId(client),
            &MsgPlayerConnect {
                user_id: user.into(),
                username: user.into(),
                game_uid: "scenario".into(),
                nb_players: 2,
                observer: false,
            },
        )
        .unwrap()
        .expect("a free seat")
}

fn ready(session: &mut MatchSession, client: u32) -> Result<Admission, ServerError> {
    let settings = MsgPlayerSettings {
        deck: Catalog::STARTER_DECK.into(),
        ..MsgPlayerSettings::default()
    };
    session.receive(
        ClientId(client),
        &Envelope::new(GameAction::PlayerSettings, &settings).unwrap(),
    )
}

/// Two seated, ready clients; the first tick starts the match.
fn started(config: MatchConfig) -> (MatchSession, Receiver<Outbound>) {
    let (mut session, rx) = session(config);
    join(&mut session, 1, "alice");
    join(&mut session, 2, "bob");
    ready(&mut session, 1).unwrap();
    ready(&mut session, 2).unwrap();
    session.tick(TICK);
    assert_eq!(session.engine().world().state(), MatchState::Play);
    (session, rx)
}

fn drain(rx: &Receiver<Outbound>) -> Vec<Envelope> {
    rx.try_iter().map(|o| o.envelope).collect()
}

fn count(envelopes: &[Envelope], action: GameAction) -> usize {
    envelopes.iter().filter(|e| e.action() == Some(action)).count()
}

fn chat(text: &str) -> Envelope {
    Envelope::new(
        GameAction::ChatMessage,
        &MsgChat {
            player_id: 0,
            msg: text.into(),
        },
    )
    .unwrap()
}

fn collect_chat(rx: &Receiver<Outbound>, echoed: &mut Vec<String>) {
    for envelope in drain(rx) {
        if envelope.action() == Some(GameAction::ChatMessage) {
            echoed.push(envelope.read::<MsgChat>().unwrap().msg);
        }
    }
}

/// First hand card and first athlete of `seat`.
fn card_and_athlete(session: &MatchSession, seat: SeatId) -> (String, String) {
    let player = session.engine().world().player(seat).unwrap();
    (player.hand()[0].clone(), player.athletes()[0].clone())
}

fn play_card(player_id: i32, card_uid: &str, athlete: &str, target: Vec2) -> Envelope {
    Envelope::new(
        GameAction::AssignTask,
        &MsgPlayCard {
            player_id,
            card_uid: card_uid.into(),
            athlete_ids: vec![athlete.into()],
            target_position: target,
        },
    )
    .unwrap()
}

#[test]
fn test_commands_queued_during_resolution_apply_in_order() {
    let (mut session, rx) = started(MatchConfig {
        turn_duration: 0.5,
        resolve_secs: 1.0,
        ..MatchConfig::default()
    });

    while session.stats().turns_executed == 0 {
        session.tick(TICK);
    }
    assert!(session.engine().is_resolving());
    drain(&rx);

    for text in ["C1", "C2", "C3"] {
        assert_eq!(session.receive(ClientId(1), &chat(text)).unwrap(), Admission::Queued);
    }
    assert_eq!(session.queued_commands(), 3);
    assert_eq!(count(&drain(&rx), GameAction::ChatMessage), 0);

    let mut echoed = Vec::new();
    for _ in 0..40 {
        session.tick(TICK);
        for envelope in drain(&rx) {
            if envelope.action() == Some(GameAction::ChatMessage) {
                echoed.push(envelope.read::<MsgChat>().unwrap().msg);
            }
        }
    }
    assert_eq!(echoed, vec!["C1", "C2", "C3"]);
    assert_eq!(session.queued_commands(), 0);
    assert_eq!(session.stats().commands_queued, 3);
}

#[test]
fn test_late_command_waits_behind_queued_ones() {
    let (mut session, rx) = started(MatchConfig {
        turn_duration: 0.5,
        resolve_secs: 1.0,
        ..MatchConfig::default()
    });

    while session.stats().turns_executed == 0 {
        session.tick(TICK);
    }
    drain(&rx);
    for text in ["C1", "C2", "C3"] {
        session.receive(ClientId(1), &chat(text)).unwrap();
    }

    let mut echoed = Vec::new();
    while session.engine().is_resolving() {
        session.tick(TICK);
        collect_chat(&rx, &mut echoed);
    }
    assert!(session.queued_commands() > 0);

    // Resolution is over but earlier commands still wait
    assert_eq!(session.receive(ClientId(1), &chat("C4")).unwrap(), Admission::Queued);
    for _ in 0..40 {
        session.tick(TICK);
        collect_chat(&rx, &mut echoed);
    }
    assert_eq!(echoed, vec!["C1", "C2", "C3", "C4"]);
    assert_eq!(session.queued_commands(), 0);
}

#[test]
fn test_commands_dispatch_immediately_when_not_resolving() {
    let (mut session, rx) = started(MatchConfig::default());
    drain(&rx);
    assert_eq!(
        session.receive(ClientId(1), &chat("hi")).unwrap(),
        Admission::Dispatched
    );
    assert_eq!(count(&drain(&rx), GameAction::ChatMessage), 1);
}

#[test]
fn test_spoofed_resign_leaves_match_untouched() {
    let (mut session, rx) = started(MatchConfig::default());
    drain(&rx);

    let forged = Envelope::new(GameAction::Resign, &MsgPlayer { player_id: 1 }).unwrap();
    let result = session.receive(ClientId(1), &forged);
    assert!(matches!(
        result,
        Err(ServerError::Spoofed {
            seat: SeatId(0),
            declared: 1
        })
    ));

    let world = session.engine().world();
    assert_eq!(world.state(), MatchState::Play);
    assert_eq!(world.winner(), None);
    assert_eq!(count(&drain(&rx), GameAction::GameEnd), 0);
    assert_eq!(session.stats().commands_rejected, 1);
}

#[test]
fn test_spoofed_card_play_changes_nothing() {
    let (mut session, rx) = started(MatchConfig::default());
    drain(&rx);

    let victim = SeatId(1);
    let (uid, athlete) = card_and_athlete(&session, victim);
    let snapshot = |session: &MatchSession| {
        let world = session.engine().world();
        let player = world.player(victim).unwrap();
        let hero = world.hero_of(&athlete).unwrap();
        (
            player.hand().to_vec(),
            player.discard().to_vec(),
            player.history().len(),
            hero.position(),
            hero.as_hero().unwrap().path().copied().collect::<Vec<_>>(),
            world.athlete(&athlete).unwrap().current_mission.clone(),
        )
    };
    let before = snapshot(&session);

    // Seat 0 claims to be seat 1 and plays seat 1's card on seat 1's athlete
    let forged = play_card(1, &uid, &athlete, Vec2::new(-4.0, 4.0));
    assert!(matches!(
        session.receive(ClientId(1), &forged),
        Err(ServerError::Spoofed {
            seat: SeatId(0),
            declared: 1
        })
    ));

    assert_eq!(snapshot(&session), before);
    assert!(before.5.is_none());
    let sent = drain(&rx);
    assert_eq!(count(&sent, GameAction::CardPlayed), 0);
    assert_eq!(count(&sent, GameAction::AssignTask), 0);
}

#[test]
fn test_non_finite_target_dropped_at_decode() {
    let (mut session, rx) = started(MatchConfig::default());
    drain(&rx);

    let (uid, athlete) = card_and_athlete(&session, SeatId(0));
    for target in [Vec2::new(f32::INFINITY, 0.0), Vec2::new(f32::NAN, 0.0)] {
        let result = session.receive(ClientId(1), &play_card(0, &uid, &athlete, target));
        assert!(matches!(
            result,
            Err(ServerError::Protocol(ProtocolError::NonFinite {
                field: "target_position"
            }))
        ));
    }
    assert_eq!(session.stats().commands_rejected, 2);

    for _ in 0..10 {
        session.tick(TICK);
    }
    let world = session.engine().world();
    assert!(world.player(SeatId(0)).unwrap().hand().contains(&uid));
    assert!(world.hero_of(&athlete).unwrap().position().is_finite());
    for envelope in drain(&rx) {
        if envelope.action() == Some(GameAction::UpdateMessage) {
            let batch: DiffBatch = envelope.read().unwrap();
            assert!(batch.moved.iter().all(|m| m.position.is_finite()));
        }
    }
}

#[test]
fn test_honest_resign_ends_match() {
    let (mut session, rx) = started(MatchConfig::default());
    drain(&rx);

    let resign = Envelope::new(GameAction::Resign, &MsgPlayer { player_id: 1 }).unwrap();
    session.receive(ClientId(2), &resign).unwrap();

    assert_eq!(session.engine().world().winner(), Some(SeatId(0)));
    let sent = drain(&rx);
    let end = sent
        .iter()
        .find(|e| e.action() == Some(GameAction::GameEnd))
        .unwrap();
    assert_eq!(end.read::<MsgPlayer>().unwrap().player_id, 0);
}

#[test]
fn test_match_starts_exactly_once() {
    let (mut session, rx) = session(MatchConfig::default());
    join(&mut session, 1, "alice");
    join(&mut session, 2, "bob");
    ready(&mut session, 1).unwrap();
    session.tick(TICK);
    assert_eq!(session.engine().world().state(), MatchState::Connecting);

    ready(&mut session, 2).unwrap();
    for _ in 0..5 {
        session.tick(TICK);
    }
    assert_eq!(session.engine().world().state(), MatchState::Play);

    // A late ready is rejected without touching the match
    let late = ready(&mut session, 1);
    assert!(matches!(late, Err(ServerError::WrongState { .. })));
    for _ in 0..5 {
        session.tick(TICK);
    }

    let sent = drain(&rx);
    assert_eq!(count(&sent, GameAction::GameStart), 1);
    assert_eq!(session.engine().world().state(), MatchState::Play);
}

#[test]
fn test_forfeit_awards_remaining_seat() {
    let (mut session, rx) = started(MatchConfig {
        win_expire_secs: 1.0,
        ..MatchConfig::default()
    });
    session.disconnect(ClientId(2)).unwrap();
    drain(&rx);

    for _ in 0..5 {
        session.tick(TICK);
    }
    assert_eq!(session.engine().world().winner(), None);

    for _ in 0..10 {
        session.tick(TICK);
    }
    let world = session.engine().world();
    assert_eq!(world.state(), MatchState::GameEnded);
    assert_eq!(world.winner(), Some(SeatId(0)));

    let sent = drain(&rx);
    assert_eq!(count(&sent, GameAction::GameEnd), 1);
    let end = sent
        .iter()
        .find(|e| e.action() == Some(GameAction::GameEnd))
        .unwrap();
    assert_eq!(end.read::<MsgPlayer>().unwrap().player_id, 0);
}

#[test]
fn test_reconnect_cancels_forfeit() {
    let (mut session, _rx) = started(MatchConfig {
        win_expire_secs: 1.0,
        ..MatchConfig::default()
    });
    session.disconnect(ClientId(2)).unwrap();
    for _ in 0..8 {
        session.tick(TICK);
    }
    assert_eq!(join(&mut session, 3, "bob"), SeatId(1));
    for _ in 0..8 {
        session.tick(TICK);
    }
    assert_eq!(session.engine().world().state(), MatchState::Play);
}

#[test]
fn test_no_forfeit_when_not_dedicated() {
    let (mut session, _rx) = started(MatchConfig {
        win_expire_secs: 0.5,
        dedicated: false,
        ..MatchConfig::default()
    });
    session.disconnect(ClientId(2)).unwrap();
    for _ in 0..20 {
        session.tick(TICK);
    }
    assert_eq!(session.engine().world().state(), MatchState::Play);
}

#[test]
fn test_turn_batches_broadcast_on_timer() {
    let (mut session, rx) = started(MatchConfig {
        turn_duration: 0.45,
        ..MatchConfig::default()
    });
    drain(&rx);

    for _ in 0..21 {
        session.tick(TICK);
    }
    let sent = drain(&rx);
    let batches: Vec<DiffBatch> = sent
        .iter()
        .filter(|e| e.action() == Some(GameAction::UpdateMessage))
        .map(|e| e.read().unwrap())
        .collect();
    assert_eq!(batches.len(), 4);
    assert_eq!(session.stats().turns_executed, 4);
    assert_eq!(session.engine().world().current_turn(), 5);
    let spawned: usize = batches.iter().map(|b| b.spawned.len()).sum();
    assert_eq!(spawned, 6);
}

#[test]
fn test_hero_destroys_tower_over_turns() {
    let routes = Arc::new(LaneRoutes::builtin());
    let world = WorldState::new("siege", MatchConfig::default(), &routes).unwrap();
    let mut sim = Simulation::new(world, routes, Arc::new(Catalog::builtin()), Box::new(StraightLine));

    let tower = sim
        .world()
        .entities_of(EntityCategory::Structure)
        .find(|e| e.team() == Team::TeamA)
        .map(|e| e.id().to_string())
        .unwrap();
    let hero = sim
        .world()
        .team_heroes(Team::TeamB)
        .next()
        .map(|e| e.id().to_string())
        .unwrap();

    // Away from every lane
    let spot = Vec2::new(50.0, 50.0);
    sim.world_mut().entity_mut(&tower).unwrap().set_position(spot);
    sim.world_mut()
        .entity_mut(&hero)
        .unwrap()
        .set_position(spot + Vec2::new(1.0, 0.0));

    let (tower_max, tower_attack) = {
        let t = sim.world().entity(&tower).unwrap();
        (t.max_health(), t.attack())
    };
    let hero_max = sim.world().entity(&hero).unwrap().max_health();
    let hero_attack = sim.world().entity(&hero).unwrap().attack();
    let turns_to_kill = (tower_max + hero_attack - 1) / hero_attack;

    for turn in 1..=turns_to_kill {
        let batch = sim.execute_turn();
        assert_eq!(batch.health.iter().filter(|h| h.id == tower).count(), 1);
        let expected = (tower_max - turn * hero_attack).max(0);
        assert_eq!(sim.world().entity(&tower).unwrap().health(), expected);
    }

    let t = sim.world().entity(&tower).unwrap();
    assert!(t.is_destroyed());
    let hero_health = sim.world().entity(&hero).unwrap().health();
    assert_eq!(hero_health, hero_max - turns_to_kill * tower_attack);

    // A destroyed tower neither takes nor deals damage
    let batch = sim.execute_turn();
    assert!(batch.health.iter().all(|h| h.id != tower && h.id != hero));
    assert_eq!(sim.world().entity(&hero).unwrap().health(), hero_health);
}
