//! # LANEWAR Match Server
//!
//! Runs headless AI-vs-AI matches on the match host and reports tick
//! statistics.
//!
//! ## Usage
//!
//! ```bash
//! lanewar_server --matches 8 --tick-rate 20 --duration 30 --config data
//! ```
//!
//! `--config` names a directory holding any of `match.toml`, `routes.toml`
//! and `catalog.toml`; missing files fall back to the built-in tables.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use lanewar_core::{Catalog, LaneRoutes, MatchConfig, SeatId, WorldState};
use lanewar_protocol::{MsgPlayerConnect, MsgPlayerSettings};
use lanewar_server::{
    ChannelRecorder, ClientId, HostConfig, MatchHost, MatchInput, MatchSession, Outbound,
    ServerError, ServerResult, Simulation, StraightLine, TickStats, DEFAULT_TICK_RATE,
};
use tracing_subscriber::EnvFilter;

const OBSERVER: ClientId = ClientId(1);

#[derive(Default)]
struct Traffic {
    envelopes: AtomicU64,
    bytes: AtomicU64,
}

struct Options {
    matches: usize,
    tick_rate: u32,
    duration_secs: Option<u64>,
    config_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         LANEWAR MATCH SERVER                                     ║");
    println!("║         AUTHORITATIVE TURN SIMULATION                            ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let Some(options) = parse_args() else {
        return Ok(());
    };

    let (config, routes, catalog) = load_tables(options.config_dir.as_deref())?;

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Matches:            {}", options.matches);
    println!("│ Tick Rate:          {} Hz", options.tick_rate);
    println!("│ Turn Duration:      {}s", config.turn_duration);
    println!("│ Wave Cadence:       every {} turns", config.wave_spawn_cadence);
    if let Some(d) = options.duration_secs {
        println!("│ Duration:           {d} seconds");
    } else {
        println!("│ Duration:           10 seconds (default)");
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .thread_name("lanewar-match")
        .build()?;

    let host = MatchHost::new(HostConfig {
        tick_rate: options.tick_rate,
        ..HostConfig::default()
    });
    let recorder = ChannelRecorder::spawn();
    let traffic = Arc::new(Traffic::default());
    let mut drains = Vec::with_capacity(options.matches);

    let start = Instant::now();
    runtime.block_on(async {
        for i in 0..options.matches {
            let game_uid = format!("match-{i:04}");
            let world = WorldState::new(game_uid.as_str(), config.clone(), &routes)?;
            let engine = Simulation::new(
                world,
                Arc::clone(&routes),
                Arc::clone(&catalog),
                Box::new(StraightLine),
            );
            let (mut session, outbound) = MatchSession::new(engine, Box::new(recorder.clone()));
            for seat in [SeatId(0), SeatId(1)] {
                session.add_ai(
                    seat,
                    &MsgPlayerSettings {
                        ai_level: 1,
                        ..MsgPlayerSettings::default()
                    },
                )?;
            }
            host.spawn(session)?;
            host.send(
                &game_uid,
                MatchInput::Connect {
                    client: OBSERVER,
                    msg: MsgPlayerConnect {
                        user_id: "observer".into(),
                        username: "observer".into(),
                        game_uid: game_uid.clone(),
                        nb_players: 2,
                        observer: true,
                    },
                },
            )?;
            drains.push(spawn_drain(outbound, Arc::clone(&traffic)));
        }
        Ok::<(), ServerError>(())
    })?;

    println!("Started {} matches", host.match_count());
    println!();

    let duration = Duration::from_secs(options.duration_secs.unwrap_or(10));
    let stats_interval = Duration::from_secs(5);
    while start.elapsed() < duration {
        let remaining = duration.saturating_sub(start.elapsed());
        thread::sleep(remaining.min(stats_interval));
        print_status(&host, &traffic, start);
    }

    host.shutdown_all();
    let reports = runtime.block_on(async {
        let mut reports = Vec::new();
        for uid in host.match_ids() {
            match host.join(&uid).await {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!("Match {} failed: {}", uid, e),
            }
        }
        reports
    });

    for drain in drains {
        if drain.join().is_err() {
            tracing::error!("Outbound drain thread panicked");
        }
    }

    let mut ticks = TickStats::default();
    let mut turns = 0u64;
    let mut commands = 0u64;
    let mut dropped = 0u64;
    for report in &reports {
        ticks.merge(&report.ticks);
        turns += report.session.turns_executed;
        commands += report.session.commands_dispatched;
        dropped += report.session.outbound_dropped;
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                    SERVER SHUTDOWN                               ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ Matches:            {:>10}                                 ║", reports.len());
    println!("║ Turns Executed:     {:>10}                                 ║", turns);
    println!("║ Commands Applied:   {:>10}                                 ║", commands);
    println!("║ Envelopes Sent:     {:>10}                                 ║", traffic.envelopes.load(Ordering::Relaxed));
    println!("║ Bytes Sent:         {:>10}                                 ║", traffic.bytes.load(Ordering::Relaxed));
    println!("║ Envelopes Dropped:  {:>10}                                 ║", dropped);
    println!("║ Total Ticks:        {:>10}                                 ║", ticks.total_ticks);
    println!("║ Avg Tick Time:      {:>10} μs                             ║", ticks.avg_tick_us);
    println!("║ Max Tick Time:      {:>10} μs                             ║", ticks.max_tick_us);
    println!("║ Late Ticks:         {:>10}                                 ║", ticks.late_ticks);
    println!("╚══════════════════════════════════════════════════════════════════╝");
    Ok(())
}

fn parse_args() -> Option<Options> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        matches: 4,
        tick_rate: DEFAULT_TICK_RATE,
        duration_secs: None,
        config_dir: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--matches" | "-m" => {
                if i + 1 < args.len() {
                    options.matches = args[i + 1].parse().unwrap_or(4);
                    i += 1;
                }
            }
            "--tick-rate" | "-t" => {
                if i + 1 < args.len() {
                    options.tick_rate = args[i + 1].parse().unwrap_or(DEFAULT_TICK_RATE);
                    i += 1;
                }
            }
            "--duration" | "-d" => {
                if i + 1 < args.len() {
                    options.duration_secs = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    options.config_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: lanewar_server [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -m, --matches <NUM>        Concurrent AI matches (default: 4)");
                println!("  -t, --tick-rate <RATE>     Session tick rate in Hz (default: {DEFAULT_TICK_RATE})");
                println!("  -d, --duration <SECS>      Run for N seconds then exit (default: 10)");
                println!("  -c, --config <DIR>         Directory with match/routes/catalog TOML");
                println!("  -h, --help                 Show this help");
                return None;
            }
            other => tracing::warn!("Unknown argument: {}", other),
        }
        i += 1;
    }
    Some(options)
}

fn load_tables(dir: Option<&Path>) -> ServerResult<(MatchConfig, Arc<LaneRoutes>, Arc<Catalog>)> {
    let Some(dir) = dir else {
        let config = headless(MatchConfig::default())?;
        return Ok((config, Arc::new(LaneRoutes::builtin()), Arc::new(Catalog::builtin())));
    };

    let config = headless(MatchConfig::load(dir.join("match.toml"))?)?;
    let routes_path = dir.join("routes.toml");
    let routes = if routes_path.is_file() {
        LaneRoutes::load(routes_path)?
    } else {
        LaneRoutes::builtin()
    };
    let catalog_path = dir.join("catalog.toml");
    let catalog = if catalog_path.is_file() {
        Catalog::load(catalog_path)?
    } else {
        Catalog::builtin()
    };
    Ok((config, Arc::new(routes), Arc::new(catalog)))
}

/// AI seats need a non-dedicated match.
fn headless(mut config: MatchConfig) -> ServerResult<MatchConfig> {
    if config.seats != 2 {
        return Err(ServerError::Config(format!(
            "headless matches need 2 seats, got {}",
            config.seats
        )));
    }
    config.dedicated = false;
    Ok(config)
}

fn spawn_drain(outbound: Receiver<Outbound>, traffic: Arc<Traffic>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for out in outbound {
            traffic.envelopes.fetch_add(1, Ordering::Relaxed);
            let len = u64::try_from(out.envelope.encode().len()).unwrap_or(u64::MAX);
            traffic.bytes.fetch_add(len, Ordering::Relaxed);
        }
    })
}

fn print_status(host: &MatchHost, traffic: &Traffic, start: Instant) {
    println!("┌─ SERVER STATUS ─────────────────────────────────────────────────");
    println!("│ Uptime:             {:.1}s", start.elapsed().as_secs_f64());
    println!("│ Matches:            {}", host.match_count());
    println!("│ Envelopes Sent:     {}", traffic.envelopes.load(Ordering::Relaxed));
    println!("│ Bytes Sent:         {}", traffic.bytes.load(Ordering::Relaxed));
    println!("└──────────────────────────────────────────────────────────────────");
    println!();
}
