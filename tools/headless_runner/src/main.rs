mod autopilot;

use anyhow::Context;
use autopilot::Autopilot;
use clap::{Parser, Subcommand};
use sim_core::PlayerId;
use sim_host::{EventBuffer, EventCursor, MatchHost};
use sim_survival::{EntityKind, SurvivalConfig, SurvivalEvent, SurvivalGame};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use survival_types::SurvivalObservation;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Events kept for the live printer between reads.
const EVENT_FEED_CAPACITY: usize = 1024;

#[derive(Parser, Debug)]
#[command(name = "headless_runner")]
#[command(about = "Plays the survival simulation with a scripted player")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// JSON config file; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Stop after this many ticks even if the match is still running
    #[arg(long, default_value_t = 60 * 60 * 10)]
    max_ticks: u64,

    /// Pace ticks at the configured rate and print events as they happen
    #[arg(short, long)]
    realtime: bool,

    /// Print the final observation as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the JSON schema of the observation snapshot
    Schema,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Some(Command::Schema) = args.command {
        let schema = schemars::schema_for!(SurvivalObservation);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SurvivalConfig::from_json_str(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => SurvivalConfig::default(),
    };

    let tick_hz = config.tick_hz;
    let mut host = MatchHost::<SurvivalGame>::new(config, args.seed, tick_hz);
    let player = host.join_player();
    info!(seed = args.seed, tick_hz, "match created");

    let events = if args.realtime {
        run_realtime(&mut host, player, args.max_ticks).await
    } else {
        run_fast(&mut host, player, args.max_ticks)
    };

    println!("\n=== Survival Simulation Complete ===");
    println!("Outcome: {:?}", host.is_terminal());
    println!("Final tick: {}", host.current_tick());
    println!("Seed: {}", host.game().seed());
    print_status(&host);
    print_event_summary(&events);

    if args.json {
        let obs = host.observe(player);
        println!("{}", serde_json::to_string_pretty(&obs)?);
    }

    Ok(())
}

/// Submits the autopilot's actions for the next tick, then steps once.
fn step(
    host: &mut MatchHost<SurvivalGame>,
    player: PlayerId,
    bot: &mut Autopilot,
) -> Option<Vec<SurvivalEvent>> {
    let obs = host.observe(player);
    for action in bot.decide(&obs) {
        host.submit_next(player, action);
    }
    host.step_one_tick()
}

fn run_fast(
    host: &mut MatchHost<SurvivalGame>,
    player: PlayerId,
    max_ticks: u64,
) -> Vec<SurvivalEvent> {
    let mut bot = Autopilot::new(&host.observe(player));
    let mut all_events = Vec::new();

    for _ in 0..max_ticks {
        let Some(events) = step(host, player, &mut bot) else {
            break;
        };
        all_events.extend(events);
    }

    all_events
}

async fn run_realtime(
    host: &mut MatchHost<SurvivalGame>,
    player: PlayerId,
    max_ticks: u64,
) -> Vec<SurvivalEvent> {
    let tick_hz = host.tick_hz();
    let mut ticker = interval(Duration::from_secs_f64(1.0 / tick_hz as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut bot = Autopilot::new(&host.observe(player));
    let mut all_events = Vec::new();
    let mut feed = EventBuffer::new(EVENT_FEED_CAPACITY);
    let mut cursor = EventCursor::default();

    println!("=== Running in Real-Time Mode ({}Hz) ===", tick_hz);
    println!("Press Ctrl+C to stop\n");

    for _ in 0..max_ticks {
        ticker.tick().await;

        let Some(events) = step(host, player, &mut bot) else {
            break;
        };
        feed.extend(host.current_tick(), events.iter().cloned());
        all_events.extend(events);

        let (fresh, next) = feed.read_from(cursor);
        cursor = next;
        for sequenced in &fresh {
            print_event(sequenced.tick, &sequenced.event);
        }

        if host.current_tick() % tick_hz as u64 == 0 {
            print_status(host);
        }
    }

    all_events
}

fn print_event(tick: u64, event: &SurvivalEvent) {
    match event {
        SurvivalEvent::WaveStarted { wave, quota, boss } => {
            let boss = if *boss { " + boss" } else { "" };
            println!("[{:>6}] === Wave {} started ({} zombies{}) ===", tick, wave, quota, boss)
        }
        SurvivalEvent::BossSpawned { wave, .. } => {
            println!("[{:>6}] Boss entered wave {}", tick, wave)
        }
        SurvivalEvent::WaveCleared { wave, reward } => {
            println!("[{:>6}] === Wave {} cleared, +{} ===", tick, wave, reward)
        }
        SurvivalEvent::ShopOpened { next_wave } => {
            println!("[{:>6}] Shop open before wave {}", tick, next_wave)
        }
        SurvivalEvent::EntityDied { kind, pos, .. } => {
            println!("[{:>6}] {} died at ({:.0}, {:.0})", tick, kind.name(), pos.x, pos.y)
        }
        SurvivalEvent::PlayerDamaged { damage, health, .. } => {
            println!("[{:>6}] Player hit for {} ({} left)", tick, damage, health)
        }
        SurvivalEvent::StructurePlaced { kind, cell, cost, .. } => println!(
            "[{:>6}] {} placed at ({}, {}) for {}",
            tick,
            kind.name(),
            cell.x,
            cell.y,
            cost
        ),
        SurvivalEvent::PlaceRejected { kind, reason, .. } => {
            println!("[{:>6}] {} rejected: {}", tick, kind.name(), reason)
        }
        SurvivalEvent::ItemPurchased { item, balance, .. } => {
            println!("[{:>6}] Bought {} ({} left)", tick, item.name(), balance)
        }
        SurvivalEvent::PurchaseRejected { item, reason } => {
            println!("[{:>6}] {} rejected: {}", tick, item.name(), reason)
        }
        SurvivalEvent::GrenadeExploded { pos, .. } => {
            println!("[{:>6}] Grenade exploded at ({:.0}, {:.0})", tick, pos.x, pos.y)
        }
        SurvivalEvent::GameOver { wave } => println!("[{:>6}] GAME OVER in wave {}", tick, wave),
        SurvivalEvent::Victory { waves } => {
            println!("[{:>6}] VICTORY after {} waves", tick, waves)
        }
        // Per-shot and per-hit events are too chatty to print one by one.
        _ => {}
    }
}

fn print_status(host: &MatchHost<SurvivalGame>) {
    let state = host.game().state();
    let time_secs = host.current_tick() as f64 / host.tick_hz() as f64;
    let health = state.player_entity().map_or(0, |e| e.health.current());
    println!(
        "  [{:>5.1}s] Wave {} ({:?}), Zombies: {}, Structures: {}, Cash: {}, Health: {}",
        time_secs,
        state.wave.wave,
        state.wave.phase,
        state.world.count(EntityKind::Zombie),
        state.world.count(EntityKind::Structure),
        state.economy.cash(),
        health,
    );
}

fn print_event_summary(events: &[SurvivalEvent]) {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(event.name()).or_default() += 1;
    }

    println!("\n=== Event Summary ===");
    for (name, count) in counts {
        println!("{:<20} {}", name, count);
    }
}
