#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line driver for gridsnake sessions.
//!
//! The binary loads a session configuration, runs it until the game or the
//! match ends or a tick limit is hit, with the autopilot and difficulty
//! systems attached, and prints a summary of the final state.

mod config;

use std::{io, path::PathBuf, thread, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use gridsnake_core::{
    config::SessionConfig, Command, SnakeId, Standing, TerminationCause, TickOutcome, Transition,
};
use gridsnake_system_autopilot::Autopilot;
use gridsnake_system_difficulty::Difficulty;
use gridsnake_world::{self as world, query, World};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{ModeKind, Overrides, TopologyKind};

/// Command-line arguments accepted by the gridsnake binary.
#[derive(Debug, Parser)]
#[command(name = "gridsnake", about = "Runs a seeded snake session without a display")]
struct CliArgs {
    /// TOML file holding the session configuration.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Board shape, overriding the configuration file.
    #[arg(long, value_enum)]
    topology: Option<TopologyKind>,
    /// Columns of a square board.
    #[arg(long)]
    width: Option<u32>,
    /// Rows of a square board.
    #[arg(long)]
    height: Option<u32>,
    /// Radius of a hexagonal board.
    #[arg(long)]
    radius: Option<u32>,
    /// Seed for the session's random stream.
    #[arg(long)]
    seed: Option<u64>,
    /// Extra autopilot snakes placed on random cells.
    #[arg(long, value_name = "COUNT")]
    ai_snakes: Option<u32>,
    /// Hands the primary snake to the autopilot.
    #[arg(long)]
    autopilot: bool,
    /// Rules that decide when the match ends.
    #[arg(long, value_enum)]
    mode: Option<ModeKind>,
    /// Tick at which a score race ends.
    #[arg(long, value_name = "TICKS")]
    tick_limit: Option<u64>,
    /// Maximum number of ticks to run.
    #[arg(long, default_value_t = 1_000)]
    ticks: u64,
    /// Delay between ticks at the first difficulty level, in milliseconds.
    #[arg(long, value_name = "MILLIS", default_value_t = 150)]
    base_interval: u64,
    /// Sleeps between ticks instead of running as fast as possible.
    #[arg(long)]
    realtime: bool,
}

impl CliArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            topology: self.topology,
            width: self.width,
            height: self.height,
            radius: self.radius,
            seed: self.seed,
            autopilot_snakes: self.ai_snakes,
            autopilot: self.autopilot,
            mode: self.mode,
            tick_limit: self.tick_limit,
        }
    }
}

/// Final state printed once the run stops.
#[derive(Debug, Serialize)]
struct Summary {
    ticks: u64,
    state: String,
    mode: String,
    score: u32,
    length: usize,
    level: &'static str,
    cause: Option<String>,
    winner: Option<u32>,
    tick_interval_ms: u64,
    leaderboard: Vec<Standing>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = CliArgs::parse();
    let base = match &args.config {
        Some(path) => config::load(path)?,
        None => SessionConfig::default(),
    };
    let session = config::apply_overrides(base, &args.overrides());

    let summary = run(session, &args)?;
    let rendered = toml::to_string(&summary).context("failed to render run summary")?;
    print!("{rendered}");
    Ok(())
}

fn run(session: SessionConfig, args: &CliArgs) -> Result<Summary> {
    info!(
        topology = ?session.topology,
        mode = ?session.mode,
        seed = session.seed,
        "starting session"
    );
    let mut autopilot = Autopilot::with_seed(session.seed);
    let mut world = World::new_session(session).context("session configuration rejected")?;
    let mut difficulty = Difficulty::new();
    let base_interval = Duration::from_millis(args.base_interval);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::RequestTransition {
            transition: Transition::Start,
        },
        &mut events,
    );

    let mut cause = None;
    while query::tick_index(&world) < args.ticks {
        let mut commands = Vec::new();
        autopilot.handle(
            &events,
            &query::snake_view(&world),
            query::occupancy_view(&world),
            &query::item_view(&world),
            &mut commands,
        );
        difficulty.handle(&events, &mut commands);

        let mut next_events = Vec::new();
        for command in commands {
            world::apply(&mut world, command, &mut next_events);
        }

        let report = world.tick(None).context("session stopped accepting ticks")?;
        debug!(tick = report.tick, changes = report.grid_delta.len(), "tick");
        next_events.extend(report.events);
        events = next_events;

        match report.outcome {
            TickOutcome::GameOver(terminated) => {
                cause = Some(terminated);
                break;
            }
            TickOutcome::MatchOver { .. } => break,
            TickOutcome::Continue | TickOutcome::Scored(_) => {}
        }
        if args.realtime {
            thread::sleep(difficulty.tick_interval(base_interval));
        }
    }
    difficulty.handle(&events, &mut Vec::new());

    Ok(summarize(&world, &difficulty, cause, base_interval))
}

fn summarize(
    world: &World,
    difficulty: &Difficulty,
    cause: Option<TerminationCause>,
    base_interval: Duration,
) -> Summary {
    let primary = query::snake(world, SnakeId::PRIMARY);
    let state = query::play_state(world);
    let winner = query::winner(world).map(|id| id.get());
    info!(
        ticks = query::tick_index(world),
        score = difficulty.score(),
        level = difficulty.level().name,
        ?winner,
        "session finished"
    );
    Summary {
        ticks: query::tick_index(world),
        state: format!("{state:?}"),
        mode: format!("{:?}", query::mode(world)),
        score: primary.as_ref().map_or(0, |snake| snake.score),
        length: primary.as_ref().map_or(0, |snake| snake.len()),
        level: difficulty.level().name,
        cause: cause.map(|cause| format!("{cause:?}")),
        winner,
        tick_interval_ms: u64::try_from(difficulty.tick_interval(base_interval).as_millis())
            .unwrap_or(u64::MAX),
        leaderboard: query::leaderboard(world),
    }
}
