#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Thief Master levels from scripted moves.

mod level_transfer;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use thief_master_core::{Direction, Event, LevelData, LevelPhase};
use thief_master_session::Session;
use thief_master_world::{query, Config};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "thief-master")]
#[command(about = "Plays a Thief Master level from a scripted move list", long_about = None)]
#[command(version)]
struct Args {
    /// Level JSON file exported by the graph editor.
    #[arg(short, long, value_name = "FILE", conflicts_with = "share")]
    level: Option<PathBuf>,

    /// Level share string (`level:v1:...`).
    #[arg(short, long, value_name = "STRING")]
    share: Option<String>,

    /// TOML file overriding session settings.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Moves to play in order, one of `U`, `D`, `L`, `R` per step.
    #[arg(short, long, default_value = "")]
    moves: String,

    /// Print the level's share string instead of playing it.
    #[arg(long)]
    encode: bool,
}

/// Session settings read from the optional TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    move_budget: Option<u32>,
}

impl FileConfig {
    fn into_config(self) -> Config {
        self.move_budget.map_or_else(Config::default, Config::new)
    }
}

/// Entry point for the Thief Master command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let level = load_level(&args)?;

    if args.encode {
        println!("{}", level_transfer::encode(&level)?);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    let moves = parse_moves(&args.moves)?;

    let mut session = Session::new(config);
    let _ = session.subscribe(|event| println!("{}", describe(event)));
    let phase = play(&mut session, level, &moves);

    let turns = query::turns(session.world()).map_or(0, |turns| turns.current_turn());
    info!(?phase, turns, "session finished");
    Ok(())
}

fn load_level(args: &Args) -> Result<LevelData> {
    match (&args.level, &args.share) {
        (Some(path), _) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read level file at {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse level file at {}", path.display()))
        }
        (None, Some(share)) => {
            level_transfer::decode(share).context("failed to decode level share string")
        }
        (None, None) => bail!("either --level or --share must be provided"),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let parsed: FileConfig =
        toml::from_str(&contents).context("failed to parse session config toml contents")?;
    Ok(parsed.into_config())
}

fn parse_moves(moves: &str) -> Result<Vec<Direction>> {
    moves
        .chars()
        .filter(|symbol| !symbol.is_whitespace() && *symbol != ',')
        .map(|symbol| match symbol.to_ascii_uppercase() {
            'U' => Ok(Direction::Up),
            'D' => Ok(Direction::Down),
            'L' => Ok(Direction::Left),
            'R' => Ok(Direction::Right),
            other => bail!("unknown move `{other}`; expected one of U, D, L, R"),
        })
        .collect()
}

/// Loads the level and plays the moves until the level ends or the script runs out.
fn play(session: &mut Session, level: LevelData, moves: &[Direction]) -> Option<LevelPhase> {
    let _ = session.load_level(level);
    for direction in moves {
        if query::phase(session.world()) != Some(LevelPhase::Playing) {
            break;
        }
        let _ = session.move_player(*direction);
    }
    query::phase(session.world())
}

fn describe(event: &Event) -> String {
    match event {
        Event::LevelLoaded {
            player,
            enemies,
            remaining_moves,
        } => match player {
            Some(player) => format!(
                "level loaded: thief at {player}, {enemies} guard(s), {remaining_moves} move(s)"
            ),
            None => format!("level loaded without a start node, {enemies} guard(s)"),
        },
        Event::TurnStarted {
            turn,
            remaining_moves,
        } => format!("turn {turn} started ({remaining_moves} move(s) left)"),
        Event::TurnCompleted {
            turn,
            remaining_moves,
        } => format!("turn {turn} completed ({remaining_moves} move(s) left)"),
        Event::PlayerMoved { from, to, .. } => format!("thief moved {from} -> {to}"),
        Event::MoveRejected { direction, reason } => {
            format!("move {direction:?} rejected: {reason:?}")
        }
        Event::EnemyEliminated {
            enemy,
            enemy_position,
            ..
        } => format!("guard #{} at {enemy_position} eliminated", enemy.get()),
        Event::EnemyTurned { enemy, facing } => {
            format!("guard #{} turned {facing:?}", enemy.get())
        }
        Event::EnemyAdvanced { enemy, from, to } => {
            format!("guard #{} moved {from} -> {to}", enemy.get())
        }
        Event::BehaviourChanged { enemy, behaviour } => format!(
            "guard #{} is now {}: {}",
            enemy.get(),
            behaviour.tag(),
            behaviour.description()
        ),
        Event::LevelCompleted { turn, at } => format!("goal {at} reached on turn {turn}"),
        Event::Lose { turn, reason, at } => format!("caught at {at} on turn {turn} ({reason:?})"),
    }
}
