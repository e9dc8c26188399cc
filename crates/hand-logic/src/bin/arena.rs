//! Play rounds and inspect history from the command line.
//!
//! Usage:
//!   cargo run --features cli --bin arena -- --db arena.db hands
//!   cargo run --features cli --bin arena -- --db arena.db play --user 1 --hand 2
//!   cargo run --features cli --bin arena -- --db arena.db history --user 1 --limit 10

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hand_logic::{Arena, GameConfig, PlayRequest, SqliteLedger, SystemClock, SystemDraw};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generalized rock-paper-scissors against the computer")]
struct Args {
    /// Match ledger database
    #[arg(long, default_value = "arena.db")]
    db: PathBuf,

    /// JSON game config; the built-in seven-hand table when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the hands and what each one beats
    Hands,
    /// Play one round
    Play {
        #[arg(long)]
        user: u64,
        /// Hand index, as typed
        #[arg(long)]
        hand: String,
    },
    /// Show past rounds, most recent first
    History {
        #[arg(long)]
        user: u64,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

fn init_telemetry() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "hand_logic=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_telemetry();

    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::reference(),
    };
    let ledger = Arc::new(SqliteLedger::open(&args.db).context("open match ledger")?);
    let arena = Arena::from_config(&config, ledger, Arc::new(SystemClock))?;

    match args.command {
        Command::Hands => {
            for hand in arena.hands() {
                let beats = arena.resolver().graph().victims(hand.id)?;
                let names = beats
                    .iter()
                    .map(|id| arena.catalog().name(*id).map(str::to_string))
                    .collect::<Result<Vec<_>, _>>()?;
                println!("{:>2} {:<10} beats {}", hand.id, hand.name, names.join(", "));
            }
        }
        Command::Play { user, hand } => {
            let request = PlayRequest {
                player_hand_index: Some(serde_json::Value::String(hand)),
            };
            let mut draw = SystemDraw::from_entropy();
            let response = match arena.play(Some(user), &request, &mut draw) {
                Ok(response) => serde_json::to_value(response)?,
                Err(err) => serde_json::to_value(hand_logic::ErrorPayload::from(&err))?,
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::History { user, limit } => {
            let mut entries = arena.history(Some(user))?;
            entries.truncate(limit);
            let summary = arena.summary(Some(user))?;
            println!(
                "{} played: {} won, {} lost, {} drawn",
                summary.played, summary.wins, summary.losses, summary.draws
            );
            for entry in entries {
                println!(
                    "{}  {:<10} vs {:<10} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.player_hand_name,
                    entry.opponent_hand_name,
                    entry.outcome
                );
            }
        }
    }

    Ok(())
}
