//! Isleguard - island protection flag administration
//!
//! Loads flag manifests and worlds from the config, then reads or writes
//! flag settings against the SQLite store.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use isleguard_core::permissions::rank_tiers;
use isleguard_core::{
    Error, FlagMode, FlagReporter, FlagStatus, FlagType, Island, RankTable, Result,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod config;
mod state;

use config::CliConfig;
use state::AppState;

#[derive(Parser)]
#[command(name = "isleguard", about = "Island protection flags", version)]
struct Cli {
    /// Config file path (default: platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered worlds and their stored flag counts.
    Worlds,

    /// List registered flags.
    Flags {
        /// Only flags of this type (protection, setting, world_setting).
        #[arg(long = "type", value_parser = parse_flag_type)]
        flag_type: Option<FlagType>,

        /// Only flags shown at this menu tier (basic, advanced, expert, top_row).
        #[arg(long, value_parser = parse_flag_mode)]
        mode: Option<FlagMode>,

        /// Only flags that apply to this game mode.
        #[arg(long)]
        game_mode: Option<String>,
    },

    /// Read a flag's value for a world.
    Get { world: String, flag: String },

    /// Write a flag's value for a world, with sub-flags following.
    Set {
        world: String,
        flag: String,
        #[arg(action = ArgAction::Set)]
        value: bool,
    },

    /// Write only this flag's stored value for a world.
    SetDefault {
        world: String,
        flag: String,
        #[arg(action = ArgAction::Set)]
        value: bool,
    },

    /// Show each rank's standing against a protection flag.
    Ranks {
        flag: String,

        /// Use this island's threshold instead of the flag default.
        #[arg(long)]
        island: Option<Uuid>,
    },

    /// Manage islands.
    #[command(subcommand)]
    Island(IslandCommand),
}

#[derive(Subcommand)]
enum IslandCommand {
    /// Create an island owned by a user.
    Create { world: String, owner: Uuid },

    /// Show an island's members and flag states.
    Show {
        id: Uuid,

        /// Include hidden flags.
        #[arg(long)]
        op: bool,
    },

    /// Set a member's rank by name or score.
    SetRank { id: Uuid, user: Uuid, rank: String },

    /// Toggle a setting, or step a protection threshold.
    Toggle {
        id: Uuid,
        flag: String,

        /// Step a protection threshold down instead of up.
        #[arg(long)]
        down: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => CliConfig::default_path().ok_or_else(|| {
            Error::InvalidOperation("Could not determine config directory".into())
        })?,
    };
    let state = AppState::new(CliConfig::load(&config_path)?)?;

    match cli.command {
        Command::Worlds => run_worlds(&state),
        Command::Flags {
            flag_type,
            mode,
            game_mode,
        } => {
            run_flags(&state, flag_type, mode, game_mode.as_deref());
            Ok(())
        }
        Command::Get { world, flag } => {
            state.require_world(&world)?;
            let flag = state.flag(&flag)?;
            println!("{}", state.resolver.is_set_for_world(flag, &world));
            Ok(())
        }
        Command::Set { world, flag, value } => {
            let flag = state.write_world_flag(&world, &flag, value)?;
            println!("{} = {value} in {world}", flag.id());
            Ok(())
        }
        Command::SetDefault { world, flag, value } => {
            let flag = state.flag(&flag)?;
            state
                .resolver
                .set_world_default_setting(flag, &world, value)?;
            println!("{} default = {value} in {world}", flag.id());
            Ok(())
        }
        Command::Ranks { flag, island } => {
            let flag = state.flag(&flag)?;
            let threshold = match island {
                Some(id) => state.island(id)?.flag_rank(flag),
                None => flag.default_rank(),
            };
            println!("{} threshold {}", flag.id(), rank_label(&state.ranks, threshold));
            for line in rank_tiers(&state.ranks, threshold) {
                println!("  {:<12} {:>6}  {}", line.name, line.score, line.tier.display_name());
            }
            Ok(())
        }
        Command::Island(command) => run_island(&state, command),
    }
}

fn run_worlds(state: &AppState) -> Result<()> {
    let worlds = state.resolver.worlds();
    if worlds.is_empty() {
        println!("No worlds configured");
        return Ok(());
    }
    for name in worlds.world_names() {
        let owner = worlds
            .owning_extension(&name)
            .map(|o| o.id().to_string())
            .unwrap_or_else(|| "none".into());
        let stored = state
            .resolver
            .world_settings(&name)
            .map(|s| s.len())
            .unwrap_or(0);
        println!("{name}  owner={owner}  stored={stored}");
    }
    Ok(())
}

fn run_flags(
    state: &AppState,
    flag_type: Option<FlagType>,
    mode: Option<FlagMode>,
    game_mode: Option<&str>,
) {
    for flag in state.list_flags(flag_type, mode, game_mode) {
        let subflags: Vec<&str> = flag.subflag_ids().into_iter().collect();
        println!(
            "{:<24} {:<14} {:<8} rank={:<5} default={}{}",
            flag.id(),
            flag.flag_type().display_name(),
            flag.mode().display_name(),
            flag.default_rank(),
            flag.default_setting(),
            if subflags.is_empty() {
                String::new()
            } else {
                format!("  subflags=[{}]", subflags.join(", "))
            }
        );
    }
}

fn run_island(state: &AppState, command: IslandCommand) -> Result<()> {
    match command {
        IslandCommand::Create { world, owner } => {
            let island = state.create_island(&world, owner)?;
            println!("{}", island.id);
            Ok(())
        }
        IslandCommand::Show { id, op } => {
            let island = state.island(id)?;
            print_island(state, &island, op);
            Ok(())
        }
        IslandCommand::SetRank { id, user, rank } => {
            let mut island = state.island(id)?;
            let score = match rank.parse::<i32>() {
                Ok(score) => score,
                Err(_) => state
                    .ranks
                    .score(&rank)
                    .ok_or_else(|| Error::NotFound(format!("rank '{rank}'")))?,
            };
            if island.owner_id == Some(user) {
                return Err(Error::InvalidOperation(
                    "The island owner's rank cannot be changed".into(),
                ));
            }
            island.set_rank(user, score);
            state.save_island(&island)?;
            println!("{user} is now {}", rank_label(&state.ranks, score));
            Ok(())
        }
        IslandCommand::Toggle { id, flag, down } => {
            let mut island = state.island(id)?;
            let flag = state.flag(&flag)?;
            match flag.flag_type() {
                FlagType::Setting => {
                    if flag.cooldown() > 0 && island.is_on_cooldown(flag) {
                        return Err(Error::InvalidOperation(format!(
                            "{} is on cooldown",
                            flag.id()
                        )));
                    }
                    let allowed = island.toggle_setting(flag);
                    if flag.cooldown() > 0 {
                        island.set_cooldown(flag);
                    }
                    println!("{} = {}", flag.id(), if allowed { "allowed" } else { "blocked" });
                }
                FlagType::Protection => {
                    let threshold = island.cycle_flag_rank(flag, &state.ranks, !down);
                    println!("{} threshold {}", flag.id(), rank_label(&state.ranks, threshold));
                }
                FlagType::WorldSetting => {
                    return Err(Error::InvalidOperation(format!(
                        "{} is a world setting; use `isleguard set`",
                        flag.id()
                    )));
                }
            }
            state.save_island(&island)
        }
    }
}

fn print_island(state: &AppState, island: &Island, viewer_is_op: bool) {
    println!("Island {} in {}", island.id, island.world);
    for (user, score) in &island.members {
        println!("  member {user}  {}", rank_label(&state.ranks, *score));
    }

    let reporter = FlagReporter::new(&state.resolver, &state.ranks);
    for flag in state.flags.flags() {
        let hidden = state.config.is_hidden(flag.id());
        let Some(report) = reporter.describe(flag, &island.world, Some(island), viewer_is_op, hidden)
        else {
            continue;
        };
        let status = match report.status {
            FlagStatus::SubPanel => "(panel)".to_string(),
            FlagStatus::WorldSetting { active } => {
                if active { "active" } else { "disabled" }.to_string()
            }
            FlagStatus::Setting {
                allowed,
                on_cooldown,
            } => {
                let label = match allowed {
                    Some(true) => "allowed",
                    Some(false) => "blocked",
                    None => "-",
                };
                if on_cooldown {
                    format!("{label} (cooldown)")
                } else {
                    label.to_string()
                }
            }
            FlagStatus::Protection { threshold, .. } => match threshold {
                Some(t) => format!("min {}", rank_label(&state.ranks, t)),
                None => "-".to_string(),
            },
        };
        println!("  {:<24} {}", report.flag_id, status);
    }
}

fn rank_label(ranks: &RankTable, score: i32) -> String {
    match ranks.name_of(score) {
        Some(name) => format!("{name} ({score})"),
        None => score.to_string(),
    }
}

fn parse_flag_type(s: &str) -> std::result::Result<FlagType, String> {
    match s.to_ascii_lowercase().replace('-', "_").as_str() {
        "protection" => Ok(FlagType::Protection),
        "setting" => Ok(FlagType::Setting),
        "world_setting" => Ok(FlagType::WorldSetting),
        other => Err(format!("unknown flag type '{other}'")),
    }
}

fn parse_flag_mode(s: &str) -> std::result::Result<FlagMode, String> {
    match s.to_ascii_lowercase().replace('-', "_").as_str() {
        "basic" => Ok(FlagMode::Basic),
        "advanced" => Ok(FlagMode::Advanced),
        "expert" => Ok(FlagMode::Expert),
        "top_row" => Ok(FlagMode::TopRow),
        other => Err(format!("unknown flag mode '{other}'")),
    }
}
