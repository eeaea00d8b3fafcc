//! # qb - QuestBox CLI
//!
//! Turns household chores into quests. Completing a quest earns XP, XP buys
//! rewards, and a guardian PIN gates the sensitive operations.
//!
//! ## Quick Start
//!
//! ```bash
//! # What can I do today?
//! qb quests
//!
//! # Finish one
//! qb complete "Make the Bed"
//!
//! # Timed quests finish late at a penalty
//! qb timer start homework
//! qb complete homework
//!
//! # Spend XP
//! qb rewards
//! qb buy pick_dinner --pin 1234
//! ```
//!
//! Progress is stored as JSON in `~/.questbox/` next to `questbox.toml`, which is
//! written with sample profiles, quests and rewards on first run. Run `qb backup`
//! before editing anything by hand.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use questbox::cli::Cli;
use questbox::cmd::*;
use questbox::config::{default_data_dir, CONFIG_FILE};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("questbox=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Commands that need neither config nor storage
    match &cli.command {
        Commands::HashPin { pin } => {
            cmd_hash_pin(pin.clone());
            return;
        }
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            return;
        }
        _ => {}
    }

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }
    let config_path = cli.config.unwrap_or_else(|| data_dir.join(CONFIG_FILE));

    let mut session = match Session::open(&data_dir, &config_path, cli.profile.as_deref()) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::HashPin { .. } => unreachable!("hash-pin handled above"),
        Commands::Completions { .. } => unreachable!("completions handled above"),

        Commands::Profiles => cmd_profiles(&session),
        Commands::Status => cmd_status(&session),
        Commands::Quests { all } => cmd_quests(&session, all),
        Commands::Complete { task } => cmd_complete(&mut session, task),
        Commands::Timer { action } => cmd_timer(&mut session, action),
        Commands::Rewards => cmd_rewards(&session),
        Commands::Buy { reward, pin } => cmd_buy(&mut session, reward, pin),
        Commands::History { limit } => cmd_history(&session, limit),
        Commands::Leaderboard => cmd_leaderboard(&session),
        Commands::Reset { pin } => cmd_reset(&mut session, pin),
        Commands::ResetAll { pin } => cmd_reset_all(&mut session, pin),
        Commands::Quest { action } => cmd_quest(&mut session, action),
        Commands::Reward { action } => cmd_reward(&mut session, action),
        Commands::Export { output } => cmd_export(&session, output),
        Commands::Backup => cmd_backup(&session),
    }
}
