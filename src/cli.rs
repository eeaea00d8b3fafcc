use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Household chores as quests, XP as pocket money.
/// Data lives in ~/.questbox unless --data-dir or QUESTBOX_DATA_DIR says otherwise.
#[derive(Parser)]
#[command(name = "qb", version, about = "QuestBox chore quests and rewards")]
pub struct Cli {
    /// Directory holding progress, catalog overlay and backups.
    #[arg(long, global = true, env = "QUESTBOX_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file. Defaults to <data-dir>/questbox.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Profile ID to act as. Defaults to the first configured profile.
    #[arg(long, short, global = true)]
    pub profile: Option<String>,

    /// Log XP calculations and storage activity to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
