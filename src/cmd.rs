//! Command implementations for the CLI interface.
//!
//! Each `cmd_*` handler works on a [`Session`]: the loaded config, the
//! profile's progress, and the merged catalog. Handlers print to stdout and
//! exit with status 1 on user-facing errors.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::Duration;
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::catalog::{parse_generated_reward, parse_generated_task, Catalog};
use crate::clock::{day_string, Clock, SystemClock};
use crate::config::{load_config, Config};
use crate::error::ConfigError;
use crate::fields::*;
use crate::hud::{leaderboard, next_reward};
use crate::limits::{is_limit_reached, purchases_in_window};
use crate::policy::{calculate_level, complete_task, StreakModifier};
use crate::profile::{hash_pin, is_valid_plain_pin, Profile};
use crate::progress::{AllProgress, Progress};
use crate::quests::{available_quests, completed_today_quests, is_available};
use crate::reward::Reward;
use crate::shop::{can_afford, purchase_reward, reset_progress};
use crate::store::{FileStore, KeyValueStore, ProgressStore, CATALOG_KEY, PROGRESS_KEY};
use crate::task::{Task, TaskEdit};
use crate::timer::{self, pause_timer, reset_timer, resume_timer, start_timer};

#[derive(Subcommand)]
pub enum Commands {
    /// List profiles and their levels.
    Profiles,

    /// Show level, streak and today's XP for the current profile.
    Status,

    /// List quests available today.
    Quests {
        /// Also list quests already done today.
        #[arg(long)]
        all: bool,
    },

    /// Complete a quest by ID or name.
    Complete {
        /// Quest ID or name
        task: String,
    },

    /// Start, pause, resume or reset a quest timer.
    Timer {
        #[command(subcommand)]
        action: TimerAction,
    },

    /// List rewards with their prices and limits.
    Rewards,

    /// Buy a reward by ID or name.
    Buy {
        /// Reward ID or name
        reward: String,
        /// Guardian PIN, required for rewards that need approval.
        #[arg(long)]
        pin: Option<String>,
    },

    /// Show recent completions.
    History {
        /// Limit number of rows printed.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Rank profiles by XP.
    Leaderboard,

    /// Wipe the current profile's progress.
    Reset {
        /// Guardian PIN.
        #[arg(long)]
        pin: String,
    },

    /// Wipe progress for every profile.
    ResetAll {
        /// Guardian PIN.
        #[arg(long)]
        pin: String,
    },

    /// Add or edit quests.
    Quest {
        #[command(subcommand)]
        action: QuestAction,
    },

    /// Add rewards.
    Reward {
        #[command(subcommand)]
        action: RewardAction,
    },

    /// Export the current profile's progress as JSON.
    Export {
        /// Output file. Prints to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create timestamped backups of stored progress and catalog.
    Backup,

    /// Print the salted-hash form of a PIN for the config file.
    HashPin {
        /// Four-digit PIN
        pin: String,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start (or resume) the timer of a timed quest.
    Start { task: String },
    /// Pause a running timer.
    Pause { task: String },
    /// Resume a paused timer.
    Resume { task: String },
    /// Discard a timer.
    Reset { task: String },
}

#[derive(Subcommand)]
pub enum QuestAction {
    /// Add a generated quest from JSON (a file path, or - for stdin).
    Add {
        #[arg(long)]
        json: String,
        /// Guardian PIN.
        #[arg(long)]
        pin: String,
    },
    /// Edit an existing quest.
    Edit {
        /// Quest ID or name
        task: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        xp: Option<i64>,
        #[arg(long, value_enum)]
        difficulty: Option<Difficulty>,
        /// Guardian PIN.
        #[arg(long)]
        pin: String,
    },
}

#[derive(Subcommand)]
pub enum RewardAction {
    /// Add a generated reward from JSON (a file path, or - for stdin).
    Add {
        #[arg(long)]
        json: String,
        /// Guardian PIN.
        #[arg(long)]
        pin: String,
    },
}

/// Everything a command needs: config, storage, catalog and the active profile.
pub struct Session {
    pub config: Config,
    pub store: ProgressStore<FileStore>,
    pub catalog: Catalog,
    pub all: AllProgress,
    pub profile: Profile,
    pub clock: SystemClock,
}

impl Session {
    /// Load config and storage. Without `profile`, the first configured profile is used.
    pub fn open(data_dir: &Path, config_path: &Path, profile: Option<&str>) -> Result<Session, ConfigError> {
        let config = load_config(config_path)?;
        let profile = match profile {
            Some(id) => config
                .profile(id)
                .cloned()
                .ok_or_else(|| ConfigError::Invalid(format!("unknown profile '{id}'")))?,
            None => config
                .profiles
                .first()
                .cloned()
                .ok_or_else(|| ConfigError::Invalid("no profiles configured".into()))?,
        };
        let store = ProgressStore::new(FileStore::new(data_dir));
        let all = store.load(&config.profiles);
        let catalog = Catalog::load(store.backend(), config.tasks.clone(), config.rewards.clone());
        Ok(Session {
            config,
            store,
            catalog,
            all,
            profile,
            clock: SystemClock,
        })
    }

    pub fn progress(&self) -> Progress {
        self.all.get(&self.profile.id).cloned().unwrap_or_default()
    }

    /// Replace the profile's progress and persist everything.
    fn commit(&mut self, next: Progress) {
        self.all.insert(self.profile.id.clone(), next);
        self.save_all();
    }

    fn save_all(&mut self) {
        if let Err(e) = self.store.save(&self.all) {
            fail(format!("Failed to save progress: {e}"));
        }
    }

    fn save_catalog(&mut self) {
        if let Err(e) = self.catalog.save_overlay(self.store.backend_mut()) {
            fail(format!("Failed to save catalog: {e}"));
        }
    }

    fn require_pin(&self, pin: Option<&str>) {
        match pin {
            Some(p) if self.profile.verify_pin(p) => {}
            Some(_) => fail("Incorrect PIN."),
            None => fail("This action needs a guardian PIN. Pass --pin."),
        }
    }

    fn resolve_task(&self, identifier: &str) -> Task {
        match self.catalog.resolve_task(identifier) {
            Ok(task) => task.clone(),
            Err(e) => fail(format!("Error resolving quest: {e}")),
        }
    }

    fn resolve_reward(&self, identifier: &str) -> Reward {
        match self.catalog.resolve_reward(identifier) {
            Ok(reward) => reward.clone(),
            Err(e) => fail(format!("Error resolving reward: {e}")),
        }
    }
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    std::process::exit(1);
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// `[#####-----]` style bar for a percentage.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn format_limit(reward: &Reward) -> String {
    match (reward.limit.kind, reward.limit.count) {
        // A limit without a count is never enforced.
        (LimitType::Unlimited, _) | (_, None) => "-".to_string(),
        (kind, Some(count)) => format!("{count}x {}", format_limit_type(kind)),
    }
}

fn read_json_arg(source: &str) -> String {
    let result = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map(|_| buf)
    } else {
        fs::read_to_string(source)
    };
    result.unwrap_or_else(|e| fail(format!("Failed to read {source}: {e}")))
}

/// Print quests in a formatted table.
pub fn print_quests(tasks: &[&Task]) {
    println!(
        "{:<20} {:>4} {:<7} {:<7} {:<6} {}",
        "ID", "XP", "Repeat", "Level", "Timer", "Name"
    );
    for t in tasks {
        let timer = t.timer.map(|m| format!("{m}m")).unwrap_or_else(|| "-".into());
        println!(
            "{:<20} {:>4} {:<7} {:<7} {:<6} {}",
            truncate(&t.id, 20),
            t.xp,
            format_repeatable(t.repeatable),
            format_difficulty(t.difficulty),
            timer,
            t.name
        );
    }
}

/// List profiles with level and XP; the active one is starred.
pub fn cmd_profiles(session: &Session) {
    let policy = &session.config.xp_policy;
    println!("  {:<16} {:<20} {:>5} {:>7}", "ID", "Name", "Level", "XP");
    for p in &session.config.profiles {
        let xp = session.all.get(&p.id).map(|progress| progress.xp).unwrap_or(0);
        let marker = if p.id == session.profile.id { "*" } else { " " };
        println!(
            "{} {:<16} {:<20} {:>5} {:>7}",
            marker,
            truncate(&p.id, 16),
            truncate(&p.name, 20),
            calculate_level(xp, policy.xp_per_level).level,
            xp
        );
    }
}

/// Show the heads-up display for the current profile.
pub fn cmd_status(session: &Session) {
    let progress = session.progress();
    let policy = &session.config.xp_policy;
    let today = session.clock.today();
    let now = session.clock.now();
    let level = calculate_level(progress.xp, policy.xp_per_level);

    println!("{} ({})", session.profile.name, session.profile.id);
    println!(
        "Level {}  {} {}/{} XP",
        level.level,
        progress_bar(level.progress_percent, 20),
        level.xp_in_level,
        level.xp_to_next_level
    );
    println!("Total XP: {}", progress.xp);
    println!("Streak:   {} day(s)", progress.streak);
    println!(
        "Today:    {} quest(s), {}/{} XP",
        progress.completions_on(today).len(),
        progress.xp_earned_on(today),
        policy.daily_xp_cap
    );
    match next_reward(&session.catalog.rewards, progress.xp) {
        Some(r) => println!("Next reward: {} ({} XP to go)", r.name, r.cost - progress.xp),
        None if session.catalog.rewards.is_empty() => {}
        None => println!("Next reward: you can afford everything in the shop"),
    }
    if !progress.active_timers.is_empty() {
        println!();
        println!("Timers:");
        for (task_id, state) in &progress.active_timers {
            let name = session.catalog.task(task_id).map(|t| t.name.as_str()).unwrap_or(task_id);
            let left = session
                .catalog
                .task(task_id)
                .and_then(|t| timer::remaining(t, state, now))
                .map(format_duration)
                .unwrap_or_else(|| "--:--".into());
            let state_label = if state.is_paused() { "paused" } else { "running" };
            println!("  {:<24} {} left ({})", truncate(name, 24), left, state_label);
        }
    }
}

/// List today's quests.
pub fn cmd_quests(session: &Session, all: bool) {
    let progress = session.progress();
    let today = session.clock.today();
    let available = available_quests(&session.catalog.tasks, &progress, today);
    if available.is_empty() {
        println!("No quests left today.");
    } else {
        print_quests(&available);
    }
    if all {
        let done = completed_today_quests(&session.catalog.tasks, &progress, today);
        if !done.is_empty() {
            println!();
            println!("Done today:");
            print_quests(&done);
        }
    }
}

/// Complete a quest and report how its XP was computed.
pub fn cmd_complete(session: &mut Session, task: String) {
    let task = session.resolve_task(&task);
    let progress = session.progress();
    let today = session.clock.today();
    if !is_available(&task, &progress, today) {
        fail(format!(
            "'{}' is not available ({} quest already completed).",
            task.name,
            format_repeatable(task.repeatable)
        ));
    }
    let completion = complete_task(
        &task,
        &progress,
        &session.config.xp_policy,
        &session.catalog.tasks,
        &session.clock,
    );
    let award = completion.award;
    let before = calculate_level(progress.xp, session.config.xp_policy.xp_per_level).level;
    let after = calculate_level(completion.progress.xp, session.config.xp_policy.xp_per_level).level;
    session.commit(completion.progress);

    println!("Completed '{}': +{} XP", task.name, award.awarded);
    if award.timer_expired {
        println!("  timer ran out: x{}", task.penalty_factor());
    }
    if award.diminished {
        println!(
            "  diminishing returns: x{}",
            session.config.xp_policy.diminishing_returns.reduction_factor
        );
    }
    match award.streak_modifier {
        StreakModifier::Bonus(m) => println!("  {}-day streak bonus: x{m}", award.streak),
        StreakModifier::NoStreakPenalty(m) => println!("  no streak: x{m}"),
        StreakModifier::None => {}
    }
    if award.capped() {
        println!("  daily cap reached: {} of {} XP kept", award.awarded, award.modified);
    }
    if after > before {
        println!("Level up! You are now level {after}.");
    }
}

/// Drive a quest timer.
pub fn cmd_timer(session: &mut Session, action: TimerAction) {
    let now = session.clock.now();
    let progress = session.progress();
    let (task, result, verb) = match action {
        TimerAction::Start { task } => {
            let task = session.resolve_task(&task);
            let result = start_timer(&task, &progress, now);
            (task, result, "started")
        }
        TimerAction::Pause { task } => {
            let task = session.resolve_task(&task);
            let result = pause_timer(&task.id, &progress, now);
            (task, result, "paused")
        }
        TimerAction::Resume { task } => {
            let task = session.resolve_task(&task);
            let result = resume_timer(&task.id, &progress, now);
            (task, result, "resumed")
        }
        TimerAction::Reset { task } => {
            let task = session.resolve_task(&task);
            let result = Ok(reset_timer(&task.id, &progress));
            (task, result, "reset")
        }
    };
    let next = result.unwrap_or_else(|e| fail(e));
    let left = next
        .active_timers
        .get(&task.id)
        .and_then(|state| timer::remaining(&task, state, now));
    session.commit(next);
    match left {
        Some(left) => println!("Timer {verb} for '{}': {} left", task.name, format_duration(left)),
        None => println!("Timer {verb} for '{}'", task.name),
    }
}

/// List rewards with affordability and limit state.
pub fn cmd_rewards(session: &Session) {
    let progress = session.progress();
    let today = session.clock.today();
    println!("You have {} XP", progress.xp);
    println!(
        "{:<20} {:>5} {:<12} {:<8} {:<10} {}",
        "ID", "Cost", "Limit", "Approval", "State", "Name"
    );
    for r in &session.catalog.rewards {
        let state = if is_limit_reached(r, &progress, today) {
            "limit".to_string()
        } else if !can_afford(r, &progress) {
            format!("-{}", r.cost - progress.xp)
        } else {
            match (r.limit.kind, r.limit.count) {
                (LimitType::Unlimited, _) | (_, None) => "ok".to_string(),
                (_, Some(count)) => {
                    format!("ok {}/{count}", purchases_in_window(r, &progress, today))
                }
            }
        };
        println!(
            "{:<20} {:>5} {:<12} {:<8} {:<10} {}",
            truncate(&r.id, 20),
            r.cost,
            format_limit(r),
            if r.needs_approval { "pin" } else { "-" },
            state,
            r.name
        );
    }
}

/// Buy a reward, asking for the guardian PIN when it needs approval.
pub fn cmd_buy(session: &mut Session, reward: String, pin: Option<String>) {
    let reward = session.resolve_reward(&reward);
    if reward.needs_approval {
        session.require_pin(pin.as_deref());
    }
    let today = session.clock.today();
    match purchase_reward(&reward, &session.progress(), today) {
        Ok(next) => {
            let left = next.xp;
            session.commit(next);
            println!("Bought '{}' for {} XP. {} XP left.", reward.name, reward.cost, left);
        }
        Err(e) => fail(e),
    }
}

/// Print the most recent completions, newest first.
pub fn cmd_history(session: &Session, limit: usize) {
    let progress = session.progress();
    if progress.completion_history.is_empty() {
        println!("No completions yet.");
        return;
    }
    println!("{:<10} {:>4} {}", "Date", "XP", "Quest");
    for record in progress.completion_history.iter().rev().take(limit) {
        println!(
            "{:<10} {:>4} {}",
            day_string(record.completion_date),
            record.xp_earned,
            record.task_name
        );
    }
}

pub fn cmd_leaderboard(session: &Session) {
    let board = leaderboard(&session.config.profiles, &session.all, &session.config.xp_policy);
    println!("{:>3} {:<20} {:>5} {:>7}", "#", "Name", "Level", "XP");
    for (rank, standing) in board.iter().enumerate() {
        println!(
            "{:>3} {:<20} {:>5} {:>7}",
            rank + 1,
            truncate(&standing.name, 20),
            standing.level,
            standing.xp
        );
    }
}

/// Reset the current profile.
pub fn cmd_reset(session: &mut Session, pin: String) {
    session.require_pin(Some(&pin));
    let next = reset_progress(&session.progress());
    session.commit(next);
    println!("Progress reset for {}.", session.profile.name);
}

/// Reset every profile.
pub fn cmd_reset_all(session: &mut Session, pin: String) {
    session.require_pin(Some(&pin));
    match session.store.reset_all(&session.config.profiles) {
        Ok(fresh) => session.all = fresh,
        Err(e) => fail(format!("Failed to reset progress: {e}")),
    }
    println!("Progress reset for all profiles.");
}

/// Handle quest catalog commands.
pub fn cmd_quest(session: &mut Session, action: QuestAction) {
    match action {
        QuestAction::Add { json, pin } => {
            session.require_pin(Some(&pin));
            let raw = read_json_arg(&json);
            let task = parse_generated_task(&raw).unwrap_or_else(|e| fail(e));
            let name = task.name.clone();
            let id = session.catalog.add_task(task);
            session.save_catalog();
            println!("Added quest '{name}' ({id})");
        }
        QuestAction::Edit { task, name, desc, xp, difficulty, pin } => {
            session.require_pin(Some(&pin));
            let task = session.resolve_task(&task);
            let edit = TaskEdit {
                name,
                description: desc,
                xp,
                difficulty,
            };
            let edited = match session.catalog.edit_task(&task.id, edit) {
                Ok(edited) => format!("'{}' ({} XP)", edited.name, edited.xp),
                Err(e) => fail(e),
            };
            session.save_catalog();
            println!("Updated quest {edited}");
        }
    }
}

/// Handle reward catalog commands.
pub fn cmd_reward(session: &mut Session, action: RewardAction) {
    match action {
        RewardAction::Add { json, pin } => {
            session.require_pin(Some(&pin));
            let raw = read_json_arg(&json);
            let reward = parse_generated_reward(&raw).unwrap_or_else(|e| fail(e));
            let name = reward.name.clone();
            let id = session.catalog.add_reward(reward);
            session.save_catalog();
            println!("Added reward '{name}' ({id})");
        }
    }
}

/// Export the current profile's progress.
pub fn cmd_export(session: &Session, output: Option<PathBuf>) {
    let json = session
        .store
        .export_profile(&session.all, &session.profile.id)
        .unwrap_or_else(|e| fail(format!("Failed to export: {e}")));
    match output {
        Some(path) => {
            if let Err(e) = fs::write(&path, json) {
                fail(format!("Failed to write {}: {e}", path.display()));
            }
            println!("Exported {} to {}", session.profile.id, path.display());
        }
        None => println!("{json}"),
    }
}

/// Create timestamped backups of everything stored.
pub fn cmd_backup(session: &Session) {
    let backend = session.store.backend();
    let mut made = 0;
    for key in [PROGRESS_KEY, CATALOG_KEY] {
        match backend.get(key) {
            Ok(Some(_)) => match backend.backup(key) {
                Ok(path) => {
                    println!("Backup created: {}", path.display());
                    made += 1;
                }
                Err(e) => fail(format!("Failed to create backup: {e}")),
            },
            Ok(None) => {}
            Err(e) => fail(format!("Failed to read {key}: {e}")),
        }
    }
    if made == 0 {
        println!("Nothing stored yet, no backup created.");
    }
}

/// Print a salted hash for a PIN.
pub fn cmd_hash_pin(pin: String) {
    if !is_valid_plain_pin(&pin) {
        fail("PIN must be 4 digits.");
    }
    println!("{}", hash_pin(&pin));
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("a longer name", 6), "a lon…");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "[----]");
        assert_eq!(progress_bar(50.0, 4), "[##--]");
        assert_eq!(progress_bar(150.0, 4), "[####]");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(125)), "02:05");
        assert_eq!(format_duration(Duration::seconds(-3)), "00:00");
    }

    #[test]
    fn test_limit_labels() {
        let mut reward = Reward {
            id: "tv".into(),
            name: "TV".into(),
            description: None,
            cost: 10,
            limit: crate::reward::RewardLimit::unlimited(),
            needs_approval: false,
        };
        assert_eq!(format_limit(&reward), "-");
        reward.limit.kind = LimitType::Weekly;
        assert_eq!(format_limit(&reward), "-");
        reward.limit.count = Some(3);
        assert_eq!(format_limit(&reward), "3x per week");
    }
}
