//! XP policy engine.
//!
//! Turns a quest completion into the next `Progress`: streak transition, timer
//! penalty, diminishing returns, streak bonus or no-streak penalty, then the
//! daily cap. Every multiplier rounds to the nearest integer before the next one
//! is applied. The engine never fails; policy values are validated by the
//! config loader before they get here.

use serde::{Deserialize, Serialize};

use crate::clock::{previous_day, Clock};
use crate::progress::{CompletionRecord, Progress};
use crate::task::Task;
use crate::timer;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreakBonus {
    pub days: u32,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiminishingReturns {
    pub after_task_count: usize,
    pub reduction_factor: f64,
}

/// How XP is earned and capped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpPolicy {
    pub xp_per_level: u64,
    pub daily_xp_cap: u64,
    pub streak_bonus: StreakBonus,
    pub diminishing_returns: DiminishingReturns,
    /// Multiplier applied while no streak is running (streak of 0 or 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_streak_reduction_factor: Option<f64>,
}

impl Default for XpPolicy {
    fn default() -> Self {
        XpPolicy {
            xp_per_level: 500,
            daily_xp_cap: 200,
            streak_bonus: StreakBonus {
                days: 3,
                multiplier: 1.5,
            },
            diminishing_returns: DiminishingReturns {
                after_task_count: 5,
                reduction_factor: 0.5,
            },
            no_streak_reduction_factor: None,
        }
    }
}

/// Level standing derived from total XP.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelInfo {
    pub level: u64,
    pub xp_in_level: u64,
    /// Size of the current level in XP.
    pub xp_to_next_level: u64,
    pub progress_percent: f64,
}

/// Level 1 starts at 0 XP; each `xp_per_level` XP adds a level.
pub fn calculate_level(xp: u64, xp_per_level: u64) -> LevelInfo {
    if xp_per_level == 0 {
        return LevelInfo {
            level: 1,
            xp_in_level: 0,
            xp_to_next_level: 0,
            progress_percent: 0.0,
        };
    }
    let xp_in_level = xp % xp_per_level;
    LevelInfo {
        level: xp / xp_per_level + 1,
        xp_in_level,
        xp_to_next_level: xp_per_level,
        progress_percent: 100.0 * xp_in_level as f64 / xp_per_level as f64,
    }
}

/// The streak-dependent multiplier picked for a completion. At most one applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreakModifier {
    None,
    Bonus(f64),
    NoStreakPenalty(f64),
}

/// How the awarded XP for one completion was reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XpAward {
    pub base: u64,
    pub timer_expired: bool,
    pub diminished: bool,
    pub streak_modifier: StreakModifier,
    /// XP after all multipliers, before the daily cap.
    pub modified: u64,
    pub awarded: u64,
    pub streak: u32,
}

impl XpAward {
    pub fn capped(&self) -> bool {
        self.awarded < self.modified
    }
}

/// Result of processing one completion.
#[derive(Debug, Clone)]
pub struct Completion {
    pub progress: Progress,
    pub award: XpAward,
}

/// Streak value for `today`, before counting a completion made today.
pub fn streak_for_day(progress: &Progress, today: chrono::NaiveDate) -> u32 {
    match progress.last_completion_date {
        Some(last) if last == today => progress.streak,
        Some(last) if last == previous_day(today) => progress.streak.saturating_add(1),
        _ => 1,
    }
}

/// Bonus on every multiple of `streakBonus.days`, otherwise a penalty when no streak runs.
pub fn streak_modifier(streak: u32, policy: &XpPolicy) -> StreakModifier {
    let days = policy.streak_bonus.days;
    if days > 0 && streak >= days && streak % days == 0 {
        return StreakModifier::Bonus(policy.streak_bonus.multiplier);
    }
    match policy.no_streak_reduction_factor {
        Some(factor) if streak <= 1 => StreakModifier::NoStreakPenalty(factor),
        _ => StreakModifier::None,
    }
}

fn scale(xp: u64, factor: f64) -> u64 {
    (xp as f64 * factor).round().max(0.0) as u64
}

/// Apply a completion of `task` and report how its XP was computed.
///
/// The catalog is accepted so cross-quest rules can be added without changing
/// callers; it is not consulted.
pub fn complete_task(
    task: &Task,
    progress: &Progress,
    policy: &XpPolicy,
    _all_tasks: &[Task],
    clock: &dyn Clock,
) -> Completion {
    let today = clock.today();
    let now = clock.now();
    let index = progress.completions_on(today).len();
    let streak = streak_for_day(progress, today);

    let mut xp = task.xp;

    let timer_expired = progress
        .active_timers
        .get(&task.id)
        .is_some_and(|t| timer::is_expired(task, t, now));
    if timer_expired {
        xp = scale(xp, task.penalty_factor());
    }

    let diminished = index >= policy.diminishing_returns.after_task_count;
    if diminished {
        xp = scale(xp, policy.diminishing_returns.reduction_factor);
    }

    let modifier = streak_modifier(streak, policy);
    match modifier {
        StreakModifier::Bonus(m) | StreakModifier::NoStreakPenalty(m) => xp = scale(xp, m),
        StreakModifier::None => {}
    }

    let earned_today = progress.xp_earned_on(today);
    let remaining = policy.daily_xp_cap.saturating_sub(earned_today);
    let awarded = xp.min(remaining);

    tracing::debug!(
        task = %task.id,
        base = task.xp,
        index,
        streak,
        timer_expired,
        diminished,
        ?modifier,
        modified = xp,
        earned_today,
        awarded,
        "processed quest completion"
    );

    let mut next = progress.clone();
    next.xp = next.xp.saturating_add(awarded);
    next.streak = streak;
    next.last_completion_date = Some(today);
    next.daily_completions
        .entry(today)
        .or_default()
        .push(task.id.clone());
    next.completion_history.push(CompletionRecord {
        task_id: task.id.clone(),
        task_name: task.name.clone(),
        completion_date: today,
        xp_earned: awarded,
    });
    next.active_timers.remove(&task.id);

    Completion {
        progress: next,
        award: XpAward {
            base: task.xp,
            timer_expired,
            diminished,
            streak_modifier: modifier,
            modified: xp,
            awarded,
            streak,
        },
    }
}

/// Next progress state after `task` is completed.
pub fn process_task_completion(
    task: &Task,
    progress: &Progress,
    policy: &XpPolicy,
    all_tasks: &[Task],
    clock: &dyn Clock,
) -> Progress {
    complete_task(task, progress, policy, all_tasks, clock).progress
}
