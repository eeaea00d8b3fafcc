//! Per-profile progress records.
//!
//! A `Progress` is the whole mutable state of one profile: XP, streak, the
//! per-day completion lists, reward purchases, the completion log and any
//! running quest timers. `AllProgress` maps profile ids to their records and is
//! what the store persists as a single blob.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::profile::Profile;

/// Every profile's progress, keyed by profile id.
pub type AllProgress = BTreeMap<String, Progress>;

/// One recorded completion. `xp_earned` is what was actually awarded after the daily cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub task_id: String,
    pub task_name: String,
    pub completion_date: NaiveDate,
    pub xp_earned: u64,
}

/// Wall-clock timer for a timed quest. A paused timer has no `start_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub start_time: Option<DateTime<Utc>>,
    /// Milliseconds accumulated before the most recent pause.
    #[serde(default)]
    pub elapsed_before_pause: u64,
}

impl TimerState {
    pub fn started_at(now: DateTime<Utc>) -> Self {
        TimerState {
            start_time: Some(now),
            elapsed_before_pause: 0,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.start_time.is_none()
    }
}

/// Older records stored a running timer as its bare start instant.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTimer {
    Current(TimerState),
    LegacyStart(DateTime<Utc>),
}

impl From<StoredTimer> for TimerState {
    fn from(stored: StoredTimer) -> Self {
        match stored {
            StoredTimer::Current(state) => state,
            StoredTimer::LegacyStart(start) => TimerState::started_at(start),
        }
    }
}

fn deserialize_timers<'de, D>(deserializer: D) -> Result<BTreeMap<String, TimerState>, D::Error>
where
    D: Deserializer<'de>,
{
    let stored = BTreeMap::<String, StoredTimer>::deserialize(deserializer)?;
    Ok(stored.into_iter().map(|(id, t)| (id, t.into())).collect())
}

/// Progress of a single profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub xp: u64,
    pub streak: u32,
    pub last_completion_date: Option<NaiveDate>,
    /// Day -> quest ids completed that day, in completion order.
    pub daily_completions: BTreeMap<NaiveDate, Vec<String>>,
    /// Reward id -> purchase days, in purchase order.
    pub purchased_rewards: BTreeMap<String, Vec<NaiveDate>>,
    /// Persisted but never consumed.
    #[serde(default)]
    pub streak_savers: u32,
    #[serde(default)]
    pub completion_history: Vec<CompletionRecord>,
    #[serde(default, deserialize_with = "deserialize_timers")]
    pub active_timers: BTreeMap<String, TimerState>,
}

impl Progress {
    /// Quest ids completed on `day`, in completion order.
    pub fn completions_on(&self, day: NaiveDate) -> &[String] {
        self.daily_completions
            .get(&day)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// XP actually recorded on `day`, summed from the completion log. Saturates.
    pub fn xp_earned_on(&self, day: NaiveDate) -> u64 {
        self.completion_history
            .iter()
            .filter(|r| r.completion_date == day)
            .fold(0u64, |acc, r| acc.saturating_add(r.xp_earned))
    }

    /// Whether `task_id` appears in any day's completions.
    pub fn ever_completed(&self, task_id: &str) -> bool {
        self.daily_completions
            .values()
            .any(|ids| ids.iter().any(|id| id == task_id))
    }

    pub fn purchases_of(&self, reward_id: &str) -> &[NaiveDate] {
        self.purchased_rewards
            .get(reward_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Fresh, empty progress for each profile.
pub fn initial_progress(profiles: &[Profile]) -> AllProgress {
    profiles
        .iter()
        .map(|p| (p.id.clone(), Progress::default()))
        .collect()
}
