//! Enumerations shared by quests and rewards.
//!
//! This module defines the repeat cadence of a quest, its optional difficulty
//! rating, and the purchase-window kinds a reward limit can use.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How often a quest may be completed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Repeatable {
    Daily,
    Weekly,
    /// Completable once, ever.
    #[serde(rename = "none", alias = "once")]
    #[value(name = "none")]
    Once,
}

/// Difficulty rating shown alongside a quest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Rolling window over which a reward's purchase count is limited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LimitType {
    Daily,
    Weekly,
    Monthly,
    #[serde(rename = "none")]
    #[value(name = "none")]
    Unlimited,
}

/// Format a repeat cadence for display.
pub fn format_repeatable(r: Repeatable) -> &'static str {
    match r {
        Repeatable::Daily => "Daily",
        Repeatable::Weekly => "Weekly",
        Repeatable::Once => "Once",
    }
}

/// Format a difficulty for display.
pub fn format_difficulty(d: Option<Difficulty>) -> &'static str {
    match d {
        Some(Difficulty::Easy) => "Easy",
        Some(Difficulty::Medium) => "Medium",
        Some(Difficulty::Hard) => "Hard",
        None => "-",
    }
}

/// Format a limit window for display.
pub fn format_limit_type(l: LimitType) -> &'static str {
    match l {
        LimitType::Daily => "per day",
        LimitType::Weekly => "per week",
        LimitType::Monthly => "per month",
        LimitType::Unlimited => "unlimited",
    }
}
