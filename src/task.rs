//! Quest data structures.
//!
//! This module defines the `Task` catalog entry a profile completes for XP, the
//! id-less shape an external generator hands back, and the editable subset of
//! fields a guardian may change.

use serde::{Deserialize, Serialize};

use crate::fields::*;

/// Default XP multiplier when a timed quest finishes late and names no factor.
pub const DEFAULT_PENALTY_FACTOR: f64 = 0.5;

/// A completable quest.
///
/// `timer` is a soft deadline in minutes; finishing after it scales the XP by
/// `xp_penalty_factor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub xp: u64,
    pub repeatable: Repeatable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_penalty_factor: Option<f64>,
}

impl Task {
    pub fn penalty_factor(&self) -> f64 {
        self.xp_penalty_factor.unwrap_or(DEFAULT_PENALTY_FACTOR)
    }
}

/// A quest as returned by an external generator, before the core assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTask {
    pub name: String,
    pub description: String,
    pub xp: i64,
    pub repeatable: Repeatable,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub timer: Option<u32>,
    #[serde(default)]
    pub xp_penalty_factor: Option<f64>,
}

/// Fields a guardian may change on an existing quest.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub name: Option<String>,
    pub description: Option<String>,
    pub xp: Option<i64>,
    pub difficulty: Option<Difficulty>,
}
