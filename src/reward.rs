//! Reward data structures.

use serde::{Deserialize, Serialize};

use crate::fields::LimitType;

/// Purchase limit: at most `count` purchases per window of kind `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardLimit {
    #[serde(rename = "type")]
    pub kind: LimitType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl RewardLimit {
    pub fn unlimited() -> Self {
        RewardLimit {
            kind: LimitType::Unlimited,
            count: None,
        }
    }
}

/// Something a profile can spend XP on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub cost: u64,
    #[serde(default = "RewardLimit::unlimited")]
    pub limit: RewardLimit,
    #[serde(default)]
    pub needs_approval: bool,
}

/// A reward as returned by an external generator, before id and approval are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedReward {
    pub name: String,
    pub description: String,
    pub cost: i64,
    pub limit: RewardLimit,
}
