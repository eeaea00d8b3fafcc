//! Configuration: profiles, the XP policy and the base catalog.
//!
//! Read from a TOML file; the bundled default is written out on first run.
//! `Config::validate` is the gate that keeps degenerate policy values away from
//! the XP engine.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fields::{format_limit_type, LimitType};
use crate::policy::XpPolicy;
use crate::profile::{is_valid_plain_pin, Profile};
use crate::reward::Reward;
use crate::schema::is_id_string;
use crate::task::Task;

pub const CONFIG_FILE: &str = "questbox.toml";
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub xp_policy: XpPolicy,
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
}

/// `~/.questbox`, or `./.questbox` when there is no home directory.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".questbox")
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

fn unit_factor(name: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be in (0, 1], got {value}")))
    }
}

fn unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !is_id_string(id) {
            return Err(invalid(format!(
                "{kind} id '{id}' may only contain letters, digits, '_', '-' and '.'"
            )));
        }
        if !seen.insert(id) {
            return Err(invalid(format!("duplicate {kind} id '{id}'")));
        }
    }
    Ok(())
}

impl Config {
    /// The configuration shipped with the binary.
    pub fn bundled() -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(DEFAULT_CONFIG)?;
        config.validate()?;
        Ok(config)
    }

    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let policy = &self.xp_policy;
        if policy.xp_per_level == 0 {
            return Err(invalid("xpPerLevel must be positive"));
        }
        if policy.daily_xp_cap == 0 {
            return Err(invalid("dailyXpCap must be positive"));
        }
        if policy.streak_bonus.days == 0 {
            return Err(invalid("streakBonus.days must be positive"));
        }
        if !(policy.streak_bonus.multiplier.is_finite() && policy.streak_bonus.multiplier > 0.0) {
            return Err(invalid("streakBonus.multiplier must be a positive number"));
        }
        if policy.diminishing_returns.after_task_count == 0 {
            return Err(invalid("diminishingReturns.afterTaskCount must be at least 1"));
        }
        unit_factor(
            "diminishingReturns.reductionFactor",
            policy.diminishing_returns.reduction_factor,
        )?;
        if let Some(factor) = policy.no_streak_reduction_factor {
            unit_factor("noStreakReductionFactor", factor)?;
        }

        if self.profiles.is_empty() {
            return Err(invalid("at least one profile is required"));
        }
        unique_ids("profile", self.profiles.iter().map(|p| p.id.as_str()))?;
        for p in &self.profiles {
            if p.name.trim().is_empty() {
                return Err(invalid(format!("profile '{}' has an empty name", p.id)));
            }
            if !p.pin_is_hashed() && !is_valid_plain_pin(&p.pin) {
                return Err(invalid(format!("profile '{}' PIN must be 4 digits", p.id)));
            }
        }

        unique_ids("quest", self.tasks.iter().map(|t| t.id.as_str()))?;
        for t in &self.tasks {
            if t.name.trim().is_empty() {
                return Err(invalid(format!("quest '{}' has an empty name", t.id)));
            }
            if t.timer == Some(0) {
                return Err(invalid(format!("quest '{}' timer must be at least 1 minute", t.id)));
            }
            if let Some(factor) = t.xp_penalty_factor {
                unit_factor(&format!("quest '{}' xpPenaltyFactor", t.id), factor)?;
            }
        }

        unique_ids("reward", self.rewards.iter().map(|r| r.id.as_str()))?;
        for r in &self.rewards {
            if r.cost == 0 {
                return Err(invalid(format!("reward '{}' cost must be positive", r.id)));
            }
            if r.limit.kind != LimitType::Unlimited && r.limit.count.unwrap_or(0) == 0 {
                return Err(invalid(format!(
                    "reward '{}' has a {} limit and needs a positive count",
                    r.id,
                    format_limit_type(r.limit.kind)
                )));
            }
        }
        Ok(())
    }
}

/// Read and validate the config at `path`, writing the bundled default first if absent.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    };
    let contents = if path.exists() {
        fs::read_to_string(path).map_err(io_err)?
    } else {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, DEFAULT_CONFIG).map_err(io_err)?;
        tracing::info!(path = %path.display(), "wrote default config");
        DEFAULT_CONFIG.to_string()
    };
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;
    for p in config.profiles.iter().filter(|p| !p.pin_is_hashed()) {
        tracing::warn!(profile = %p.id, "PIN stored in plaintext; run `qb hash-pin` to store a salted hash");
    }
    Ok(config)
}
