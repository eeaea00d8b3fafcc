//! Quest and reward catalog.
//!
//! The base catalog comes from the config file. Generated entries and guardian
//! edits live in an overlay persisted under its own storage key; an overlay entry
//! whose id exists in the base replaces it in place, new entries are listed first,
//! newest first.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{CatalogError, StoreResult};
use crate::fields::LimitType;
use crate::reward::{GeneratedReward, Reward};
use crate::schema::is_id_string;
use crate::store::{KeyValueStore, CATALOG_KEY};
use crate::task::{GeneratedTask, Task, TaskEdit};

pub const GENERATED_XP_RANGE: (i64, i64) = (10, 100);
pub const GENERATED_COST_RANGE: (i64, i64) = (50, 500);

/// Anything in the catalog addressable by id or name.
pub trait CatalogEntry {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

impl CatalogEntry for Task {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl CatalogEntry for Reward {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// Entries added or edited at runtime, in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogOverlay {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
}

fn task_problem(task: &Task) -> Option<&'static str> {
    if !is_id_string(&task.id) {
        Some("malformed id")
    } else if task.name.trim().is_empty() {
        Some("empty name")
    } else if task.timer == Some(0) {
        Some("zero-minute timer")
    } else if task.xp_penalty_factor.is_some_and(|f| !(f > 0.0 && f <= 1.0)) {
        Some("penalty factor outside (0, 1]")
    } else {
        None
    }
}

fn reward_problem(reward: &Reward) -> Option<&'static str> {
    if !is_id_string(&reward.id) {
        Some("malformed id")
    } else if reward.name.trim().is_empty() {
        Some("empty name")
    } else if reward.cost == 0 {
        Some("zero cost")
    } else if reward.limit.kind != LimitType::Unlimited && reward.limit.count.unwrap_or(0) == 0 {
        Some("limit without a positive count")
    } else {
        None
    }
}

impl CatalogOverlay {
    /// Drop stored entries the catalog API would never have written.
    fn retain_valid(&mut self) {
        self.tasks.retain(|t| match task_problem(t) {
            Some(problem) => {
                tracing::warn!(task = %t.id, problem, "dropping invalid stored quest");
                false
            }
            None => true,
        });
        self.rewards.retain(|r| match reward_problem(r) {
            Some(problem) => {
                tracing::warn!(reward = %r.id, problem, "dropping invalid stored reward");
                false
            }
            None => true,
        });
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    base_tasks: Vec<Task>,
    base_rewards: Vec<Reward>,
    overlay: CatalogOverlay,
    pub tasks: Vec<Task>,
    pub rewards: Vec<Reward>,
}

fn merge<T: CatalogEntry + Clone>(base: &[T], overlay: &[T]) -> Vec<T> {
    let mut merged: Vec<T> = overlay
        .iter()
        .rev()
        .filter(|o| !base.iter().any(|b| b.id() == o.id()))
        .cloned()
        .collect();
    merged.extend(base.iter().map(|b| {
        overlay
            .iter()
            .find(|o| o.id() == b.id())
            .unwrap_or(b)
            .clone()
    }));
    merged
}

fn upsert<T: CatalogEntry>(list: &mut Vec<T>, entry: T) {
    match list.iter().position(|e| e.id() == entry.id()) {
        Some(i) => list[i] = entry,
        None => list.push(entry),
    }
}

/// Resolve an id, or failing that a unique case-insensitive name.
pub fn resolve<'a, T: CatalogEntry>(
    items: &'a [T],
    identifier: &str,
    not_found: fn(String) -> CatalogError,
) -> Result<&'a T, CatalogError> {
    if let Some(hit) = items.iter().find(|t| t.id() == identifier) {
        return Ok(hit);
    }
    let wanted = identifier.to_lowercase();
    let matches: Vec<&T> = items
        .iter()
        .filter(|t| t.name().to_lowercase() == wanted)
        .collect();
    match matches.as_slice() {
        [] => Err(not_found(identifier.to_string())),
        [one] => Ok(*one),
        many => Err(CatalogError::Ambiguous {
            identifier: identifier.to_string(),
            candidates: many
                .iter()
                .map(|t| format!("{} ({})", t.id(), t.name()))
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// Fresh collision-resistant id for a runtime-added entry.
pub fn new_catalog_id() -> String {
    format!("ai_{}", Ulid::new())
}

fn non_blank(field: &str, value: &str) -> Result<String, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::Invalid(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Validate generator output and turn it into a quest with a fresh id.
pub fn accept_generated_task(generated: GeneratedTask) -> Result<Task, CatalogError> {
    let name = non_blank("name", &generated.name)?;
    let description = non_blank("description", &generated.description)?;
    if let Some(factor) = generated.xp_penalty_factor {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(CatalogError::Invalid(format!(
                "xpPenaltyFactor must be in (0, 1], got {factor}"
            )));
        }
    }
    if generated.timer == Some(0) {
        return Err(CatalogError::Invalid("timer must be at least one minute".into()));
    }
    let (lo, hi) = GENERATED_XP_RANGE;
    Ok(Task {
        id: new_catalog_id(),
        name,
        description,
        xp: generated.xp.clamp(lo, hi) as u64,
        repeatable: generated.repeatable,
        difficulty: generated.difficulty,
        timer: generated.timer,
        xp_penalty_factor: generated.xp_penalty_factor,
    })
}

/// Validate generator output and turn it into a reward with a fresh id.
pub fn accept_generated_reward(generated: GeneratedReward) -> Result<Reward, CatalogError> {
    let name = non_blank("name", &generated.name)?;
    let description = non_blank("description", &generated.description)?;
    let (lo, hi) = GENERATED_COST_RANGE;
    let mut limit = generated.limit;
    if limit.kind != LimitType::Unlimited && limit.count.unwrap_or(0) == 0 {
        limit.count = Some(1);
    }
    Ok(Reward {
        id: new_catalog_id(),
        name,
        description: Some(description),
        cost: generated.cost.clamp(lo, hi) as u64,
        limit,
        needs_approval: false,
    })
}

pub fn parse_generated_task(raw: &str) -> Result<Task, CatalogError> {
    accept_generated_task(serde_json::from_str(raw)?)
}

pub fn parse_generated_reward(raw: &str) -> Result<Reward, CatalogError> {
    accept_generated_reward(serde_json::from_str(raw)?)
}

impl Catalog {
    pub fn new(base_tasks: Vec<Task>, base_rewards: Vec<Reward>, overlay: CatalogOverlay) -> Self {
        let mut catalog = Catalog {
            base_tasks,
            base_rewards,
            overlay,
            tasks: Vec::new(),
            rewards: Vec::new(),
        };
        catalog.rebuild();
        catalog
    }

    /// Base entries plus whatever overlay is stored. An unreadable overlay is ignored.
    pub fn load<S: KeyValueStore>(backend: &S, base_tasks: Vec<Task>, base_rewards: Vec<Reward>) -> Self {
        let mut overlay = match backend.get(CATALOG_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "stored catalog overlay is invalid, ignoring it");
                CatalogOverlay::default()
            }),
            Ok(None) => CatalogOverlay::default(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read catalog overlay");
                CatalogOverlay::default()
            }
        };
        overlay.retain_valid();
        Catalog::new(base_tasks, base_rewards, overlay)
    }

    pub fn save_overlay<S: KeyValueStore>(&self, backend: &mut S) -> StoreResult<()> {
        let data = serde_json::to_string_pretty(&self.overlay)?;
        backend.set(CATALOG_KEY, &data)
    }

    pub fn overlay(&self) -> &CatalogOverlay {
        &self.overlay
    }

    fn rebuild(&mut self) {
        self.tasks = merge(&self.base_tasks, &self.overlay.tasks);
        self.rewards = merge(&self.base_rewards, &self.overlay.rewards);
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn resolve_task(&self, identifier: &str) -> Result<&Task, CatalogError> {
        resolve(&self.tasks, identifier, CatalogError::TaskNotFound)
    }

    pub fn resolve_reward(&self, identifier: &str) -> Result<&Reward, CatalogError> {
        resolve(&self.rewards, identifier, CatalogError::RewardNotFound)
    }

    /// Add an already-validated quest; returns its id.
    pub fn add_task(&mut self, task: Task) -> String {
        let id = task.id.clone();
        tracing::info!(task = %id, name = %task.name, "quest added");
        upsert(&mut self.overlay.tasks, task);
        self.rebuild();
        id
    }

    /// Add an already-validated reward; returns its id.
    pub fn add_reward(&mut self, reward: Reward) -> String {
        let id = reward.id.clone();
        tracing::info!(reward = %id, name = %reward.name, "reward added");
        upsert(&mut self.overlay.rewards, reward);
        self.rebuild();
        id
    }

    /// Change a quest's name, description, XP or difficulty.
    pub fn edit_task(&mut self, id: &str, edit: TaskEdit) -> Result<&Task, CatalogError> {
        let mut task = self
            .task(id)
            .cloned()
            .ok_or_else(|| CatalogError::TaskNotFound(id.to_string()))?;
        if let Some(name) = edit.name {
            task.name = non_blank("name", &name)?;
        }
        if let Some(description) = edit.description {
            task.description = description.trim().to_string();
        }
        if let Some(xp) = edit.xp {
            task.xp = u64::try_from(xp)
                .map_err(|_| CatalogError::Invalid("XP must be a non-negative number".into()))?;
        }
        if edit.difficulty.is_some() {
            task.difficulty = edit.difficulty;
        }
        upsert(&mut self.overlay.tasks, task);
        self.rebuild();
        self.task(id)
            .ok_or_else(|| CatalogError::TaskNotFound(id.to_string()))
    }
}
