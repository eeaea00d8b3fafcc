//! Spending XP on rewards, and resetting a profile.
//!
//! Authorization is not checked here: callers must have verified the guardian
//! PIN before calling into this module for approval-gated rewards or resets.

use chrono::NaiveDate;

use crate::error::PurchaseError;
use crate::limits::is_limit_reached;
use crate::progress::Progress;
use crate::reward::Reward;

/// Whether the profile can afford `reward` right now.
pub fn can_afford(reward: &Reward, progress: &Progress) -> bool {
    progress.xp >= reward.cost
}

/// Deduct the cost and record today's purchase.
pub fn purchase_reward(reward: &Reward, progress: &Progress, today: NaiveDate) -> Result<Progress, PurchaseError> {
    if !can_afford(reward, progress) {
        return Err(PurchaseError::InsufficientXp {
            cost: reward.cost,
            available: progress.xp,
        });
    }
    if is_limit_reached(reward, progress, today) {
        return Err(PurchaseError::LimitReached(reward.id.clone()));
    }
    let mut next = progress.clone();
    next.xp -= reward.cost;
    next.purchased_rewards
        .entry(reward.id.clone())
        .or_default()
        .push(today);
    tracing::info!(reward = %reward.id, cost = reward.cost, remaining = next.xp, "reward purchased");
    Ok(next)
}

/// Wipe a profile's progress, keeping only its streak-saver counter.
pub fn reset_progress(progress: &Progress) -> Progress {
    Progress {
        streak_savers: progress.streak_savers,
        ..Progress::default()
    }
}
