//! Read-only dashboard views: next reward to save for and the leaderboard.

use crate::policy::{calculate_level, XpPolicy};
use crate::profile::Profile;
use crate::progress::AllProgress;
use crate::reward::Reward;

/// One leaderboard line.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub profile_id: String,
    pub name: String,
    pub level: u64,
    pub xp: u64,
}

/// The cheapest reward the profile cannot afford yet.
pub fn next_reward(rewards: &[Reward], xp: u64) -> Option<&Reward> {
    rewards
        .iter()
        .filter(|r| r.cost > xp)
        .min_by_key(|r| r.cost)
}

/// Profiles ranked by XP, highest first. Ties keep profile order.
pub fn leaderboard(profiles: &[Profile], all: &AllProgress, policy: &XpPolicy) -> Vec<Standing> {
    let mut rows: Vec<Standing> = profiles
        .iter()
        .map(|p| {
            let xp = all.get(&p.id).map(|progress| progress.xp).unwrap_or(0);
            Standing {
                profile_id: p.id.clone(),
                name: p.name.clone(),
                level: calculate_level(xp, policy.xp_per_level).level,
                xp,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.xp.cmp(&a.xp));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Progress;
    use crate::reward::RewardLimit;

    fn reward(id: &str, cost: u64) -> Reward {
        Reward {
            id: id.into(),
            name: id.into(),
            description: None,
            cost,
            limit: RewardLimit::unlimited(),
            needs_approval: false,
        }
    }

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.into(),
            name: id.to_uppercase(),
            pin: "0000".into(),
        }
    }

    #[test]
    fn test_next_reward_is_cheapest_unaffordable() {
        let rewards = vec![reward("game", 300), reward("sticker", 50), reward("movie", 150)];
        assert_eq!(next_reward(&rewards, 60).unwrap().id, "movie");
        assert_eq!(next_reward(&rewards, 0).unwrap().id, "sticker");
        assert!(next_reward(&rewards, 300).is_none());
    }

    #[test]
    fn test_leaderboard_orders_by_xp() {
        let profiles = vec![profile("ana"), profile("ben"), profile("cy")];
        let mut all = AllProgress::new();
        all.insert("ana".into(), Progress { xp: 120, ..Progress::default() });
        all.insert("ben".into(), Progress { xp: 1_250, ..Progress::default() });
        let board = leaderboard(&profiles, &all, &XpPolicy::default());
        let order: Vec<&str> = board.iter().map(|s| s.profile_id.as_str()).collect();
        assert_eq!(order, ["ben", "ana", "cy"]);
        assert_eq!(board[0].level, 3);
        assert_eq!(board[2], Standing { profile_id: "cy".into(), name: "CY".into(), level: 1, xp: 0 });
    }
}
