//! Reward purchase-limit windows.

use chrono::NaiveDate;

use crate::clock::{same_month, start_of_week};
use crate::fields::LimitType;
use crate::progress::Progress;
use crate::reward::Reward;

/// Whether `day` falls inside the `kind` window that contains `today`.
pub fn in_window(kind: LimitType, day: NaiveDate, today: NaiveDate) -> bool {
    match kind {
        LimitType::Daily => day == today,
        LimitType::Weekly => day >= start_of_week(today),
        LimitType::Monthly => same_month(day, today),
        LimitType::Unlimited => true,
    }
}

/// Purchases of `reward` that count against its limit as of `today`.
pub fn purchases_in_window(reward: &Reward, progress: &Progress, today: NaiveDate) -> usize {
    progress
        .purchases_of(&reward.id)
        .iter()
        .filter(|&&d| in_window(reward.limit.kind, d, today))
        .count()
}

/// True when the reward may not be bought again in the current window.
pub fn is_limit_reached(reward: &Reward, progress: &Progress, today: NaiveDate) -> bool {
    let count = match (reward.limit.kind, reward.limit.count) {
        (LimitType::Unlimited, _) | (_, None) => return false,
        (_, Some(count)) => count as usize,
    };
    if progress.purchases_of(&reward.id).len() < count {
        return false;
    }
    purchases_in_window(reward, progress, today) >= count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::parse_day;
    use crate::reward::RewardLimit;

    fn day(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    fn reward(kind: LimitType, count: Option<u32>) -> Reward {
        Reward {
            id: "movie".into(),
            name: "Movie night".into(),
            description: None,
            cost: 100,
            limit: RewardLimit { kind, count },
            needs_approval: false,
        }
    }

    fn bought(days: &[&str]) -> Progress {
        let mut p = Progress::default();
        p.purchased_rewards
            .insert("movie".into(), days.iter().map(|d| day(d)).collect());
        p
    }

    #[test]
    fn test_unlimited_or_countless_never_limited() {
        let p = bought(&["2024-05-10", "2024-05-10", "2024-05-10"]);
        assert!(!is_limit_reached(&reward(LimitType::Unlimited, Some(1)), &p, day("2024-05-10")));
        assert!(!is_limit_reached(&reward(LimitType::Daily, None), &p, day("2024-05-10")));
    }

    #[test]
    fn test_daily_limit_resets_next_day() {
        let r = reward(LimitType::Daily, Some(2));
        let today = day("2024-05-10");
        assert!(!is_limit_reached(&r, &Progress::default(), today));
        assert!(!is_limit_reached(&r, &bought(&["2024-05-10"]), today));
        let p = bought(&["2024-05-10", "2024-05-10"]);
        assert!(is_limit_reached(&r, &p, today));
        assert!(!is_limit_reached(&r, &p, day("2024-05-11")));
    }

    #[test]
    fn test_weekly_window_starts_sunday() {
        let r = reward(LimitType::Weekly, Some(1));
        // 2024-05-12 is a Sunday.
        let p = bought(&["2024-05-11"]);
        assert!(is_limit_reached(&r, &p, day("2024-05-11")));
        assert!(!is_limit_reached(&r, &p, day("2024-05-12")));
        let p = bought(&["2024-05-12"]);
        assert!(is_limit_reached(&r, &p, day("2024-05-18")));
        assert!(!is_limit_reached(&r, &p, day("2024-05-19")));
    }

    #[test]
    fn test_monthly_window_checks_year_too() {
        let r = reward(LimitType::Monthly, Some(2));
        let p = bought(&["2023-05-03", "2024-05-01", "2024-05-28"]);
        assert!(is_limit_reached(&r, &p, day("2024-05-31")));
        assert!(!is_limit_reached(&r, &p, day("2024-06-01")));
        let p = bought(&["2023-05-03", "2024-05-01"]);
        assert!(!is_limit_reached(&r, &p, day("2024-05-20")));
    }
}
