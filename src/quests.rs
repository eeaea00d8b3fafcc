//! Quest availability views.
//!
//! Both views keep catalog order, not completion order.

use chrono::NaiveDate;

use crate::clock::week_days;
use crate::fields::Repeatable;
use crate::progress::Progress;
use crate::task::Task;

/// Whether `task` can be completed on `today` given its repeat cadence.
pub fn is_available(task: &Task, progress: &Progress, today: NaiveDate) -> bool {
    let done_on = |day: NaiveDate| progress.completions_on(day).iter().any(|id| *id == task.id);
    match task.repeatable {
        Repeatable::Daily => !done_on(today),
        Repeatable::Weekly => !week_days(today).any(done_on),
        Repeatable::Once => !progress.ever_completed(&task.id),
    }
}

/// Quests that can still be completed today.
pub fn available_quests<'a>(catalog: &'a [Task], progress: &Progress, today: NaiveDate) -> Vec<&'a Task> {
    catalog
        .iter()
        .filter(|t| is_available(t, progress, today))
        .collect()
}

/// Quests already completed today.
pub fn completed_today_quests<'a>(catalog: &'a [Task], progress: &Progress, today: NaiveDate) -> Vec<&'a Task> {
    let done = progress.completions_on(today);
    catalog
        .iter()
        .filter(|t| done.contains(&t.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::parse_day;

    fn day(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    fn task(id: &str, repeatable: Repeatable) -> Task {
        Task {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            xp: 10,
            repeatable,
            difficulty: None,
            timer: None,
            xp_penalty_factor: None,
        }
    }

    fn catalog() -> Vec<Task> {
        vec![
            task("dishes", Repeatable::Daily),
            task("garden", Repeatable::Weekly),
            task("bike", Repeatable::Once),
            task("bed", Repeatable::Daily),
        ]
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    fn completed(on: &str, list: &[&str]) -> Progress {
        let mut p = Progress::default();
        p.daily_completions
            .insert(day(on), list.iter().map(|s| s.to_string()).collect());
        p
    }

    #[test]
    fn test_everything_available_initially() {
        let cat = catalog();
        let avail = available_quests(&cat, &Progress::default(), day("2024-05-15"));
        assert_eq!(ids(&avail), ["dishes", "garden", "bike", "bed"]);
    }

    #[test]
    fn test_daily_hidden_today_only() {
        let cat = catalog();
        let p = completed("2024-05-15", &["bed", "dishes"]);
        assert_eq!(ids(&available_quests(&cat, &p, day("2024-05-15"))), ["garden", "bike"]);
        // Catalog order, not completion order.
        assert_eq!(ids(&completed_today_quests(&cat, &p, day("2024-05-15"))), ["dishes", "bed"]);
        assert_eq!(ids(&available_quests(&cat, &p, day("2024-05-16"))), ["dishes", "garden", "bike", "bed"]);
    }

    #[test]
    fn test_weekly_hidden_until_next_sunday() {
        let cat = catalog();
        // Monday 2024-05-13.
        let p = completed("2024-05-13", &["garden"]);
        assert!(!is_available(&cat[1], &p, day("2024-05-18")));
        assert!(!is_available(&cat[1], &p, day("2024-05-12")));
        assert!(is_available(&cat[1], &p, day("2024-05-19")));
    }

    #[test]
    fn test_once_hidden_forever() {
        let cat = catalog();
        let p = completed("2023-01-02", &["bike"]);
        for d in ["2023-01-02", "2023-06-30", "2031-12-25"] {
            assert!(!is_available(&cat[2], &p, day(d)));
        }
        assert!(completed_today_quests(&cat, &p, day("2023-06-30")).is_empty());
    }
}
