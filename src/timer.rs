//! Wall-clock quest timers.
//!
//! Timers are timestamps, not countdowns: pausing folds the running span into
//! `elapsed_before_pause` and clears `start_time`. Nothing ticks in the background.

use chrono::{DateTime, Duration, Utc};

use crate::error::TimerError;
use crate::progress::{Progress, TimerState};
use crate::task::Task;

/// Total time on the clock for `timer` as of `now`. Clock skew never goes negative;
/// totals beyond the representable range saturate at `Duration::MAX`.
pub fn elapsed(timer: &TimerState, now: DateTime<Utc>) -> Duration {
    let before = i64::try_from(timer.elapsed_before_pause)
        .ok()
        .and_then(Duration::try_milliseconds)
        .unwrap_or(Duration::MAX);
    let running = match timer.start_time {
        Some(start) => (now - start).max(Duration::zero()),
        None => Duration::zero(),
    };
    before.checked_add(&running).unwrap_or(Duration::MAX)
}

/// True once a timed quest has run strictly past its deadline.
pub fn is_expired(task: &Task, timer: &TimerState, now: DateTime<Utc>) -> bool {
    match task.timer {
        Some(minutes) => elapsed(timer, now) > Duration::minutes(minutes as i64),
        None => false,
    }
}

/// Time left before the deadline, or `None` for untimed quests. Zero once expired.
pub fn remaining(task: &Task, timer: &TimerState, now: DateTime<Utc>) -> Option<Duration> {
    let limit = Duration::minutes(task.timer? as i64);
    let left = limit.checked_sub(&elapsed(timer, now)).unwrap_or(Duration::zero());
    Some(left.max(Duration::zero()))
}

/// Start a timer for `task`. A paused timer resumes; a running one is left alone.
pub fn start_timer(task: &Task, progress: &Progress, now: DateTime<Utc>) -> Result<Progress, TimerError> {
    if task.timer.is_none() {
        return Err(TimerError::NotTimed(task.id.clone()));
    }
    let mut next = progress.clone();
    let timer = next
        .active_timers
        .entry(task.id.clone())
        .or_insert_with(|| TimerState::started_at(now));
    if timer.is_paused() {
        timer.start_time = Some(now);
    }
    tracing::debug!(task = %task.id, "timer started");
    Ok(next)
}

/// Freeze a running timer, keeping its accumulated time.
pub fn pause_timer(task_id: &str, progress: &Progress, now: DateTime<Utc>) -> Result<Progress, TimerError> {
    let mut next = progress.clone();
    let timer = next
        .active_timers
        .get_mut(task_id)
        .ok_or_else(|| TimerError::NotRunning(task_id.to_string()))?;
    if !timer.is_paused() {
        timer.elapsed_before_pause = elapsed(timer, now).num_milliseconds().max(0) as u64;
        timer.start_time = None;
        tracing::debug!(task = %task_id, elapsed_ms = timer.elapsed_before_pause, "timer paused");
    }
    Ok(next)
}

/// Continue a paused timer from `now`.
pub fn resume_timer(task_id: &str, progress: &Progress, now: DateTime<Utc>) -> Result<Progress, TimerError> {
    let mut next = progress.clone();
    let timer = next
        .active_timers
        .get_mut(task_id)
        .ok_or_else(|| TimerError::NotRunning(task_id.to_string()))?;
    if timer.is_paused() {
        timer.start_time = Some(now);
    }
    Ok(next)
}

/// Drop the timer entry entirely.
pub fn reset_timer(task_id: &str, progress: &Progress) -> Progress {
    let mut next = progress.clone();
    next.active_timers.remove(task_id);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Repeatable;
    use chrono::TimeZone;

    fn timed(minutes: u32) -> Task {
        Task {
            id: "read".into(),
            name: "Read a chapter".into(),
            description: String::new(),
            xp: 50,
            repeatable: Repeatable::Daily,
            difficulty: None,
            timer: Some(minutes),
            xp_penalty_factor: None,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_start_pause_resume_accumulates() {
        let task = timed(30);
        let p = start_timer(&task, &Progress::default(), t0()).unwrap();
        let p = pause_timer("read", &p, t0() + Duration::minutes(10)).unwrap();
        let timer = p.active_timers["read"];
        assert!(timer.is_paused());
        assert_eq!(timer.elapsed_before_pause, 600_000);

        // Time while paused does not count.
        let later = t0() + Duration::hours(3);
        assert_eq!(elapsed(&timer, later), Duration::minutes(10));

        let p = resume_timer("read", &p, later).unwrap();
        let timer = p.active_timers["read"];
        assert_eq!(elapsed(&timer, later + Duration::minutes(5)), Duration::minutes(15));
        assert!(!is_expired(&task, &timer, later + Duration::minutes(20)));
        assert!(is_expired(&task, &timer, later + Duration::minutes(21)));
        assert_eq!(remaining(&task, &timer, later + Duration::minutes(5)), Some(Duration::minutes(15)));
    }

    #[test]
    fn test_start_twice_keeps_original_start() {
        let task = timed(30);
        let p = start_timer(&task, &Progress::default(), t0()).unwrap();
        let p = start_timer(&task, &p, t0() + Duration::minutes(5)).unwrap();
        assert_eq!(p.active_timers["read"].start_time, Some(t0()));
    }

    #[test]
    fn test_untimed_and_missing_timers() {
        let mut task = timed(30);
        task.timer = None;
        assert_eq!(
            start_timer(&task, &Progress::default(), t0()),
            Err(TimerError::NotTimed("read".into()))
        );
        assert_eq!(
            pause_timer("read", &Progress::default(), t0()),
            Err(TimerError::NotRunning("read".into()))
        );
        let p = start_timer(&timed(5), &Progress::default(), t0()).unwrap();
        assert!(reset_timer("read", &p).active_timers.is_empty());
    }

    #[test]
    fn test_huge_stored_elapsed_saturates() {
        let task = timed(30);
        for stored in [i64::MAX as u64, i64::MAX as u64 + 1, u64::MAX] {
            let timer = TimerState {
                start_time: Some(t0()),
                elapsed_before_pause: stored,
            };
            let later = t0() + Duration::minutes(1);
            assert_eq!(elapsed(&timer, later), Duration::MAX);
            assert!(is_expired(&task, &timer, later));
            assert_eq!(remaining(&task, &timer, later), Some(Duration::zero()));
        }
    }

    #[test]
    fn test_clock_skew_clamps_to_zero() {
        let timer = TimerState::started_at(t0());
        assert_eq!(elapsed(&timer, t0() - Duration::minutes(1)), Duration::zero());
    }
}
