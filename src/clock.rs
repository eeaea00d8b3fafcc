//! Wall-clock access and calendar-day helpers.
//!
//! Every "today" in the crate is a local calendar day. Day strings are always
//! parsed component-wise (`YYYY-MM-DD`) so no timezone shift can move a purchase
//! or completion onto a neighbouring day.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveTime, Offset, Utc};

/// Source of the current instant and the profile-local calendar day.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn today(&self) -> NaiveDate;
}

/// The machine clock, with "today" taken in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock frozen at one instant, viewed from a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
}

impl FixedClock {
    pub fn utc(now: DateTime<Utc>) -> Self {
        FixedClock {
            now,
            offset: Utc.fix(),
        }
    }

    /// Noon UTC on the given day; convenient for date-only tests.
    pub fn on_day(day: NaiveDate) -> Self {
        let noon = (day.and_time(NaiveTime::MIN) + Duration::hours(12)).and_utc();
        FixedClock::utc(noon)
    }

    pub fn advanced(self, by: Duration) -> Self {
        FixedClock {
            now: self.now + by,
            ..self
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.offset).date_naive()
    }
}

/// Format a calendar day as `YYYY-MM-DD`.
pub fn day_string(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` day string into its calendar components.
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn previous_day(day: NaiveDate) -> NaiveDate {
    day - Duration::days(1)
}

/// Most recent Sunday (inclusive of `day` itself when it is a Sunday).
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_sunday() as i64)
}

/// The seven days of the Sunday-start week containing `day`.
pub fn week_days(day: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let start = start_of_week(day);
    (0..7).map(move |i| start + Duration::days(i))
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
