use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::resource::ResourceCalendar;

/// Upper bound on consecutive calendar days examined while searching for a
/// working day. A calendar that blankets this many days with holidays is
/// treated as unusable rather than scanned further.
const MAX_SCAN_DAYS: i64 = 3_660;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    EmptyWorkweek,
    ScanExhausted { from: NaiveDate },
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::EmptyWorkweek => {
                write!(f, "calendar requires at least one working weekday")
            }
            CalendarError::ScanExhausted { from } => write!(
                f,
                "no working day found within {MAX_SCAN_DAYS} days of {from}"
            ),
        }
    }
}

impl std::error::Error for CalendarError {}

/// Parse a short weekday token (`m t w th f s su`), case-insensitively.
pub fn parse_weekday_token(token: &str) -> Option<Weekday> {
    match token.trim().to_ascii_lowercase().as_str() {
        "m" => Some(Weekday::Mon),
        "t" => Some(Weekday::Tue),
        "w" => Some(Weekday::Wed),
        "th" => Some(Weekday::Thu),
        "f" => Some(Weekday::Fri),
        "s" => Some(Weekday::Sat),
        "su" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Short token for a weekday, inverse of [`parse_weekday_token`].
pub fn weekday_token(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "m",
        Weekday::Tue => "t",
        Weekday::Wed => "w",
        Weekday::Thu => "th",
        Weekday::Fri => "f",
        Weekday::Sat => "s",
        Weekday::Sun => "su",
    }
}

/// An effective calendar for one party: weekday pattern, project holidays,
/// and personal time off. Membership checks are O(1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    non_working_days: HashSet<Weekday>,
    holidays: HashSet<NaiveDate>,
    time_off: HashSet<NaiveDate>,
}

/// Immutable per-run calendar configuration: the project start date, the
/// default workday pattern, and exact-date holidays. Resource-specific
/// overrides are layered on via [`CalendarConfig::calendar_for`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    start_date: NaiveDate,
    working_days: Vec<Weekday>,
    holidays: Vec<NaiveDate>,
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn new<I, J>(working_days: I, holidays: J) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let working_set: HashSet<Weekday> = working_days.into_iter().collect();
        if working_set.is_empty() {
            return Err(CalendarError::EmptyWorkweek);
        }

        let mut non_working_days = HashSet::new();
        for day in Self::ALL_WEEKDAYS {
            if !working_set.contains(&day) {
                non_working_days.insert(day);
            }
        }

        Ok(Self {
            non_working_days,
            holidays: holidays.into_iter().collect(),
            time_off: HashSet::new(),
        })
    }

    /// Layer personal time-off dates on top of this calendar.
    pub fn with_time_off<I>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.time_off.extend(dates);
        self
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.non_working_days.contains(&date.weekday())
            && !self.holidays.contains(&date)
            && !self.time_off.contains(&date)
    }

    /// Identity when `date` already works, else the next working day forward.
    pub fn skip_to_working_day(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        self.scan(date, 1)
    }

    /// Identity when `date` already works, else the prior working day.
    pub fn skip_back_to_working_day(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        self.scan(date, -1)
    }

    /// The first working day strictly after `date`.
    pub fn next_working_day(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        self.scan(date + Duration::days(1), 1)
    }

    /// The last working day strictly before `date`.
    pub fn prev_working_day(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        self.scan(date - Duration::days(1), -1)
    }

    /// The working day `n` steps after `start`. `start` is first snapped
    /// forward to a working day; `n == 0` returns that snapped day, so the
    /// result is the n-th working day counting the start day as the 0th.
    pub fn add_working_days(&self, start: NaiveDate, n: i64) -> Result<NaiveDate, CalendarError> {
        let mut current = self.skip_to_working_day(start)?;
        for _ in 0..n {
            current = self.next_working_day(current)?;
        }
        Ok(current)
    }

    /// Backward counterpart of [`WorkCalendar::add_working_days`]: snaps
    /// `end` back to a working day, then retreats `n` working-day steps.
    pub fn subtract_working_days(&self, end: NaiveDate, n: i64) -> Result<NaiveDate, CalendarError> {
        let mut current = self.skip_back_to_working_day(end)?;
        for _ in 0..n {
            current = self.prev_working_day(current)?;
        }
        Ok(current)
    }

    /// Inclusive count of working days in `[start, end]`; 0 when the range
    /// is empty or inverted.
    pub fn working_days_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        let mut count = 0;
        let mut current = start;
        while current <= end {
            if self.is_working_day(current) {
                count += 1;
            }
            current = current + Duration::days(1);
        }
        count
    }

    /// Last working day of an inclusive `duration`-day span starting at
    /// `start`: a 5-day span beginning Monday on a Mon-Fri week ends Friday.
    /// Durations of 0 or 1 both resolve to the (snapped) start day.
    pub fn span_end(&self, start: NaiveDate, duration: i64) -> Result<NaiveDate, CalendarError> {
        self.add_working_days(start, (duration - 1).max(0))
    }

    fn scan(&self, from: NaiveDate, step: i64) -> Result<NaiveDate, CalendarError> {
        let mut current = from;
        for _ in 0..MAX_SCAN_DAYS {
            if self.is_working_day(current) {
                return Ok(current);
            }
            current = current + Duration::days(step);
        }
        Err(CalendarError::ScanExhausted { from })
    }
}

impl CalendarConfig {
    pub fn new<I, J>(
        start_date: NaiveDate,
        working_days: I,
        holidays: J,
    ) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        if working.is_empty() {
            return Err(CalendarError::EmptyWorkweek);
        }
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Ok(Self {
            start_date,
            working_days: working,
            holidays,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }

    /// The project-default calendar: no personal time off.
    pub fn base_calendar(&self) -> Result<WorkCalendar, CalendarError> {
        WorkCalendar::new(
            self.working_days.iter().copied(),
            self.holidays.iter().copied(),
        )
    }

    /// The effective calendar for a resource. The resource's workday
    /// override replaces the project default when present, and its time-off
    /// dates are layered on. `None` yields the project-default calendar.
    pub fn calendar_for(
        &self,
        resource: Option<&ResourceCalendar>,
    ) -> Result<WorkCalendar, CalendarError> {
        let Some(resource) = resource else {
            return self.base_calendar();
        };

        let working_days: Vec<Weekday> = match &resource.working_days {
            Some(days) => days.clone(),
            None => self.working_days.clone(),
        };
        let calendar = WorkCalendar::new(working_days, self.holidays.iter().copied())?;
        Ok(calendar.with_time_off(resource.time_off.iter().copied()))
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            holidays: Vec::new(),
        }
    }
}
