use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::{CalendarConfig, CalendarError};
use crate::resource::ResourceCalendar;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    NegativeOffset { offset: i64 },
    BeforeProjectStart { date: NaiveDate, start: NaiveDate },
    Calendar(CalendarError),
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineError::NegativeOffset { offset } => {
                write!(f, "working-day offset {offset} is negative")
            }
            TimelineError::BeforeProjectStart { date, start } => {
                write!(f, "date {date} precedes project start {start}")
            }
            TimelineError::Calendar(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TimelineError {}

impl From<CalendarError> for TimelineError {
    fn from(value: CalendarError) -> Self {
        Self::Calendar(value)
    }
}

/// Classification of one calendar day on the rendered axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    Working,
    Weekend,
    Holiday,
}

/// One calendar day of the display axis. `offset` is the working-day index
/// for working days and `None` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateAxisEntry {
    pub date: NaiveDate,
    pub kind: DayKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

/// Resolve an abstract working-day offset to a calendar date. A resource
/// calendar, when supplied, substitutes its workday override and filters its
/// time-off dates; otherwise the project default applies.
pub fn offset_to_date(
    offset: i64,
    config: &CalendarConfig,
    resource: Option<&ResourceCalendar>,
) -> Result<NaiveDate, TimelineError> {
    if offset < 0 {
        return Err(TimelineError::NegativeOffset { offset });
    }
    let calendar = config.calendar_for(resource)?;
    Ok(calendar.add_working_days(config.start_date(), offset)?)
}

/// Zero-based working-day index of `date` relative to the project start,
/// always measured on the project-default calendar. Dates before the start
/// are a caller error.
pub fn date_to_offset(date: NaiveDate, config: &CalendarConfig) -> Result<i64, TimelineError> {
    if date < config.start_date() {
        return Err(TimelineError::BeforeProjectStart {
            date,
            start: config.start_date(),
        });
    }
    let calendar = config.base_calendar()?;
    Ok(calendar.working_days_between(config.start_date(), date) - 1)
}

/// Materialize one axis entry per calendar day from the project start
/// through `end_date` inclusive. Holiday classification wins over weekend
/// when a holiday falls on a non-workday. Rendering data only; performs no
/// scheduling.
pub fn build_date_axis(
    config: &CalendarConfig,
    end_date: NaiveDate,
) -> Result<Vec<DateAxisEntry>, TimelineError> {
    let calendar = config.base_calendar()?;
    let holidays = config.holidays();

    let mut axis = Vec::new();
    let mut offset: i64 = 0;
    let mut current = config.start_date();
    while current <= end_date {
        let entry = if calendar.is_working_day(current) {
            let entry = DateAxisEntry {
                date: current,
                kind: DayKind::Working,
                offset: Some(offset),
            };
            offset += 1;
            entry
        } else {
            let kind = if holidays.binary_search(&current).is_ok() {
                DayKind::Holiday
            } else {
                DayKind::Weekend
            };
            DateAxisEntry {
                date: current,
                kind,
                offset: None,
            }
        };
        axis.push(entry);
        current = current + Duration::days(1);
    }
    Ok(axis)
}
