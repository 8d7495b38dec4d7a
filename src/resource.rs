use chrono::{NaiveDate, Weekday};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::calendar::CalendarConfig;
use crate::schedule::{CpmResult, ScheduleError};
use crate::timeline::{date_to_offset, offset_to_date};

/// Per-resource calendar override: an optional workday pattern replacing
/// the project default, plus personal time-off dates layered on top of the
/// project holidays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCalendar {
    pub resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_days: Option<Vec<Weekday>>,
    #[serde(default)]
    pub time_off: Vec<NaiveDate>,
}

impl ResourceCalendar {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            working_days: None,
            time_off: Vec::new(),
        }
    }

    pub fn with_working_days(mut self, days: Vec<Weekday>) -> Self {
        self.working_days = Some(days);
        self
    }

    pub fn with_time_off(mut self, dates: Vec<NaiveDate>) -> Self {
        self.time_off = dates;
        self
    }
}

/// Assignment of one task to one resource. One owning resource per task is
/// the convention; additional assignments are scheduled independently per
/// resource rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub resource_id: String,
    pub task_id: String,
}

impl Assignment {
    pub fn new(resource_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            task_id: task_id.into(),
        }
    }
}

/// One task on a resource's resolved schedule, carrying both working-day
/// offsets and calendar dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task_id: String,
    pub task_name: String,
    pub resource_id: String,
    pub start_offset: i64,
    pub finish_offset: i64,
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    pub duration_days: i64,
    pub is_critical: bool,
    pub done: bool,
}

/// A resource's leveled schedule: its tasks in start order, never
/// overlapping, with the working-day total and the calendar span from first
/// start to last finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceScheduleRow {
    pub resource_id: String,
    pub tasks: Vec<ScheduledTask>,
    pub total_working_days: i64,
    pub calendar_span_days: i64,
}

/// Resolve CPM offsets into per-resource calendar schedules.
///
/// Each resource is leveled independently: its assigned tasks are taken in
/// CPM early-start order (ties by task id) and serialized on a single
/// availability cursor, so CPM offsets act as a lower bound rather than a
/// guarantee. A resource without a calendar entry uses the project default.
/// Rows come back ordered by resource id.
pub fn schedule_resources(
    cpm_results: &[CpmResult],
    assignments: &[Assignment],
    config: &CalendarConfig,
    resource_calendars: &[ResourceCalendar],
) -> Result<Vec<ResourceScheduleRow>, ScheduleError> {
    let by_id: HashMap<&str, &CpmResult> =
        cpm_results.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut by_resource: HashMap<&str, Vec<&CpmResult>> = HashMap::new();
    for assignment in assignments {
        let Some(&result) = by_id.get(assignment.task_id.as_str()) else {
            return Err(ScheduleError::UnknownTask {
                id: assignment.task_id.clone(),
                referenced_by: assignment.resource_id.clone(),
            });
        };
        by_resource
            .entry(assignment.resource_id.as_str())
            .or_default()
            .push(result);
    }

    let mut resources: Vec<&str> = by_resource.keys().copied().collect();
    resources.sort_unstable();

    let rows: Result<Vec<ResourceScheduleRow>, ScheduleError> = resources
        .par_iter()
        .map(|&resource_id| {
            let mut tasks = by_resource[resource_id].clone();
            tasks.sort_by(|a, b| {
                a.early_start
                    .cmp(&b.early_start)
                    .then_with(|| a.id.cmp(&b.id))
            });
            let calendar_entry = resource_calendars
                .iter()
                .find(|rc| rc.resource_id == resource_id);
            if calendar_entry.is_none() {
                debug!(resource_id, "no resource calendar, using project default");
            }
            level_resource(resource_id, &tasks, config, calendar_entry)
        })
        .collect();
    rows
}

fn level_resource(
    resource_id: &str,
    ordered: &[&CpmResult],
    config: &CalendarConfig,
    resource_calendar: Option<&ResourceCalendar>,
) -> Result<ResourceScheduleRow, ScheduleError> {
    let calendar = config.calendar_for(resource_calendar)?;

    let mut tasks = Vec::with_capacity(ordered.len());
    let mut next_available: Option<NaiveDate> = None;
    let mut total_working_days = 0;

    for result in ordered {
        let candidate = offset_to_date(result.early_start, config, resource_calendar)?;
        let lower_bound = match next_available {
            Some(cursor) if cursor > candidate => cursor,
            _ => candidate,
        };
        let start_date = calendar.skip_to_working_day(lower_bound)?;
        let finish_date = calendar.span_end(start_date, result.duration)?;
        next_available = Some(calendar.next_working_day(finish_date)?);

        total_working_days += result.duration;
        tasks.push(ScheduledTask {
            task_id: result.id.clone(),
            task_name: result.name.clone(),
            resource_id: resource_id.to_string(),
            start_offset: date_to_offset(start_date, config)?,
            finish_offset: date_to_offset(finish_date, config)?,
            start_date,
            finish_date,
            duration_days: result.duration,
            is_critical: result.is_critical,
            done: result.done,
        });
    }

    let calendar_span_days = match (tasks.first(), tasks.last()) {
        (Some(first), Some(last)) => (last.finish_date - first.start_date).num_days() + 1,
        _ => 0,
    };

    debug!(
        resource_id,
        task_count = tasks.len(),
        total_working_days,
        calendar_span_days,
        "resource schedule leveled"
    );

    Ok(ResourceScheduleRow {
        resource_id: resource_id.to_string(),
        tasks,
        total_working_days,
        calendar_span_days,
    })
}
