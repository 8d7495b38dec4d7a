use super::{PersistenceError, PersistenceResult, PlanSnapshot};
use crate::calendar::CalendarConfig;
use crate::graph::DependencyEdge;
use crate::resource::{Assignment, ResourceCalendar};
use crate::task::Task;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

pub fn save_plan_to_json<P: AsRef<Path>>(plan: &PlanSnapshot, path: P) -> PersistenceResult<()> {
    super::validate_tasks(&plan.tasks)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, plan)?;
    Ok(())
}

pub fn load_plan_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<PlanSnapshot> {
    let file = File::open(path)?;
    let plan: PlanSnapshot = serde_json::from_reader(file)?;
    super::validate_tasks(&plan.tasks)?;
    Ok(plan)
}

/// One CSV row. Task rows carry the task columns; a single metadata row
/// (empty id) carries the config and resource layer as embedded JSON.
#[derive(Default, Serialize, Deserialize)]
struct PlanCsvRecord {
    id: String,
    name: String,
    low: String,
    likely: String,
    high: String,
    done: String,
    done_date: String,
    predecessors: String,
    duration_days: String,
    early_start: String,
    early_finish: String,
    late_start: String,
    late_finish: String,
    total_float: String,
    is_critical: String,
    #[serde(default)]
    config_json: String,
    #[serde(default)]
    dependencies_json: String,
    #[serde(default)]
    assignments_json: String,
    #[serde(default)]
    resource_calendars_json: String,
}

impl From<&Task> for PlanCsvRecord {
    fn from(task: &Task) -> Self {
        let mut record = PlanCsvRecord::default();
        record.id = task.id.clone();
        record.name = task.name.clone();
        record.low = task.low.to_string();
        record.likely = task.likely.to_string();
        record.high = task.high.to_string();
        record.done = task.done.to_string();
        record.done_date = format_date(task.done_date);
        record.predecessors = task.predecessors.join(";");
        record.duration_days = format_option_i64(task.duration_days);
        record.early_start = format_option_i64(task.early_start);
        record.early_finish = format_option_i64(task.early_finish);
        record.late_start = format_option_i64(task.late_start);
        record.late_finish = format_option_i64(task.late_finish);
        record.total_float = format_option_i64(task.total_float);
        record.is_critical = format_option_bool(task.is_critical);
        record
    }
}

impl PlanCsvRecord {
    fn metadata_row(plan: &PlanSnapshot) -> PersistenceResult<Self> {
        let mut record = PlanCsvRecord::default();
        record.config_json = serde_json::to_string(&plan.config)?;
        record.dependencies_json = serde_json::to_string(&plan.dependencies)?;
        record.assignments_json = serde_json::to_string(&plan.assignments)?;
        record.resource_calendars_json = serde_json::to_string(&plan.resource_calendars)?;
        Ok(record)
    }

    fn is_metadata_row(&self) -> bool {
        !self.config_json.trim().is_empty()
    }

    fn into_task(self) -> PersistenceResult<Task> {
        if self.is_metadata_row() {
            return Err(PersistenceError::InvalidData(
                "metadata row cannot be converted to task".into(),
            ));
        }
        let mut task = Task::new(
            self.id,
            self.name,
            parse_f64_field(&self.low)?,
            parse_f64_field(&self.likely)?,
            parse_f64_field(&self.high)?,
        );
        task.done = parse_bool(&self.done)?.unwrap_or(false);
        task.done_date = parse_date(&self.done_date)?;
        task.predecessors = split_strings(&self.predecessors);
        task.duration_days = parse_i64(&self.duration_days)?;
        task.early_start = parse_i64(&self.early_start)?;
        task.early_finish = parse_i64(&self.early_finish)?;
        task.late_start = parse_i64(&self.late_start)?;
        task.late_finish = parse_i64(&self.late_finish)?;
        task.total_float = parse_i64(&self.total_float)?;
        task.is_critical = parse_bool(&self.is_critical)?;
        Ok(task)
    }
}

pub fn save_plan_to_csv<P: AsRef<Path>>(plan: &PlanSnapshot, path: P) -> PersistenceResult<()> {
    super::validate_tasks(&plan.tasks)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(PlanCsvRecord::metadata_row(plan)?)?;
    for task in &plan.tasks {
        writer.serialize(PlanCsvRecord::from(task))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_plan_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<PlanSnapshot> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut tasks = Vec::new();
    let mut config: Option<CalendarConfig> = None;
    let mut dependencies: Vec<DependencyEdge> = Vec::new();
    let mut assignments: Vec<Assignment> = Vec::new();
    let mut resource_calendars: Vec<ResourceCalendar> = Vec::new();

    for record in reader.deserialize::<PlanCsvRecord>() {
        let record = record?;
        if record.is_metadata_row() {
            if config.is_some() {
                return Err(PersistenceError::InvalidData(
                    "CSV file contained multiple metadata rows".into(),
                ));
            }
            config = Some(serde_json::from_str(&record.config_json).map_err(|err| {
                PersistenceError::InvalidData(format!("invalid config json: {err}"))
            })?);
            if !record.dependencies_json.trim().is_empty() {
                dependencies =
                    serde_json::from_str(&record.dependencies_json).map_err(|err| {
                        PersistenceError::InvalidData(format!("invalid dependencies json: {err}"))
                    })?;
            }
            if !record.assignments_json.trim().is_empty() {
                assignments = serde_json::from_str(&record.assignments_json).map_err(|err| {
                    PersistenceError::InvalidData(format!("invalid assignments json: {err}"))
                })?;
            }
            if !record.resource_calendars_json.trim().is_empty() {
                resource_calendars = serde_json::from_str(&record.resource_calendars_json)
                    .map_err(|err| {
                        PersistenceError::InvalidData(format!(
                            "invalid resource calendars json: {err}"
                        ))
                    })?;
            }
            continue;
        }
        tasks.push(record.into_task()?);
    }

    let Some(config) = config else {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no metadata row".into(),
        ));
    };

    super::validate_tasks(&tasks)?;

    Ok(PlanSnapshot {
        config,
        tasks,
        dependencies,
        assignments,
        resource_calendars,
    })
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(input: &str) -> PersistenceResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_f64_field(input: &str) -> PersistenceResult<f64> {
    input
        .trim()
        .parse::<f64>()
        .map_err(|e| PersistenceError::InvalidData(format!("invalid float '{input}': {e}")))
}

fn format_option_i64(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_i64(input: &str) -> PersistenceResult<Option<i64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid integer '{input}': {e}")))
}

fn format_option_bool(value: Option<bool>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_bool(input: &str) -> PersistenceResult<Option<bool>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    match input.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid boolean '{other}'"
        ))),
    }
}

fn split_strings(input: &str) -> Vec<String> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    input.split(';').map(|s| s.trim().to_string()).collect()
}
