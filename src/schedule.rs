use crate::calculations::backward_pass::BackwardPass;
use crate::calculations::forward_pass::ForwardPass;
use crate::calculations::{DurationPolicy, pert_estimate};
use crate::calendar::{CalendarConfig, CalendarError};
use crate::task::Task;
use crate::task_validation::{self, TaskValidationError};
use crate::timeline::TimelineError;
use chrono::NaiveDate;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

#[derive(Debug)]
pub enum ScheduleError {
    Cycle { task_id: String },
    UnknownTask { id: String, referenced_by: String },
    Calendar(CalendarError),
    Timeline(TimelineError),
    Validation(TaskValidationError),
    Frame(PolarsError),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::Cycle { task_id } => {
                write!(f, "cycle detected in dependency chain at task {task_id}")
            }
            ScheduleError::UnknownTask { id, referenced_by } => {
                write!(f, "unknown task {id} referenced by {referenced_by}")
            }
            ScheduleError::Calendar(err) => write!(f, "{err}"),
            ScheduleError::Timeline(err) => write!(f, "{err}"),
            ScheduleError::Validation(err) => write!(f, "{err}"),
            ScheduleError::Frame(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<CalendarError> for ScheduleError {
    fn from(value: CalendarError) -> Self {
        Self::Calendar(value)
    }
}

impl From<TimelineError> for ScheduleError {
    fn from(value: TimelineError) -> Self {
        Self::Timeline(value)
    }
}

impl From<TaskValidationError> for ScheduleError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PolarsError> for ScheduleError {
    fn from(value: PolarsError) -> Self {
        Self::Frame(value)
    }
}

/// Per-task CPM output. All schedule figures are working-day offsets from
/// the project start; resolving them to calendar dates is the resource
/// scheduler's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpmResult {
    pub id: String,
    pub name: String,
    pub duration: i64,
    pub early_start: i64,
    pub early_finish: i64,
    pub late_start: i64,
    pub late_finish: i64,
    pub total_float: i64,
    pub is_critical: bool,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub task_count: usize,
    pub critical_count: usize,
    pub critical_path: Vec<String>,
    pub project_length_days: i64,
}

impl RefreshSummary {
    pub fn to_log_line(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.task_count));
        parts.push(format!("critical={}", self.critical_count));
        parts.push(format!("length={}", self.project_length_days));
        if !self.critical_path.is_empty() {
            parts.push(format!("crit_path={}", self.critical_path.join("->")));
        }
        parts.join(", ")
    }
}

/// The task table for one scheduling run, plus the calendar configuration
/// and the duration policy. Tasks and their computed CPM columns live in a
/// single DataFrame; `Task` records convert to and from rows.
pub struct Schedule {
    df: DataFrame,
    config: CalendarConfig,
    duration_policy: DurationPolicy,
}

impl Schedule {
    pub fn new() -> Self {
        Self::new_with_config(CalendarConfig::default())
    }

    pub fn new_with_config(config: CalendarConfig) -> Self {
        let schema = Self::default_schema();
        Self {
            df: DataFrame::empty_with_schema(&schema),
            config,
            duration_policy: pert_estimate,
        }
    }

    /// Swap the three-point weighting used to derive expected durations.
    /// Takes effect on the next refresh.
    pub fn set_duration_policy(&mut self, policy: DurationPolicy) {
        self.duration_policy = policy;
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    fn default_schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("id".into(), DataType::String),
            Field::new("name".into(), DataType::String),
            Field::new("low".into(), DataType::Float64),
            Field::new("likely".into(), DataType::Float64),
            Field::new("high".into(), DataType::Float64),
            Field::new("done".into(), DataType::Boolean),
            Field::new("done_date".into(), DataType::Date),
            Field::new(
                "predecessors".into(),
                DataType::List(Box::new(DataType::String)),
            ),
            Field::new("duration_days".into(), DataType::Int64),
            Field::new("early_start".into(), DataType::Int64),
            Field::new("early_finish".into(), DataType::Int64),
            Field::new("late_start".into(), DataType::Int64),
            Field::new("late_finish".into(), DataType::Int64),
            Field::new("total_float".into(), DataType::Int64),
            Field::new("is_critical".into(), DataType::Boolean),
        ])
    }

    pub fn tasks(&self) -> Result<Vec<Task>, ScheduleError> {
        let df = self.dataframe();
        let mut tasks = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            tasks.push(Task::from_dataframe_row(df, idx)?);
        }
        Ok(tasks)
    }

    pub fn find_task(&self, task_id: &str) -> Result<Option<Task>, ScheduleError> {
        if self.df.height() == 0 {
            return Ok(None);
        }
        let ids = self.df.column("id")?.str()?;
        for (idx, id_opt) in ids.into_iter().enumerate() {
            if id_opt == Some(task_id) {
                return Ok(Some(Task::from_dataframe_row(self.dataframe(), idx)?));
            }
        }
        Ok(None)
    }

    pub fn upsert_task(&mut self, task: Task) -> Result<(), ScheduleError> {
        task_validation::validate_task(&task)?;

        let id_exists = if self.df.height() == 0 {
            false
        } else {
            self.df
                .column("id")?
                .str()?
                .into_iter()
                .any(|v| v == Some(task.id.as_str()))
        };

        if id_exists {
            self.update_string_column("name", &task.id, &task.name)?;
            self.update_f64_column("low", &task.id, task.low)?;
            self.update_f64_column("likely", &task.id, task.likely)?;
            self.update_f64_column("high", &task.id, task.high)?;
            self.update_bool_column("done", &task.id, task.done)?;
            self.update_list_str_column("predecessors", &task.id, task.predecessors.clone())?;
            if let Some(date) = task.done_date {
                self.update_date_column("done_date", &task.id, date)?;
            }
            return Ok(());
        }

        let new_row = task.to_dataframe_row()?;
        self.df = self.df.vstack(&new_row)?;
        Ok(())
    }

    /// Remove a task and strip it from every remaining predecessor list,
    /// then recompute the schedule.
    pub fn delete_task(&mut self, task_id: &str) -> Result<bool, ScheduleError> {
        if self.df.height() == 0 {
            return Ok(false);
        }
        let snapshot = self.df.clone();
        let mut tasks: Vec<Task> = Vec::with_capacity(snapshot.height());
        let mut found = false;
        for idx in 0..snapshot.height() {
            let mut task = Task::from_dataframe_row(&snapshot, idx)?;
            if task.id == task_id {
                found = true;
                continue;
            }
            task.predecessors.retain(|pred| pred != task_id);
            tasks.push(task);
        }
        if !found {
            return Ok(false);
        }

        self.df = DataFrame::empty_with_schema(&Self::default_schema());
        for task in tasks {
            self.upsert_task(task)?;
        }
        self.refresh()?;
        Ok(true)
    }

    fn update_string_column(
        &mut self,
        column_name: &str,
        task_id: &str,
        new_value: &str,
    ) -> Result<(), ScheduleError> {
        let id_col = self.df.column("id")?;
        let target_col = self.df.column(column_name)?;

        let new_series = target_col
            .str()?
            .into_iter()
            .zip(id_col.str()?.into_iter())
            .map(|(val, id)| if id == Some(task_id) { Some(new_value) } else { val })
            .collect::<StringChunked>()
            .into_series()
            .with_name(column_name.into());

        self.df.replace(column_name, new_series)?;
        Ok(())
    }

    fn update_f64_column(
        &mut self,
        column_name: &str,
        task_id: &str,
        new_value: f64,
    ) -> Result<(), ScheduleError> {
        let id_col = self.df.column("id")?;
        let target_col = self.df.column(column_name)?;

        let new_series = target_col
            .f64()?
            .into_iter()
            .zip(id_col.str()?.into_iter())
            .map(|(val, id)| if id == Some(task_id) { Some(new_value) } else { val })
            .collect::<Float64Chunked>()
            .into_series()
            .with_name(column_name.into());

        self.df.replace(column_name, new_series)?;
        Ok(())
    }

    fn update_bool_column(
        &mut self,
        column_name: &str,
        task_id: &str,
        new_value: bool,
    ) -> Result<(), ScheduleError> {
        let id_col = self.df.column("id")?;
        let target_col = self.df.column(column_name)?;

        let new_series = target_col
            .bool()?
            .into_iter()
            .zip(id_col.str()?.into_iter())
            .map(|(val, id)| if id == Some(task_id) { Some(new_value) } else { val })
            .collect::<BooleanChunked>()
            .into_series()
            .with_name(column_name.into());

        self.df.replace(column_name, new_series)?;
        Ok(())
    }

    fn update_list_str_column(
        &mut self,
        column_name: &str,
        task_id: &str,
        new_values: Vec<String>,
    ) -> Result<(), ScheduleError> {
        let id_col = self.df.column("id")?;
        let target_col = self.df.column(column_name)?;

        let replacement = Series::new(PlSmallStr::from_static(""), new_values);
        let new_series = target_col
            .list()?
            .into_iter()
            .zip(id_col.str()?.into_iter())
            .map(|(val, id)| {
                if id == Some(task_id) {
                    Some(replacement.clone())
                } else {
                    val
                }
            })
            .collect::<ListChunked>()
            .into_series()
            .with_name(column_name.into());

        self.df.replace(column_name, new_series)?;
        Ok(())
    }

    fn update_date_column(
        &mut self,
        column_name: &str,
        task_id: &str,
        new_date: NaiveDate,
    ) -> Result<(), ScheduleError> {
        self.df = self
            .df
            .clone()
            .lazy()
            .with_column(
                when(col("id").eq(lit(task_id.to_string())))
                    .then(lit(new_date).cast(DataType::Date))
                    .otherwise(col(column_name).cast(DataType::Date))
                    .alias(column_name),
            )
            .collect()?;
        Ok(())
    }

    /// Derive the expected-duration column from the three-point estimates
    /// under the current policy.
    fn set_durations(&mut self) -> Result<(), ScheduleError> {
        let height = self.df.height();
        let low_ca = self.df.column("low")?.f64()?;
        let likely_ca = self.df.column("likely")?.f64()?;
        let high_ca = self.df.column("high")?.f64()?;

        let mut values: Vec<i64> = Vec::with_capacity(height);
        for idx in 0..height {
            let low = low_ca.get(idx).unwrap_or(0.0);
            let likely = likely_ca.get(idx).unwrap_or(0.0);
            let high = high_ca.get(idx).unwrap_or(0.0);
            values.push((self.duration_policy)(low, likely, high));
        }
        let series = Series::new(PlSmallStr::from_static("duration_days"), values);
        self.df.replace("duration_days", series)?;
        Ok(())
    }

    pub fn forward_pass(&mut self) -> Result<(), ScheduleError> {
        if self.df.height() == 0 {
            return Ok(());
        }
        let results = ForwardPass::new(&self.df, &self.config).execute()?;

        let ids_ca = self.df.column("id")?.str()?;
        let height = self.df.height();
        let mut start_vals: Vec<Option<i64>> = vec![None; height];
        let mut finish_vals: Vec<Option<i64>> = vec![None; height];
        for (idx, id_opt) in ids_ca.into_iter().enumerate() {
            if let Some(task_id) = id_opt {
                if let Some(&(es, ef)) = results.get(task_id) {
                    start_vals[idx] = Some(es);
                    finish_vals[idx] = Some(ef);
                }
            }
        }

        let start_series = Series::new(PlSmallStr::from_static("early_start"), start_vals);
        let finish_series = Series::new(PlSmallStr::from_static("early_finish"), finish_vals);
        self.df.replace("early_start", start_series)?;
        self.df.replace("early_finish", finish_series)?;
        Ok(())
    }

    pub fn backward_pass(&mut self) -> Result<(), ScheduleError> {
        if self.df.height() == 0 {
            return Ok(());
        }
        let project_finish = self.project_finish()?;
        let results = BackwardPass::new(&self.df).execute(project_finish)?;

        let ids_ca = self.df.column("id")?.str()?;
        let height = self.df.height();
        let mut ls_vals: Vec<Option<i64>> = vec![None; height];
        let mut lf_vals: Vec<Option<i64>> = vec![None; height];
        for (idx, id_opt) in ids_ca.into_iter().enumerate() {
            if let Some(task_id) = id_opt {
                if let Some(&(ls, lf)) = results.get(task_id) {
                    ls_vals[idx] = Some(ls);
                    lf_vals[idx] = Some(lf);
                }
            }
        }

        let ls_series = Series::new(PlSmallStr::from_static("late_start"), ls_vals);
        let lf_series = Series::new(PlSmallStr::from_static("late_finish"), lf_vals);
        self.df.replace("late_start", ls_series)?;
        self.df.replace("late_finish", lf_series)?;

        // total_float = late_start - early_start; zero float marks the
        // critical path.
        let es_ca = self.df.column("early_start")?.i64()?;
        let ls_ca = self.df.column("late_start")?.i64()?;
        let mut tf_vals: Vec<i64> = Vec::with_capacity(height);
        let mut crit_vals: Vec<bool> = Vec::with_capacity(height);
        for idx in 0..height {
            let es = es_ca.get(idx).unwrap_or(0);
            let ls = ls_ca.get(idx).unwrap_or(0);
            let tf = ls - es;
            tf_vals.push(tf);
            crit_vals.push(tf == 0);
        }
        let tf_series = Series::new(PlSmallStr::from_static("total_float"), tf_vals);
        let crit_series = Series::new(PlSmallStr::from_static("is_critical"), crit_vals);
        self.df.replace("total_float", tf_series)?;
        self.df.replace("is_critical", crit_series)?;
        Ok(())
    }

    /// Overall earliest finish across all tasks, in working-day offsets.
    fn project_finish(&self) -> Result<i64, ScheduleError> {
        if self.df.height() == 0 {
            return Ok(0);
        }
        let ef_ca = self.df.column("early_finish")?.i64()?;
        let mut finish = 0;
        for idx in 0..ef_ca.len() {
            if let Some(ef) = ef_ca.get(idx) {
                if ef > finish {
                    finish = ef;
                }
            }
        }
        Ok(finish)
    }

    /// Recompute the whole schedule: expected durations, both CPM passes,
    /// float and criticality.
    pub fn refresh(&mut self) -> Result<RefreshSummary, ScheduleError> {
        self.set_durations()?;
        self.forward_pass()?;
        self.backward_pass()?;

        let task_count = self.df.height();
        let ids_ca = self.df.column("id")?.str()?;
        let es_ca = self.df.column("early_start")?.i64()?;
        let tf_ca = self.df.column("total_float")?.i64()?;

        let mut critical_count = 0usize;
        let mut critical_path: Vec<(i64, String)> = Vec::new();
        for (idx, id_opt) in ids_ca.into_iter().enumerate() {
            let Some(id) = id_opt else { continue };
            if tf_ca.get(idx) == Some(0) {
                critical_count += 1;
                critical_path.push((es_ca.get(idx).unwrap_or(0), id.to_string()));
            }
        }
        critical_path.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let summary = RefreshSummary {
            task_count,
            critical_count,
            critical_path: critical_path.into_iter().map(|(_, id)| id).collect(),
            project_length_days: self.project_finish()?,
        };
        debug!(summary = %summary.to_log_line(), "schedule refreshed");
        Ok(summary)
    }

    /// The computed schedule as plain records, in task insertion order.
    pub fn cpm_results(&self) -> Result<Vec<CpmResult>, ScheduleError> {
        let mut results = Vec::with_capacity(self.df.height());
        for task in self.tasks()? {
            results.push(CpmResult {
                duration: task.duration_days.unwrap_or(0),
                early_start: task.early_start.unwrap_or(0),
                early_finish: task.early_finish.unwrap_or(0),
                late_start: task.late_start.unwrap_or(0),
                late_finish: task.late_finish.unwrap_or(0),
                total_float: task.total_float.unwrap_or(0),
                is_critical: task.is_critical.unwrap_or(false),
                id: task.id,
                name: task.name,
                done: task.done,
                done_date: task.done_date,
            });
        }
        Ok(results)
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the CPM engine over an already-validated task set and edge list.
/// Fails on cyclic edge sets and on edges referencing unknown task ids; the
/// calendar configuration is needed to pin completed tasks to their actual
/// finish dates.
pub fn run_cpm(
    tasks: &[Task],
    edges: &[(String, String)],
    config: &CalendarConfig,
) -> Result<Vec<CpmResult>, ScheduleError> {
    task_validation::validate_task_collection(tasks)?;

    let known: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    for (pred, succ) in edges {
        if !known.contains(pred.as_str()) {
            return Err(ScheduleError::UnknownTask {
                id: pred.clone(),
                referenced_by: succ.clone(),
            });
        }
        if !known.contains(succ.as_str()) {
            return Err(ScheduleError::UnknownTask {
                id: succ.clone(),
                referenced_by: pred.clone(),
            });
        }
    }

    let mut predecessors: HashMap<&str, Vec<String>> = HashMap::new();
    for task in tasks {
        predecessors.insert(task.id.as_str(), task.predecessors.clone());
    }
    for (pred, succ) in edges {
        let preds = predecessors.entry(succ.as_str()).or_default();
        if !preds.iter().any(|p| p == pred) {
            preds.push(pred.clone());
        }
    }

    let mut schedule = Schedule::new_with_config(config.clone());
    for task in tasks {
        let mut task = task.clone();
        task.predecessors = predecessors
            .get(task.id.as_str())
            .cloned()
            .unwrap_or_default();
        schedule.upsert_task(task)?;
    }
    schedule.refresh()?;
    schedule.cpm_results()
}
