use crate::calendar::CalendarConfig;
use crate::graph::DependencyEdge;
use crate::resource::{Assignment, ResourceCalendar};
use crate::schedule::{Schedule, ScheduleError};
use crate::task::Task;
use crate::task_validation;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    Schedule(ScheduleError),
    Io(io::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    Csv(csv::Error),
    InvalidData(String),
    NotFound,
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::Schedule(err) => write!(f, "schedule error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            #[cfg(feature = "sqlite")]
            PersistenceError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            PersistenceError::NotFound => write!(f, "no plan stored"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<ScheduleError> for PersistenceError {
    fn from(value: ScheduleError) -> Self {
        Self::Schedule(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// A full plan document: calendar configuration, the task set with its
/// declared dependencies, and the resource layer. This is the unit the
/// stores save and load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub config: CalendarConfig,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub resource_calendars: Vec<ResourceCalendar>,
}

impl PlanSnapshot {
    pub fn from_schedule(
        schedule: &Schedule,
        dependencies: Vec<DependencyEdge>,
        assignments: Vec<Assignment>,
        resource_calendars: Vec<ResourceCalendar>,
    ) -> PersistenceResult<Self> {
        let tasks = schedule.tasks()?;
        validate_tasks(&tasks)?;
        Ok(Self {
            config: schedule.config().clone(),
            tasks,
            dependencies,
            assignments,
            resource_calendars,
        })
    }

    /// Rebuild a schedule container from the snapshot's config and tasks.
    pub fn to_schedule(&self) -> PersistenceResult<Schedule> {
        validate_tasks(&self.tasks)?;
        let mut schedule = Schedule::new_with_config(self.config.clone());
        for task in &self.tasks {
            schedule.upsert_task(task.clone())?;
        }
        Ok(schedule)
    }
}

pub trait PlanStore {
    fn save_plan(&self, plan: &PlanSnapshot) -> PersistenceResult<()>;
    fn load_plan(&self) -> PersistenceResult<Option<PlanSnapshot>>;
}

pub fn validate_tasks(tasks: &[Task]) -> PersistenceResult<()> {
    task_validation::validate_task_collection(tasks)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{load_plan_from_csv, load_plan_from_json, save_plan_to_csv, save_plan_to_json};
