pub mod calculations;
pub mod calendar;
pub mod graph;
pub mod persistence;
pub mod resource;
pub mod schedule;
pub mod task;
pub mod task_validation;
pub mod timeline;

pub use calculations::{DurationPolicy, pert_estimate};
pub use calendar::{CalendarConfig, CalendarError, WorkCalendar, parse_weekday_token, weekday_token};
pub use graph::{DependencyEdge, DependencyValidator, EdgeCheck, EdgeKind};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqlitePlanStore;
pub use persistence::{
    PersistenceError, PlanSnapshot, PlanStore, load_plan_from_csv, load_plan_from_json,
    save_plan_to_csv, save_plan_to_json, validate_tasks,
};
pub use resource::{
    Assignment, ResourceCalendar, ResourceScheduleRow, ScheduledTask, schedule_resources,
};
pub use schedule::{CpmResult, RefreshSummary, Schedule, ScheduleError, run_cpm};
pub use task::Task;
pub use task_validation::TaskValidationError;
pub use timeline::{
    DateAxisEntry, DayKind, TimelineError, build_date_axis, date_to_offset, offset_to_date,
};
