use chrono::{NaiveDate, Weekday};
use taskplan::calendar::CalendarConfig;
use taskplan::graph::DependencyEdge;
use taskplan::persistence::{
    PersistenceError, PlanSnapshot, load_plan_from_csv, load_plan_from_json, save_plan_to_csv,
    save_plan_to_json,
};
use taskplan::resource::{Assignment, ResourceCalendar};
use taskplan::schedule::Schedule;
use taskplan::task::Task;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn config() -> CalendarConfig {
    CalendarConfig::new(
        d(2026, 1, 5),
        vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ],
        [d(2026, 1, 19)],
    )
    .unwrap()
}

fn sample_plan() -> PlanSnapshot {
    let mut schedule = Schedule::new_with_config(config());
    schedule
        .upsert_task(Task::new("design", "Design", 2.0, 3.0, 5.0))
        .unwrap();
    schedule
        .upsert_task(
            Task::new("build", "Build", 3.0, 5.0, 8.0)
                .with_predecessors(vec!["design".to_string()]),
        )
        .unwrap();
    schedule
        .upsert_task(
            Task::new("kickoff", "Kickoff", 1.0, 1.0, 1.0).completed(Some(d(2026, 1, 5))),
        )
        .unwrap();
    schedule.refresh().unwrap();

    PlanSnapshot::from_schedule(
        &schedule,
        vec![DependencyEdge {
            pred: "design".to_string(),
            succ: "build".to_string(),
        }],
        vec![
            Assignment::new("ana", "design"),
            Assignment::new("ben", "build"),
        ],
        vec![ResourceCalendar::new("ana").with_time_off(vec![d(2026, 1, 6)])],
    )
    .unwrap()
}

#[test]
fn json_round_trip_preserves_the_plan() {
    let plan = sample_plan();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");

    save_plan_to_json(&plan, &path).unwrap();
    let loaded = load_plan_from_json(&path).unwrap();

    assert_eq!(loaded.config, plan.config);
    assert_eq!(loaded.tasks, plan.tasks);
    assert_eq!(loaded.dependencies, plan.dependencies);
    assert_eq!(loaded.assignments, plan.assignments);
    assert_eq!(loaded.resource_calendars, plan.resource_calendars);
}

#[test]
fn csv_round_trip_preserves_the_plan() {
    let plan = sample_plan();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.csv");

    save_plan_to_csv(&plan, &path).unwrap();
    let loaded = load_plan_from_csv(&path).unwrap();

    assert_eq!(loaded.config, plan.config);
    assert_eq!(loaded.tasks, plan.tasks);
    assert_eq!(loaded.dependencies, plan.dependencies);
    assert_eq!(loaded.assignments, plan.assignments);
    assert_eq!(loaded.resource_calendars, plan.resource_calendars);
}

#[test]
fn loaded_snapshot_rebuilds_a_working_schedule() {
    let plan = sample_plan();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    save_plan_to_json(&plan, &path).unwrap();

    let mut schedule = load_plan_from_json(&path).unwrap().to_schedule().unwrap();
    let summary = schedule.refresh().unwrap();
    assert_eq!(summary.task_count, 3);
    assert_eq!(summary.project_length_days, 8);
}

#[test]
fn duplicate_ids_fail_validation_on_save() {
    let mut plan = sample_plan();
    plan.tasks.push(Task::new("design", "Again", 1.0, 1.0, 1.0));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    let err = save_plan_to_json(&plan, &path).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn csv_without_metadata_row_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.csv");
    std::fs::write(
        &path,
        "id,name,low,likely,high,done,done_date,predecessors,duration_days,early_start,early_finish,late_start,late_finish,total_float,is_critical,config_json,dependencies_json,assignments_json,resource_calendars_json\n\
         a,A,1,1,1,false,,,,,,,,,,,,,\n",
    )
    .unwrap();
    let err = load_plan_from_csv(&path).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use taskplan::persistence::PlanStore;
    use taskplan::persistence::sqlite::SqlitePlanStore;

    #[test]
    fn sqlite_round_trip_preserves_the_plan() {
        let plan = sample_plan();
        let dir = tempfile::tempdir().unwrap();
        let store = SqlitePlanStore::new(dir.path().join("plan.db")).unwrap();

        store.save_plan(&plan).unwrap();
        let loaded = store.load_plan().unwrap().expect("plan stored");

        assert_eq!(loaded.config, plan.config);
        assert_eq!(loaded.dependencies, plan.dependencies);
        assert_eq!(loaded.assignments, plan.assignments);
        assert_eq!(loaded.resource_calendars, plan.resource_calendars);
        // Tasks come back ordered by id.
        let mut expected = plan.tasks.clone();
        expected.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(loaded.tasks, expected);
    }

    #[test]
    fn empty_store_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqlitePlanStore::new(dir.path().join("plan.db")).unwrap();
        assert!(store.load_plan().unwrap().is_none());
    }
}
