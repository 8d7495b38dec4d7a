use chrono::{NaiveDate, Weekday};
use taskplan::calendar::CalendarConfig;
use taskplan::resource::{Assignment, ResourceCalendar, schedule_resources};
use taskplan::schedule::{ScheduleError, run_cpm};
use taskplan::task::Task;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// Monday 2026-01-05 start, Mon-Fri weeks, no holidays.
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
        [],
    )
    .unwrap()
}

fn assign(resource: &str, task: &str) -> Assignment {
    Assignment::new(resource, task)
}

#[test]
fn one_resource_serializes_parallel_tasks() {
    // A and B have no dependency, so CPM puts both at offset 0; a single
    // owner still has to work them one after the other.
    let tasks = vec![
        Task::new("A", "Outline", 2.0, 2.0, 2.0),
        Task::new("B", "Proto", 3.0, 3.0, 3.0),
    ];
    let cpm = run_cpm(&tasks, &[], &config()).unwrap();
    let rows = schedule_resources(
        &cpm,
        &[assign("dev", "A"), assign("dev", "B")],
        &config(),
        &[],
    )
    .unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.resource_id, "dev");
    assert_eq!(row.tasks.len(), 2);

    let a = &row.tasks[0];
    assert_eq!(a.task_id, "A");
    assert_eq!(a.start_date, d(2026, 1, 5));
    assert_eq!(a.finish_date, d(2026, 1, 6));
    assert_eq!(a.start_offset, 0);
    assert_eq!(a.finish_offset, 1);

    let b = &row.tasks[1];
    assert_eq!(b.task_id, "B");
    assert_eq!(b.start_date, d(2026, 1, 7));
    assert_eq!(b.finish_date, d(2026, 1, 9));
    assert_eq!(b.start_offset, 2);
    assert_eq!(b.finish_offset, 4);

    assert_eq!(row.total_working_days, 5);
    assert_eq!(row.calendar_span_days, 5);
}

#[test]
fn rows_never_overlap_and_stay_start_ordered() {
    let tasks = vec![
        Task::new("A", "A", 2.0, 2.0, 2.0),
        Task::new("B", "B", 1.0, 1.0, 1.0),
        Task::new("C", "C", 3.0, 3.0, 3.0),
        Task::new("D", "D", 2.0, 2.0, 2.0),
    ];
    let cpm = run_cpm(&tasks, &[("A".to_string(), "C".to_string())], &config()).unwrap();
    let rows = schedule_resources(
        &cpm,
        &[
            assign("dev", "C"),
            assign("dev", "A"),
            assign("dev", "D"),
            assign("dev", "B"),
        ],
        &config(),
        &[],
    )
    .unwrap();

    let row = &rows[0];
    assert_eq!(row.tasks.len(), 4);
    for pair in row.tasks.windows(2) {
        assert!(pair[1].start_date > pair[0].finish_date);
        assert!(pair[1].start_date >= pair[0].start_date);
    }
}

#[test]
fn ties_break_on_task_id_for_determinism() {
    let tasks = vec![
        Task::new("beta", "B", 1.0, 1.0, 1.0),
        Task::new("alpha", "A", 1.0, 1.0, 1.0),
    ];
    let cpm = run_cpm(&tasks, &[], &config()).unwrap();
    let rows = schedule_resources(
        &cpm,
        &[assign("dev", "beta"), assign("dev", "alpha")],
        &config(),
        &[],
    )
    .unwrap();
    let ids: Vec<&str> = rows[0].tasks.iter().map(|t| t.task_id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "beta"]);
}

#[test]
fn personal_time_off_stretches_a_task() {
    let tasks = vec![Task::new("A", "A", 3.0, 3.0, 3.0)];
    let cpm = run_cpm(&tasks, &[], &config()).unwrap();
    let resource_calendars =
        vec![ResourceCalendar::new("ana").with_time_off(vec![d(2026, 1, 6)])];
    let rows = schedule_resources(
        &cpm,
        &[assign("ana", "A")],
        &config(),
        &resource_calendars,
    )
    .unwrap();

    let task = &rows[0].tasks[0];
    assert_eq!(task.start_date, d(2026, 1, 5));
    // Tuesday off: the three working days are Mon, Wed, Thu.
    assert_eq!(task.finish_date, d(2026, 1, 8));
}

#[test]
fn resource_workday_override_replaces_project_default() {
    let tasks = vec![Task::new("A", "A", 6.0, 6.0, 6.0)];
    let cpm = run_cpm(&tasks, &[], &config()).unwrap();
    let resource_calendars = vec![ResourceCalendar::new("sat-crew").with_working_days(vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ])];
    let rows = schedule_resources(
        &cpm,
        &[assign("sat-crew", "A")],
        &config(),
        &resource_calendars,
    )
    .unwrap();

    // Six working days including Saturday: Mon 5th through Sat 10th.
    let task = &rows[0].tasks[0];
    assert_eq!(task.start_date, d(2026, 1, 5));
    assert_eq!(task.finish_date, d(2026, 1, 10));
}

#[test]
fn unknown_resource_falls_back_to_project_calendar() {
    let tasks = vec![Task::new("A", "A", 2.0, 2.0, 2.0)];
    let cpm = run_cpm(&tasks, &[], &config()).unwrap();
    // "ghost" has no calendar entry; the run succeeds on the default.
    let rows =
        schedule_resources(&cpm, &[assign("ghost", "A")], &config(), &[]).unwrap();
    assert_eq!(rows[0].tasks[0].finish_date, d(2026, 1, 6));
}

#[test]
fn unknown_task_in_assignment_is_rejected() {
    let tasks = vec![Task::new("A", "A", 1.0, 1.0, 1.0)];
    let cpm = run_cpm(&tasks, &[], &config()).unwrap();
    let err =
        schedule_resources(&cpm, &[assign("dev", "ghost")], &config(), &[]).unwrap_err();
    assert!(matches!(err, ScheduleError::UnknownTask { .. }));
}

#[test]
fn resources_level_independently_and_rows_sort_by_id() {
    let tasks = vec![
        Task::new("A", "A", 2.0, 2.0, 2.0),
        Task::new("B", "B", 2.0, 2.0, 2.0),
    ];
    let cpm = run_cpm(&tasks, &[], &config()).unwrap();
    let rows = schedule_resources(
        &cpm,
        &[assign("zoe", "B"), assign("abe", "A")],
        &config(),
        &[],
    )
    .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].resource_id, "abe");
    assert_eq!(rows[1].resource_id, "zoe");
    // No shared cursor: both start at the project start.
    assert_eq!(rows[0].tasks[0].start_date, d(2026, 1, 5));
    assert_eq!(rows[1].tasks[0].start_date, d(2026, 1, 5));
}

#[test]
fn weekend_gap_pushes_the_cursor_to_monday() {
    let tasks = vec![
        Task::new("A", "A", 5.0, 5.0, 5.0),
        Task::new("B", "B", 2.0, 2.0, 2.0),
    ];
    let cpm = run_cpm(&tasks, &[], &config()).unwrap();
    let rows = schedule_resources(
        &cpm,
        &[assign("dev", "A"), assign("dev", "B")],
        &config(),
        &[],
    )
    .unwrap();

    // A fills Mon-Fri; B resumes the following Monday.
    let a = &rows[0].tasks[0];
    let b = &rows[0].tasks[1];
    assert_eq!(a.finish_date, d(2026, 1, 9));
    assert_eq!(b.start_date, d(2026, 1, 12));
    assert_eq!(b.finish_date, d(2026, 1, 13));
    assert_eq!(rows[0].calendar_span_days, 9);
}
