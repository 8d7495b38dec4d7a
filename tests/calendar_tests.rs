use chrono::{NaiveDate, Weekday};
use taskplan::calendar::{CalendarConfig, CalendarError, WorkCalendar, parse_weekday_token, weekday_token};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn weekdays() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
}

#[test]
fn weekends_are_not_working_days() {
    let cal = WorkCalendar::new(weekdays(), []).unwrap();
    // 2026-01-10 is a Saturday, 2026-01-11 is a Sunday
    assert!(!cal.is_working_day(d(2026, 1, 10)));
    assert!(!cal.is_working_day(d(2026, 1, 11)));
    assert!(cal.is_working_day(d(2026, 1, 12)));
}

#[test]
fn holidays_and_time_off_block_working_weekdays() {
    let holiday = d(2026, 1, 7);
    let pto = d(2026, 1, 8);
    let cal = WorkCalendar::new(weekdays(), [holiday])
        .unwrap()
        .with_time_off([pto]);
    assert!(!cal.is_working_day(holiday));
    assert!(!cal.is_working_day(pto));
    assert!(cal.is_working_day(d(2026, 1, 6)));
}

#[test]
fn skip_to_working_day_is_identity_on_working_days() {
    let cal = WorkCalendar::new(weekdays(), []).unwrap();
    let mon = d(2026, 1, 5);
    assert_eq!(cal.skip_to_working_day(mon).unwrap(), mon);
    // Saturday skips forward to Monday
    assert_eq!(cal.skip_to_working_day(d(2026, 1, 10)).unwrap(), d(2026, 1, 12));
}

#[test]
fn add_zero_working_days_equals_skip() {
    let cal = WorkCalendar::new(weekdays(), [d(2026, 1, 12)]).unwrap();
    for day in 3..=17 {
        let date = d(2026, 1, day);
        assert_eq!(
            cal.add_working_days(date, 0).unwrap(),
            cal.skip_to_working_day(date).unwrap()
        );
        assert!(cal.is_working_day(cal.add_working_days(date, 0).unwrap()));
    }
}

#[test]
fn add_working_days_steps_over_weekends() {
    let cal = WorkCalendar::new(weekdays(), []).unwrap();
    let mon = d(2026, 1, 5);
    assert_eq!(cal.add_working_days(mon, 4).unwrap(), d(2026, 1, 9));
    assert_eq!(cal.add_working_days(mon, 5).unwrap(), d(2026, 1, 12));
}

#[test]
fn subtract_working_days_mirrors_add() {
    let cal = WorkCalendar::new(weekdays(), []).unwrap();
    assert_eq!(
        cal.subtract_working_days(d(2026, 1, 9), 4).unwrap(),
        d(2026, 1, 5)
    );
    // Sunday retreats to Friday before counting
    assert_eq!(
        cal.subtract_working_days(d(2026, 1, 11), 1).unwrap(),
        d(2026, 1, 8)
    );
}

#[test]
fn working_days_between_counts_inclusively() {
    let cal = WorkCalendar::new(weekdays(), []).unwrap();
    assert_eq!(cal.working_days_between(d(2026, 1, 5), d(2026, 1, 9)), 5);
    assert_eq!(cal.working_days_between(d(2026, 1, 5), d(2026, 1, 5)), 1);
    assert_eq!(cal.working_days_between(d(2026, 1, 9), d(2026, 1, 5)), 0);

    let with_holiday = WorkCalendar::new(weekdays(), [d(2026, 1, 7)]).unwrap();
    assert_eq!(
        with_holiday.working_days_between(d(2026, 1, 5), d(2026, 1, 9)),
        4
    );
}

#[test]
fn span_end_returns_last_day_of_inclusive_span() {
    let cal = WorkCalendar::new(weekdays(), []).unwrap();
    // A five-day span starting Monday ends Friday of the same week.
    assert_eq!(cal.span_end(d(2026, 1, 5), 5).unwrap(), d(2026, 1, 9));
    assert_eq!(cal.span_end(d(2026, 1, 5), 1).unwrap(), d(2026, 1, 5));
    assert_eq!(cal.span_end(d(2026, 1, 5), 0).unwrap(), d(2026, 1, 5));
    // A six-day span crosses the weekend.
    assert_eq!(cal.span_end(d(2026, 1, 5), 6).unwrap(), d(2026, 1, 12));
}

#[test]
fn empty_workweek_fails_fast() {
    assert_eq!(
        WorkCalendar::new([], []).unwrap_err(),
        CalendarError::EmptyWorkweek
    );
    assert_eq!(
        CalendarConfig::new(d(2026, 1, 5), [], []).unwrap_err(),
        CalendarError::EmptyWorkweek
    );
}

#[test]
fn config_normalizes_working_days_and_holidays() {
    let config = CalendarConfig::new(
        d(2026, 1, 5),
        vec![Weekday::Fri, Weekday::Mon, Weekday::Mon],
        vec![d(2026, 2, 2), d(2026, 1, 19), d(2026, 2, 2)],
    )
    .unwrap();
    assert_eq!(config.working_days(), &[Weekday::Mon, Weekday::Fri]);
    assert_eq!(config.holidays(), &[d(2026, 1, 19), d(2026, 2, 2)]);
}

#[test]
fn weekday_tokens_parse_case_insensitively() {
    assert_eq!(parse_weekday_token("m"), Some(Weekday::Mon));
    assert_eq!(parse_weekday_token("TH"), Some(Weekday::Thu));
    assert_eq!(parse_weekday_token(" su "), Some(Weekday::Sun));
    assert_eq!(parse_weekday_token("S"), Some(Weekday::Sat));
    assert_eq!(parse_weekday_token("thu"), None);

    for day in [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ] {
        assert_eq!(parse_weekday_token(weekday_token(day)), Some(day));
    }
}
