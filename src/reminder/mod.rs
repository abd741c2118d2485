//! User-facing reminders.
//!
//! Supports absolute alarms (`minder add --at`), fixed intervals
//! (`minder add --every 30m`) and clock-anchored daily/weekly/monthly
//! reminders, with persistence to `.minder/reminders.json`.

pub mod interval;
pub mod store;
pub mod types;

pub use store::{CancelError, ReminderStore};
pub use types::{Occurrence, Reminder, Timing};

use crate::schedule::{ComplexRule, IntervalUnit, RecurrenceRule, Schedule, TimeOfDay};
use chrono::{DateTime, NaiveDateTime, Utc};

fn new_reminder(
    title: &str,
    description: Option<&str>,
    schedule: Schedule,
) -> Result<Reminder, String> {
    let now = Utc::now();
    let first = schedule
        .next_occurrence(now, now)
        .ok_or("schedule has no upcoming occurrence")?;

    Ok(Reminder {
        id: uuid::Uuid::new_v4().to_string(),
        title: title.to_owned(),
        description: description.map(str::to_owned),
        completed: false,
        timing: Timing::Recurring {
            schedules: vec![schedule],
            next_executions: vec![types::Occurrence::new(0, first)],
        },
    })
}

/// Create a one-shot reminder at an absolute time.
pub fn create_at(
    title: &str,
    description: Option<&str>,
    time: DateTime<Utc>,
) -> Result<Reminder, String> {
    new_reminder(
        title,
        description,
        Schedule::Known(RecurrenceRule::Complex(ComplexRule::Time { time })),
    )
}

/// Create a fixed-interval reminder, with an optional end cutoff.
pub fn create_interval(
    title: &str,
    description: Option<&str>,
    value: i64,
    unit: IntervalUnit,
    until: Option<DateTime<Utc>>,
) -> Result<Reminder, String> {
    new_reminder(
        title,
        description,
        Schedule::Known(RecurrenceRule::Interval {
            interval_value: value,
            interval_unit: unit,
            interval_end: until,
        }),
    )
}

/// Create a reminder that fires every day at the given wall-clock time.
pub fn create_daily(
    title: &str,
    description: Option<&str>,
    time: TimeOfDay,
) -> Result<Reminder, String> {
    new_reminder(
        title,
        description,
        Schedule::Known(RecurrenceRule::Complex(ComplexRule::Daily { time })),
    )
}

/// Create a reminder for a set of weekdays (0 = Sunday) at a wall-clock time.
pub fn create_weekly(
    title: &str,
    description: Option<&str>,
    time: TimeOfDay,
    week_days: Vec<u8>,
) -> Result<Reminder, String> {
    if week_days.is_empty() {
        return Err("weekly reminder needs at least one weekday".into());
    }
    if let Some(bad) = week_days.iter().find(|&&w| w > 6) {
        return Err(format!("weekday out of range: {bad} (0 = Sunday .. 6 = Saturday)"));
    }
    new_reminder(
        title,
        description,
        Schedule::Known(RecurrenceRule::Complex(ComplexRule::Weekly {
            time,
            week_days,
        })),
    )
}

/// Create a reminder for a fixed day of the month at a wall-clock time.
pub fn create_monthly(
    title: &str,
    description: Option<&str>,
    time: TimeOfDay,
    day: u32,
) -> Result<Reminder, String> {
    if !(1..=31).contains(&day) {
        return Err(format!("day of month out of range: {day}"));
    }
    new_reminder(
        title,
        description,
        Schedule::Known(RecurrenceRule::Complex(ComplexRule::Monthly { time, day })),
    )
}

/// Parse an absolute time from the CLI: `YYYY-MM-DD HH:MM` (UTC) or RFC 3339.
pub fn parse_at(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M") {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| format!("could not parse time {s:?}, expected YYYY-MM-DD HH:MM or RFC 3339"))
}

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Short human label for a schedule, for listings.
pub fn describe_schedule(schedule: &Schedule) -> String {
    let rule = match schedule {
        Schedule::Known(rule) => rule,
        Schedule::Malformed(_) => return "unrecognized".into(),
    };
    match rule {
        RecurrenceRule::Specific {
            recurrence_type, ..
        } => match recurrence_type {
            crate::schedule::RecurrenceType::None => "once".into(),
            crate::schedule::RecurrenceType::Daily => "repeats daily".into(),
            crate::schedule::RecurrenceType::Weekly => "repeats weekly".into(),
            crate::schedule::RecurrenceType::Monthly => "repeats monthly".into(),
        },
        RecurrenceRule::Interval {
            interval_value,
            interval_unit,
            ..
        } => {
            let unit = match interval_unit {
                IntervalUnit::Minutes => "m",
                IntervalUnit::Hours => "h",
                IntervalUnit::Days => "d",
            };
            format!("every {interval_value}{unit}")
        }
        RecurrenceRule::Complex(complex) => match complex {
            ComplexRule::Time { time } => {
                format!("at {}", time.format("%Y-%m-%d %H:%M UTC"))
            }
            ComplexRule::Daily { time } => format!("daily {time}"),
            ComplexRule::Weekly { time, week_days } => {
                let days: Vec<&str> = week_days
                    .iter()
                    .filter_map(|&w| WEEKDAY_NAMES.get(w as usize).copied())
                    .collect();
                format!("{} {time}", days.join(","))
            }
            ComplexRule::Monthly { time, day } => format!("monthly day {day} {time}"),
        },
    }
}

/// First eight characters of an id, for display. Ids loaded from disk may
/// hold multi-byte characters, so this cuts on a char boundary.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Format a single reminder for display.
pub fn format_reminder(r: &Reminder) -> String {
    let short_id = short_id(&r.id);
    let next_str = r
        .next_time()
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "done".into());

    let label = match &r.timing {
        Timing::Legacy { .. } => "once".into(),
        Timing::Recurring { schedules, .. } => {
            let labels: Vec<String> = schedules.iter().map(describe_schedule).collect();
            labels.join("; ")
        }
    };

    let mut line = format!("`{short_id}` [{label}] next {next_str}\n  {}", r.title);
    if let Some(desc) = &r.description {
        line.push_str(&format!(" — {desc}"));
    }
    line
}

/// Format a list of reminders for display.
pub fn format_reminder_list(reminders: &[&Reminder]) -> String {
    if reminders.is_empty() {
        return "No pending reminders.".into();
    }

    let mut text = String::from("Pending reminders:\n");
    for (i, r) in reminders.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", i + 1, format_reminder(r)));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn tod(hour: u32, min: u32) -> TimeOfDay {
        TimeOfDay::new(hour, min).unwrap()
    }

    #[test]
    fn test_create_at() {
        let when = Utc::now() + Duration::hours(1);
        let r = create_at("Dentist", None, when).unwrap();
        assert!(!r.completed);
        assert_eq!(r.next_time(), Some(when));
        match &r.timing {
            Timing::Recurring {
                schedules,
                next_executions,
            } => {
                assert_eq!(schedules.len(), 1);
                assert_eq!(next_executions.len(), 1);
                assert_eq!(next_executions[0].schedule_index, 0);
                assert!(!next_executions[0].notified);
            }
            other => panic!("expected Recurring, got {other:?}"),
        }
    }

    #[test]
    fn test_create_interval_first_fire_is_one_step_out() {
        let before = Utc::now();
        let r = create_interval("Stretch", None, 30, IntervalUnit::Minutes, None).unwrap();
        let next = r.next_time().unwrap();
        assert!(next >= before + Duration::minutes(30));
        assert!(next <= Utc::now() + Duration::minutes(30));
    }

    #[test]
    fn test_create_interval_zero_fails() {
        assert!(create_interval("bad", None, 0, IntervalUnit::Minutes, None).is_err());
    }

    #[test]
    fn test_create_interval_expired_cutoff_fails() {
        let past = Utc::now() - Duration::hours(1);
        assert!(create_interval("bad", None, 30, IntervalUnit::Minutes, Some(past)).is_err());
    }

    #[test]
    fn test_create_daily_fires_in_next_day() {
        let r = create_daily("Standup", Some("team sync"), tod(9, 30)).unwrap();
        let next = r.next_time().unwrap();
        assert!(next > Utc::now());
        assert!(next <= Utc::now() + Duration::days(1));
    }

    #[test]
    fn test_create_weekly_rejects_empty_days() {
        assert!(create_weekly("bad", None, tod(9, 0), vec![]).is_err());
    }

    #[test]
    fn test_create_weekly_rejects_out_of_range_day() {
        let err = create_weekly("bad", None, tod(9, 0), vec![1, 7]).unwrap_err();
        assert!(err.contains("out of range"), "got: {err}");
    }

    #[test]
    fn test_create_monthly_rejects_day_zero() {
        assert!(create_monthly("bad", None, tod(9, 0), 0).is_err());
        assert!(create_monthly("bad", None, tod(9, 0), 32).is_err());
    }

    #[test]
    fn test_parse_at_naive_utc() {
        let t = parse_at("2026-03-01 09:30").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_at_rfc3339() {
        let t = parse_at("2026-03-01T09:30:00+02:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2026, 3, 1, 7, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_at_garbage_fails() {
        assert!(parse_at("next tuesday").is_err());
    }

    #[test]
    fn test_describe_interval() {
        let s = Schedule::Known(RecurrenceRule::Interval {
            interval_value: 30,
            interval_unit: IntervalUnit::Minutes,
            interval_end: None,
        });
        assert_eq!(describe_schedule(&s), "every 30m");
    }

    #[test]
    fn test_describe_weekly_names_days() {
        let s = Schedule::Known(RecurrenceRule::Complex(ComplexRule::Weekly {
            time: tod(9, 0),
            week_days: vec![1, 3, 5],
        }));
        assert_eq!(describe_schedule(&s), "Mon,Wed,Fri 09:00");
    }

    #[test]
    fn test_describe_malformed() {
        let s = Schedule::Malformed(serde_json::json!({"kind": "lunar"}));
        assert_eq!(describe_schedule(&s), "unrecognized");
    }

    #[test]
    fn test_format_reminder_shows_short_id_and_title() {
        let r = create_daily("Standup", None, tod(9, 0)).unwrap();
        let s = format_reminder(&r);
        let short_id = &r.id[..8];
        assert!(s.contains(&format!("`{short_id}`")), "got: {s}");
        assert!(s.contains("[daily 09:00]"), "got: {s}");
        assert!(s.contains("Standup"), "got: {s}");
    }

    #[test]
    fn test_short_id_cuts_on_char_boundary() {
        assert_eq!(short_id("abcdef1234"), "abcdef12");
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
        // Multi-byte characters inside the first eight bytes must not panic.
        assert_eq!(short_id("日本語リマインダー12"), "日本語リマインダ");
    }

    #[test]
    fn test_format_reminder_with_non_ascii_id() {
        let mut r = create_daily("Standup", None, tod(9, 0)).unwrap();
        r.id = "日本語リマインダー".into();
        let s = format_reminder(&r);
        assert!(s.contains("`日本語リマインダ`"), "got: {s}");
    }

    #[test]
    fn test_format_reminder_appends_description() {
        let r = create_daily("Standup", Some("team sync"), tod(9, 0)).unwrap();
        let s = format_reminder(&r);
        assert!(s.contains("team sync"), "got: {s}");
    }

    #[test]
    fn test_format_reminder_list_empty() {
        assert_eq!(format_reminder_list(&[]), "No pending reminders.");
    }

    #[test]
    fn test_format_reminder_list_numbered() {
        let r = create_daily("hello", None, tod(9, 0)).unwrap();
        let list = format_reminder_list(&[&r]);
        assert!(list.contains("1. "), "got: {list}");
        assert!(list.contains("hello"), "got: {list}");
    }
}
