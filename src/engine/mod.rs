//! Due-check engine — scans the working set against "now".
//!
//! `scan` is the onTick entry point: it finds every occurrence that has
//! matured and not yet been notified, marks it notified in place, and
//! returns one notice per matured occurrence. Marking makes the scan
//! idempotent — repeating it with the same clock yields nothing new.

pub mod lifecycle;

pub use lifecycle::{Action, ActionOutcome, apply_action};

use crate::reminder::types::{Reminder, Timing};
use chrono::{DateTime, Utc};

/// One due-for-notification signal produced by a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct DueNotice {
    pub reminder_id: String,
    pub title: String,
    pub body: String,
    /// Which schedule matured; `None` for legacy single-time reminders.
    pub schedule_index: Option<usize>,
}

/// Scan all reminders, marking matured occurrences notified exactly once.
///
/// A reminder with several matured schedules yields several notices in the
/// same scan. Completed reminders are skipped entirely.
pub fn scan(reminders: &mut [Reminder], now: DateTime<Utc>) -> Vec<DueNotice> {
    let mut due = Vec::new();

    for reminder in reminders.iter_mut() {
        if reminder.completed {
            continue;
        }

        let body = reminder
            .description
            .clone()
            .unwrap_or_else(|| reminder.title.clone());

        match &mut reminder.timing {
            Timing::Legacy { time, notified } => {
                if !*notified && *time <= now {
                    *notified = true;
                    due.push(DueNotice {
                        reminder_id: reminder.id.clone(),
                        title: reminder.title.clone(),
                        body: body.clone(),
                        schedule_index: None,
                    });
                }
            }
            Timing::Recurring {
                next_executions, ..
            } => {
                for occurrence in next_executions.iter_mut() {
                    if !occurrence.notified && occurrence.time <= now {
                        occurrence.notified = true;
                        due.push(DueNotice {
                            reminder_id: reminder.id.clone(),
                            title: reminder.title.clone(),
                            body: body.clone(),
                            schedule_index: Some(occurrence.schedule_index),
                        });
                    }
                }
            }
        }
    }

    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::types::Occurrence;
    use crate::schedule::{IntervalUnit, RecurrenceRule, Schedule};
    use chrono::{Duration, TimeZone};

    fn utc_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
    }

    fn interval_schedule(minutes: i64) -> Schedule {
        Schedule::Known(RecurrenceRule::Interval {
            interval_value: minutes,
            interval_unit: IntervalUnit::Minutes,
            interval_end: None,
        })
    }

    fn recurring(id: &str, occurrences: Vec<Occurrence>) -> Reminder {
        let schedules = occurrences.iter().map(|_| interval_schedule(10)).collect();
        Reminder {
            id: id.into(),
            title: format!("reminder {id}"),
            description: None,
            completed: false,
            timing: Timing::Recurring {
                schedules,
                next_executions: occurrences,
            },
        }
    }

    fn legacy(id: &str, time: DateTime<Utc>, notified: bool) -> Reminder {
        Reminder {
            id: id.into(),
            title: format!("reminder {id}"),
            description: None,
            completed: false,
            timing: Timing::Legacy { time, notified },
        }
    }

    #[test]
    fn test_scan_marks_due_occurrence() {
        let now = utc_now();
        let mut reminders = vec![recurring(
            "r1",
            vec![Occurrence::new(0, now - Duration::minutes(1))],
        )];

        let due = scan(&mut reminders, now);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].reminder_id, "r1");
        assert_eq!(due[0].schedule_index, Some(0));

        let Timing::Recurring { next_executions, .. } = &reminders[0].timing else {
            panic!("expected recurring timing");
        };
        assert!(next_executions[0].notified);
    }

    #[test]
    fn test_scan_is_idempotent_per_occurrence() {
        let now = utc_now();
        let mut reminders = vec![recurring(
            "r1",
            vec![Occurrence::new(0, now - Duration::minutes(1))],
        )];

        assert_eq!(scan(&mut reminders, now).len(), 1);
        assert!(scan(&mut reminders, now).is_empty());
        assert!(scan(&mut reminders, now).is_empty());
    }

    #[test]
    fn test_scan_due_exactly_at_now() {
        let now = utc_now();
        let mut reminders = vec![legacy("r1", now, false)];
        assert_eq!(scan(&mut reminders, now).len(), 1);
    }

    #[test]
    fn test_scan_skips_future_occurrences() {
        let now = utc_now();
        let mut reminders = vec![recurring(
            "r1",
            vec![Occurrence::new(0, now + Duration::minutes(1))],
        )];
        assert!(scan(&mut reminders, now).is_empty());
    }

    #[test]
    fn test_scan_skips_completed() {
        let now = utc_now();
        let mut r = legacy("r1", now - Duration::minutes(1), false);
        r.completed = true;
        let mut reminders = vec![r];
        assert!(scan(&mut reminders, now).is_empty());
    }

    #[test]
    fn test_scan_multiple_matured_schedules_yield_multiple_notices() {
        let now = utc_now();
        let mut reminders = vec![recurring(
            "r1",
            vec![
                Occurrence::new(0, now - Duration::minutes(3)),
                Occurrence::new(1, now - Duration::minutes(1)),
                Occurrence::new(2, now + Duration::minutes(1)),
            ],
        )];

        let due = scan(&mut reminders, now);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].schedule_index, Some(0));
        assert_eq!(due[1].schedule_index, Some(1));
    }

    #[test]
    fn test_scan_legacy_reminder() {
        let now = utc_now();
        let mut reminders = vec![legacy("old", now - Duration::hours(1), false)];

        let due = scan(&mut reminders, now);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].schedule_index, None);
        assert!(matches!(
            reminders[0].timing,
            Timing::Legacy { notified: true, .. }
        ));
    }

    #[test]
    fn test_scan_body_prefers_description() {
        let now = utc_now();
        let mut r = legacy("r1", now, false);
        r.description = Some("the long text".into());
        let mut reminders = vec![r];

        let due = scan(&mut reminders, now);
        assert_eq!(due[0].body, "the long text");
    }
}
