//! Data types for persisted reminders.

use crate::schedule::Schedule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pending firing of one schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    /// Position of the owning schedule in the reminder's `schedules`.
    pub schedule_index: usize,
    /// When this occurrence becomes due.
    pub time: DateTime<Utc>,
    /// True once a notification has been raised for it.
    #[serde(default)]
    pub notified: bool,
}

impl Occurrence {
    pub fn new(schedule_index: usize, time: DateTime<Utc>) -> Self {
        Self {
            schedule_index,
            time,
            notified: false,
        }
    }
}

/// The two persisted timing shapes, resolved once at load time.
///
/// Old records carry a single `time` + `notified` pair; new records carry
/// `schedules` with positional `nextExecutions`. The shapes are mutually
/// exclusive and both must keep round-tripping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timing {
    #[serde(rename_all = "camelCase")]
    Recurring {
        schedules: Vec<Schedule>,
        next_executions: Vec<Occurrence>,
    },
    Legacy {
        time: DateTime<Utc>,
        #[serde(default)]
        notified: bool,
    },
}

/// A stored reminder (persisted to `.minder/reminders.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Unique identifier (UUID v4 for CLI-created reminders), stable for life.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Optional longer text shown in the notification body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Terminal flag — a completed reminder generates no further occurrences.
    #[serde(default)]
    pub completed: bool,
    /// Legacy single-time or schedule-driven timing.
    #[serde(flatten)]
    pub timing: Timing,
}

impl Reminder {
    /// True if any occurrence has been notified but not yet acted on.
    ///
    /// The daemon uses this to decide whether an armed re-prompt is still
    /// warranted; a snooze or complete makes it false.
    pub fn has_unacknowledged(&self, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        match &self.timing {
            Timing::Legacy { time, notified } => *notified && *time <= now,
            Timing::Recurring {
                next_executions, ..
            } => next_executions.iter().any(|o| o.notified && o.time <= now),
        }
    }

    /// Earliest pending occurrence time, for sorted listings.
    pub fn next_time(&self) -> Option<DateTime<Utc>> {
        if self.completed {
            return None;
        }
        match &self.timing {
            Timing::Legacy { time, .. } => Some(*time),
            Timing::Recurring {
                next_executions, ..
            } => next_executions.iter().map(|o| o.time).min(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{IntervalUnit, RecurrenceRule};
    use chrono::{Duration, TimeZone};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn interval_schedule(minutes: i64) -> Schedule {
        Schedule::Known(RecurrenceRule::Interval {
            interval_value: minutes,
            interval_unit: IntervalUnit::Minutes,
            interval_end: None,
        })
    }

    #[test]
    fn test_serde_roundtrip_recurring() {
        let r = Reminder {
            id: "abc-123".into(),
            title: "Water the plants".into(),
            description: Some("Kitchen and balcony".into()),
            completed: false,
            timing: Timing::Recurring {
                schedules: vec![interval_schedule(10)],
                next_executions: vec![Occurrence::new(0, utc(2026, 3, 1, 9, 0))],
            },
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains(r#""nextExecutions""#), "got: {json}");
        assert!(json.contains(r#""scheduleIndex":0"#), "got: {json}");
        let parsed: Reminder = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, r);
    }

    #[test]
    fn test_serde_roundtrip_legacy() {
        let r = Reminder {
            id: "old-1".into(),
            title: "Dentist".into(),
            description: None,
            completed: false,
            timing: Timing::Legacy {
                time: utc(2026, 3, 1, 9, 0),
                notified: true,
            },
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains(r#""time""#), "got: {json}");
        assert!(!json.contains("schedules"), "got: {json}");
        let parsed: Reminder = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, r);
    }

    #[test]
    fn test_deserialize_legacy_with_defaults() {
        // Old records may predate the notified flag.
        let json = r#"{
            "id": "old-2",
            "title": "Call mum",
            "time": "2026-03-01T09:00:00Z"
        }"#;
        let r: Reminder = serde_json::from_str(json).unwrap();
        assert!(!r.completed);
        assert!(r.description.is_none());
        assert!(matches!(r.timing, Timing::Legacy { notified: false, .. }));
    }

    #[test]
    fn test_has_unacknowledged_recurring() {
        let now = utc(2026, 3, 1, 10, 0);
        let mut r = Reminder {
            id: "r".into(),
            title: "t".into(),
            description: None,
            completed: false,
            timing: Timing::Recurring {
                schedules: vec![interval_schedule(10)],
                next_executions: vec![Occurrence::new(0, now - Duration::minutes(5))],
            },
        };
        assert!(!r.has_unacknowledged(now));

        if let Timing::Recurring { next_executions, .. } = &mut r.timing {
            next_executions[0].notified = true;
        }
        assert!(r.has_unacknowledged(now));

        r.completed = true;
        assert!(!r.has_unacknowledged(now));
    }

    #[test]
    fn test_has_unacknowledged_ignores_future_time() {
        // A snoozed occurrence is future with notified cleared; even a
        // future time with a stale flag is not pending acknowledgment.
        let now = utc(2026, 3, 1, 10, 0);
        let r = Reminder {
            id: "r".into(),
            title: "t".into(),
            description: None,
            completed: false,
            timing: Timing::Legacy {
                time: now + Duration::minutes(5),
                notified: true,
            },
        };
        assert!(!r.has_unacknowledged(now));
    }

    #[test]
    fn test_next_time_is_earliest_occurrence() {
        let r = Reminder {
            id: "r".into(),
            title: "t".into(),
            description: None,
            completed: false,
            timing: Timing::Recurring {
                schedules: vec![interval_schedule(10), interval_schedule(20)],
                next_executions: vec![
                    Occurrence::new(0, utc(2026, 3, 2, 9, 0)),
                    Occurrence::new(1, utc(2026, 3, 1, 9, 0)),
                ],
            },
        };
        assert_eq!(r.next_time(), Some(utc(2026, 3, 1, 9, 0)));
    }
}
