//! Schedule definitions and recurrence math.
//!
//! A reminder carries one or more schedules. `next_occurrence` is the single
//! entry point for recurrence: given a reference time (usually the occurrence
//! being retired) and the current time, it computes when the schedule fires
//! next, or `None` when the schedule is exhausted.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A wall-clock time of day, persisted as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    pub hour: u32,
    pub min: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, min: u32) -> Option<Self> {
        (hour < 24 && min < 60).then_some(Self { hour, min })
    }

    /// The corresponding `NaiveTime` (seconds are always zero).
    pub fn naive(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.min, 0).unwrap_or_default()
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.min)
    }
}

impl std::str::FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| format!("expected HH:MM, got {s:?}"))?;
        let hour: u32 = h.parse().map_err(|_| format!("bad hour in {s:?}"))?;
        let min: u32 = m.parse().map_err(|_| format!("bad minute in {s:?}"))?;
        Self::new(hour, min).ok_or_else(|| format!("time out of range: {s:?}"))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> String {
        t.to_string()
    }
}

/// Recurrence step for `specific` schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    None,
    Daily,
    Weekly,
    Monthly,
}

/// Unit for `interval` schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Minutes,
    Hours,
    Days,
}

/// One recurrence rule, tagged by `kind` in the persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecurrenceRule {
    /// Legacy-era rule: a base time that steps by a calendar unit.
    #[serde(rename_all = "camelCase")]
    Specific {
        recurrence_type: RecurrenceType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recurrence_end: Option<DateTime<Utc>>,
    },

    /// Fixed step of N minutes/hours/days.
    #[serde(rename_all = "camelCase")]
    Interval {
        interval_value: i64,
        interval_unit: IntervalUnit,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interval_end: Option<DateTime<Utc>>,
    },

    /// Clock-anchored rules (absolute time, daily/weekly/monthly at HH:MM).
    Complex(ComplexRule),
}

/// The `complex` schedule family, sub-tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ComplexRule {
    /// One-shot absolute alarm. Never advances.
    Time { time: DateTime<Utc> },

    /// Every day at HH:MM.
    Daily { time: TimeOfDay },

    /// At HH:MM on a set of weekdays (0 = Sunday, JS `getDay()` numbering).
    #[serde(rename_all = "camelCase")]
    Weekly { time: TimeOfDay, week_days: Vec<u8> },

    /// At HH:MM on a fixed day of the month.
    Monthly { time: TimeOfDay, day: u32 },
}

/// A schedule as stored on a reminder.
///
/// Unrecognized kind/unit combinations are kept verbatim so the record still
/// round-trips through the store; they simply never produce an occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schedule {
    Known(RecurrenceRule),
    Malformed(serde_json::Value),
}

impl Schedule {
    /// Compute the next occurrence after `reference`.
    ///
    /// `reference` is the time of the occurrence being retired (or creation
    /// time for a fresh reminder); `now` anchors the clock-relative complex
    /// rules, which count from the current moment rather than the retired
    /// occurrence.
    pub fn next_occurrence(
        &self,
        reference: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let rule = match self {
            Self::Known(rule) => rule,
            Self::Malformed(_) => return None,
        };

        match rule {
            RecurrenceRule::Specific {
                recurrence_type,
                recurrence_end,
            } => {
                let next = match recurrence_type {
                    RecurrenceType::None => return None,
                    RecurrenceType::Daily => reference + Duration::days(1),
                    RecurrenceType::Weekly => reference + Duration::days(7),
                    RecurrenceType::Monthly => reference.checked_add_months(Months::new(1))?,
                };
                within_cutoff(next, *recurrence_end)
            }

            RecurrenceRule::Interval {
                interval_value,
                interval_unit,
                interval_end,
            } => {
                if *interval_value <= 0 {
                    return None;
                }
                // A value past chrono's range degrades like a malformed
                // schedule instead of panicking.
                let step = match interval_unit {
                    IntervalUnit::Minutes => Duration::try_minutes(*interval_value),
                    IntervalUnit::Hours => Duration::try_hours(*interval_value),
                    IntervalUnit::Days => Duration::try_days(*interval_value),
                }?;
                within_cutoff(reference.checked_add_signed(step)?, *interval_end)
            }

            RecurrenceRule::Complex(complex) => match complex {
                ComplexRule::Time { time } => Some(*time),
                ComplexRule::Daily { time } => Some(next_daily(*time, now)),
                ComplexRule::Weekly { time, week_days } => next_weekly(*time, week_days, now),
                ComplexRule::Monthly { time, day } => next_monthly(*time, *day, now),
            },
        }
    }
}

fn within_cutoff(next: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match end {
        Some(end) if next > end => None,
        _ => Some(next),
    }
}

fn at(date: NaiveDate, time: TimeOfDay) -> DateTime<Utc> {
    date.and_time(time.naive()).and_utc()
}

/// Today at HH:MM if that moment is still ahead, else tomorrow.
fn next_daily(time: TimeOfDay, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = at(now.date_naive(), time);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Smallest future candidate over the configured weekday set.
///
/// Closed modular form: `offset = (weekday - today) mod 7`, with an offset of
/// zero promoted to a full week once today's HH:MM has passed. Insensitive to
/// ordering and duplicates in `week_days`; out-of-range entries are skipped.
fn next_weekly(time: TimeOfDay, week_days: &[u8], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let today = now.weekday().num_days_from_sunday() as i64;
    let passed_today = time.naive() <= now.time();

    week_days
        .iter()
        .filter(|&&w| w <= 6)
        .map(|&w| {
            let mut offset = (i64::from(w) - today).rem_euclid(7);
            if offset == 0 && passed_today {
                offset = 7;
            }
            at(now.date_naive() + Days::new(offset as u64), time)
        })
        .min()
}

/// This month's `day` at HH:MM, or the first later month where that moment
/// exists and is in the future.
fn next_monthly(time: TimeOfDay, day: u32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    // Bounded walk: any valid day-of-month recurs within 12 months.
    let mut month_start = now.date_naive().with_day(1)?;
    for _ in 0..=12 {
        if let Some(date) = month_start.with_day(day) {
            let candidate = at(date, time);
            if candidate > now {
                return Some(candidate);
            }
        }
        month_start = month_start.checked_add_months(Months::new(1))?;
    }
    None
}
