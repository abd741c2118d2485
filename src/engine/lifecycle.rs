//! Lifecycle engine — snooze and complete actions.

use crate::reminder::types::{Reminder, Timing};
use chrono::{DateTime, Duration, Utc};

/// A user action against one reminder (the onAction entry point).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Push every already-due occurrence forward by this many minutes.
    Snooze { minutes: i64 },
    /// Retire the reminder, or advance each due occurrence to its
    /// schedule's next time.
    Complete,
}

/// What an action did, so callers can log and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Snooze applied; `shifted` occurrences were pushed forward.
    Snoozed { shifted: usize },
    /// The reminder is now completed (terminal).
    Completed,
    /// Recurring complete: occurrences advanced, reminder stays active.
    Rescheduled { remaining: usize },
    /// No reminder with that id — the user acted on a notification for a
    /// reminder that no longer exists. Recovered as a no-op.
    NotFound,
}

/// Apply a user action to the working set.
///
/// An unknown id is logged and recovered as [`ActionOutcome::NotFound`];
/// it is never an error.
pub fn apply_action(
    reminders: &mut [Reminder],
    id: &str,
    action: Action,
    now: DateTime<Utc>,
) -> ActionOutcome {
    let Some(reminder) = reminders.iter_mut().find(|r| r.id == id) else {
        eprintln!("[engine] action on unknown reminder {id}, ignoring");
        return ActionOutcome::NotFound;
    };

    match action {
        Action::Snooze { minutes } => snooze(reminder, minutes, now),
        Action::Complete => complete(reminder, now),
    }
}

/// Shift already-due occurrences forward; future occurrences are untouched.
fn snooze(reminder: &mut Reminder, minutes: i64, now: DateTime<Utc>) -> ActionOutcome {
    // An out-of-range delta leaves the reminder untouched rather than
    // panicking or wrapping.
    let Some(delta) = Duration::try_minutes(minutes) else {
        eprintln!("[engine] snooze of {minutes} minutes is out of range, ignoring");
        return ActionOutcome::Snoozed { shifted: 0 };
    };

    match &mut reminder.timing {
        Timing::Legacy { time, notified } => match time.checked_add_signed(delta) {
            Some(shifted_time) => {
                *time = shifted_time;
                *notified = false;
                ActionOutcome::Snoozed { shifted: 1 }
            }
            None => ActionOutcome::Snoozed { shifted: 0 },
        },
        Timing::Recurring {
            next_executions, ..
        } => {
            let mut shifted = 0;
            for occurrence in next_executions.iter_mut() {
                if occurrence.time <= now {
                    let Some(shifted_time) = occurrence.time.checked_add_signed(delta) else {
                        continue;
                    };
                    occurrence.time = shifted_time;
                    occurrence.notified = false;
                    shifted += 1;
                }
            }
            ActionOutcome::Snoozed { shifted }
        }
    }
}

/// Retire a non-recurring reminder, or advance each due occurrence to its
/// schedule's next time (dropping exhausted ones). The reminder becomes
/// completed when no occurrences remain.
fn complete(reminder: &mut Reminder, now: DateTime<Utc>) -> ActionOutcome {
    let Timing::Recurring {
        schedules,
        next_executions,
    } = &mut reminder.timing
    else {
        reminder.completed = true;
        return ActionOutcome::Completed;
    };

    if next_executions.is_empty() {
        reminder.completed = true;
        return ActionOutcome::Completed;
    }

    let mut kept = Vec::with_capacity(next_executions.len());
    for occurrence in next_executions.drain(..) {
        if occurrence.time > now {
            kept.push(occurrence);
            continue;
        }
        let next = schedules
            .get(occurrence.schedule_index)
            .and_then(|s| s.next_occurrence(occurrence.time, now));
        match next {
            // A fixed absolute alarm "advances" to its own time; a schedule
            // that fails to move forward is retired like an exhausted one.
            Some(time) if time > occurrence.time => {
                let mut advanced = occurrence;
                advanced.time = time;
                advanced.notified = false;
                kept.push(advanced);
            }
            Some(_) | None => {}
        }
    }

    *next_executions = kept;
    if next_executions.is_empty() {
        reminder.completed = true;
        ActionOutcome::Completed
    } else {
        ActionOutcome::Rescheduled {
            remaining: next_executions.len(),
        }
    }
}
