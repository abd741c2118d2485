//! Reminder storage with persistence to `.minder/reminders.json`.
//!
//! Uses [`crate::state`] for atomic JSON read/write; the daemon reloads the
//! file at the top of every tick so CLI edits are picked up between scans.

use super::types::Reminder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors returned by [`ReminderStore::cancel`].
#[derive(Debug)]
pub enum CancelError {
    /// No reminder matched the given ID prefix.
    NotFound,
    /// Multiple reminders matched the given ID prefix.
    Ambiguous(Vec<String>),
}

impl std::fmt::Display for CancelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "no reminder found"),
            Self::Ambiguous(ids) => {
                write!(f, "ambiguous ID, matches: ")?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", super::short_id(id))?;
                }
                Ok(())
            }
        }
    }
}

/// On-disk format for the reminders file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ReminderStoreState {
    #[serde(default)]
    reminders: Vec<Reminder>,
}

/// Manages persisted reminders.
pub struct ReminderStore {
    path: PathBuf,
    state: ReminderStoreState,
}

impl ReminderStore {
    /// Load or create a reminder store at `<data_root>/.minder/reminders.json`.
    pub fn load(data_root: &Path) -> color_eyre::Result<Self> {
        Self::open(data_root.join(".minder/reminders.json"))
    }

    /// Load or create a reminder store at an explicit path.
    ///
    /// A corrupt file is an error rather than a silent reset; reminders are
    /// user data and a bad parse must not wipe them.
    pub fn open(path: PathBuf) -> color_eyre::Result<Self> {
        let state: ReminderStoreState = crate::state::load_state(&path)?;
        Ok(Self { path, state })
    }

    /// Persist current state to disk.
    pub fn save(&self) -> color_eyre::Result<()> {
        crate::state::save_state(&self.path, &self.state)
    }

    /// Add a new reminder. Returns the reminder's ID.
    pub fn add(&mut self, reminder: Reminder) -> String {
        let id = reminder.id.clone();
        self.state.reminders.push(reminder);
        id
    }

    /// Cancel (remove) a reminder by ID prefix. Returns the full ID.
    pub fn cancel(&mut self, id_prefix: &str) -> Result<String, CancelError> {
        let matches: Vec<usize> = self
            .state
            .reminders
            .iter()
            .enumerate()
            .filter(|(_, r)| r.id.starts_with(id_prefix))
            .map(|(i, _)| i)
            .collect();

        match matches.len() {
            0 => Err(CancelError::NotFound),
            1 => {
                let r = self.state.reminders.remove(matches[0]);
                Ok(r.id)
            }
            _ => {
                let ids: Vec<String> = matches
                    .iter()
                    .map(|&i| self.state.reminders[i].id.clone())
                    .collect();
                Err(CancelError::Ambiguous(ids))
            }
        }
    }

    /// All reminders still awaiting action, sorted by next pending time.
    /// Completed reminders sort last (they have no pending time).
    pub fn active(&self) -> Vec<&Reminder> {
        let mut active: Vec<&Reminder> = self
            .state
            .reminders
            .iter()
            .filter(|r| !r.completed)
            .collect();
        active.sort_by_key(|r| r.next_time());
        active
    }

    /// Replace the full reminder list (external sync).
    ///
    /// The incoming list wins wholesale; there is no per-record merge.
    pub fn replace_all(&mut self, reminders: Vec<Reminder>) {
        self.state.reminders = reminders;
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.state.reminders
    }

    pub fn reminders_mut(&mut self) -> &mut [Reminder] {
        &mut self.state.reminders
    }
}
