//! Notification delivery abstraction.
//!
//! The daemon raises notifications through a [`Notifier`]. The default
//! implementation shells out to a user-configured command (e.g. a wrapper
//! around `notify-send`); `StdoutNotifier` prints to the terminal for
//! foreground runs and tests.

use async_trait::async_trait;
use color_eyre::eyre::{Result, WrapErr};

/// Acknowledgment actions offered on a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    Complete,
    Snooze,
}

impl std::fmt::Display for NotifyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Snooze => write!(f, "snooze"),
        }
    }
}

/// A notification ready for delivery.
#[derive(Debug, Clone)]
pub struct Notification {
    /// ID of the reminder this notification belongs to. Re-prompts and
    /// dismissals are keyed on it.
    pub reminder_id: String,
    pub title: String,
    pub body: String,
    pub actions: Vec<NotifyAction>,
}

impl Notification {
    pub fn new(reminder_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            reminder_id: reminder_id.into(),
            title: title.into(),
            body: String::new(),
            actions: vec![NotifyAction::Complete, NotifyAction::Snooze],
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// Trait for notification backends.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Raise (or re-raise) a notification.
    async fn present(&self, notification: &Notification) -> Result<()>;

    /// Take down any visible notification for the given reminder.
    async fn dismiss(&self, reminder_id: &str) -> Result<()>;
}

/// Notifier that delegates to an external command.
///
/// The command is invoked as `<cmd> present <id> <title> <body> <actions>`
/// and `<cmd> dismiss <id>`, where `<actions>` is a comma-separated list.
pub struct CommandNotifier {
    command: String,
}

impl CommandNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<()> {
        let output = tokio::process::Command::new(&self.command)
            .args(args)
            .output()
            .await
            .wrap_err_with(|| format!("failed to run notify command {}", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            color_eyre::eyre::bail!("notify command failed: {stderr}");
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    fn name(&self) -> &str {
        "command"
    }

    async fn present(&self, notification: &Notification) -> Result<()> {
        let actions: Vec<String> = notification
            .actions
            .iter()
            .map(|a| a.to_string())
            .collect();
        self.run(&[
            "present",
            &notification.reminder_id,
            &notification.title,
            &notification.body,
            &actions.join(","),
        ])
        .await
    }

    async fn dismiss(&self, reminder_id: &str) -> Result<()> {
        self.run(&["dismiss", reminder_id]).await
    }
}

/// Notifier that prints to stderr, for foreground runs.
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn present(&self, notification: &Notification) -> Result<()> {
        eprintln!(
            "[notify] {}: {}{}",
            notification.reminder_id,
            notification.title,
            if notification.body.is_empty() {
                String::new()
            } else {
                format!(" ({})", notification.body)
            }
        );
        Ok(())
    }

    async fn dismiss(&self, _reminder_id: &str) -> Result<()> {
        Ok(())
    }
}
