//! Daemon mode — periodic due-reminder scans with desktop notifications.
//!
//! The daemon runs a `tokio::select!` loop over two sources:
//! 1. A scan timer (every `tick_interval_secs`)
//! 2. Shutdown signals (SIGTERM/SIGINT)
//!
//! Each tick reloads the reminders file from disk so edits made by the CLI
//! (add, snooze, complete, cancel) are picked up without any IPC.

pub mod config;

use crate::engine;
use crate::event::{EventKind, WorkerEvent, broadcast};
use crate::notify::{CommandNotifier, Notification, Notifier, StdoutNotifier};
use crate::reminder::ReminderStore;
use color_eyre::eyre::{Result, WrapErr};
use config::DaemonConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// PID file helpers
// ---------------------------------------------------------------------------

fn pid_path(data_root: &Path) -> PathBuf {
    data_root.join(".minder").join("daemon.pid")
}

fn write_pid(data_root: &Path) -> Result<()> {
    let path = pid_path(data_root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, std::process::id().to_string())
        .wrap_err_with(|| format!("failed to write PID file {}", path.display()))
}

fn read_pid(data_root: &Path) -> Option<u32> {
    std::fs::read_to_string(pid_path(data_root))
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

fn remove_pid(data_root: &Path) {
    let _ = std::fs::remove_file(pid_path(data_root));
}

fn is_process_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

// ---------------------------------------------------------------------------
// Public API: start / stop / restart
// ---------------------------------------------------------------------------

fn log_path(data_root: &Path) -> PathBuf {
    data_root.join(".minder").join("daemon.log")
}

/// Start the daemon.
///
/// By default, spawns a background child process with output redirected to
/// `.minder/daemon.log` and returns immediately. With `foreground: true`,
/// runs the scan loop inline (blocking).
pub async fn start(data_root: &Path, foreground: bool) -> Result<()> {
    // Check for stale PID file.
    if let Some(pid) = read_pid(data_root) {
        if is_process_alive(pid) {
            color_eyre::eyre::bail!("daemon already running (PID {pid})");
        }
        eprintln!("[daemon] Removing stale PID file (PID {pid} is not running)");
        remove_pid(data_root);
    }

    if !foreground {
        return spawn_background(data_root);
    }

    // Foreground mode — write PID and run inline.
    write_pid(data_root)?;
    let pid = std::process::id();
    eprintln!("[daemon] Started (PID {pid})");

    let config = DaemonConfig::load(data_root)?;
    eprintln!("[daemon] Scan interval: {}s", config.tick_interval_secs);
    eprintln!(
        "[daemon] Reminders: {}",
        config.resolved_store_path(data_root).display()
    );
    if let Some(cmd) = &config.notify_command {
        eprintln!("[daemon] Notify command: {cmd}");
    }
    if config.reprompt_delay_secs == 0 {
        eprintln!("[daemon] Re-prompting disabled");
    }

    let mut runner = DaemonRunner::new(data_root.to_path_buf(), config);
    runner.run().await?;

    remove_pid(data_root);
    eprintln!("[daemon] PID file removed");

    Ok(())
}

/// Spawn `minder daemon start --foreground` as a detached background process,
/// with stdout/stderr redirected to `.minder/daemon.log`.
fn spawn_background(data_root: &Path) -> Result<()> {
    let exe = std::env::current_exe().wrap_err("failed to find minder executable")?;
    let log = log_path(data_root);

    if let Some(parent) = log.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    let log_file = std::fs::File::create(&log)
        .wrap_err_with(|| format!("failed to create log file {}", log.display()))?;
    let stderr_file = log_file
        .try_clone()
        .wrap_err("failed to clone log file handle")?;

    let mut cmd = std::process::Command::new(exe);
    cmd.args(["-C", &data_root.display().to_string()]);
    cmd.args(["daemon", "start", "--foreground"]);
    cmd.stdout(log_file);
    cmd.stderr(stderr_file);
    cmd.stdin(std::process::Stdio::null());

    // Detach from parent process group so it survives our exit.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let child = cmd.spawn().wrap_err("failed to spawn daemon process")?;
    let pid = child.id();

    println!("daemon started (PID {pid})");
    println!("logs: {}", log.display());

    Ok(())
}

/// Stop the running daemon by reading its PID file and sending SIGTERM.
pub fn stop(data_root: &Path) -> Result<()> {
    let pid = match read_pid(data_root) {
        Some(pid) => pid,
        None => {
            eprintln!("daemon is not running (no PID file)");
            return Ok(());
        }
    };

    if !is_process_alive(pid) {
        eprintln!("daemon is not running (PID {pid} is stale), removing PID file");
        remove_pid(data_root);
        return Ok(());
    }

    // Send SIGTERM.
    let _ = std::process::Command::new("kill")
        .args([&pid.to_string()])
        .status();

    // Wait up to 5 seconds for the process to exit.
    for _ in 0..50 {
        if !is_process_alive(pid) {
            remove_pid(data_root);
            eprintln!("daemon stopped (PID {pid})");
            return Ok(());
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    // Still alive — force kill.
    let _ = std::process::Command::new("kill")
        .args(["-9", &pid.to_string()])
        .status();
    remove_pid(data_root);
    eprintln!("daemon killed (PID {pid})");

    Ok(())
}

/// Stop any running daemon, then start a fresh background one.
pub async fn restart(data_root: &Path) -> Result<()> {
    stop(data_root)?;
    start(data_root, false).await
}

/// Run a single due-check scan and exit. Used by `minder tick` and cron-style
/// setups that prefer not to keep a daemon around.
pub async fn tick_once(data_root: &Path) -> Result<()> {
    let config = DaemonConfig::load(data_root)?;
    let mut runner = DaemonRunner::new(data_root.to_path_buf(), config);
    runner.tick().await
}

/// A notification awaiting acknowledgment, scheduled to be raised again.
struct ArmedReprompt {
    notification: Notification,
    deadline: Instant,
}

/// Main daemon scan loop.
struct DaemonRunner {
    data_root: PathBuf,
    config: DaemonConfig,
    notifier: Box<dyn Notifier>,
    /// Unacknowledged notifications keyed by reminder ID.
    reprompts: HashMap<String, ArmedReprompt>,
}

impl DaemonRunner {
    fn new(data_root: PathBuf, config: DaemonConfig) -> Self {
        let notifier: Box<dyn Notifier> = match &config.notify_command {
            Some(cmd) => Box::new(CommandNotifier::new(cmd.clone())),
            None => Box::new(StdoutNotifier),
        };
        Self {
            data_root,
            config,
            notifier,
            reprompts: HashMap::new(),
        }
    }

    async fn run(&mut self) -> Result<()> {
        let cancel = CancellationToken::new();

        // Set up SIGTERM/SIGINT handler.
        let shutdown_cancel = cancel.clone();
        tokio::spawn(async move {
            let ctrl_c = tokio::signal::ctrl_c();
            #[cfg(unix)]
            {
                let mut sigterm =
                    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                        .expect("failed to install SIGTERM handler");
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = ctrl_c.await;
            }
            eprintln!("\n[daemon] Shutdown signal received");
            shutdown_cancel.cancel();
        });

        let interval = std::time::Duration::from_secs(self.config.tick_interval_secs.max(1));
        let mut scan_timer = tokio::time::interval(interval);
        scan_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        eprintln!(
            "[daemon] Ready. Scanning every {}s (notifier: {}).",
            interval.as_secs(),
            self.notifier.name()
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    eprintln!("[daemon] Shutting down...");
                    break;
                }

                _ = scan_timer.tick() => {
                    if let Err(e) = self.tick().await {
                        eprintln!("[daemon] Scan error: {e}");
                    }
                }
            }
        }

        eprintln!("[daemon] Goodbye.");
        Ok(())
    }

    /// One due-check scan: reload, scan, notify, re-prompt, persist.
    async fn tick(&mut self) -> Result<()> {
        let now = chrono::Utc::now();

        // Reload from disk to pick up CLI edits. A corrupt file skips the
        // tick instead of clobbering user data with an empty store.
        let store_path = self.config.resolved_store_path(&self.data_root);
        let mut store = match ReminderStore::open(store_path) {
            Ok(store) => store,
            Err(e) => {
                eprintln!("[daemon] Failed to load reminders, skipping scan: {e}");
                return Ok(());
            }
        };

        let notices = engine::scan(store.reminders_mut(), now);
        if !notices.is_empty() {
            eprintln!("[daemon] {} reminder(s) due", notices.len());
        }

        let mut events = Vec::new();
        for notice in &notices {
            let notification = Notification::new(notice.reminder_id.as_str(), notice.title.as_str())
                .with_body(notice.body.as_str());
            if let Err(e) = self.notifier.present(&notification).await {
                eprintln!("[daemon] Failed to notify for {}: {e}", notice.reminder_id);
            }
            self.arm_reprompt(notification);
            events.push(WorkerEvent::new(
                EventKind::Triggered,
                notice.reminder_id.as_str(),
                notice.title.as_str(),
            ));
        }
        broadcast(&self.config.resolved_events_path(&self.data_root), &events);

        self.sweep_reprompts(&store, now).await;

        store.save()?;
        Ok(())
    }

    fn arm_reprompt(&mut self, notification: Notification) {
        if self.config.reprompt_delay_secs == 0 {
            return;
        }
        let deadline =
            Instant::now() + std::time::Duration::from_secs(self.config.reprompt_delay_secs);
        self.reprompts.insert(
            notification.reminder_id.clone(),
            ArmedReprompt {
                notification,
                deadline,
            },
        );
    }

    /// Disarm re-prompts that were acknowledged and re-raise the ones that
    /// sat past their deadline.
    async fn sweep_reprompts(&mut self, store: &ReminderStore, now: chrono::DateTime<chrono::Utc>) {
        if self.reprompts.is_empty() {
            return;
        }

        let mut acknowledged = Vec::new();
        for id in self.reprompts.keys() {
            let pending = store
                .reminders()
                .iter()
                .find(|r| &r.id == id)
                .is_some_and(|r| r.has_unacknowledged(now));
            if !pending {
                acknowledged.push(id.clone());
            }
        }
        for id in acknowledged {
            self.reprompts.remove(&id);
            eprintln!("[daemon] Reminder {id} acknowledged");
            if let Err(e) = self.notifier.dismiss(&id).await {
                eprintln!("[daemon] Failed to dismiss notification for {id}: {e}");
            }
        }

        let overdue: Vec<String> = self
            .reprompts
            .iter()
            .filter(|(_, r)| r.deadline <= Instant::now())
            .map(|(id, _)| id.clone())
            .collect();
        for id in overdue {
            let Some(armed) = self.reprompts.get(&id) else {
                continue;
            };
            eprintln!("[daemon] Re-prompting for unacknowledged reminder {id}");
            if let Err(e) = self.notifier.present(&armed.notification).await {
                eprintln!("[daemon] Failed to re-prompt for {id}: {e}");
            }
            let notification = armed.notification.clone();
            self.arm_reprompt(notification);
        }
    }
}
