//! Minder — a reminder daemon with recurring schedules.
//!
//! Reminders live in `.minder/reminders.json`. The daemon scans them on an
//! interval and raises notifications; the CLI edits the same file, so the
//! two need no IPC beyond the filesystem.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};

use minder::daemon::{self, config::DaemonConfig};
use minder::engine::{self, Action, ActionOutcome};
use minder::event::{EventKind, WorkerEvent, broadcast};
use minder::ipc::JsonlReader;
use minder::reminder::{self, CancelError, ReminderStore, interval::parse_interval, short_id};
use minder::schedule::TimeOfDay;

/// Minder — schedule reminders and get notified when they come due.
#[derive(Parser)]
#[command(name = "minder", version, about)]
struct Cli {
    /// Data directory (defaults to current directory).
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the background scan daemon.
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },

    /// Run a single due-check scan and exit.
    Tick,

    /// Add a reminder.
    Add {
        /// Reminder title.
        title: String,

        /// Longer text shown in the notification body.
        #[arg(long)]
        desc: Option<String>,

        /// Fire once at an absolute time (YYYY-MM-DD HH:MM, UTC).
        #[arg(long)]
        at: Option<String>,

        /// Fire on a fixed interval (e.g. 30m, 2h, 1d).
        #[arg(long)]
        every: Option<String>,

        /// Fire every day at HH:MM.
        #[arg(long)]
        daily: Option<TimeOfDay>,

        /// Fire on given weekdays at HH:MM (use with --days).
        #[arg(long)]
        weekly: Option<TimeOfDay>,

        /// Weekdays for --weekly (0 = Sunday .. 6 = Saturday).
        #[arg(long, value_delimiter = ',', requires = "weekly")]
        days: Vec<u8>,

        /// Fire monthly on a fixed day at HH:MM (use with --day).
        #[arg(long)]
        monthly: Option<TimeOfDay>,

        /// Day of month for --monthly.
        #[arg(long, requires = "monthly")]
        day: Option<u32>,

        /// Stop recurring after this time (YYYY-MM-DD HH:MM, UTC).
        /// Only valid with --every.
        #[arg(long, requires = "every")]
        until: Option<String>,
    },

    /// List pending reminders.
    List,

    /// Push an overdue reminder forward by a few minutes.
    Snooze {
        /// Reminder ID (or prefix).
        id: String,

        /// Minutes to push forward (defaults to the configured snooze).
        #[arg(long)]
        minutes: Option<i64>,
    },

    /// Acknowledge a due reminder, advancing or retiring it.
    Complete {
        /// Reminder ID (or prefix).
        id: String,
    },

    /// Cancel (delete) a reminder.
    Cancel {
        /// Reminder ID (or prefix).
        id: String,
    },

    /// Print the broadcast event log.
    Events,
}

#[derive(Subcommand)]
enum DaemonAction {
    /// Start the daemon (backgrounds by default).
    Start {
        /// Run in foreground instead of daemonizing.
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the running daemon.
    Stop,
    /// Restart the daemon.
    Restart,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let cwd = match &cli.dir {
        Some(d) => d.clone(),
        None => std::env::current_dir().wrap_err("failed to get current directory")?,
    };

    match cli.command {
        Command::Daemon { action } => match action {
            DaemonAction::Start { foreground } => daemon::start(&cwd, foreground).await,
            DaemonAction::Stop => daemon::stop(&cwd),
            DaemonAction::Restart => daemon::restart(&cwd).await,
        },
        Command::Tick => daemon::tick_once(&cwd).await,
        Command::Add {
            title,
            desc,
            at,
            every,
            daily,
            weekly,
            days,
            monthly,
            day,
            until,
        } => cmd_add(
            &cwd,
            &title,
            desc.as_deref(),
            AddSchedule {
                at: at.as_deref(),
                every: every.as_deref(),
                daily,
                weekly,
                days,
                monthly,
                day,
                until: until.as_deref(),
            },
        ),
        Command::List => cmd_list(&cwd),
        Command::Snooze { id, minutes } => cmd_snooze(&cwd, &id, minutes),
        Command::Complete { id } => cmd_complete(&cwd, &id),
        Command::Cancel { id } => cmd_cancel(&cwd, &id),
        Command::Events => cmd_events(&cwd),
    }
}

/// Schedule flags for `minder add`, exactly one of which must be set.
struct AddSchedule<'a> {
    at: Option<&'a str>,
    every: Option<&'a str>,
    daily: Option<TimeOfDay>,
    weekly: Option<TimeOfDay>,
    days: Vec<u8>,
    monthly: Option<TimeOfDay>,
    day: Option<u32>,
    until: Option<&'a str>,
}

/// Add a reminder to the store.
fn cmd_add(cwd: &Path, title: &str, desc: Option<&str>, sched: AddSchedule<'_>) -> Result<()> {
    let chosen = [
        sched.at.is_some(),
        sched.every.is_some(),
        sched.daily.is_some(),
        sched.weekly.is_some(),
        sched.monthly.is_some(),
    ]
    .iter()
    .filter(|&&set| set)
    .count();
    if chosen != 1 {
        color_eyre::eyre::bail!(
            "exactly one of --at, --every, --daily, --weekly, --monthly is required"
        );
    }

    let r = if let Some(at) = sched.at {
        let time = reminder::parse_at(at).map_err(|e| color_eyre::eyre::eyre!("{e}"))?;
        reminder::create_at(title, desc, time)
    } else if let Some(every) = sched.every {
        let (value, unit) = parse_interval(every).map_err(|e| color_eyre::eyre::eyre!("{e}"))?;
        let until = sched
            .until
            .map(reminder::parse_at)
            .transpose()
            .map_err(|e| color_eyre::eyre::eyre!("{e}"))?;
        reminder::create_interval(title, desc, value, unit, until)
    } else if let Some(time) = sched.daily {
        reminder::create_daily(title, desc, time)
    } else if let Some(time) = sched.weekly {
        reminder::create_weekly(title, desc, time, sched.days)
    } else if let Some(time) = sched.monthly {
        let day = sched
            .day
            .ok_or_else(|| color_eyre::eyre::eyre!("--monthly requires --day"))?;
        reminder::create_monthly(title, desc, time, day)
    } else {
        // Unreachable given the count check above.
        color_eyre::eyre::bail!("no schedule flag given");
    }
    .map_err(|e| color_eyre::eyre::eyre!("{e}"))?;

    let next_str = r
        .next_time()
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".into());
    let short_id = short_id(&r.id).to_owned();

    let mut store = ReminderStore::load(cwd)?;
    store.add(r);
    store.save()?;

    eprintln!("[reminder] Created reminder {short_id}: \"{title}\" due {next_str}");
    println!("Reminder set (ID: {short_id})");
    println!("Next due: {next_str}");
    Ok(())
}

/// List all pending reminders.
fn cmd_list(cwd: &Path) -> Result<()> {
    let store = ReminderStore::load(cwd)?;
    let active = store.active();
    eprintln!("[reminder] Listed {} active reminder(s)", active.len());
    println!("{}", reminder::format_reminder_list(&active));
    Ok(())
}

/// Resolve an ID prefix to a unique full reminder ID.
fn resolve_id(store: &ReminderStore, id_prefix: &str) -> Result<String> {
    let matches: Vec<&str> = store
        .reminders()
        .iter()
        .filter(|r| r.id.starts_with(id_prefix))
        .map(|r| r.id.as_str())
        .collect();
    match matches.len() {
        0 => color_eyre::eyre::bail!("no reminder found matching \"{id_prefix}\""),
        1 => Ok(matches[0].to_owned()),
        _ => {
            eprintln!("Multiple reminders match \"{id_prefix}\":");
            for id in &matches {
                eprintln!("  {}", short_id(id));
            }
            color_eyre::eyre::bail!("ambiguous reminder ID prefix");
        }
    }
}

/// Snooze an overdue reminder.
fn cmd_snooze(cwd: &Path, id_prefix: &str, minutes: Option<i64>) -> Result<()> {
    let config = DaemonConfig::load(cwd)?;
    let minutes = minutes.unwrap_or(config.snooze_minutes);
    if minutes <= 0 {
        color_eyre::eyre::bail!("snooze minutes must be positive");
    }

    let mut store = ReminderStore::load(cwd)?;
    let id = resolve_id(&store, id_prefix)?;
    let now = chrono::Utc::now();

    match engine::apply_action(store.reminders_mut(), &id, Action::Snooze { minutes }, now) {
        ActionOutcome::Snoozed { shifted } => {
            store.save()?;
            let short = short_id(&id);
            if shifted == 0 {
                println!("Reminder {short} has nothing overdue to snooze.");
                return Ok(());
            }
            let title = store
                .reminders()
                .iter()
                .find(|r| r.id == id)
                .map(|r| r.title.clone())
                .unwrap_or_default();
            broadcast(
                &config.resolved_events_path(cwd),
                &[WorkerEvent::new(EventKind::Snoozed, id.as_str(), title)
                    .with_detail(format!("snoozed {minutes} minutes"))],
            );
            eprintln!("[reminder] Snoozed {short} by {minutes} minute(s)");
            println!("Snoozed {short} for {minutes} minute(s).");
            Ok(())
        }
        ActionOutcome::NotFound => color_eyre::eyre::bail!("no reminder found matching \"{id}\""),
        other => color_eyre::eyre::bail!("unexpected snooze outcome: {other:?}"),
    }
}

/// Complete a reminder, advancing recurring schedules or retiring it.
fn cmd_complete(cwd: &Path, id_prefix: &str) -> Result<()> {
    let config = DaemonConfig::load(cwd)?;
    let mut store = ReminderStore::load(cwd)?;
    let id = resolve_id(&store, id_prefix)?;
    let now = chrono::Utc::now();

    let outcome = engine::apply_action(store.reminders_mut(), &id, Action::Complete, now);
    store.save()?;

    let short = short_id(&id);
    let title = store
        .reminders()
        .iter()
        .find(|r| r.id == id)
        .map(|r| r.title.clone())
        .unwrap_or_default();
    let detail = match &outcome {
        ActionOutcome::Completed => "retired".to_owned(),
        ActionOutcome::Rescheduled { remaining } => {
            format!("rescheduled, {remaining} occurrence(s) pending")
        }
        ActionOutcome::NotFound => {
            color_eyre::eyre::bail!("no reminder found matching \"{id}\"")
        }
        other => color_eyre::eyre::bail!("unexpected complete outcome: {other:?}"),
    };
    broadcast(
        &config.resolved_events_path(cwd),
        &[WorkerEvent::new(EventKind::Completed, id.as_str(), title).with_detail(detail.clone())],
    );

    eprintln!("[reminder] Completed {short} ({detail})");
    match outcome {
        ActionOutcome::Completed => println!("Completed {short}. Nothing further scheduled."),
        ActionOutcome::Rescheduled { .. } => println!("Completed {short}. Next occurrence scheduled."),
        _ => {}
    }
    Ok(())
}

/// Cancel a reminder by ID prefix.
fn cmd_cancel(cwd: &Path, id_prefix: &str) -> Result<()> {
    let mut store = ReminderStore::load(cwd)?;

    match store.cancel(id_prefix) {
        Ok(id) => {
            store.save()?;
            let short = short_id(&id);
            eprintln!("[reminder] Cancelled reminder {short}");
            println!("Cancelled reminder {short}.");
            Ok(())
        }
        Err(CancelError::NotFound) => {
            color_eyre::eyre::bail!("no reminder found matching \"{id_prefix}\"");
        }
        Err(CancelError::Ambiguous(ids)) => {
            eprintln!("Multiple reminders match \"{id_prefix}\":");
            for id in &ids {
                eprintln!("  {}", short_id(id));
            }
            color_eyre::eyre::bail!("ambiguous reminder ID prefix");
        }
    }
}

/// Print the broadcast event log.
fn cmd_events(cwd: &Path) -> Result<()> {
    let config = DaemonConfig::load(cwd)?;
    let mut reader = JsonlReader::<WorkerEvent>::new(&config.resolved_events_path(cwd));
    let events = reader.poll()?;

    if events.is_empty() {
        println!("No events.");
        return Ok(());
    }
    for event in &events {
        let detail = event
            .detail
            .as_deref()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        println!(
            "{} {} {} \"{}\"{detail}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.kind,
            short_id(&event.reminder_id),
            event.title,
        );
    }
    Ok(())
}
