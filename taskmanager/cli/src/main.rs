use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use taskmanager_core::query;
use taskmanager_core::{
    normalize_title, readable_date, MemoryAlerts, Priority, ReminderScheduler, StoreError, Task,
    TaskFilter, TaskRepository,
};
use uuid::Uuid;

const TASKS_FILE: &str = "tasks.json";
const ALERTS_FILE: &str = "alerts.json";

#[derive(Parser, Debug)]
#[command(name = "taskmanager", about = "Personal task manager with due-date reminders")]
struct Cli {
    /// Directory holding the task and alert snapshots
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Create a task and schedule its reminder
    Add {
        title: String,
        /// Due date, RFC 3339 or "YYYY-MM-DD HH:MM" (UTC)
        #[arg(long)]
        due: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_enum, default_value = "low")]
        priority: PriorityArg,
    },
    /// Edit a task's fields; unset fields keep their current value
    Edit {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
    },
    /// Flip a task between completed and incomplete
    Toggle { id: Uuid },
    /// Delete a task and cancel its reminder
    Remove { id: Uuid },
    /// List tasks sorted by due date
    List {
        #[arg(long, value_enum, default_value = "all")]
        filter: FilterArg,
    },
    /// Show tasks grouped by calendar day
    Calendar,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Incomplete,
    Completed,
}

impl From<FilterArg> for TaskFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => TaskFilter::All,
            FilterArg::Incomplete => TaskFilter::Incomplete,
            FilterArg::Completed => TaskFilter::Completed,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let tasks_path = cli.data_dir.join(TASKS_FILE);
    let alerts_path = cli.data_dir.join(ALERTS_FILE);

    let mut repo = load_repository(&tasks_path);
    let mut scheduler = ReminderScheduler::new(load_alerts(&alerts_path));

    // Startup: ask for alert permission (logged only), then prune reminders
    // for tasks that have become overdue.
    scheduler.request_permission();
    scheduler.reconcile_all(&repo.fetch_all());
    tracing::debug!("startup reconcile complete");

    match cli.command {
        Commands::Add {
            title,
            due,
            description,
            priority,
        } => {
            let title = normalize_title(&title)?;
            let due = parse_due(&due)?;
            let task = repo.create(title, description, due, priority.into());
            scheduler.schedule(&task);
            println!("Task added with ID {}", task.id);
        }
        Commands::Edit {
            id,
            title,
            description,
            due,
            priority,
        } => {
            let current = repo.get(id).ok_or(StoreError::TaskNotFound(id))?.clone();
            let title = normalize_title(title.as_deref().unwrap_or(&current.title))?;
            let description = description.unwrap_or(current.description);
            let due = match due {
                Some(raw) => parse_due(&raw)?,
                None => current.due_date,
            };
            let priority = priority.map(Priority::from).unwrap_or(current.priority);

            let task = repo.update(id, title, description, due, priority)?;
            scheduler.update(&task);
            println!("Task updated.");
        }
        Commands::Toggle { id } => {
            let task = repo.toggle_completion(id)?;
            scheduler.update(&task);
            if task.is_completed {
                println!("Task marked as completed.");
            } else {
                println!("Task marked as incomplete.");
            }
        }
        Commands::Remove { id } => {
            let task = repo.delete(id)?;
            scheduler.cancel(&task);
            println!("Task removed.");
        }
        Commands::List { filter } => {
            let tasks = query::filter_and_sort(repo.fetch_all(), filter.into());
            if tasks.is_empty() {
                println!("No tasks yet.");
            }
            for task in &tasks {
                println!("{}", list_line(task));
            }
        }
        Commands::Calendar => {
            let by_day = query::group_by_day(&repo.fetch_all());
            if by_day.is_empty() {
                println!("No tasks yet.");
            }
            let mut days: Vec<&String> = by_day.keys().collect();
            days.sort();
            for day in days {
                println!("{day}");
                for task in &by_day[day] {
                    println!(
                        "  {}  {}  [{}]",
                        task.due_date.format("%H:%M"),
                        task.title,
                        task.priority
                    );
                }
            }
        }
    }

    save_repository(&repo, &tasks_path);
    save_alerts(scheduler.backend(), &alerts_path);

    Ok(())
}

fn list_line(task: &Task) -> String {
    format!(
        "{}  [{}] {}  due {}  {}",
        task.id,
        task.priority,
        task.title,
        readable_date(task.due_date),
        task.status_label()
    )
}

fn parse_due(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .with_context(|| format!("unrecognized due date '{raw}'; use RFC 3339 or YYYY-MM-DD HH:MM"))?;
    Ok(naive.and_utc())
}

fn load_repository(path: &Path) -> TaskRepository {
    if !path.exists() {
        return TaskRepository::default();
    }
    let contents = fs::read_to_string(path).expect("cannot read file that currently exists");
    TaskRepository::new_from_json(&contents)
}

fn save_repository(repo: &TaskRepository, path: &Path) {
    let file = open_truncated(path);
    repo.save_as_json(file);
}

fn load_alerts(path: &Path) -> MemoryAlerts {
    if !path.exists() {
        return MemoryAlerts::default();
    }
    let contents = fs::read_to_string(path).expect("cannot read file that currently exists");
    MemoryAlerts::new_from_json(&contents)
}

fn save_alerts(alerts: &MemoryAlerts, path: &Path) {
    let file = open_truncated(path);
    alerts.save_as_json(file);
}

fn open_truncated(path: &Path) -> fs::File {
    OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(path)
        .expect("cannot open file")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_due_accepts_rfc3339() {
        let ts = parse_due("2025-06-01T09:30:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn parse_due_accepts_simple_format_as_utc() {
        let ts = parse_due("2025-06-01 09:30").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn parse_due_rejects_garbage() {
        let err = parse_due("tomorrowish").unwrap_err();
        assert!(err.to_string().contains("unrecognized due date"));
    }
}
