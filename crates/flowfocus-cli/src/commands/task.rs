//! Task management commands for CLI.

use clap::Subcommand;
use flowfocus_core::{
    next_task, Clock, Config, CoreError, Database, NewTask, Priority, SystemClock, Task,
    TaskPatch, TaskSelection,
};

use super::{print_json, resolve_day, resolve_owner, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Estimated duration in minutes
        #[arg(long, default_value_t = flowfocus_core::task::DEFAULT_DURATION_MINUTES)]
        duration: u32,
        /// Priority: High, Medium or Low
        #[arg(long, default_value = "Medium")]
        priority: String,
    },
    /// List tasks, newest first
    List {
        /// Only incomplete tasks
        #[arg(long)]
        pending: bool,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New duration in minutes
        #[arg(long)]
        duration: Option<u32>,
        /// New priority
        #[arg(long)]
        priority: Option<String>,
        /// Set completed status
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Mark a task completed
    Complete {
        /// Task ID
        id: String,
    },
    /// Mark a task not completed
    Reopen {
        /// Task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Suggest the task to work on now
    Next {
        /// Day whose calendar snapshot to use (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
}

fn load_task(db: &Database, owner: &str, id: &str) -> Result<Task, CoreError> {
    db.get_task(owner, id)?
        .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))
}

fn patch_and_store(db: &Database, owner: &str, id: &str, patch: TaskPatch, clock: &dyn Clock) -> CliResult {
    let mut task = load_task(db, owner, id)?;
    task.apply(patch, clock.now())?;
    db.update_task(&task)?;
    print_json(&task)
}

pub fn run(action: TaskAction, owner: Option<&str>) -> CliResult {
    let config = Config::load_or_default();
    let owner = resolve_owner(&config, owner)?;
    let db = Database::open()?;
    let clock = SystemClock;

    match action {
        TaskAction::Create {
            title,
            description,
            duration,
            priority,
        } => {
            let mut draft = NewTask::new(title)
                .with_duration(duration)
                .with_priority(priority.parse::<Priority>()?);
            if let Some(d) = description {
                draft = draft.with_description(d);
            }
            let task = Task::new(&owner, draft, clock.now())?;
            db.create_task(&task)?;
            tracing::info!(id = %task.id, %owner, "task created");
            print_json(&task)?;
        }
        TaskAction::List { pending } => {
            let tasks = if pending {
                db.list_incomplete_tasks(&owner)?
            } else {
                db.list_tasks(&owner)?
            };
            print_json(&tasks)?;
        }
        TaskAction::Get { id } => {
            print_json(&load_task(&db, &owner, &id)?)?;
        }
        TaskAction::Update {
            id,
            title,
            description,
            duration,
            priority,
            completed,
        } => {
            let patch = TaskPatch {
                title,
                description,
                duration_minutes: duration,
                priority: priority.map(|p| p.parse::<Priority>()).transpose()?,
                completed,
            };
            patch_and_store(&db, &owner, &id, patch, &clock)?;
        }
        TaskAction::Complete { id } => {
            let patch = TaskPatch {
                completed: Some(true),
                ..Default::default()
            };
            patch_and_store(&db, &owner, &id, patch, &clock)?;
        }
        TaskAction::Reopen { id } => {
            let patch = TaskPatch {
                completed: Some(false),
                ..Default::default()
            };
            patch_and_store(&db, &owner, &id, patch, &clock)?;
        }
        TaskAction::Delete { id } => {
            db.delete_task(&owner, &id)?;
            println!("Task deleted: {id}");
        }
        TaskAction::Next { date } => {
            let day = resolve_day(&config, date.as_deref(), &clock)?;
            let selection = next_task(&db, &owner, day, &clock)?;
            if selection == TaskSelection::NoTasks {
                return Err("No incomplete tasks".into());
            }
            print_json(&selection)?;
        }
    }
    Ok(())
}
