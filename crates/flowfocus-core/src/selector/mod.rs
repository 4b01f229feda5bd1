//! Next-task selection.
//!
//! Picks exactly one task to work on now from the owner's incomplete tasks,
//! the day's snapshot (if any) and the current instant. The decision policy
//! is layered; the first applicable branch wins:
//!
//! 1. No incomplete tasks: [`TaskSelection::NoTasks`].
//! 2. No snapshot: priority-only ranking `(rank, created_at)`.
//! 3. Snapshot with events and one still ahead: prefer the best task that
//!    fits before it, otherwise the shortest task with a warning.
//! 4. Snapshot with no upcoming event (none at all, or all in the past):
//!    best task that fits in `available_minutes`, otherwise priority-only.
//!
//! "Best" means `(rank, -duration)`: higher priority first, then longer work.
//! Every ranking keeps input order among exact ties.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::CalendarEvent;
use crate::snapshot::DailySnapshot;
use crate::task::Task;

/// Outcome of a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskSelection {
    Selected {
        task: Task,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
        reason: SelectionReason,
    },
    NoTasks,
}

impl TaskSelection {
    pub fn task(&self) -> Option<&Task> {
        match self {
            TaskSelection::Selected { task, .. } => Some(task),
            TaskSelection::NoTasks => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            TaskSelection::Selected { warning, .. } => warning.as_deref(),
            TaskSelection::NoTasks => None,
        }
    }
}

/// Which branch of the policy produced the pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionReason {
    /// Fits in the gap before the next meeting
    FitsBeforeNextEvent { minutes_until_next: i64 },
    /// Nothing fits before the next meeting; shortest task offered instead
    ShortestBeforeNextEvent { minutes_until_next: i64 },
    /// Fits in the day's remaining available time
    FitsAvailableTime { available_minutes: u32 },
    /// Ranked by priority and age only
    PriorityOnly,
}

/// Select the next task to work on.
///
/// Pure: performs no I/O and reads time only through `now`. Completed tasks
/// in `tasks` are ignored.
pub fn select_next_task(
    tasks: &[Task],
    snapshot: Option<&DailySnapshot>,
    now: DateTime<Utc>,
) -> TaskSelection {
    let open: Vec<&Task> = tasks.iter().filter(|t| !t.completed).collect();
    if open.is_empty() {
        return TaskSelection::NoTasks;
    }

    let Some(snapshot) = snapshot else {
        tracing::debug!("no snapshot for today; ranking by priority");
        return priority_only(&open);
    };

    if let Some(next) = next_upcoming_event(&snapshot.events, now) {
        let minutes_until_next = (next.start.with_timezone(&Utc) - now).num_minutes();
        tracing::debug!(
            next_event = %next.summary,
            minutes_until_next,
            "ranking tasks against next meeting"
        );

        if let Some(task) = best_fitting(&open, minutes_until_next) {
            return selected(task, None, SelectionReason::FitsBeforeNextEvent { minutes_until_next });
        }

        // `min_by_key` keeps the first of equally short tasks.
        if let Some(shortest) = open.iter().min_by_key(|t| t.duration_minutes) {
            let warning = format!(
                "No tasks fit in {minutes_until_next} minutes until next meeting. Showing shortest task."
            );
            return selected(
                shortest,
                Some(warning),
                SelectionReason::ShortestBeforeNextEvent { minutes_until_next },
            );
        }
    }

    let available = snapshot.available_minutes;
    if let Some(task) = best_fitting(&open, i64::from(available)) {
        return selected(
            task,
            None,
            SelectionReason::FitsAvailableTime {
                available_minutes: available,
            },
        );
    }

    priority_only(&open)
}

/// Earliest event starting strictly after `now`; the first one listed wins
/// a tie.
fn next_upcoming_event(events: &[CalendarEvent], now: DateTime<Utc>) -> Option<&CalendarEvent> {
    let mut next: Option<&CalendarEvent> = None;
    for event in events {
        let start = event.start.with_timezone(&Utc);
        if start <= now {
            continue;
        }
        match next {
            Some(current) if current.start.with_timezone(&Utc) <= start => {}
            _ => next = Some(event),
        }
    }
    next
}

/// Highest-priority, then longest, task with `duration <= limit`.
fn best_fitting<'a>(tasks: &[&'a Task], limit_minutes: i64) -> Option<&'a Task> {
    tasks
        .iter()
        .filter(|t| i64::from(t.duration_minutes) <= limit_minutes)
        .min_by_key(|t| (t.priority.rank(), Reverse(t.duration_minutes)))
        .copied()
}

fn priority_only(tasks: &[&Task]) -> TaskSelection {
    match tasks
        .iter()
        .min_by_key(|t| (t.priority.rank(), t.created_at))
    {
        Some(task) => selected(task, None, SelectionReason::PriorityOnly),
        None => TaskSelection::NoTasks,
    }
}

fn selected(task: &Task, warning: Option<String>, reason: SelectionReason) -> TaskSelection {
    TaskSelection::Selected {
        task: task.clone(),
        warning,
        reason,
    }
}
