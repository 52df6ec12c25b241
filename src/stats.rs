//! Dashboard aggregates, recomputed by a full scan on every call.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Task, TaskPriority, TaskStatus};
use crate::time::minutes_between;

/// Longest trend window, in days
pub const MAX_TREND_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    pub high_priority_tasks: usize,
    /// Mean minutes from creation to completion; `None` without completed tasks
    pub average_completion_time: Option<f64>,
    /// Focus minutes for sessions starting or ending today
    pub focus_time_today: i64,
    pub tasks_by_status: BTreeMap<TaskStatus, usize>,
    pub tasks_by_priority: BTreeMap<TaskPriority, usize>,
    pub tasks_by_tag: BTreeMap<String, usize>,
}

impl TaskStats {
    /// Completed share of all tasks, rounded percent
    pub fn completion_rate(&self) -> u32 {
        percent(self.completed_tasks, self.total_tasks)
    }

    /// Overdue share of all tasks, rounded percent
    pub fn overdue_rate(&self) -> u32 {
        percent(self.overdue_tasks, self.total_tasks)
    }
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

pub fn compute<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: NaiveDateTime) -> TaskStats {
    let today = now.date();

    let mut tasks_by_status: BTreeMap<TaskStatus, usize> =
        TaskStatus::ALL.iter().map(|status| (*status, 0)).collect();
    let mut tasks_by_priority: BTreeMap<TaskPriority, usize> =
        TaskPriority::ALL.iter().map(|priority| (*priority, 0)).collect();
    let mut tasks_by_tag: BTreeMap<String, usize> = BTreeMap::new();

    let mut total_tasks = 0;
    let mut overdue_tasks = 0;
    let mut completion_minutes: i64 = 0;
    let mut completion_count: usize = 0;
    let mut focus_time_today: i64 = 0;

    for task in tasks {
        total_tasks += 1;
        *tasks_by_status.entry(task.status).or_insert(0) += 1;
        *tasks_by_priority.entry(task.priority).or_insert(0) += 1;
        for tag in &task.tags {
            *tasks_by_tag.entry(tag.clone()).or_insert(0) += 1;
        }

        if task.is_overdue(now) {
            overdue_tasks += 1;
        }

        if task.status == TaskStatus::Completed {
            if let Some(completed_at) = task.completed_at {
                completion_minutes += minutes_between(&task.created_at, &completed_at);
                completion_count += 1;
            }
        }

        for session in task.focus_sessions() {
            if session.start_time.date() == today || session.end_time.date() == today {
                focus_time_today += session.minutes();
            }
        }
    }

    let average_completion_time = if completion_count > 0 {
        Some(completion_minutes as f64 / completion_count as f64)
    } else {
        None
    };

    TaskStats {
        total_tasks,
        completed_tasks: tasks_by_status[&TaskStatus::Completed],
        overdue_tasks,
        high_priority_tasks: tasks_by_priority[&TaskPriority::High],
        average_completion_time,
        focus_time_today,
        tasks_by_status,
        tasks_by_priority,
        tasks_by_tag,
    }
}

/// Tasks created and completed on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub created: usize,
    pub completed: usize,
}

/// Daily created/completed counts for the `days` days ending `today`, oldest first.
///
/// `days` above [`MAX_TREND_DAYS`], or a window reaching past the calendar
/// range, is an [`Error::InvalidArgument`].
pub fn trend<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    today: NaiveDate,
    days: u32,
) -> Result<Vec<TrendPoint>> {
    if days == 0 {
        return Ok(Vec::new());
    }
    if days > MAX_TREND_DAYS {
        return Err(Error::InvalidArgument(format!(
            "trend window of {days} days exceeds {MAX_TREND_DAYS}"
        )));
    }
    let start = today
        .checked_sub_signed(Duration::days(i64::from(days - 1)))
        .ok_or_else(|| {
            Error::InvalidArgument(format!("trend window of {days} days is out of range"))
        })?;
    let mut points: Vec<TrendPoint> = (0..days)
        .map(|offset| TrendPoint {
            date: start + Duration::days(i64::from(offset)),
            created: 0,
            completed: 0,
        })
        .collect();

    let slot = |date: NaiveDate| -> Option<usize> {
        if date < start || date > today {
            return None;
        }
        usize::try_from((date - start).num_days()).ok()
    };

    for task in tasks {
        if let Some(index) = slot(task.created_at.date()) {
            points[index].created += 1;
        }
        if let Some(index) = task.completed_at.and_then(|at| slot(at.date())) {
            points[index].completed += 1;
        }
    }

    Ok(points)
}
