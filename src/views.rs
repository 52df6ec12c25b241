//! Board and calendar groupings over the task collection.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::model::{Task, TaskPriority, TaskStatus};

/// One kanban column.
#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn<'a> {
    pub status: TaskStatus,
    pub tasks: Vec<&'a Task>,
}

/// Group tasks into one column per status, in status order. A task lands in
/// the column of its effective status, so past-due open tasks show as OVERDUE.
pub fn board<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: NaiveDateTime) -> Vec<BoardColumn<'a>> {
    let mut columns: Vec<BoardColumn<'a>> = TaskStatus::ALL
        .iter()
        .map(|status| BoardColumn {
            status: *status,
            tasks: Vec::new(),
        })
        .collect();

    for task in tasks {
        let status = task.effective_status(now);
        if let Some(column) = columns.iter_mut().find(|column| column.status == status) {
            column.tasks.push(task);
        }
    }

    columns
}

/// Tasks due on one calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay<'a> {
    pub date: NaiveDate,
    pub high_priority: usize,
    pub overdue: usize,
    pub tasks: Vec<&'a Task>,
}

/// Group dated tasks by local due date, optionally bounded (inclusive).
pub fn calendar<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    now: NaiveDateTime,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<CalendarDay<'a>> {
    let mut days: BTreeMap<NaiveDate, CalendarDay<'a>> = BTreeMap::new();

    for task in tasks {
        let Some(due) = task.due_date else {
            continue;
        };
        let date = due.date();
        if from.is_some_and(|from| date < from) || to.is_some_and(|to| date > to) {
            continue;
        }

        let day = days.entry(date).or_insert_with(|| CalendarDay {
            date,
            high_priority: 0,
            overdue: 0,
            tasks: Vec::new(),
        });
        if task.priority == TaskPriority::High {
            day.high_priority += 1;
        }
        if task.is_overdue(now) {
            day.overdue += 1;
        }
        day.tasks.push(task);
    }

    for day in days.values_mut() {
        day.tasks
            .sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
    }

    days.into_values().collect()
}
