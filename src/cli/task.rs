//! `taskdeck task` commands.

use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::cli::{load_context, GlobalOptions};
use crate::error::{Error, Result};
use crate::filter::{self, SortKey, SortOrder, TaskFilter};
use crate::model::{NewTask, RepeatType, Task, TaskPatch, TaskPriority, TaskStatus, TaskTree};
use crate::output::{emit_success, HumanOutput};
use crate::time::{format_stamp, parse_stamp};

pub struct AddOptions {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tags: Vec<String>,
    pub due: Option<String>,
    pub estimate: Option<u32>,
    pub assignee: Option<String>,
    pub parent: Option<String>,
    pub repeat: Option<String>,
    pub global: GlobalOptions,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<Vec<String>>,
    pub due: Option<Option<String>>,
    pub estimate: Option<Option<u32>>,
    pub assignee: Option<Option<String>>,
    pub repeat: Option<Option<String>>,
    pub global: GlobalOptions,
}

pub struct IdOptions {
    pub id: String,
    pub global: GlobalOptions,
}

pub struct StatusOptions {
    pub id: String,
    pub status: String,
    pub global: GlobalOptions,
}

pub struct PriorityOptions {
    pub id: String,
    pub priority: String,
    pub global: GlobalOptions,
}

pub struct FocusOptions {
    pub id: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub minutes: Option<u32>,
    pub global: GlobalOptions,
}

pub struct ListOptions {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tag: Option<String>,
    pub due_before: Option<String>,
    pub due_after: Option<String>,
    pub sort: String,
    pub desc: bool,
    pub all: bool,
    pub global: GlobalOptions,
}

pub struct SelectOptions {
    pub id: Option<String>,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct TaskCreatedOutput {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
}

#[derive(Serialize)]
struct TaskDeletedOutput<'a> {
    id: &'a str,
    removed: usize,
}

#[derive(Serialize)]
struct TaskDetailsOutput<'a> {
    task: &'a Task,
    overdue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<&'a Task>,
    children: Vec<&'a Task>,
}

#[derive(Serialize)]
struct TaskSelectionOutput {
    selected_task_id: Option<String>,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut ctx = load_context(&options.global)?;
    let status = match options.status.as_deref() {
        Some(value) => TaskStatus::from_str(value)?,
        None => ctx.config.tasks.default_status()?,
    };
    let priority = match options.priority.as_deref() {
        Some(value) => TaskPriority::from_str(value)?,
        None => ctx.config.tasks.default_priority()?,
    };

    let mut new = NewTask::new(options.title, status, priority);
    new.description = options.description;
    new.tags = options.tags;
    new.due_date = options.due.as_deref().map(parse_stamp).transpose()?;
    new.estimated_time = options.estimate;
    new.assignee = options.assignee;
    new.repeat_type = options
        .repeat
        .as_deref()
        .map(RepeatType::from_str)
        .transpose()?;

    let id = match options.parent.as_deref() {
        Some(parent) => ctx.store.add_subtask(parent, new)?,
        None => ctx.store.add_task(new)?,
    };

    let output = TaskCreatedOutput {
        id: id.clone(),
        parent_id: options.parent.clone(),
        status,
        priority,
    };

    let mut human = HumanOutput::new("Task created");
    human.push_summary("ID", id);
    if let Some(parent) = options.parent {
        human.push_summary("Parent", parent);
    }
    human.push_summary("Status", status.as_str());
    human.push_summary("Priority", priority.as_str());

    ctx.finish()?;
    emit_success(options.global.output(), "task add", &output, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut ctx = load_context(&options.global)?;

    let patch = TaskPatch {
        title: options.title,
        description: options.description,
        status: options
            .status
            .as_deref()
            .map(TaskStatus::from_str)
            .transpose()?,
        priority: options
            .priority
            .as_deref()
            .map(TaskPriority::from_str)
            .transpose()?,
        tags: options.tags,
        due_date: options
            .due
            .map(|due| due.as_deref().map(parse_stamp).transpose())
            .transpose()?,
        estimated_time: options.estimate,
        assignee: options.assignee,
        repeat_type: options
            .repeat
            .map(|repeat| repeat.as_deref().map(RepeatType::from_str).transpose())
            .transpose()?,
        ..TaskPatch::default()
    };
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to change: pass at least one field flag".to_string(),
        ));
    }

    ctx.store.update_task(&options.id, patch)?;
    let task = ctx.store.require_task(&options.id)?.clone();

    let mut human = HumanOutput::new("Task updated");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.as_str());
    human.push_summary("Priority", task.priority.as_str());

    ctx.finish()?;
    emit_success(options.global.output(), "task edit", &task, Some(&human))
}

pub fn run_rm(options: IdOptions) -> Result<()> {
    let mut ctx = load_context(&options.global)?;
    let removed = ctx.store.delete_task(&options.id)?;

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", options.id.clone());
    human.push_summary("Removed", removed.to_string());

    ctx.finish()?;
    emit_success(
        options.global.output(),
        "task rm",
        &TaskDeletedOutput {
            id: &options.id,
            removed,
        },
        Some(&human),
    )
}

pub fn run_done(options: IdOptions) -> Result<()> {
    let mut ctx = load_context(&options.global)?;
    ctx.store.mark_task_as_complete(&options.id)?;
    let task = ctx.store.require_task(&options.id)?.clone();

    let mut human = HumanOutput::new("Task completed");
    human.push_summary("ID", task.id.clone());
    if let Some(completed_at) = &task.completed_at {
        human.push_summary("Completed at", format_stamp(completed_at));
    }

    ctx.finish()?;
    emit_success(options.global.output(), "task done", &task, Some(&human))
}

pub fn run_status(options: StatusOptions) -> Result<()> {
    let status = TaskStatus::from_str(&options.status)?;
    let mut ctx = load_context(&options.global)?;
    ctx.store.change_task_status(&options.id, status)?;
    let task = ctx.store.require_task(&options.id)?.clone();

    let mut human = HumanOutput::new("Task status changed");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Status", status.as_str());

    ctx.finish()?;
    emit_success(options.global.output(), "task status", &task, Some(&human))
}

pub fn run_priority(options: PriorityOptions) -> Result<()> {
    let priority = TaskPriority::from_str(&options.priority)?;
    let mut ctx = load_context(&options.global)?;
    ctx.store.update_task_priority(&options.id, priority)?;
    let task = ctx.store.require_task(&options.id)?.clone();

    let mut human = HumanOutput::new("Task priority changed");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Priority", priority.as_str());

    ctx.finish()?;
    emit_success(options.global.output(), "task priority", &task, Some(&human))
}

pub fn run_focus(options: FocusOptions) -> Result<()> {
    let mut ctx = load_context(&options.global)?;
    let now = ctx.store.now();
    let (start, end) = focus_window(
        now,
        options.start.as_deref(),
        options.end.as_deref(),
        options.minutes,
    )?;
    ctx.store.add_task_focus_session(&options.id, start, end)?;
    let task = ctx.store.require_task(&options.id)?.clone();

    let total: i64 = task.focus_sessions().iter().map(|s| s.minutes()).sum();
    let mut human = HumanOutput::new("Focus session recorded");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Session", format!("{} - {}", format_stamp(&start), format_stamp(&end)));
    human.push_summary("Total focus", format!("{total} min"));

    ctx.finish()?;
    emit_success(options.global.output(), "task focus", &task, Some(&human))
}

fn focus_window(
    now: NaiveDateTime,
    start: Option<&str>,
    end: Option<&str>,
    minutes: Option<u32>,
) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let end = end.map(parse_stamp).transpose()?.unwrap_or(now);
    let start = match (start, minutes) {
        (Some(start), _) => parse_stamp(start)?,
        (None, Some(minutes)) => end - Duration::minutes(i64::from(minutes)),
        (None, None) => {
            return Err(Error::InvalidArgument(
                "focus session needs --start or --minutes".to_string(),
            ))
        }
    };
    Ok((start, end))
}

pub fn run_show(options: IdOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let now = ctx.store.now();
    let task = ctx.store.require_task(&options.id)?;
    let parent = ctx.store.get_task_parent(&options.id)?;
    let children = ctx.store.get_task_children(&options.id)?;

    let mut human = HumanOutput::new(format!("Task {}", task.id));
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.effective_status(now).as_str());
    human.push_summary("Priority", task.priority.as_str());
    if let Some(description) = &task.description {
        human.push_summary("Description", description.clone());
    }
    if let Some(due) = &task.due_date {
        human.push_summary("Due", format_stamp(due));
    }
    if let Some(estimate) = task.estimated_time {
        human.push_summary("Estimate", format!("{estimate} min"));
    }
    if let Some(assignee) = &task.assignee {
        human.push_summary("Assignee", assignee.clone());
    }
    if !task.tags.is_empty() {
        let names: Vec<String> = task
            .tags
            .iter()
            .map(|id| {
                ctx.store
                    .get_tag(id)
                    .map(|tag| tag.name.clone())
                    .unwrap_or_else(|| id.clone())
            })
            .collect();
        human.push_summary("Tags", names.join(", "));
    }
    if let Some(parent) = parent {
        human.push_summary("Parent", format!("{} {}", parent.id, parent.title));
    }
    human.push_summary("Created", format_stamp(&task.created_at));
    human.push_summary("Updated", format_stamp(&task.updated_at));
    if let Some(completed_at) = &task.completed_at {
        human.push_summary("Completed", format_stamp(completed_at));
    }
    for child in &children {
        human.push_detail(task_line(child, now));
    }

    let output = TaskDetailsOutput {
        task,
        overdue: task.is_overdue(now),
        parent,
        children,
    };
    emit_success(options.global.output(), "task show", &output, Some(&human))
}

pub fn run_tree(options: IdOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let now = ctx.store.now();
    let tree = ctx.store.get_task_tree(&options.id)?;

    let mut human = HumanOutput::new(format!("Task tree ({} tasks)", tree.size()));
    for line in tree_lines(&tree, now) {
        human.push_detail(line);
    }
    emit_success(options.global.output(), "task tree", &tree, Some(&human))
}

/// Indented one-line rendering of a tree, depth-first
fn tree_lines(tree: &TaskTree, now: NaiveDateTime) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack = vec![(tree, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        lines.push(format!("{}{}", "  ".repeat(depth), task_line(&node.task, now)));
        for child in node.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    lines
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let now = ctx.store.now();
    let list = filter::ListOptions {
        filter: TaskFilter {
            status: options
                .status
                .as_deref()
                .map(TaskStatus::from_str)
                .transpose()?,
            priority: options
                .priority
                .as_deref()
                .map(TaskPriority::from_str)
                .transpose()?,
            tag: options.tag,
            due_before: options.due_before.as_deref().map(parse_stamp).transpose()?,
            due_after: options.due_after.as_deref().map(parse_stamp).transpose()?,
        },
        sort: SortKey::from_str(&options.sort)?,
        order: if options.desc {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        },
        show_completed: options.all,
    };
    let tasks = ctx.store.list_tasks(&list);

    let mut human = HumanOutput::new(format!("Tasks ({})", tasks.len()));
    for task in &tasks {
        human.push_detail(task_line(task, now));
    }
    if tasks.is_empty() && ctx.store.task_count() == 0 {
        human.push_next_step("taskdeck task add \"<title>\"");
    }
    emit_success(options.global.output(), "task list", &tasks, Some(&human))
}

pub fn run_select(options: SelectOptions) -> Result<()> {
    let mut ctx = load_context(&options.global)?;
    ctx.store.select_task(options.id.as_deref())?;

    let header = match &options.id {
        Some(id) => format!("Selected task {id}"),
        None => "Selection cleared".to_string(),
    };
    let human = HumanOutput::new(header);

    ctx.finish()?;
    emit_success(
        options.global.output(),
        "task select",
        &TaskSelectionOutput {
            selected_task_id: options.id,
        },
        Some(&human),
    )
}

/// `<id> [STATUS] PRIORITY title (due ...)`
pub(crate) fn task_line(task: &Task, now: NaiveDateTime) -> String {
    let mut line = format!(
        "{} [{}] {} {}",
        task.id,
        task.effective_status(now),
        task.priority,
        task.title
    );
    if let Some(due) = &task.due_date {
        line.push_str(&format!(" (due {})", format_stamp(due)));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn focus_window_from_minutes_ends_now() {
        let (start, end) = focus_window(at(10, 0), None, None, Some(25)).unwrap();
        assert_eq!(start, at(9, 35));
        assert_eq!(end, at(10, 0));
    }

    #[test]
    fn focus_window_needs_a_start() {
        assert!(matches!(
            focus_window(at(10, 0), None, None, None),
            Err(Error::InvalidArgument(_))
        ));
        let (start, end) =
            focus_window(at(10, 0), Some("2024-02-01T08:00"), Some("2024-02-01T08:30"), None).unwrap();
        assert_eq!((start, end), (at(8, 0), at(8, 30)));
    }
}
