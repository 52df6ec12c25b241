//! Records held by the task store.
//!
//! Field names serialize in camelCase and enum values in SCREAMING_SNAKE_CASE
//! to match the snapshot layout other tools already read.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::time::{stamp, stamp_opt};

macro_rules! string_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
                match normalized.as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(Error::InvalidArgument(format!(
                        "invalid {} '{}': expected one of {}",
                        $label,
                        s.trim(),
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }
    };
}

/// Task lifecycle state. Any state may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Paused,
    Completed,
    Overdue,
    Cancelled,
}

string_enum!(TaskStatus, "status", {
    Todo => "TODO",
    InProgress => "IN_PROGRESS",
    Paused => "PAUSED",
    Completed => "COMPLETED",
    Overdue => "OVERDUE",
    Cancelled => "CANCELLED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

string_enum!(TaskPriority, "priority", {
    High => "HIGH",
    Medium => "MEDIUM",
    Low => "LOW",
});

impl TaskPriority {
    /// Sort rank, most urgent first
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::High => 0,
            TaskPriority::Medium => 1,
            TaskPriority::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepeatType {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

string_enum!(RepeatType, "repeat type", {
    Daily => "DAILY",
    Weekly => "WEEKLY",
    Monthly => "MONTHLY",
    Custom => "CUSTOM",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderKind {
    Before,
    OnTime,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(with = "stamp")]
    pub time: NaiveDateTime,
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    #[serde(with = "stamp")]
    pub start_time: NaiveDateTime,
    #[serde(with = "stamp")]
    pub end_time: NaiveDateTime,
}

impl FocusSession {
    pub fn minutes(&self) -> i64 {
        crate::time::minutes_between(&self.start_time, &self.end_time)
    }
}

/// A unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, with = "stamp_opt", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(with = "stamp")]
    pub created_at: NaiveDateTime,
    #[serde(with = "stamp")]
    pub updated_at: NaiveDateTime,
    #[serde(default, with = "stamp_opt", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_type: Option<RepeatType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_config: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_config: Option<Vec<Reminder>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_sessions: Option<Vec<FocusSession>>,
}

impl Task {
    /// Read-time overdue classification shared by stats, board and calendar.
    ///
    /// Stored status is never rewritten to OVERDUE by the store itself.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        match self.due_date {
            Some(due) => self.status != TaskStatus::Completed && due < now,
            None => false,
        }
    }

    /// The status a view should show: OVERDUE when [`Task::is_overdue`], else the stored one.
    pub fn effective_status(&self, now: NaiveDateTime) -> TaskStatus {
        if self.is_overdue(now) {
            TaskStatus::Overdue
        } else {
            self.status
        }
    }

    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|tag| tag == tag_id)
    }

    pub fn focus_sessions(&self) -> &[FocusSession] {
        self.focus_sessions.as_deref().unwrap_or(&[])
    }
}

/// Fields a caller supplies when creating a task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDateTime>,
    pub estimated_time: Option<u32>,
    pub assignee: Option<String>,
    pub repeat_type: Option<RepeatType>,
    pub repeat_config: Option<BTreeMap<String, serde_json::Value>>,
    pub reminder_config: Option<Vec<Reminder>>,
    pub focus_sessions: Option<Vec<FocusSession>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, status: TaskStatus, priority: TaskPriority) -> Self {
        Self {
            title: title.into(),
            description: None,
            status,
            priority,
            tags: Vec::new(),
            due_date: None,
            estimated_time: None,
            assignee: None,
            repeat_type: None,
            repeat_config: None,
            reminder_config: None,
            focus_sessions: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag_id: impl Into<String>) -> Self {
        self.tags.push(tag_id.into());
        self
    }

    pub fn due(mut self, due: NaiveDateTime) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn estimate(mut self, minutes: u32) -> Self {
        self.estimated_time = Some(minutes);
        self
    }

    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }
}

/// Partial update for a task. `None` leaves a field as is; for optional
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<Option<NaiveDateTime>>,
    pub estimated_time: Option<Option<u32>>,
    pub assignee: Option<Option<String>>,
    pub repeat_type: Option<Option<RepeatType>>,
    pub repeat_config: Option<Option<BTreeMap<String, serde_json::Value>>>,
    pub reminder_config: Option<Option<Vec<Reminder>>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

/// A named, colored label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Raw smart folder filter: filter key to match value.
pub type FilterDescriptor = BTreeMap<String, serde_json::Value>;

/// A saved filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartFolder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub filter: FilterDescriptor,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmartFolderPatch {
    pub name: Option<String>,
    pub filter: Option<FilterDescriptor>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum View {
    #[default]
    List,
    Kanban,
    Calendar,
    MindMap,
}

string_enum!(View, "view", {
    List => "LIST",
    Kanban => "KANBAN",
    Calendar => "CALENDAR",
    MindMap => "MIND_MAP",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Custom,
}

string_enum!(Theme, "theme", {
    Light => "LIGHT",
    Dark => "DARK",
    Custom => "CUSTOM",
});

/// A task with its descendants resolved into a nested structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskTree {
    pub task: Task,
    pub children: Vec<TaskTree>,
}

impl TaskTree {
    /// Number of tasks in this tree, root included
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TaskTree::size).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn task(status: TaskStatus, due: Option<NaiveDateTime>) -> Task {
        Task {
            id: "t1".to_string(),
            title: "Write report".to_string(),
            description: None,
            status,
            priority: TaskPriority::Medium,
            tags: Vec::new(),
            due_date: due,
            estimated_time: None,
            assignee: None,
            parent_id: None,
            children: Vec::new(),
            created_at: at(1, 9),
            updated_at: at(1, 9),
            completed_at: None,
            repeat_type: None,
            repeat_config: None,
            reminder_config: None,
            focus_sessions: None,
        }
    }

    #[test]
    fn status_parses_loosely() {
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("In-Progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("todo".parse::<TaskStatus>().unwrap(), TaskStatus::Todo);
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn enums_serialize_screaming() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let json = serde_json::to_string(&View::MindMap).unwrap();
        assert_eq!(json, "\"MIND_MAP\"");
    }

    #[test]
    fn overdue_needs_past_due_and_open_status() {
        let now = at(10, 12);
        assert!(task(TaskStatus::Todo, Some(at(9, 12))).is_overdue(now));
        assert!(task(TaskStatus::Cancelled, Some(at(9, 12))).is_overdue(now));
        assert!(!task(TaskStatus::Completed, Some(at(9, 12))).is_overdue(now));
        assert!(!task(TaskStatus::Todo, Some(at(11, 12))).is_overdue(now));
        assert!(!task(TaskStatus::Todo, Some(now)).is_overdue(now));
        assert!(!task(TaskStatus::Todo, None).is_overdue(now));
    }

    #[test]
    fn effective_status_keeps_stored_overdue_without_due_date() {
        let now = at(10, 12);
        assert_eq!(
            task(TaskStatus::Overdue, None).effective_status(now),
            TaskStatus::Overdue
        );
        assert_eq!(
            task(TaskStatus::Paused, Some(at(2, 8))).effective_status(now),
            TaskStatus::Overdue
        );
        assert_eq!(task(TaskStatus::Paused, None).effective_status(now), TaskStatus::Paused);
    }

    #[test]
    fn task_json_uses_camel_case_and_minute_stamps() {
        let mut record = task(TaskStatus::Todo, Some(at(3, 17)));
        record.focus_sessions = Some(vec![FocusSession {
            start_time: at(2, 9),
            end_time: at(2, 10),
        }]);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["dueDate"], "2024-06-03T17:00");
        assert_eq!(value["createdAt"], "2024-06-01T09:00");
        assert_eq!(value["focusSessions"][0]["startTime"], "2024-06-02T09:00");
        assert!(value.get("completedAt").is_none());
        assert!(value.get("parentId").is_none());
    }

    #[test]
    fn reminder_kind_serializes_as_type() {
        let reminder = Reminder {
            time: at(4, 8),
            kind: ReminderKind::OnTime,
            minutes: None,
        };
        let value = serde_json::to_value(&reminder).unwrap();
        assert_eq!(value["type"], "ON_TIME");
        assert!(value.get("minutes").is_none());
    }

    #[test]
    fn tree_size_counts_all_nodes() {
        let leaf = TaskTree {
            task: task(TaskStatus::Todo, None),
            children: Vec::new(),
        };
        let tree = TaskTree {
            task: task(TaskStatus::Todo, None),
            children: vec![leaf.clone(), TaskTree {
                task: task(TaskStatus::Todo, None),
                children: vec![leaf],
            }],
        };
        assert_eq!(tree.size(), 4);
    }
}
