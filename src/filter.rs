//! Task filtering and list ordering.
//!
//! A [`TaskFilter`] is the typed form of a filter descriptor: every supplied
//! criterion must match (logical AND). Smart folders persist the untyped
//! descriptor and convert it on evaluation.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{FilterDescriptor, Task, TaskPriority, TaskStatus};
use crate::time::{format_stamp, parse_stamp};

pub const KEY_STATUS: &str = "status";
pub const KEY_PRIORITY: &str = "priority";
pub const KEY_TAG: &str = "tag";
pub const KEY_DUE_BEFORE: &str = "dueDateBefore";
pub const KEY_DUE_AFTER: &str = "dueDateAfter";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(
        rename = "dueDateBefore",
        skip_serializing_if = "Option::is_none",
        with = "crate::time::stamp_opt"
    )]
    pub due_before: Option<NaiveDateTime>,
    #[serde(
        rename = "dueDateAfter",
        skip_serializing_if = "Option::is_none",
        with = "crate::time::stamp_opt"
    )]
    pub due_after: Option<NaiveDateTime>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        *self == TaskFilter::default()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(tag) = self.tag.as_deref() {
            if !task.has_tag(tag) {
                return false;
            }
        }
        if let Some(before) = self.due_before {
            match task.due_date {
                Some(due) if due < before => {}
                _ => return false,
            }
        }
        if let Some(after) = self.due_after {
            match task.due_date {
                Some(due) if due > after => {}
                _ => return false,
            }
        }
        true
    }

    /// Build a filter from a descriptor. Unrecognized keys are ignored;
    /// recognized keys with unusable values are rejected.
    pub fn from_descriptor(descriptor: &FilterDescriptor) -> Result<Self> {
        let mut filter = TaskFilter::default();
        for (key, value) in descriptor {
            match key.as_str() {
                KEY_STATUS => filter.status = Some(TaskStatus::from_str(descriptor_str(key, value)?)?),
                KEY_PRIORITY => {
                    filter.priority = Some(TaskPriority::from_str(descriptor_str(key, value)?)?)
                }
                KEY_TAG => filter.tag = Some(descriptor_str(key, value)?.to_string()),
                KEY_DUE_BEFORE => filter.due_before = Some(parse_stamp(descriptor_str(key, value)?)?),
                KEY_DUE_AFTER => filter.due_after = Some(parse_stamp(descriptor_str(key, value)?)?),
                other => {
                    tracing::debug!(key = other, "ignoring unknown filter key");
                }
            }
        }
        Ok(filter)
    }

    pub fn to_descriptor(&self) -> FilterDescriptor {
        let mut descriptor = FilterDescriptor::new();
        if let Some(status) = self.status {
            descriptor.insert(KEY_STATUS.to_string(), Value::from(status.as_str()));
        }
        if let Some(priority) = self.priority {
            descriptor.insert(KEY_PRIORITY.to_string(), Value::from(priority.as_str()));
        }
        if let Some(tag) = &self.tag {
            descriptor.insert(KEY_TAG.to_string(), Value::from(tag.as_str()));
        }
        if let Some(before) = &self.due_before {
            descriptor.insert(KEY_DUE_BEFORE.to_string(), Value::from(format_stamp(before)));
        }
        if let Some(after) = &self.due_after {
            descriptor.insert(KEY_DUE_AFTER.to_string(), Value::from(format_stamp(after)));
        }
        descriptor
    }
}

fn descriptor_str<'a>(key: &str, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        Error::InvalidArgument(format!("filter '{key}' expects a string value, got {value}"))
    })
}

/// Parse `key=value` pairs (as given on the command line) into a descriptor.
pub fn parse_descriptor_pairs(pairs: &[String]) -> Result<FilterDescriptor> {
    let mut descriptor = FilterDescriptor::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            Error::InvalidArgument(format!("filter '{pair}' must look like key=value"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::InvalidArgument(format!("filter '{pair}' has an empty key")));
        }
        descriptor.insert(key.to_string(), Value::from(value.trim()));
    }
    Ok(descriptor)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    DueDate,
    Priority,
    CreatedAt,
    UpdatedAt,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "due" | "duedate" => Ok(SortKey::DueDate),
            "priority" => Ok(SortKey::Priority),
            "created" | "createdat" => Ok(SortKey::CreatedAt),
            "updated" | "updatedat" => Ok(SortKey::UpdatedAt),
            _ => Err(Error::InvalidArgument(format!(
                "invalid sort key '{s}': must be due, priority, created or updated"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// How the list view arranges tasks.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filter: TaskFilter,
    pub sort: SortKey,
    pub order: SortOrder,
    pub show_completed: bool,
}

/// Stable sort. Tasks without a due date sort after dated ones in ascending
/// order and before them in descending order.
pub fn sort_tasks(tasks: &mut [&Task], key: SortKey, order: SortOrder) {
    tasks.sort_by(|left, right| {
        let ordering = compare(left, right, key);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn compare(left: &Task, right: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::DueDate => match (left.due_date, right.due_date) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::Priority => left.priority.rank().cmp(&right.priority.rank()),
        SortKey::CreatedAt => left.created_at.cmp(&right.created_at),
        SortKey::UpdatedAt => left.updated_at.cmp(&right.updated_at),
    }
}
