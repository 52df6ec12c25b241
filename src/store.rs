//! The task store: tasks, tags, smart folders and view settings.
//!
//! Every mutation validates first, applies to memory, then writes a snapshot
//! through the [`SnapshotStore`] backend. A failed write is logged and kept as
//! the pending persistence error; memory is never rolled back.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use ulid::Generator;

use crate::error::{Error, Result};
use crate::filter::{sort_tasks, ListOptions, TaskFilter};
use crate::model::{
    FilterDescriptor, FocusSession, NewTask, Reminder, SmartFolder, SmartFolderPatch, Tag,
    TagPatch, Task, TaskPatch, TaskPriority, TaskStatus, TaskTree, Theme, View,
};
use crate::stats::{self, TaskStats, TrendPoint};
use crate::storage::{MemoryStorage, PersistedState, SnapshotStore};
use crate::time::{truncate_to_minute, Clock};
use crate::views::{self, BoardColumn, CalendarDay};

/// View settings as shown by `settings`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub current_view: View,
    pub selected_task_id: Option<String>,
    pub theme: Theme,
    pub custom_theme: Option<BTreeMap<String, String>>,
}

pub struct TaskStore {
    state: PersistedState,
    backend: Box<dyn SnapshotStore>,
    clock: Box<dyn Clock>,
    ids: Generator,
    persist_error: Option<String>,
}

impl fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.state.tasks.len())
            .field("tags", &self.state.tags.len())
            .field("smart_folders", &self.state.smart_folders.len())
            .field("backend", &self.backend)
            .field("clock", &self.clock)
            .field("persist_error", &self.persist_error)
            .finish()
    }
}

impl TaskStore {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open a store over `backend`, loading the last snapshot if there is one
    pub fn open(backend: impl SnapshotStore + 'static, clock: impl Clock + 'static) -> Result<Self> {
        let state = match backend.load()? {
            Some(state) => {
                tracing::info!(
                    tasks = state.tasks.len(),
                    tags = state.tags.len(),
                    smart_folders = state.smart_folders.len(),
                    "loaded snapshot"
                );
                state
            }
            None => {
                tracing::info!("no snapshot found; starting empty");
                PersistedState::default()
            }
        };

        let store = Self {
            state,
            backend: Box::new(backend),
            clock: Box::new(clock),
            ids: Generator::new(),
            persist_error: None,
        };
        store.audit_references();
        Ok(store)
    }

    /// Empty store backed by memory only
    pub fn in_memory(clock: impl Clock + 'static) -> Self {
        Self {
            state: PersistedState::default(),
            backend: Box::new(MemoryStorage::new()),
            clock: Box::new(clock),
            ids: Generator::new(),
            persist_error: None,
        }
    }

    /// Write a final snapshot if the last one failed, then drop the store
    pub fn close(mut self) -> Result<()> {
        if self.persist_error.is_some() {
            self.flush()?;
        }
        Ok(())
    }

    /// Write the current state now, clearing any pending persistence error
    pub fn flush(&mut self) -> Result<()> {
        self.backend.save(&self.state)?;
        self.persist_error = None;
        Ok(())
    }

    /// Message of the last failed snapshot write, if it has not been retried successfully
    pub fn persist_error(&self) -> Option<&str> {
        self.persist_error.as_deref()
    }

    pub fn set_clock(&mut self, clock: impl Clock + 'static) {
        self.clock = Box::new(clock);
    }

    /// Current time from the store clock, truncated to the minute
    pub fn now(&self) -> NaiveDateTime {
        truncate_to_minute(self.clock.now())
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    fn persist(&mut self) {
        match self.backend.save(&self.state) {
            Ok(()) => self.persist_error = None,
            Err(err) => {
                tracing::warn!(error = %err, "failed to write snapshot; keeping in-memory state");
                self.persist_error = Some(err.to_string());
            }
        }
    }

    fn next_id(&mut self) -> Result<String> {
        let id = self
            .ids
            .generate()
            .map_err(|err| Error::OperationFailed(format!("id generation failed: {err}")))?;
        Ok(id.to_string().to_lowercase())
    }

    fn audit_references(&self) {
        let tasks = &self.state.tasks;
        let mut stale = 0usize;
        for task in tasks.values() {
            stale += task.children.iter().filter(|id| !tasks.contains_key(*id)).count();
            if task.parent_id.as_ref().is_some_and(|id| !tasks.contains_key(id)) {
                stale += 1;
            }
            stale += task
                .tags
                .iter()
                .filter(|id| !self.state.tags.contains_key(*id))
                .count();
        }
        if stale > 0 {
            tracing::warn!(stale, "snapshot holds references to missing records");
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn require_task_id(&self, id: &str) -> Result<()> {
        if self.state.tasks.contains_key(id) {
            Ok(())
        } else {
            Err(Error::TaskNotFound(id.to_string()))
        }
    }

    fn check_title(title: &str) -> Result<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidArgument("task title must not be empty".to_string()));
        }
        Ok(title.to_string())
    }

    fn check_name(kind: &str, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(format!("{kind} name must not be empty")));
        }
        Ok(name.to_string())
    }

    /// Deduplicate tag ids in order and make sure each one exists
    fn check_tags(&self, tags: &[String]) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut checked = Vec::with_capacity(tags.len());
        for tag in tags {
            if !self.state.tags.contains_key(tag) {
                return Err(Error::TagNotFound(tag.clone()));
            }
            if seen.insert(tag.as_str()) {
                checked.push(tag.clone());
            }
        }
        Ok(checked)
    }

    /// Truncate session bounds to the minute and reject sessions that end before they start
    fn check_sessions(sessions: &mut [FocusSession]) -> Result<()> {
        for session in sessions.iter_mut() {
            session.start_time = truncate_to_minute(session.start_time);
            session.end_time = truncate_to_minute(session.end_time);
            if session.end_time < session.start_time {
                return Err(Error::InvalidArgument(
                    "focus session must not end before it starts".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn truncate_reminders(reminders: &mut [Reminder]) {
        for reminder in reminders {
            reminder.time = truncate_to_minute(reminder.time);
        }
    }

    fn check_filter(filter: &FilterDescriptor) -> Result<()> {
        TaskFilter::from_descriptor(filter).map(|_| ())
    }

    fn build_task(&mut self, mut new: NewTask, parent_id: Option<String>) -> Result<Task> {
        let title = Self::check_title(&new.title)?;
        let tags = self.check_tags(&new.tags)?;
        if let Some(sessions) = new.focus_sessions.as_mut() {
            Self::check_sessions(sessions)?;
        }
        if let Some(reminders) = new.reminder_config.as_mut() {
            Self::truncate_reminders(reminders);
        }
        let id = self.next_id()?;
        let now = self.now();
        let completed_at = (new.status == TaskStatus::Completed).then_some(now);

        Ok(Task {
            id,
            title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            tags,
            due_date: new.due_date.map(truncate_to_minute),
            estimated_time: new.estimated_time,
            assignee: new.assignee,
            parent_id,
            children: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at,
            repeat_type: new.repeat_type,
            repeat_config: new.repeat_config,
            reminder_config: new.reminder_config,
            focus_sessions: new.focus_sessions,
        })
    }

    // =========================================================================
    // Task mutations
    // =========================================================================

    /// Create a top-level task and return its id
    pub fn add_task(&mut self, new: NewTask) -> Result<String> {
        let task = self.build_task(new, None)?;
        let id = task.id.clone();
        tracing::debug!(task_id = %id, "add task");
        self.state.tasks.insert(id.clone(), task);
        self.persist();
        Ok(id)
    }

    /// Create a task under `parent_id` and return its id
    pub fn add_subtask(&mut self, parent_id: &str, new: NewTask) -> Result<String> {
        self.require_task_id(parent_id)?;
        let task = self.build_task(new, Some(parent_id.to_string()))?;
        let id = task.id.clone();
        let now = task.created_at;

        if let Some(parent) = self.state.tasks.get_mut(parent_id) {
            parent.children.push(id.clone());
            parent.updated_at = now;
        }
        tracing::debug!(task_id = %id, parent_id, "add subtask");
        self.state.tasks.insert(id.clone(), task);
        self.persist();
        Ok(id)
    }

    /// Merge `patch` into a task
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<()> {
        self.require_task_id(id)?;
        let title = patch.title.as_deref().map(Self::check_title).transpose()?;
        let tags = patch.tags.as_deref().map(|tags| self.check_tags(tags)).transpose()?;
        let now = self.now();

        let task = self
            .state
            .tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(status) = patch.status {
            task.status = status;
            if status == TaskStatus::Completed {
                task.completed_at = Some(now);
            }
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(tags) = tags {
            task.tags = tags;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date.map(truncate_to_minute);
        }
        if let Some(estimated_time) = patch.estimated_time {
            task.estimated_time = estimated_time;
        }
        if let Some(assignee) = patch.assignee {
            task.assignee = assignee;
        }
        if let Some(repeat_type) = patch.repeat_type {
            task.repeat_type = repeat_type;
        }
        if let Some(repeat_config) = patch.repeat_config {
            task.repeat_config = repeat_config;
        }
        if let Some(mut reminder_config) = patch.reminder_config {
            if let Some(reminders) = reminder_config.as_mut() {
                Self::truncate_reminders(reminders);
            }
            task.reminder_config = reminder_config;
        }
        task.updated_at = now;

        tracing::debug!(task_id = id, "update task");
        self.persist();
        Ok(())
    }

    /// Delete a task and all of its descendants. Returns how many tasks were removed.
    pub fn delete_task(&mut self, id: &str) -> Result<usize> {
        self.require_task_id(id)?;

        let mut children_by_parent: HashMap<&str, Vec<&str>> = HashMap::new();
        for task in self.state.tasks.values() {
            if let Some(parent_id) = task.parent_id.as_deref() {
                children_by_parent.entry(parent_id).or_default().push(task.id.as_str());
            }
        }

        let mut queue = VecDeque::from([id.to_string()]);
        let mut seen: HashSet<String> = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(task) = self.state.tasks.get(&current) else {
                tracing::warn!(task_id = %current, "skipping stale child reference");
                continue;
            };
            queue.extend(task.children.iter().cloned());
            if let Some(linked) = children_by_parent.get(current.as_str()) {
                queue.extend(linked.iter().map(|child| child.to_string()));
            }
        }

        let parent_id = self.state.tasks.get(id).and_then(|task| task.parent_id.clone());
        let now = self.now();
        let mut removed = 0;
        for task_id in &seen {
            if self.state.tasks.remove(task_id).is_some() {
                removed += 1;
            }
        }
        if let Some(parent) = parent_id.and_then(|parent_id| self.state.tasks.get_mut(&parent_id)) {
            parent.children.retain(|child| child != id);
            parent.updated_at = now;
        }
        if self
            .state
            .selected_task_id
            .as_ref()
            .is_some_and(|selected| seen.contains(selected))
        {
            self.state.selected_task_id = None;
        }

        tracing::debug!(task_id = id, removed, "delete task");
        self.persist();
        Ok(removed)
    }

    pub fn mark_task_as_complete(&mut self, id: &str) -> Result<()> {
        self.change_task_status(id, TaskStatus::Completed)
    }

    /// Set a task's status. Moving to COMPLETED stamps `completedAt`; leaving it does not clear it.
    pub fn change_task_status(&mut self, id: &str, status: TaskStatus) -> Result<()> {
        let now = self.now();
        let task = self
            .state
            .tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        task.status = status;
        if status == TaskStatus::Completed {
            task.completed_at = Some(now);
        }
        task.updated_at = now;

        tracing::debug!(task_id = id, status = %status, "change status");
        self.persist();
        Ok(())
    }

    pub fn update_task_priority(&mut self, id: &str, priority: TaskPriority) -> Result<()> {
        let now = self.now();
        let task = self
            .state
            .tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        task.priority = priority;
        task.updated_at = now;

        tracing::debug!(task_id = id, priority = %priority, "change priority");
        self.persist();
        Ok(())
    }

    /// Append a focus session to a task
    pub fn add_task_focus_session(
        &mut self,
        id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<()> {
        self.require_task_id(id)?;
        let mut session = [FocusSession {
            start_time: start,
            end_time: end,
        }];
        Self::check_sessions(&mut session)?;
        let [session] = session;
        let now = self.now();
        let task = self
            .state
            .tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        task.focus_sessions.get_or_insert_with(Vec::new).push(session);
        task.updated_at = now;

        tracing::debug!(task_id = id, "add focus session");
        self.persist();
        Ok(())
    }

    // =========================================================================
    // Tags
    // =========================================================================

    pub fn add_tag(&mut self, name: &str, color: &str) -> Result<String> {
        let name = Self::check_name("tag", name)?;
        let id = self.next_id()?;
        self.state.tags.insert(
            id.clone(),
            Tag {
                id: id.clone(),
                name,
                color: color.trim().to_string(),
            },
        );
        tracing::debug!(tag_id = %id, "add tag");
        self.persist();
        Ok(id)
    }

    pub fn update_tag(&mut self, id: &str, patch: TagPatch) -> Result<()> {
        let name = patch
            .name
            .as_deref()
            .map(|name| Self::check_name("tag", name))
            .transpose()?;
        let tag = self
            .state
            .tags
            .get_mut(id)
            .ok_or_else(|| Error::TagNotFound(id.to_string()))?;
        if let Some(name) = name {
            tag.name = name;
        }
        if let Some(color) = patch.color {
            tag.color = color.trim().to_string();
        }
        tracing::debug!(tag_id = id, "update tag");
        self.persist();
        Ok(())
    }

    /// Delete a tag and strip it from every task. Returns how many tasks lost the tag.
    pub fn delete_tag(&mut self, id: &str) -> Result<usize> {
        if self.state.tags.remove(id).is_none() {
            return Err(Error::TagNotFound(id.to_string()));
        }
        let now = self.now();
        let mut affected = 0;
        for task in self.state.tasks.values_mut() {
            if task.has_tag(id) {
                task.tags.retain(|tag| tag != id);
                task.updated_at = now;
                affected += 1;
            }
        }
        tracing::debug!(tag_id = id, affected, "delete tag");
        self.persist();
        Ok(affected)
    }

    // =========================================================================
    // Smart folders
    // =========================================================================

    pub fn add_smart_folder(&mut self, name: &str, filter: FilterDescriptor) -> Result<String> {
        let name = Self::check_name("smart folder", name)?;
        Self::check_filter(&filter)?;
        let id = self.next_id()?;
        self.state.smart_folders.insert(
            id.clone(),
            SmartFolder {
                id: id.clone(),
                name,
                filter,
            },
        );
        tracing::debug!(folder_id = %id, "add smart folder");
        self.persist();
        Ok(id)
    }

    pub fn update_smart_folder(&mut self, id: &str, patch: SmartFolderPatch) -> Result<()> {
        if !self.state.smart_folders.contains_key(id) {
            return Err(Error::FolderNotFound(id.to_string()));
        }
        let name = patch
            .name
            .as_deref()
            .map(|name| Self::check_name("smart folder", name))
            .transpose()?;
        if let Some(filter) = &patch.filter {
            Self::check_filter(filter)?;
        }
        let folder = self
            .state
            .smart_folders
            .get_mut(id)
            .ok_or_else(|| Error::FolderNotFound(id.to_string()))?;
        if let Some(name) = name {
            folder.name = name;
        }
        if let Some(filter) = patch.filter {
            folder.filter = filter;
        }
        tracing::debug!(folder_id = id, "update smart folder");
        self.persist();
        Ok(())
    }

    pub fn delete_smart_folder(&mut self, id: &str) -> Result<()> {
        if self.state.smart_folders.remove(id).is_none() {
            return Err(Error::FolderNotFound(id.to_string()));
        }
        tracing::debug!(folder_id = id, "delete smart folder");
        self.persist();
        Ok(())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn set_current_view(&mut self, view: View) {
        self.state.current_view = view;
        tracing::debug!(view = %view, "set view");
        self.persist();
    }

    /// Select a task, or clear the selection with `None`
    pub fn select_task(&mut self, id: Option<&str>) -> Result<()> {
        if let Some(id) = id {
            self.require_task_id(id)?;
        }
        self.state.selected_task_id = id.map(str::to_string);
        tracing::debug!(task_id = ?id, "select task");
        self.persist();
        Ok(())
    }

    /// Switch theme. The stored custom theme is replaced by `custom`, so
    /// passing `None` clears it.
    pub fn set_theme(&mut self, theme: Theme, custom: Option<BTreeMap<String, String>>) {
        self.state.theme = theme;
        self.state.custom_theme = custom;
        tracing::debug!(theme = %theme, "set theme");
        self.persist();
    }

    pub fn current_view(&self) -> View {
        self.state.current_view
    }

    pub fn selected_task_id(&self) -> Option<&str> {
        self.state.selected_task_id.as_deref()
    }

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    pub fn custom_theme(&self) -> Option<&BTreeMap<String, String>> {
        self.state.custom_theme.as_ref()
    }

    pub fn settings(&self) -> Settings {
        Settings {
            current_view: self.state.current_view,
            selected_task_id: self.state.selected_task_id.clone(),
            theme: self.state.theme,
            custom_theme: self.state.custom_theme.clone(),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.state.tasks.get(id)
    }

    pub fn require_task(&self, id: &str) -> Result<&Task> {
        self.get_task(id).ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// All tasks, ordered by id
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.state.tasks.values()
    }

    pub fn task_count(&self) -> usize {
        self.state.tasks.len()
    }

    pub fn get_filtered_tasks(&self, filter: &TaskFilter) -> Vec<&Task> {
        self.tasks().filter(|task| filter.matches(task)).collect()
    }

    /// Direct children in stored order; ids with no task behind them are skipped
    pub fn get_task_children(&self, id: &str) -> Result<Vec<&Task>> {
        let task = self.require_task(id)?;
        Ok(task
            .children
            .iter()
            .filter_map(|child_id| {
                let child = self.state.tasks.get(child_id);
                if child.is_none() {
                    tracing::warn!(task_id = id, child_id = %child_id, "skipping stale child reference");
                }
                child
            })
            .collect())
    }

    pub fn get_task_parent(&self, id: &str) -> Result<Option<&Task>> {
        let task = self.require_task(id)?;
        Ok(task
            .parent_id
            .as_deref()
            .and_then(|parent_id| self.state.tasks.get(parent_id)))
    }

    /// Resolve a task and all of its descendants into a nested tree.
    ///
    /// A task id reached a second time is cut off so cyclic links terminate.
    pub fn get_task_tree(&self, id: &str) -> Result<TaskTree> {
        let root = self.require_task(id)?;

        let mut nodes: Vec<(&Task, Vec<usize>)> = vec![(root, Vec::new())];
        let mut seen: HashSet<&str> = HashSet::from([root.id.as_str()]);
        let mut stack = vec![0usize];

        while let Some(index) = stack.pop() {
            let task = nodes[index].0;
            for child_id in &task.children {
                if !seen.insert(child_id.as_str()) {
                    tracing::warn!(task_id = %task.id, child_id = %child_id, "repeated child reference cut from tree");
                    continue;
                }
                let Some(child) = self.state.tasks.get(child_id) else {
                    tracing::warn!(task_id = %task.id, child_id = %child_id, "skipping stale child reference");
                    continue;
                };
                let child_index = nodes.len();
                nodes.push((child, Vec::new()));
                nodes[index].1.push(child_index);
                stack.push(child_index);
            }
        }

        // Children always sit at higher indices than their parent.
        let mut built: Vec<Option<TaskTree>> = (0..nodes.len()).map(|_| None).collect();
        for index in (0..nodes.len()).rev() {
            let children = nodes[index]
                .1
                .iter()
                .filter_map(|child| built[*child].take())
                .collect();
            built[index] = Some(TaskTree {
                task: nodes[index].0.clone(),
                children,
            });
        }

        built
            .first_mut()
            .and_then(Option::take)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    pub fn get_stats(&self) -> TaskStats {
        self.stats_at(self.now())
    }

    pub fn stats_at(&self, now: NaiveDateTime) -> TaskStats {
        stats::compute(self.tasks(), now)
    }

    /// Filtered and sorted task list. Completed tasks are hidden unless
    /// `show_completed` is set or the filter asks for them by status.
    pub fn list_tasks(&self, options: &ListOptions) -> Vec<&Task> {
        let include_completed =
            options.show_completed || options.filter.status == Some(TaskStatus::Completed);
        let mut tasks: Vec<&Task> = self
            .tasks()
            .filter(|task| options.filter.matches(task))
            .filter(|task| include_completed || task.status != TaskStatus::Completed)
            .collect();
        sort_tasks(&mut tasks, options.sort, options.order);
        tasks
    }

    pub fn board(&self) -> Vec<BoardColumn<'_>> {
        views::board(self.tasks(), self.now())
    }

    pub fn calendar(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Vec<CalendarDay<'_>> {
        views::calendar(self.tasks(), self.now(), from, to)
    }

    /// Daily created/completed counts for the last `days` days
    pub fn trend(&self, days: u32) -> Result<Vec<TrendPoint>> {
        stats::trend(self.tasks(), self.now().date(), days)
    }

    // =========================================================================
    // Tag and folder reads
    // =========================================================================

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.state.tags.values()
    }

    pub fn get_tag(&self, id: &str) -> Option<&Tag> {
        self.state.tags.get(id)
    }

    pub fn smart_folders(&self) -> impl Iterator<Item = &SmartFolder> {
        self.state.smart_folders.values()
    }

    pub fn get_smart_folder(&self, id: &str) -> Option<&SmartFolder> {
        self.state.smart_folders.get(id)
    }

    /// Tasks matching a smart folder's filter
    pub fn folder_tasks(&self, id: &str) -> Result<Vec<&Task>> {
        let folder = self
            .get_smart_folder(id)
            .ok_or_else(|| Error::FolderNotFound(id.to_string()))?;
        let filter = TaskFilter::from_descriptor(&folder.filter)?;
        Ok(self.get_filtered_tasks(&filter))
    }
}
