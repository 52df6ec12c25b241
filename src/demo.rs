//! Sample data for `init --demo`.

use chrono::Duration;
use serde::Serialize;

use crate::error::Result;
use crate::model::{NewTask, Reminder, ReminderKind, TaskPriority, TaskStatus};
use crate::store::TaskStore;

const DEMO_TAGS: [(&str, &str); 5] = [
    ("Work", "#1890ff"),
    ("Study", "#52c41a"),
    ("Personal", "#faad14"),
    ("Health", "#f5222d"),
    ("Leisure", "#722ed1"),
];

#[derive(Debug, Clone, Default, Serialize)]
pub struct DemoSummary {
    pub tags: usize,
    pub tasks: usize,
}

/// Seed five tags and a handful of tasks dated relative to the store's clock.
pub fn seed(store: &mut TaskStore) -> Result<DemoSummary> {
    let now = store.now();
    let tasks_before = store.task_count();

    let mut tag_ids = Vec::with_capacity(DEMO_TAGS.len());
    for (name, color) in DEMO_TAGS {
        tag_ids.push(store.add_tag(name, color)?);
    }
    let [work, study, personal, health, _leisure] = [0, 1, 2, 3, 4].map(|i| tag_ids[i].clone());

    let mut proposal = NewTask::new("Finish project proposal", TaskStatus::Todo, TaskPriority::High)
        .description("Write and submit next quarter's proposal")
        .tag(work.clone())
        .due(now)
        .estimate(240);
    proposal.reminder_config = Some(vec![Reminder {
        time: now - Duration::hours(1),
        kind: ReminderKind::Before,
        minutes: Some(60),
    }]);
    store.add_task(proposal)?;

    let workout = store.add_task(
        NewTask::new("Work out for 30 minutes", TaskStatus::InProgress, TaskPriority::Medium)
            .description("Cardio and strength")
            .tag(health)
            .due(now)
            .estimate(30),
    )?;
    store.add_task_focus_session(
        &workout,
        now - Duration::hours(3),
        now - Duration::minutes(150),
    )?;

    store.add_task(
        NewTask::new("Read up on the new async APIs", TaskStatus::Todo, TaskPriority::Medium)
            .tag(study)
            .due(now + Duration::days(1))
            .estimate(120),
    )?;

    store.add_task(
        NewTask::new("Reply to client email", TaskStatus::Overdue, TaskPriority::High)
            .tag(work.clone())
            .due(now - Duration::days(1))
            .estimate(60),
    )?;

    store.add_task(
        NewTask::new("Buy groceries", TaskStatus::Completed, TaskPriority::Low)
            .tag(personal)
            .due(now - Duration::days(2))
            .estimate(60),
    )?;

    let slides = store.add_task(
        NewTask::new("Prepare team presentation", TaskStatus::InProgress, TaskPriority::High)
            .description("Slides for next week's team review")
            .tag(work.clone())
            .due(now + Duration::days(2))
            .assignee("me"),
    )?;
    let outline =
        store.add_subtask(&slides, NewTask::new("Outline", TaskStatus::Completed, TaskPriority::Medium))?;
    store.add_subtask(
        &slides,
        NewTask::new("Draft slides", TaskStatus::Todo, TaskPriority::High)
            .tag(work)
            .due(now + Duration::days(1)),
    )?;
    store.add_task_focus_session(&outline, now - Duration::minutes(90), now - Duration::minutes(45))?;

    Ok(DemoSummary {
        tags: tag_ids.len(),
        tasks: store.task_count() - tasks_before,
    })
}
