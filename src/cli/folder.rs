//! `taskdeck folder` commands (smart folders).

use serde::Serialize;

use crate::cli::task::task_line;
use crate::cli::{load_context, GlobalOptions};
use crate::error::{Error, Result};
use crate::filter::parse_descriptor_pairs;
use crate::model::{SmartFolder, SmartFolderPatch, Task};
use crate::output::{emit_success, HumanOutput};

pub struct AddOptions {
    pub name: String,
    pub filters: Vec<String>,
    pub global: GlobalOptions,
}

pub struct EditOptions {
    pub id: String,
    pub name: Option<String>,
    pub filters: Vec<String>,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct FolderDeletedOutput<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct FolderTasksOutput<'a> {
    folder: &'a SmartFolder,
    tasks: Vec<&'a Task>,
}

fn describe_filter(folder: &SmartFolder) -> String {
    if folder.filter.is_empty() {
        return "all tasks".to_string();
    }
    folder
        .filter
        .iter()
        .map(|(key, value)| match value.as_str() {
            Some(text) => format!("{key}={text}"),
            None => format!("{key}={value}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let filter = parse_descriptor_pairs(&options.filters)?;
    let mut ctx = load_context(&options.global)?;
    let id = ctx.store.add_smart_folder(&options.name, filter)?;
    let folder = ctx
        .store
        .get_smart_folder(&id)
        .cloned()
        .ok_or_else(|| Error::FolderNotFound(id.clone()))?;

    let mut human = HumanOutput::new("Smart folder created");
    human.push_summary("ID", folder.id.clone());
    human.push_summary("Name", folder.name.clone());
    human.push_summary("Filter", describe_filter(&folder));

    ctx.finish()?;
    emit_success(options.global.output(), "folder add", &folder, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let filter = if options.filters.is_empty() {
        None
    } else {
        Some(parse_descriptor_pairs(&options.filters)?)
    };
    if options.name.is_none() && filter.is_none() {
        return Err(Error::InvalidArgument(
            "nothing to change: pass --name and/or --filter".to_string(),
        ));
    }

    let mut ctx = load_context(&options.global)?;
    ctx.store.update_smart_folder(
        &options.id,
        SmartFolderPatch {
            name: options.name,
            filter,
        },
    )?;
    let folder = ctx
        .store
        .get_smart_folder(&options.id)
        .cloned()
        .ok_or_else(|| Error::FolderNotFound(options.id.clone()))?;

    let mut human = HumanOutput::new("Smart folder updated");
    human.push_summary("ID", folder.id.clone());
    human.push_summary("Name", folder.name.clone());
    human.push_summary("Filter", describe_filter(&folder));

    ctx.finish()?;
    emit_success(options.global.output(), "folder edit", &folder, Some(&human))
}

pub fn run_rm(id: String, global: GlobalOptions) -> Result<()> {
    let mut ctx = load_context(&global)?;
    ctx.store.delete_smart_folder(&id)?;

    let mut human = HumanOutput::new("Smart folder deleted");
    human.push_summary("ID", id.clone());

    ctx.finish()?;
    emit_success(
        global.output(),
        "folder rm",
        &FolderDeletedOutput { id: &id },
        Some(&human),
    )
}

pub fn run_list(global: GlobalOptions) -> Result<()> {
    let ctx = load_context(&global)?;
    let folders: Vec<&SmartFolder> = ctx.store.smart_folders().collect();

    let mut human = HumanOutput::new(format!("Smart folders ({})", folders.len()));
    for folder in &folders {
        human.push_detail(format!(
            "{} {} [{}]",
            folder.id,
            folder.name,
            describe_filter(folder)
        ));
    }
    emit_success(global.output(), "folder list", &folders, Some(&human))
}

pub fn run_tasks(id: String, global: GlobalOptions) -> Result<()> {
    let ctx = load_context(&global)?;
    let now = ctx.store.now();
    let folder = ctx
        .store
        .get_smart_folder(&id)
        .ok_or_else(|| Error::FolderNotFound(id.clone()))?;
    let tasks = ctx.store.folder_tasks(&id)?;

    let mut human = HumanOutput::new(format!("{} ({} tasks)", folder.name, tasks.len()));
    human.push_summary("Filter", describe_filter(folder));
    for task in &tasks {
        human.push_detail(task_line(task, now));
    }
    emit_success(
        global.output(),
        "folder tasks",
        &FolderTasksOutput { folder, tasks },
        Some(&human),
    )
}
