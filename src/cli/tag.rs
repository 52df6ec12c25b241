//! `taskdeck tag` commands.

use serde::Serialize;

use crate::cli::{load_context, GlobalOptions};
use crate::error::{Error, Result};
use crate::model::{Tag, TagPatch};
use crate::output::{emit_success, HumanOutput};

pub const DEFAULT_COLOR: &str = "#1890ff";

pub struct AddOptions {
    pub name: String,
    pub color: String,
    pub global: GlobalOptions,
}

pub struct EditOptions {
    pub id: String,
    pub name: Option<String>,
    pub color: Option<String>,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct TagDeletedOutput<'a> {
    id: &'a str,
    tasks_updated: usize,
}

#[derive(Serialize)]
struct TagListEntry<'a> {
    #[serde(flatten)]
    tag: &'a Tag,
    tasks: usize,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut ctx = load_context(&options.global)?;
    let id = ctx.store.add_tag(&options.name, &options.color)?;
    let tag = ctx
        .store
        .get_tag(&id)
        .cloned()
        .ok_or_else(|| Error::TagNotFound(id.clone()))?;

    let mut human = HumanOutput::new("Tag created");
    human.push_summary("ID", tag.id.clone());
    human.push_summary("Name", tag.name.clone());
    human.push_summary("Color", tag.color.clone());

    ctx.finish()?;
    emit_success(options.global.output(), "tag add", &tag, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    if options.name.is_none() && options.color.is_none() {
        return Err(Error::InvalidArgument(
            "nothing to change: pass --name and/or --color".to_string(),
        ));
    }
    let mut ctx = load_context(&options.global)?;
    ctx.store.update_tag(
        &options.id,
        TagPatch {
            name: options.name,
            color: options.color,
        },
    )?;
    let tag = ctx
        .store
        .get_tag(&options.id)
        .cloned()
        .ok_or_else(|| Error::TagNotFound(options.id.clone()))?;

    let mut human = HumanOutput::new("Tag updated");
    human.push_summary("ID", tag.id.clone());
    human.push_summary("Name", tag.name.clone());
    human.push_summary("Color", tag.color.clone());

    ctx.finish()?;
    emit_success(options.global.output(), "tag edit", &tag, Some(&human))
}

pub fn run_rm(id: String, global: GlobalOptions) -> Result<()> {
    let mut ctx = load_context(&global)?;
    let tasks_updated = ctx.store.delete_tag(&id)?;

    let mut human = HumanOutput::new("Tag deleted");
    human.push_summary("ID", id.clone());
    human.push_summary("Tasks updated", tasks_updated.to_string());

    ctx.finish()?;
    emit_success(
        global.output(),
        "tag rm",
        &TagDeletedOutput {
            id: &id,
            tasks_updated,
        },
        Some(&human),
    )
}

pub fn run_list(global: GlobalOptions) -> Result<()> {
    let ctx = load_context(&global)?;
    let counts = ctx.store.get_stats().tasks_by_tag;
    let entries: Vec<TagListEntry<'_>> = ctx
        .store
        .tags()
        .map(|tag| TagListEntry {
            tag,
            tasks: counts.get(&tag.id).copied().unwrap_or(0),
        })
        .collect();

    let mut human = HumanOutput::new(format!("Tags ({})", entries.len()));
    for entry in &entries {
        human.push_detail(format!(
            "{} {} {} ({} tasks)",
            entry.tag.id, entry.tag.name, entry.tag.color, entry.tasks
        ));
    }
    if entries.is_empty() {
        human.push_next_step("taskdeck tag add <name> --color <hex>");
    }
    emit_success(global.output(), "tag list", &entries, Some(&human))
}
