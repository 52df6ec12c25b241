//! taskdeck init command implementation
//!
//! Creates the snapshot file and a default config next to it.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::{load_context, GlobalOptions};
use crate::config::Config;
use crate::demo::{self, DemoSummary};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

pub struct InitOptions {
    pub demo: bool,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct InitReport {
    snapshot: PathBuf,
    config: PathBuf,
    created: InitCreated,
    #[serde(skip_serializing_if = "Option::is_none")]
    demo: Option<DemoSummary>,
}

#[derive(Serialize)]
struct InitCreated {
    snapshot: bool,
    config: bool,
}

pub fn run(options: InitOptions) -> Result<()> {
    let mut ctx = load_context(&options.global)?;

    let created_snapshot = !ctx.snapshot.exists();
    let created_config = ensure_config(&ctx.config_path, &ctx.config)?;

    let demo = if options.demo {
        Some(demo::seed(&mut ctx.store)?)
    } else {
        None
    };
    ctx.store.flush()?;

    let report = InitReport {
        snapshot: ctx.snapshot.clone(),
        config: ctx.config_path.clone(),
        created: InitCreated {
            snapshot: created_snapshot,
            config: created_config,
        },
        demo,
    };

    let mut human = HumanOutput::new("taskdeck initialized");
    human.push_summary("Snapshot", report.snapshot.display().to_string());
    human.push_summary("Config", report.config.display().to_string());
    let mut created_items = Vec::new();
    if created_snapshot {
        created_items.push("snapshot");
    }
    if created_config {
        created_items.push("config");
    }
    human.push_summary(
        "Created",
        if created_items.is_empty() {
            "nothing (already initialized)".to_string()
        } else {
            created_items.join(", ")
        },
    );
    if let Some(summary) = &report.demo {
        human.push_summary(
            "Demo data",
            format!("{} tags, {} tasks", summary.tags, summary.tasks),
        );
    }
    human.push_next_step("taskdeck task add \"<title>\"");
    human.push_next_step("taskdeck stats");

    ctx.finish()?;
    emit_success(options.global.output(), "init", &report, Some(&human))
}

/// Write the current (possibly default) config if no file exists yet
fn ensure_config(path: &Path, config: &Config) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    config.save(path)?;
    Ok(true)
}
