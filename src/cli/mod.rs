//! Command-line interface for taskdeck
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{self, Config};
use crate::error::Result;
use crate::output::OutputOptions;
use crate::storage::{self, Storage};
use crate::store::TaskStore;
use crate::time::{parse_stamp, FixedClock, SystemClock};

mod dashboard;
mod folder;
mod init;
mod settings;
mod tag;
mod task;

/// taskdeck - personal task manager
///
/// Hierarchical tasks, tags, smart folders, kanban and calendar views, and
/// dashboard statistics, stored in a single local JSON snapshot.
#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Snapshot file (defaults to the platform data directory)
    #[arg(long, global = true, env = "TASKDECK_DATA")]
    pub data: Option<PathBuf>,

    /// Config file (defaults to config.toml beside the snapshot)
    #[arg(long, global = true, env = "TASKDECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pin "now" to a fixed local time (YYYY-MM-DDTHH:mm)
    #[arg(long, global = true, env = "TASKDECK_NOW", hide = true)]
    pub now: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the snapshot and a default config file
    Init {
        /// Seed sample tags and tasks
        #[arg(long)]
        demo: bool,
    },

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Tag management
    #[command(subcommand)]
    Tag(TagCommands),

    /// Smart folder management
    #[command(subcommand)]
    Folder(FolderCommands),

    /// Dashboard statistics
    Stats,

    /// Kanban board grouped by status
    Board,

    /// Tasks grouped by due date
    Calendar {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Tasks created and completed per day
    Trend {
        /// Number of days ending today (defaults to dashboard.trend_days)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Set the current view: LIST, KANBAN, CALENDAR, MIND_MAP
    View { view: String },

    /// Set the theme: LIGHT, DARK, CUSTOM
    Theme {
        theme: String,

        /// Custom theme entry (key=value); replaces the stored custom theme
        #[arg(long = "set", value_name = "KEY=VALUE")]
        entries: Vec<String>,
    },

    /// Show view settings
    Settings,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    Add {
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Initial status (defaults to tasks.default_status)
        #[arg(long)]
        status: Option<String>,

        /// Priority: HIGH, MEDIUM, LOW (defaults to tasks.default_priority)
        #[arg(short, long)]
        priority: Option<String>,

        /// Tag id (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Due date (YYYY-MM-DDTHH:mm or YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Estimated minutes
        #[arg(long)]
        estimate: Option<u32>,

        #[arg(long)]
        assignee: Option<String>,

        /// Create as a subtask of this task
        #[arg(long)]
        parent: Option<String>,

        /// Repeat: DAILY, WEEKLY, MONTHLY, CUSTOM
        #[arg(long)]
        repeat: Option<String>,
    },

    /// Update task fields
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,

        #[arg(long)]
        clear_description: bool,

        #[arg(long)]
        status: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        /// Replace tags with these ids (repeatable)
        #[arg(long = "tag", conflicts_with = "clear_tags")]
        tags: Vec<String>,

        #[arg(long)]
        clear_tags: bool,

        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        #[arg(long)]
        clear_due: bool,

        #[arg(long, conflicts_with = "clear_estimate")]
        estimate: Option<u32>,

        #[arg(long)]
        clear_estimate: bool,

        #[arg(long, conflicts_with = "clear_assignee")]
        assignee: Option<String>,

        #[arg(long)]
        clear_assignee: bool,

        #[arg(long, conflicts_with = "clear_repeat")]
        repeat: Option<String>,

        #[arg(long)]
        clear_repeat: bool,
    },

    /// Delete a task and all of its subtasks
    Rm { id: String },

    /// Mark a task as completed
    Done { id: String },

    /// Change a task's status
    Status { id: String, status: String },

    /// Change a task's priority
    Priority { id: String, priority: String },

    /// Record a focus session
    Focus {
        id: String,

        /// Session start (YYYY-MM-DDTHH:mm)
        #[arg(long)]
        start: Option<String>,

        /// Session end (defaults to now)
        #[arg(long)]
        end: Option<String>,

        /// Session length in minutes, ending at --end
        #[arg(long, conflicts_with = "start")]
        minutes: Option<u32>,
    },

    /// Show a task with its parent and children
    Show { id: String },

    /// Show a task and all of its descendants
    Tree { id: String },

    /// List tasks
    List {
        #[arg(long)]
        status: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        #[arg(long)]
        tag: Option<String>,

        /// Only tasks due strictly before this time
        #[arg(long)]
        due_before: Option<String>,

        /// Only tasks due strictly after this time
        #[arg(long)]
        due_after: Option<String>,

        /// Sort key: due, priority, created, updated
        #[arg(long, default_value = "due")]
        sort: String,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
    },

    /// Select a task, or clear the selection
    Select {
        #[arg(required_unless_present = "clear")]
        id: Option<String>,

        #[arg(long, conflicts_with = "id")]
        clear: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TagCommands {
    /// Create a tag
    Add {
        name: String,

        #[arg(long, default_value = tag::DEFAULT_COLOR)]
        color: String,
    },

    /// Rename or recolor a tag
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a tag and remove it from every task
    Rm { id: String },

    /// List tags
    List,
}

#[derive(Subcommand, Debug)]
pub enum FolderCommands {
    /// Create a smart folder
    Add {
        name: String,

        /// Filter criterion (key=value; keys: status, priority, tag, dueDateBefore, dueDateAfter)
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
    },

    /// Rename a smart folder or replace its filter
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        /// Replacement filter criterion (repeatable)
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
    },

    /// Delete a smart folder
    Rm { id: String },

    /// List smart folders
    List,

    /// Tasks matching a smart folder
    Tasks { id: String },
}

/// Flags shared by every command
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub data: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub now: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl GlobalOptions {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }
}

pub(crate) struct Context {
    pub store: TaskStore,
    pub config: Config,
    pub snapshot: PathBuf,
    pub config_path: PathBuf,
}

impl Context {
    /// Make sure nothing is left unsaved before reporting success
    pub fn finish(self) -> Result<()> {
        self.store.close()
    }
}

pub(crate) fn load_context(global: &GlobalOptions) -> Result<Context> {
    let guess = global
        .data
        .clone()
        .unwrap_or_else(storage::default_snapshot_path);
    let config_path = config::config_path(global.config.as_deref(), &guess);
    let config = Config::load_or_default(&config_path)?;
    let snapshot = config.snapshot_path(global.data.as_deref());

    let backend = Storage::new(&snapshot)
        .with_lock_timeout(config.storage.lock_timeout_ms)
        .with_pretty(config.storage.pretty);
    let store = match global.now.as_deref() {
        Some(raw) => TaskStore::open(backend, FixedClock(parse_stamp(raw)?))?,
        None => TaskStore::open(backend, SystemClock)?,
    };

    Ok(Context {
        store,
        config,
        snapshot,
        config_path,
    })
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let global = GlobalOptions {
            data: self.data,
            config: self.config,
            now: self.now,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Init { demo } => init::run(init::InitOptions { demo, global }),
            Commands::Task(cmd) => match cmd {
                TaskCommands::Add {
                    title,
                    description,
                    status,
                    priority,
                    tags,
                    due,
                    estimate,
                    assignee,
                    parent,
                    repeat,
                } => task::run_add(task::AddOptions {
                    title,
                    description,
                    status,
                    priority,
                    tags,
                    due,
                    estimate,
                    assignee,
                    parent,
                    repeat,
                    global,
                }),
                TaskCommands::Edit {
                    id,
                    title,
                    description,
                    clear_description,
                    status,
                    priority,
                    tags,
                    clear_tags,
                    due,
                    clear_due,
                    estimate,
                    clear_estimate,
                    assignee,
                    clear_assignee,
                    repeat,
                    clear_repeat,
                } => task::run_edit(task::EditOptions {
                    id,
                    title,
                    description: clearable(description, clear_description),
                    status,
                    priority,
                    tags: if clear_tags {
                        Some(Vec::new())
                    } else if tags.is_empty() {
                        None
                    } else {
                        Some(tags)
                    },
                    due: clearable(due, clear_due),
                    estimate: clearable(estimate, clear_estimate),
                    assignee: clearable(assignee, clear_assignee),
                    repeat: clearable(repeat, clear_repeat),
                    global,
                }),
                TaskCommands::Rm { id } => task::run_rm(task::IdOptions { id, global }),
                TaskCommands::Done { id } => task::run_done(task::IdOptions { id, global }),
                TaskCommands::Status { id, status } => {
                    task::run_status(task::StatusOptions { id, status, global })
                }
                TaskCommands::Priority { id, priority } => {
                    task::run_priority(task::PriorityOptions {
                        id,
                        priority,
                        global,
                    })
                }
                TaskCommands::Focus {
                    id,
                    start,
                    end,
                    minutes,
                } => task::run_focus(task::FocusOptions {
                    id,
                    start,
                    end,
                    minutes,
                    global,
                }),
                TaskCommands::Show { id } => task::run_show(task::IdOptions { id, global }),
                TaskCommands::Tree { id } => task::run_tree(task::IdOptions { id, global }),
                TaskCommands::List {
                    status,
                    priority,
                    tag,
                    due_before,
                    due_after,
                    sort,
                    desc,
                    all,
                } => task::run_list(task::ListOptions {
                    status,
                    priority,
                    tag,
                    due_before,
                    due_after,
                    sort,
                    desc,
                    all,
                    global,
                }),
                TaskCommands::Select { id, clear } => task::run_select(task::SelectOptions {
                    id: if clear { None } else { id },
                    global,
                }),
            },
            Commands::Tag(cmd) => match cmd {
                TagCommands::Add { name, color } => {
                    tag::run_add(tag::AddOptions { name, color, global })
                }
                TagCommands::Edit { id, name, color } => tag::run_edit(tag::EditOptions {
                    id,
                    name,
                    color,
                    global,
                }),
                TagCommands::Rm { id } => tag::run_rm(id, global),
                TagCommands::List => tag::run_list(global),
            },
            Commands::Folder(cmd) => match cmd {
                FolderCommands::Add { name, filters } => folder::run_add(folder::AddOptions {
                    name,
                    filters,
                    global,
                }),
                FolderCommands::Edit { id, name, filters } => {
                    folder::run_edit(folder::EditOptions {
                        id,
                        name,
                        filters,
                        global,
                    })
                }
                FolderCommands::Rm { id } => folder::run_rm(id, global),
                FolderCommands::List => folder::run_list(global),
                FolderCommands::Tasks { id } => folder::run_tasks(id, global),
            },
            Commands::Stats => dashboard::run_stats(global),
            Commands::Board => dashboard::run_board(global),
            Commands::Calendar { from, to } => {
                dashboard::run_calendar(dashboard::CalendarOptions { from, to, global })
            }
            Commands::Trend { days } => dashboard::run_trend(dashboard::TrendOptions { days, global }),
            Commands::View { view } => settings::run_view(view, global),
            Commands::Theme { theme, entries } => settings::run_theme(settings::ThemeOptions {
                theme,
                entries,
                global,
            }),
            Commands::Settings => settings::run_show(global),
        }
    }
}

/// `Some(Some(v))` to set, `Some(None)` to clear, `None` to leave as is
fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}
