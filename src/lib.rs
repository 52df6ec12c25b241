//! taskdeck - personal task manager library
//!
//! The core is [`store::TaskStore`]: tasks with parent/child links, tags,
//! smart folders and view settings, mirrored to a JSON snapshot after every
//! mutation. The `taskdeck` binary is a thin CLI over it.
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `config.toml`
//! - `demo`: Sample data for `init --demo`
//! - `error`: Error types and result aliases
//! - `filter`: Task filters, smart folder descriptors and list sorting
//! - `lock`: File locking and atomic writes
//! - `model`: Tasks, tags, smart folders and settings enums
//! - `output`: Human and JSON output
//! - `stats`: Dashboard aggregates and daily trend
//! - `storage`: Snapshot backends
//! - `store`: The task store
//! - `time`: Local timestamps and clocks
//! - `views`: Kanban board and calendar groupings

pub mod cli;
pub mod config;
pub mod demo;
pub mod error;
pub mod filter;
pub mod lock;
pub mod model;
pub mod output;
pub mod stats;
pub mod storage;
pub mod store;
pub mod time;
pub mod views;

pub use error::{Error, Result};
pub use store::TaskStore;
