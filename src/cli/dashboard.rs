//! Dashboard commands: `stats`, `board`, `calendar`, `trend`.

use serde::Serialize;

use crate::cli::task::task_line;
use crate::cli::{load_context, GlobalOptions};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::stats::{TaskStats, MAX_TREND_DAYS};
use crate::time::parse_date;

pub struct CalendarOptions {
    pub from: Option<String>,
    pub to: Option<String>,
    pub global: GlobalOptions,
}

pub struct TrendOptions {
    pub days: Option<u32>,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsOutput {
    #[serde(flatten)]
    stats: TaskStats,
    completion_rate: u32,
    overdue_rate: u32,
}

fn format_counts<K: std::fmt::Display>(counts: impl IntoIterator<Item = (K, usize)>) -> String {
    counts
        .into_iter()
        .map(|(key, count)| format!("{key}={count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn run_stats(global: GlobalOptions) -> Result<()> {
    let ctx = load_context(&global)?;
    let stats = ctx.store.get_stats();

    let mut human = HumanOutput::new("Dashboard");
    human.push_summary("Tasks", stats.total_tasks.to_string());
    human.push_summary(
        "Completed",
        format!("{} ({}%)", stats.completed_tasks, stats.completion_rate()),
    );
    human.push_summary(
        "Overdue",
        format!("{} ({}%)", stats.overdue_tasks, stats.overdue_rate()),
    );
    human.push_summary("High priority", stats.high_priority_tasks.to_string());
    human.push_summary(
        "Avg completion",
        match stats.average_completion_time {
            Some(minutes) => format!("{minutes:.1} min"),
            None => "n/a".to_string(),
        },
    );
    human.push_summary("Focus today", format!("{} min", stats.focus_time_today));
    human.push_detail(format!(
        "By status: {}",
        format_counts(stats.tasks_by_status.iter().map(|(k, v)| (k, *v)))
    ));
    human.push_detail(format!(
        "By priority: {}",
        format_counts(stats.tasks_by_priority.iter().map(|(k, v)| (k, *v)))
    ));
    if !stats.tasks_by_tag.is_empty() {
        human.push_detail(format!(
            "By tag: {}",
            format_counts(stats.tasks_by_tag.iter().map(|(id, count)| {
                let label = ctx
                    .store
                    .get_tag(id)
                    .map(|tag| tag.name.clone())
                    .unwrap_or_else(|| id.clone());
                (label, *count)
            }))
        ));
    }

    let output = StatsOutput {
        completion_rate: stats.completion_rate(),
        overdue_rate: stats.overdue_rate(),
        stats,
    };
    emit_success(global.output(), "stats", &output, Some(&human))
}

pub fn run_board(global: GlobalOptions) -> Result<()> {
    let ctx = load_context(&global)?;
    let now = ctx.store.now();
    let columns = ctx.store.board();

    let mut human = HumanOutput::new("Board");
    for column in &columns {
        human.push_summary(column.status.as_str(), column.tasks.len().to_string());
    }
    for column in columns.iter().filter(|column| !column.tasks.is_empty()) {
        human.push_detail(format!("{}:", column.status));
        for task in &column.tasks {
            human.push_detail(format!("  {}", task_line(task, now)));
        }
    }
    emit_success(global.output(), "board", &columns, Some(&human))
}

pub fn run_calendar(options: CalendarOptions) -> Result<()> {
    let from = options.from.as_deref().map(parse_date).transpose()?;
    let to = options.to.as_deref().map(parse_date).transpose()?;
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(Error::InvalidArgument(format!(
                "--from {from} is after --to {to}"
            )));
        }
    }

    let ctx = load_context(&options.global)?;
    let now = ctx.store.now();
    let days = ctx.store.calendar(from, to);

    let mut human = HumanOutput::new(format!("Calendar ({} days with tasks)", days.len()));
    for day in &days {
        human.push_detail(format!(
            "{}: {} tasks, {} high priority, {} overdue",
            day.date,
            day.tasks.len(),
            day.high_priority,
            day.overdue
        ));
        for task in &day.tasks {
            human.push_detail(format!("  {}", task_line(task, now)));
        }
    }
    emit_success(options.global.output(), "calendar", &days, Some(&human))
}

pub fn run_trend(options: TrendOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let days = options.days.unwrap_or(ctx.config.dashboard.trend_days);
    if days == 0 || days > MAX_TREND_DAYS {
        return Err(Error::InvalidArgument(format!(
            "--days must be between 1 and {MAX_TREND_DAYS}"
        )));
    }
    let points = ctx.store.trend(days)?;

    let mut human = HumanOutput::new(format!("Trend (last {days} days)"));
    for point in &points {
        human.push_detail(format!(
            "{}: created {}, completed {}",
            point.date, point.created, point.completed
        ));
    }
    emit_success(options.global.output(), "trend", &points, Some(&human))
}
