//! View settings: `view`, `theme`, `settings`.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::cli::{load_context, GlobalOptions};
use crate::error::{Error, Result};
use crate::model::{Theme, View};
use crate::output::{emit_success, HumanOutput};
use crate::store::Settings;

pub struct ThemeOptions {
    pub theme: String,
    pub entries: Vec<String>,
    pub global: GlobalOptions,
}

fn describe(settings: &Settings, human: &mut HumanOutput) {
    human.push_summary("View", settings.current_view.as_str());
    human.push_summary("Theme", settings.theme.as_str());
    human.push_summary(
        "Selected task",
        settings.selected_task_id.clone().unwrap_or_else(|| "none".to_string()),
    );
    if let Some(custom) = &settings.custom_theme {
        for (key, value) in custom {
            human.push_detail(format!("{key} = {value}"));
        }
    }
}

fn parse_theme_entries(entries: &[String]) -> Result<BTreeMap<String, String>> {
    let mut custom = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            Error::InvalidArgument(format!("theme entry '{entry}' must look like key=value"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "theme entry '{entry}' has an empty key"
            )));
        }
        custom.insert(key.to_string(), value.trim().to_string());
    }
    Ok(custom)
}

pub fn run_view(view: String, global: GlobalOptions) -> Result<()> {
    let view = View::from_str(&view)?;
    let mut ctx = load_context(&global)?;
    ctx.store.set_current_view(view);
    let settings = ctx.store.settings();

    let mut human = HumanOutput::new(format!("View set to {view}"));
    describe(&settings, &mut human);

    ctx.finish()?;
    emit_success(global.output(), "view", &settings, Some(&human))
}

pub fn run_theme(options: ThemeOptions) -> Result<()> {
    let theme = Theme::from_str(&options.theme)?;
    let custom = if options.entries.is_empty() {
        None
    } else {
        Some(parse_theme_entries(&options.entries)?)
    };

    let mut ctx = load_context(&options.global)?;
    ctx.store.set_theme(theme, custom);
    let settings = ctx.store.settings();

    let mut human = HumanOutput::new(format!("Theme set to {theme}"));
    describe(&settings, &mut human);

    ctx.finish()?;
    emit_success(options.global.output(), "theme", &settings, Some(&human))
}

pub fn run_show(global: GlobalOptions) -> Result<()> {
    let ctx = load_context(&global)?;
    let settings = ctx.store.settings();

    let mut human = HumanOutput::new("Settings");
    describe(&settings, &mut human);
    human.push_summary("Snapshot", ctx.snapshot.display().to_string());
    human.push_summary("Config", ctx.config_path.display().to_string());

    emit_success(global.output(), "settings", &settings, Some(&human))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_entries_parse() {
        let entries = vec!["primary = #123456".to_string(), "radius=4px".to_string()];
        let custom = parse_theme_entries(&entries).unwrap();
        assert_eq!(custom["primary"], "#123456");
        assert_eq!(custom["radius"], "4px");
        assert!(parse_theme_entries(&["=x".to_string()]).is_err());
        assert!(parse_theme_entries(&["nope".to_string()]).is_err());
    }
}
