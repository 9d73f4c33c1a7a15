use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "menu.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterSettings {
    /// Ticks to wait before re-presenting a menu whose close was vetoed.
    pub reopen_delay_ticks: u64,
    /// Cancel clicks on other surfaces (e.g. the user's own inventory) while
    /// a menu is open.
    pub cancel_foreign_clicks: bool,
    pub event_buffer: usize,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            reopen_delay_ticks: 1,
            cancel_foreign_clicks: false,
            event_buffer: 64,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    reopen_delay_ticks: Option<u64>,
    cancel_foreign_clicks: Option<bool>,
    event_buffer: Option<usize>,
}

/// Defaults, then `menu.toml` in the working directory if present, then
/// `APP__*` environment overrides.
pub fn load_settings() -> RouterSettings {
    let mut settings = RouterSettings::default();

    match read_file_settings(Path::new(DEFAULT_SETTINGS_FILE)) {
        Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
        Err(error) if Path::new(DEFAULT_SETTINGS_FILE).exists() => {
            warn!(%error, "ignoring unreadable {DEFAULT_SETTINGS_FILE}");
        }
        Err(_) => {}
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

/// Like [`load_settings`] but the file is mandatory.
pub fn load_settings_from(path: &Path) -> anyhow::Result<RouterSettings> {
    let mut settings = RouterSettings::default();
    let file_cfg = read_file_settings(path)?;
    apply_file_settings(&mut settings, file_cfg);
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_file_settings(path: &Path) -> anyhow::Result<FileSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))
}

fn apply_file_settings(settings: &mut RouterSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.reopen_delay_ticks {
        settings.reopen_delay_ticks = v;
    }
    if let Some(v) = file_cfg.cancel_foreign_clicks {
        settings.cancel_foreign_clicks = v;
    }
    if let Some(v) = file_cfg.event_buffer {
        settings.event_buffer = v;
    }
    settings.normalize();
}

fn apply_env_overrides(settings: &mut RouterSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("APP__REOPEN_DELAY_TICKS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.reopen_delay_ticks = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid APP__REOPEN_DELAY_TICKS"),
        }
    }
    if let Some(v) = var("APP__CANCEL_FOREIGN_CLICKS") {
        match v.parse::<bool>() {
            Ok(parsed) => settings.cancel_foreign_clicks = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid APP__CANCEL_FOREIGN_CLICKS"),
        }
    }
    if let Some(v) = var("APP__EVENT_BUFFER") {
        match v.parse::<usize>() {
            Ok(parsed) => settings.event_buffer = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid APP__EVENT_BUFFER"),
        }
    }
    settings.normalize();
}

impl RouterSettings {
    /// Raises the reopen delay and event buffer to at least 1.
    pub(crate) fn normalize(&mut self) {
        self.reopen_delay_ticks = self.reopen_delay_ticks.max(1);
        self.event_buffer = self.event_buffer.max(1);
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
