use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use client_core::{practice_page::DEFAULT_PROBLEM_COUNT, FilePreferences};
use serde::Deserialize;
use shared::protocol::DEFAULT_PRACTICE_MODE;

pub const CONFIG_FILE: &str = "learnbot.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub data_dir: Option<PathBuf>,
    pub problem_count: usize,
    pub practice_mode: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".into(),
            data_dir: None,
            problem_count: DEFAULT_PROBLEM_COUNT,
            practice_mode: DEFAULT_PRACTICE_MODE.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    server_url: Option<String>,
    data_dir: Option<PathBuf>,
    problem_count: Option<usize>,
    practice_mode: Option<String>,
}

impl Settings {
    /// Preferences live here unless overridden.
    pub fn data_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => FilePreferences::default_dir(),
        }
    }
}

pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = config_path.unwrap_or(Path::new(CONFIG_FILE));
    load_settings_from(path, config_path.is_some(), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file, then the environment. A missing file is only
/// an error when it was asked for explicitly.
pub fn load_settings_from(
    path: &Path,
    required: bool,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file_cfg = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<FileConfig>(&raw)
            .with_context(|| format!("failed to parse config '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
            FileConfig::default()
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config '{}'", path.display()))
        }
    };

    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.data_dir {
        settings.data_dir = Some(v);
    }
    if let Some(v) = file_cfg.problem_count {
        settings.problem_count = v;
    }
    if let Some(v) = file_cfg.practice_mode {
        settings.practice_mode = v;
    }

    if let Some(v) = env("LEARNBOT_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__DATA_DIR") {
        settings.data_dir = Some(PathBuf::from(v));
    }

    if let Some(v) = env("APP__PROBLEM_COUNT") {
        if let Ok(parsed) = v.trim().parse::<usize>() {
            settings.problem_count = parsed;
        }
    }

    if let Some(v) = env("APP__PRACTICE_MODE") {
        if !v.trim().is_empty() {
            settings.practice_mode = v.trim().to_string();
        }
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
