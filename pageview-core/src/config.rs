use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};

/// Tunables of the document view. Every field has a default, so a config
/// file only needs the keys it changes.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Factor applied by one zoom-in or zoom-out step.
    pub zoom_increment: f32,
    pub page_padding: f32,
    pub visible_margin: f32,
    /// Pixel extent probed when asking for the current page.
    pub current_page_probe_height: f32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub search_poll_interval: Duration,
    pub history_capacity: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            zoom_increment: 1.2,
            page_padding: 0.0,
            visible_margin: 1.0,
            current_page_probe_height: 100.0,
            search_poll_interval: Duration::from_millis(100),
            history_capacity: 100,
        }
    }
}

impl ViewerConfig {
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).context("failed to parse viewer config")?;
        Ok(config.sanitized())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::from_toml(&source).with_context(|| format!("invalid config file {:?}", path))
    }

    /// Loads `path` when given, otherwise the platform default location.
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.zoom_increment.is_finite() && self.zoom_increment > 1.0) {
            self.zoom_increment = defaults.zoom_increment;
        }
        if !self.page_padding.is_finite() || self.page_padding < 0.0 {
            self.page_padding = defaults.page_padding;
        }
        if !self.visible_margin.is_finite() || self.visible_margin < 0.0 {
            self.visible_margin = defaults.visible_margin;
        }
        if !(self.current_page_probe_height.is_finite() && self.current_page_probe_height > 0.0) {
            self.current_page_probe_height = defaults.current_page_probe_height;
        }
        self.history_capacity = self.history_capacity.max(1);
        self
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("net", "pageview", "pageview")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}
