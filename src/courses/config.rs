//! Configuration primitives for studybase workspaces.
//!
//! Stored in a machine-readable TOML file located at:
//!   %APPDATA%/Studybase/config/config.toml on Windows
//!   $XDG_DATA_HOME/Studybase/config/config.toml on Linux
//!   ~/Library/Application Support/Studybase/config/config.toml on macOS
//!
//! The `STUDYBASE_HOME` environment variable overrides the workspace root,
//! which is how the integration tests isolate themselves.

use crate::error::{Error, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Root configuration persisted per installation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Session engine defaults (exam size, exam countdown).
    #[serde(default)]
    pub session: SessionSettings,
    /// Workbook import defaults (image handling, upload limits).
    #[serde(default)]
    pub import: ImportSettings,
}

/// Knobs for the learning-mode session engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Number of questions sampled for an exam session.
    #[serde(default = "default_exam_question_count")]
    pub exam_question_count: u32,
    /// Exam countdown in seconds.
    #[serde(default = "default_exam_duration_secs")]
    pub exam_duration_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            exam_question_count: default_exam_question_count(),
            exam_duration_secs: default_exam_duration_secs(),
        }
    }
}

const fn default_exam_question_count() -> u32 {
    10
}

const fn default_exam_duration_secs() -> u64 {
    600
}

/// Knobs for the workbook import pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Store row images as inline data URIs instead of blob-store URLs.
    #[serde(default = "default_inline_images")]
    pub inline_images: bool,
    /// Upper bound on accepted workbook uploads.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            inline_images: default_inline_images(),
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

const fn default_inline_images() -> bool {
    true
}

const fn default_max_file_size_mb() -> u64 {
    20
}

/// Standard relative path to the config file (resolved per OS at runtime).
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Returns the root directory where studybase stores data.
///
/// Order of precedence:
/// 1. `STUDYBASE_HOME` environment variable.
/// 2. OS-specific data directory via `directories::BaseDirs`.
pub fn workspace_root() -> Result<PathBuf> {
    if let Ok(path) = env::var("STUDYBASE_HOME") {
        return Ok(PathBuf::from(path));
    }
    let base_dirs = BaseDirs::new().ok_or(Error::NoWorkspace)?;
    Ok(base_dirs.data_dir().join("Studybase"))
}

/// Returns the config directory under the workspace root.
pub fn config_dir() -> Result<PathBuf> {
    Ok(workspace_root()?.join("config"))
}

/// Path to the config file.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from disk or returns defaults.
pub fn load_or_default() -> Result<AppConfig> {
    let path = config_file_path()?;
    if path.exists() {
        let data = fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&data)?;
        Ok(cfg)
    } else {
        Ok(AppConfig::default())
    }
}

/// Persists the configuration to disk.
pub fn save(config: &AppConfig) -> Result<()> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir)?;
    let path = config_file_path()?;
    let data = toml::to_string_pretty(config)?;
    fs::write(&path, data)?;
    Ok(())
}

/// Ensures the workspace structure exists (courses/, stats/, media/).
pub fn ensure_workspace_structure() -> Result<WorkspacePaths> {
    let root = workspace_root()?;
    let courses_dir = root.join("courses");
    let stats_dir = root.join("stats");
    let media_dir = root.join("media");
    fs::create_dir_all(&courses_dir)?;
    fs::create_dir_all(&stats_dir)?;
    fs::create_dir_all(&media_dir)?;
    Ok(WorkspacePaths {
        root,
        courses_dir,
        stats_dir,
        media_dir,
    })
}

/// Convenience struct exposing important workspace paths.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub courses_dir: PathBuf,
    pub stats_dir: PathBuf,
    pub media_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn course_dir(&self, course_id: &uuid::Uuid) -> PathBuf {
        self.courses_dir.join(course_id.to_string())
    }
}
