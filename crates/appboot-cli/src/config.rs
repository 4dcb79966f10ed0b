//! Loader configuration (`appboot.toml`)

use anyhow::{Context, Result};
use appboot_bundle::BundleLayout;
use appboot_logging::{LogFormat, LogLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up next to the executable when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "appboot.toml";

/// appboot.toml structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootConfig {
    /// Base install directory (default: directory of the executable)
    pub install_dir: Option<PathBuf>,

    /// Per-user directory the updater writes candidate bundles into
    pub user_data_dir: Option<PathBuf>,

    pub log_level: LogLevel,

    pub log_format: LogFormat,

    pub layout: BundleLayout,

    /// Program started with the selected startup module
    pub launcher: Option<LauncherConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,
}

/// Values given on the command line, taking precedence over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub install_dir: Option<PathBuf>,
    pub user_data_dir: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
}

impl BootConfig {
    /// Load config from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Parse config from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }

    /// Load `explicit`, or `appboot.toml` next to the executable if present,
    /// or fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default_path = executable_dir()?.join(CONFIG_FILE_NAME);
        if default_path.is_file() {
            Self::from_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(dir) = overrides.install_dir {
            self.install_dir = Some(dir);
        }
        if let Some(dir) = overrides.user_data_dir {
            self.user_data_dir = Some(dir);
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<()> {
        self.layout
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid [layout] section")?;

        if let Some(launcher) = &self.launcher
            && launcher.program.trim().is_empty()
        {
            anyhow::bail!("launcher.program cannot be empty");
        }

        Ok(())
    }

    /// Install directory, defaulting to the executable's directory.
    pub fn install_dir(&self) -> Result<PathBuf> {
        match &self.install_dir {
            Some(dir) => Ok(dir.clone()),
            None => executable_dir(),
        }
    }

    /// Base bundle directory inside the install directory.
    pub fn base_bundle_dir(&self) -> Result<PathBuf> {
        Ok(self.install_dir()?.join(&self.layout.archive_name))
    }

    pub fn user_data_dir(&self) -> Result<&Path> {
        self.user_data_dir.as_deref().context(
            "user data directory not configured (set user_data_dir, --user-data-dir or APPBOOT_USER_DATA_DIR)",
        )
    }
}

fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Could not determine executable path")?;
    exe.parent()
        .map(Path::to_path_buf)
        .context("Executable path has no parent directory")
}
