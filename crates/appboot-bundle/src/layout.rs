//! File names that make up a bundle on disk.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fixed names used to locate bundles and their contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleLayout {
    /// Directory name of the candidate bundle under the user data directory.
    pub archive_name: String,

    /// Package descriptor file inside a bundle.
    pub descriptor_file: String,

    /// Signature manifest file inside a candidate bundle.
    pub manifest_file: String,

    /// Startup module the caller loads from the selected entry point.
    pub startup_module: String,

    /// Manifest entry that must be present (the main application code).
    pub main_entry: String,
}

impl Default for BundleLayout {
    fn default() -> Self {
        Self {
            archive_name: "app".to_string(),
            descriptor_file: "package.json".to_string(),
            manifest_file: "signatures.json".to_string(),
            startup_module: "app.js".to_string(),
            main_entry: "app.js".to_string(),
        }
    }
}

impl BundleLayout {
    /// Candidate bundle directory for a user data directory.
    #[must_use]
    pub fn candidate_dir(&self, user_data_dir: &Path) -> PathBuf {
        user_data_dir.join(&self.archive_name)
    }

    /// Package descriptor path inside a bundle.
    #[must_use]
    pub fn descriptor_path(&self, bundle_dir: &Path) -> PathBuf {
        bundle_dir.join(&self.descriptor_file)
    }

    /// Signature manifest path inside a bundle.
    #[must_use]
    pub fn manifest_path(&self, bundle_dir: &Path) -> PathBuf {
        bundle_dir.join(&self.manifest_file)
    }

    /// Startup module path inside a bundle.
    #[must_use]
    pub fn startup_module_path(&self, bundle_dir: &Path) -> PathBuf {
        bundle_dir.join(&self.startup_module)
    }

    /// Check that no name is empty.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("archive_name", &self.archive_name),
            ("descriptor_file", &self.descriptor_file),
            ("manifest_file", &self.manifest_file),
            ("startup_module", &self.startup_module),
            ("main_entry", &self.main_entry),
        ];

        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(format!("layout.{field} cannot be empty"));
            }
        }

        Ok(())
    }
}
