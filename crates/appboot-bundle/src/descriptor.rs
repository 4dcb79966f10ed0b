//! Package descriptor (`package.json`) of a bundle.

use crate::{ProbeError, Version};
use serde::Deserialize;
use std::path::Path;

/// The subset of a bundle's package descriptor the loader cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageDescriptor {
    /// Package name, informational only.
    #[serde(default)]
    pub name: Option<String>,

    /// Dotted-integer version string.
    pub version: String,
}

impl PackageDescriptor {
    /// Read and parse a descriptor file.
    pub fn from_file(path: &Path) -> Result<Self, ProbeError> {
        let json = std::fs::read_to_string(path).map_err(|source| ProbeError::DescriptorRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&json).map_err(|e| ProbeError::DescriptorParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse the declared version.
    pub fn parsed_version(&self, path: &Path) -> Result<Version, ProbeError> {
        Version::parse(&self.version).map_err(|reason| ProbeError::DescriptorParse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Read a descriptor file and return its parsed version.
    pub fn read_version(path: &Path) -> Result<Version, ProbeError> {
        Self::from_file(path)?.parsed_version(path)
    }
}
