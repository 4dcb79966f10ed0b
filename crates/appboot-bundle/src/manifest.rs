//! Signature manifest of a candidate bundle.
//!
//! The manifest is a flat JSON object. Every key except
//! [`SELF_SIGNATURE_KEY`] is a path relative to the bundle directory whose
//! value is the base64 RSA signature of that file. The reserved key holds the
//! signature of the manifest itself: the compact JSON serialization of the
//! object with the reserved key removed, keys in document order.
//!
//! ```json
//! {
//!   "app.js": "kT0m...",
//!   "lib/core.js": "Qx9a...",
//!   "selfSignature": "b3Jp..."
//! }
//! ```

use crate::{SELF_SIGNATURE_KEY, VerifyError, VerifyResult};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};

/// One signed resource listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path relative to the bundle directory.
    pub path: String,
    /// Base64-encoded signature of the file contents.
    pub signature: String,
}

impl ManifestEntry {
    pub fn new(path: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            signature: signature.into(),
        }
    }

    /// Location of this resource inside `bundle_dir`.
    ///
    /// Returns `None` for paths that are empty, absolute, or step outside the
    /// bundle directory.
    #[must_use]
    pub fn resolve(&self, bundle_dir: &Path) -> Option<PathBuf> {
        resolve_relative(bundle_dir, &self.path)
    }
}

/// Join a manifest-relative path onto `bundle_dir`, rejecting anything but
/// plain descending components (a leading `./` is allowed).
pub(crate) fn resolve_relative(bundle_dir: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    let mut names = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => names += 1,
            Component::CurDir => {}
            _ => return None,
        }
    }

    (names > 0).then(|| bundle_dir.join(relative))
}

/// A parsed signature manifest.
///
/// Immutable once loaded; the signed payload is fixed at parse time so the
/// bytes checked against the self-signature are exactly the bytes the entry
/// list was derived from.
#[derive(Debug, Clone)]
pub struct SignatureManifest {
    self_signature: String,
    entries: Vec<ManifestEntry>,
    signed_payload: Vec<u8>,
}

impl SignatureManifest {
    /// Load a manifest file, requiring `main_entry` to be listed.
    pub fn load(path: &Path, main_entry: &str) -> VerifyResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VerifyError::ManifestMissing(path.to_path_buf())
            } else {
                VerifyError::ManifestMalformed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        })?;

        Self::from_slice(&bytes, path, main_entry)
    }

    /// Parse manifest bytes. `path` is only used in error messages.
    pub fn from_slice(bytes: &[u8], path: &Path, main_entry: &str) -> VerifyResult<Self> {
        let malformed = |reason: String| VerifyError::ManifestMalformed {
            path: path.to_path_buf(),
            reason,
        };

        let value: Value = serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(malformed("manifest is not a JSON object".to_string()));
        };

        let self_signature = match object.shift_remove(SELF_SIGNATURE_KEY) {
            Some(Value::String(signature)) if !signature.is_empty() => signature,
            Some(Value::String(_)) | None => {
                return Err(VerifyError::InvalidManifest(format!(
                    "missing {SELF_SIGNATURE_KEY}"
                )));
            }
            Some(_) => {
                return Err(VerifyError::InvalidManifest(format!(
                    "{SELF_SIGNATURE_KEY} is not a string"
                )));
            }
        };

        if !object.contains_key(main_entry) {
            return Err(VerifyError::InvalidManifest(format!(
                "main entry {main_entry} is not signed"
            )));
        }

        let entries = object
            .iter()
            .map(|(key, value)| match value {
                Value::String(signature) => Ok(ManifestEntry::new(key.as_str(), signature.as_str())),
                _ => Err(malformed(format!("signature for {key} is not a string"))),
            })
            .collect::<VerifyResult<Vec<_>>>()?;

        let signed_payload = serde_json::to_vec(&object).map_err(|e| malformed(e.to_string()))?;

        Ok(Self {
            self_signature,
            entries,
            signed_payload,
        })
    }

    /// Assemble a manifest from signed entries and their self-signature.
    pub fn from_parts(
        entries: Vec<ManifestEntry>,
        self_signature: String,
    ) -> Result<Self, serde_json::Error> {
        let signed_payload = Self::payload_for(&entries)?;
        Ok(Self {
            self_signature,
            entries,
            signed_payload,
        })
    }

    /// The bytes the self-signature covers for a given entry list.
    pub fn payload_for(entries: &[ManifestEntry]) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&entries_to_map(entries))
    }

    /// The self-signature (base64).
    #[must_use]
    pub fn self_signature(&self) -> &str {
        &self.self_signature
    }

    /// Signed resources in document order.
    #[must_use]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Bytes covered by the self-signature.
    #[must_use]
    pub fn signed_payload(&self) -> &[u8] {
        &self.signed_payload
    }

    /// Serialize to the on-disk JSON form, reserved key last.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut object = entries_to_map(&self.entries);
        object.insert(
            SELF_SIGNATURE_KEY.to_string(),
            Value::String(self.self_signature.clone()),
        );
        serde_json::to_string_pretty(&object)
    }
}

fn entries_to_map(entries: &[ManifestEntry]) -> Map<String, Value> {
    entries
        .iter()
        .map(|entry| (entry.path.clone(), Value::String(entry.signature.clone())))
        .collect()
}
