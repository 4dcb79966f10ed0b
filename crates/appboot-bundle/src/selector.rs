//! Choosing the bundle to boot.
//!
//! The [`BundleSelector`] prefers the candidate bundle in the user data
//! directory only when it is both fresher on disk and declares a newer
//! version than the base bundle, and only after the injected
//! [`BundleVerifier`] has accepted it.
//!
//! Anything that goes wrong while *probing* the candidate (missing files,
//! unreadable metadata, unparseable descriptors) keeps the base bundle.
//! Anything that goes wrong while *verifying* a chosen candidate is returned
//! as a [`VerifyError`]; there is no fallback from a failed verification.

use crate::verifier::{BundleVerifier, VerifiedBundle};
use crate::{BundleLayout, PackageDescriptor, ProbeError, Version, VerifyResult};
use std::fmt;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Where an entry point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleSource {
    /// The bundle shipped with the install.
    Base,
    /// A verified bundle from the user data directory.
    Candidate,
}

impl fmt::Display for BundleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleSource::Base => write!(f, "base"),
            BundleSource::Candidate => write!(f, "candidate"),
        }
    }
}

/// The bundle directory to load the startup module from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    dir: PathBuf,
    source: BundleSource,
    startup_module: PathBuf,
}

impl EntryPoint {
    fn new(dir: &Path, source: BundleSource, layout: &BundleLayout) -> Self {
        Self {
            dir: dir.to_path_buf(),
            source,
            startup_module: layout.startup_module_path(dir),
        }
    }

    /// Selected bundle directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the base or the candidate bundle was selected.
    #[must_use]
    pub fn source(&self) -> BundleSource {
        self.source
    }

    /// Startup module the caller loads and hands control to.
    #[must_use]
    pub fn startup_module(&self) -> &Path {
        &self.startup_module
    }
}

/// Why the selector chose what it chose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionReason {
    /// No candidate bundle exists.
    CandidateMissing,
    /// The candidate is not fresher on disk than the base bundle.
    CandidateStale,
    /// The candidate's version is not newer.
    CandidateNotNewer { candidate: Version, base: Version },
    /// Probing the candidate failed; the base bundle is kept.
    ProbeFailed(String),
    /// The candidate is newer and passed verification.
    CandidateVerified { version: Version, entries: usize },
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionReason::CandidateMissing => write!(f, "no candidate bundle"),
            SelectionReason::CandidateStale => {
                write!(f, "candidate is not fresher than the base bundle")
            }
            SelectionReason::CandidateNotNewer { candidate, base } => {
                write!(f, "candidate version {candidate} is not newer than {base}")
            }
            SelectionReason::ProbeFailed(reason) => {
                write!(f, "candidate ignored: {reason}")
            }
            SelectionReason::CandidateVerified { version, entries } => {
                write!(f, "candidate version {version} verified ({entries} resources)")
            }
        }
    }
}

/// An entry point together with the reason it was selected.
#[derive(Debug, Clone)]
pub struct Selection {
    pub entry_point: EntryPoint,
    pub reason: SelectionReason,
}

/// Result of probing the candidate, before any verification.
enum Probe {
    Missing,
    Stale,
    NotNewer { candidate: Version, base: Version },
    Newer { candidate: Version },
}

/// Selects the entry point bundle at startup.
#[derive(Debug, Clone)]
pub struct BundleSelector<V> {
    layout: BundleLayout,
    verifier: V,
}

impl<V: BundleVerifier> BundleSelector<V> {
    /// Create a selector that verifies candidates with `verifier`.
    pub fn new(layout: BundleLayout, verifier: V) -> Self {
        Self { layout, verifier }
    }

    /// Select the entry point directory.
    ///
    /// Returns the base bundle unless the candidate under `user_data_dir` is
    /// fresher, newer, and verified. A verification failure is returned as an
    /// error and must abort startup.
    pub fn select_entry_point(
        &self,
        base_dir: impl AsRef<Path>,
        user_data_dir: impl AsRef<Path>,
    ) -> VerifyResult<EntryPoint> {
        self.select(base_dir, user_data_dir)
            .map(|selection| selection.entry_point)
    }

    /// Like [`select_entry_point`](Self::select_entry_point), also reporting why.
    pub fn select(
        &self,
        base_dir: impl AsRef<Path>,
        user_data_dir: impl AsRef<Path>,
    ) -> VerifyResult<Selection> {
        let base_dir = base_dir.as_ref();
        let candidate_dir = self.layout.candidate_dir(user_data_dir.as_ref());

        let probe = match self.probe(base_dir, &candidate_dir) {
            Ok(probe) => probe,
            Err(err) => {
                let reason = describe(&err);
                tracing::warn!(error = %reason, "error reading candidate bundle, keeping base bundle");
                return Ok(self.base(base_dir, SelectionReason::ProbeFailed(reason)));
            }
        };

        let selection = match probe {
            Probe::Missing => self.base(base_dir, SelectionReason::CandidateMissing),
            Probe::Stale => self.base(base_dir, SelectionReason::CandidateStale),
            Probe::NotNewer { candidate, base } => {
                self.base(base_dir, SelectionReason::CandidateNotNewer { candidate, base })
            }
            Probe::Newer { candidate } => {
                tracing::info!(
                    candidate = %candidate_dir.display(),
                    version = %candidate,
                    "newer candidate bundle found, verifying"
                );
                let VerifiedBundle { entries, .. } = self.verifier.verify_bundle(&candidate_dir)?;
                Selection {
                    entry_point: EntryPoint::new(
                        &candidate_dir,
                        BundleSource::Candidate,
                        &self.layout,
                    ),
                    reason: SelectionReason::CandidateVerified {
                        version: candidate,
                        entries: entries.len(),
                    },
                }
            }
        };

        tracing::info!(
            source = %selection.entry_point.source(),
            dir = %selection.entry_point.dir().display(),
            reason = %selection.reason,
            "entry point selected"
        );
        Ok(selection)
    }

    fn base(&self, base_dir: &Path, reason: SelectionReason) -> Selection {
        Selection {
            entry_point: EntryPoint::new(base_dir, BundleSource::Base, &self.layout),
            reason,
        }
    }

    fn probe(&self, base_dir: &Path, candidate_dir: &Path) -> Result<Probe, ProbeError> {
        let candidate_meta = match std::fs::metadata(candidate_dir) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Probe::Missing),
            Err(source) => {
                return Err(ProbeError::MetadataRead {
                    path: candidate_dir.to_path_buf(),
                    source,
                });
            }
        };

        let base_file = self.layout.startup_module_path(base_dir);
        let base_file = if base_file.exists() {
            base_file
        } else {
            base_dir.to_path_buf()
        };
        let base_meta = std::fs::metadata(&base_file).map_err(|source| ProbeError::MetadataRead {
            path: base_file.clone(),
            source,
        })?;

        let candidate_fresh = self.candidate_freshness(candidate_dir, &candidate_meta)?;
        let base_fresh = freshness(&base_meta).map_err(|source| ProbeError::MetadataRead {
            path: base_file.clone(),
            source,
        })?;

        if candidate_fresh <= base_fresh {
            tracing::debug!(
                candidate = %candidate_dir.display(),
                "candidate bundle is not fresher than base"
            );
            return Ok(Probe::Stale);
        }

        let base = PackageDescriptor::read_version(&self.layout.descriptor_path(base_dir))?;
        let candidate =
            PackageDescriptor::read_version(&self.layout.descriptor_path(candidate_dir))?;

        if candidate.is_newer_than(&base) {
            Ok(Probe::Newer { candidate })
        } else {
            Ok(Probe::NotNewer { candidate, base })
        }
    }

    /// Newest of the candidate's startup module, descriptor and manifest.
    ///
    /// Falls back to the directory itself when none of them exists. Directory
    /// times do not change when files are rewritten in place.
    fn candidate_freshness(
        &self,
        candidate_dir: &Path,
        dir_meta: &Metadata,
    ) -> Result<SystemTime, ProbeError> {
        let files = [
            self.layout.startup_module_path(candidate_dir),
            self.layout.descriptor_path(candidate_dir),
            self.layout.manifest_path(candidate_dir),
        ];

        let mut newest = None;
        for path in files {
            let meta = match std::fs::metadata(&path) {
                Ok(meta) => meta,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(ProbeError::MetadataRead { path, source }),
            };
            let fresh = freshness(&meta).map_err(|source| ProbeError::MetadataRead {
                path: path.clone(),
                source,
            })?;
            newest = newest.max(Some(fresh));
        }

        match newest {
            Some(fresh) => Ok(fresh),
            None => freshness(dir_meta).map_err(|source| ProbeError::MetadataRead {
                path: candidate_dir.to_path_buf(),
                source,
            }),
        }
    }
}

/// Render an error with its chain of sources.
fn describe(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// The later of a file's modification and status-change times.
///
/// Status change is `ctime` on Unix and creation time elsewhere; if it is not
/// available the modification time alone is used.
pub fn freshness(meta: &Metadata) -> io::Result<SystemTime> {
    let modified = meta.modified()?;
    Ok(match status_changed(meta) {
        Some(changed) => modified.max(changed),
        None => modified,
    })
}

#[cfg(unix)]
fn status_changed(meta: &Metadata) -> Option<SystemTime> {
    use std::os::unix::fs::MetadataExt;
    use std::time::{Duration, UNIX_EPOCH};

    let secs = u64::try_from(meta.ctime()).ok()?;
    let nanos = u32::try_from(meta.ctime_nsec()).ok()?;
    UNIX_EPOCH.checked_add(Duration::new(secs, nanos))
}

#[cfg(not(unix))]
fn status_changed(meta: &Metadata) -> Option<SystemTime> {
    meta.created().ok()
}
