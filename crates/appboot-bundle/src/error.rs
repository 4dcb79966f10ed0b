//! Error types for bundle selection and verification.
//!
//! Selection distinguishes two families of failure. [`ProbeError`] covers
//! everything that can go wrong while deciding whether the candidate is newer;
//! those are recovered by keeping the base bundle. [`VerifyError`] covers
//! everything after a candidate has been chosen; those are fatal.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Soft failure while probing the candidate bundle.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Filesystem metadata could not be read.
    #[error("cannot read metadata of {}", path.display())]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Package descriptor could not be read.
    #[error("cannot read package descriptor {}", path.display())]
    DescriptorRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Package descriptor or its version could not be parsed.
    #[error("invalid package descriptor {}: {reason}", path.display())]
    DescriptorParse { path: PathBuf, reason: String },
}

/// What a signature was checked over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureTarget {
    /// The manifest's own self-signature.
    SelfSignature,
    /// A resource file, by its manifest path.
    Resource(String),
}

impl fmt::Display for SignatureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureTarget::SelfSignature => write!(f, "self"),
            SignatureTarget::Resource(path) => write!(f, "{path}"),
        }
    }
}

/// Why a signature check failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureFailure {
    /// The signature does not match the signed bytes.
    Mismatch,
    /// The signature value is not valid base64 or not a valid RSA signature.
    Encoding,
    /// The signed resource could not be read.
    Unreadable(std::io::ErrorKind),
}

impl fmt::Display for SignatureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureFailure::Mismatch => write!(f, "signature mismatch"),
            SignatureFailure::Encoding => write!(f, "malformed signature"),
            SignatureFailure::Unreadable(kind) => write!(f, "unreadable: {kind}"),
        }
    }
}

/// Fatal failure while verifying a candidate bundle.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The manifest file does not exist.
    #[error("signature manifest missing: {}", .0.display())]
    ManifestMissing(PathBuf),

    /// The manifest could not be read or is not a JSON string map.
    #[error("signature manifest malformed: {}: {reason}", path.display())]
    ManifestMalformed { path: PathBuf, reason: String },

    /// The manifest parsed but violates a structural invariant.
    #[error("invalid signature manifest: {0}")]
    InvalidManifest(String),

    /// A signature did not verify.
    #[error("resource corrupted: {target} ({failure})")]
    SignatureInvalid {
        target: SignatureTarget,
        failure: SignatureFailure,
    },
}

impl VerifyError {
    /// The failing signature target, if this is a signature failure.
    #[must_use]
    pub fn target(&self) -> Option<&SignatureTarget> {
        match self {
            VerifyError::SignatureInvalid { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// Fatal configuration failure resolving the trust anchor.
#[derive(Debug, Error)]
pub enum TrustAnchorError {
    /// The fallback key resource could not be read.
    #[error("trust anchor unavailable at {}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The PEM text is not an RSA public key.
    #[error("invalid trust anchor: {0}")]
    InvalidKey(String),
}

/// Failure producing a signature manifest.
#[derive(Debug, Error)]
pub enum SignError {
    /// I/O error reading resources or writing the manifest.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),

    /// The private key could not be parsed or generated.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// The resource list does not include the main entry.
    #[error("main entry {0} is not among the signed resources")]
    MissingMainEntry(String),

    /// A resource path is not a plain relative path.
    #[error("resource path is not relative to the bundle: {0}")]
    InvalidPath(String),

    /// The signing operation itself failed.
    #[error("signing failed: {0}")]
    Signing(String),
}
