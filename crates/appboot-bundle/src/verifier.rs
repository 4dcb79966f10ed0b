//! Signature manifest verification.
//!
//! A candidate bundle is trusted only after two checks, in this order:
//!
//! 1. the manifest's self-signature over its own entry list, so the list of
//!    files to check cannot be edited;
//! 2. the signature of every file the manifest lists.
//!
//! Both use the single [`TrustAnchor`]. The first failure rejects the bundle.

use crate::manifest::SignatureManifest;
use crate::{
    BundleLayout, SignatureFailure, SignatureTarget, TrustAnchor, VerificationState, VerifyError,
    VerifyResult,
};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Something that can establish trust in a candidate bundle directory.
pub trait BundleVerifier {
    /// Verify `bundle_dir`, returning what was checked.
    fn verify_bundle(&self, bundle_dir: &Path) -> VerifyResult<VerifiedBundle>;
}

impl<T: BundleVerifier + ?Sized> BundleVerifier for &T {
    fn verify_bundle(&self, bundle_dir: &Path) -> VerifyResult<VerifiedBundle> {
        (**self).verify_bundle(bundle_dir)
    }
}

/// A resource whose signature checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedEntry {
    /// Manifest path.
    pub path: String,
    /// SHA-256 of the verified contents, hex.
    pub sha256: String,
    /// Size in bytes.
    pub size: u64,
}

/// Outcome of a successful verification pass.
#[derive(Debug, Clone)]
pub struct VerifiedBundle {
    /// The verified bundle directory.
    pub dir: PathBuf,
    /// Every verified resource, in manifest order.
    pub entries: Vec<VerifiedEntry>,
}

/// Verifies candidate bundles against a trust anchor.
#[derive(Debug, Clone)]
pub struct ManifestVerifier {
    anchor: TrustAnchor,
    layout: BundleLayout,
}

impl ManifestVerifier {
    /// Create a verifier bound to `anchor`.
    #[must_use]
    pub fn new(anchor: TrustAnchor, layout: BundleLayout) -> Self {
        Self { anchor, layout }
    }

    /// The trust anchor in use.
    #[must_use]
    pub fn anchor(&self) -> &TrustAnchor {
        &self.anchor
    }

    /// Check the manifest's self-signature.
    pub fn verify_self(&self, manifest: &SignatureManifest) -> VerifyResult<()> {
        self.anchor
            .verify(manifest.signed_payload(), manifest.self_signature())
            .map_err(|failure| VerifyError::SignatureInvalid {
                target: SignatureTarget::SelfSignature,
                failure,
            })
    }

    fn verify_entry(
        &self,
        bundle_dir: &Path,
        entry: &crate::ManifestEntry,
    ) -> VerifyResult<VerifiedEntry> {
        let path = entry.resolve(bundle_dir).ok_or_else(|| {
            VerifyError::InvalidManifest(format!(
                "resource path escapes the bundle: {}",
                entry.path
            ))
        })?;

        let invalid = |failure: SignatureFailure| VerifyError::SignatureInvalid {
            target: SignatureTarget::Resource(entry.path.clone()),
            failure,
        };

        let contents =
            std::fs::read(&path).map_err(|e| invalid(SignatureFailure::Unreadable(e.kind())))?;
        self.anchor
            .verify(&contents, &entry.signature)
            .map_err(invalid)?;

        Ok(VerifiedEntry {
            path: entry.path.clone(),
            sha256: hex::encode(Sha256::digest(&contents)),
            size: contents.len() as u64,
        })
    }

    fn run(&self, bundle_dir: &Path, pass: &mut VerificationPass) -> VerifyResult<VerifiedBundle> {
        let manifest_path = self.layout.manifest_path(bundle_dir);
        let manifest = SignatureManifest::load(&manifest_path, &self.layout.main_entry)?;
        pass.advance(VerificationState::ManifestLoaded);

        self.verify_self(&manifest)?;
        pass.advance(VerificationState::SelfVerified);

        let mut entries = Vec::with_capacity(manifest.entries().len());
        for entry in manifest.entries() {
            let verified = self.verify_entry(bundle_dir, entry)?;
            tracing::debug!(
                path = %verified.path,
                sha256 = %verified.sha256,
                size = verified.size,
                "resource signature valid"
            );
            entries.push(verified);
            pass.advance(VerificationState::EntryVerified);
        }

        Ok(VerifiedBundle {
            dir: bundle_dir.to_path_buf(),
            entries,
        })
    }
}

impl BundleVerifier for ManifestVerifier {
    fn verify_bundle(&self, bundle_dir: &Path) -> VerifyResult<VerifiedBundle> {
        let mut pass = VerificationPass::default();

        match self.run(bundle_dir, &mut pass) {
            Ok(bundle) => {
                pass.advance(VerificationState::Trusted);
                tracing::info!(
                    bundle = %bundle_dir.display(),
                    entries = bundle.entries.len(),
                    anchor = %self.anchor.fingerprint(),
                    "candidate bundle trusted"
                );
                Ok(bundle)
            }
            Err(err) => {
                pass.advance(VerificationState::Rejected);
                tracing::error!(bundle = %bundle_dir.display(), error = %err, "candidate bundle rejected");
                Err(err)
            }
        }
    }
}

/// Tracks the state of one verification pass.
#[derive(Debug, Default)]
struct VerificationPass {
    state: VerificationState,
}

impl VerificationPass {
    fn advance(&mut self, next: VerificationState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid verification transition {} -> {}",
            self.state,
            next
        );
        if next.is_terminal() {
            tracing::debug!(from = %self.state, to = %next, "verification finished");
        } else {
            tracing::trace!(from = %self.state, to = %next, "verification state");
        }
        self.state = next;
    }
}

#[cfg(test)]
#[path = "verifier/verifier_tests.rs"]
mod verifier_tests;
