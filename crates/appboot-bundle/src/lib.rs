//! Bundle selection and signature verification for appboot
//!
//! This crate decides, at process start, whether the application bundle
//! shipped with the install or a newer bundle placed by the updater in the
//! per-user data directory becomes the entry point. A candidate bundle is
//! only ever returned after its signature manifest has been verified against
//! the single embedded trust anchor.
//!
//! # Bundle Layout
//!
//! ```text
//! <install>/
//! ├── resources/
//! │   └── public-key.pem         # fallback trust anchor
//! └── app/                       # base bundle
//!     ├── package.json
//!     └── app.js
//! <user_data>/
//! └── app/                       # candidate bundle
//!     ├── package.json
//!     ├── app.js
//!     ├── signatures.json        # signature manifest
//!     └── ...
//! ```
//!
//! # Example
//!
//! ```no_run
//! use appboot_bundle::{BundleLayout, BundleSelector, ManifestVerifier, TrustAnchor};
//!
//! let anchor = TrustAnchor::resolve("/opt/app")?;
//! let layout = BundleLayout::default();
//! let verifier = ManifestVerifier::new(anchor, layout.clone());
//! let selector = BundleSelector::new(layout, verifier);
//!
//! let entry = selector.select_entry_point("/opt/app/app", "/home/me/.config/app")?;
//! println!("loading {}", entry.startup_module().display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod descriptor;
mod error;
mod layout;
mod manifest;
mod state;
mod trust;
mod version;

pub mod selector;
pub mod signer;
pub mod verifier;

pub use descriptor::PackageDescriptor;
pub use error::{
    ProbeError, SignError, SignatureFailure, SignatureTarget, TrustAnchorError, VerifyError,
};
pub use layout::BundleLayout;
pub use manifest::{ManifestEntry, SignatureManifest};
pub use selector::{BundleSelector, BundleSource, EntryPoint, Selection, SelectionReason};
pub use signer::{KeyPair, ManifestSigner, generate_keypair};
pub use state::VerificationState;
pub use trust::TrustAnchor;
pub use verifier::{BundleVerifier, ManifestVerifier, VerifiedBundle, VerifiedEntry};
pub use version::Version;

/// Result type for verification operations.
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Reserved manifest key holding the signature of the rest of the manifest.
pub const SELF_SIGNATURE_KEY: &str = "selfSignature";

/// Trust anchor resource path, relative to the install directory.
pub const TRUST_ANCHOR_RESOURCE: &str = "resources/public-key.pem";

#[cfg(test)]
pub(crate) mod test_support;
