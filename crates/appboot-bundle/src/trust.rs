//! The trust anchor: the one public key every signature is checked against.

use crate::{SignatureFailure, TRUST_ANCHOR_RESOURCE, TrustAnchorError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::signature::Verifier;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Marker prefix of an unset compiled-in key.
const PLACEHOLDER_PREFIX: &str = "@@";

/// PEM public key compiled into the loader.
///
/// Set `APPBOOT_TRUST_ANCHOR_PEM` at build time to embed the release key.
/// Without it the loader reads [`TRUST_ANCHOR_RESOURCE`] from the install
/// directory instead.
pub const EMBEDDED_TRUST_ANCHOR_PEM: &str = match option_env!("APPBOOT_TRUST_ANCHOR_PEM") {
    Some(pem) => pem,
    None => "@@APPBOOT_TRUST_ANCHOR_PEM@@",
};

/// RSA public key used to verify manifests and resources
/// (PKCS#1 v1.5 signatures over SHA-256).
///
/// Created once at startup and handed to the verifier; there is no way to
/// replace the key of an existing anchor.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    public_key: RsaPublicKey,
    verifying_key: VerifyingKey<Sha256>,
}

impl TrustAnchor {
    /// Wrap an RSA public key.
    #[must_use]
    pub fn from_public_key(public_key: RsaPublicKey) -> Self {
        let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
        Self {
            public_key,
            verifying_key,
        }
    }

    /// Parse a PEM public key (`BEGIN PUBLIC KEY` or `BEGIN RSA PUBLIC KEY`).
    pub fn from_pem(pem: &str) -> Result<Self, TrustAnchorError> {
        let pem = pem.trim();
        let public_key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|spki_err| {
                RsaPublicKey::from_pkcs1_pem(pem).map_err(|_| spki_err.to_string())
            })
            .map_err(TrustAnchorError::InvalidKey)?;

        Ok(Self::from_public_key(public_key))
    }

    /// The compiled-in anchor, if one was embedded at build time.
    pub fn embedded() -> Option<Result<Self, TrustAnchorError>> {
        if EMBEDDED_TRUST_ANCHOR_PEM.starts_with(PLACEHOLDER_PREFIX) {
            None
        } else {
            Some(Self::from_pem(EMBEDDED_TRUST_ANCHOR_PEM))
        }
    }

    /// Read the anchor from the fixed resource path under the install directory.
    pub fn from_install_dir(install_dir: &Path) -> Result<Self, TrustAnchorError> {
        let path = install_dir.join(TRUST_ANCHOR_RESOURCE);
        let pem = std::fs::read_to_string(&path)
            .map_err(|source| TrustAnchorError::Unavailable { path, source })?;

        Self::from_pem(&pem)
    }

    /// Resolve the anchor: compiled-in key first, install resource otherwise.
    ///
    /// `install_dir` must be the base install, never the user data directory.
    pub fn resolve(install_dir: impl AsRef<Path>) -> Result<Self, TrustAnchorError> {
        match Self::embedded() {
            Some(anchor) => {
                tracing::debug!("using compiled-in trust anchor");
                anchor
            }
            None => {
                tracing::debug!(
                    install_dir = %install_dir.as_ref().display(),
                    "no compiled-in trust anchor, reading install resource"
                );
                Self::from_install_dir(install_dir.as_ref())
            }
        }
    }

    /// Verify a base64 signature over `data`.
    pub fn verify(&self, data: &[u8], signature_base64: &str) -> Result<(), SignatureFailure> {
        let raw = STANDARD
            .decode(signature_base64.trim())
            .map_err(|_| SignatureFailure::Encoding)?;
        let signature =
            Signature::try_from(raw.as_slice()).map_err(|_| SignatureFailure::Encoding)?;

        self.verifying_key
            .verify(data, &signature)
            .map_err(|_| SignatureFailure::Mismatch)
    }

    /// SHA-256 of the DER-encoded public key, hex.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        match self.public_key.to_public_key_der() {
            Ok(der) => hex::encode(Sha256::digest(der.as_bytes())),
            Err(_) => String::from("unknown"),
        }
    }

    /// The underlying public key.
    #[must_use]
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }
}
