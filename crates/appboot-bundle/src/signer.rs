//! Producing signature manifests.
//!
//! The updater's release pipeline signs a bundle with [`ManifestSigner`] and
//! ships the resulting `signatures.json` next to the bundle contents. The
//! loader only ever holds the public half of the key.

use crate::manifest::resolve_relative;
use crate::{BundleLayout, ManifestEntry, SignError, SignatureManifest, TrustAnchor};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::fs;
use std::path::{Path, PathBuf};

/// Default modulus size for generated keys.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// An RSA key pair for signing bundles.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub private_key: RsaPrivateKey,
    pub public_key: RsaPublicKey,
}

impl KeyPair {
    /// Private key as PKCS#8 PEM (`BEGIN PRIVATE KEY`).
    pub fn private_key_pem(&self) -> Result<String, SignError> {
        self.private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| SignError::InvalidKey(e.to_string()))
    }

    /// Public key as SubjectPublicKeyInfo PEM (`BEGIN PUBLIC KEY`).
    pub fn public_key_pem(&self) -> Result<String, SignError> {
        self.public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| SignError::InvalidKey(e.to_string()))
    }

    /// Trust anchor for the public half.
    #[must_use]
    pub fn trust_anchor(&self) -> TrustAnchor {
        TrustAnchor::from_public_key(self.public_key.clone())
    }
}

/// Generate a fresh RSA key pair.
pub fn generate_keypair(bits: usize) -> Result<KeyPair, SignError> {
    let private_key =
        RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| SignError::InvalidKey(e.to_string()))?;
    let public_key = RsaPublicKey::from(&private_key);

    Ok(KeyPair {
        private_key,
        public_key,
    })
}

/// Signs bundle resources and the manifest listing them.
///
/// # Example
///
/// ```no_run
/// use appboot_bundle::{BundleLayout, ManifestSigner};
///
/// let pem = std::fs::read_to_string("release-key.pem")?;
/// let signer = ManifestSigner::from_pem(&pem, BundleLayout::default())?;
///
/// let bundle = std::path::Path::new("dist/app");
/// let resources = signer.discover_resources(bundle)?;
/// let manifest = signer.sign_bundle(bundle, &resources)?;
/// signer.write_manifest(bundle, &manifest)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ManifestSigner {
    signing_key: SigningKey<Sha256>,
    layout: BundleLayout,
}

impl ManifestSigner {
    /// Create a signer from a private key.
    #[must_use]
    pub fn new(private_key: RsaPrivateKey, layout: BundleLayout) -> Self {
        Self {
            signing_key: SigningKey::<Sha256>::new(private_key),
            layout,
        }
    }

    /// Create a signer from a PKCS#8 (or PKCS#1) PEM private key.
    pub fn from_pem(pem: &str, layout: BundleLayout) -> Result<Self, SignError> {
        let pem = pem.trim();
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|pkcs8_err| {
                RsaPrivateKey::from_pkcs1_pem(pem).map_err(|_| pkcs8_err.to_string())
            })
            .map_err(SignError::InvalidKey)?;

        Ok(Self::new(private_key, layout))
    }

    /// Sign arbitrary bytes, returning the base64 signature.
    pub fn sign_bytes(&self, data: &[u8]) -> Result<String, SignError> {
        let signature = self
            .signing_key
            .try_sign(data)
            .map_err(|e| SignError::Signing(e.to_string()))?;

        Ok(STANDARD.encode(signature.to_bytes()))
    }

    /// Sign `resources` (paths relative to `bundle_dir`) and the resulting manifest.
    ///
    /// Entries keep the order of `resources`.
    pub fn sign_bundle<S: AsRef<str>>(
        &self,
        bundle_dir: &Path,
        resources: &[S],
    ) -> Result<SignatureManifest, SignError> {
        if !resources
            .iter()
            .any(|r| r.as_ref() == self.layout.main_entry)
        {
            return Err(SignError::MissingMainEntry(self.layout.main_entry.clone()));
        }

        let mut entries = Vec::with_capacity(resources.len());
        for resource in resources {
            let resource = resource.as_ref();
            let path = resolve_relative(bundle_dir, resource)
                .ok_or_else(|| SignError::InvalidPath(resource.to_string()))?;
            let contents = fs::read(&path)?;
            entries.push(ManifestEntry::new(resource, self.sign_bytes(&contents)?));
        }

        let payload = SignatureManifest::payload_for(&entries)?;
        let self_signature = self.sign_bytes(&payload)?;

        Ok(SignatureManifest::from_parts(entries, self_signature)?)
    }

    /// Write `manifest` into `bundle_dir`, returning the manifest path.
    pub fn write_manifest(
        &self,
        bundle_dir: &Path,
        manifest: &SignatureManifest,
    ) -> Result<PathBuf, SignError> {
        let path = self.layout.manifest_path(bundle_dir);
        fs::write(&path, manifest.to_json()?)?;
        Ok(path)
    }

    /// All regular files under `bundle_dir` except the manifest, sorted,
    /// as `/`-separated relative paths.
    pub fn discover_resources(&self, bundle_dir: &Path) -> Result<Vec<String>, SignError> {
        let mut resources = Vec::new();
        collect_files(bundle_dir, bundle_dir, &mut resources)?;
        resources.retain(|r| *r != self.layout.manifest_file);
        resources.sort();
        Ok(resources)
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<(), SignError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();

        if file_type.is_dir() {
            collect_files(root, &path, out)?;
        } else if file_type.is_file() {
            let relative = path
                .strip_prefix(root)
                .map_err(|_| SignError::InvalidPath(path.display().to_string()))?;
            let parts = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>();
            out.push(parts.join("/"));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "signer/signer_tests.rs"]
mod signer_tests;
