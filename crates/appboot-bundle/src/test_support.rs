//! Shared fixtures for unit tests.

use crate::{BundleLayout, KeyPair, ManifestSigner, SignatureManifest, generate_keypair};
use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;

/// Key pair acting as the release key.
pub(crate) static RELEASE_KEYS: Lazy<KeyPair> = Lazy::new(|| generate_keypair(1024).unwrap());

/// Unrelated key pair, for signatures the trust anchor must reject.
pub(crate) static FOREIGN_KEYS: Lazy<KeyPair> = Lazy::new(|| generate_keypair(1024).unwrap());

/// Write a bundle directory with a descriptor and the given files.
pub(crate) fn write_bundle(dir: &Path, version: &str, files: &[(&str, &[u8])]) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("package.json"),
        format!(r#"{{"name": "app", "version": "{version}"}}"#),
    )
    .unwrap();
    for (path, contents) in files {
        let target = dir.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(target, contents).unwrap();
    }
}

/// Sign every file in `dir` with `keys` and write the manifest.
pub(crate) fn sign_bundle_with(dir: &Path, keys: &KeyPair) -> SignatureManifest {
    let signer = ManifestSigner::new(keys.private_key.clone(), BundleLayout::default());
    let resources = signer.discover_resources(dir).unwrap();
    let manifest = signer.sign_bundle(dir, &resources).unwrap();
    signer.write_manifest(dir, &manifest).unwrap();
    manifest
}

/// Sign every file in `dir` with the release key and write the manifest.
pub(crate) fn sign_bundle(dir: &Path) -> SignatureManifest {
    sign_bundle_with(dir, &RELEASE_KEYS)
}
