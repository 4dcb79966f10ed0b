#![allow(non_snake_case)]

use super::*;
use crate::test_support::{FOREIGN_KEYS, RELEASE_KEYS, sign_bundle, sign_bundle_with, write_bundle};
use crate::{ManifestEntry, ManifestSigner, SELF_SIGNATURE_KEY};
use std::fs;
use tempfile::TempDir;

fn verifier() -> ManifestVerifier {
    ManifestVerifier::new(RELEASE_KEYS.trust_anchor(), BundleLayout::default())
}

fn signed_bundle(temp_dir: &TempDir) -> PathBuf {
    let dir = temp_dir.path().join("app");
    write_bundle(
        &dir,
        "2.0.0",
        &[("app.js", b"require('./lib/core')"), ("lib/core.js", b"module.exports = 1")],
    );
    sign_bundle(&dir);
    dir
}

/// Rewrite the manifest on disk with the release key signing `entries`.
fn write_signed_manifest(dir: &Path, entries: Vec<ManifestEntry>) {
    let signer = ManifestSigner::new(RELEASE_KEYS.private_key.clone(), BundleLayout::default());
    let payload = SignatureManifest::payload_for(&entries).unwrap();
    let self_signature = signer.sign_bytes(&payload).unwrap();
    let manifest = SignatureManifest::from_parts(entries, self_signature).unwrap();
    signer.write_manifest(dir, &manifest).unwrap();
}

// ============================================================================
// Success
// ============================================================================

#[test]
fn ManifestVerifier___verify_bundle___accepts_untouched_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let dir = signed_bundle(&temp_dir);

    let bundle = verifier().verify_bundle(&dir).unwrap();

    assert_eq!(bundle.dir, dir);
    let paths: Vec<_> = bundle.entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["app.js", "lib/core.js", "package.json"]);
}

#[test]
fn ManifestVerifier___verify_bundle___reports_content_digests() {
    let temp_dir = TempDir::new().unwrap();
    let dir = signed_bundle(&temp_dir);

    let bundle = verifier().verify_bundle(&dir).unwrap();

    let core = bundle
        .entries
        .iter()
        .find(|e| e.path == "lib/core.js")
        .unwrap();
    assert_eq!(core.size, b"module.exports = 1".len() as u64);
    assert_eq!(core.sha256, hex::encode(Sha256::digest(b"module.exports = 1")));
}

#[test]
fn ManifestVerifier___verify_bundle___ignores_manifest_whitespace() {
    let temp_dir = TempDir::new().unwrap();
    let dir = signed_bundle(&temp_dir);
    let manifest_path = dir.join("signatures.json");
    let json = fs::read_to_string(&manifest_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    fs::write(&manifest_path, serde_json::to_string(&value).unwrap()).unwrap();

    assert!(verifier().verify_bundle(&dir).is_ok());
}

// ============================================================================
// Manifest structure failures
// ============================================================================

#[test]
fn ManifestVerifier___verify_bundle___missing_manifest___fails() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("app");
    write_bundle(&dir, "2.0.0", &[("app.js", b"main()")]);

    let err = verifier().verify_bundle(&dir).unwrap_err();

    assert!(matches!(err, VerifyError::ManifestMissing(_)));
}

#[test]
fn ManifestVerifier___verify_bundle___malformed_manifest___fails() {
    let temp_dir = TempDir::new().unwrap();
    let dir = signed_bundle(&temp_dir);
    fs::write(dir.join("signatures.json"), "not json").unwrap();

    let err = verifier().verify_bundle(&dir).unwrap_err();

    assert!(matches!(err, VerifyError::ManifestMalformed { .. }));
}

#[test]
fn ManifestVerifier___verify_bundle___manifest_without_self_signature___fails() {
    let temp_dir = TempDir::new().unwrap();
    let dir = signed_bundle(&temp_dir);
    let manifest_path = dir.join("signatures.json");
    let mut value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    value.as_object_mut().unwrap().shift_remove(SELF_SIGNATURE_KEY);
    fs::write(&manifest_path, value.to_string()).unwrap();

    let err = verifier().verify_bundle(&dir).unwrap_err();

    assert!(matches!(err, VerifyError::InvalidManifest(_)));
}

// ============================================================================
// Self-signature failures
// ============================================================================

#[test]
fn ManifestVerifier___verify_bundle___added_entry___fails_self_signature() {
    let temp_dir = TempDir::new().unwrap();
    let dir = signed_bundle(&temp_dir);
    let manifest_path = dir.join("signatures.json");
    let mut value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    let signature = value["app.js"].clone();
    value
        .as_object_mut()
        .unwrap()
        .insert("extra.js".to_string(), signature);
    fs::write(&manifest_path, value.to_string()).unwrap();

    let err = verifier().verify_bundle(&dir).unwrap_err();

    assert_eq!(err.target(), Some(&SignatureTarget::SelfSignature));
}

#[test]
fn ManifestVerifier___verify_bundle___removed_entry___fails_self_signature() {
    let temp_dir = TempDir::new().unwrap();
    let dir = signed_bundle(&temp_dir);
    fs::write(dir.join("lib/core.js"), b"tampered").unwrap();
    let manifest_path = dir.join("signatures.json");
    let mut value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    value.as_object_mut().unwrap().shift_remove("lib/core.js");
    fs::write(&manifest_path, value.to_string()).unwrap();

    let err = verifier().verify_bundle(&dir).unwrap_err();

    assert_eq!(err.target(), Some(&SignatureTarget::SelfSignature));
}

#[test]
fn ManifestVerifier___verify_bundle___bad_self_signature___checks_no_files() {
    let temp_dir = TempDir::new().unwrap();
    let dir = signed_bundle(&temp_dir);
    // Every listed file is gone; a per-file check would report a resource error.
    fs::remove_file(dir.join("app.js")).unwrap();
    fs::remove_file(dir.join("lib/core.js")).unwrap();
    fs::remove_file(dir.join("package.json")).unwrap();
    let manifest_path = dir.join("signatures.json");
    let mut value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    let wrong_signature = value["app.js"].clone();
    value[SELF_SIGNATURE_KEY] = wrong_signature;
    fs::write(&manifest_path, value.to_string()).unwrap();

    let err = verifier().verify_bundle(&dir).unwrap_err();

    assert!(matches!(
        err,
        VerifyError::SignatureInvalid {
            target: SignatureTarget::SelfSignature,
            failure: SignatureFailure::Mismatch,
        }
    ));
}

#[test]
fn ManifestVerifier___verify_bundle___signed_by_foreign_key___fails_self_signature() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("app");
    write_bundle(&dir, "2.0.0", &[("app.js", b"main()")]);
    sign_bundle_with(&dir, &FOREIGN_KEYS);

    let err = verifier().verify_bundle(&dir).unwrap_err();

    assert_eq!(err.target(), Some(&SignatureTarget::SelfSignature));
}

// ============================================================================
// Resource failures
// ============================================================================

#[test]
fn ManifestVerifier___verify_bundle___modified_file___names_that_path() {
    let temp_dir = TempDir::new().unwrap();
    let dir = signed_bundle(&temp_dir);
    fs::write(dir.join("lib/core.js"), b"module.exports = 2").unwrap();

    let err = verifier().verify_bundle(&dir).unwrap_err();

    assert!(matches!(
        &err,
        VerifyError::SignatureInvalid {
            target: SignatureTarget::Resource(path),
            failure: SignatureFailure::Mismatch,
        } if path == "lib/core.js"
    ));
    assert!(err.to_string().contains("lib/core.js"));
}

#[test]
fn ManifestVerifier___verify_bundle___missing_listed_file___fails() {
    let temp_dir = TempDir::new().unwrap();
    let dir = signed_bundle(&temp_dir);
    fs::remove_file(dir.join("lib/core.js")).unwrap();

    let err = verifier().verify_bundle(&dir).unwrap_err();

    assert!(matches!(
        &err,
        VerifyError::SignatureInvalid {
            target: SignatureTarget::Resource(path),
            failure: SignatureFailure::Unreadable(std::io::ErrorKind::NotFound),
        } if path == "lib/core.js"
    ));
}

#[test]
fn ManifestVerifier___verify_bundle___undecodable_signature___names_path() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("app");
    write_bundle(&dir, "2.0.0", &[("app.js", b"main()")]);
    write_signed_manifest(&dir, vec![ManifestEntry::new("app.js", "%%%")]);

    let err = verifier().verify_bundle(&dir).unwrap_err();

    assert!(matches!(
        err,
        VerifyError::SignatureInvalid {
            failure: SignatureFailure::Encoding,
            ..
        }
    ));
    assert_eq!(
        err.target(),
        Some(&SignatureTarget::Resource("app.js".to_string()))
    );
}

#[test]
fn ManifestVerifier___verify_bundle___escaping_path___rejected_after_self_check() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("app");
    write_bundle(&dir, "2.0.0", &[("app.js", b"main()")]);
    fs::write(temp_dir.path().join("outside.js"), b"outside").unwrap();
    let signer = ManifestSigner::new(RELEASE_KEYS.private_key.clone(), BundleLayout::default());
    let entries = vec![
        ManifestEntry::new("app.js", signer.sign_bytes(b"main()").unwrap()),
        ManifestEntry::new("../outside.js", signer.sign_bytes(b"outside").unwrap()),
    ];
    write_signed_manifest(&dir, entries);

    let err = verifier().verify_bundle(&dir).unwrap_err();

    assert!(matches!(err, VerifyError::InvalidManifest(msg) if msg.contains("../outside.js")));
}

#[test]
fn ManifestVerifier___borrowed___implements_bundle_verifier() {
    fn verify_with(verifier: impl BundleVerifier, dir: &Path) -> VerifyResult<VerifiedBundle> {
        verifier.verify_bundle(dir)
    }

    let temp_dir = TempDir::new().unwrap();
    let dir = signed_bundle(&temp_dir);
    let verifier = verifier();

    assert!(verify_with(&verifier, &dir).is_ok());
}
