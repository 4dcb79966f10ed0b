#![allow(non_snake_case)]

use super::*;
use crate::SELF_SIGNATURE_KEY;
use crate::test_support::{RELEASE_KEYS, write_bundle};
use tempfile::TempDir;

fn signer() -> ManifestSigner {
    ManifestSigner::new(RELEASE_KEYS.private_key.clone(), BundleLayout::default())
}

#[test]
fn ManifestSigner___sign_bytes___verifies_with_matching_anchor() {
    let signature = signer().sign_bytes(b"hello world").unwrap();

    let anchor = RELEASE_KEYS.trust_anchor();
    assert!(anchor.verify(b"hello world", &signature).is_ok());
}

#[test]
fn ManifestSigner___sign_bytes___is_deterministic() {
    let signer = signer();

    assert_eq!(
        signer.sign_bytes(b"payload").unwrap(),
        signer.sign_bytes(b"payload").unwrap()
    );
}

#[test]
fn ManifestSigner___sign_bundle___self_signature_covers_entries() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path(), "1.0.0", &[("app.js", b"main()")]);

    let manifest = signer()
        .sign_bundle(temp_dir.path(), &["app.js", "package.json"])
        .unwrap();

    let anchor = RELEASE_KEYS.trust_anchor();
    assert_eq!(manifest.entries().len(), 2);
    assert!(
        anchor
            .verify(manifest.signed_payload(), manifest.self_signature())
            .is_ok()
    );
}

#[test]
fn ManifestSigner___sign_bundle___requires_main_entry() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path(), "1.0.0", &[("app.js", b"main()")]);

    let err = signer()
        .sign_bundle(temp_dir.path(), &["package.json"])
        .unwrap_err();

    assert!(matches!(err, SignError::MissingMainEntry(entry) if entry == "app.js"));
}

#[test]
fn ManifestSigner___sign_bundle___rejects_escaping_path() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path(), "1.0.0", &[("app.js", b"main()")]);

    let err = signer()
        .sign_bundle(temp_dir.path(), &["app.js", "../secret"])
        .unwrap_err();

    assert!(matches!(err, SignError::InvalidPath(_)));
}

#[test]
fn ManifestSigner___sign_bundle___missing_file___returns_io_error() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path(), "1.0.0", &[]);

    let err = signer().sign_bundle(temp_dir.path(), &["app.js"]).unwrap_err();

    assert!(matches!(err, SignError::Io(_)));
}

#[test]
fn ManifestSigner___discover_resources___lists_nested_files_sorted_without_manifest() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(
        temp_dir.path(),
        "1.0.0",
        &[
            ("app.js", b"main()"),
            ("lib/util/strings.js", b"s"),
            ("signatures.json", b"{}"),
        ],
    );

    let resources = signer().discover_resources(temp_dir.path()).unwrap();

    assert_eq!(
        resources,
        vec!["app.js", "lib/util/strings.js", "package.json"]
    );
}

#[test]
fn ManifestSigner___write_manifest___writes_reserved_key() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path(), "1.0.0", &[("app.js", b"main()")]);
    let signer = signer();
    let manifest = signer.sign_bundle(temp_dir.path(), &["app.js"]).unwrap();

    let path = signer.write_manifest(temp_dir.path(), &manifest).unwrap();

    let json = std::fs::read_to_string(path).unwrap();
    assert!(json.contains(SELF_SIGNATURE_KEY));
    assert!(json.contains("\"app.js\""));
}

#[test]
fn ManifestSigner___from_pem___accepts_generated_private_key() {
    let pem = RELEASE_KEYS.private_key_pem().unwrap();

    let signer = ManifestSigner::from_pem(&pem, BundleLayout::default()).unwrap();

    let signature = signer.sign_bytes(b"data").unwrap();
    assert!(RELEASE_KEYS.trust_anchor().verify(b"data", &signature).is_ok());
}

#[test]
fn ManifestSigner___from_pem___rejects_garbage() {
    let result = ManifestSigner::from_pem("not a key", BundleLayout::default());

    assert!(matches!(result, Err(SignError::InvalidKey(_))));
}

#[test]
fn KeyPair___public_key_pem___is_spki() {
    let pem = RELEASE_KEYS.public_key_pem().unwrap();

    assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));
}
