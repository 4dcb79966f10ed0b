//! Bundle commands: verify, sign, compare.

use crate::config::BootConfig;
use anyhow::{Context, Result};
use appboot_bundle::{BundleVerifier, ManifestSigner, ManifestVerifier, TrustAnchor, Version};
use std::cmp::Ordering;
use std::path::Path;

/// `appboot verify <dir>`
pub fn verify(config: &BootConfig, dir: &Path) -> Result<()> {
    let anchor =
        TrustAnchor::resolve(config.install_dir()?).context("Failed to load trust anchor")?;
    let verifier = ManifestVerifier::new(anchor, config.layout.clone());
    println!("Trust anchor: {}", verifier.anchor().fingerprint());

    let bundle = verifier
        .verify_bundle(dir)
        .with_context(|| format!("Bundle {} failed verification", dir.display()))?;

    for entry in &bundle.entries {
        println!("  ✓ {}  {}  ({} bytes)", entry.path, entry.sha256, entry.size);
    }
    println!();
    println!("✓ Bundle verified: {} resources", bundle.entries.len());

    Ok(())
}

/// `appboot sign <dir> --key <pem>`
pub fn sign(config: &BootConfig, dir: &Path, key: &Path, files: &[String]) -> Result<()> {
    let pem = std::fs::read_to_string(key)
        .with_context(|| format!("Failed to read signing key: {}", key.display()))?;
    let signer = ManifestSigner::from_pem(&pem, config.layout.clone())
        .context("Failed to load signing key")?;

    let resources = if files.is_empty() {
        signer
            .discover_resources(dir)
            .with_context(|| format!("Failed to list bundle files in {}", dir.display()))?
    } else {
        files.to_vec()
    };

    let manifest = signer
        .sign_bundle(dir, &resources)
        .with_context(|| format!("Failed to sign bundle {}", dir.display()))?;
    let path = signer
        .write_manifest(dir, &manifest)
        .context("Failed to write signature manifest")?;

    for entry in manifest.entries() {
        println!("  signed {}", entry.path);
    }
    println!();
    println!("✓ Wrote {} ({} resources)", path.display(), manifest.entries().len());

    Ok(())
}

/// `appboot compare <a> <b>`
pub fn compare(a: &str, b: &str) -> Result<()> {
    let left = parse_version(a)?;
    let right = parse_version(b)?;

    println!("{a} {} {b}", ordering_symbol(left.compare(&right)));

    Ok(())
}

fn parse_version(text: &str) -> Result<Version> {
    Version::parse(text)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Invalid version: {text}"))
}

fn ordering_symbol(ordering: Ordering) -> &'static str {
    match ordering {
        Ordering::Less => "<",
        Ordering::Equal => "=",
        Ordering::Greater => ">",
    }
}
