//! Generate RSA key pairs for signing bundles.

use anyhow::{Context, Result};
use appboot_bundle::generate_keypair;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Smallest modulus accepted.
const MIN_KEY_BITS: usize = 1024;

/// Generate a new key pair.
///
/// Writes the private key to `<out>.pem` (PKCS#8) and the public key to
/// `<out>.pub.pem`. The public file is what gets installed as the trust
/// anchor.
pub fn run(out: &Path, bits: usize, force: bool) -> Result<()> {
    if bits < MIN_KEY_BITS {
        anyhow::bail!("Key size must be at least {MIN_KEY_BITS} bits");
    }

    let private_key_path = with_suffix(out, ".pem");
    let public_key_path = with_suffix(out, ".pub.pem");

    for path in [&private_key_path, &public_key_path] {
        if path.exists() && !force {
            anyhow::bail!(
                "Key already exists at {}. Use --force to overwrite.",
                path.display()
            );
        }
    }

    if let Some(parent) = private_key_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    println!("Generating {bits}-bit RSA key pair...");
    let keys = generate_keypair(bits).context("Failed to generate key pair")?;

    let private_pem = keys
        .private_key_pem()
        .context("Failed to encode private key")?;
    std::fs::write(&private_key_path, private_pem).context("Failed to write private key")?;
    restrict_permissions(&private_key_path)?;

    let public_pem = keys.public_key_pem().context("Failed to encode public key")?;
    std::fs::write(&public_key_path, public_pem).context("Failed to write public key")?;

    println!();
    println!("✓ Key pair generated successfully!");
    println!();
    println!("  Private key: {}", private_key_path.display());
    println!("  Public key:  {}", public_key_path.display());
    println!("  Fingerprint: {}", keys.trust_anchor().fingerprint());
    println!();
    println!("Install the public key as resources/public-key.pem or embed it at build time.");
    println!("Keep the private key safe and never commit it to version control!");

    Ok(())
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
