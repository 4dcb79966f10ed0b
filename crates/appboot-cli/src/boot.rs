//! Entry point selection and hand-over to the launcher.

use crate::config::BootConfig;
use anyhow::{Context, Result};
use appboot_bundle::{BundleSelector, ManifestVerifier, Selection, TrustAnchor};
use std::process::{Command, ExitCode};

/// Resolve the trust anchor and run the selector.
///
/// A candidate that fails verification is an error here; the caller must not
/// fall back to anything.
pub fn select_entry(config: &BootConfig) -> Result<Selection> {
    let install_dir = config.install_dir()?;
    let anchor = TrustAnchor::resolve(&install_dir).context("Failed to load trust anchor")?;
    tracing::debug!(fingerprint = %anchor.fingerprint(), "trust anchor loaded");

    let verifier = ManifestVerifier::new(anchor, config.layout.clone());
    let selector = BundleSelector::new(config.layout.clone(), verifier);

    selector
        .select(config.base_bundle_dir()?, config.user_data_dir()?)
        .context("Candidate bundle failed verification")
}

/// `appboot select`
pub fn select(config: &BootConfig) -> Result<()> {
    let Selection {
        entry_point,
        reason,
    } = select_entry(config)?;

    println!("Entry point:    {}", entry_point.dir().display());
    println!("Source:         {}", entry_point.source());
    println!("Startup module: {}", entry_point.startup_module().display());
    println!("Reason:         {reason}");

    Ok(())
}

/// `appboot launch`
pub fn launch(config: &BootConfig, print: bool, extra_args: &[String]) -> Result<ExitCode> {
    let selection = select_entry(config)?;
    let startup_module = selection.entry_point.startup_module();

    if print {
        println!("{}", startup_module.display());
        return Ok(ExitCode::SUCCESS);
    }

    let launcher = config
        .launcher
        .as_ref()
        .context("No [launcher] configured (use --print to only print the startup module)")?;

    let mut command = Command::new(&launcher.program);
    command
        .args(&launcher.args)
        .args(extra_args)
        .arg(startup_module);

    tracing::info!(
        program = %launcher.program,
        startup_module = %startup_module.display(),
        "starting application"
    );
    hand_over(command, &launcher.program)
}

#[cfg(unix)]
fn hand_over(mut command: Command, program: &str) -> Result<ExitCode> {
    use std::os::unix::process::CommandExt;

    // Only returns on failure
    let err = command.exec();
    Err(anyhow::Error::new(err).context(format!("Failed to start {program}")))
}

#[cfg(not(unix))]
fn hand_over(mut command: Command, program: &str) -> Result<ExitCode> {
    let status = command
        .status()
        .with_context(|| format!("Failed to start {program}"))?;

    Ok(match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}
