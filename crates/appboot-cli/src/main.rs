//! appboot CLI - Trusted bootstrap loader
//!
//! Commands:
//! - `appboot launch` - Select the entry point and hand over to the launcher
//! - `appboot select` - Show which bundle would be booted and why
//! - `appboot verify` - Verify a bundle's signature manifest
//! - `appboot sign` - Sign a bundle and write its manifest
//! - `appboot keygen` - Generate an RSA signing key pair
//! - `appboot compare` - Compare two versions the way the selector does

use appboot_logging::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod boot;
mod bundle;
mod config;
mod keygen;

use config::{BootConfig, Overrides};

#[derive(Parser)]
#[command(name = "appboot")]
#[command(author, version, about = "Trusted bootstrap loader", long_about = None)]
struct Cli {
    /// Path to appboot.toml (default: next to the executable)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Install directory holding the base bundle
    #[arg(long, global = true)]
    install_dir: Option<PathBuf>,

    /// User data directory searched for a candidate bundle
    #[arg(long, global = true, env = "APPBOOT_USER_DATA_DIR")]
    user_data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select the entry point and start the application
    ///
    /// The trust anchor is loaded before selection, so a missing or invalid
    /// key fails startup even when no candidate bundle exists.
    Launch {
        /// Print the startup module path instead of starting the launcher
        #[arg(long)]
        print: bool,

        /// Extra arguments passed to the launcher
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Show the selected entry point and the reason for it
    Select,

    /// Verify the signature manifest of a bundle directory
    Verify {
        /// Bundle directory
        dir: PathBuf,
    },

    /// Sign a bundle directory and write its signature manifest
    Sign {
        /// Bundle directory
        dir: PathBuf,

        /// PEM private key (PKCS#8 or PKCS#1)
        #[arg(short, long)]
        key: PathBuf,

        /// Resource to sign, relative to the bundle (default: every file)
        #[arg(short, long = "file")]
        files: Vec<String>,
    },

    /// Generate an RSA key pair for signing bundles
    Keygen {
        /// Output prefix; writes <prefix>.pem and <prefix>.pub.pem
        #[arg(short, long)]
        out: PathBuf,

        /// Modulus size in bits
        #[arg(short, long, default_value_t = appboot_bundle::signer::DEFAULT_KEY_BITS)]
        bits: usize,

        /// Overwrite existing key files
        #[arg(short, long)]
        force: bool,
    },

    /// Compare two versions using the selector's rule
    Compare {
        /// First version
        a: String,

        /// Second version
        b: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = BootConfig::load(cli.config.as_deref())?;
    config.apply(Overrides {
        install_dir: cli.install_dir,
        user_data_dir: cli.user_data_dir,
        log_level: cli.log_level,
    });
    config.validate()?;

    appboot_logging::init_logging(config.log_level, config.log_format);

    let success = |()| ExitCode::SUCCESS;
    match cli.command {
        Commands::Launch { print, args } => boot::launch(&config, print, &args),
        Commands::Select => boot::select(&config).map(success),
        Commands::Verify { dir } => bundle::verify(&config, &dir).map(success),
        Commands::Sign { dir, key, files } => {
            bundle::sign(&config, &dir, &key, &files).map(success)
        }
        Commands::Keygen { out, bits, force } => keygen::run(&out, bits, force).map(success),
        Commands::Compare { a, b } => bundle::compare(&a, &b).map(success),
    }
}
