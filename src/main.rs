use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use licsign_core::{
    bundle,
    canonical,
    config::{LicsignConfig, LoggingConfig},
    policy,
    record::{LicenseRequest, SchemaVersion},
    signing::{self, RsaPemSigner, Signer as _},
    util,
    verify::{VerificationResult, Verifier},
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "licsign",
    version = util::VERSION,
    about = "Issue and verify RSA-signed license files (offline)"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign a license record and write the bundle file.
    Issue {
        /// Issuer RSA private key (PKCS#8 or PKCS#1 PEM).
        #[arg(long)]
        private_key: Option<PathBuf>,
        /// Bundle output path (overwritten if it exists).
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        organization: String,
        /// Last day the license is valid (YYYY-MM-DD).
        #[arg(long)]
        expiry: String,
        /// First day the license is valid (YYYY-MM-DD); defaults to today for v2.
        #[arg(long)]
        valid_from: Option<String>,
        #[arg(long)]
        license_number: Option<String>,
        #[arg(long, default_value = "v2")]
        schema: SchemaVersion,
    },

    /// Verify a bundle file against the issuer's public key.
    Verify {
        /// Issuer RSA public key (SPKI or PKCS#1 PEM).
        #[arg(long)]
        public_key: Option<PathBuf>,
        #[arg(long)]
        bundle: Option<PathBuf>,
        /// Also fail if today is outside the license's validity window.
        #[arg(long)]
        enforce_validity_window: bool,
    },

    /// Print the canonical bytes signed for a bundle's license record.
    Canonical {
        #[arg(long)]
        bundle: Option<PathBuf>,
    },

    /// Print the SHA-256 key id of a public key.
    Fingerprint {
        #[arg(long)]
        public_key: Option<PathBuf>,
    },

    /// Print version information.
    Version,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = LicsignConfig::load(cli.config.as_deref()).context("load config")?;
    cfg.apply_env();

    init_logging(&cfg.logging).context("init logging")?;

    match cli.cmd {
        Commands::Issue {
            private_key,
            out,
            name,
            email,
            organization,
            expiry,
            valid_from,
            license_number,
            schema,
        } => {
            let key_path = private_key
                .or(cfg.paths.private_key.clone())
                .context("no private key given (use --private-key or paths.private_key)")?;
            let out = out.unwrap_or(cfg.paths.bundle.clone());
            util::validate_path(&out, "output")?;

            // Validate the record before touching the key.
            let record = LicenseRequest {
                name,
                email,
                organization,
                expiry,
                valid_from,
                license_number,
            }
            .into_record(schema, util::today_utc())
            .context("build license record")?;

            let signer = RsaPemSigner::from_pem_file(&key_path).context("load private key")?;
            let lic = bundle::issue(&signer, record).context("sign license")?;
            bundle::persist(&lic, &out).context("write bundle")?;

            info!(
                out = %out.display(),
                key_id = %signer.descriptor().key_id,
                schema = %lic.license.schema_version(),
                "license issued"
            );
        }

        Commands::Verify {
            public_key,
            bundle,
            enforce_validity_window,
        } => {
            let key_path = public_key
                .or(cfg.paths.public_key.clone())
                .context("no public key given (use --public-key or paths.public_key)")?;
            let bundle_path = bundle.unwrap_or(cfg.paths.bundle.clone());
            let enforce = enforce_validity_window || cfg.verify.enforce_validity_window;

            let verifier = Verifier::from_public_key_file(&key_path).context("load public key")?;
            let result = verifier
                .verify_file(&bundle_path)
                .context("verify bundle")?;

            match result {
                VerificationResult::Valid(record) => {
                    let json =
                        serde_json::to_string_pretty(&record).context("serialize license")?;
                    println!("{json}");

                    let status = policy::evaluate_now(&record);
                    if !status.is_active() {
                        if enforce {
                            println!("License rejected: {status}");
                            std::process::exit(1);
                        }
                        warn!(%status, "license signature valid but outside validity window");
                    }
                    info!(key_id = %verifier.key_id(), "license valid");
                }
                VerificationResult::Invalid(reason) => {
                    println!("License invalid: {reason}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Canonical { bundle } => {
            let bundle_path = bundle.unwrap_or(cfg.paths.bundle.clone());
            let lic = bundle::load(&bundle_path).context("load bundle")?;
            let bytes = canonical::encode(&lic.license).context("encode license")?;
            println!("{}", bytes.as_str());
        }

        Commands::Fingerprint { public_key } => {
            let key_path = public_key
                .or(cfg.paths.public_key.clone())
                .context("no public key given (use --public-key or paths.public_key)")?;
            let pk = signing::load_public_key_file(&key_path).context("load public key")?;
            println!("{}", signing::key_id(&pk)?);
        }

        Commands::Version => {
            println!("{}", util::version_string());
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::prelude::*;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.level));

    let registry = tracing_subscriber::registry().with(filter);

    if cfg.json_stdout {
        // JSON output to stdout for container / log pipelines.
        let json_layer = tracing_subscriber::fmt::layer().json();
        registry.with(json_layer).init();
    } else if !cfg.json_log_file.is_empty() {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cfg.json_log_file)
            .with_context(|| format!("open json log file {}", cfg.json_log_file))?;
        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::sync::Mutex::new(log_file));
        let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        registry.with(file_layer).with(console_layer).init();
    } else {
        // Default: human-readable output to stderr; stdout carries results.
        let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        registry.with(console_layer).init();
    }
    Ok(())
}
