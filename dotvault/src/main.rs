//! dotvault - Main entry point
//!
//! Back up and restore `.env` files across machines.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotvault::backup::run_backup;
use dotvault::crypto::RecoveryPhrase;
use dotvault::fs::{scan_projects, ScanOptions};
use dotvault::restore::run_restore;
use dotvault::store::{HttpStore, RemoteStore};
use dotvault::{utils, Config, VaultContext};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", env = "DOTVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Recovery phrase (12 words)
    #[arg(long, env = "DOTVAULT_PHRASE", hide_env_values = true, global = true)]
    phrase: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new recovery phrase
    Init,

    /// Show detected projects and secret files without uploading
    Scan {
        /// Directory to scan
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Encrypt and upload every secret file under a directory
    Backup {
        /// Directory to scan
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Restore the latest backup into matching local projects
    Restore {
        /// Directory to scan for local projects
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Overwrite files that already exist
        #[arg(short, long)]
        force: bool,
    },

    /// List backups stored for this vault
    List {
        #[arg(long, default_value_t = 10)]
        limit: u32,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    }
    .with_env_overrides();

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::debug!(
        "Starting dotvault v{} (device: {})",
        env!("CARGO_PKG_VERSION"),
        config.device.id
    );

    let scan_options = ScanOptions::with_extra_skip_dirs(&config.scan.extra_skip_dirs);

    match args.command {
        Command::Init => {
            let phrase = RecoveryPhrase::generate()?;
            println!("Your recovery phrase (store it somewhere safe):\n");
            println!("    {}\n", phrase.as_str());
            println!("Vault id: {}", phrase.vault_id());
        }

        Command::Scan { dir } => {
            let projects = scan_projects(&dir, &scan_options).await?;
            for project in &projects {
                println!(
                    "{} ({}: {})",
                    project.name, project.fingerprint.source, project.fingerprint.value
                );
                println!("    {}", project.path.display());
                for file in &project.secret_files {
                    println!("    - {}", file.relative_path);
                }
            }
            let files: usize = projects.iter().map(|p| p.secret_files.len()).sum();
            println!("\n{} projects, {} secret files", projects.len(), files);
        }

        Command::Backup { dir } => {
            let ctx = connect(args.phrase.as_deref(), &config)?.with_scan_options(scan_options);
            match run_backup(&ctx, &dir).await? {
                Some(summary) => println!(
                    "Backed up {} files from {} projects ({} bytes, id {})",
                    summary.files, summary.projects, summary.receipt.size_bytes, summary.receipt.id
                ),
                None => println!("No secret files found, nothing to back up"),
            }
        }

        Command::Restore { dir, force } => {
            let ctx = connect(args.phrase.as_deref(), &config)?.with_scan_options(scan_options);
            let report = run_restore(&ctx, &dir, force).await?;
            let outcome = &report.outcome;

            println!(
                "Backup from {} at {}",
                report.backup_device_id,
                report.backup_created_at.to_rfc3339()
            );
            for matched in &outcome.matched {
                println!(
                    "  {} -> {}",
                    matched.snapshot.name,
                    matched.local_path.display()
                );
            }
            if !outcome.unmatched.is_empty() {
                println!("Not found locally:");
                for project in &outcome.unmatched {
                    println!("  {} ({} files)", project.name, project.envs.len());
                }
            }
            println!(
                "{} restored, {} skipped, {} failed",
                outcome.counts.restored, outcome.counts.skipped, outcome.counts.failed
            );
            if outcome.counts.skipped > 0 && !force {
                println!("Use --force to overwrite existing files");
            }
        }

        Command::List { limit, offset } => {
            let ctx = connect(args.phrase.as_deref(), &config)?;
            let page = ctx.store.list_backups(limit, offset).await?;
            for item in &page.items {
                println!(
                    "{}  {}  {:>8} bytes  {}",
                    item.id,
                    item.created_at.to_rfc3339(),
                    item.size_bytes,
                    item.device_id
                );
            }
            println!("{} of {} backups", page.items.len(), page.total);
        }
    }

    Ok(())
}

/// Validate the phrase and build the store client for it.
fn connect(phrase: Option<&str>, config: &Config) -> Result<VaultContext<HttpStore>> {
    let phrase = phrase.context("a recovery phrase is required (--phrase or DOTVAULT_PHRASE)")?;
    let phrase = RecoveryPhrase::parse(phrase)?;

    let store = HttpStore::new(
        &config.server.url,
        phrase.vault_id(),
        Duration::from_secs(config.server.timeout_secs),
    )?;

    Ok(VaultContext::new(store, phrase, config.device.id.clone()))
}
