//! Attestor CLI
//!
//! Command-line interface for the write-once report digest registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use attestor_core::types::{Digest, SubmitterId};
use attestor_core::ReportRegistry;
use attestor_ipfs::{ipfs_url, PinataStore};
use attestor_registry::FileRegistry;
use attestor_report::{canonical_json, keccak256_digest, sha256_digest, SubmitOutcome, Submitter};

/// Attestor - tamper-evident proof of report existence
#[derive(Parser)]
#[command(name = "attestor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the registry file
    #[arg(short, long, global = true, env = "ATTESTOR_REGISTRY", default_value = "attestor.reg")]
    registry: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a report digest
    Register {
        /// Digest to register (0x + 64 hex characters)
        digest: String,
        /// Identity performing the registration (0x + 40 hex characters)
        #[arg(short, long, env = "ATTESTOR_OWNER")]
        owner: String,
        /// Storage pointer to record in the same transition
        #[arg(short, long)]
        pointer: Option<String>,
    },

    /// Verify whether a digest was registered, and by whom
    Verify {
        /// Digest to look up
        digest: String,
    },

    /// Print the storage pointer recorded for a digest
    Pointer {
        /// Digest to look up
        digest: String,
    },

    /// Compute the canonical digests of a JSON report without registering it
    Hash {
        /// Path to the report JSON file
        report: PathBuf,
    },

    /// Digest a JSON report, optionally pin it, and register it
    Submit {
        /// Path to the report JSON file
        report: PathBuf,
        /// Identity performing the registration
        #[arg(short, long, env = "ATTESTOR_OWNER")]
        owner: String,
        /// Label used in the pin name (defaults to the file stem)
        #[arg(short, long)]
        label: Option<String>,
        /// Pin the full report to IPFS and register the CID as pointer
        #[arg(long)]
        pin: bool,
    },

    /// Show registry statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "attestor=debug,info"
    } else {
        "attestor=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Register {
            digest,
            owner,
            pointer,
        } => cmd_register(&cli.registry, &digest, &owner, pointer.as_deref()).await,
        Commands::Verify { digest } => cmd_verify(&cli.registry, &digest).await,
        Commands::Pointer { digest } => cmd_pointer(&cli.registry, &digest).await,
        Commands::Hash { report } => cmd_hash(&report),
        Commands::Submit {
            report,
            owner,
            label,
            pin,
        } => cmd_submit(&cli.registry, &report, &owner, label.as_deref(), pin).await,
        Commands::Stats => cmd_stats(&cli.registry).await,
    }
}

async fn open_registry(path: &Path) -> Result<FileRegistry> {
    FileRegistry::new(path)
        .await
        .with_context(|| format!("failed to open registry at {}", path.display()))
}

fn parse_digest(input: &str) -> Result<Digest> {
    Digest::parse(input).context("digest must be 0x followed by 64 hex characters")
}

fn parse_owner(input: &str) -> Result<SubmitterId> {
    SubmitterId::parse(input).context("owner must be 0x followed by 40 hex characters")
}

fn format_timestamp(ts: u64) -> String {
    chrono::DateTime::from_timestamp(ts as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn read_report(path: &Path) -> Result<serde_json::Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Register a bare digest (optionally with a pointer)
async fn cmd_register(
    registry_path: &Path,
    digest: &str,
    owner: &str,
    pointer: Option<&str>,
) -> Result<()> {
    let digest = parse_digest(digest)?;
    let owner = parse_owner(owner)?;
    let registry = open_registry(registry_path).await?;

    let written = match pointer {
        Some(pointer) => registry.register_with_pointer(digest, owner, pointer).await,
        None => registry.register(digest, owner).await,
    };

    match written {
        Ok(receipt) => {
            registry.flush().await?;
            println!("{}", "✅ Registered".green().bold());
            println!("   Digest:   {}", digest);
            println!("   Owner:    {}", owner);
            println!("   Sequence: #{}", receipt.sequence);
            println!("   Time:     {}", format_timestamp(receipt.registered_at));
            if let Some(pointer) = pointer {
                println!("   Pointer:  {}", pointer);
            }
            Ok(())
        }
        Err(e) if e.is_conflict() => {
            let proof = registry.verify(digest).await?;
            println!("{}", "❌ Already registered".red().bold());
            println!("   Owner: {}", proof.owner);
            println!("   Time:  {}", format_timestamp(proof.registered_at));
            bail!("digest {} is already registered", digest);
        }
        Err(e) => Err(e.into()),
    }
}

/// Verify a digest
async fn cmd_verify(registry_path: &Path, digest: &str) -> Result<()> {
    let digest = parse_digest(digest)?;
    let registry = open_registry(registry_path).await?;

    let proof = registry.verify(digest).await?;
    if proof.registered {
        println!("{}", "✅ Registered".green().bold());
        println!("   Digest: {}", digest);
        println!("   Owner:  {}", proof.owner);
        println!("   Time:   {}", format_timestamp(proof.registered_at));
    } else {
        println!("{}", "⚠️  Not registered".yellow().bold());
        println!("   Digest: {}", digest);
    }
    Ok(())
}

/// Print the storage pointer for a digest
async fn cmd_pointer(registry_path: &Path, digest: &str) -> Result<()> {
    let digest = parse_digest(digest)?;
    let registry = open_registry(registry_path).await?;

    let pointer = registry.get_pointer(digest).await?;
    if pointer.is_empty() {
        // Empty means "no pointer" or "never registered"; say which.
        let proof = registry.verify(digest).await?;
        if proof.registered {
            println!("{}", "⚠️  Registered without a pointer".yellow());
        } else {
            println!("{}", "⚠️  Not registered".yellow());
        }
    } else {
        println!("{}", pointer);
        println!("{}", ipfs_url(&pointer).dimmed());
    }
    Ok(())
}

/// Hash a report file without touching the registry
fn cmd_hash(report_path: &Path) -> Result<()> {
    let report = read_report(report_path)?;
    let canonical = canonical_json(&report)?;

    // SHA-256 is what submit registers; Keccak-256 is printed for
    // verifiers using ledger-native tooling.
    println!("SHA-256:    {}", sha256_digest(&canonical));
    println!("Keccak-256: {}", keccak256_digest(&canonical));
    Ok(())
}

/// Digest, optionally pin, and register a report
async fn cmd_submit(
    registry_path: &Path,
    report_path: &Path,
    owner: &str,
    label: Option<&str>,
    pin: bool,
) -> Result<()> {
    let owner = parse_owner(owner)?;
    let report = read_report(report_path)?;
    let registry = Arc::new(open_registry(registry_path).await?);

    let mut submitter = Submitter::new(registry.clone());
    if pin {
        submitter = submitter.with_store(Arc::new(PinataStore::from_env()));
    }

    let label = label
        .map(str::to_string)
        .or_else(|| {
            report_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_default();

    let outcome = submitter.submit(&report, owner, Some(label.as_str())).await?;
    registry.flush().await?;

    match outcome {
        SubmitOutcome::Registered {
            digest,
            receipt,
            pointer,
        } => {
            println!("{}", "✅ Report registered".green().bold());
            println!("   Digest:   {}", digest);
            println!("   Owner:    {}", owner);
            println!("   Sequence: #{}", receipt.sequence);
            println!("   Time:     {}", format_timestamp(receipt.registered_at));
            if let Some(cid) = pointer {
                println!("   Pointer:  {}", cid);
                println!("   {}", ipfs_url(&cid).dimmed());
            }
        }
        SubmitOutcome::AlreadyProven {
            digest,
            verification,
        } => {
            println!("{}", "✅ Already proven".yellow().bold());
            println!("   Digest: {}", digest);
            println!("   Owner:  {}", verification.owner);
            println!("   Time:   {}", format_timestamp(verification.registered_at));
        }
    }
    Ok(())
}

/// Show registry statistics
async fn cmd_stats(registry_path: &Path) -> Result<()> {
    let registry = open_registry(registry_path).await?;
    let stats = registry.stats();

    println!("{}", "📊 Registry statistics".cyan().bold());
    println!("   Registrations: {}", stats.total_count);
    println!("   With pointer:  {}", stats.with_pointer_count);
    if let Some(ts) = stats.earliest_timestamp {
        println!("   Earliest:      {}", format_timestamp(ts));
    }
    if let Some(ts) = stats.latest_timestamp {
        println!("   Latest:        {}", format_timestamp(ts));
    }
    Ok(())
}
