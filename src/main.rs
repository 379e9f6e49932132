//! docbundle main entry point
//!
//! This is the command-line interface for building offline documentation bundles.

use anyhow::{bail, Context};
use clap::Parser;
use docbundle::config::{load_config_with_hash, Config, SourceKind};
use docbundle::crawler::Coordinator;
use docbundle::site::{ConfigRegistry, Registry};
use docbundle::storage::{DocStorer, FileSystemStore, Manifest};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// docbundle: offline documentation bundles
///
/// docbundle crawls the documentation sets listed in a configuration file,
/// cleans every page, extracts a searchable entry index, and writes one
/// bundle per documentation set plus a manifest of all bundles.
#[derive(Parser, Debug)]
#[command(name = "docbundle")]
#[command(version)]
#[command(about = "Builds offline documentation bundles", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Only build the doc with this slug
    #[arg(long, value_name = "SLUG")]
    doc: Option<String>,

    /// Only build this version of the selected doc
    #[arg(long, value_name = "VERSION", requires = "doc")]
    doc_version: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Do not rewrite docs.json after building
    #[arg(long)]
    no_manifest: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let selected = select_docs(&config, cli.doc.as_deref(), cli.doc_version.as_deref())?;

    if cli.dry_run {
        handle_dry_run(&config, &selected);
        return Ok(());
    }

    handle_build(&config, selected, !cli.no_manifest).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docbundle=info,warn"),
            1 => EnvFilter::new("docbundle=debug,info"),
            2 => EnvFilter::new("docbundle=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Resolves the command-line selection to `(slug, version)` pairs
fn select_docs(
    config: &Config,
    slug: Option<&str>,
    version: Option<&str>,
) -> anyhow::Result<Vec<(String, Option<String>)>> {
    let selected: Vec<_> = config
        .docs
        .iter()
        .filter(|doc| slug.map_or(true, |s| doc.slug == s))
        .filter(|doc| version.map_or(true, |v| doc.version.as_deref() == Some(v)))
        .map(|doc| (doc.slug.clone(), doc.version.clone()))
        .collect();

    if selected.is_empty() {
        bail!(
            "No doc matches {}{}",
            slug.unwrap_or("*"),
            version.map(|v| format!("@{}", v)).unwrap_or_default()
        );
    }
    Ok(selected)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, selected: &[(String, Option<String>)]) {
    println!("=== docbundle Dry Run ===\n");

    println!("Output:");
    println!("  Directory: {}", config.output.directory);
    println!("  Manifest: {}", if config.output.manifest { "yes" } else { "no" });

    println!("\nDocs ({}):", selected.len());
    for doc in config.docs.iter().filter(|doc| {
        selected
            .iter()
            .any(|(slug, version)| &doc.slug == slug && &doc.version == version)
    }) {
        println!("  - {} [{}] ({})", doc.name, doc.label(), doc.doc_type);
        println!("    Base URL: {}", doc.base_url);
        if let Some(root) = &doc.root_path {
            println!("    Root path: {}", root);
        }
        match doc.source.kind {
            SourceKind::Remote => println!(
                "    Source: remote, max concurrency {}, rate limit {}",
                doc.options.max_concurrency,
                doc.options
                    .rate_limit
                    .map(|limit| format!("{}/min", limit))
                    .unwrap_or_else(|| "none".to_string())
            ),
            SourceKind::Local => println!(
                "    Source: local {}",
                doc.source.directory.as_deref().unwrap_or_default()
            ),
        }
        println!(
            "    Seeds: {}, filters: {}",
            1 + doc.initial_paths.len(),
            doc.filters.len()
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main build: crawl and store each selected doc, then the manifest
async fn handle_build(
    config: &Config,
    selected: Vec<(String, Option<String>)>,
    write_manifest: bool,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping crawl");
            ctrl_c.cancel();
        }
    });

    let registry = ConfigRegistry::from_config(config);
    let store = FileSystemStore::new(&config.output.directory);
    let mut failed = Vec::new();

    for (slug, version) in &selected {
        if cancel.is_cancelled() {
            break;
        }

        let label = match version {
            Some(version) => format!("{}@{}", slug, version),
            None => slug.clone(),
        };

        let result = async {
            let site = registry.resolve(slug, version.as_deref(), &[]).await?;
            let coordinator = Coordinator::new(site)?;
            DocStorer::store(coordinator, &store, cancel.clone()).await
        }
        .await;

        match result {
            Ok(report) => println!(
                "{}: {} pages, {} entries -> {}",
                label, report.pages_written, report.entries, report.path
            ),
            Err(e) => {
                tracing::error!("Failed to build {}: {}", label, e);
                failed.push(label);
            }
        }
    }

    if cancel.is_cancelled() {
        bail!("Build interrupted");
    }

    if write_manifest && config.output.manifest {
        let manifest = Manifest::load(&store)
            .await
            .context("Failed to read existing bundles")?;
        manifest
            .write(&store)
            .await
            .context("Failed to write docs.json")?;
    }

    if !failed.is_empty() {
        bail!("Failed to build: {}", failed.join(", "));
    }

    Ok(())
}
