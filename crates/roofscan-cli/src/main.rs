//! Roofscan: turn roof inspection reports into structured records.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use roofscan_core::RoofscanConfig;
use roofscan_ingest::{extractor_for, AutoExtractor, DocumentInput, FileType, ReportPipeline};
use roofscan_resolve::{PropertyRecord, PropertyResolver};

fn print_usage() {
    println!("Roofscan: roof inspection report extraction");
    println!();
    println!("Usage: roofscan <command> [options]");
    println!();
    println!("Commands:");
    println!("  extract <file>           Extract one report and print it as JSON");
    println!("  batch <dir>              Extract every report in a directory");
    println!("  match <name>             List registry entries resembling a name");
    println!();
    println!("Options:");
    println!("  --registry <file>        JSON array of registry properties");
    println!("  --address <address>      Address to use with `match`");
    println!("  --config <file>          JSON configuration file");
    println!();
    println!("Environment:");
    println!("  ROOFSCAN_MAX_ISSUES      Issue cap per report (default 25)");
    println!("  ROOFSCAN_WORKERS         Batch worker threads (default: one per core)");
    println!("  RUST_LOG                 Log filter (default: info)");
}

/// Value following `flag`, if present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// First argument after the command that is not a flag or a flag's value.
fn positional(args: &[String]) -> Option<&str> {
    let mut iter = args.iter().skip(2);
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
            continue;
        }
        return Some(arg.as_str());
    }
    None
}

fn load_config(args: &[String]) -> anyhow::Result<RoofscanConfig> {
    match flag_value(args, "--config") {
        Some(path) => RoofscanConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path)),
        None => Ok(RoofscanConfig::from_env()),
    }
}

fn load_registry(path: Option<&str>) -> anyhow::Result<Vec<PropertyRecord>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading registry {}", path))?;
    let records: Vec<PropertyRecord> =
        serde_json::from_str(&content).with_context(|| format!("parsing registry {}", path))?;
    info!("Loaded {} registry properties from {}", records.len(), path);
    Ok(records)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

fn cmd_extract(args: &[String]) -> anyhow::Result<()> {
    let Some(file) = positional(args) else {
        bail!("Usage: roofscan extract <file> [--registry <file>]");
    };
    let path = PathBuf::from(file);
    let config = load_config(args)?;
    let registry = load_registry(flag_value(args, "--registry"))?;

    let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let pipeline = ReportPipeline::with_config(extractor_for(FileType::from_path(&path)), config);
    let document = pipeline.process_and_resolve(&bytes, &file_name(&path), &registry);

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

fn cmd_batch(args: &[String]) -> anyhow::Result<()> {
    let Some(dir) = positional(args) else {
        bail!("Usage: roofscan batch <dir> [--registry <file>]");
    };
    let config = load_config(args)?;
    let registry = load_registry(flag_value(args, "--registry"))?;

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in &paths {
        match std::fs::read(path) {
            Ok(bytes) => documents.push(DocumentInput::new(file_name(path), bytes)),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    info!("Processing {} documents from {}", documents.len(), dir);

    let pipeline = ReportPipeline::with_config(AutoExtractor, config);
    let results = pipeline.process_batch(&documents, &registry);

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn cmd_match(args: &[String]) -> anyhow::Result<()> {
    let Some(name) = positional(args) else {
        bail!("Usage: roofscan match <name> [--address <address>] --registry <file>");
    };
    let Some(registry_path) = flag_value(args, "--registry") else {
        bail!("`match` requires --registry <file>");
    };
    let config = load_config(args)?;
    let registry = load_registry(Some(registry_path))?;
    let address = flag_value(args, "--address");

    let resolver = PropertyResolver::new(config.resolver.clone());
    let best = resolver.find_best_match(name, address, &registry);
    let candidates =
        resolver.potential_matches(name, address, &registry, config.resolver.shortlist_limit);

    let output = serde_json::json!({
        "bestMatch": best,
        "candidates": candidates,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("extract") => cmd_extract(&args),
        Some("batch") => cmd_batch(&args),
        Some("match") => cmd_match(&args),
        Some("--help" | "-h" | "help") | None => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
    }
}
