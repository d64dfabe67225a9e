//! Tapedeck CLI

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Tapedeck v{}", env!("CARGO_PKG_VERSION"));
        eprintln!();
        eprintln!("Usage: tapedeck <command> [options]");
        eprintln!();
        eprintln!("Commands:");
        eprintln!("  stats <session-dir>    Show persisted session statistics");
        process::exit(1);
    }

    let command = &args[1];

    match command.as_str() {
        "stats" => {
            if args.len() < 3 {
                eprintln!("Usage: tapedeck stats <session-dir>");
                process::exit(1);
            }

            let dir = PathBuf::from(&args[2]);
            if let Err(e) = show_stats(&dir) {
                eprintln!("Error: {e:#}");
                process::exit(1);
            }
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!("Run 'tapedeck' for usage information.");
            process::exit(1);
        }
    }
}

/// Print per-identity session statistics for a base directory
fn show_stats(dir: &Path) -> anyhow::Result<()> {
    if !dir.exists() {
        anyhow::bail!("directory not found: {}", dir.display());
    }

    println!("Session directory: {}", dir.display());
    println!();

    let mut identities: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    identities.sort();

    if identities.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    for identity_dir in identities {
        let identity = identity_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let document = tapedeck::storage::load(&identity_dir)
            .with_context(|| format!("loading session '{identity}'"))?;

        let name_count: usize = document.names.values().map(Vec::len).sum();
        println!(
            "  {identity}: {} entries, {} names across {} tests",
            document.entries.len(),
            name_count,
            document.names.len()
        );
    }

    Ok(())
}
