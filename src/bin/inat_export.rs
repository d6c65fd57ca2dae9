//! inat-export: Flatten iNaturalist observation JSON into an append-only CSV
//!
//! Usage:
//!   # Read a JSON array of observations from a file, write a fixed target
//!   inat-export observations.json --output cranes.csv
//!
//!   # Read from stdin
//!   cat observations.json | inat-export --output cranes.csv
//!
//!   # Process NDJSON, write a timestamped file named after the project
//!   inat-export --ndjson observations.jsonl \
//!       --output-dir ./exports --project whooping-cranes
//!
//! Set RUST_LOG=debug to see one line per flattened observation and
//! RUST_LOG=error (the default) for dropped-record diagnostics.

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use inat_export::{build_export_path, export_observations};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "inat-export")]
#[command(about = "Flatten observation JSON into an append-only CSV", long_about = None)]
struct Args {
    /// Input file with observation JSON (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Process newline-delimited JSON (one observation per line)
    #[arg(long)]
    ndjson: bool,

    /// Output CSV file (appended to if it already exists)
    #[arg(long, short = 'o', conflicts_with_all = ["output_dir", "project"])]
    output: Option<PathBuf>,

    /// Output directory for a timestamped CSV named after the project slug
    #[arg(long, requires = "project")]
    output_dir: Option<PathBuf>,

    /// Project slug used in the generated file name
    #[arg(long, requires = "output_dir")]
    project: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let target = match (args.output, args.output_dir, args.project) {
        (Some(path), _, _) => path,
        (None, Some(dir), Some(slug)) => build_export_path(&dir, &slug)?,
        _ => bail!("Specify either --output or --output-dir together with --project"),
    };

    let observations = read_observations(args.input.as_deref(), args.ndjson)?;
    let total = observations.len();

    let written = export_observations(&target, &observations)?;

    println!(
        "Exported {} of {} observation{} to {} ({} dropped)",
        written,
        total,
        if total == 1 { "" } else { "s" },
        target.display(),
        total - written
    );

    Ok(())
}

/// Read observations using SIMD-accelerated JSON parsing when possible
///
/// A JSON array (or a single object) is parsed with simd-json; NDJSON and
/// anything simd-json rejects falls back to serde_json line by line.
fn read_observations(input: Option<&Path>, ndjson: bool) -> Result<Vec<Value>> {
    let mut content = Vec::new();
    let mut reader: Box<dyn Read> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?,
        )),
        None => Box::new(std::io::stdin()),
    };
    reader
        .read_to_end(&mut content)
        .context("Failed to read input")?;

    if !ndjson {
        // Try SIMD parsing first (faster) - use OwnedValue to avoid borrow issues
        match simd_json::to_owned_value(&mut content) {
            Ok(simd_json::OwnedValue::Array(items)) => {
                let mut observations = Vec::with_capacity(items.len());
                for item in items.iter() {
                    let json_str = simd_json::to_string(item)?;
                    observations.push(serde_json::from_str(&json_str)?);
                }
                return Ok(observations);
            }
            Ok(item) => {
                let json_str = simd_json::to_string(&item)?;
                return Ok(vec![serde_json::from_str(&json_str)?]);
            }
            Err(_) => {
                // Fall through to line-by-line parsing
            }
        }
    }

    let content_str = String::from_utf8_lossy(&content);
    let mut observations = Vec::new();
    for line in content_str.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).context("Failed to parse JSON")?;
        observations.push(value);
    }

    Ok(observations)
}
