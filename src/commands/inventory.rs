use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::commands::build::{SourceFormat, extract_year, year_pattern};
use crate::model::{SourceEntry, SourceInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.input_dir)?;

    let undated = manifest.files.iter().filter(|file| file.year == 0).count();
    if undated > 0 {
        warn!(undated, "some source filenames carry no FY<year> marker");
    }

    if args.dry_run {
        info!(
            file_count = manifest.file_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.input_dir.join("source_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(file_count = manifest.file_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(input_dir: &Path) -> Result<SourceInventoryManifest> {
    let pattern = year_pattern()?;
    let paths = discover_sources(input_dir)?;

    if paths.is_empty() {
        bail!("no disclosure files found in {}", input_dir.display());
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(describe_source(&path, &pattern)?);
    }

    files.sort_by(|a, b| a.year.cmp(&b.year).then(a.filename.cmp(&b.filename)));

    Ok(SourceInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: input_dir.display().to_string(),
        file_count: files.len(),
        files,
    })
}

pub fn describe_source(path: &Path, pattern: &Regex) -> Result<SourceEntry> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

    let year = extract_year(&filename, pattern);
    let sha256 = sha256_file(path)?;

    Ok(SourceEntry {
        filename,
        year,
        sha256,
    })
}

/// Spreadsheet and CSV files directly inside `input_dir`, sorted by path.
pub fn discover_sources(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();

    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("failed to read {}", input_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", input_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        // Excel lock files (`~$book.xlsx`) share the extension but are not workbooks.
        let is_lock_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("~$"));

        if SourceFormat::from_path(&path).is_some() && !is_lock_file {
            sources.push(path);
        }
    }

    sources.sort();
    Ok(sources)
}
