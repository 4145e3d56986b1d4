use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{StatusArgs, default_manifest_path};
use crate::model::BuildRunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| default_manifest_path(&args.output_dir));

    info!(output_dir = %args.output_dir.display(), "status requested");

    if manifest_path.exists() {
        let raw = fs::read(&manifest_path)
            .with_context(|| format!("failed to read {}", manifest_path.display()))?;
        let manifest: BuildRunManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", manifest_path.display()))?;

        info!(
            run_id = %manifest.run_id,
            status = %manifest.status,
            finished_at = %manifest.finished_at,
            input_dir = %manifest.input_dir,
            enrichment = %manifest.enrichment_source,
            files_found = manifest.counts.files_found,
            files_merged = manifest.counts.files_merged,
            files_empty = manifest.counts.files_empty,
            files_skipped = manifest.counts.files_skipped,
            keys_emitted = manifest.counts.keys_emitted,
            shards = manifest.counts.shards_written,
            "loaded build manifest"
        );
        for skipped in &manifest.skipped_files {
            warn!(file = %skipped.filename, reason = %skipped.reason, "file skipped in last build");
        }
    } else {
        warn!(path = %manifest_path.display(), "build manifest missing");
    }

    if args.output_dir.is_dir() {
        let shard_count = count_shards(&args.output_dir)?;
        info!(path = %args.output_dir.display(), shards = shard_count, "shard directory status");
    } else {
        warn!(path = %args.output_dir.display(), "shard directory missing");
    }

    Ok(())
}

fn count_shards(output_dir: &Path) -> Result<usize> {
    let entries = fs::read_dir(output_dir)
        .with_context(|| format!("failed to read {}", output_dir.display()))?;

    let mut count = 0;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", output_dir.display()))?;
        let is_json = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            count += 1;
        }
    }

    Ok(count)
}
