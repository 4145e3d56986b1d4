use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use super::aggregate::{Accumulator, FileAggregate, aggregate_file};
use super::enrich::{OccupationLookup, OnetTable};
use super::normalize::{extract_year, year_pattern};
use super::schema::resolve_columns;
use super::shard::build_shards;
use super::source::open_source;
use crate::cli::{BuildArgs, default_manifest_path};
use crate::commands::inventory;
use crate::model::{BuildCounts, BuildRunManifest, BuildSource, SkippedFile};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: BuildArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("build-{}", utc_compact_string(started_ts));

    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| default_manifest_path(&args.output_dir));

    info!(
        input_dir = %args.input_dir.display(),
        output_dir = %args.output_dir.display(),
        run_id = %run_id,
        "starting build"
    );

    let (lookup, enrichment_source) = match &args.enrichment_path {
        Some(path) => {
            let table = OnetTable::from_json_file(path)?;
            info!(path = %path.display(), codes = table.len(), "loaded enrichment table");
            (table, path.display().to_string())
        }
        None => (OnetTable::builtin(), "builtin".to_string()),
    };

    let outcome = build(&args.input_dir, &args.output_dir, &lookup)?;

    let manifest = BuildRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        finished_at: now_utc_string(),
        input_dir: args.input_dir.display().to_string(),
        output_dir: args.output_dir.display().to_string(),
        enrichment_source,
        counts: outcome.counts.clone(),
        shards: outcome.shards,
        skipped_files: outcome.skipped_files,
        sources: outcome.sources,
    };
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote build manifest");

    info!(
        shards = outcome.counts.shards_written,
        keys = outcome.counts.keys_emitted,
        files_merged = outcome.counts.files_merged,
        files_skipped = outcome.counts.files_skipped,
        "build completed"
    );

    Ok(())
}

#[derive(Debug, Default)]
pub(crate) struct BuildOutcome {
    pub(crate) counts: BuildCounts,
    pub(crate) shards: BTreeMap<String, usize>,
    pub(crate) skipped_files: Vec<SkippedFile>,
    pub(crate) sources: Vec<BuildSource>,
}

/// Aggregates every source file under `input_dir` and rewrites `output_dir`
/// with the resulting shards. A file that cannot be read or lacks required
/// columns is skipped without touching what earlier files contributed.
pub(crate) fn build(
    input_dir: &Path,
    output_dir: &Path,
    lookup: &dyn OccupationLookup,
) -> Result<BuildOutcome> {
    let pattern = year_pattern()?;
    let paths = inventory::discover_sources(input_dir)?;
    if paths.is_empty() {
        warn!(input_dir = %input_dir.display(), "no source files found");
    }

    let mut outcome = BuildOutcome::default();
    outcome.counts.files_found = paths.len();
    let mut accumulator = Accumulator::new();

    for path in &paths {
        let filename = display_name(path);
        let year = extract_year(&filename, &pattern);
        info!(file = %filename, year, "reading source file");

        let aggregate = match read_source(path, year) {
            Ok(aggregate) => aggregate,
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(file = %filename, reason = %reason, "skipping source file");
                outcome.counts.files_skipped += 1;
                outcome.skipped_files.push(SkippedFile { filename, reason });
                continue;
            }
        };

        let groups = aggregate.groups.len();
        outcome.counts.rows_read += aggregate.rows_read;
        outcome.counts.certified_rows += aggregate.certified_rows;
        outcome.sources.push(BuildSource {
            filename: filename.clone(),
            year,
            rows_read: aggregate.rows_read,
            certified_rows: aggregate.certified_rows,
            local_groups: groups,
        });

        if aggregate.is_empty() {
            outcome.counts.files_empty += 1;
            continue;
        }

        outcome.counts.local_groups += groups;
        outcome.counts.files_merged += 1;
        accumulator.merge(aggregate);
        info!(file = %filename, groups, keys = accumulator.len(), "merged source file");
    }

    outcome.counts.keys_total = accumulator.len();
    let shards = build_shards(accumulator, lookup);
    let written = shards.write_all(output_dir)?;
    outcome.counts.keys_emitted = shards.keys_emitted();
    outcome.counts.shards_written = written.len();
    outcome.shards = shards.summary();

    Ok(outcome)
}

fn read_source(path: &Path, year: u32) -> Result<FileAggregate> {
    let mut source = open_source(path)?;
    let headers = source.headers()?;
    let plan = resolve_columns(&headers)
        .with_context(|| format!("unusable header in {}", path.display()))?;
    debug!(file = %path.display(), columns = ?plan.headers(), "resolved header");
    aggregate_file(source.as_mut(), &plan, year)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
