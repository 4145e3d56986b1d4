use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub filename: String,
    pub year: u32,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub file_count: usize,
    pub files: Vec<SourceEntry>,
}

/// One probable SOC code for an (employer, job title) pair, in the compact
/// shape the site reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(rename = "s")]
    pub code: String,
    #[serde(rename = "t")]
    pub title: String,
    #[serde(rename = "n")]
    pub count: u64,
    #[serde(rename = "y")]
    pub years: Vec<u32>,
    #[serde(rename = "o")]
    pub onet_titles: Vec<String>,
}

/// Contents of one `<bucket>.json` file: employer -> job title -> candidates.
pub type ShardDocument = BTreeMap<String, BTreeMap<String, Vec<RankedCandidate>>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildCounts {
    pub files_found: usize,
    pub files_merged: usize,
    pub files_empty: usize,
    pub files_skipped: usize,
    pub rows_read: usize,
    pub certified_rows: usize,
    pub local_groups: usize,
    pub keys_total: usize,
    pub keys_emitted: usize,
    pub shards_written: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: String,
}

/// A source file the build managed to read, merged or empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSource {
    pub filename: String,
    pub year: u32,
    pub rows_read: usize,
    pub certified_rows: usize,
    pub local_groups: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: String,
    pub input_dir: String,
    pub output_dir: String,
    pub enrichment_source: String,
    pub counts: BuildCounts,
    /// Bucket id -> number of employers in that shard.
    pub shards: BTreeMap<String, usize>,
    pub skipped_files: Vec<SkippedFile>,
    pub sources: Vec<BuildSource>,
}
