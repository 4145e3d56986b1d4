use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use super::aggregate::{Accumulator, CanonicalKey};
use super::enrich::OccupationLookup;
use super::rank::rank_candidates;
use crate::model::{RankedCandidate, ShardDocument};
use crate::util::{reset_directory, write_json_compact};

pub(crate) const EMPTY_NAME_BUCKET: &str = "ZZ";
pub(crate) const NON_ALPHA_BUCKET: &str = "00";

/// Bucket for an employer: its first two letters, `X_` when only the first
/// character is a letter, `00` when it starts with anything else, `ZZ` when
/// empty. Only ASCII letters count, so bucket ids are always safe filenames.
pub(crate) fn shard_key(company: &str) -> String {
    let mut chars = company.chars().map(|ch| ch.to_ascii_uppercase());

    let Some(first) = chars.next() else {
        return EMPTY_NAME_BUCKET.to_string();
    };
    if !first.is_ascii_alphabetic() {
        return NON_ALPHA_BUCKET.to_string();
    }

    match chars.next() {
        Some(second) if second.is_ascii_alphabetic() => format!("{first}{second}"),
        _ => format!("{first}_"),
    }
}

#[derive(Debug, Default)]
pub(crate) struct ShardSet {
    buckets: BTreeMap<String, ShardDocument>,
    keys_emitted: usize,
}

impl ShardSet {
    pub(crate) fn insert(&mut self, key: CanonicalKey, candidates: Vec<RankedCandidate>) {
        if candidates.is_empty() {
            return;
        }

        let bucket = shard_key(&key.company);
        self.buckets
            .entry(bucket)
            .or_default()
            .entry(key.company)
            .or_default()
            .insert(key.title, candidates);
        self.keys_emitted += 1;
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn keys_emitted(&self) -> usize {
        self.keys_emitted
    }

    #[cfg(test)]
    pub(crate) fn bucket(&self, id: &str) -> Option<&ShardDocument> {
        self.buckets.get(id)
    }

    /// Employer count per bucket.
    pub(crate) fn summary(&self) -> BTreeMap<String, usize> {
        self.buckets
            .iter()
            .map(|(bucket, document)| (bucket.clone(), document.len()))
            .collect()
    }

    /// Replaces `output_dir` with one `<bucket>.json` per bucket.
    pub(crate) fn write_all(&self, output_dir: &Path) -> Result<Vec<PathBuf>> {
        reset_directory(output_dir)?;

        let mut written = Vec::with_capacity(self.buckets.len());
        for (bucket, document) in &self.buckets {
            let path = output_dir.join(format!("{bucket}.json"));
            write_json_compact(&path, document)?;
            debug!(bucket = %bucket, companies = document.len(), "wrote shard");
            written.push(path);
        }

        Ok(written)
    }
}

/// Ranks every key of the finished accumulator and files the survivors
/// into buckets.
pub(crate) fn build_shards(accumulator: Accumulator, lookup: &dyn OccupationLookup) -> ShardSet {
    let mut shards = ShardSet::default();
    for (key, tallies) in accumulator.into_sorted_entries() {
        let candidates = rank_candidates(&tallies, lookup);
        shards.insert(key, candidates);
    }
    shards
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};

    use super::*;
    use crate::commands::build::aggregate::{FileAggregate, LocalGroupKey};
    use crate::commands::build::enrich::OnetTable;

    #[test]
    fn shard_key_covers_every_prefix_shape() {
        assert_eq!(shard_key("ACME INC"), "AC");
        assert_eq!(shard_key("acme"), "AC");
        assert_eq!(shard_key("X INC"), "X_");
        assert_eq!(shard_key("X"), "X_");
        assert_eq!(shard_key("A1 SOLUTIONS"), "A_");
        assert_eq!(shard_key("3M COMPANY"), "00");
        assert_eq!(shard_key("&BLUE"), "00");
        assert_eq!(shard_key("ÉCOLE"), "00");
        assert_eq!(shard_key(""), "ZZ");
    }

    #[test]
    fn shard_key_is_deterministic() {
        for name in ["GOOGLE LLC", "X INC", "7-ELEVEN", ""] {
            assert_eq!(shard_key(name), shard_key(name));
        }
    }

    fn group(company: &str, title: &str, code: &str) -> LocalGroupKey {
        LocalGroupKey {
            company: company.to_string(),
            title: title.to_string(),
            soc_code: code.to_string(),
            soc_title: format!("title {code}"),
        }
    }

    #[test]
    fn build_shards_places_each_company_in_one_bucket() {
        let mut accumulator = Accumulator::new();
        accumulator.merge(FileAggregate {
            year: 2023,
            groups: BTreeMap::from([
                (group("ACME INC", "DEVELOPER", "15-1252"), 4),
                (group("ACME INC", "ANALYST", "15-2051"), 1),
                (group("ACME LABS", "DEVELOPER", "15-1252"), 2),
                (group("ADOBE", "DEVELOPER", "15-1252"), 5),
                (group("ADOBE", "DEVELOPER", "15-1253"), 1),
                (group("", "ENGINEER", "17-2071"), 3),
                (group("3M", "CHEMIST", "19-2031"), 1),
            ]),
            ..FileAggregate::default()
        });

        let shards = build_shards(accumulator, &OnetTable::builtin());

        let summary = shards.summary();
        assert_eq!(
            summary.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["00", "AC", "AD", "ZZ"]
        );
        assert_eq!(summary["AC"], 2);
        assert_eq!(shards.keys_emitted(), 6);

        let ac = shards.bucket("AC").expect("AC bucket");
        assert_eq!(ac["ACME INC"].len(), 2);
        assert_eq!(ac["ACME INC"]["DEVELOPER"][0].onet_titles.len(), 1);

        let ad = shards.bucket("AD").expect("AD bucket");
        assert_eq!(ad["ADOBE"]["DEVELOPER"].len(), 1);
        assert_eq!(ad["ADOBE"]["DEVELOPER"][0].code, "15-1252");

        let zz = shards.bucket("ZZ").expect("ZZ bucket");
        assert_eq!(zz[""]["ENGINEER"][0].count, 3);

        let mut seen = HashSet::new();
        for bucket in summary.keys() {
            for company in shards.bucket(bucket).expect("bucket").keys() {
                assert!(seen.insert(company.clone()), "{company} in two buckets");
            }
        }
    }

    #[test]
    fn build_shards_drops_keys_without_survivors() {
        let mut accumulator = Accumulator::new();
        accumulator.merge(FileAggregate {
            year: 2022,
            groups: BTreeMap::from([
                (group("BETA", "DEV", "15-1252"), 2),
                (group("BETA", "DEV", "15-1253"), 2),
            ]),
            ..FileAggregate::default()
        });

        let shards = build_shards(accumulator, &OnetTable::builtin());
        assert_eq!(shards.len(), 0);
        assert_eq!(shards.keys_emitted(), 0);
    }

    #[test]
    fn write_all_replaces_stale_shards() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("company_soc");
        std::fs::create_dir_all(&output).expect("mkdir");
        std::fs::write(output.join("OLD.json"), "{}").expect("stale shard");

        let mut shards = ShardSet::default();
        shards.insert(
            CanonicalKey {
                company: "ACME".to_string(),
                title: "DEV".to_string(),
            },
            vec![RankedCandidate {
                code: "15-1252".to_string(),
                title: "Software Developers".to_string(),
                count: 1,
                years: vec![2023],
                onet_titles: Vec::new(),
            }],
        );

        let written = shards.write_all(&output).expect("write shards");
        assert_eq!(written, vec![output.join("AC.json")]);

        let names: BTreeSet<String> = std::fs::read_dir(&output)
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, BTreeSet::from(["AC.json".to_string()]));

        let raw = std::fs::read_to_string(output.join("AC.json")).expect("read shard");
        assert_eq!(
            raw,
            r#"{"ACME":{"DEV":[{"s":"15-1252","t":"Software Developers","n":1,"y":[2023],"o":[]}]}}"#
        );
    }
}
