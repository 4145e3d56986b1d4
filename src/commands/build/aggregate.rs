use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::ControlFlow;

use anyhow::Result;
use indexmap::IndexMap;

use super::normalize::{normalize_code, normalize_text};
use super::schema::{CanonicalField, ColumnPlan};
use super::source::{FieldValue, TabularSource};

const CERTIFIED_STATUS: &str = "CERTIFIED";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct CanonicalKey {
    pub(crate) company: String,
    pub(crate) title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct LocalGroupKey {
    pub(crate) company: String,
    pub(crate) title: String,
    pub(crate) soc_code: String,
    pub(crate) soc_title: String,
}

/// Certified filings of one file, counted per distinct
/// (company, title, code, SOC title). Nothing here touches the accumulator.
#[derive(Debug, Clone, Default)]
pub(crate) struct FileAggregate {
    pub(crate) year: u32,
    pub(crate) rows_read: usize,
    pub(crate) certified_rows: usize,
    pub(crate) groups: BTreeMap<LocalGroupKey, u64>,
}

impl FileAggregate {
    pub(crate) fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CodeTally {
    /// SOC title from the first file that introduced this code for the key.
    pub(crate) title: String,
    pub(crate) count: u64,
    pub(crate) years: BTreeSet<u32>,
}

/// Codes seen for one key, in first-encounter order.
pub(crate) type CodeTallies = IndexMap<String, CodeTally>;

/// Cross-file state of one build: per key, per broad SOC code, the certified
/// filing count and the fiscal years it was seen in.
#[derive(Debug, Default)]
pub(crate) struct Accumulator {
    keys: HashMap<CanonicalKey, CodeTallies>,
}

impl Accumulator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, company: &str, title: &str) -> Option<&CodeTallies> {
        self.keys.get(&CanonicalKey {
            company: company.to_string(),
            title: title.to_string(),
        })
    }

    /// Adds a file's local groups. Counts are summed and years unioned; an
    /// existing code keeps the title it was first seen with.
    pub(crate) fn merge(&mut self, aggregate: FileAggregate) {
        let year = aggregate.year;
        for (group, count) in aggregate.groups {
            let key = CanonicalKey {
                company: group.company,
                title: group.title,
            };
            let tally = self
                .keys
                .entry(key)
                .or_default()
                .entry(group.soc_code)
                .or_insert_with(|| CodeTally {
                    title: group.soc_title,
                    count: 0,
                    years: BTreeSet::new(),
                });
            tally.count += count;
            tally.years.insert(year);
        }
    }

    /// Keys in sorted order so that everything downstream is reproducible.
    pub(crate) fn into_sorted_entries(self) -> Vec<(CanonicalKey, CodeTallies)> {
        let mut entries: Vec<(CanonicalKey, CodeTallies)> = self.keys.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// Reads every row of `source` through `plan` and counts certified filings.
/// Either the whole file is read or an error is returned.
pub(crate) fn aggregate_file(
    source: &mut dyn TabularSource,
    plan: &ColumnPlan,
    year: u32,
) -> Result<FileAggregate> {
    let mut aggregate = FileAggregate {
        year,
        ..FileAggregate::default()
    };
    let columns = plan.indices();

    source.visit_rows(&columns, &mut |row: &[Option<FieldValue>]| {
        aggregate.rows_read += 1;
        if let Some(group) = local_group_for(row) {
            aggregate.certified_rows += 1;
            *aggregate.groups.entry(group).or_insert(0) += 1;
        }
        ControlFlow::Continue(())
    })?;

    Ok(aggregate)
}

fn local_group_for(row: &[Option<FieldValue>]) -> Option<LocalGroupKey> {
    let cell = |field: CanonicalField| row.get(field.position()).and_then(Option::as_ref);

    if !is_certified(cell(CanonicalField::Status)) {
        return None;
    }

    let company = cell(CanonicalField::Company)?;
    let title = cell(CanonicalField::Title)?;
    let soc_code = cell(CanonicalField::SocCode)?;
    let soc_title = cell(CanonicalField::SocTitle)?;

    Some(LocalGroupKey {
        company: normalize_text(Some(company)),
        title: normalize_text(Some(title)),
        soc_code: normalize_code(soc_code),
        soc_title: soc_title.to_source_string(),
    })
}

fn is_certified(status: Option<&FieldValue>) -> bool {
    status
        .map(FieldValue::to_source_string)
        .is_some_and(|value| value.to_uppercase().trim() == CERTIFIED_STATUS)
}
