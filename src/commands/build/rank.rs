use super::aggregate::CodeTallies;
use super::enrich::OccupationLookup;
use crate::model::RankedCandidate;

/// Minimum certified filings for a code to be listed when a key has
/// competing codes.
pub(crate) const MIN_CANDIDATE_COUNT: u64 = 3;
pub(crate) const MAX_CANDIDATES: usize = 3;

/// Turns one key's tallies into at most `MAX_CANDIDATES` enriched candidates,
/// most filed first. Ties keep first-encounter order. A key with a single code
/// keeps it regardless of count. An empty result means the key is dropped.
pub(crate) fn rank_candidates(
    tallies: &CodeTallies,
    lookup: &dyn OccupationLookup,
) -> Vec<RankedCandidate> {
    let mut candidates: Vec<RankedCandidate> = tallies
        .iter()
        .map(|(code, tally)| RankedCandidate {
            code: code.clone(),
            title: tally.title.clone(),
            count: tally.count,
            years: tally.years.iter().copied().collect(),
            onet_titles: lookup.lookup(code).to_vec(),
        })
        .collect();

    candidates.sort_by(|a, b| b.count.cmp(&a.count));
    filter_candidates(candidates)
}

fn filter_candidates(candidates: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
    let sole_candidate = candidates.len() == 1;
    candidates
        .into_iter()
        .filter(|candidate| sole_candidate || candidate.count >= MIN_CANDIDATE_COUNT)
        .take(MAX_CANDIDATES)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use super::*;
    use crate::commands::build::aggregate::CodeTally;

    struct FixedLookup(HashMap<String, Vec<String>>);

    impl OccupationLookup for FixedLookup {
        fn lookup(&self, code: &str) -> &[String] {
            self.0.get(code).map(Vec::as_slice).unwrap_or(&[])
        }
    }

    fn empty_lookup() -> FixedLookup {
        FixedLookup(HashMap::new())
    }

    fn tallies(entries: &[(&str, u64)]) -> CodeTallies {
        entries
            .iter()
            .map(|(code, count)| {
                (
                    code.to_string(),
                    CodeTally {
                        title: format!("title {code}"),
                        count: *count,
                        years: BTreeSet::from([2022]),
                    },
                )
            })
            .collect()
    }

    fn counts(candidates: &[RankedCandidate]) -> Vec<u64> {
        candidates.iter().map(|candidate| candidate.count).collect()
    }

    #[test]
    fn rank_drops_codes_below_threshold_when_competing() {
        let ranked = rank_candidates(
            &tallies(&[("a", 2), ("b", 5), ("c", 1), ("d", 3)]),
            &empty_lookup(),
        );
        assert_eq!(counts(&ranked), vec![5, 3]);
        assert_eq!(ranked[0].code, "b");
        assert_eq!(ranked[1].code, "d");
    }

    #[test]
    fn rank_keeps_sole_candidate_with_low_count() {
        let ranked = rank_candidates(&tallies(&[("a", 1)]), &empty_lookup());
        assert_eq!(counts(&ranked), vec![1]);
    }

    #[test]
    fn rank_returns_empty_when_no_competing_code_reaches_threshold() {
        let ranked = rank_candidates(&tallies(&[("a", 2), ("b", 1)]), &empty_lookup());
        assert!(ranked.is_empty());
    }

    #[test]
    fn rank_caps_output_at_three() {
        let ranked = rank_candidates(
            &tallies(&[("a", 4), ("b", 9), ("c", 3), ("d", 7), ("e", 5)]),
            &empty_lookup(),
        );
        assert_eq!(counts(&ranked), vec![9, 7, 5]);
    }

    #[test]
    fn rank_filters_before_truncating() {
        let ranked = rank_candidates(
            &tallies(&[("a", 2), ("b", 2), ("c", 3), ("d", 4)]),
            &empty_lookup(),
        );
        assert_eq!(counts(&ranked), vec![4, 3]);
    }

    #[test]
    fn rank_breaks_ties_by_encounter_order() {
        let ranked = rank_candidates(
            &tallies(&[("x", 3), ("y", 6), ("z", 3), ("w", 3)]),
            &empty_lookup(),
        );
        let codes: Vec<&str> = ranked.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["y", "x", "z"]);
    }

    #[test]
    fn rank_attaches_enrichment_and_sorted_years() {
        let mut data = tallies(&[("15-1252", 4)]);
        if let Some(tally) = data.get_mut("15-1252") {
            tally.years = BTreeSet::from([2023, 2021, 2022]);
        }
        let lookup = FixedLookup(HashMap::from([(
            "15-1252".to_string(),
            vec!["15-1252.00: Software Developers".to_string()],
        )]));

        let ranked = rank_candidates(&data, &lookup);
        assert_eq!(ranked[0].years, vec![2021, 2022, 2023]);
        assert_eq!(ranked[0].onet_titles, vec!["15-1252.00: Software Developers"]);
        assert_eq!(ranked[0].title, "title 15-1252");
    }
}
