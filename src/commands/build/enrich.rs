use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Detailed O*NET titles for a broad SOC code. Unknown codes yield nothing.
pub(crate) trait OccupationLookup {
    fn lookup(&self, code: &str) -> &[String];
}

const BUILTIN_ONET_TITLES: &[(&str, &[&str])] = &[
    // Computer and mathematical
    ("15-1252", &["15-1252.00: Software Developers"]),
    (
        "15-1253",
        &["15-1253.00: Software Quality Assurance Analysts and Testers"],
    ),
    (
        "15-1299",
        &[
            "15-1299.08: Computer Systems Engineers/Architects",
            "15-1299.09: IT Project Managers",
        ],
    ),
    ("15-1211", &["15-1211.00: Computer Systems Analysts"]),
    ("15-1212", &["15-1212.00: Information Security Analysts"]),
    (
        "15-1231",
        &["15-1231.00: Computer Network Support Specialists"],
    ),
    ("15-1241", &["15-1241.00: Computer Network Architects"]),
    ("15-1242", &["15-1242.00: Database Administrators"]),
    ("15-1243", &["15-1243.00: Database Architects"]),
    (
        "15-2051",
        &[
            "15-2051.01: Business Intelligence Analysts",
            "15-2051.02: Clinical Data Managers",
            "15-2051.00: Data Scientists",
        ],
    ),
    ("15-2031", &["15-2031.00: Operations Research Analysts"]),
    ("15-2041", &["15-2041.00: Statisticians"]),
    ("15-2011", &["15-2011.00: Actuaries"]),
    // Engineering
    ("17-2071", &["17-2071.00: Electrical Engineers"]),
    (
        "17-2072",
        &["17-2072.00: Electronics Engineers, Except Computer"],
    ),
    ("17-2141", &["17-2141.00: Mechanical Engineers"]),
    ("17-2061", &["17-2061.00: Computer Hardware Engineers"]),
    ("17-2051", &["17-2051.00: Civil Engineers"]),
    ("17-2112", &["17-2112.00: Industrial Engineers"]),
    // Business and finance
    ("13-1111", &["13-1111.00: Management Analysts"]),
    ("13-2011", &["13-2011.00: Accountants and Auditors"]),
    ("13-2051", &["13-2051.00: Financial Analysts"]),
    (
        "13-1161",
        &["13-1161.00: Market Research Analysts and Marketing Specialists"],
    ),
    (
        "13-1081",
        &[
            "13-1081.01: Logistics Engineers",
            "13-1081.02: Logistics Analysts",
        ],
    ),
    (
        "11-3021",
        &["11-3021.00: Computer and Information Systems Managers"],
    ),
    ("11-2021", &["11-2021.00: Marketing Managers"]),
    // Science
    ("19-1029", &["19-1029.01: Bioinformatics Scientists"]),
    (
        "19-1042",
        &["19-1042.00: Medical Scientists, Except Epidemiologists"],
    ),
];

#[derive(Debug, Clone, Default)]
pub(crate) struct OnetTable {
    titles: HashMap<String, Vec<String>>,
}

impl OnetTable {
    pub(crate) fn builtin() -> Self {
        let titles = BUILTIN_ONET_TITLES
            .iter()
            .map(|(code, titles)| {
                (
                    code.to_string(),
                    titles.iter().map(|title| title.to_string()).collect(),
                )
            })
            .collect();
        Self { titles }
    }

    /// Loads a JSON object of the form `{"15-1252": ["15-1252.00: ..."]}`.
    pub(crate) fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let titles: HashMap<String, Vec<String>> = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Self { titles })
    }

    pub(crate) fn len(&self) -> usize {
        self.titles.len()
    }
}

impl OccupationLookup for OnetTable {
    fn lookup(&self, code: &str) -> &[String] {
        self.titles.get(code).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_resolves_known_codes_in_listed_order() {
        let table = OnetTable::builtin();
        assert_eq!(
            table.lookup("15-1252").to_vec(),
            vec!["15-1252.00: Software Developers".to_string()]
        );
        assert_eq!(table.lookup("15-2051").len(), 3);
        assert_eq!(
            table.lookup("15-2051")[2],
            "15-2051.00: Data Scientists".to_string()
        );
    }

    #[test]
    fn lookup_miss_is_empty() {
        let table = OnetTable::builtin();
        assert!(table.lookup("29-1141").is_empty());
        assert!(table.lookup("15-1252.00").is_empty());
    }

    #[test]
    fn from_json_file_replaces_builtin_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("onet.json");
        fs::write(&path, r#"{"29-1141": ["29-1141.00: Registered Nurses"]}"#).expect("write");

        let table = OnetTable::from_json_file(&path).expect("load table");
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("29-1141").len(), 1);
        assert!(table.lookup("15-1252").is_empty());
    }

    #[test]
    fn from_json_file_reports_malformed_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("onet.json");
        fs::write(&path, "[1, 2]").expect("write");

        let err = OnetTable::from_json_file(&path).expect_err("array is not a table");
        assert!(format!("{err:#}").contains("failed to parse"));
    }
}
