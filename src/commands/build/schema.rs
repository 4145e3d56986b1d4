use std::fmt;

/// Columns the pipeline needs from every disclosure file.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) enum CanonicalField {
    Status,
    Company,
    Title,
    SocCode,
    SocTitle,
}

impl CanonicalField {
    pub(crate) const ALL: [Self; 5] = [
        Self::Status,
        Self::Company,
        Self::Title,
        Self::SocCode,
        Self::SocTitle,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Company => "company",
            Self::Title => "title",
            Self::SocCode => "soc_code",
            Self::SocTitle => "soc_title",
        }
    }

    /// Header spellings used across disclosure years, most preferred first.
    pub(crate) fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Status => &["CASE_STATUS", "STATUS"],
            Self::Company => &["EMPLOYER_NAME", "EMPLOYER_LEGAL_BUSINESS_NAME"],
            Self::Title => &["JOB_TITLE"],
            Self::SocCode => &["SOC_CODE"],
            Self::SocTitle => &["SOC_TITLE", "SOC_NAME"],
        }
    }

    /// Position of this field inside a projected row.
    pub(crate) fn position(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProjectedColumn {
    pub(crate) header: String,
    pub(crate) index: usize,
    pub(crate) field: CanonicalField,
}

/// Which source headers to read and what each one is renamed to. Columns are
/// kept in `CanonicalField::ALL` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnPlan {
    columns: Vec<ProjectedColumn>,
}

impl ColumnPlan {
    pub(crate) fn indices(&self) -> Vec<usize> {
        self.columns.iter().map(|column| column.index).collect()
    }

    pub(crate) fn headers(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|column| column.header.as_str())
            .collect()
    }

    pub(crate) fn rename_map(&self) -> Vec<(&str, &'static str)> {
        self.columns
            .iter()
            .map(|column| (column.header.as_str(), column.field.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SchemaMismatch {
    pub(crate) missing: Vec<CanonicalField>,
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.missing.iter().map(|field| field.as_str()).collect();
        write!(f, "missing required columns: {}", names.join(", "))
    }
}

impl std::error::Error for SchemaMismatch {}

/// Matches headers against each field's aliases, ignoring case and
/// surrounding whitespace. The first alias present wins, and for that alias
/// the first matching header. A file missing any field is unusable as a whole.
pub(crate) fn resolve_columns(headers: &[String]) -> Result<ColumnPlan, SchemaMismatch> {
    let cleaned: Vec<String> = headers
        .iter()
        .map(|header| header.trim().to_uppercase())
        .collect();

    let mut columns = Vec::with_capacity(CanonicalField::ALL.len());
    let mut missing = Vec::new();

    for field in CanonicalField::ALL {
        let found = field.aliases().iter().find_map(|alias| {
            let alias = alias.trim().to_uppercase();
            cleaned.iter().position(|header| *header == alias)
        });

        match found {
            Some(index) => columns.push(ProjectedColumn {
                header: headers[index].clone(),
                index,
                field,
            }),
            None => missing.push(field),
        }
    }

    if !missing.is_empty() {
        return Err(SchemaMismatch { missing });
    }

    Ok(ColumnPlan { columns })
}
