//! Row-oriented access to disclosure spreadsheets.
//!
//! The pipeline only needs two things from a file: its header names, and a
//! pass over its rows restricted to a handful of columns. Rows are handed to
//! the visitor one at a time and never retained here.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, open_workbook_auto};

/// A single non-empty cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Bool(bool),
}

impl FieldValue {
    /// String form used when a cell is coerced to text (status, SOC code and
    /// SOC title columns). Integer cells print bare; integral floats keep a
    /// trailing `.0`.
    pub(crate) fn to_source_string(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Number(value) if value.is_finite() && value.fract() == 0.0 => {
                format!("{value:.1}")
            }
            Self::Number(value) => value.to_string(),
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
        }
    }
}

pub(crate) type RowVisitor<'a> = dyn FnMut(&[Option<FieldValue>]) -> ControlFlow<()> + 'a;

pub(crate) trait TabularSource {
    fn headers(&mut self) -> Result<Vec<String>>;

    /// Calls `visitor` once per data row with the cells at `columns`, in that
    /// order. Missing and empty cells are `None`.
    fn visit_rows(&mut self, columns: &[usize], visitor: &mut RowVisitor<'_>) -> Result<()>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    pub(crate) fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|ext| ext.to_str())?;
        if ext.eq_ignore_ascii_case("csv") {
            return Some(Self::Csv);
        }

        ["xlsx", "xlsm", "xls", "ods"]
            .iter()
            .any(|candidate| ext.eq_ignore_ascii_case(candidate))
            .then_some(Self::Workbook)
    }
}

pub(crate) fn open_source(path: &Path) -> Result<Box<dyn TabularSource>> {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Csv) => Ok(Box::new(CsvSource::new(path))),
        Some(SourceFormat::Workbook) => Ok(Box::new(WorkbookSource::new(path))),
        None => anyhow::bail!("unsupported source file type: {}", path.display()),
    }
}

pub(crate) struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn reader(&self) -> Result<csv::Reader<std::fs::File>> {
        csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("failed to open csv: {}", self.path.display()))
    }
}

impl TabularSource for CsvSource {
    fn headers(&mut self) -> Result<Vec<String>> {
        let mut reader = self.reader()?;
        let headers = reader
            .byte_headers()
            .with_context(|| format!("failed to read csv header: {}", self.path.display()))?;

        Ok(headers
            .iter()
            .map(|value| String::from_utf8_lossy(value).into_owned())
            .collect())
    }

    fn visit_rows(&mut self, columns: &[usize], visitor: &mut RowVisitor<'_>) -> Result<()> {
        let mut reader = self.reader()?;
        let mut projected = Vec::with_capacity(columns.len());

        for (index, record) in reader.byte_records().enumerate() {
            let record = record.with_context(|| {
                format!(
                    "failed to read csv record {} in {}",
                    index + 1,
                    self.path.display()
                )
            })?;

            projected.clear();
            projected.extend(columns.iter().map(|&column| {
                record
                    .get(column)
                    .filter(|value| !value.is_empty())
                    .map(|value| FieldValue::Text(String::from_utf8_lossy(value).into_owned()))
            }));

            if visitor(&projected).is_break() {
                break;
            }
        }

        Ok(())
    }
}

/// First worksheet of an Excel or OpenDocument workbook. The sheet is loaded
/// on first use and dropped with the source.
pub(crate) struct WorkbookSource {
    path: PathBuf,
    range: Option<Range<Data>>,
}

impl WorkbookSource {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            range: None,
        }
    }

    fn range(&mut self) -> Result<&Range<Data>> {
        if self.range.is_none() {
            let mut workbook = open_workbook_auto(&self.path)
                .with_context(|| format!("failed to open workbook: {}", self.path.display()))?;
            let range = workbook
                .worksheet_range_at(0)
                .with_context(|| format!("workbook has no worksheets: {}", self.path.display()))?
                .with_context(|| format!("failed to read worksheet: {}", self.path.display()))?;
            self.range = Some(range);
        }

        self.range
            .as_ref()
            .with_context(|| format!("worksheet not loaded: {}", self.path.display()))
    }
}

impl TabularSource for WorkbookSource {
    fn headers(&mut self) -> Result<Vec<String>> {
        let range = self.range()?;
        Ok(range
            .rows()
            .next()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .unwrap_or_default())
    }

    fn visit_rows(&mut self, columns: &[usize], visitor: &mut RowVisitor<'_>) -> Result<()> {
        let range = self.range()?;
        let mut projected = Vec::with_capacity(columns.len());

        for row in range.rows().skip(1) {
            projected.clear();
            projected.extend(
                columns
                    .iter()
                    .map(|&column| row.get(column).and_then(field_from_cell)),
            );

            if visitor(&projected).is_break() {
                break;
            }
        }

        Ok(())
    }
}

fn field_from_cell(cell: &Data) -> Option<FieldValue> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(text) if text.is_empty() => None,
        Data::String(text) => Some(FieldValue::Text(text.clone())),
        Data::Float(value) => Some(FieldValue::Number(*value)),
        Data::Int(value) => Some(FieldValue::Integer(*value)),
        Data::Bool(value) => Some(FieldValue::Bool(*value)),
        other => Some(FieldValue::Text(other.to_string())),
    }
}

/// In-memory table used by tests in place of a file on disk.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryTable {
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Vec<Option<FieldValue>>>,
}

#[cfg(test)]
impl MemoryTable {
    pub(crate) fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|value| value.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn with_row(mut self, cells: &[&str]) -> Self {
        self.rows.push(
            cells
                .iter()
                .map(|cell| (!cell.is_empty()).then(|| FieldValue::Text(cell.to_string())))
                .collect(),
        );
        self
    }
}

#[cfg(test)]
impl TabularSource for MemoryTable {
    fn headers(&mut self) -> Result<Vec<String>> {
        Ok(self.headers.clone())
    }

    fn visit_rows(&mut self, columns: &[usize], visitor: &mut RowVisitor<'_>) -> Result<()> {
        for row in &self.rows {
            let projected: Vec<Option<FieldValue>> = columns
                .iter()
                .map(|&column| row.get(column).cloned().flatten())
                .collect();
            if visitor(&projected).is_break() {
                break;
            }
        }
        Ok(())
    }
}
