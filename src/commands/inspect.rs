use std::ops::ControlFlow;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::InspectArgs;
use crate::commands::build::{FieldValue, extract_year, open_source, resolve_columns, year_pattern};

pub fn run(args: InspectArgs) -> Result<()> {
    let pattern = year_pattern()?;
    let filename = args
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut source = open_source(&args.path)?;
    let headers = source.headers()?;

    info!(
        path = %args.path.display(),
        year = extract_year(&filename, &pattern),
        columns = headers.len(),
        "inspecting source file"
    );
    info!(headers = ?headers, "column names");

    match resolve_columns(&headers) {
        Ok(plan) => {
            info!(projection = ?plan.headers(), "columns read by build");
            for (header, field) in plan.rename_map() {
                info!(field, header = %header, "resolved column");
            }
        }
        Err(mismatch) => warn!(reason = %mismatch, "file would be skipped by build"),
    }

    let all_columns: Vec<usize> = (0..headers.len()).collect();
    let mut shown = 0_usize;
    source.visit_rows(&all_columns, &mut |row: &[Option<FieldValue>]| {
        if shown >= args.rows {
            return ControlFlow::Break(());
        }
        shown += 1;
        info!(row = shown, values = %render_row(&headers, row), "sample row");
        ControlFlow::Continue(())
    })?;

    Ok(())
}

fn render_row(headers: &[String], row: &[Option<FieldValue>]) -> String {
    headers
        .iter()
        .zip(row)
        .map(|(header, value)| {
            let value = value
                .as_ref()
                .map(FieldValue::to_source_string)
                .unwrap_or_else(|| "<missing>".to_string());
            format!("{}={value}", header.trim())
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
