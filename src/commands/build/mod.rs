//! Employer/job-title to SOC code map: aggregation across yearly disclosure
//! files, candidate ranking, O*NET enrichment and shard output.

mod aggregate;
mod enrich;
mod normalize;
mod rank;
mod run;
mod schema;
mod shard;
mod source;

pub use run::run;

pub(crate) use normalize::{extract_year, year_pattern};
pub(crate) use schema::resolve_columns;
pub(crate) use source::{FieldValue, SourceFormat, open_source};
