// src/process/mod.rs
//! CSV ingestion: tokenize, resolve columns, aggregate.

pub mod aggregate;
pub mod columns;
pub mod tokenizer;
pub mod utils;

use tracing::{debug, warn};

use crate::error::PipelineError;
use aggregate::{aggregate, Aggregate};
use columns::{ColumnFallback, ColumnIndex};

/// Knobs for a single pass over a CSV body.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessOptions {
    pub fallback: ColumnFallback,
    pub positive_only: bool,
}

/// Turn a raw CSV body into a tentative aggregate.
///
/// The first non-blank row is the header; columns are resolved once from it
/// and applied to every following row.
#[tracing::instrument(level = "debug", skip(text), fields(bytes = text.len()))]
pub fn process_csv(text: &str, opts: &ProcessOptions) -> Result<Aggregate, PipelineError> {
    if text.trim().is_empty() {
        return Err(PipelineError::EmptyPayload);
    }

    let mut rows = tokenizer::rows(text);
    let headers = rows.next().ok_or(PipelineError::EmptyPayload)?;

    let map = columns::resolve(&headers).with_fallback(opts.fallback);
    if map.amount == ColumnIndex::Unresolved {
        return Err(PipelineError::Schema { headers });
    }
    if map.name == ColumnIndex::Unresolved {
        warn!(?headers, "no donor name column; names skipped for this fetch");
    }
    debug!(amount = ?map.amount, name = ?map.name, "columns resolved");

    let agg = aggregate(rows, &map, opts.positive_only);
    debug!(
        total = agg.total_amount,
        donors = agg.donor_count,
        names = agg.donor_names.len(),
        short_rows = agg.stats.short_rows,
        unparsed = agg.stats.unparsed_amounts,
        "aggregated"
    );
    Ok(agg)
}
