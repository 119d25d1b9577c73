// src/process/aggregate.rs

use tracing::trace;

use super::columns::HeaderMap;
use super::tokenizer::RawRow;
use super::utils::{clean_name, coerce_amount};

/// Per-fetch aggregate before reconciliation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregate {
    pub total_amount: f64,
    pub donor_count: u64,
    pub donor_names: Vec<String>,
    pub stats: AggregateStats,
}

/// Row-level bookkeeping. Skipped rows still count as donors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Rows too short for the resolved columns.
    pub short_rows: u64,
    /// Rows whose amount cell held no number.
    pub unparsed_amounts: u64,
    /// Rows dropped by the positive-amount filter.
    pub filtered_amounts: u64,
}

/// Walk the data rows (header excluded) and sum, count and collect names.
pub fn aggregate<I>(rows: I, map: &HeaderMap, positive_only: bool) -> Aggregate
where
    I: IntoIterator<Item = RawRow>,
{
    let mut out = Aggregate::default();
    let width = map.required_width();

    for (idx, row) in rows.into_iter().enumerate() {
        out.donor_count += 1;

        if row.len() < width {
            trace!(row = idx + 1, fields = row.len(), width, "short row skipped");
            out.stats.short_rows += 1;
            continue;
        }

        if let Some(i) = map.amount.get() {
            match coerce_amount(&row[i]) {
                Some(amount) if positive_only && amount <= 0.0 => out.stats.filtered_amounts += 1,
                Some(amount) => out.total_amount += amount,
                None => out.stats.unparsed_amounts += 1,
            }
        }

        if let Some(name) = map.name.get().and_then(|i| clean_name(&row[i])) {
            out.donor_names.push(name);
        }
    }

    out
}
