// src/process/columns.rs

use serde::Deserialize;

/// Header keywords that mark the amount column, in priority order.
pub const AMOUNT_KEYWORDS: &[&str] = &["amount", "payment", "donation", "sum", "total"];
/// Header keywords that mark the donor-name column.
pub const NAME_KEYWORDS: &[&str] = &["name", "donor", "person", "contributor"];

/// Result of looking a semantic column up in the header row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnIndex {
    Resolved(usize),
    Unresolved,
}

impl ColumnIndex {
    pub fn get(self) -> Option<usize> {
        match self {
            ColumnIndex::Resolved(i) => Some(i),
            ColumnIndex::Unresolved => None,
        }
    }
}

/// Where the amount and name live in every data row of one fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderMap {
    pub amount: ColumnIndex,
    pub name: ColumnIndex,
}

/// What to do when no header matches the amount keywords.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ColumnFallback {
    /// Treat the fetch as a schema failure.
    #[default]
    FailFast,
    /// Assume fixed positions for any column the keywords missed.
    Positional { amount_index: usize, name_index: usize },
}

/// First header (left to right) containing any of `keywords`, after
/// lower-casing and trimming. Column order wins over keyword order.
pub fn find_column(headers: &[String], keywords: &[&str]) -> ColumnIndex {
    headers
        .iter()
        .position(|h| {
            let h = h.trim().to_lowercase();
            keywords.iter().any(|k| h.contains(k))
        })
        .map_or(ColumnIndex::Unresolved, ColumnIndex::Resolved)
}

/// Resolve the amount and name columns from a header row.
pub fn resolve(headers: &[String]) -> HeaderMap {
    HeaderMap {
        amount: find_column(headers, AMOUNT_KEYWORDS),
        name: find_column(headers, NAME_KEYWORDS),
    }
}

impl HeaderMap {
    /// Apply a fallback policy to whatever the keywords left unresolved.
    pub fn with_fallback(self, fallback: ColumnFallback) -> HeaderMap {
        match fallback {
            ColumnFallback::FailFast => self,
            ColumnFallback::Positional {
                amount_index,
                name_index,
            } => HeaderMap {
                amount: match self.amount {
                    ColumnIndex::Unresolved => ColumnIndex::Resolved(amount_index),
                    resolved => resolved,
                },
                name: match self.name {
                    ColumnIndex::Unresolved => ColumnIndex::Resolved(name_index),
                    resolved => resolved,
                },
            },
        }
    }

    /// Minimum number of fields a row needs before either column can be read.
    pub fn required_width(&self) -> usize {
        self.amount
            .get()
            .into_iter()
            .chain(self.name.get())
            .max()
            .map_or(0, |i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_typical_sheet_headers() {
        let map = resolve(&headers(&["Timestamp", "Donation Amount", "Donor Name"]));
        assert_eq!(map.amount, ColumnIndex::Resolved(1));
        assert_eq!(map.name, ColumnIndex::Resolved(2));
    }

    #[test]
    fn unknown_headers_stay_unresolved() {
        let map = resolve(&headers(&["x", "y"]));
        assert_eq!(map.amount, ColumnIndex::Unresolved);
        assert_eq!(map.name, ColumnIndex::Unresolved);
    }

    #[test]
    fn column_order_beats_keyword_order() {
        // "total" is the last keyword but sits in an earlier column than "amount"
        let map = resolve(&headers(&["Total", "Amount"]));
        assert_eq!(map.amount, ColumnIndex::Resolved(0));
    }

    #[test]
    fn matching_is_case_and_padding_insensitive() {
        let map = resolve(&headers(&["  PAYMENT ", " Contributor\r"]));
        assert_eq!(map.amount, ColumnIndex::Resolved(0));
        assert_eq!(map.name, ColumnIndex::Resolved(1));
    }

    #[test]
    fn positional_fallback_fills_only_gaps() {
        let map = resolve(&headers(&["when", "Amount", "who"])).with_fallback(
            ColumnFallback::Positional {
                amount_index: 0,
                name_index: 2,
            },
        );
        assert_eq!(map.amount, ColumnIndex::Resolved(1));
        assert_eq!(map.name, ColumnIndex::Resolved(2));

        let untouched = resolve(&headers(&["x"])).with_fallback(ColumnFallback::FailFast);
        assert_eq!(untouched.amount, ColumnIndex::Unresolved);
    }

    #[test]
    fn required_width_uses_highest_index() {
        let map = HeaderMap {
            amount: ColumnIndex::Resolved(1),
            name: ColumnIndex::Resolved(4),
        };
        assert_eq!(map.required_width(), 5);

        let amount_only = HeaderMap {
            amount: ColumnIndex::Resolved(2),
            name: ColumnIndex::Unresolved,
        };
        assert_eq!(amount_only.required_width(), 3);
    }
}
