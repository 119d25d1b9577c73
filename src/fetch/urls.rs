// src/fetch/urls.rs

use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

/// Published campaign sheet, exported as CSV.
pub const DEFAULT_SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRvwDVAwZcxpGpU9SwIfmJS19N1z_XMx8Txw0PIKFRYbbX9Vaffdm6GKyEhXwpSHUPNObHVaScBKilf/pub?output=csv";

/// Headers sent with every request so intermediaries serve a fresh copy.
pub const NO_CACHE_HEADERS: &[(&str, &str)] = &[
    ("cache-control", "no-cache, no-store, must-revalidate"),
    ("pragma", "no-cache"),
    ("expires", "0"),
];

/// Append `_t` (millis) and `_r` (random) to `base`, keeping its existing query.
pub fn cache_busted(base: &Url, now: DateTime<Utc>) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("_t", &now.timestamp_millis().to_string())
        .append_pair("_r", &Uuid::new_v4().simple().to_string());
    url
}
