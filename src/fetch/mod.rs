// src/fetch/mod.rs
//! Getting CSV text off the network and scheduling attempts.

pub mod backoff;
pub mod orchestrator;
pub mod urls;

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::FetchError;

/// Anything that can hand back the current CSV body.
pub trait CsvSource: Send + Sync + 'static {
    fn fetch_csv(&self) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// reqwest-backed source that defeats intermediate caches on every request.
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: Client,
    url: Url,
    timeout: Duration,
}

fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for &(name, value) in urls::NO_CACHE_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

impl HttpSource {
    /// Build a client with the request timeout and no-cache headers baked in.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(no_cache_headers())
            .build()?;
        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `HEAD` the sheet once to check it is published. Never fails the caller.
    pub async fn check_published(&self) -> bool {
        match self.client.head(self.url.clone()).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(url = %self.url, "sheet is published and accessible");
                true
            }
            Ok(resp) => {
                warn!(
                    url = %self.url,
                    status = %resp.status(),
                    "sheet may not be published correctly"
                );
                false
            }
            Err(e) => {
                error!(url = %self.url, error = %e, "error checking sheet");
                false
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self), fields(url = %self.url))]
    async fn get_text(&self) -> Result<String, FetchError> {
        let url = urls::cache_busted(&self.url, Utc::now());
        debug!(%url, "fetching donation data");
        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Transport(e)
            }
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(resp.text().await?)
    }
}

impl CsvSource for HttpSource {
    fn fetch_csv(&self) -> impl Future<Output = Result<String, FetchError>> + Send {
        self.get_text()
    }
}
