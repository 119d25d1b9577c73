// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf, time::Duration};
use url::Url;

use crate::fetch::{backoff::BackoffPolicy, orchestrator::OrchestratorSettings, urls};
use crate::process::{columns::ColumnFallback, ProcessOptions};
use crate::reconcile::ReconciliationPolicy;

pub const CONFIG_PATH_VAR: &str = "THERMOMETER_CONFIG";

/// Runtime configuration. Every field has a default, so an empty file (or
/// no file at all) is valid.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source_url: String,
    pub goal_amount: f64,
    pub refresh_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub max_consecutive_failures_before_backoff: u32,
    pub max_backoff_ms: u64,
    pub reconciliation_policy: ReconciliationPolicy,
    pub positive_amounts_only: bool,
    pub column_fallback: ColumnFallback,
    pub snapshot_cache_path: Option<PathBuf>,
    pub check_published: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: urls::DEFAULT_SOURCE_URL.to_string(),
            goal_amount: 1_000_000.0,
            refresh_interval_ms: 2000,
            request_timeout_ms: 3000,
            max_consecutive_failures_before_backoff: 3,
            max_backoff_ms: 30_000,
            reconciliation_policy: ReconciliationPolicy::Monotonic,
            positive_amounts_only: false,
            column_fallback: ColumnFallback::FailFast,
            snapshot_cache_path: None,
            check_published: true,
        }
    }
}

impl Config {
    /// Parse YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("parsing config YAML")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        Self::from_yaml(&text).with_context(|| format!("in config {:?}", path))
    }

    /// File named by `THERMOMETER_CONFIG` (if set), then env overrides, then validation.
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cfg.apply_overrides(|key| env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `THERMOMETER_*` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("THERMOMETER_SOURCE_URL") {
            self.source_url = url;
        }
        if let Some(goal) = lookup("THERMOMETER_GOAL_AMOUNT") {
            self.goal_amount = goal
                .parse()
                .with_context(|| format!("THERMOMETER_GOAL_AMOUNT={:?}", goal))?;
        }
        if let Some(ms) = lookup("THERMOMETER_REFRESH_INTERVAL_MS") {
            self.refresh_interval_ms = ms
                .parse()
                .with_context(|| format!("THERMOMETER_REFRESH_INTERVAL_MS={:?}", ms))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.source_url()?;
        if !(self.goal_amount.is_finite() && self.goal_amount > 0.0) {
            bail!("goal_amount must be a positive number, got {}", self.goal_amount);
        }
        if self.refresh_interval_ms == 0 {
            bail!("refresh_interval_ms must be greater than zero");
        }
        if self.request_timeout_ms == 0 {
            bail!("request_timeout_ms must be greater than zero");
        }
        if self.max_backoff_ms < self.refresh_interval_ms {
            bail!(
                "max_backoff_ms ({}) must not be below refresh_interval_ms ({})",
                self.max_backoff_ms,
                self.refresh_interval_ms
            );
        }
        Ok(())
    }

    pub fn source_url(&self) -> Result<Url> {
        Url::parse(&self.source_url)
            .with_context(|| format!("invalid source_url {:?}", self.source_url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            backoff: BackoffPolicy {
                base: Duration::from_millis(self.refresh_interval_ms),
                threshold: self.max_consecutive_failures_before_backoff,
                max: Duration::from_millis(self.max_backoff_ms),
            },
            request_timeout: self.request_timeout(),
            goal_amount: self.goal_amount,
            process: ProcessOptions {
                fallback: self.column_fallback,
                positive_only: self.positive_amounts_only,
            },
        }
    }
}
