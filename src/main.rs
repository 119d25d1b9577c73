use anyhow::{Context, Result};
use donation_thermometer::{
    config::Config,
    fetch::{orchestrator::Orchestrator, HttpSource},
    history::SnapshotCache,
    reconcile::Gate,
    render::LogRenderer,
};
use std::env;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(log_level.parse().unwrap_or(Level::INFO.into()))
    });
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let cfg = Config::load().context("loading configuration")?;
    let url = cfg.source_url()?;
    info!(
        url = %url,
        goal = cfg.goal_amount,
        interval_ms = cfg.refresh_interval_ms,
        policy = ?cfg.reconciliation_policy,
        "configured"
    );

    let source = HttpSource::new(url, cfg.request_timeout()).context("building HTTP client")?;
    if cfg.check_published {
        source.check_published().await;
    }

    // ─── 3) replay cached snapshot for display only ──────────────────
    let mut renderer = LogRenderer::default();
    let cache = cfg.snapshot_cache_path.clone().map(SnapshotCache::new);
    if let Some(cache) = &cache {
        match cache.load() {
            Ok(Some(snapshot)) => renderer.render_cached(&snapshot.view(cfg.goal_amount)),
            Ok(None) => info!(path = %cache.path().display(), "no cached snapshot yet"),
            Err(e) => warn!(error = %e, "ignoring unreadable snapshot cache"),
        }
    }

    // ─── 4) start the fetch loop ─────────────────────────────────────
    let gate = Gate::init(cfg.reconciliation_policy);
    let mut orchestrator = Orchestrator::new(source, cfg.orchestrator_settings(), gate);
    if let Some(cache) = cache {
        orchestrator = orchestrator.with_cache(cache);
    }
    let handle = orchestrator.spawn();

    // ─── 5) render until Ctrl-C ──────────────────────────────────────
    let mut status = handle.status();
    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    error!("orchestrator exited unexpectedly");
                    break;
                }
                let current = status.borrow_and_update().clone();
                renderer.render(&current);
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    error!(error = %e, "failed to listen for ctrl-c");
                }
                info!("shutdown requested");
                break;
            }
        }
    }

    // ─── 6) stop ─────────────────────────────────────────────────────
    let gate = handle.shutdown().await.context("joining orchestrator")?;
    let last = gate.accepted();
    info!(
        total = last.total_amount,
        donors = last.donor_count,
        "all done"
    );
    Ok(())
}
