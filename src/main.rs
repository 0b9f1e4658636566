#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! `geyser-status`: print the state of a deployed geyser and check the
//! reward split of every watched account.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use geyser_harness::config::{config_path_from_env, load_config};
use geyser_harness::core::economics::status::collect_status;
use geyser_harness::harness::GeyserTestContext;
use geyser_harness::monitoring::logging::init_tracing;
use geyser_harness::monitoring::metrics::HarnessMetrics;
use tracing::{error, info, warn};

async fn run() -> anyhow::Result<bool> {
    let path = config_path_from_env();
    let cfg = load_config(&path).with_context(|| format!("loading config {path}"))?;
    init_tracing(cfg.logging.json, &cfg.logging.level);
    info!(
        version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
        git_sha = option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
        rustc = option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown"),
        built = option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown"),
        config = %path,
        "geyser-status starting"
    );

    let resolved = cfg.validate()?;
    let metrics = Arc::new(HarnessMetrics::new().context("metrics init")?);
    let ctx = GeyserTestContext::connect_with_metrics(&cfg, Some(metrics.clone()))
        .await
        .with_context(|| format!("connecting to {}", cfg.rpc.url))?;

    let status = collect_status(ctx.geyser.as_ref(), &resolved.watch)
        .await
        .context("collecting geyser status")?;
    println!("{status}");

    let mut ok = true;
    let shares = status.check_locked_shares(cfg.share_delta());
    metrics.observe_check(&shares);
    if let Err(e) = shares {
        error!(error = %e, "locked share accounting diverged");
        ok = false;
    }

    match cfg.verification.founder_percentage {
        Some(pct) => {
            let oracle = ctx
                .oracle()
                .with_currency_delta(cfg.currency_delta())
                .with_metrics(metrics.clone());
            for &account in &resolved.watch {
                match oracle.verify_rewards(account, pct).await {
                    Ok(snap) => info!(
                        %account,
                        total = %snap.total_user_rewards,
                        user = %snap.user_rewards,
                        founder = %snap.founder_rewards,
                        "reward split verified"
                    ),
                    Err(e) => {
                        error!(%account, error = %e, "reward split check failed");
                        ok = false;
                    }
                }
            }
        }
        None => warn!("verification.founder_percentage unset; skipping reward checks"),
    }

    match metrics.render() {
        Ok(text) => info!(metrics = %text, "final counters"),
        Err(e) => warn!(?e, "metrics render failed"),
    }
    Ok(ok)
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("geyser-status: {e:#}");
            ExitCode::FAILURE
        }
    }
}
