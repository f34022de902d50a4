// =============================================================================
// Fractal Kernel — Batch Entry Point
// =============================================================================
//
// Loads the kernel config, scores every instrument of a batch file and prints
// the decision envelopes as JSON on stdout. Logs go to stderr.
//
//   fractal-kernel [BATCH_FILE]
//
// Environment:
//   FRACTAL_KERNEL_CONFIG  config path (default kernel_config.json)
//   FRACTAL_BATCH_FILE     batch path when no argument is given (default batch.json)
//   RUST_LOG               log filter (default info)
// =============================================================================

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fractal_kernel::batch::{score_batch, BatchOutcome, BatchRequest};
use fractal_kernel::{DecisionKernel, KernelConfig};

const DEFAULT_CONFIG_PATH: &str = "kernel_config.json";
const DEFAULT_BATCH_PATH: &str = "batch.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Fractal decision kernel starting");

    // ── 2. Config ────────────────────────────────────────────────────────
    let config_path =
        std::env::var("FRACTAL_KERNEL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = if Path::new(&config_path).exists() {
        KernelConfig::load(&config_path)?
    } else {
        warn!(path = %config_path, "Config file not found, using defaults");
        KernelConfig::default()
    };
    let kernel = Arc::new(DecisionKernel::new(config)?);

    // ── 3. Batch ─────────────────────────────────────────────────────────
    let batch_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FRACTAL_BATCH_FILE").ok())
        .unwrap_or_else(|| DEFAULT_BATCH_PATH.into());
    let batch = BatchRequest::load(&batch_path)?;

    let outcomes = score_batch(kernel, batch.instruments).await;
    for outcome in &outcomes {
        if let BatchOutcome::Scored(env) = outcome {
            info!(decision = %env.summary(), "scored");
        }
    }

    let json = serde_json::to_string_pretty(&outcomes).context("Failed to serialise outcomes")?;
    println!("{json}");
    Ok(())
}
