//! QA Auditor batch entry point.
//!
//! Usage: `qa-auditor [transcripts.json] [config.toml]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use qa_auditor::storage::{load_transcripts, write_outputs, ConfigService};
use qa_auditor::QaAuditorFlow;
use qa_auditor_llm::create_provider;

const DEFAULT_TRANSCRIPTS: &str = "transcripts.json";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let transcripts_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TRANSCRIPTS));
    let config_path = args.next().map(PathBuf::from);

    info!("[Boot] QA Auditor v{} starting", env!("CARGO_PKG_VERSION"));

    let service =
        ConfigService::load(config_path.as_deref()).context("Failed to load configuration")?;
    let rulebook = service.rulebook().context("Failed to load rule book")?;
    let config = service.into_config();

    let provider = create_provider(&config.llm.clone().resolve_api_key())
        .context("Failed to create narrative provider")?;
    info!("[Boot] Narrative provider: {}", provider.name());

    let batch = load_transcripts(&transcripts_path).with_context(|| {
        format!(
            "Failed to load transcripts from {}",
            transcripts_path.display()
        )
    })?;

    let output_dir = config.run.output_dir.clone();
    let flow =
        QaAuditorFlow::new(config, rulebook, provider).context("Invalid audit configuration")?;

    let token = flow.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("[Boot] Interrupt received; cancelling run");
            token.cancel();
        }
    });

    let state = match flow.run_batch(batch).await {
        Ok(state) => state,
        Err(e) => {
            error!("[Fatal] Audit run aborted: {}", e);
            return Err(e.into());
        }
    };

    write_outputs(&state, &output_dir).context("Failed to write outputs")?;

    if state.cancelled {
        warn!(
            "[Boot] Run cancelled after stage '{}'; outputs are partial",
            state.stage
        );
        std::process::exit(130);
    }

    println!("{}", state.executive_summary);
    Ok(())
}
