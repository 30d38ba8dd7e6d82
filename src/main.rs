use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use veritas::api::{self, ApiState};
use veritas::services::config::EngineConfig;
use veritas::services::providers::{
    GeminiProvider, OpenAiProvider, ProviderChain, ReasoningProvider,
};
use veritas::services::scan::ScanPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    veritas::init_logging();

    let config = EngineConfig::from_env();
    info!(
        bind = %config.bind_addr,
        gemini_model = %config.gemini_model,
        openai_model = %config.openai_model,
        "engine configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    // Primary first, fallback second; attempted in order per scan.
    let providers: Vec<Arc<dyn ReasoningProvider>> = vec![
        Arc::new(GeminiProvider::new(client.clone(), config.gemini_model.clone())),
        Arc::new(OpenAiProvider::new(client, config.openai_model.clone())),
    ];
    let chain = ProviderChain::new(providers);

    let pipeline = Arc::new(ScanPipeline::new(chain));
    let state = ApiState::new(pipeline, config.max_request_bytes);

    api::serve(config.bind_addr, state).await?;
    info!("=== VERITAS Engine Exited ===");
    Ok(())
}
