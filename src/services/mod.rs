// VERITAS Core Services

pub mod config;
pub mod mock_provider;
pub mod providers;
pub mod scan;
pub mod text_signals;

pub use config::EngineConfig;
pub use providers::{
    GeminiProvider, OpenAiProvider, OutputSchema, ProviderChain, ProviderError, ReasoningProvider,
};
pub use scan::{ScanError, ScanPipeline, ScanStore};
