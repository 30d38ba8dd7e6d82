// Engine configuration read from the environment at startup.
// Provider API keys are deliberately NOT held here: they are read at
// call time so key rotation does not require a restart.

use std::env;
use std::net::SocketAddr;

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 80;
const DEFAULT_MAX_REQUEST_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub bind_addr: SocketAddr,
    pub gemini_model: String,
    pub openai_model: String,
    pub request_timeout_secs: u64,
    pub max_request_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.parse().expect("default bind address"),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = env::var("VERITAS_BIND")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.bind_addr);
        let gemini_model =
            env::var("VERITAS_GEMINI_MODEL").unwrap_or(defaults.gemini_model);
        let openai_model =
            env::var("VERITAS_OPENAI_MODEL").unwrap_or(defaults.openai_model);
        let request_timeout_secs = env::var("VERITAS_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.request_timeout_secs);
        let max_request_bytes = env::var("VERITAS_MAX_REQUEST_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_request_bytes);

        Self {
            bind_addr,
            gemini_model,
            openai_model,
            request_timeout_secs,
            max_request_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.bind_addr.port(), 8000);
        assert!(config.request_timeout_secs > 0);
        assert!(config.max_request_bytes > 0);
    }
}
