/// Environment variable naming the inference service base URL.
const ENV_API_BASE: &str = "TINYCHAT_API_BASE";

/// Where the bundled TinyLlama server listens when started locally.
const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Connection settings for the inference service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    /// Resolve the base URL from the environment, falling back to the
    /// local default. Empty or whitespace-only values count as unset.
    pub fn from_env() -> Self {
        Self::from_raw(std::env::var(ENV_API_BASE).ok())
    }

    fn from_raw(raw: Option<String>) -> Self {
        let base_url = raw
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_API_BASE)
            // Endpoint paths are appended verbatim, so strip any trailing slash.
            .trim_end_matches('/')
            .to_string();

        Self { base_url }
    }
}
