use crate::error::ConfigError;
use secrecy::SecretString;

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    pub github: GithubConfig,
}

#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct ProvidersConfig {
    pub gemini_api_key: Option<SecretString>,
    pub gemini_model: String,
    pub openai_compat_api_key: Option<SecretString>,
    pub openai_compat_base_url: Option<String>,
    pub openai_compat_model: Option<String>,
    pub default_timeout_secs: u64,
}

#[derive(Clone)]
pub struct GithubConfig {
    pub token: Option<SecretString>,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig {
                host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".into()))?,
            },
            providers: ProvidersConfig {
                gemini_api_key: non_empty_var("GEMINI_API_KEY").map(SecretString::from),
                gemini_model: std::env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
                openai_compat_api_key: non_empty_var("OPENAI_COMPAT_API_KEY")
                    .map(SecretString::from),
                openai_compat_base_url: non_empty_var("OPENAI_COMPAT_BASE_URL"),
                openai_compat_model: non_empty_var("OPENAI_COMPAT_MODEL"),
                default_timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()
                    .unwrap_or(120),
            },
            github: GithubConfig {
                token: non_empty_var("GITHUB_TOKEN").map(SecretString::from),
                api_url: std::env::var("GITHUB_API_URL")
                    .unwrap_or_else(|_| DEFAULT_GITHUB_API_URL.to_string()),
                timeout_secs: std::env::var("GITHUB_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
        })
    }
}

/// Empty strings count as unset so a blank `GEMINI_API_KEY=` keeps fallback mode.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            openai_compat_api_key: None,
            openai_compat_base_url: None,
            openai_compat_model: None,
            default_timeout_secs: 120,
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            timeout_secs: 30,
        }
    }
}
