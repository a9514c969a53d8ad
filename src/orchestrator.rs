use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::ai::normalizer::normalize_with_strategy;
use crate::ai::prompt::{build_analysis_prompt, ANALYSIS_SYSTEM_PROMPT};
use crate::ai::{fallback, AnalysisContext};
use crate::config::ProvidersConfig;
use crate::error::LlmError;
use crate::llm::gemini::GeminiClient;
use crate::llm::openai_compat::OpenAiCompatClient;
use crate::llm::{Message, ModelClient};
use crate::types::Suggestions;

/// Normalized suggestions plus the text they came from.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub suggestions: Suggestions,
    pub raw_response: String,
}

#[derive(Clone)]
pub struct IssueAnalyzer {
    client: Option<Arc<dyn ModelClient>>,
}

impl IssueAnalyzer {
    pub fn new(client: Option<Arc<dyn ModelClient>>) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ProvidersConfig) -> Result<Self, LlmError> {
        Ok(Self::new(create_model_client(config)?))
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Analyze one issue. Without a model client this returns the static
    /// fallback; model call failures are returned as-is and not retried.
    pub async fn analyze(&self, context: &AnalysisContext) -> Result<Analysis, LlmError> {
        let request_id = uuid::Uuid::new_v4();

        let Some(client) = &self.client else {
            info!(
                %request_id,
                repository = %context.repository,
                "Model API key not configured, returning fallback suggestions"
            );
            return Ok(Analysis {
                suggestions: fallback::not_configured(&context.issue),
                raw_response: fallback::NOT_CONFIGURED_RAW_RESPONSE.to_string(),
            });
        };

        let start = Instant::now();
        let prompt = build_analysis_prompt(context);
        let messages = vec![Message::user(prompt)];

        let raw = client
            .chat(&messages, Some(ANALYSIS_SYSTEM_PROMPT))
            .await
            .map_err(|e| {
                error!(%request_id, provider = client.provider(), "Model call failed: {}", e);
                e
            })?;

        if raw.trim().is_empty() {
            error!(%request_id, provider = client.provider(), "Model returned no text");
            return Err(LlmError::EmptyResponse {
                provider: client.provider().to_string(),
            });
        }

        let (suggestions, strategy) = normalize_with_strategy(&raw);

        info!(
            %request_id,
            repository = %context.repository,
            provider = client.provider(),
            strategy = strategy.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Issue analysis completed"
        );

        Ok(Analysis {
            suggestions,
            raw_response: raw,
        })
    }
}

/// Create a model client from the configured credentials.
fn create_model_client(config: &ProvidersConfig) -> Result<Option<Arc<dyn ModelClient>>, LlmError> {
    // Priority: Gemini > OpenAI-compatible
    if let Some(ref api_key) = config.gemini_api_key {
        let client = GeminiClient::new(
            api_key.clone(),
            config.gemini_model.clone(),
            config.default_timeout_secs,
        )?;
        return Ok(Some(Arc::new(client)));
    }

    if let Some(ref api_key) = config.openai_compat_api_key {
        let client = OpenAiCompatClient::new(
            api_key.clone(),
            config.openai_compat_base_url.clone(),
            config.openai_compat_model.clone(),
            config.default_timeout_secs,
        )?;
        return Ok(Some(Arc::new(client)));
    }

    Ok(None)
}
