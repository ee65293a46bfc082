//! Judge backend implementations

pub mod gemini;
pub mod openai;
pub mod traits;

pub use gemini::GeminiClient;
pub use openai::OpenAIClient;
pub use traits::{
    CompletionRequest, CompletionResponse, JudgeBackend, JudgeError, JudgeResult, Message,
};

use std::sync::Arc;

use crate::config::{Config, JudgeConfig, JudgeProtocol};

/// Build one judge client from its config entry
pub fn build_judge(jc: &JudgeConfig) -> JudgeResult<Arc<dyn JudgeBackend + Send + Sync>> {
    match jc.protocol {
        JudgeProtocol::OpenAI => {
            let mut client = OpenAIClient::from_env(&jc.name, &jc.api_key_env)?
                .with_model(&jc.model)
                .with_rate_limit(jc.rpm);
            if let Some(url) = &jc.base_url {
                client = client.with_base_url(url);
            }
            Ok(Arc::new(client))
        }
        JudgeProtocol::Gemini => {
            let mut client = GeminiClient::from_env(&jc.name, &jc.api_key_env)?
                .with_model(&jc.model)
                .with_rate_limit(jc.rpm);
            if let Some(url) = &jc.base_url {
                client = client.with_base_url(url);
            }
            Ok(Arc::new(client))
        }
    }
}

/// Build the enabled judge roster. A judge whose API key is missing is
/// skipped with a warning rather than failing the run.
pub fn build_judges(config: &Config) -> Vec<Arc<dyn JudgeBackend + Send + Sync>> {
    let mut judges = Vec::new();

    for jc in config.enabled_judges() {
        match build_judge(jc) {
            Ok(judge) => judges.push(judge),
            Err(e) => {
                tracing::warn!("Skipping judge {}: {}", jc.name, e);
            }
        }
    }

    judges
}
