//! Clinical narrative generation.
//!
//! Builds prompts from a summary table and sends them to the configured
//! language model. Only called on explicit request.

pub mod client;
pub mod prompt;

pub use client::NarrativeError;
pub use prompt::NarrativePrompt;

use crate::config::Config;
use client::{generate_with_retry, GeminiClient, RetryPolicy};

/// Request an interpretation for a filled prompt using the configured model.
///
/// Returns [`NarrativeError::NotConfigured`] without touching the network
/// when no credential is available.
pub async fn interpret(config: &Config, prompt: &NarrativePrompt) -> Result<String, NarrativeError> {
    let client = GeminiClient::new(&config.model, config.api_key())?;
    generate_with_retry(&client, prompt, RetryPolicy::from_config(&config.model)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_without_key() {
        let config = Config::default();
        let prompt = NarrativePrompt::for_condition("NSEO").with_summary("table");

        let result = tokio_test::block_on(interpret(&config, &prompt));
        assert_eq!(result, Err(NarrativeError::NotConfigured));
    }
}
