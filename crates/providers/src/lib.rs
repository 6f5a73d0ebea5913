//! LLM provider implementations for Tierline.
//!
//! All providers implement the `tierline_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use std::sync::Arc;
use std::time::Duration;
use tierline_core::error::ProviderError;
use tierline_core::provider::Provider;

/// Build the configured completion provider.
pub fn build_from_config(
    config: &tierline_config::AppConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured("no API key configured".into()))?;

    let provider = OpenAiCompatProvider::new(
        config.llm.provider.clone(),
        config.llm.api_url.clone(),
        api_key,
        Duration::from_secs(config.llm.timeout_secs),
    )?;
    Ok(Arc::new(provider))
}
