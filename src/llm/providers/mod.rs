//! LLM provider implementations.
//!
//! `build(config, model, api_key)` is the factory, called once per persona at
//! startup. Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod openai_compatible;

use crate::config::{LlmConfig, ModelConfig};
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` for one persona's model.
///
/// `api_key` is sourced from `LLM_API_KEY` env (never TOML) and is `None`
/// for keyless local models.
pub fn build(
    config: &LlmConfig,
    model: &ModelConfig,
    api_key: Option<String>,
) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "openai" | "openai-compatible" | "ollama" => {
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                config.completions_url(),
                model.model.clone(),
                model.temperature,
                config.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

/// The four persona providers the server needs.
#[derive(Debug, Clone)]
pub struct PersonaProviders {
    pub chat: LlmProvider,
    pub coordinator: LlmProvider,
    pub scout: LlmProvider,
    pub trained: LlmProvider,
}

impl PersonaProviders {
    pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            chat: build(config, &config.chat, api_key.clone())?,
            coordinator: build(config, &config.coordinator, api_key.clone())?,
            scout: build(config, &config.scout, api_key.clone())?,
            trained: build(config, &config.trained, api_key)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(provider: &str) -> LlmConfig {
        let model = |m: &str, t: f32| ModelConfig { model: m.into(), temperature: t };
        LlmConfig {
            provider: provider.into(),
            api_base: "http://localhost:11434/v1".into(),
            timeout_seconds: 5,
            chat: model("qwen2.5:7b", 0.3),
            coordinator: model("qwen2.5:7b", 0.7),
            scout: model("llama3.2:3b", 0.3),
            trained: model("qwen2.5:7b", 0.8),
        }
    }

    #[test]
    fn builds_dummy() {
        let cfg = llm_config("dummy");
        assert!(matches!(build(&cfg, &cfg.chat, None), Ok(LlmProvider::Dummy(_))));
    }

    #[test]
    fn builds_persona_models() {
        let cfg = llm_config("openai-compatible");
        let personas = PersonaProviders::build(&cfg, None).unwrap();
        assert_eq!(personas.scout.model(), "llama3.2:3b");
        assert_eq!(personas.coordinator.model(), "qwen2.5:7b");
    }

    #[test]
    fn unknown_provider_errors() {
        let cfg = llm_config("carrier-pigeon");
        let err = build(&cfg, &cfg.chat, None).unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
