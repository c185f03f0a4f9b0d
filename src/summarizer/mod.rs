//! Content summarization: raw text → narration
//!
//! Summarization never fails a task. Without an API key a labelled
//! placeholder is returned; a backend error yields a labelled preview of the
//! source text. Both carry [`Outcome::Degraded`].

pub mod client;
pub mod prompt;

pub use client::{ChatClient, ChatMessage};
pub use prompt::{Language, contains_cjk};

use crate::config::LlmConfig;
use crate::error::Result;
use crate::types::{LlmMeta, LlmOverride, Outcome};
use tracing::{info, warn};

/// Per-task summarization options
#[derive(Debug, Clone, Default)]
pub struct SummaryOptions {
    /// Target length in words
    pub word_count: u32,
    /// Chapter focus list
    pub chapters: Vec<String>,
    /// Per-request backend overrides
    pub llm: LlmOverride,
}

/// Narration text plus how it was produced
#[derive(Debug, Clone, PartialEq)]
pub struct Narration {
    /// Text to speak
    pub text: String,
    /// Backend metadata (carries the outcome)
    pub meta: LlmMeta,
}

/// Produces narration through an OpenAI-compatible backend
#[derive(Clone)]
pub struct Summarizer {
    client: ChatClient,
    config: LlmConfig,
}

impl Summarizer {
    /// Create a summarizer with the configured defaults
    pub fn new(config: LlmConfig) -> Result<Self> {
        Ok(Self {
            client: ChatClient::new(config.request_timeout)?,
            config,
        })
    }

    /// Summarize `text`
    pub async fn summarize(&self, text: &str, options: &SummaryOptions) -> Narration {
        let base_url = options
            .llm
            .base_url
            .clone()
            .unwrap_or_else(|| self.config.base_url.clone())
            .trim()
            .to_string();
        let model = options
            .llm
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone())
            .trim()
            .to_string();
        let api_key = options
            .llm
            .api_key
            .clone()
            .or_else(|| self.config.api_key.clone())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let language = Language::detect(text);

        let Some(api_key) = api_key else {
            info!(model = %model, "no API key configured, using placeholder narration");
            return Narration {
                text: prompt::placeholder_narration(language, options.word_count),
                meta: LlmMeta {
                    enabled: false,
                    base_url,
                    model,
                    error: None,
                    outcome: Outcome::degraded("API key not configured"),
                },
            };
        };

        let messages = [
            ChatMessage::system(language.system_message()),
            ChatMessage::user(prompt::build_prompt(
                language,
                text,
                &options.chapters,
                options.word_count,
                self.config.max_prompt_chars,
            )),
        ];

        match self
            .client
            .complete(
                &base_url,
                &api_key,
                &model,
                &messages,
                prompt::max_tokens(options.word_count),
            )
            .await
        {
            Ok(narration) => {
                info!(model = %model, chars = narration.chars().count(), "narration generated");
                Narration {
                    text: narration,
                    meta: LlmMeta {
                        enabled: true,
                        base_url,
                        model,
                        error: None,
                        outcome: Outcome::Real,
                    },
                }
            }
            Err(e) => {
                warn!(model = %model, base_url = %base_url, error = %e, "summarization failed, using text preview");
                Narration {
                    text: prompt::failure_narration(text),
                    meta: LlmMeta {
                        enabled: false,
                        base_url,
                        model,
                        error: Some(e.to_string()),
                        outcome: Outcome::degraded("backend error"),
                    },
                }
            }
        }
    }
}
