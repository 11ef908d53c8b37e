//! Text-generation collaborator.
//!
//! The planning engine only needs `generate(system, user, max_tokens,
//! temperature) -> text`. [`GatewayGenerator`] provides it over any
//! [`ChatGateway`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GenerationError;
use crate::gateway::{Attribution, ChatGateway, ChatModel, ChatRequest, Message};

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Sampling parameters for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// Text plus accounting for one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_nanodollars: i64,
    /// Output stopped at the token limit.
    pub truncated: bool,
}

impl Generation {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        user: &str,
        params: GenerationParams,
    ) -> Result<Generation, GenerationError>;
}

/// [`TextGenerator`] backed by the chat gateway.
pub struct GatewayGenerator {
    gateway: Arc<dyn ChatGateway>,
    model: ChatModel,
    attribution: Attribution,
}

impl GatewayGenerator {
    pub fn new(gateway: Arc<dyn ChatGateway>, model: impl Into<String>) -> Self {
        Self {
            gateway,
            model: ChatModel::openrouter(model),
            attribution: Attribution::new("survey::generate"),
        }
    }

    pub fn with_run(mut self, run_id: Uuid) -> Self {
        self.attribution = self.attribution.with_run(run_id);
        self
    }
}

#[async_trait]
impl TextGenerator for GatewayGenerator {
    async fn generate(
        &self,
        system: &str,
        user: &str,
        params: GenerationParams,
    ) -> Result<Generation, GenerationError> {
        let req = ChatRequest::new(
            self.model.clone(),
            vec![Message::system(system), Message::user(user)],
            self.attribution.clone(),
        )
        .temperature(params.temperature)
        .max_tokens(params.max_output_tokens);

        let resp = self.gateway.chat(req).await?;
        if resp.content.trim().is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(Generation {
            truncated: resp.was_truncated(),
            text: resp.content,
            input_tokens: resp.input_tokens,
            output_tokens: resp.output_tokens,
            cost_nanodollars: resp.cost_nanodollars,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{ChatResponse, FinishReason, ProviderError};
    use std::sync::Mutex;
    use std::time::Duration;

    struct Recording {
        seen: Mutex<Vec<ChatRequest>>,
        reply: &'static str,
        finish: FinishReason,
    }

    #[async_trait]
    impl ChatGateway for Recording {
        async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ProviderError> {
            self.seen.lock().unwrap().push(req);
            Ok(ChatResponse {
                content: self.reply.to_string(),
                input_tokens: 10,
                output_tokens: 20,
                cost_nanodollars: 5,
                latency: Duration::from_millis(1),
                finish_reason: self.finish.clone(),
            })
        }
    }

    fn params() -> GenerationParams {
        GenerationParams {
            max_output_tokens: 900,
            temperature: 0.2,
        }
    }

    #[tokio::test]
    async fn forwards_instructions_and_sampling() {
        let gw = Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
            reply: "Q1. Hello?",
            finish: FinishReason::Stop,
        });
        let run = Uuid::new_v4();
        let gen = GatewayGenerator::new(gw.clone(), "test/model").with_run(run);

        let out = gen.generate("sys", "usr", params()).await.unwrap();
        assert_eq!(out.text, "Q1. Hello?");
        assert_eq!(out.output_tokens, 20);
        assert!(!out.truncated);

        let seen = gw.seen.lock().unwrap();
        let req = &seen[0];
        assert_eq!(req.model.model_id(), "test/model");
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.max_tokens, Some(900));
        assert_eq!(req.attribution.run_id, Some(run));
    }

    #[tokio::test]
    async fn blank_reply_is_an_error_and_length_stop_is_flagged() {
        let blank = GatewayGenerator::new(
            Arc::new(Recording {
                seen: Mutex::new(Vec::new()),
                reply: "   ",
                finish: FinishReason::Stop,
            }),
            "m",
        );
        assert!(matches!(
            blank.generate("s", "u", params()).await,
            Err(GenerationError::Empty)
        ));

        let cut = GatewayGenerator::new(
            Arc::new(Recording {
                seen: Mutex::new(Vec::new()),
                reply: "Q1. Partial",
                finish: FinishReason::Length,
            }),
            "m",
        );
        assert!(cut.generate("s", "u", params()).await.unwrap().truncated);
    }
}
