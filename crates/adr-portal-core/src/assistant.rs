//! AI-assisted chat: forwards the question and recent history to the completion service and
//! degrades to canned pharmacology answers when the service fails or times out.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::ai_bridge::CompletionService;
use crate::config::AiSettings;
use crate::error::CompletionError;
use crate::intent_router::ChatRouter;
use crate::models::{ConversationTurn, Role};
use crate::reference;

pub const CONNECTION_ERROR: &str = "connection_error";

pub const SYSTEM_PREAMBLE: &str = "You are an expert pharmacovigilance assistant with deep knowledge of adverse drug reactions, regulatory requirements, drug safety, and medical terminology. You help healthcare professionals with:

- Adverse drug reaction (ADR) identification and assessment
- Drug interaction analysis
- Regulatory reporting requirements (FDA, EMA, WHO guidelines)
- Pharmacovigilance best practices
- Risk assessment and signal detection
- PSUR (Periodic Safety Update Report) guidance
- Medical terminology and coding systems (MedDRA, WHO-ART)
- Clinical trial safety monitoring
- Post-marketing surveillance

Provide accurate, evidence-based responses that are professional and helpful for healthcare professionals. When discussing specific medications or medical conditions, always recommend consulting with qualified healthcare providers for patient-specific advice.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiReply {
    pub response: String,
    /// True when `response` is a canned answer standing in for the service.
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

pub struct AiAssistant {
    service: Arc<dyn CompletionService>,
    router: Arc<ChatRouter>,
    timeout: Duration,
    max_history_turns: usize,
}

impl AiAssistant {
    pub fn new(service: Arc<dyn CompletionService>, router: Arc<ChatRouter>, settings: &AiSettings) -> Self {
        Self {
            service,
            router,
            timeout: Duration::from_secs(settings.timeout_secs),
            max_history_turns: settings.max_history_turns,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// System preamble, then the most recent non-system history turns, then the question.
    pub fn build_messages(&self, message: &str, history: &[ConversationTurn]) -> Vec<ConversationTurn> {
        let kept: Vec<&ConversationTurn> = history.iter().filter(|t| t.role != Role::System).collect();
        let skip = kept.len().saturating_sub(self.max_history_turns);

        let mut messages = Vec::with_capacity(kept.len() - skip + 2);
        messages.push(ConversationTurn::system(SYSTEM_PREAMBLE));
        messages.extend(kept.into_iter().skip(skip).cloned());
        messages.push(ConversationTurn::user(message));
        messages
    }

    /// Canned answer for `message`: reference topic, then a matching chat rule, then the overview.
    pub fn fallback(&self, message: &str) -> String {
        if let Some(topic) = reference::match_topic(message) {
            return topic.answer.to_string();
        }
        self.router
            .answer_if_matched(message, Utc::now())
            .map(|reply| reply.message)
            .unwrap_or_else(|| reference::reference_answer(message).to_string())
    }

    /// Never fails: service errors and timeouts turn into a degraded canned reply.
    pub async fn respond(&self, message: &str, history: &[ConversationTurn]) -> AiReply {
        let messages = self.build_messages(message, history);
        let outcome = match tokio::time::timeout(self.timeout, self.service.complete(&messages)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout(self.timeout.as_secs())),
        };

        match outcome {
            Ok(response) => AiReply {
                response,
                degraded: false,
                warning: None,
            },
            Err(e) => {
                tracing::warn!("[assistant] completion failed, serving canned answer: {}", e);
                AiReply {
                    response: self.fallback(message),
                    degraded: true,
                    warning: Some(CONNECTION_ERROR),
                }
            }
        }
    }
}
