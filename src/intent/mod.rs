//! Intent parser adapter - natural language to typed actions
//!
//! Talks to an OpenAI-compatible chat endpoint. Per the collaborator
//! contract, every failure (network, bad JSON, refusals) degrades to an empty
//! action list so a conversational turn never fails a job.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EditConfig;
use crate::ports::IntentPort;

/// What the intent parser returns for one prompt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionPlan {
    /// Raw typed actions; validated downstream by the action schema
    #[serde(default)]
    pub actions: Vec<serde_json::Value>,
    /// Optional human-readable reply for the user
    #[serde(default)]
    pub reply: Option<String>,
}

impl ActionPlan {
    /// An empty action list with a non-empty reply is a conversational turn
    pub fn is_conversational(&self) -> bool {
        self.actions.is_empty()
    }
}

const SYSTEM_PROMPT: &str = r#"You are a video editing assistant. Translate the user's request into strict JSON: {"actions": [...], "reply": "..."}.
Available actions:
  {"type": "trim", "start": <sec>, "end": <sec>}
  {"type": "speed", "factor": <positive float>}
  {"type": "filter", "name": "grayscale"|"contrast"|"warm_tone"|"cool_tone"|"retro"}
  {"type": "add_text", "content": <string>, "position": "top"|"bottom"|"center"}
  {"type": "fade", "kind": "in"|"out", "duration": <sec>}
  {"type": "add_music", "track": <library filename>, "volume": <0..1>}
  {"type": "auto_subtitles"}
  {"type": "aspect_ratio", "ratio": "9:16"|"1:1", "strategy": "center"|"pad"}
  {"type": "remove_silence", "threshold_db": <dB>, "min_duration": <sec>}
If the input is conversational rather than an edit request, return an empty
actions array and a reply. Return only raw JSON, no markdown."#;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Adapter calling an OpenAI-compatible chat completion endpoint
pub struct LlmIntentParser {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl LlmIntentParser {
    pub fn new(config: &EditConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.model_endpoint.clone(),
            model: config.model_name.clone(),
            api_key: config.api_key.clone(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, reqwest::Error> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            // low temperature for consistent JSON
            temperature: 0.1,
        };

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response: ChatResponse = request.send().await?.error_for_status()?.json().await?;
        Ok(response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}

/// Strip markdown code fences some models wrap around JSON
pub fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

#[async_trait::async_trait]
impl IntentPort for LlmIntentParser {
    async fn parse(&self, prompt: &str) -> ActionPlan {
        debug!(prompt, "parsing intent");
        let content = match self.complete(prompt).await {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "intent endpoint failed, treating as no-op");
                return ActionPlan::default();
            }
        };

        match serde_json::from_str::<ActionPlan>(strip_fences(&content)) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(error = %err, "intent reply was not valid JSON, treating as no-op");
                ActionPlan::default()
            }
        }
    }
}
