//! Language-model interaction behind a narrow, framework-free interface.
//!
//! The pipeline only knows the [`LanguageModel`] trait: hand it a [`Task`]
//! (instructions plus named input and output fields) and a record of input
//! values, get back a record of output values or an [`LlmError`].
//!
//! [`ChatClient`] implements the trait against an OpenAI-compatible
//! `/chat/completions` endpoint (Perplexity by default). The task is rendered
//! into a system prompt that asks for a JSON object holding a `reasoning`
//! key followed by the declared output fields; the reply is parsed back into
//! a field record and the reasoning is discarded.
//!
//! There is no retry logic here. A failed call surfaces as an error and the
//! caller decides what placeholder to use.

use crate::utils::{looks_truncated, truncate_for_log};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Named field values passed to or returned from a model call.
pub type Fields = BTreeMap<String, String>;

/// Key the model is asked to fill with its step-by-step reasoning.
pub const REASONING_FIELD: &str = "reasoning";

/// One named input or output slot of a [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub desc: &'static str,
}

/// A declarative description of one model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    /// Short identifier used in logs.
    pub name: &'static str,
    /// What the model should do, in plain language.
    pub instructions: &'static str,
    pub inputs: &'static [FieldSpec],
    pub outputs: &'static [FieldSpec],
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("input field `{0}` was not provided")]
    MissingInput(String),
    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("LLM API error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("LLM returned no content")]
    EmptyResponse,
    #[error("LLM output was cut off: {0}")]
    Truncated(String),
    #[error("LLM output is not a JSON object: {0}")]
    Malformed(String),
    #[error("LLM output is missing field `{0}`")]
    MissingField(String),
}

/// Anything that can run a [`Task`] over a record of inputs.
pub trait LanguageModel {
    async fn predict(&self, task: &Task, input: &Fields) -> Result<Fields, LlmError>;
}

/// Render the system and user messages for a task.
pub fn render_prompt(task: &Task, input: &Fields) -> Result<(String, String), LlmError> {
    let mut system = String::new();
    let _ = writeln!(system, "{}", task.instructions.trim());
    let _ = writeln!(system, "\nYou will receive these input fields:");
    for (i, field) in task.inputs.iter().enumerate() {
        let _ = writeln!(system, "{}. `{}`: {}", i + 1, field.name, field.desc);
    }
    let _ = writeln!(
        system,
        "\nRespond with a single JSON object and nothing else. It must contain these keys, in order:"
    );
    let _ = writeln!(
        system,
        "- `{REASONING_FIELD}`: think step by step in order to produce the remaining fields"
    );
    for field in task.outputs {
        let _ = writeln!(system, "- `{}`: {} (a JSON string)", field.name, field.desc);
    }

    let mut user = String::new();
    for field in task.inputs {
        let value = input
            .get(field.name)
            .ok_or_else(|| LlmError::MissingInput(field.name.to_string()))?;
        let _ = write!(user, "## {}\n{}\n\n", field.name, value);
    }

    Ok((system.trim_end().to_string(), user.trim_end().to_string()))
}

/// Parse a model reply into the task's output fields.
///
/// Tolerates prose or code fences around the JSON object. Only the fields
/// declared in `task.outputs` are returned.
///
/// # Arguments
///
/// * `task` - The task whose declared outputs are expected
/// * `content` - Raw message content returned by the model
///
/// # Returns
///
/// The output fields, or [`LlmError::EmptyResponse`] for a blank reply,
/// [`LlmError::Truncated`] when the JSON was cut off,
/// [`LlmError::Malformed`] for any other parse failure, and
/// [`LlmError::MissingField`] when a declared output is absent or null.
pub fn parse_output(task: &Task, content: &str) -> Result<Fields, LlmError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    let start = content
        .find('{')
        .ok_or_else(|| LlmError::Malformed(truncate_for_log(content, 200)))?;
    let end = content
        .rfind('}')
        .filter(|&end| end > start)
        .map(|end| end + 1)
        .unwrap_or(content.len());
    let candidate = &content[start..end];

    let value: serde_json::Value = serde_json::from_str(candidate).map_err(|e| {
        if looks_truncated(&e) {
            LlmError::Truncated(e.to_string())
        } else {
            LlmError::Malformed(e.to_string())
        }
    })?;
    let serde_json::Value::Object(map) = value else {
        return Err(LlmError::Malformed(truncate_for_log(candidate, 200)));
    };

    let mut fields = Fields::new();
    for field in task.outputs {
        let text = match map.get(field.name) {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(serde_json::Value::Null) | None => {
                return Err(LlmError::MissingField(field.name.to_string()));
            }
            Some(other) => other.to_string(),
        };
        fields.insert(field.name.to_string(), text);
    }
    Ok(fields)
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Connection settings for [`ChatClient`].
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
}

/// [`LanguageModel`] over an OpenAI-compatible chat completions API.
pub struct ChatClient {
    http: reqwest::Client,
    config: ChatConfig,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("api_base", &self.config.api_base)
            .field("model", &self.config.model)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

impl LanguageModel for ChatClient {
    #[instrument(level = "info", skip_all, fields(task = task.name, model = %self.config.model))]
    async fn predict(&self, task: &Task, input: &Fields) -> Result<Fields, LlmError> {
        let t0 = Instant::now();
        let (system, user) = render_prompt(task, input)?;
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
        };

        debug!(prompt_chars = user.chars().count(), "Sending chat request");
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %truncate_for_log(&body, 300), "Chat API returned an error");
            return Err(LlmError::Status { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        let fields = parse_output(task, &content).inspect_err(|e| {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&content, 300),
                "Model returned non-conforming output"
            );
        })?;

        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Chat request succeeded"
        );
        Ok(fields)
    }
}
