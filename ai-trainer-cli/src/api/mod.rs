use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::AiConfig;
use crate::models::{Exercise, Preferences};
use crate::workout::{AssistPayload, AssistQuery, AssistRequest, AssistResponse};

mod error;
mod retry;

pub use error::ApiError;
pub use retry::RetryConfig;

const SYSTEM_PROMPT: &str = "You are a strength and conditioning coach. \
Answer concisely. When a JSON schema is given, reply with JSON only.";

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
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

#[derive(Debug, Deserialize)]
struct AlternativesPayload {
    exercises: Vec<Exercise>,
}

/// Client for the AI text/plan service
pub struct AiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    enabled: bool,
    offline: bool,
    retry_config: RetryConfig,
}

impl AiClient {
    /// Create a new client. Never fails for a missing key; requests then
    /// return [`ApiError::Unavailable`] without touching the network.
    pub fn new(config: &AiConfig, offline: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key(),
            enabled: config.enabled,
            offline,
            retry_config: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Why requests cannot be made, if they cannot
    pub fn unavailable_reason(&self) -> Option<&'static str> {
        if self.offline {
            Some("offline mode")
        } else if !self.enabled {
            Some("AI features disabled in config")
        } else if self.api_key.is_none() {
            Some("no API key configured")
        } else {
            None
        }
    }

    pub fn is_available(&self) -> bool {
        self.unavailable_reason().is_none()
    }

    async fn chat(&self, prompt: &str, schema: Option<(&str, Value)>) -> Result<String> {
        if let Some(reason) = self.unavailable_reason() {
            return Err(ApiError::Unavailable(reason.to_string()).into());
        }
        let api_key = self.api_key.as_deref().unwrap_or_default();

        let request = ChatRequest {
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
            temperature: 0.7,
            response_format: schema.map(|(name, schema)| {
                json!({
                    "type": "json_schema",
                    "json_schema": { "name": name, "strict": true, "schema": schema }
                })
            }),
        };
        let url = format!("{}/chat/completions", self.base_url);

        let client = &self.client;
        let url = &url;
        let request = &request;

        self.retry_config
            .execute(move || async move {
                let response = client
                    .post(url)
                    .bearer_auth(api_key)
                    .json(request)
                    .send()
                    .await
                    .map_err(ApiError::from)?;

                let status = response.status();
                if !status.is_success() {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(ApiError::from_status(status, error_text).into());
                }

                let body: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

                let content = body
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .filter(|content| !content.trim().is_empty())
                    .ok_or_else(|| ApiError::InvalidResponse("empty completion".to_string()))?;

                Ok::<String, anyhow::Error>(content)
            })
            .await
    }

    /// Short how-to for an exercise
    pub async fn exercise_description(&self, name: &str) -> Result<String> {
        tracing::debug!("Fetching description for {}", name);

        let prompt = format!(
            "Describe how to perform the exercise \"{}\" in 3-4 sentences: setup, \
             movement, and one common mistake. Plain text, no markdown.",
            name
        );
        let text = self.chat(&prompt, None).await?;
        Ok(text.trim().to_string())
    }

    /// Exactly two substitutes for `exercise` that use the given equipment
    /// and are not already part of the day
    pub async fn alternative_exercises(
        &self,
        exercise: &Exercise,
        equipment: &[String],
        other_names: &[String],
    ) -> Result<Vec<Exercise>> {
        tracing::debug!("Fetching alternatives for {}", exercise.name);

        let prompt = format!(
            "Suggest exactly 2 alternative exercises to replace \"{}\" ({} sets of {}, \
             {} rest, load {}). Target the same muscles. Available equipment: {}. \
             Do not suggest any of: {}. Use \"Bodyweight\" as suggestedWeight when no \
             external load is used.",
            exercise.name,
            exercise.sets,
            exercise.reps,
            exercise.rest,
            exercise.suggested_weight,
            equipment.join(", "),
            other_names.join(", "),
        );
        let schema = json!({
            "type": "object",
            "properties": {
                "exercises": { "type": "array", "items": exercise_schema() }
            },
            "required": ["exercises"],
            "additionalProperties": false
        });

        let content = self.chat(&prompt, Some(("alternatives", schema))).await?;
        let payload: AlternativesPayload = parse_json(&content)?;

        let alternatives: Vec<Exercise> = payload
            .exercises
            .into_iter()
            .filter(|alt| {
                !alt.has_name(&exercise.name) && !other_names.iter().any(|n| alt.has_name(n))
            })
            .map(|alt| Exercise {
                rest_after_exercise: exercise.rest_after_exercise,
                ..alt
            })
            .take(2)
            .collect();

        if alternatives.len() < 2 {
            return Err(ApiError::InvalidResponse(format!(
                "expected 2 new alternatives, got {}",
                alternatives.len()
            ))
            .into());
        }
        Ok(alternatives)
    }

    /// Harder variant of `exercise` at the same load
    pub async fn alternative_progression(
        &self,
        exercise: &Exercise,
        last_weight: &str,
    ) -> Result<Exercise> {
        tracing::debug!("Fetching progression for {}", exercise.name);

        let prompt = format!(
            "The user did \"{}\" as {} sets of {} with {}s rest at {}. Propose a harder \
             version WITHOUT adding weight: change only sets, reps or rest. Keep the name \
             and suggestedWeight \"{}\".",
            exercise.name, exercise.sets, exercise.reps, exercise.rest, last_weight, last_weight
        );

        let content = self
            .chat(&prompt, Some(("progression", exercise_schema())))
            .await?;
        let proposed: Exercise = parse_json(&content)?;

        Ok(Exercise {
            name: exercise.name.clone(),
            suggested_weight: last_weight.to_string(),
            rest_after_exercise: exercise.rest_after_exercise,
            ..proposed
        })
    }

    /// Serve an assist request. Every failure becomes an "unavailable"
    /// response.
    pub async fn fulfil(&self, request: &AssistRequest, preferences: &Preferences) -> AssistResponse {
        let payload = match &request.query {
            AssistQuery::Description { name } => AssistPayload::Description(
                self.exercise_description(name)
                    .await
                    .map_err(|e| log_failure("description", &e))
                    .ok(),
            ),
            AssistQuery::Alternatives {
                exercise,
                other_names,
            } => AssistPayload::Alternatives(
                self.alternative_exercises(
                    exercise,
                    &preferences.equipment_or_default(),
                    other_names,
                )
                .await
                .map_err(|e| log_failure("alternatives", &e))
                .unwrap_or_default(),
            ),
            AssistQuery::Progression {
                exercise,
                last_weight,
            } => AssistPayload::Progression(
                self.alternative_progression(exercise, last_weight)
                    .await
                    .map_err(|e| log_failure("progression", &e))
                    .ok(),
            ),
        };

        AssistResponse::for_request(request, payload)
    }
}

fn log_failure(what: &str, error: &anyhow::Error) {
    tracing::warn!("AI {} request failed: {:#}", what, error);
}

fn exercise_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "sets": { "type": "string" },
            "reps": { "type": "string" },
            "rest": { "type": "integer" },
            "suggestedWeight": { "type": "string" }
        },
        "required": ["name", "sets", "reps", "rest", "suggestedWeight"],
        "additionalProperties": false
    })
}

fn parse_json<T: serde::de::DeserializeOwned>(content: &str) -> Result<T> {
    let json = extract_json(content)
        .ok_or_else(|| ApiError::InvalidResponse("no JSON object in completion".to_string()))?;
    serde_json::from_str(json)
        .map_err(|e| ApiError::InvalidResponse(format!("malformed JSON: {}", e)).into())
}

/// Locate a JSON object in model output, tolerating markdown fences and
/// surrounding prose
pub fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return Some(trimmed);
    }

    if let Some(start) = text.find("```") {
        let after_fence = start + 3;
        // Skip a language tag such as ```json
        let content_start = text[after_fence..]
            .find('\n')
            .map(|i| after_fence + i + 1)
            .unwrap_or(after_fence);
        if let Some(end) = text[content_start..].find("```") {
            let block = text[content_start..content_start + end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&text[start..=end]),
        _ => None,
    }
}
