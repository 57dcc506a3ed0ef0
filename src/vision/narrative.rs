// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Narrative severity analysis via an OpenAI-compatible chat API

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::normalizer::Detection;
use crate::config::NarrativeConfig;

const ANALYSIS_PROMPT_PREFIX: &str = "Analyze face palsy severity from detections: ";

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("Narrative API key not configured")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("API response contained no choices")]
    EmptyResponse,

    #[error("Failed to serialize detections: {0}")]
    Serialize(#[from] serde_json::Error),
}

// --- OpenAI-compatible serde structs ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Detections plus the model's free-text interpretation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeReport {
    pub detections: Vec<Detection>,
    pub analysis: String,
}

/// Client for the text-generation API. One attempt per call, no retries.
pub struct NarrativeClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl NarrativeClient {
    pub fn new(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(NarrativeError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!(
            "Narrative client configured: endpoint={}, model={}",
            config.api_url, config.model
        );

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the API to interpret a set of detections
    pub async fn analyze(&self, detections: &[Detection]) -> Result<String, NarrativeError> {
        let prompt = build_prompt(detections)?;
        debug!("Narrative prompt: {} chars", prompt.len());

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        extract_analysis(chat_response)
    }

    /// Run [`analyze`](Self::analyze) and bundle the result with its input
    pub async fn report(&self, detections: Vec<Detection>) -> Result<NarrativeReport, NarrativeError> {
        let analysis = self.analyze(&detections).await?;
        Ok(NarrativeReport {
            detections,
            analysis,
        })
    }
}

/// Prompt text sent to the API
pub fn build_prompt(detections: &[Detection]) -> Result<String, NarrativeError> {
    let json = serde_json::to_string(detections)?;
    Ok(format!("{}{}", ANALYSIS_PROMPT_PREFIX, json))
}

fn extract_analysis(response: ChatResponse) -> Result<String, NarrativeError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or(NarrativeError::EmptyResponse)
}
