use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::key_pool::{key_prefix, ApiKeyPool};
use super::{AiError, GenerationOptions, TextGenerator};

/// Client for the Gemini `generateContent` endpoint, one pooled key per call
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    keys: Arc<ApiKeyPool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, keys: Arc<ApiKeyPool>) -> Result<Self, AiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            keys,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn call(&self, api_key: &str, prompt: &str, options: &GenerationOptions) -> Result<String, AiError> {
        let model = options.model.as_deref().unwrap_or(&self.model);
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
            },
        };

        log::info!(
            "[GEMINI] Sending request with model {} (key {}, {} chars)",
            model,
            key_prefix(api_key),
            prompt.chars().count()
        );
        log::debug!("[GEMINI] Prompt:\n{}", prompt);

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AiError::AuthFailed(status.as_u16()),
                StatusCode::TOO_MANY_REQUESTS => AiError::RateLimited,
                _ => {
                    let message = serde_json::from_str::<GeminiErrorResponse>(&error_text)
                        .map(|e| e.error.message)
                        .unwrap_or(error_text);
                    AiError::Api {
                        status: status.as_u16(),
                        message,
                    }
                }
            });
        }

        let response_text = response.text().await?;
        log::debug!("[GEMINI] Raw response:\n{}", response_text);

        let data: GenerateContentResponse = serde_json::from_str(&response_text)?;
        let text = extract_text(data);
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }

        log::info!("[GEMINI] Response - content_len: {}", text.len());
        Ok(text)
    }
}

/// Concatenated text parts of the first candidate
fn extract_text(response: GenerateContentResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String, AiError> {
        let api_key = self.keys.next_key().ok_or(AiError::NoApiKeys)?;

        match self.call(&api_key, prompt, &options).await {
            Ok(text) => {
                self.keys.report_success(&api_key);
                Ok(text)
            }
            Err(e) => {
                self.keys.report_error(&api_key, &e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "Xin chào" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.9,
                max_output_tokens: 2048,
            },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Xin chào" }] }],
                "generationConfig": { "temperature": 0.9, "maxOutputTokens": 2048 }
            })
        );
    }

    #[test]
    fn test_extract_text_joins_first_candidate_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Phần 1. " }, { "text": "Phần 2." }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(extract_text(response), "Phần 1. Phần 2.");

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap();
        assert_eq!(extract_text(blocked), "");
    }

    #[actix_web::test]
    async fn test_empty_pool_fails_without_request() {
        let client = GeminiClient::new(
            "http://127.0.0.1:9",
            "gemini-2.5-flash",
            Arc::new(ApiKeyPool::new(vec![])),
        )
        .unwrap();
        let err = client.generate("hi", GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, AiError::NoApiKeys));
        assert_eq!(client.endpoint("m"), "http://127.0.0.1:9/models/m:generateContent");
    }
}
