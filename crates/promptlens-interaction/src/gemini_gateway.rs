//! GeminiGateway - Direct REST API implementation of the transform gateway.
//!
//! This gateway calls the Gemini REST API directly and classifies transport
//! failures into the domain's `GatewayError` taxonomy. Cancellation is
//! cooperative: the token is checked before every side-effecting step and
//! raced against the request itself, so a cancelled attempt settles without
//! waiting for the transport.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use promptlens_core::gateway::{GatewayError, PhaseSink, TransformGateway};
use promptlens_core::image::ImagePayload;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-lite";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const DEFAULT_PROMPT_TEXT: &str =
    "Generate a detailed professional prompt describing this image.";

const SYSTEM_INSTRUCTION: &str = "You are an expert image analyst specializing in creating detailed, comprehensive descriptions for AI image generation.

Create well-structured, detailed prompts that include:

1. Overall Impression - General description of the image, composition, and aesthetic
2. Subject and Appearance - Detailed description of the main subject(s), including physical features, clothing, styling, pose, and expression
3. Setting and Background - Description of environment, location, background elements, and spatial context
4. Technical Aspects - Lighting, color palette, composition, framing, perspective, and quality
5. Style and Mood - Artistic style, atmosphere, emotional tone, and overall aesthetic

Write in a professional, detailed manner. Be specific and thorough. Use proper structure and formatting to organize information clearly. Aim for comprehensive coverage of all visual elements.";

const PHASE_UPLOADING: &str = "Uploading image…";
const PHASE_SENDING: &str = "Sending request…";
const PHASE_DONE: &str = "Done";

/// Gateway implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiGateway {
    client: Client,
    api_key: String,
    model: String,
    system_instruction: String,
}

impl GeminiGateway {
    /// Creates a new gateway with the provided API key and model.
    ///
    /// Every request carries the detailed-analysis system instruction unless
    /// it is replaced via [`with_system_instruction`](Self::with_system_instruction).
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
        }
    }

    /// Loads the API key from the `GEMINI_API_KEY` environment variable.
    ///
    /// Model name defaults to `gemini-2.0-flash-lite` if not overridden.
    pub fn try_from_env() -> Result<Self, GatewayError> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            GatewayError::CredentialInvalid("GEMINI_API_KEY is not set".to_string())
        })?;
        Ok(Self::new(api_key, DEFAULT_GEMINI_MODEL))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replaces the default system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    fn build_request(&self, image: &ImagePayload) -> GenerateContentRequest {
        let parts = vec![
            Part::Text {
                text: DEFAULT_PROMPT_TEXT.to_string(),
            },
            Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: image.mime().to_string(),
                    data: BASE64_STANDARD.encode(image.bytes()),
                },
            },
        ];

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            system_instruction: Content {
                role: "system".to_string(),
                parts: vec![Part::Text {
                    text: self.system_instruction.clone(),
                }],
            },
            generation_config: GenerationConfig::default(),
        }
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, GatewayError> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| GatewayError::Network(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(classify_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            GatewayError::Network(format!("Failed to parse Gemini response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl TransformGateway for GeminiGateway {
    async fn generate(
        &self,
        image: &ImagePayload,
        phases: PhaseSink,
        cancel: CancellationToken,
    ) -> Result<String, GatewayError> {
        if cancel.is_cancelled() {
            return Err(GatewayError::Aborted);
        }
        let _ = phases.send(PHASE_UPLOADING.to_string());

        let request = self.build_request(image);

        if cancel.is_cancelled() {
            return Err(GatewayError::Aborted);
        }
        let _ = phases.send(PHASE_SENDING.to_string());

        // Settle immediately on cancellation; the underlying request is
        // dropped and aborted at the transport level.
        let text = tokio::select! {
            _ = cancel.cancelled() => return Err(GatewayError::Aborted),
            result = self.send_request(&request) => result?,
        };

        if cancel.is_cancelled() {
            return Err(GatewayError::Aborted);
        }
        let _ = phases.send(PHASE_DONE.to_string());
        Ok(text)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inline_data")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.9,
            max_output_tokens: 3000,
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, GatewayError> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            GatewayError::Network(
                "Gemini API returned no text in the response candidates".to_string(),
            )
        })
}

/// Classifies an HTTP failure from the status code and error body content.
/// Unclassifiable failures map to `Network`.
fn classify_http_error(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    let lowered = message.to_lowercase();
    if lowered.contains("location is not supported") || lowered.contains("user location") {
        return GatewayError::LocationRestricted;
    }
    if status == StatusCode::UNAUTHORIZED || lowered.contains("api key not valid") {
        return GatewayError::CredentialInvalid(message);
    }
    if status == StatusCode::FORBIDDEN {
        return GatewayError::Forbidden(message);
    }
    GatewayError::Network(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg_payload() -> ImagePayload {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend_from_slice(&[0u8; 16]);
        ImagePayload::from_bytes(bytes).unwrap()
    }

    #[test]
    fn classifies_location_restriction() {
        let body = r#"{"error":{"code":400,"message":"User location is not supported for the API use.","status":"FAILED_PRECONDITION"}}"#;
        assert_eq!(
            classify_http_error(StatusCode::BAD_REQUEST, body),
            GatewayError::LocationRestricted
        );
    }

    #[test]
    fn classifies_invalid_api_key() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            classify_http_error(StatusCode::BAD_REQUEST, body),
            GatewayError::CredentialInvalid(_)
        ));
        assert!(matches!(
            classify_http_error(StatusCode::UNAUTHORIZED, "{}"),
            GatewayError::CredentialInvalid(_)
        ));
    }

    #[test]
    fn classifies_forbidden() {
        let body = r#"{"error":{"code":403,"message":"Permission denied.","status":"PERMISSION_DENIED"}}"#;
        assert!(matches!(
            classify_http_error(StatusCode::FORBIDDEN, body),
            GatewayError::Forbidden(_)
        ));
    }

    #[test]
    fn unclassifiable_failures_map_to_network() {
        assert!(matches!(
            classify_http_error(StatusCode::INTERNAL_SERVER_ERROR, "not even json"),
            GatewayError::Network(_)
        ));
        assert!(matches!(
            classify_http_error(StatusCode::TOO_MANY_REQUESTS, "{}"),
            GatewayError::Network(_)
        ));
    }

    #[test]
    fn request_body_carries_inline_image() {
        let gateway = GeminiGateway::new("test-key", DEFAULT_GEMINI_MODEL);
        let request = gateway.build_request(&jpeg_payload());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["contents"][0]["parts"][1]["inline_data"]["mime_type"],
            "image/jpeg"
        );
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 3000);
    }

    #[test]
    fn every_request_carries_the_analyst_system_instruction() {
        let gateway = GeminiGateway::new("test-key", DEFAULT_GEMINI_MODEL);
        let json = serde_json::to_value(gateway.build_request(&jpeg_payload())).unwrap();

        assert_eq!(json["system_instruction"]["role"], "system");
        let text = json["system_instruction"]["parts"][0]["text"]
            .as_str()
            .unwrap();
        assert!(text.starts_with("You are an expert image analyst"));

        let custom = GeminiGateway::new("test-key", DEFAULT_GEMINI_MODEL)
            .with_system_instruction("Describe tersely.");
        let json = serde_json::to_value(custom.build_request(&jpeg_payload())).unwrap();
        assert_eq!(
            json["system_instruction"]["parts"][0]["text"],
            "Describe tersely."
        );
    }

    #[tokio::test]
    async fn pre_cancelled_token_aborts_without_sending() {
        let gateway = GeminiGateway::new("test-key", DEFAULT_GEMINI_MODEL);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = gateway.generate(&jpeg_payload(), tx, cancel).await;
        assert_eq!(result, Err(GatewayError::Aborted));
        // No phase may be delivered for an already-cancelled attempt.
        assert!(rx.try_recv().is_err());
    }
}
