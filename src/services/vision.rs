use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

use crate::errors::AppError;

const MAX_ATTEMPTS: u32 = 3;
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Vendor status code signalling capacity exhaustion; the only error worth
/// retrying.
const OVERLOADED_STATUS: u16 = 529;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("vendor overloaded after retries")]
    Overloaded,
    #[error("request failed: {0}")]
    Request(String),
    #[error("vendor returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<VisionError> for AppError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::Overloaded => AppError::VendorOverloaded,
            other => AppError::Vendor(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: String },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    source_type: &'a str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: String,
}

/// Client for the hosted vision-language model. One image plus one question
/// in, one answer out.
#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    retry_base_delay: Duration,
}

impl VisionClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        retry_base_delay: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url,
            api_key,
            model,
            retry_base_delay,
        }
    }

    /// Sends the screenshot and question to the vision model. Retries only
    /// on the vendor's overloaded status, with a delay growing linearly per
    /// attempt; every other failure propagates immediately.
    pub async fn analyze(
        &self,
        media_type: &str,
        image_data: &str,
        question: &str,
    ) -> Result<String, VisionError> {
        let prompt = build_prompt(question);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64",
                            media_type,
                            data: image_data,
                        },
                    },
                    ContentBlock::Text { text: prompt },
                ],
            }],
        };

        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .client
                .post(format!("{}/v1/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request)
                .send()
                .await
                .map_err(|e| VisionError::Request(e.to_string()))?;

            let status = response.status().as_u16();

            if status == OVERLOADED_STATUS {
                if attempt < MAX_ATTEMPTS {
                    tracing::warn!("Vision vendor overloaded, retrying ({})", attempt);
                    sleep(self.retry_base_delay * attempt).await;
                    continue;
                }
                return Err(VisionError::Overloaded);
            }

            if !response.status().is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(VisionError::Api { status, message });
            }

            let body: MessagesResponse = response
                .json()
                .await
                .map_err(|e| VisionError::InvalidResponse(e.to_string()))?;

            return body
                .content
                .first()
                .map(|block| block.text.clone())
                .ok_or_else(|| VisionError::InvalidResponse("empty content".to_string()));
        }

        Err(VisionError::Overloaded)
    }
}

fn build_prompt(question: &str) -> String {
    format!(
        "You are an expert AI that helps users understand screenshots of webpages \
         they've selected. Analyze the screenshot and respond appropriately to the \
         user's question.\n\
         Guidelines:\n\
         1. If the image includes vulgar or explicit content, respond: \"This image may \
         contain inappropriate content. Please upload a different screenshot.\"\n\
         2. If the image contains sensitive data (e.g. passwords, personal info), respond: \
         \"This screenshot may include sensitive information. Please review before sharing \
         further.\"\n\
         3. If the question is not related to the screenshot, say: \"This question doesn't \
         seem related to the selected area. Want me to describe the image instead?\"\n\
         4. If no question is provided, describe the screenshot as clearly as possible.\n\
         5. If the question is clear and related, give a precise, helpful answer.\n\
         6. Prefer short, direct responses (around 30-40 words) when the question is \
         simple. Use longer, detailed responses only when needed.\n\
         User's question: \"{}\"",
        question
    )
}

/// Accepts either a `data:image/...;base64,` URL or a bare base64 string.
pub fn validate_base64_image(payload: &str) -> bool {
    if payload.is_empty() {
        return false;
    }

    if let Some(rest) = payload.strip_prefix("data:image/") {
        let Some((format, _)) = rest.split_once(";base64,") else {
            return false;
        };
        return matches!(format, "png" | "jpeg" | "jpg" | "gif" | "webp");
    }

    use base64::Engine as _;
    let candidate = payload.rsplit(',').next().unwrap_or(payload);
    base64::engine::general_purpose::STANDARD
        .decode(candidate)
        .is_ok()
}

/// Strips the data-URL prefix, leaving the raw base64 payload.
pub fn clean_base64_image(payload: &str) -> &str {
    match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:image/") => data,
        _ => payload,
    }
}

/// Media type from the data-URL prefix, defaulting to PNG.
pub fn image_media_type(payload: &str) -> String {
    payload
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(format, _)| format!("image/{}", format))
        .unwrap_or_else(|| "image/png".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> VisionClient {
        VisionClient::new(
            server.uri(),
            "test-key".to_string(),
            "test-model".to_string(),
            Duration::from_millis(1),
        )
    }

    fn answer_body(text: &str) -> serde_json::Value {
        json!({ "content": [{ "type": "text", "text": text }] })
    }

    fn overloaded_body() -> serde_json::Value {
        json!({ "type": "error", "error": { "type": "overloaded_error", "message": "Overloaded" } })
    }

    #[tokio::test]
    async fn returns_answer_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("It is a login form.")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let answer = client
            .analyze("image/png", "aGVsbG8=", "What is this?")
            .await
            .unwrap();

        assert_eq!(answer, "It is a login form.");
    }

    #[tokio::test]
    async fn retries_twice_on_overload_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_json(overloaded_body()))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let answer = client.analyze("image/png", "aGVsbG8=", "q").await.unwrap();
        assert_eq!(answer, "ok");
    }

    #[tokio::test]
    async fn gives_up_after_three_overloaded_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_json(overloaded_body()))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.analyze("image/png", "aGVsbG8=", "q").await.unwrap_err();
        assert!(matches!(err, VisionError::Overloaded));
    }

    #[tokio::test]
    async fn non_overload_errors_propagate_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.analyze("image/png", "aGVsbG8=", "q").await.unwrap_err();
        assert!(matches!(err, VisionError::Api { status: 400, .. }));
    }

    #[test]
    fn validates_data_url_images() {
        assert!(validate_base64_image("data:image/png;base64,aGVsbG8="));
        assert!(validate_base64_image("data:image/webp;base64,aGVsbG8="));
        assert!(!validate_base64_image("data:image/tiff;base64,aGVsbG8="));
        assert!(!validate_base64_image("data:image/png,aGVsbG8="));
        assert!(!validate_base64_image(""));
    }

    #[test]
    fn validates_bare_base64() {
        assert!(validate_base64_image("aGVsbG8="));
        assert!(!validate_base64_image("not base64!!"));
    }

    #[test]
    fn cleans_data_url_prefix() {
        assert_eq!(
            clean_base64_image("data:image/png;base64,aGVsbG8="),
            "aGVsbG8="
        );
        assert_eq!(clean_base64_image("aGVsbG8="), "aGVsbG8=");
    }

    #[test]
    fn derives_media_type_with_png_fallback() {
        assert_eq!(
            image_media_type("data:image/jpeg;base64,aGVsbG8="),
            "image/jpeg"
        );
        assert_eq!(image_media_type("aGVsbG8="), "image/png");
    }
}
