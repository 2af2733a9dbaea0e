use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::{AppError, Result};

/// Profile extracted from a verified Google ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: String,
    pub aud: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Clone)]
pub struct GoogleVerifier {
    client: Client,
    base_url: String,
    client_id: String,
}

impl GoogleVerifier {
    pub fn new(client_id: String) -> Self {
        Self::with_base_url(client_id, "https://oauth2.googleapis.com".to_string())
    }

    pub fn with_base_url(client_id: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url,
            client_id,
        }
    }

    /// Verifies a Google ID token against the tokeninfo endpoint and checks
    /// that it was issued for our OAuth client.
    pub async fn verify_id_token(&self, id_token: &str) -> Result<GoogleProfile> {
        let response = self
            .client
            .get(format!("{}/tokeninfo", self.base_url))
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AppError::Validation(format!("Token verification failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized);
        }

        let profile: GoogleProfile = response
            .json()
            .await
            .map_err(|_| AppError::Unauthorized)?;

        if profile.aud != self.client_id {
            tracing::warn!("ID token audience mismatch for {}", profile.email);
            return Err(AppError::Unauthorized);
        }

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn profile_json(aud: &str) -> serde_json::Value {
        json!({
            "sub": "1234567890",
            "email": "user@example.com",
            "aud": aud,
            "name": "Test User",
            "picture": "https://example.com/avatar.png"
        })
    }

    #[tokio::test]
    async fn accepts_token_with_matching_audience() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("client-1")))
            .mount(&server)
            .await;

        let verifier = GoogleVerifier::with_base_url("client-1".to_string(), server.uri());
        let profile = verifier.verify_id_token("some-token").await.unwrap();

        assert_eq!(profile.email, "user@example.com");
        assert_eq!(profile.sub, "1234567890");
    }

    #[tokio::test]
    async fn rejects_token_for_other_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("someone-else")))
            .mount(&server)
            .await;

        let verifier = GoogleVerifier::with_base_url("client-1".to_string(), server.uri());
        assert!(verifier.verify_id_token("some-token").await.is_err());
    }

    #[tokio::test]
    async fn rejects_invalid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_token"
            })))
            .mount(&server)
            .await;

        let verifier = GoogleVerifier::with_base_url("client-1".to_string(), server.uri());
        assert!(verifier.verify_id_token("bad-token").await.is_err());
    }
}
