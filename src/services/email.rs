use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Transactional email sender. Delivery is best-effort: failures are logged
/// and never block the caller.
#[derive(Clone)]
pub struct EmailService {
    client: Client,
    base_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: String,
}

impl EmailService {
    pub fn new(base_url: String, api_key: String, from: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url,
            api_key,
            from,
        }
    }

    pub async fn send_welcome(&self, name: &str, email: &str) {
        let first_name = if name.is_empty() {
            email.split('@').next().unwrap_or(email)
        } else {
            name.split(' ').next().unwrap_or(name)
        };

        let request = SendEmailRequest {
            from: &self.from,
            to: vec![email],
            subject: "Welcome to AskShot! Your account is ready",
            html: welcome_html(first_name),
        };

        let result = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Welcome email sent to {}", email);
            }
            Ok(response) => {
                tracing::error!(
                    "Email API returned {} for welcome email to {}",
                    response.status(),
                    email
                );
            }
            Err(e) => {
                tracing::error!("Failed to send welcome email to {}: {}", email, e);
            }
        }
    }
}

fn welcome_html(first_name: &str) -> String {
    format!(
        "<h1>Welcome to AskShot, {first_name}!</h1>\
         <p>Your account is ready. Capture any part of a webpage with the browser \
         extension and ask the AI about it.</p>\
         <p>You start with 5 free AI questions every day. Happy asking!</p>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_welcome_email_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(wiremock::matchers::header("authorization", "Bearer key-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let service = EmailService::new(
            server.uri(),
            "key-1".to_string(),
            "AskShot <onboarding@example.com>".to_string(),
        );
        service.send_welcome("Ada Lovelace", "ada@example.com").await;
    }

    #[tokio::test]
    async fn swallows_delivery_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = EmailService::new(
            server.uri(),
            "key-1".to_string(),
            "AskShot <onboarding@example.com>".to_string(),
        );
        // Must not panic or error.
        service.send_welcome("", "ada@example.com").await;
    }

    #[test]
    fn welcome_html_greets_by_first_name() {
        let html = welcome_html("Ada");
        assert!(html.contains("Welcome to AskShot, Ada!"));
    }
}
