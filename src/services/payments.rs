use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::errors::AppError;

const GATEWAY_API_VERSION: &str = "2022-09-01";

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("gateway returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct GatewayOrderRequest {
    pub order_id: String,
    pub order_amount: i64,
    pub order_currency: String,
    pub customer_details: GatewayCustomer,
    pub order_meta: GatewayOrderMeta,
    pub order_note: String,
}

#[derive(Debug, Serialize)]
pub struct GatewayCustomer {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Serialize)]
pub struct GatewayOrderMeta {
    pub return_url: String,
}

#[derive(Debug, Deserialize)]
pub struct GatewayOrderResponse {
    pub order_id: String,
    pub payment_session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GatewayPayment {
    pub payment_status: String,
    #[serde(default)]
    pub cf_payment_id: Option<serde_json::Value>,
}

pub const PAYMENT_STATUS_SUCCESS: &str = "SUCCESS";

impl GatewayPayment {
    pub fn is_success(&self) -> bool {
        self.payment_status == PAYMENT_STATUS_SUCCESS
    }
}

/// Hosted payment gateway client. Orders are created server-side; the
/// returned session id drives the hosted checkout on the client.
#[derive(Clone)]
pub struct PaymentGateway {
    client: Client,
    base_url: String,
    app_id: String,
    secret_key: String,
}

impl PaymentGateway {
    pub fn new(base_url: String, app_id: String, secret_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url,
            app_id,
            secret_key,
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("x-client-id", &self.app_id)
            .header("x-client-secret", &self.secret_key)
            .header("x-api-version", GATEWAY_API_VERSION)
    }

    pub async fn create_order(
        &self,
        order: &GatewayOrderRequest,
    ) -> Result<GatewayOrderResponse, GatewayError> {
        let response = self
            .request(self.client.post(format!("{}/orders", self.base_url)))
            .json(order)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }

    /// Fetches the payments recorded against a gateway order.
    pub async fn get_payments(&self, order_id: &str) -> Result<Vec<GatewayPayment>, GatewayError> {
        let response = self
            .request(
                self.client
                    .get(format!("{}/orders/{}/payments", self.base_url, order_id)),
            )
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer) -> PaymentGateway {
        PaymentGateway::new(
            server.uri(),
            "app-id".to_string(),
            "secret".to_string(),
        )
    }

    fn order_request() -> GatewayOrderRequest {
        GatewayOrderRequest {
            order_id: "order_1_abc".to_string(),
            order_amount: 679,
            order_currency: "INR".to_string(),
            customer_details: GatewayCustomer {
                customer_id: "user-1".to_string(),
                customer_name: "Test User".to_string(),
                customer_email: "user@example.com".to_string(),
                customer_phone: "9999999999".to_string(),
            },
            order_meta: GatewayOrderMeta {
                return_url: "http://localhost:3000/payment/status?order_id=order_1_abc"
                    .to_string(),
            },
            order_note: "Premium Subscription".to_string(),
        }
    }

    #[tokio::test]
    async fn create_order_returns_session_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(header("x-client-id", "app-id"))
            .and(header("x-api-version", GATEWAY_API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "order_id": "order_1_abc",
                "payment_session_id": "session_xyz"
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let response = gateway.create_order(&order_request()).await.unwrap();

        assert_eq!(response.payment_session_id.as_deref(), Some("session_xyz"));
    }

    #[tokio::test]
    async fn create_order_surfaces_gateway_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let err = gateway.create_order(&order_request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn get_payments_parses_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders/order_1_abc/payments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "payment_status": "SUCCESS", "cf_payment_id": 991 },
                { "payment_status": "FAILED" }
            ])))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let payments = gateway.get_payments("order_1_abc").await.unwrap();

        assert_eq!(payments.len(), 2);
        assert!(payments[0].is_success());
        assert!(!payments[1].is_success());
    }
}
