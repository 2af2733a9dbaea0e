use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::{
    database::queries::{OrderQueries, UserQueries},
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{ORDER_STATUS_CREATED, ORDER_STATUS_PAID, TIER_PAID},
    services::{
        cache::keys,
        payments::{GatewayCustomer, GatewayOrderMeta, GatewayOrderRequest},
    },
};

const PLAN_AMOUNT: i64 = 679;
const PLAN_CURRENCY: &str = "INR";
const PLAN_TYPE: &str = "Pro";
const PLAN_PERIOD: &str = "monthly";

/// Creates a gateway order for the Pro upgrade and returns the checkout
/// session id the client hands to the hosted payment page.
#[utoipa::path(
    post,
    path = "/api/payment/create-order",
    tag = "payments",
    responses(
        (status = 200, description = "Checkout session created"),
        (status = 400, description = "Already on the paid tier"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>> {
    let account = UserQueries::find_by_id(state.database.pool(), user.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if account.tier == TIER_PAID {
        return Err(AppError::Validation(
            "Already subscribed to the Pro plan".to_string(),
        ));
    }

    let order_id = format!("order_{}_{}", chrono::Utc::now().timestamp_millis(), user.id);

    OrderQueries::create(
        state.database.pool(),
        user.id,
        &order_id,
        PLAN_AMOUNT,
        PLAN_CURRENCY,
        ORDER_STATUS_CREATED,
        PLAN_TYPE,
        PLAN_PERIOD,
    )
    .await?;

    let gateway_order = GatewayOrderRequest {
        order_id: order_id.clone(),
        order_amount: PLAN_AMOUNT,
        order_currency: PLAN_CURRENCY.to_string(),
        customer_details: GatewayCustomer {
            customer_id: user.id.to_string(),
            customer_name: account.name.unwrap_or_else(|| "Customer".to_string()),
            customer_email: account.email,
            customer_phone: "9999999999".to_string(),
        },
        order_meta: GatewayOrderMeta {
            return_url: format!(
                "{}/payment/status?order_id={}",
                state.config.base_url, order_id
            ),
        },
        order_note: "Premium Subscription".to_string(),
    };

    let created = state.payments.create_order(&gateway_order).await?;

    let session_id = created
        .payment_session_id
        .ok_or_else(|| AppError::Gateway("gateway returned no payment session".to_string()))?;

    tracing::info!("Created payment order {} for {}", order_id, user.email);

    Ok(Json(json!({
        "sessionId": session_id,
        "orderId": created.order_id
    })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub order_id: String,
}

/// Polls the gateway for the order's payments and upgrades the account on
/// the first successful one. Safe to call repeatedly.
#[utoipa::path(
    get,
    path = "/api/payment/verify",
    tag = "payments",
    params(("order_id" = String, Query, description = "Gateway order id")),
    responses(
        (status = 200, description = "Verification result"),
        (status = 401, description = "Not the order owner"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<serde_json::Value>> {
    let order = OrderQueries::find_by_order_id(state.database.pool(), &query.order_id)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    if order.user_id != user.id {
        return Err(AppError::Unauthorized);
    }

    if order.status == ORDER_STATUS_PAID {
        return Ok(Json(json!({ "success": true, "status": ORDER_STATUS_PAID })));
    }

    let payments = state.payments.get_payments(&query.order_id).await?;

    match payments.iter().find(|payment| payment.is_success()) {
        Some(payment) => {
            let reference = payment.cf_payment_id.as_ref().map(|id| id.to_string());
            complete_upgrade(&state, &query.order_id, order.user_id, reference.as_deref()).await?;

            Ok(Json(json!({ "success": true, "status": ORDER_STATUS_PAID })))
        }
        None => Ok(Json(json!({
            "success": false,
            "status": order.status
        }))),
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub order_id: String,
    pub tx_status: String,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub reference_id: Option<serde_json::Value>,
}

/// Gateway callback. Processes successful payments and acknowledges every
/// delivery so the gateway stops retrying; failures on our side are logged,
/// not surfaced.
#[utoipa::path(
    post,
    path = "/api/payment/webhook",
    tag = "payments",
    request_body = WebhookPayload,
    responses((status = 200, description = "Delivery acknowledged"))
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Json<serde_json::Value> {
    if payload.tx_status == crate::services::payments::PAYMENT_STATUS_SUCCESS {
        if let Err(e) = apply_webhook(&state, &payload).await {
            tracing::error!("Webhook processing failed for {}: {}", payload.order_id, e);
        }
    } else {
        tracing::info!(
            "Ignoring webhook for {} with status {}",
            payload.order_id,
            payload.tx_status
        );
    }

    Json(json!({ "received": true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_payload_parses_gateway_fields() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{ "orderId": "order_17_abc", "txStatus": "SUCCESS", "referenceId": 4412 }"#,
        )
        .unwrap();

        assert_eq!(payload.order_id, "order_17_abc");
        assert_eq!(payload.tx_status, "SUCCESS");
        assert_eq!(payload.reference_id, Some(serde_json::json!(4412)));
    }

    #[test]
    fn webhook_payload_tolerates_missing_reference() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{ "orderId": "order_17_abc", "txStatus": "FAILED" }"#,
        )
        .unwrap();

        assert!(payload.reference_id.is_none());
    }

    #[test]
    fn order_ids_embed_user_and_timestamp() {
        let user_id = uuid::Uuid::new_v4();
        let order_id = format!("order_{}_{}", 1700000000000i64, user_id);
        assert!(order_id.starts_with("order_1700000000000_"));
        assert!(order_id.ends_with(&user_id.to_string()));
    }
}

async fn apply_webhook(state: &AppState, payload: &WebhookPayload) -> Result<()> {
    let order = OrderQueries::find_by_order_id(state.database.pool(), &payload.order_id)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    if order.status == ORDER_STATUS_PAID {
        return Ok(());
    }

    let reference = payload.reference_id.as_ref().map(|id| id.to_string());
    complete_upgrade(state, &payload.order_id, order.user_id, reference.as_deref()).await
}

/// Marks the order paid, moves the buyer onto the paid tier and drops the
/// cached views of their entitlements.
async fn complete_upgrade(
    state: &AppState,
    order_id: &str,
    user_id: uuid::Uuid,
    payment_reference: Option<&str>,
) -> Result<()> {
    OrderQueries::mark_paid(state.database.pool(), order_id, payment_reference).await?;
    UserQueries::set_tier(state.database.pool(), user_id, TIER_PAID).await?;

    if let Some(account) = UserQueries::find_by_id(state.database.pool(), user_id).await? {
        state
            .cache
            .delete(&[
                keys::user_tier(&account.email),
                keys::user_profile(&account.email),
                keys::user_credits(&account.email),
            ])
            .await;

        tracing::info!("Upgraded {} to the paid tier via {}", account.email, order_id);
    }

    Ok(())
}
