use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const ORDER_STATUS_CREATED: &str = "CREATED";
pub const ORDER_STATUS_PAID: &str = "PAID";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub payment_reference: Option<String>,
    pub plan_type: String,
    pub period: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
