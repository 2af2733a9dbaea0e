use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub image_sha256: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateScreenshotRequest {
    pub image_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScreenshotListResponse {
    pub screenshots: Vec<Screenshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScreenshotDetailsResponse {
    pub screenshot: Screenshot,
    pub questions: Vec<super::Question>,
}
