use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub const TIER_FREE: &str = "free";
pub const TIER_PAID: &str = "paid";

pub const FREE_MAX_CREDITS: i32 = 5;
pub const PAID_MAX_CREDITS: i32 = 20;

/// Credit ceiling is a pure function of the subscription tier.
pub fn max_credits_for_tier(tier: &str) -> i32 {
    if tier == TIER_PAID {
        PAID_MAX_CREDITS
    } else {
        FREE_MAX_CREDITS
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub google_id: Option<String>,
    pub role: String,
    pub tier: String,
    pub free_trials_left: i32,
    pub max_credits: i32,
    pub next_trial_reset: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditsResponse {
    pub free_trials_left: i32,
    pub is_expired: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TierResponse {
    pub tier: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: String,
    pub plan: String,
    pub member_since: String,
    pub plan_status: String,
    pub free_trials_left: i32,
    pub max_credits: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_credits_follows_tier() {
        assert_eq!(max_credits_for_tier(TIER_FREE), 5);
        assert_eq!(max_credits_for_tier(TIER_PAID), 20);
        // unknown tiers fall back to the free ceiling
        assert_eq!(max_credits_for_tier("trial"), 5);
    }
}
