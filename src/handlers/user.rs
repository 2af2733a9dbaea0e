use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

use crate::{
    database::queries::{QuestionQueries, ScreenshotQueries, UserQueries},
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        CreditsResponse, ProfileResponse, TierResponse, UpdateProfileRequest, TIER_PAID,
    },
    services::cache::{keys, TTL_CREDITS, TTL_PLANS, TTL_PROFILE, TTL_TIER},
};

const FREE_SCREENSHOTS_PER_DAY: i64 = 20;
const PRO_CHATS_PER_DAY: i64 = 20;

/// Remaining credits for the session user, with the reset applied first so
/// the number shown matches what a subsequent analyze call would see.
#[utoipa::path(
    get,
    path = "/api/user/credits",
    tag = "user",
    responses(
        (status = 200, description = "Remaining credits", body = CreditsResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_credits(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<CreditsResponse>> {
    let cache_key = keys::user_credits(&user.email);

    if let Some(cached) = state.cache.get_json::<CreditsResponse>(&cache_key).await {
        return Ok(Json(cached));
    }

    let free_trials_left = state.credits.check_and_reset_trials(user.id).await?;
    let response = CreditsResponse {
        free_trials_left,
        is_expired: free_trials_left <= 0,
    };

    state.cache.set_json(&cache_key, &response, TTL_CREDITS).await;

    Ok(Json(response))
}

/// Current subscription tier.
#[utoipa::path(
    get,
    path = "/api/user/tier",
    tag = "user",
    responses(
        (status = 200, description = "Subscription tier", body = TierResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_tier(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<TierResponse>> {
    let cache_key = keys::user_tier(&user.email);

    if let Some(cached) = state.cache.get_json::<TierResponse>(&cache_key).await {
        return Ok(Json(cached));
    }

    let account = UserQueries::find_by_id(state.database.pool(), user.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let response = TierResponse { tier: account.tier };
    state.cache.set_json(&cache_key, &response, TTL_TIER).await;

    Ok(Json(response))
}

/// Profile card data for the account page.
#[utoipa::path(
    get,
    path = "/api/user/profile",
    tag = "user",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ProfileResponse>> {
    let cache_key = keys::user_profile(&user.email);

    if let Some(cached) = state.cache.get_json::<ProfileResponse>(&cache_key).await {
        return Ok(Json(cached));
    }

    let account = UserQueries::find_by_id(state.database.pool(), user.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let response = profile_of(&account);
    state.cache.set_json(&cache_key, &response, TTL_PROFILE).await;

    Ok(Json(response))
}

/// Renames the account and refreshes the cached profile.
#[utoipa::path(
    put,
    path = "/api/user/profile",
    tag = "user",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let account = UserQueries::update_name(state.database.pool(), &user.email, name)
        .await?
        .ok_or(AppError::Unauthorized)?;

    state.cache.delete(&[keys::user_profile(&user.email)]).await;

    Ok(Json(profile_of(&account)))
}

fn profile_of(account: &crate::models::User) -> ProfileResponse {
    let plan = if account.tier == TIER_PAID { "pro" } else { "free" };

    ProfileResponse {
        id: account.id.to_string(),
        name: account.name.clone().unwrap_or_default(),
        email: account.email.clone(),
        image: account.image.clone().unwrap_or_default(),
        plan: plan.to_string(),
        member_since: account.created_at.format("%b %Y").to_string(),
        plan_status: "active".to_string(),
        free_trials_left: account.free_trials_left,
        max_credits: account.max_credits,
    }
}

/// Per-day allowance that is either a number or uncapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DailyLimit {
    Limited(i64),
    Unlimited(String),
}

impl DailyLimit {
    fn unlimited() -> Self {
        DailyLimit::Unlimited("unlimited".to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanUsage {
    pub used: i64,
    pub total: i64,
    pub limit: DailyLimit,
    pub percentage: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlansResponse {
    pub plan: String,
    pub screenshots: PlanUsage,
    pub ai_chats: PlanUsage,
}

fn usage_percentage(used: i64, limit: &DailyLimit) -> i64 {
    match limit {
        DailyLimit::Limited(cap) if *cap > 0 => ((used * 100) / cap).min(100),
        _ => 0,
    }
}

/// Today's usage against the plan's daily allowances. Screenshot count comes
/// from rows created since UTC midnight; chat usage is credits spent out of
/// the ceiling.
#[utoipa::path(
    get,
    path = "/api/user/plans",
    tag = "user",
    responses(
        (status = 200, description = "Daily usage report"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_plans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<PlansResponse>> {
    let today = chrono::Utc::now().date_naive();
    let cache_key = keys::user_plans(&user.email, today);

    if let Some(cached) = state.cache.get_json::<PlansResponse>(&cache_key).await {
        return Ok(Json(cached));
    }

    let account = UserQueries::find_by_id(state.database.pool(), user.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let midnight = today.and_time(chrono::NaiveTime::MIN).and_utc();
    let screenshots_today =
        ScreenshotQueries::count_for_user_since(state.database.pool(), user.id, midnight).await?;
    let screenshots_total =
        ScreenshotQueries::count_for_user(state.database.pool(), user.id).await?;
    let chats_total = QuestionQueries::count_for_user(state.database.pool(), user.id).await?;

    let chats_used = i64::from(account.max_credits - account.free_trials_left).max(0);

    let is_pro = account.tier == TIER_PAID;
    let screenshot_limit = if is_pro {
        DailyLimit::unlimited()
    } else {
        DailyLimit::Limited(FREE_SCREENSHOTS_PER_DAY)
    };
    let chat_limit = if is_pro {
        DailyLimit::Limited(PRO_CHATS_PER_DAY)
    } else {
        DailyLimit::Limited(i64::from(account.max_credits))
    };

    let response = PlansResponse {
        plan: if is_pro { "pro" } else { "free" }.to_string(),
        screenshots: PlanUsage {
            used: screenshots_today,
            total: screenshots_total,
            percentage: usage_percentage(screenshots_today, &screenshot_limit),
            limit: screenshot_limit,
        },
        ai_chats: PlanUsage {
            used: chats_used,
            total: chats_total,
            percentage: usage_percentage(chats_used, &chat_limit),
            limit: chat_limit,
        },
    };

    state.cache.set_json(&cache_key, &response, TTL_PLANS).await;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_capped_at_100() {
        let limit = DailyLimit::Limited(5);
        assert_eq!(usage_percentage(3, &limit), 60);
        assert_eq!(usage_percentage(5, &limit), 100);
        assert_eq!(usage_percentage(12, &limit), 100);
    }

    #[test]
    fn unlimited_usage_reports_zero_percent() {
        assert_eq!(usage_percentage(1000, &DailyLimit::unlimited()), 0);
    }

    #[test]
    fn plan_usage_reports_daily_and_lifetime_counts() {
        let usage = PlanUsage {
            used: 3,
            total: 41,
            limit: DailyLimit::Limited(20),
            percentage: 15,
        };

        let value = serde_json::to_value(&usage).unwrap();
        assert_eq!(value["used"], 3);
        assert_eq!(value["total"], 41);
        assert_eq!(value["limit"], 20);
    }

    #[test]
    fn daily_limit_serializes_as_number_or_string() {
        assert_eq!(
            serde_json::to_string(&DailyLimit::Limited(20)).unwrap(),
            "20"
        );
        assert_eq!(
            serde_json::to_string(&DailyLimit::unlimited()).unwrap(),
            "\"unlimited\""
        );
    }
}
