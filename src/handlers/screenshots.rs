use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    database::queries::{QuestionQueries, ScreenshotQueries},
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        CreateScreenshotRequest, ScreenshotDetailsResponse, ScreenshotListResponse,
    },
    services::cache::{keys, TTL_LIST},
};

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stores a screenshot record. The image payload is hashed so resubmitting
/// the same capture returns the existing row instead of a duplicate.
#[utoipa::path(
    post,
    path = "/api/screenshots",
    tag = "screenshots",
    request_body = CreateScreenshotRequest,
    responses(
        (status = 201, description = "Screenshot stored"),
        (status = 200, description = "Screenshot already existed"),
        (status = 400, description = "Missing image data"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_screenshot(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateScreenshotRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    if request.image_url.trim().is_empty() {
        return Err(AppError::Validation("imageUrl is required".to_string()));
    }

    let image_sha256 = sha256_hex(&request.image_url);

    if let Some(existing) =
        ScreenshotQueries::find_by_user_and_sha(state.database.pool(), user.id, &image_sha256)
            .await?
    {
        return Ok((
            StatusCode::OK,
            Json(json!({ "screenshot": existing, "deduplicated": true })),
        ));
    }

    let screenshot =
        ScreenshotQueries::create(state.database.pool(), user.id, &request.image_url, &image_sha256)
            .await?;

    state
        .cache
        .delete(&[keys::user_screenshots(user.id)])
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "screenshot": screenshot, "deduplicated": false })),
    ))
}

/// Lists the caller's screenshots, newest first, through the cache.
#[utoipa::path(
    get,
    path = "/api/screenshots",
    tag = "screenshots",
    responses(
        (status = 200, description = "Screenshot list"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_screenshots(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ScreenshotListResponse>> {
    let cache_key = keys::user_screenshots(user.id);

    if let Some(cached) = state.cache.get_json::<ScreenshotListResponse>(&cache_key).await {
        return Ok(Json(cached));
    }

    let screenshots = ScreenshotQueries::list_for_user(state.database.pool(), user.id).await?;
    let response = ScreenshotListResponse { screenshots };

    state.cache.set_json(&cache_key, &response, TTL_LIST).await;

    Ok(Json(response))
}

/// Fetches one screenshot with its question history.
#[utoipa::path(
    get,
    path = "/api/screenshots/{id}",
    tag = "screenshots",
    params(("id" = Uuid, Path, description = "Screenshot id")),
    responses(
        (status = 200, description = "Screenshot with questions"),
        (status = 401, description = "Not the owner"),
        (status = 404, description = "Screenshot not found")
    )
)]
pub async fn get_screenshot(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ScreenshotDetailsResponse>> {
    let cache_key = keys::screenshot_details(id);

    if let Some(cached) = state
        .cache
        .get_json::<ScreenshotDetailsResponse>(&cache_key)
        .await
    {
        if cached.screenshot.user_id != user.id {
            return Err(AppError::Unauthorized);
        }
        return Ok(Json(cached));
    }

    let screenshot = ScreenshotQueries::find_by_id(state.database.pool(), id)
        .await?
        .ok_or(AppError::NotFound("Screenshot"))?;

    if screenshot.user_id != user.id {
        return Err(AppError::Unauthorized);
    }

    let questions = QuestionQueries::list_for_screenshot(state.database.pool(), id).await?;
    let response = ScreenshotDetailsResponse {
        screenshot,
        questions,
    };

    state.cache.set_json(&cache_key, &response, TTL_LIST).await;

    Ok(Json(response))
}

/// Deletes a screenshot and every question asked against it.
#[utoipa::path(
    delete,
    path = "/api/screenshots/{id}",
    tag = "screenshots",
    params(("id" = Uuid, Path, description = "Screenshot id")),
    responses(
        (status = 200, description = "Screenshot deleted"),
        (status = 401, description = "Not the owner"),
        (status = 404, description = "Screenshot not found")
    )
)]
pub async fn delete_screenshot(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let screenshot = ScreenshotQueries::find_by_id(state.database.pool(), id)
        .await?
        .ok_or(AppError::NotFound("Screenshot"))?;

    if screenshot.user_id != user.id {
        return Err(AppError::Unauthorized);
    }

    QuestionQueries::delete_for_screenshot(state.database.pool(), id).await?;
    ScreenshotQueries::delete(state.database.pool(), id).await?;

    let today = chrono::Utc::now().date_naive();
    state
        .cache
        .delete(&[
            keys::screenshot_details(id),
            keys::user_screenshots(user.id),
            keys::user_questions_all(user.id),
            keys::user_questions_for_screenshot(user.id, id),
            keys::user_plans(&user.email, today),
        ])
        .await;

    tracing::info!("Deleted screenshot {} for user {}", id, user.email);

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_is_stable() {
        let a = sha256_hex("data:image/png;base64,AAAA");
        let b = sha256_hex("data:image/png;base64,AAAA");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn sha256_hex_differs_per_input() {
        assert_ne!(sha256_hex("one"), sha256_hex("two"));
    }
}
