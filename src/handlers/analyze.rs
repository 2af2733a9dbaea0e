use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    database::queries::{QuestionQueries, ScreenshotQueries, UserQueries},
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::Screenshot,
    services::{
        cache::keys,
        vision::{clean_base64_image, image_media_type, validate_base64_image},
    },
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub image: String,
    pub question: String,
    pub screenshot_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub answer: String,
    pub status: &'static str,
    pub screenshot_id: Uuid,
    pub free_trials_left: i32,
    pub is_expired: bool,
}

/// Core Q&A flow: gate on remaining credits, ask the vision model, persist
/// the screenshot and the answered question, then spend one credit.
///
/// The quota gate runs before the vendor call so an exhausted user never
/// costs us an API request.
#[utoipa::path(
    post,
    path = "/api/analyze",
    tag = "analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Answer produced"),
        (status = 400, description = "Image payload rejected"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "No credits left"),
        (status = 503, description = "Vision vendor overloaded")
    )
)]
pub async fn analyze(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<serde_json::Value>> {
    let account = UserQueries::find_by_id(state.database.pool(), user.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    check_quota(account.free_trials_left)?;

    if !validate_base64_image(&request.image) {
        return Err(AppError::Validation(
            "image must be a base64-encoded PNG, JPEG, GIF or WebP".to_string(),
        ));
    }

    let media_type = image_media_type(&request.image);
    let image_data = clean_base64_image(&request.image);

    let answer = state
        .vision
        .analyze(&media_type, image_data, &request.question)
        .await?;

    let (screenshot, is_new) = resolve_screenshot(&state, user.id, &request).await?;

    QuestionQueries::create(
        state.database.pool(),
        user.id,
        screenshot.id,
        &request.question,
        Some(&answer),
    )
    .await?;

    let free_trials_left = state.credits.use_free_trial(user.id).await?;

    let today = chrono::Utc::now().date_naive();
    let mut stale = vec![
        keys::user_questions_all(user.id),
        keys::user_questions_for_screenshot(user.id, screenshot.id),
        keys::screenshot_details(screenshot.id),
        keys::user_credits(&user.email),
        keys::user_plans(&user.email, today),
    ];
    if is_new {
        stale.push(keys::user_screenshots(user.id));
    }
    state.cache.delete(&stale).await;

    tracing::info!(
        "Answered question on screenshot {} for {} ({} credits left)",
        screenshot.id,
        user.email,
        free_trials_left
    );

    let response = AnalyzeResponse {
        answer,
        status: "success",
        screenshot_id: screenshot.id,
        free_trials_left,
        is_expired: free_trials_left <= 0,
    };

    Ok(Json(json!(response)))
}

/// Gate applied before any vendor request is built: an exhausted balance
/// stops the flow with no API call and no Question row.
fn check_quota(free_trials_left: i32) -> Result<()> {
    if free_trials_left <= 0 {
        return Err(AppError::QuotaExhausted);
    }
    Ok(())
}

/// Picks the screenshot row the answer should attach to: the explicit id if
/// the caller owns it, an existing row with the same image hash, or a fresh
/// insert. The flag reports whether a row was created.
async fn resolve_screenshot(
    state: &AppState,
    user_id: Uuid,
    request: &AnalyzeRequest,
) -> Result<(Screenshot, bool)> {
    if let Some(id) = request.screenshot_id {
        if let Some(screenshot) = ScreenshotQueries::find_by_id(state.database.pool(), id).await? {
            if screenshot.user_id != user_id {
                return Err(AppError::Unauthorized);
            }
            return Ok((screenshot, false));
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(request.image.as_bytes());
    let image_sha256 = format!("{:x}", hasher.finalize());

    if let Some(existing) =
        ScreenshotQueries::find_by_user_and_sha(state.database.pool(), user_id, &image_sha256)
            .await?
    {
        return Ok((existing, false));
    }

    let created =
        ScreenshotQueries::create(state.database.pool(), user_id, &request.image, &image_sha256)
            .await?;

    Ok((created, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vision::VisionClient;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn quota_gate_rejects_exhausted_balance() {
        assert!(matches!(check_quota(0), Err(AppError::QuotaExhausted)));
        assert!(matches!(check_quota(-1), Err(AppError::QuotaExhausted)));
        assert!(check_quota(1).is_ok());
    }

    // Mirrors the handler's ordering: the gate runs first, so an exhausted
    // user produces zero requests to the vision vendor.
    #[tokio::test]
    async fn exhausted_user_never_reaches_the_vendor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let vision = VisionClient::new(
            server.uri(),
            "test-key".to_string(),
            "test-model".to_string(),
            Duration::from_millis(1),
        );

        let gate = check_quota(0);
        if gate.is_ok() {
            let _ = vision.analyze("image/png", "aGVsbG8=", "q").await;
        }

        assert!(matches!(gate, Err(AppError::QuotaExhausted)));
    }

    #[test]
    fn request_accepts_camel_case_fields() {
        let request: AnalyzeRequest = serde_json::from_str(
            r#"{
                "image": "data:image/png;base64,aGVsbG8=",
                "question": "What does this form do?",
                "screenshotId": "6f2b9f3e-55a4-4c8e-8a5e-0d6c1b2a3c4d"
            }"#,
        )
        .unwrap();

        assert!(request.screenshot_id.is_some());
        assert_eq!(request.question, "What does this form do?");
    }

    #[test]
    fn request_works_without_screenshot_id() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{ "image": "aGVsbG8=", "question": "q" }"#).unwrap();
        assert!(request.screenshot_id.is_none());
    }

    #[test]
    fn response_reports_expiry_in_camel_case() {
        let response = AnalyzeResponse {
            answer: "A login form.".to_string(),
            status: "success",
            screenshot_id: Uuid::nil(),
            free_trials_left: 0,
            is_expired: true,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["freeTrialsLeft"], 0);
        assert_eq!(value["isExpired"], true);
        assert!(value["screenshotId"].is_string());
    }
}
