use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::queries::{QuestionQueries, ScreenshotQueries},
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{CreateQuestionRequest, QuestionListQuery, QuestionListResponse},
    services::cache::{keys, TTL_LIST},
};

/// Records a question against a screenshot the caller owns. The answer is
/// filled in separately by the analyze flow.
#[utoipa::path(
    post,
    path = "/api/questions",
    tag = "questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question recorded"),
        (status = 400, description = "Missing question text"),
        (status = 401, description = "Not the screenshot owner"),
        (status = 404, description = "Screenshot not found")
    )
)]
pub async fn create_question(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    if request.question.trim().is_empty() {
        return Err(AppError::Validation("question is required".to_string()));
    }

    let screenshot = ScreenshotQueries::find_by_id(state.database.pool(), request.screenshot_id)
        .await?
        .ok_or(AppError::NotFound("Screenshot"))?;

    if screenshot.user_id != user.id {
        return Err(AppError::Unauthorized);
    }

    let question = QuestionQueries::create(
        state.database.pool(),
        user.id,
        request.screenshot_id,
        &request.question,
        None,
    )
    .await?;

    state
        .cache
        .delete(&[
            keys::user_questions_all(user.id),
            keys::user_questions_for_screenshot(user.id, request.screenshot_id),
            keys::screenshot_details(request.screenshot_id),
        ])
        .await;

    Ok((StatusCode::CREATED, Json(json!({ "question": question }))))
}

/// Lists the caller's questions, optionally filtered to one screenshot.
#[utoipa::path(
    get,
    path = "/api/questions",
    tag = "questions",
    params(("screenshotId" = Option<Uuid>, Query, description = "Restrict to one screenshot")),
    responses(
        (status = 200, description = "Question list"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_questions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<QuestionListQuery>,
) -> Result<Json<QuestionListResponse>> {
    let cache_key = match query.screenshot_id {
        Some(screenshot_id) => keys::user_questions_for_screenshot(user.id, screenshot_id),
        None => keys::user_questions_all(user.id),
    };

    if let Some(cached) = state.cache.get_json::<QuestionListResponse>(&cache_key).await {
        return Ok(Json(cached));
    }

    let questions = match query.screenshot_id {
        Some(screenshot_id) => {
            QuestionQueries::list_for_user_and_screenshot(
                state.database.pool(),
                user.id,
                screenshot_id,
            )
            .await?
        }
        None => QuestionQueries::list_for_user(state.database.pool(), user.id).await?,
    };

    let response = QuestionListResponse { questions };
    state.cache.set_json(&cache_key, &response, TTL_LIST).await;

    Ok(Json(response))
}

/// Deletes one question.
#[utoipa::path(
    delete,
    path = "/api/questions/{id}",
    tag = "questions",
    params(("id" = Uuid, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question deleted"),
        (status = 401, description = "Not the owner"),
        (status = 404, description = "Question not found")
    )
)]
pub async fn delete_question(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let question = QuestionQueries::find_by_id(state.database.pool(), id)
        .await?
        .ok_or(AppError::NotFound("Question"))?;

    if question.user_id != user.id {
        return Err(AppError::Unauthorized);
    }

    QuestionQueries::delete(state.database.pool(), id).await?;

    let today = chrono::Utc::now().date_naive();
    state
        .cache
        .delete(&[
            keys::user_questions_all(user.id),
            keys::user_questions_for_screenshot(user.id, question.screenshot_id),
            keys::screenshot_details(question.screenshot_id),
            keys::user_plans(&user.email, today),
        ])
        .await;

    Ok(Json(json!({ "success": true })))
}
