use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::{
    auth::JwtService,
    database::queries::UserQueries,
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::User,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSignInRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image: String,
    pub role: String,
    pub tier: String,
    pub free_trials_left: i32,
    pub next_trial_reset: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            name: user.name.unwrap_or_default(),
            image: user.image.unwrap_or_default(),
            role: user.role,
            tier: user.tier,
            free_trials_left: user.free_trials_left,
            next_trial_reset: Some(user.next_trial_reset),
        }
    }
}

/// Exchanges a Google ID token for a server session. First sign-in creates
/// the user with free-tier defaults and fires the welcome email.
#[utoipa::path(
    post,
    path = "/api/auth/google",
    tag = "auth",
    request_body = GoogleSignInRequest,
    responses(
        (status = 200, description = "Session token issued"),
        (status = 401, description = "ID token rejected")
    )
)]
pub async fn google_sign_in(
    State(state): State<AppState>,
    Json(request): Json<GoogleSignInRequest>,
) -> Result<Json<serde_json::Value>> {
    let profile = state.google.verify_id_token(&request.id_token).await?;

    let user = match UserQueries::find_by_email(state.database.pool(), &profile.email).await? {
        Some(user) => {
            if user.google_id.is_none() {
                UserQueries::set_google_id(state.database.pool(), user.id, &profile.sub).await?;
            }
            user
        }
        None => {
            let user = UserQueries::create_google_user(
                state.database.pool(),
                &profile.email,
                profile.name.as_deref(),
                profile.picture.as_deref(),
                &profile.sub,
            )
            .await?;

            tracing::info!("Created user {} on first sign-in", user.email);

            let email_service = state.email.clone();
            let name = user.name.clone().unwrap_or_default();
            let address = user.email.clone();
            tokio::spawn(async move {
                email_service.send_welcome(&name, &address).await;
            });

            user
        }
    };

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let token = jwt_service.generate_session_token(user.id, &user.email)?;

    Ok(Json(json!({
        "token": token,
        "user": SessionUser::from(user)
    })))
}

/// Returns the current session, applying the daily credit reset first so the
/// reported balance is never stale across a reset boundary.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "Current session"),
        (status = 401, description = "No valid session")
    )
)]
pub async fn session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>> {
    state.credits.check_and_reset_trials(user.id).await?;

    let user = UserQueries::find_by_id(state.database.pool(), user.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(json!({
        "authenticated": true,
        "user": SessionUser::from(user)
    })))
}
