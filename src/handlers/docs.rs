use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::{
    CreateQuestionRequest, CreateScreenshotRequest, CreditsResponse, ProfileResponse,
    TierResponse, UpdateProfileRequest,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::liveness,
        handlers::health::readiness,
        handlers::auth::google_sign_in,
        handlers::auth::session,
        handlers::analyze::analyze,
        handlers::screenshots::create_screenshot,
        handlers::screenshots::list_screenshots,
        handlers::screenshots::get_screenshot,
        handlers::screenshots::delete_screenshot,
        handlers::questions::create_question,
        handlers::questions::list_questions,
        handlers::questions::delete_question,
        handlers::user::get_credits,
        handlers::user::get_tier,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::get_plans,
        handlers::payments::create_order,
        handlers::payments::verify_payment,
        handlers::payments::payment_webhook,
    ),
    components(schemas(
        handlers::auth::GoogleSignInRequest,
        handlers::analyze::AnalyzeRequest,
        handlers::payments::WebhookPayload,
        CreateScreenshotRequest,
        CreateQuestionRequest,
        CreditsResponse,
        TierResponse,
        ProfileResponse,
        UpdateProfileRequest,
    )),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "auth", description = "Google sign-in and sessions"),
        (name = "analyze", description = "Screenshot question answering"),
        (name = "screenshots", description = "Screenshot storage"),
        (name = "questions", description = "Question history"),
        (name = "user", description = "Account, credits and usage"),
        (name = "payments", description = "Pro plan checkout")
    ),
    info(
        title = "AskShot API",
        description = "Screenshot capture and AI-powered visual Q&A service"
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
