use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use handlers::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        .route("/api/auth/google", post(handlers::auth::google_sign_in))
        .route("/api/auth/session", get(handlers::auth::session))
        .route("/api/analyze", post(handlers::analyze::analyze))
        .route(
            "/api/screenshots",
            post(handlers::screenshots::create_screenshot)
                .get(handlers::screenshots::list_screenshots),
        )
        .route(
            "/api/screenshots/:id",
            get(handlers::screenshots::get_screenshot)
                .delete(handlers::screenshots::delete_screenshot),
        )
        .route(
            "/api/questions",
            post(handlers::questions::create_question).get(handlers::questions::list_questions),
        )
        .route(
            "/api/questions/:id",
            delete(handlers::questions::delete_question),
        )
        .route("/api/user/credits", get(handlers::user::get_credits))
        .route("/api/user/tier", get(handlers::user::get_tier))
        .route(
            "/api/user/profile",
            get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        .route("/api/user/plans", get(handlers::user::get_plans))
        .route(
            "/api/payment/create-order",
            post(handlers::payments::create_order),
        )
        .route("/api/payment/verify", get(handlers::payments::verify_payment))
        .route(
            "/api/payment/webhook",
            post(handlers::payments::payment_webhook),
        )
        .merge(handlers::docs::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
