use crate::{
    auth::GoogleVerifier,
    config::Config,
    database::Database,
    services::{
        cache::CacheService, credits::CreditLedger, email::EmailService,
        payments::PaymentGateway, redis::RedisService, vision::VisionClient,
    },
};

pub mod analyze;
pub mod auth;
pub mod docs;
pub mod health;
pub mod payments;
pub mod questions;
pub mod screenshots;
pub mod user;

#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub redis: RedisService,
    pub cache: CacheService,
    pub credits: CreditLedger,
    pub vision: VisionClient,
    pub payments: PaymentGateway,
    pub email: EmailService,
    pub google: GoogleVerifier,
    pub config: Config,
}
