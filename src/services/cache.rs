use chrono::NaiveDate;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::services::redis::RedisService;

pub const TTL_LIST: Duration = Duration::from_secs(120);
pub const TTL_CREDITS: Duration = Duration::from_secs(300);
pub const TTL_PROFILE: Duration = Duration::from_secs(3600);
pub const TTL_TIER: Duration = Duration::from_secs(3600);
pub const TTL_PLANS: Duration = Duration::from_secs(900);

/// Deterministic cache key derivation. Every read and invalidation path goes
/// through these helpers so reads and writes can never disagree on a key.
pub mod keys {
    use super::*;

    pub fn user_screenshots(user_id: Uuid) -> String {
        format!("user:screenshots:{}", user_id)
    }

    pub fn screenshot_details(screenshot_id: Uuid) -> String {
        format!("screenshot:{}:details", screenshot_id)
    }

    pub fn user_questions_all(user_id: Uuid) -> String {
        format!("user:questions:{}:all", user_id)
    }

    pub fn user_questions_for_screenshot(user_id: Uuid, screenshot_id: Uuid) -> String {
        format!("user:questions:{}:screenshot:{}", user_id, screenshot_id)
    }

    pub fn user_credits(email: &str) -> String {
        format!("user:credits:{}", email)
    }

    pub fn user_profile(email: &str) -> String {
        format!("user:profile:{}", email)
    }

    pub fn user_tier(email: &str) -> String {
        format!("user:tier:{}", email)
    }

    /// Usage stats change daily, so the key is scoped to an explicit date.
    pub fn user_plans(email: &str, date: NaiveDate) -> String {
        format!("user:plans:{}:{}", email, date.format("%Y-%m-%d"))
    }
}

/// Best-effort JSON cache in front of Postgres. Every error is logged and
/// swallowed; callers always fall back to the store.
#[derive(Clone)]
pub struct CacheService {
    redis: RedisService,
}

impl CacheService {
    pub fn new(redis: RedisService) -> Self {
        Self { redis }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.redis.connection_manager().clone();
        let payload: Option<String> = match conn.get(key).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Redis error: {}", e);
                return None;
            }
        };

        let payload = payload?;
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                // Unexpected shape: drop the entry rather than serve it.
                tracing::error!("Error parsing cached data for {}: {}", key, e);
                self.delete(&[key.to_string()]).await;
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize cache payload for {}: {}", key, e);
                return;
            }
        };

        let mut conn = self.redis.connection_manager().clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(key, payload, ttl.as_secs())
            .await
        {
            tracing::error!("Redis error: {}", e);
        }
    }

    pub async fn delete(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }

        let mut conn = self.redis.connection_manager().clone();
        if let Err(e) = conn.del::<_, ()>(keys).await {
            tracing::error!("Redis error: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn keys_are_deterministic_per_resource() {
        let user_id = Uuid::parse_str("6f2b9f3e-55a4-4c8e-8a5e-0d6c1b2a3c4d").unwrap();
        let screenshot_id = Uuid::parse_str("0e1d2c3b-4a59-4687-9576-84736251403f").unwrap();

        assert_eq!(
            keys::user_screenshots(user_id),
            "user:screenshots:6f2b9f3e-55a4-4c8e-8a5e-0d6c1b2a3c4d"
        );
        assert_eq!(
            keys::screenshot_details(screenshot_id),
            "screenshot:0e1d2c3b-4a59-4687-9576-84736251403f:details"
        );
        assert_eq!(
            keys::user_questions_all(user_id),
            "user:questions:6f2b9f3e-55a4-4c8e-8a5e-0d6c1b2a3c4d:all"
        );
        assert_eq!(
            keys::user_questions_for_screenshot(user_id, screenshot_id),
            "user:questions:6f2b9f3e-55a4-4c8e-8a5e-0d6c1b2a3c4d:screenshot:0e1d2c3b-4a59-4687-9576-84736251403f"
        );
    }

    #[test]
    fn email_keys_embed_the_email() {
        assert_eq!(keys::user_credits("a@b.co"), "user:credits:a@b.co");
        assert_eq!(keys::user_profile("a@b.co"), "user:profile:a@b.co");
        assert_eq!(keys::user_tier("a@b.co"), "user:tier:a@b.co");
    }

    #[test]
    fn plans_key_is_scoped_to_the_given_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(
            keys::user_plans("a@b.co", date),
            "user:plans:a@b.co:2025-03-09"
        );

        // Same user, different day: different bucket.
        let next_day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_ne!(
            keys::user_plans("a@b.co", date),
            keys::user_plans("a@b.co", next_day)
        );
    }
}
