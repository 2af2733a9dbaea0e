use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{max_credits_for_tier, Order, Question, Screenshot, User, TIER_FREE};

const USER_COLUMNS: &str = "id, email, name, image, google_id, role, tier, free_trials_left, \
     max_credits, next_trial_reset, created_at, updated_at";

pub struct UserQueries;

impl UserQueries {
    pub async fn create_google_user(
        pool: &PgPool,
        email: &str,
        name: Option<&str>,
        image: Option<&str>,
        google_id: &str,
    ) -> Result<User> {
        let max_credits = max_credits_for_tier(TIER_FREE);
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, image, google_id, role, tier, free_trials_left, max_credits, next_trial_reset)
            VALUES ($1, $2, $3, $4, 'user', $5, $6, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(name)
        .bind(image)
        .bind(google_id)
        .bind(TIER_FREE)
        .bind(max_credits)
        .bind(Utc::now() + Duration::hours(24))
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn set_google_id(pool: &PgPool, id: Uuid, google_id: &str) -> Result<()> {
        sqlx::query("UPDATE users SET google_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(google_id)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn update_name(pool: &PgPool, email: &str, name: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $1, updated_at = NOW() WHERE email = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn update_trials(
        pool: &PgPool,
        id: Uuid,
        free_trials_left: i32,
        next_trial_reset: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET free_trials_left = $1, next_trial_reset = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(free_trials_left)
        .bind(next_trial_reset)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn set_free_trials_left(pool: &PgPool, id: Uuid, free_trials_left: i32) -> Result<()> {
        sqlx::query("UPDATE users SET free_trials_left = $1, updated_at = NOW() WHERE id = $2")
            .bind(free_trials_left)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Moves the user onto a new tier and re-syncs the credit ceiling,
    /// refilling the balance to the new ceiling.
    pub async fn set_tier(pool: &PgPool, id: Uuid, tier: &str) -> Result<()> {
        let max_credits = max_credits_for_tier(tier);
        sqlx::query(
            "UPDATE users SET tier = $1, max_credits = $2, free_trials_left = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(tier)
        .bind(max_credits)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }
}

const SCREENSHOT_COLUMNS: &str = "id, user_id, image_url, image_sha256, created_at";

pub struct ScreenshotQueries;

impl ScreenshotQueries {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        image_url: &str,
        image_sha256: &str,
    ) -> Result<Screenshot> {
        let screenshot = sqlx::query_as::<_, Screenshot>(&format!(
            r#"
            INSERT INTO screenshots (user_id, image_url, image_sha256)
            VALUES ($1, $2, $3)
            RETURNING {SCREENSHOT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(image_url)
        .bind(image_sha256)
        .fetch_one(pool)
        .await?;

        Ok(screenshot)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Screenshot>> {
        let screenshot = sqlx::query_as::<_, Screenshot>(&format!(
            "SELECT {SCREENSHOT_COLUMNS} FROM screenshots WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(screenshot)
    }

    pub async fn find_by_user_and_sha(
        pool: &PgPool,
        user_id: Uuid,
        image_sha256: &str,
    ) -> Result<Option<Screenshot>> {
        let screenshot = sqlx::query_as::<_, Screenshot>(&format!(
            "SELECT {SCREENSHOT_COLUMNS} FROM screenshots WHERE user_id = $1 AND image_sha256 = $2"
        ))
        .bind(user_id)
        .bind(image_sha256)
        .fetch_optional(pool)
        .await?;

        Ok(screenshot)
    }

    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Screenshot>> {
        let screenshots = sqlx::query_as::<_, Screenshot>(&format!(
            "SELECT {SCREENSHOT_COLUMNS} FROM screenshots WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(screenshots)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM screenshots WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM screenshots WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    pub async fn count_for_user_since(
        pool: &PgPool,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM screenshots WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

const QUESTION_COLUMNS: &str = "id, user_id, screenshot_id, question, answer, created_at";

pub struct QuestionQueries;

impl QuestionQueries {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        screenshot_id: Uuid,
        question: &str,
        answer: Option<&str>,
    ) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(&format!(
            r#"
            INSERT INTO questions (user_id, screenshot_id, question, answer)
            VALUES ($1, $2, $3, $4)
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(screenshot_id)
        .bind(question)
        .bind(answer)
        .fetch_one(pool)
        .await?;

        Ok(question)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(question)
    }

    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(questions)
    }

    pub async fn list_for_screenshot(
        pool: &PgPool,
        screenshot_id: Uuid,
    ) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE screenshot_id = $1 ORDER BY created_at DESC"
        ))
        .bind(screenshot_id)
        .fetch_all(pool)
        .await?;

        Ok(questions)
    }

    pub async fn list_for_user_and_screenshot(
        pool: &PgPool,
        user_id: Uuid,
        screenshot_id: Uuid,
    ) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            r#"
            SELECT {QUESTION_COLUMNS} FROM questions
            WHERE user_id = $1 AND screenshot_id = $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .bind(screenshot_id)
        .fetch_all(pool)
        .await?;

        Ok(questions)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn delete_for_screenshot(pool: &PgPool, screenshot_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM questions WHERE screenshot_id = $1")
            .bind(screenshot_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

const ORDER_COLUMNS: &str =
    "id, user_id, order_id, amount, currency, status, payment_reference, plan_type, period, created_at, updated_at";

pub struct OrderQueries;

impl OrderQueries {
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        order_id: &str,
        amount: i64,
        currency: &str,
        status: &str,
        plan_type: &str,
        period: &str,
    ) -> Result<Order> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (user_id, order_id, amount, currency, status, plan_type, period)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(order_id)
        .bind(amount)
        .bind(currency)
        .bind(status)
        .bind(plan_type)
        .bind(period)
        .fetch_one(pool)
        .await?;

        Ok(order)
    }

    pub async fn find_by_order_id(pool: &PgPool, order_id: &str) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    pub async fn mark_paid(
        pool: &PgPool,
        order_id: &str,
        payment_reference: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE orders SET status = $1, payment_reference = $2, updated_at = NOW() WHERE order_id = $3",
        )
        .bind(crate::models::ORDER_STATUS_PAID)
        .bind(payment_reference)
        .bind(order_id)
        .execute(pool)
        .await?;

        Ok(())
    }
}
