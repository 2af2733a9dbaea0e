use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    database::{queries::UserQueries, Database},
    errors::{AppError, Result},
    services::cache::{keys, CacheService},
};

/// Advances a reset deadline past `now` by whole 24-hour intervals,
/// preserving the time-of-day anchor of the original deadline. Returns the
/// deadline unchanged when it is still in the future.
pub fn advance_reset(next_reset: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now < next_reset {
        return next_reset;
    }

    let interval_secs = Duration::hours(24).num_seconds();
    let elapsed = now - next_reset;
    let intervals_passed = elapsed.num_seconds().div_euclid(interval_secs) + 1;

    next_reset + Duration::hours(24 * intervals_passed)
}

/// Per-user remaining-credits bookkeeping over the users table.
///
/// Concurrent decrements from parallel requests are not serialized; two
/// racing requests can each observe the same balance.
#[derive(Clone)]
pub struct CreditLedger {
    database: Database,
    cache: CacheService,
}

impl CreditLedger {
    pub fn new(database: Database, cache: CacheService) -> Self {
        Self { database, cache }
    }

    /// Refills credits when the reset deadline has passed and reschedules
    /// the next deadline. Returns the up-to-date balance.
    pub async fn check_and_reset_trials(&self, user_id: Uuid) -> Result<i32> {
        let user = UserQueries::find_by_id(self.database.pool(), user_id)
            .await?
            .ok_or(AppError::NotFound("User"))?;

        let now = Utc::now();
        if now < user.next_trial_reset {
            return Ok(user.free_trials_left);
        }

        let next_reset = advance_reset(user.next_trial_reset, now);
        UserQueries::update_trials(self.database.pool(), user_id, user.max_credits, next_reset)
            .await?;

        self.cache
            .delete(&[
                keys::user_credits(&user.email),
                keys::user_plans(&user.email, now.date_naive()),
            ])
            .await;

        tracing::info!(
            "Reset credits for {} to {} (next reset {})",
            user.email,
            user.max_credits,
            next_reset
        );

        Ok(user.max_credits)
    }

    /// Spends one credit if any remain. Applies the reset check first and
    /// never lets the balance go negative. Returns the remaining balance.
    pub async fn use_free_trial(&self, user_id: Uuid) -> Result<i32> {
        self.check_and_reset_trials(user_id).await?;

        let user = UserQueries::find_by_id(self.database.pool(), user_id)
            .await?
            .ok_or(AppError::NotFound("User"))?;

        if user.free_trials_left <= 0 {
            return Ok(0);
        }

        let remaining = user.free_trials_left - 1;
        UserQueries::set_free_trials_left(self.database.pool(), user_id, remaining).await?;

        Ok(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn deadline_in_the_future_is_untouched() {
        let next = at(2025, 3, 10, 9, 0);
        let now = at(2025, 3, 10, 8, 59);
        assert_eq!(advance_reset(next, now), next);
    }

    #[test]
    fn advances_by_whole_intervals_preserving_anchor() {
        // next = T, now = T + 2.5 days => next becomes T + 3 days
        let next = at(2025, 3, 10, 9, 0);
        let now = next + Duration::hours(60);
        assert_eq!(advance_reset(next, now), at(2025, 3, 13, 9, 0));
    }

    #[test]
    fn deadline_exactly_now_advances_one_interval() {
        let next = at(2025, 3, 10, 9, 0);
        assert_eq!(advance_reset(next, next), at(2025, 3, 11, 9, 0));
    }

    #[test]
    fn just_past_deadline_advances_one_interval() {
        let next = at(2025, 3, 10, 9, 0);
        let now = next + Duration::minutes(1);
        assert_eq!(advance_reset(next, now), at(2025, 3, 11, 9, 0));
    }

    #[test]
    fn long_absence_lands_on_the_next_future_anchor() {
        let next = at(2025, 3, 10, 9, 0);
        let now = next + Duration::days(30) + Duration::hours(23);
        let advanced = advance_reset(next, now);

        assert!(advanced > now);
        assert!(advanced - now <= Duration::hours(24));
        // Anchor time-of-day is preserved.
        assert_eq!(advanced, at(2025, 4, 10, 9, 0));
    }
}
