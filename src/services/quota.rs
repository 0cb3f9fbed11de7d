use chrono::{DateTime, Datelike, TimeZone, Utc};
use sqlx::PgPool;

use crate::database::queries::UserQueries;
use crate::errors::{AppError, Result};
use crate::models::User;

/// Outcome of evaluating a user's monthly quota window against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaEvaluation {
    pub should_reset: bool,
    pub normalized_last_reset: DateTime<Utc>,
    pub next_reset: DateTime<Utc>,
}

fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .expect("first of month is a valid instant")
}

fn following_month_start(year: i32, month: u32) -> DateTime<Utc> {
    if month == 12 {
        month_start(year + 1, 1)
    } else {
        month_start(year, month + 1)
    }
}

/// Decide whether the monthly allowance rolls over. A reset is due when
/// `now` is in a strictly later (year, month) than the last reset; how many
/// months elapsed in between does not matter. `next_reset` is recomputed
/// from `now`'s month on every call.
pub fn evaluate(last_reset: Option<DateTime<Utc>>, now: DateTime<Utc>) -> QuotaEvaluation {
    let (year, month) = (now.year(), now.month());
    let next_reset = following_month_start(year, month);

    let Some(last) = last_reset else {
        // First use: anchor the window at the current month.
        return QuotaEvaluation {
            should_reset: true,
            normalized_last_reset: month_start(year, month),
            next_reset,
        };
    };

    let should_reset = (year, month) > (last.year(), last.month());

    QuotaEvaluation {
        should_reset,
        normalized_last_reset: if should_reset {
            month_start(year, month)
        } else {
            last
        },
        next_reset,
    }
}

/// Apply an evaluation to an in-memory user record. On rollover the counter
/// zeroes and both window fields are stamped; otherwise only
/// `next_quota_reset` is refreshed (covers rows that never had it set).
pub fn apply_reset(user: &User, evaluation: &QuotaEvaluation) -> User {
    let mut user = user.clone();
    if evaluation.should_reset {
        user.used_quota = 0;
        user.quota_reset_date = Some(evaluation.normalized_last_reset);
    }
    user.next_quota_reset = Some(evaluation.next_reset);
    user
}

/// Days until the next reset, rounded up. Display only, never used to gate.
pub fn days_until_reset(next_reset: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (next_reset - now).num_seconds();
    (seconds as f64 / 86_400.0).ceil() as i64
}

/// Roll the stored row forward to the current month. Called on every
/// login/register and before every quota-gated mutation, so a user returning
/// after months of inactivity is reset exactly once. The reset itself is a
/// conditional update keyed on the stored window, which keeps concurrent
/// sessions idempotent.
pub async fn normalize(pool: &PgPool, user: User, now: DateTime<Utc>) -> Result<User> {
    let evaluation = evaluate(user.quota_reset_date, now);

    if evaluation.should_reset {
        if let Some(updated) = UserQueries::apply_quota_reset(
            pool,
            user.id,
            evaluation.normalized_last_reset,
            evaluation.next_reset,
        )
        .await?
        {
            return Ok(updated);
        }
        // Another request already rolled this user forward; read it back.
        return UserQueries::find_by_id(pool, user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()));
    }

    if user.next_quota_reset != Some(evaluation.next_reset) {
        if let Some(updated) =
            UserQueries::refresh_next_reset(pool, user.id, evaluation.next_reset).await?
        {
            return Ok(updated);
        }
    }

    Ok(apply_reset(&user, &evaluation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single().unwrap()
    }

    fn user_with(last_reset: Option<DateTime<Utc>>, used: i32) -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "User".to_string(),
            role: crate::models::Role::Basic,
            request_quota: 3,
            used_quota: used,
            quota_reset_date: last_reset,
            next_quota_reset: None,
            created_at: ts(2024, 1, 1, 0),
            updated_at: ts(2024, 1, 1, 0),
        }
    }

    #[test]
    fn test_first_use_anchors_current_month() {
        let now = ts(2024, 3, 17, 9);
        let eval = evaluate(None, now);

        assert!(eval.should_reset);
        assert_eq!(eval.normalized_last_reset, ts(2024, 3, 1, 0));
        assert_eq!(eval.next_reset, ts(2024, 4, 1, 0));
    }

    #[test]
    fn test_same_month_does_not_reset() {
        let now = ts(2024, 3, 17, 9);
        let eval = evaluate(Some(ts(2024, 3, 1, 0)), now);

        assert!(!eval.should_reset);
        assert_eq!(eval.normalized_last_reset, ts(2024, 3, 1, 0));
        assert_eq!(eval.next_reset, ts(2024, 4, 1, 0));
    }

    #[test]
    fn test_month_rollover_resets() {
        // Reset stamped in March, evaluated in April.
        let eval = evaluate(Some(ts(2024, 3, 1, 0)), ts(2024, 4, 2, 12));

        assert!(eval.should_reset);
        assert_eq!(eval.normalized_last_reset, ts(2024, 4, 1, 0));
        assert_eq!(eval.next_reset, ts(2024, 5, 1, 0));
    }

    #[test]
    fn test_year_boundary_resets() {
        let eval = evaluate(Some(ts(2023, 12, 20, 0)), ts(2024, 1, 3, 0));

        assert!(eval.should_reset);
        assert_eq!(eval.normalized_last_reset, ts(2024, 1, 1, 0));
        assert_eq!(eval.next_reset, ts(2024, 2, 1, 0));
    }

    #[test]
    fn test_earlier_month_same_year_never_resets_backwards() {
        // A stored window ahead of the clock is left alone.
        let eval = evaluate(Some(ts(2024, 5, 1, 0)), ts(2024, 3, 10, 0));

        assert!(!eval.should_reset);
        assert_eq!(eval.normalized_last_reset, ts(2024, 5, 1, 0));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let last = Some(ts(2024, 2, 1, 0));
        let now = ts(2024, 4, 15, 8);

        assert_eq!(evaluate(last, now), evaluate(last, now));
    }

    #[test]
    fn test_long_inactivity_rolls_forward_once() {
        // Months of inactivity collapse into a single rollover to "now".
        let eval = evaluate(Some(ts(2023, 6, 1, 0)), ts(2024, 4, 10, 0));

        assert!(eval.should_reset);
        assert_eq!(eval.normalized_last_reset, ts(2024, 4, 1, 0));

        // Re-evaluating with the normalized window is then a no-op.
        let again = evaluate(Some(eval.normalized_last_reset), ts(2024, 4, 11, 0));
        assert!(!again.should_reset);
    }

    #[test]
    fn test_apply_reset_zeroes_counter_on_rollover() {
        let user = user_with(Some(ts(2024, 3, 1, 0)), 3);
        let eval = evaluate(user.quota_reset_date, ts(2024, 4, 2, 0));

        let updated = apply_reset(&user, &eval);
        assert_eq!(updated.used_quota, 0);
        assert_eq!(updated.quota_reset_date, Some(ts(2024, 4, 1, 0)));
        assert_eq!(updated.next_quota_reset, Some(ts(2024, 5, 1, 0)));
    }

    #[test]
    fn test_apply_reset_noop_on_current_user() {
        let user = user_with(Some(ts(2024, 4, 1, 0)), 2);
        let eval = evaluate(user.quota_reset_date, ts(2024, 4, 20, 0));

        let updated = apply_reset(&user, &eval);
        assert_eq!(updated.used_quota, 2);
        assert_eq!(updated.quota_reset_date, Some(ts(2024, 4, 1, 0)));
        // next_quota_reset is still refreshed for rows that never had it.
        assert_eq!(updated.next_quota_reset, Some(ts(2024, 5, 1, 0)));
    }

    #[test]
    fn test_days_until_reset_rounds_up() {
        let next = ts(2024, 5, 1, 0);
        assert_eq!(days_until_reset(next, ts(2024, 4, 30, 0)), 1);
        assert_eq!(days_until_reset(next, ts(2024, 4, 29, 12)), 2);
        assert_eq!(days_until_reset(next, ts(2024, 4, 1, 0)), 30);
        assert_eq!(days_until_reset(next, next), 0);
    }
}
