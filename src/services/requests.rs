use sqlx::PgPool;

use crate::database::queries::{RequestQueries, UserQueries};
use crate::errors::{AppError, Result};
use crate::models::{CreateRequestRequest, PromptRequest, User};

/// Admission check for a new prompt request. Expects a quota-normalized
/// user; a stale window would under- or over-count.
pub fn can_submit(user: &User) -> bool {
    user.request_quota - user.used_quota > 0
}

/// Create a pending prompt request and consume one unit of the owner's
/// monthly quota, atomically.
///
/// The admission check is the conditional increment itself
/// (`used_quota < request_quota`), so two concurrent submissions for the
/// same user cannot both pass on the last remaining unit. If the increment
/// touches no row the quota is exhausted and nothing is written; if the
/// insert fails afterwards the transaction rolls the increment back. Either
/// way the caller may retry with an unchanged quota state.
pub async fn submit(pool: &PgPool, draft: &CreateRequestRequest) -> Result<PromptRequest> {
    let mut tx = pool.begin().await?;

    let consumed = UserQueries::consume_quota(&mut tx, draft.user_id).await?;
    if consumed == 0 {
        return Err(AppError::QuotaExceeded("Request quota exceeded".to_string()));
    }

    let request = RequestQueries::insert_request(&mut tx, draft).await?;

    tx.commit().await?;

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn user_with_quota(request_quota: i32, used_quota: i32) -> User {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap();
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "User".to_string(),
            role: crate::models::Role::Basic,
            request_quota,
            used_quota,
            quota_reset_date: Some(t),
            next_quota_reset: None,
            created_at: t,
            updated_at: t,
        }
    }

    #[test]
    fn test_can_submit_with_remaining_quota() {
        assert!(can_submit(&user_with_quota(3, 0)));
        assert!(can_submit(&user_with_quota(3, 2)));
    }

    #[test]
    fn test_cannot_submit_at_quota_boundary() {
        assert!(!can_submit(&user_with_quota(3, 3)));
        assert!(!can_submit(&user_with_quota(0, 0)));
    }

    #[test]
    fn test_remaining_quota_matches_gate() {
        let user = user_with_quota(15, 15);
        assert_eq!(user.remaining_quota(), 0);
        assert!(!can_submit(&user));
    }
}
