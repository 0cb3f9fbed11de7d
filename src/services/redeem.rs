use anyhow::anyhow;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::queries::{PromptQueries, RedeemCodeQueries, UserQueries};
use crate::errors::{AppError, Result};
use crate::models::{CodeKind, RedeemCode, Role};

/// Result of a successful claim, ready to render to the caller.
#[derive(Debug, Clone)]
pub struct ClaimOutcome {
    pub kind: CodeKind,
    pub message: String,
}

/// Codes are stored and looked up uppercase so `seo2024` and `SEO2024` are
/// the same code.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Expiry gate. An expired code is rejected but stays unused; it never
/// becomes claimable later.
pub fn check_claimable(code: &RedeemCode, now: DateTime<Utc>) -> Result<()> {
    if let Some(expires_at) = code.expires_at {
        if now > expires_at {
            return Err(AppError::Expired("Code has expired".to_string()));
        }
    }
    Ok(())
}

/// Consume a redeem code for `user_id` and apply its reward.
///
/// The whole claim runs in one transaction: the unused row is locked on
/// lookup, the reward is applied, and the code is flipped to used with a
/// conditional update. Two concurrent claims on the same code serialize on
/// the row lock; the loser finds no unused row and gets the same "invalid or
/// already used" answer as an unknown code. Any error before commit rolls
/// the reward back, so the code and the user are never left half-applied.
pub async fn claim(
    pool: &PgPool,
    raw_code: &str,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<ClaimOutcome> {
    let code = normalize_code(raw_code);
    if code.is_empty() {
        return Err(AppError::Validation("Code is required".to_string()));
    }

    let mut tx = pool.begin().await?;

    let Some(row) = RedeemCodeQueries::find_unused_for_update(&mut tx, &code).await? else {
        return Err(AppError::NotFound("Invalid or already used code".to_string()));
    };

    check_claimable(&row, now)?;

    let message = match row.kind {
        CodeKind::Prompt => {
            let prompt_id = row
                .target_prompt_id
                .ok_or_else(|| AppError::Internal(anyhow!("prompt code {} has no target", row.id)))?;

            if RedeemCodeQueries::has_claimed(&mut tx, user_id, prompt_id).await? {
                return Err(AppError::Conflict("You already have this prompt".to_string()));
            }

            RedeemCodeQueries::add_claimed(&mut tx, user_id, prompt_id).await?;

            let title = PromptQueries::title_of(&mut tx, prompt_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Prompt not found".to_string()))?;

            format!("Successfully claimed prompt: {}", title)
        }
        CodeKind::Upgrade => {
            let target_role = row
                .target_role
                .ok_or_else(|| AppError::Internal(anyhow!("upgrade code {} has no target role", row.id)))?;

            let user = UserQueries::find_by_id_for_update(&mut tx, user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

            if matches!(user.role, Role::Premium | Role::Admin) {
                return Err(AppError::Conflict(
                    "Account is already Premium or Admin".to_string(),
                ));
            }

            UserQueries::upgrade_role(&mut tx, user_id, target_role, target_role.request_allowance())
                .await?;

            format!("Successfully upgraded to {}", target_role.as_str().to_uppercase())
        }
    };

    // Flip unused -> used, guarded so it can only ever happen once.
    let flipped = RedeemCodeQueries::mark_used_if_unused(&mut tx, row.id, user_id, now).await?;
    if flipped == 0 {
        return Err(AppError::NotFound("Invalid or already used code".to_string()));
    }

    tx.commit().await?;

    Ok(ClaimOutcome {
        kind: row.kind,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single().unwrap()
    }

    fn code_row(expires_at: Option<DateTime<Utc>>) -> RedeemCode {
        RedeemCode {
            id: Uuid::new_v4(),
            code: "SEO2024".to_string(),
            kind: CodeKind::Prompt,
            target_prompt_id: Some(Uuid::new_v4()),
            target_role: None,
            is_used: false,
            used_by: None,
            used_at: None,
            expires_at,
            created_at: ts(2024, 1, 1),
        }
    }

    #[test]
    fn test_normalize_code_uppercases_and_trims() {
        assert_eq!(normalize_code("  seo2024 "), "SEO2024");
        assert_eq!(normalize_code("ExcA1b2C3"), "EXCA1B2C3");
        assert_eq!(normalize_code("   "), "");
    }

    #[test]
    fn test_code_without_expiry_is_claimable() {
        assert!(check_claimable(&code_row(None), ts(2030, 1, 1)).is_ok());
    }

    #[test]
    fn test_expired_code_is_rejected() {
        let row = code_row(Some(ts(2024, 2, 1)));
        let err = check_claimable(&row, ts(2024, 2, 2)).unwrap_err();
        assert!(matches!(err, AppError::Expired(_)));
        // Rejection does not consume the code.
        assert!(!row.is_used);
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let expires = ts(2024, 2, 1);
        assert!(check_claimable(&code_row(Some(expires)), expires).is_ok());
    }
}
