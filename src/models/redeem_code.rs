use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "code_kind", rename_all = "lowercase")]
pub enum CodeKind {
    Prompt,
    Upgrade,
}

/// A redemption code. Transitions `unused -> used` exactly once; a used code
/// is terminal and indistinguishable from an unknown one to callers.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RedeemCode {
    pub id: Uuid,
    pub code: String,
    pub kind: CodeKind,
    pub target_prompt_id: Option<Uuid>,
    pub target_role: Option<Role>,
    pub is_used: bool,
    pub used_by: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub code: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: CodeKind,
}

#[derive(Debug, Deserialize)]
pub struct CreateRedeemCodeRequest {
    pub code: String,
    pub kind: CodeKind,
    pub target_prompt_id: Option<Uuid>,
    pub target_role: Option<Role>,
    pub expires_at: Option<DateTime<Utc>>,
}
