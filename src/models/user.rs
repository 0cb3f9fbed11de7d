use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Basic,
    Premium,
    Admin,
}

impl Role {
    /// Monthly prompt-request allowance for the plan. Admin accounts get a
    /// sentinel value large enough to never gate in practice.
    pub fn request_allowance(self) -> i32 {
        match self {
            Role::Basic => 3,
            Role::Premium => 15,
            Role::Admin => 999,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Basic => "basic",
            Role::Premium => "premium",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub request_quota: i32,
    pub used_quota: i32,
    pub quota_reset_date: Option<DateTime<Utc>>,
    pub next_quota_reset: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn remaining_quota(&self) -> i32 {
        self.request_quota - self.used_quota
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub request_quota: Option<i32>,
    pub used_quota: Option<i32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UserListQuery {
    pub role: Option<Role>,
    pub search: Option<String>,
}

/// API-boundary view of a user. The store is snake_case throughout; this is
/// the single place rows are mapped to the camelCase wire shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub request_quota: i32,
    pub used_quota: i32,
    pub quota_reset_date: Option<DateTime<Utc>>,
    pub next_quota_reset: Option<DateTime<Utc>>,
    pub claimed_prompts: Vec<Uuid>,
    pub favorite_prompts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(user: User, claimed_prompts: Vec<Uuid>, favorite_prompts: Vec<Uuid>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            request_quota: user.request_quota,
            used_quota: user.used_quota,
            quota_reset_date: user.quota_reset_date,
            next_quota_reset: user.next_quota_reset,
            claimed_prompts,
            favorite_prompts,
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse::new(user, Vec::new(), Vec::new())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuotaResponse {
    pub request_quota: i32,
    pub used_quota: i32,
    pub remaining_quota: i32,
    pub next_quota_reset: Option<DateTime<Utc>>,
    pub days_until_reset: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_allowances() {
        assert_eq!(Role::Basic.request_allowance(), 3);
        assert_eq!(Role::Premium.request_allowance(), 15);
        assert!(Role::Admin.request_allowance() > Role::Premium.request_allowance());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Premium).unwrap(), "\"premium\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"admin\"").unwrap(),
            Role::Admin
        );
    }
}
