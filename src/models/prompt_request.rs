use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "request_priority", rename_all = "lowercase")]
pub enum RequestPriority {
    Low,
    Medium,
    High,
}

impl Default for RequestPriority {
    fn default() -> Self {
        RequestPriority::Medium
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Requests only move out of `pending`; approved and rejected are
    /// terminal.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        self == RequestStatus::Pending && next != RequestStatus::Pending
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PromptRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: RequestPriority,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request row joined with the owning user's display name.
#[derive(Debug, Clone, FromRow)]
pub struct PromptRequestDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: RequestPriority,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequestRequest {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub priority: RequestPriority,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequestRequest {
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RequestListQuery {
    pub user_id: Option<Uuid>,
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: RequestPriority,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PromptRequestDetail> for PromptRequestResponse {
    fn from(r: PromptRequestDetail) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            user_name: r.user_name,
            title: r.title,
            description: r.description,
            category: r.category,
            priority: r.priority,
            status: r.status,
            admin_notes: r.admin_notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PromptRequestResponse {
    pub fn from_parts(r: PromptRequest, user_name: Option<String>) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            user_name,
            title: r.title,
            description: r.description,
            category: r.category,
            priority: r.priority,
            status: r.status,
            admin_notes: r.admin_notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_requests_transition() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Approved));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Rejected));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
        assert!(!RequestStatus::Approved.can_transition_to(RequestStatus::Rejected));
        assert!(!RequestStatus::Rejected.can_transition_to(RequestStatus::Approved));
    }

    #[test]
    fn test_default_priority_is_medium() {
        assert_eq!(RequestPriority::default(), RequestPriority::Medium);
    }
}
