use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "prompt_type", rename_all = "lowercase")]
pub enum PromptType {
    Free,
    Exclusive,
    Super,
}

impl PromptType {
    /// Exclusive and super prompts are unlocked through the redeem ledger.
    pub fn requires_redeem_code(self) -> bool {
        matches!(self, PromptType::Exclusive | PromptType::Super)
    }

    pub fn code_prefix(self) -> Option<&'static str> {
        match self {
            PromptType::Free => None,
            PromptType::Exclusive => Some("EXC"),
            PromptType::Super => Some("SUP"),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Prompt {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    #[sqlx(rename = "type")]
    pub prompt_type: PromptType,
    pub category: String,
    pub tags: Vec<String>,
    pub created_by: Uuid,
    pub is_active: bool,
    pub redeem_code: Option<String>,
    pub lynk_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePromptRequest {
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(rename = "type")]
    pub prompt_type: PromptType,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub lynk_url: Option<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdatePromptRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub lynk_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PromptListQuery {
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub prompt_type: Option<PromptType>,
    pub search: Option<String>,
    pub active_only: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(rename = "type")]
    pub prompt_type: PromptType,
    pub category: String,
    pub tags: Vec<String>,
    pub created_by: Uuid,
    pub is_active: bool,
    pub redeem_code: Option<String>,
    pub lynk_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Prompt> for PromptResponse {
    fn from(p: Prompt) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            content: p.content,
            prompt_type: p.prompt_type,
            category: p.category,
            tags: p.tags,
            created_by: p.created_by,
            is_active: p.is_active,
            redeem_code: p.redeem_code,
            lynk_url: p.lynk_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_prefixes() {
        assert_eq!(PromptType::Free.code_prefix(), None);
        assert_eq!(PromptType::Exclusive.code_prefix(), Some("EXC"));
        assert_eq!(PromptType::Super.code_prefix(), Some("SUP"));
    }

    #[test]
    fn test_redeem_code_requirement_follows_type() {
        assert!(!PromptType::Free.requires_redeem_code());
        assert!(PromptType::Exclusive.requires_redeem_code());
        assert!(PromptType::Super.requires_redeem_code());
    }
}
