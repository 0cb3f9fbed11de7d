use axum::{extract::State, response::Json};
use serde_json::json;

use crate::{
    database::queries::StatsQueries,
    errors::Result,
    handlers::AppState,
    middleware::auth::AdminUser,
    models::{PromptType, Role},
};

pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<serde_json::Value>> {
    let pool = state.database.pool();

    let total_users = StatsQueries::count_users(pool).await?;
    let total_prompts = StatsQueries::count_active_prompts(pool).await?;
    let total_requests = StatsQueries::count_requests(pool).await?;
    let pending_requests = StatsQueries::count_pending_requests(pool).await?;

    let (mut free, mut exclusive, mut super_count) = (0i64, 0i64, 0i64);
    for (prompt_type, count) in StatsQueries::prompt_type_counts(pool).await? {
        match prompt_type {
            PromptType::Free => free = count,
            PromptType::Exclusive => exclusive = count,
            PromptType::Super => super_count = count,
        }
    }

    let (mut basic, mut premium, mut admin) = (0i64, 0i64, 0i64);
    for (role, count) in StatsQueries::user_role_counts(pool).await? {
        match role {
            Role::Basic => basic = count,
            Role::Premium => premium = count,
            Role::Admin => admin = count,
        }
    }

    Ok(Json(json!({
        "success": true,
        "stats": {
            "totalUsers": total_users,
            "totalPrompts": total_prompts,
            "totalRequests": total_requests,
            "pendingRequests": pending_requests,
            "promptTypes": {
                "free": free,
                "exclusive": exclusive,
                "super": super_count
            },
            "userRoles": {
                "basic": basic,
                "premium": premium,
                "admin": admin
            }
        }
    })))
}
