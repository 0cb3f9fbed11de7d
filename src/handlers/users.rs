use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::queries::UserQueries,
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::{AdminUser, AuthenticatedUser},
    models::{UpdateUserRequest, UserListQuery, UserQuotaResponse, UserResponse},
    services::quota,
};

pub async fn get_quota(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserQuotaResponse>> {
    // Users can only read their own quota status.
    if id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    let target = UserQueries::find_by_id(state.database.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let now = Utc::now();
    let target = quota::normalize(state.database.pool(), target, now).await?;

    let days_until_reset = target
        .next_quota_reset
        .map(|next| quota::days_until_reset(next, now))
        .unwrap_or(0);

    Ok(Json(UserQuotaResponse {
        request_quota: target.request_quota,
        used_quota: target.used_quota,
        remaining_quota: target.remaining_quota(),
        next_quota_reset: target.next_quota_reset,
        days_until_reset,
    }))
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<serde_json::Value>> {
    let users = UserQueries::list(state.database.pool(), &query).await?;

    let mut responses = Vec::with_capacity(users.len());
    for user in users {
        let claimed = UserQueries::claimed_prompt_ids(state.database.pool(), user.id).await?;
        let favorites = UserQueries::favorite_prompt_ids(state.database.pool(), user.id).await?;
        responses.push(UserResponse::new(user, claimed, favorites));
    }

    Ok(Json(json!({
        "success": true,
        "users": responses
    })))
}

pub async fn update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(mut update): Json<UpdateUserRequest>,
) -> Result<Json<serde_json::Value>> {
    if let Some(email) = &update.email {
        if !email.contains('@') {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }
        if UserQueries::email_taken_by_other(state.database.pool(), email, id).await? {
            return Err(AppError::Conflict(
                "Email already taken by another user".to_string(),
            ));
        }
    }

    // A role change without an explicit quota keeps the account on its
    // plan's allowance.
    if update.request_quota.is_none() {
        if let Some(role) = update.role {
            update.request_quota = Some(role.request_allowance());
        }
    }

    let user = UserQueries::update_user(state.database.pool(), id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let claimed = UserQueries::claimed_prompt_ids(state.database.pool(), user.id).await?;
    let favorites = UserQueries::favorite_prompt_ids(state.database.pool(), user.id).await?;

    Ok(Json(json!({
        "success": true,
        "user": UserResponse::new(user, claimed, favorites)
    })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    if admin.0.id == id {
        return Err(AppError::Validation(
            "Cannot delete your own account".to_string(),
        ));
    }

    if !UserQueries::delete_user(state.database.pool(), id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "User deleted"
    })))
}
