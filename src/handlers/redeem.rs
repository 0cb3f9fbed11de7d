use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::json;

use crate::{
    database::queries::{PromptQueries, RedeemCodeQueries, UserQueries},
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AdminUser,
    models::{ClaimRequest, ClaimResponse, CodeKind, CreateRedeemCodeRequest, Role},
    services::{quota, redeem},
};

pub async fn claim(
    State(state): State<AppState>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>> {
    if request.code.trim().is_empty() {
        return Err(AppError::Validation("Code is required".to_string()));
    }

    let now = Utc::now();

    let user = UserQueries::find_by_id(state.database.pool(), request.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // Normalize the quota window before the guarded mutation, like every
    // other client action.
    quota::normalize(state.database.pool(), user, now).await?;

    let outcome = redeem::claim(state.database.pool(), &request.code, request.user_id, now).await?;

    Ok(Json(ClaimResponse {
        success: true,
        message: outcome.message,
        kind: outcome.kind,
    }))
}

/// Mint a code outside prompt creation, e.g. for upgrade promotions.
pub async fn create_code(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<CreateRedeemCodeRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let code = redeem::normalize_code(&request.code);
    if code.is_empty() {
        return Err(AppError::Validation("Code is required".to_string()));
    }

    match request.kind {
        CodeKind::Prompt => {
            let prompt_id = request.target_prompt_id.ok_or_else(|| {
                AppError::Validation("target_prompt_id is required for prompt codes".to_string())
            })?;
            PromptQueries::find_by_id(state.database.pool(), prompt_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Prompt not found".to_string()))?;
        }
        CodeKind::Upgrade => {
            let role = request.target_role.ok_or_else(|| {
                AppError::Validation("target_role is required for upgrade codes".to_string())
            })?;
            if role == Role::Basic {
                return Err(AppError::Validation(
                    "Upgrade codes cannot target the basic role".to_string(),
                ));
            }
        }
    }

    if RedeemCodeQueries::code_exists(state.database.pool(), &code).await? {
        return Err(AppError::Conflict("Code already exists".to_string()));
    }

    let mut conn = state.database.pool().acquire().await?;
    let created = RedeemCodeQueries::create_code(
        &mut conn,
        &code,
        request.kind,
        request.target_prompt_id,
        request.target_role,
        request.expires_at,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "code": {
                "id": created.id,
                "code": created.code,
                "type": created.kind,
                "targetPromptId": created.target_prompt_id,
                "targetRole": created.target_role,
                "expiresAt": created.expires_at,
                "createdAt": created.created_at
            }
        })),
    ))
}
