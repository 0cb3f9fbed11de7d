use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use rand::{distributions::Alphanumeric, Rng};
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::queries::{PromptQueries, RedeemCodeQueries},
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::{AdminUser, AuthenticatedUser},
    models::{
        CodeKind, CreatePromptRequest, PromptListQuery, PromptResponse, UpdatePromptRequest,
    },
    services::redeem,
};

fn generate_redeem_code(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    redeem::normalize_code(&format!("{}{}", prefix, suffix))
}

pub async fn list_prompts(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Query(query): Query<PromptListQuery>,
) -> Result<Json<serde_json::Value>> {
    // Only admins may see inactive catalog entries.
    let is_admin = user.map(|u| u.is_admin()).unwrap_or(false);
    let include_inactive = is_admin && !query.active_only.unwrap_or(true);

    let prompts = PromptQueries::list(state.database.pool(), &query, include_inactive).await?;
    let prompts: Vec<PromptResponse> = prompts.into_iter().map(PromptResponse::from).collect();

    Ok(Json(json!({
        "success": true,
        "prompts": prompts
    })))
}

pub async fn create_prompt(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(request): Json<CreatePromptRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    for (value, field) in [
        (&request.title, "title"),
        (&request.description, "description"),
        (&request.content, "content"),
        (&request.category, "category"),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} is required", field)));
        }
    }

    // Exclusive and super prompts ship with a one-shot redeem code; the
    // prompt and its ledger row land in the same transaction.
    let redeem_code = request
        .prompt_type
        .code_prefix()
        .map(generate_redeem_code);

    let mut tx = state.database.pool().begin().await?;

    let prompt =
        PromptQueries::create_prompt(&mut tx, &request, admin.0.id, redeem_code.as_deref()).await?;

    if let Some(code) = &redeem_code {
        RedeemCodeQueries::create_code(&mut tx, code, CodeKind::Prompt, Some(prompt.id), None, None)
            .await?;
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "prompt": PromptResponse::from(prompt)
        })),
    ))
}

pub async fn update_prompt(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdatePromptRequest>,
) -> Result<Json<serde_json::Value>> {
    let prompt = PromptQueries::update_prompt(state.database.pool(), id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Prompt not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "prompt": PromptResponse::from(prompt)
    })))
}

pub async fn delete_prompt(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    if !PromptQueries::delete_prompt(state.database.pool(), id).await? {
        return Err(AppError::NotFound("Prompt not found".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Prompt deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_carry_prefix_and_are_uppercase() {
        for _ in 0..20 {
            let code = generate_redeem_code("EXC");
            assert!(code.starts_with("EXC"));
            assert_eq!(code.len(), 9);
            assert_eq!(code, code.to_uppercase());
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }
}
