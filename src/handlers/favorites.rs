use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::queries::{FavoriteQueries, PromptQueries},
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
};

#[derive(Debug, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub user_id: Uuid,
    pub prompt_id: Uuid,
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ToggleFavoriteRequest>,
) -> Result<Json<serde_json::Value>> {
    // Users only toggle their own favorites.
    if request.user_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    PromptQueries::find_by_id(state.database.pool(), request.prompt_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Prompt not found".to_string()))?;

    let action = if FavoriteQueries::is_favorite(state.database.pool(), request.user_id, request.prompt_id)
        .await?
    {
        FavoriteQueries::remove(state.database.pool(), request.user_id, request.prompt_id).await?;
        "removed"
    } else {
        FavoriteQueries::add(state.database.pool(), request.user_id, request.prompt_id).await?;
        "added"
    };

    Ok(Json(json!({
        "success": true,
        "action": action
    })))
}
