use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::queries::{RequestQueries, UserQueries},
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::{AdminUser, AuthenticatedUser},
    models::{
        CreateRequestRequest, PromptRequestResponse, RequestListQuery, UpdateRequestRequest,
    },
    services::{quota, requests},
};

pub async fn create_request(
    State(state): State<AppState>,
    Json(request): Json<CreateRequestRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    for (value, field) in [
        (&request.title, "title"),
        (&request.description, "description"),
        (&request.category, "category"),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} is required", field)));
        }
    }

    let user = UserQueries::find_by_id(state.database.pool(), request.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // Roll the quota window forward so last month's usage does not count
    // against this submission.
    let user = quota::normalize(state.database.pool(), user, Utc::now()).await?;

    if !requests::can_submit(&user) {
        return Err(AppError::QuotaExceeded("Request quota exceeded".to_string()));
    }

    let created = requests::submit(state.database.pool(), &request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "request": PromptRequestResponse::from_parts(created, Some(user.name))
        })),
    ))
}

pub async fn list_requests(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(mut query): Query<RequestListQuery>,
) -> Result<Json<serde_json::Value>> {
    // Non-admins only ever see their own requests.
    if !user.is_admin() {
        query.user_id = Some(user.id);
    }

    let rows = RequestQueries::list(state.database.pool(), &query).await?;
    let requests: Vec<PromptRequestResponse> =
        rows.into_iter().map(PromptRequestResponse::from).collect();

    Ok(Json(json!({
        "success": true,
        "requests": requests
    })))
}

pub async fn update_request(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdateRequestRequest>,
) -> Result<Json<serde_json::Value>> {
    let existing = RequestQueries::find_detail_by_id(state.database.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;

    if !existing.status.can_transition_to(update.status) {
        return Err(AppError::Conflict(
            "Request has already been resolved".to_string(),
        ));
    }

    RequestQueries::update_status(
        state.database.pool(),
        id,
        update.status,
        update.admin_notes.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;

    let detail = RequestQueries::find_detail_by_id(state.database.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "request": PromptRequestResponse::from(detail)
    })))
}
