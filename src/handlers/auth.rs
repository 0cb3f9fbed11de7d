use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::{JwtService, PasswordService},
    database::queries::UserQueries,
    errors::{AppError, Result},
    handlers::AppState,
    models::{CreateUserRequest, LoginRequest, Role, UserResponse},
    services::quota,
};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    // Validate email format
    if !request.email.contains('@') {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    PasswordService::validate_password(&request.password)?;

    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    // Check if email already exists
    if UserQueries::find_by_email(state.database.pool(), &request.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = PasswordService::hash_password(&request.password)?;

    // New accounts start on the basic plan with the quota window anchored at
    // the current month.
    let evaluation = quota::evaluate(None, Utc::now());
    let user = UserQueries::create_user(
        state.database.pool(),
        &request.email,
        &password_hash,
        request.name.trim(),
        Role::Basic,
        evaluation.normalized_last_reset,
        evaluation.next_reset,
    )
    .await?;

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let access_token = jwt_service.generate_access_token(user.id, &user.email, user.role)?;
    let refresh_token = jwt_service.generate_refresh_token(user.id, &user.email, user.role)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": UserResponse::from(user),
            "accessToken": access_token,
            "refreshToken": refresh_token
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>> {
    let user = UserQueries::find_by_email(state.database.pool(), &request.email)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid email or password".to_string()))?;

    if !PasswordService::verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::Auth("Invalid email or password".to_string()));
    }

    // Roll the quota window forward before the record reaches the client.
    let user = quota::normalize(state.database.pool(), user, Utc::now()).await?;

    let claimed = UserQueries::claimed_prompt_ids(state.database.pool(), user.id).await?;
    let favorites = UserQueries::favorite_prompt_ids(state.database.pool(), user.id).await?;

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let access_token = jwt_service.generate_access_token(user.id, &user.email, user.role)?;
    let refresh_token = jwt_service.generate_refresh_token(user.id, &user.email, user.role)?;

    Ok(Json(json!({
        "success": true,
        "user": UserResponse::new(user, claimed, favorites),
        "accessToken": access_token,
        "refreshToken": refresh_token
    })))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>> {
    let refresh_token = request
        .get("refreshToken")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::Validation("Refresh token is required".to_string()))?;

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let claims = jwt_service.verify_refresh_token(refresh_token)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Auth("Invalid user ID in token".to_string()))?;

    let user = UserQueries::find_by_id(state.database.pool(), user_id)
        .await?
        .ok_or_else(|| AppError::Auth("User not found".to_string()))?;

    let access_token = jwt_service.generate_access_token(user.id, &user.email, user.role)?;

    Ok(Json(json!({
        "success": true,
        "accessToken": access_token,
        "user": UserResponse::from(user)
    })))
}
