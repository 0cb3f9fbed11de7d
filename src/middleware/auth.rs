use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::JwtService,
    database::queries::UserQueries,
    handlers::AppState,
    models::Role,
};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": message})),
    )
        .into_response()
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok());

        let Some(token) = auth_header.and_then(|h| h.strip_prefix("Bearer ")) else {
            return Err(unauthorized("Authentication required"));
        };

        let jwt_service = JwtService::new(&state.config.jwt_secret);
        let claims = jwt_service
            .verify_access_token(token)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| unauthorized("Invalid token"))?;

        // Re-check against the store so revoked users and role downgrades
        // take effect immediately rather than at token expiry.
        match UserQueries::find_by_id(state.database.pool(), user_id).await {
            Ok(Some(user)) => Ok(AuthenticatedUser {
                id: user.id,
                email: user.email,
                role: user.role,
            }),
            Ok(None) => Err(unauthorized("User not found")),
            Err(_) => Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Database error"})),
            )
                .into_response()),
        }
    }
}

/// Extractor variant that additionally requires the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err((
                StatusCode::FORBIDDEN,
                Json(json!({"error": "Access forbidden"})),
            )
                .into_response());
        }

        Ok(AdminUser(user))
    }
}
