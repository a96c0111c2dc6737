use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use tracing::{error, warn};
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenKind};
use super::repo::Profile;
use crate::state::AppState;

/// Validates the bearer access token and yields the caller's user id.
#[derive(Debug)]
pub struct AuthUser(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header".to_string(),
        ))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ));
            }
        };

        if claims.kind != TokenKind::Access {
            return Err((
                StatusCode::UNAUTHORIZED,
                "Access token required".to_string(),
            ));
        }

        Ok(AuthUser(claims.sub))
    }
}

/// On top of `AuthUser`, requires the caller's profile role to be ADMIN.
/// Admin-only routes gate through this instead of checking in handler
/// bodies.
pub struct AdminUser(pub Uuid);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;

        let profile = Profile::find_by_id(&state.db, user_id).await.map_err(|e| {
            error!(error = %e, %user_id, "profile lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Profile lookup failed".to_string(),
            )
        })?;

        match profile {
            Some(p) if p.is_admin() => Ok(AdminUser(user_id)),
            _ => {
                warn!(%user_id, "admin route rejected for non-admin caller");
                Err((
                    StatusCode::FORBIDDEN,
                    "Admin access required".to_string(),
                ))
            }
        }
    }
}
