use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResult, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{Account, Profile},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Register a new account plus its USUARIO profile. Business failures come
/// back as `{success: false, error}` so clients branch on the result.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResult>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Ok(Json(AuthResult::err("E-mail inválido")));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Ok(Json(AuthResult::err(
            "A senha deve ter pelo menos 8 caracteres",
        )));
    }

    if let Ok(Some(_)) = Account::find_by_email(&state.db, &payload.email).await {
        warn!(email = %payload.email, "email already registered");
        return Ok(Json(AuthResult::err("E-mail já cadastrado")));
    }

    let hash = hash_password(&payload.password).map_err(internal)?;

    let account = Account::create(
        &state.db,
        &payload.email,
        &hash,
        &payload.nome,
        payload.telefone.as_deref(),
    )
    .await
    .map_err(internal)?;

    let profile = match Profile::create(
        &state.db,
        account.id,
        &payload.nome,
        payload.telefone.as_deref(),
    )
    .await
    {
        Ok(p) => Some(p),
        Err(e) => {
            // The account is usable without the profile row; the session
            // mapping falls back to account metadata.
            error!(error = %e, user_id = %account.id, "profile create failed");
            None
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(account.id).map_err(internal)?;
    let refresh_token = keys.sign_refresh(account.id).map_err(internal)?;

    info!(user_id = %account.id, email = %account.email, "user registered");
    let user = PublicUser::from_parts(&account, profile.as_ref());
    Ok(Json(AuthResult::ok(access_token, refresh_token, user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResult>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    let account = match Account::find_by_email(&state.db, &payload.email).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Ok(Json(AuthResult::err("Credenciais inválidas")));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(internal(e));
        }
    };

    let ok = verify_password(&payload.password, &account.password_hash).map_err(internal)?;
    if !ok {
        warn!(email = %payload.email, user_id = %account.id, "login invalid password");
        return Ok(Json(AuthResult::err("Credenciais inválidas")));
    }

    let profile = Profile::find_by_id(&state.db, account.id)
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, user_id = %account.id, "profile lookup failed");
            None
        });

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(account.id).map_err(internal)?;
    let refresh_token = keys.sign_refresh(account.id).map_err(internal)?;

    info!(user_id = %account.id, email = %account.email, "user logged in");
    let user = PublicUser::from_parts(&account, profile.as_ref());
    Ok(Json(AuthResult::ok(access_token, refresh_token, user)))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResult>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = match keys.verify_refresh(&payload.refresh_token) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "refresh rejected");
            return Err((StatusCode::UNAUTHORIZED, e.to_string()));
        }
    };

    let account = Account::find_by_id(&state.db, claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    let profile = Profile::find_by_id(&state.db, account.id)
        .await
        .map_err(internal)?;

    let access_token = keys.sign_access(account.id).map_err(internal)?;
    let refresh_token = keys.sign_refresh(account.id).map_err(internal)?;

    let user = PublicUser::from_parts(&account, profile.as_ref());
    Ok(Json(AuthResult::ok(access_token, refresh_token, user)))
}

/// Sign-out is client-side token disposal; the server only drops the
/// caller's presence marker.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> StatusCode {
    state.presence.untrack(user_id);
    info!(%user_id, "user logged out");
    StatusCode::NO_CONTENT
}

/// Session restore: map the token's account + profile into the local user
/// shape.
#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let account = Account::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            error!(%user_id, "user not found");
            (StatusCode::UNAUTHORIZED, "User not found".to_string())
        })?;

    let profile = Profile::find_by_id(&state.db, user_id)
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, %user_id, "profile lookup failed");
            None
        });

    Ok(Json(PublicUser::from_parts(&account, profile.as_ref())))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.com.br"));
    }

    #[test]
    fn email_validation_rejects_garbage() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@b"));
    }
}
