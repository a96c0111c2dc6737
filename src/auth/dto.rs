use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::{Account, Profile, PERFIL_USUARIO};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub nome: String,
    #[serde(default)]
    pub telefone: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// The user shape the views consume.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub nome: String,
    pub email: String,
    pub telefone: Option<String>,
    pub perfil: String,
}

impl PublicUser {
    /// Map account + optional profile into the local user shape, filling
    /// missing profile fields from account metadata. An absent profile row
    /// keeps the session usable with the default role.
    pub fn from_parts(account: &Account, profile: Option<&Profile>) -> Self {
        let nome = profile
            .map(|p| p.nome.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| Some(account.nome.clone()).filter(|n| !n.is_empty()))
            .unwrap_or_else(|| {
                account
                    .email
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            });
        let telefone = profile
            .and_then(|p| p.telefone.clone())
            .or_else(|| account.telefone.clone());
        let perfil = profile
            .map(|p| p.perfil.clone())
            .unwrap_or_else(|| PERFIL_USUARIO.to_string());

        Self {
            id: account.id,
            nome,
            email: account.email.clone(),
            telefone,
            perfil,
        }
    }
}

/// Login/register outcome: business failures are carried in the body, not
/// as transport errors, so callers branch on `success`.
#[derive(Debug, Serialize)]
pub struct AuthResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}

impl AuthResult {
    pub fn ok(access_token: String, refresh_token: String, user: PublicUser) -> Self {
        Self {
            success: true,
            error: None,
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            user: Some(user),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            access_token: None,
            refresh_token: None,
            user: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::PERFIL_ADMIN;
    use time::OffsetDateTime;

    fn account() -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            password_hash: "x".into(),
            nome: "Ana Metadata".into(),
            telefone: Some("11999990000".into()),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn profile_fields_win_over_account_metadata() {
        let acc = account();
        let profile = Profile {
            id: acc.id,
            nome: "Ana Profile".into(),
            telefone: Some("11888880000".into()),
            perfil: PERFIL_ADMIN.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let user = PublicUser::from_parts(&acc, Some(&profile));
        assert_eq!(user.nome, "Ana Profile");
        assert_eq!(user.telefone.as_deref(), Some("11888880000"));
        assert_eq!(user.perfil, PERFIL_ADMIN);
    }

    #[test]
    fn missing_profile_falls_back_to_metadata_and_default_role() {
        let acc = account();
        let user = PublicUser::from_parts(&acc, None);
        assert_eq!(user.nome, "Ana Metadata");
        assert_eq!(user.telefone.as_deref(), Some("11999990000"));
        assert_eq!(user.perfil, PERFIL_USUARIO);
    }

    #[test]
    fn empty_names_fall_back_to_email_local_part() {
        let mut acc = account();
        acc.nome = String::new();
        acc.telefone = None;
        let user = PublicUser::from_parts(&acc, None);
        assert_eq!(user.nome, "ana");
        assert_eq!(user.telefone, None);
    }

    #[test]
    fn auth_result_error_omits_token_fields() {
        let json = serde_json::to_string(&AuthResult::err("Credenciais inválidas")).unwrap();
        assert!(json.contains("Credenciais inválidas"));
        assert!(!json.contains("access_token"));
    }
}
