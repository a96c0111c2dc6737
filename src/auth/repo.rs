use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

pub const PERFIL_ADMIN: &str = "ADMIN";
pub const PERFIL_USUARIO: &str = "USUARIO";

/// Account row owned by the auth layer; `nome`/`telefone` here are the
/// registration metadata, the profile row is the canonical copy.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub nome: String,
    pub telefone: Option<String>,
    pub created_at: OffsetDateTime,
}

impl Account {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, password_hash, nome, telefone, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(account)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, password_hash, nome, telefone, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(account)
    }

    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        nome: &str,
        telefone: Option<&str>,
    ) -> anyhow::Result<Account> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO users (email, password_hash, nome, telefone)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, nome, telefone, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(nome)
        .bind(telefone)
        .fetch_one(db)
        .await?;
        Ok(account)
    }
}

/// Per-user profile keyed by the account id; holds the role and the
/// display fields the rest of the app reads.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub nome: String,
    pub telefone: Option<String>,
    pub perfil: String,
    pub created_at: OffsetDateTime,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.perfil == PERFIL_ADMIN
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, nome, telefone, perfil, created_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    /// Created at registration with the default USUARIO role.
    pub async fn create(
        db: &PgPool,
        id: Uuid,
        nome: &str,
        telefone: Option<&str>,
    ) -> anyhow::Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, nome, telefone, perfil)
            VALUES ($1, $2, $3, $4)
            RETURNING id, nome, telefone, perfil, created_at
            "#,
        )
        .bind(id)
        .bind(nome)
        .bind(telefone)
        .bind(PERFIL_USUARIO)
        .fetch_one(db)
        .await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_flag_requires_exact_role() {
        let mut profile = Profile {
            id: Uuid::new_v4(),
            nome: "Ana".into(),
            telefone: None,
            perfil: PERFIL_USUARIO.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        assert!(!profile.is_admin());

        profile.perfil = PERFIL_ADMIN.into();
        assert!(profile.is_admin());

        profile.perfil = "admin".into();
        assert!(!profile.is_admin());
    }
}
