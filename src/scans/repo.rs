use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::Profile;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PROCESSED: &str = "processed";

/// Display name used when a submitter's profile cannot be resolved.
pub const FALLBACK_SUBMITTER: &str = "Usuário";

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Usuário não autenticado. Faça login para escanear.")]
    NotAuthenticated,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Scan {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub content: String,
    pub status: String,
    pub created_at: OffsetDateTime,
}

/// Scan row with the submitter name denormalized at read time.
#[derive(Debug, Clone, Serialize)]
pub struct PendingScan {
    #[serde(flatten)]
    pub scan: Scan,
    pub user_nome: String,
}

/// The caller on whose behalf pending scans are listed; row visibility is
/// decided here in the data layer, not in handler code.
#[derive(Debug, Clone, Copy)]
pub struct Viewer {
    pub user_id: Uuid,
    pub is_admin: bool,
}

fn require_user(user_id: Option<Uuid>) -> Result<Uuid, ScanError> {
    user_id.ok_or(ScanError::NotAuthenticated)
}

/// Join submitter names onto scan rows, falling back to a generic label.
fn resolve_submitter_names(scans: Vec<Scan>, names: &HashMap<Uuid, String>) -> Vec<PendingScan> {
    scans
        .into_iter()
        .map(|scan| {
            let user_nome = scan
                .user_id
                .and_then(|id| names.get(&id).cloned())
                .unwrap_or_else(|| FALLBACK_SUBMITTER.to_string());
            PendingScan { scan, user_nome }
        })
        .collect()
}

impl Scan {
    /// Insert a pending submission. Fails before any write when no user is
    /// authenticated.
    pub async fn save(
        db: &PgPool,
        content: &str,
        user_id: Option<Uuid>,
    ) -> Result<Scan, ScanError> {
        let user_id = require_user(user_id)?;

        let scan = sqlx::query_as::<_, Scan>(
            r#"
            INSERT INTO scans (user_id, content, status)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, content, status, created_at
            "#,
        )
        .bind(user_id)
        .bind(content)
        .bind(STATUS_PENDING)
        .fetch_one(db)
        .await
        .map_err(anyhow::Error::from)?;
        Ok(scan)
    }

    /// Pending submissions newest first. Admin viewers see every row,
    /// regular viewers only their own. Submitter names come from one
    /// batched profile lookup rather than a query per row.
    pub async fn list_pending(db: &PgPool, viewer: Viewer) -> anyhow::Result<Vec<PendingScan>> {
        let scans = sqlx::query_as::<_, Scan>(
            r#"
            SELECT id, user_id, content, status, created_at
            FROM scans
            WHERE status = $1
              AND ($2::bool = TRUE OR user_id = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(STATUS_PENDING)
        .bind(viewer.is_admin)
        .bind(viewer.user_id)
        .fetch_all(db)
        .await?;

        if scans.is_empty() {
            return Ok(Vec::new());
        }

        let mut user_ids: Vec<Uuid> = scans.iter().filter_map(|s| s.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let mut names = HashMap::new();
        if !user_ids.is_empty() {
            let profiles = sqlx::query_as::<_, Profile>(
                r#"
                SELECT id, nome, telefone, perfil, created_at
                FROM profiles
                WHERE id = ANY($1)
                "#,
            )
            .bind(&user_ids)
            .fetch_all(db)
            .await?;
            for p in profiles {
                names.insert(p.id, p.nome);
            }
        }

        Ok(resolve_submitter_names(scans, &names))
    }

    /// Transition to processed. Idempotent: re-applying to a processed row
    /// changes nothing, and the status never reverts. Returns false when
    /// the row does not exist.
    pub async fn mark_processed(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE scans
            SET status = $2
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(STATUS_PROCESSED)
        .fetch_optional(db)
        .await?;
        Ok(updated.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saving_without_a_user_is_an_authentication_error() {
        let err = require_user(None).unwrap_err();
        assert!(matches!(err, ScanError::NotAuthenticated));
        assert!(err.to_string().contains("não autenticado"));
    }

    #[test]
    fn saving_with_a_user_passes_the_guard() {
        let id = Uuid::new_v4();
        assert_eq!(require_user(Some(id)).unwrap(), id);
    }

    #[test]
    fn submitter_names_resolve_with_fallback() {
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let scans = vec![
            Scan {
                id: Uuid::new_v4(),
                user_id: Some(known),
                content: "QR123".into(),
                status: STATUS_PENDING.into(),
                created_at: OffsetDateTime::now_utc(),
            },
            Scan {
                id: Uuid::new_v4(),
                user_id: Some(unknown),
                content: "QR456".into(),
                status: STATUS_PENDING.into(),
                created_at: OffsetDateTime::now_utc(),
            },
            Scan {
                id: Uuid::new_v4(),
                user_id: None,
                content: "QR789".into(),
                status: STATUS_PENDING.into(),
                created_at: OffsetDateTime::now_utc(),
            },
        ];
        let mut names = HashMap::new();
        names.insert(known, "Ana".to_string());

        let resolved = resolve_submitter_names(scans, &names);
        assert_eq!(resolved[0].user_nome, "Ana");
        assert_eq!(resolved[1].user_nome, FALLBACK_SUBMITTER);
        assert_eq!(resolved[2].user_nome, FALLBACK_SUBMITTER);
    }
}
