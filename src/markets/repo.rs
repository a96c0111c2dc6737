use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Market {
    pub id: Uuid,
    pub nome: String,
    pub ativo: bool,
    pub data_criacao: OffsetDateTime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Market {
    /// Active markets sorted by name; inactive markets never reach
    /// consumer-facing listings.
    pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<Market>> {
        let rows = sqlx::query_as::<_, Market>(
            r#"
            SELECT id, nome, ativo, data_criacao, latitude, longitude
            FROM markets
            WHERE ativo = TRUE
            ORDER BY nome
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Market>> {
        let rows = sqlx::query_as::<_, Market>(
            r#"
            SELECT id, nome, ativo, data_criacao, latitude, longitude
            FROM markets
            ORDER BY nome
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Idempotent upsert keyed by id.
    pub async fn upsert(
        db: &PgPool,
        id: Uuid,
        nome: &str,
        ativo: bool,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> anyhow::Result<Market> {
        let row = sqlx::query_as::<_, Market>(
            r#"
            INSERT INTO markets (id, nome, ativo, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
                SET nome = EXCLUDED.nome,
                    ativo = EXCLUDED.ativo,
                    latitude = EXCLUDED.latitude,
                    longitude = EXCLUDED.longitude
            RETURNING id, nome, ativo, data_criacao, latitude, longitude
            "#,
        )
        .bind(id)
        .bind(nome)
        .bind(ativo)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM markets WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
