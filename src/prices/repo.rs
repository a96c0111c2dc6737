use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Price {
    pub id: Uuid,
    pub produto_id: Uuid,
    pub mercado_id: Uuid,
    pub valor: f64,
    pub ativo: bool,
    pub data_atualizacao: OffsetDateTime,
}

impl Price {
    /// Active prices, optionally narrowed by product and/or market,
    /// most recently updated first.
    pub async fn list(
        db: &PgPool,
        produto_id: Option<Uuid>,
        mercado_id: Option<Uuid>,
    ) -> anyhow::Result<Vec<Price>> {
        let rows = sqlx::query_as::<_, Price>(
            r#"
            SELECT id, produto_id, mercado_id, valor, ativo, data_atualizacao
            FROM prices
            WHERE ativo = TRUE
              AND ($1::uuid IS NULL OR produto_id = $1)
              AND ($2::uuid IS NULL OR mercado_id = $2)
            ORDER BY data_atualizacao DESC
            "#,
        )
        .bind(produto_id)
        .bind(mercado_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Minimum active price for a product, None when the product has no
    /// active prices.
    pub async fn lowest_for_product(db: &PgPool, produto_id: Uuid) -> anyhow::Result<Option<f64>> {
        let valor = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT valor
            FROM prices
            WHERE produto_id = $1 AND ativo = TRUE
            ORDER BY valor ASC
            LIMIT 1
            "#,
        )
        .bind(produto_id)
        .fetch_optional(db)
        .await?;
        Ok(valor)
    }

    /// Upsert keyed by the (produto_id, mercado_id) pair. The schema's
    /// unique constraint makes duplicate active rows impossible, so
    /// concurrent writers reduce to last-writer-wins on the same row.
    pub async fn save(
        db: &PgPool,
        produto_id: Uuid,
        mercado_id: Uuid,
        valor: f64,
        ativo: bool,
    ) -> anyhow::Result<Price> {
        let row = sqlx::query_as::<_, Price>(
            r#"
            INSERT INTO prices (id, produto_id, mercado_id, valor, ativo, data_atualizacao)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (produto_id, mercado_id) DO UPDATE
                SET valor = EXCLUDED.valor,
                    ativo = EXCLUDED.ativo,
                    data_atualizacao = now()
            RETURNING id, produto_id, mercado_id, valor, ativo, data_atualizacao
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(produto_id)
        .bind(mercado_id)
        .bind(valor)
        .bind(ativo)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Standalone cascade step for a product's price history; safe to
    /// re-run after a partial failure.
    pub async fn delete_for_product(db: &PgPool, produto_id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM prices WHERE produto_id = $1")
            .bind(produto_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
