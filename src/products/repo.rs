use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub nome: String,
    pub categoria: String,
    pub ativo: bool,
    pub imagem_url: Option<String>,
    pub data_criacao: OffsetDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteProductError {
    #[error("product not found")]
    NotFound,
    #[error("product is still active; deactivate it before deleting")]
    StillActive,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Product {
    /// Filtered listing: case-insensitive substring on `nome`, exact
    /// `categoria`, and the active flag when requested, sorted by name.
    /// With `only_active` an inactive product can never come back.
    pub async fn list(
        db: &PgPool,
        search: Option<&str>,
        categoria: Option<&str>,
        only_active: bool,
    ) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, nome, categoria, ativo, imagem_url, data_criacao
            FROM products
            WHERE ($1::bool = FALSE OR ativo = TRUE)
              AND ($2::text IS NULL OR nome ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR categoria = $3)
            ORDER BY nome
            "#,
        )
        .bind(only_active)
        .bind(search)
        .bind(categoria)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, nome, categoria, ativo, imagem_url, data_criacao
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Idempotent upsert keyed by id.
    pub async fn upsert(
        db: &PgPool,
        id: Uuid,
        nome: &str,
        categoria: &str,
        ativo: bool,
        imagem_url: Option<&str>,
    ) -> anyhow::Result<Product> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, nome, categoria, ativo, imagem_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
                SET nome = EXCLUDED.nome,
                    categoria = EXCLUDED.categoria,
                    ativo = EXCLUDED.ativo,
                    imagem_url = EXCLUDED.imagem_url
            RETURNING id, nome, categoria, ativo, imagem_url, data_criacao
            "#,
        )
        .bind(id)
        .bind(nome)
        .bind(categoria)
        .bind(ativo)
        .bind(imagem_url)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Delete a product and its price history in one transaction. Deletion
    /// is gated behind deactivation so price history never disappears
    /// silently; re-running after a partial failure is safe.
    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), DeleteProductError> {
        let product = Self::find_by_id(db, id)
            .await?
            .ok_or(DeleteProductError::NotFound)?;
        if product.ativo {
            return Err(DeleteProductError::StillActive);
        }

        let mut tx = db.begin().await.map_err(anyhow::Error::from)?;
        sqlx::query("DELETE FROM prices WHERE produto_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(anyhow::Error::from)?;
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(anyhow::Error::from)?;
        tx.commit().await.map_err(anyhow::Error::from)?;
        Ok(())
    }
}
