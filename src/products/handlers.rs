use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{normalize_categoria, normalize_search, ProductListQuery, SaveProductRequest};
use super::repo::{DeleteProductError, Product};
use crate::auth::extractors::AdminUser;
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/products", get(list_products))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/products", get(list_all_products).post(save_product))
        .route("/admin/products/:id", delete(delete_product))
}

/// Consumer search: always restricted to active products. The optional
/// `seq` is echoed back so clients can drop stale in-flight responses.
#[instrument(skip(state))]
async fn list_products(
    State(state): State<AppState>,
    Query(q): Query<ProductListQuery>,
) -> Result<(HeaderMap, Json<Vec<Product>>), (StatusCode, String)> {
    let search = normalize_search(q.q.as_deref());
    let categoria = normalize_categoria(q.categoria.as_deref());

    let products = Product::list(&state.db, search.as_deref(), categoria.as_deref(), true)
        .await
        .map_err(internal)?;

    let mut headers = HeaderMap::new();
    if let Some(seq) = q.seq {
        if let Ok(value) = seq.to_string().parse() {
            headers.insert("x-query-seq", value);
        }
    }
    Ok((headers, Json(products)))
}

/// Admin listing sees both active and inactive products.
#[instrument(skip(state))]
async fn list_all_products(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<ProductListQuery>,
) -> Result<Json<Vec<Product>>, (StatusCode, String)> {
    let search = normalize_search(q.q.as_deref());
    let categoria = normalize_categoria(q.categoria.as_deref());

    let products = Product::list(&state.db, search.as_deref(), categoria.as_deref(), false)
        .await
        .map_err(internal)?;
    Ok(Json(products))
}

#[instrument(skip(state, payload))]
async fn save_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<SaveProductRequest>,
) -> Result<Json<Product>, (StatusCode, String)> {
    if payload.nome.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "nome is required".into()));
    }
    if payload.categoria.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "categoria is required".into()));
    }

    let id = payload.id.unwrap_or_else(Uuid::new_v4);
    let product = Product::upsert(
        &state.db,
        id,
        payload.nome.trim(),
        payload.categoria.trim(),
        payload.ativo,
        payload.imagem_url.as_deref(),
    )
    .await
    .map_err(internal)?;

    info!(product_id = %product.id, admin_id = %admin, "product saved");
    Ok(Json(product))
}

#[instrument(skip(state))]
async fn delete_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    match Product::delete(&state.db, id).await {
        Ok(()) => {
            info!(product_id = %id, admin_id = %admin, "product and price history deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(DeleteProductError::NotFound) => {
            Err((StatusCode::NOT_FOUND, "Product not found".into()))
        }
        Err(e @ DeleteProductError::StillActive) => {
            warn!(product_id = %id, "delete refused for active product");
            Err((StatusCode::CONFLICT, e.to_string()))
        }
        Err(DeleteProductError::Other(e)) => Err(internal(e)),
    }
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
