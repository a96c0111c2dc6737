use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::comparison::{build_comparisons, savings};
use super::dto::{
    ComparisonQuery, ComparisonResponse, DeletedPricesResponse, LowestPriceResponse,
    SavePriceRequest,
};
use super::repo::Price;
use crate::auth::extractors::AdminUser;
use crate::markets::repo::Market;
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/products/:id/prices", get(product_prices))
        .route("/products/:id/lowest-price", get(lowest_price))
        .route("/products/:id/comparison", get(comparison))
        .route("/markets/:id/prices", get(market_prices))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/prices", post(save_price))
        .route("/admin/products/:id/prices", delete(delete_product_prices))
}

#[instrument(skip(state))]
async fn product_prices(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Price>>, (StatusCode, String)> {
    let prices = Price::list(&state.db, Some(id), None)
        .await
        .map_err(internal)?;
    Ok(Json(prices))
}

#[instrument(skip(state))]
async fn market_prices(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Price>>, (StatusCode, String)> {
    let prices = Price::list(&state.db, None, Some(id))
        .await
        .map_err(internal)?;
    Ok(Json(prices))
}

#[instrument(skip(state))]
async fn lowest_price(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LowestPriceResponse>, (StatusCode, String)> {
    let valor = Price::lowest_for_product(&state.db, id)
        .await
        .map_err(internal)?;
    Ok(Json(LowestPriceResponse { valor }))
}

/// Recomputed on every call: active prices for the product joined against
/// the active market list, cheapest first, with the tied-lowest rows
/// flagged. Inactive markets fall back to the placeholder name.
#[instrument(skip(state))]
async fn comparison(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<ComparisonQuery>,
) -> Result<Json<ComparisonResponse>, (StatusCode, String)> {
    let prices = Price::list(&state.db, Some(id), None)
        .await
        .map_err(internal)?;
    let markets = Market::list_active(&state.db).await.map_err(internal)?;

    let origin = match (q.lat, q.lon) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        _ => None,
    };
    let comparisons = build_comparisons(&prices, &markets, origin);
    let savings = savings(&comparisons);
    Ok(Json(ComparisonResponse {
        comparisons,
        savings,
    }))
}

#[instrument(skip(state, payload))]
async fn save_price(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<SavePriceRequest>,
) -> Result<Json<Price>, (StatusCode, String)> {
    if !payload.valor.is_finite() || payload.valor <= 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "valor must be a positive amount".into(),
        ));
    }

    // Two decimal places of currency precision
    let valor = (payload.valor * 100.0).round() / 100.0;

    let price = Price::save(
        &state.db,
        payload.produto_id,
        payload.mercado_id,
        valor,
        payload.ativo,
    )
    .await
    .map_err(internal)?;

    info!(
        price_id = %price.id,
        produto_id = %price.produto_id,
        mercado_id = %price.mercado_id,
        admin_id = %admin,
        "price saved"
    );
    Ok(Json(price))
}

/// Standalone cascade step: wipe a product's price history without
/// touching the product row. Idempotent, reports how many rows went away.
#[instrument(skip(state))]
async fn delete_product_prices(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedPricesResponse>, (StatusCode, String)> {
    let deleted = Price::delete_for_product(&state.db, id)
        .await
        .map_err(internal)?;
    info!(produto_id = %id, admin_id = %admin, deleted, "price history cleared");
    Ok(Json(DeletedPricesResponse { deleted }))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
