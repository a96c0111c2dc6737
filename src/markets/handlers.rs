use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{with_distances, MarketListItem, MarketListQuery, SaveMarketRequest};
use super::repo::Market;
use crate::auth::extractors::AdminUser;
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/markets", get(list_markets))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/markets", get(list_all_markets).post(save_market))
        .route("/admin/markets/:id", delete(delete_market))
}

/// Active markets for consumers; with caller coordinates the list carries
/// computed distances and comes back nearest first.
#[instrument(skip(state))]
async fn list_markets(
    State(state): State<AppState>,
    Query(q): Query<MarketListQuery>,
) -> Result<Json<Vec<MarketListItem>>, (StatusCode, String)> {
    let markets = Market::list_active(&state.db).await.map_err(internal)?;
    let origin = match (q.lat, q.lon) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        _ => None,
    };
    Ok(Json(with_distances(markets, origin)))
}

#[instrument(skip(state))]
async fn list_all_markets(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<Market>>, (StatusCode, String)> {
    let markets = Market::list_all(&state.db).await.map_err(internal)?;
    Ok(Json(markets))
}

#[instrument(skip(state, payload))]
async fn save_market(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<SaveMarketRequest>,
) -> Result<Json<Market>, (StatusCode, String)> {
    if payload.nome.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "nome is required".into()));
    }

    let id = payload.id.unwrap_or_else(Uuid::new_v4);
    let market = Market::upsert(
        &state.db,
        id,
        payload.nome.trim(),
        payload.ativo,
        payload.latitude,
        payload.longitude,
    )
    .await
    .map_err(internal)?;

    info!(market_id = %market.id, admin_id = %admin, "market saved");
    Ok(Json(market))
}

#[instrument(skip(state))]
async fn delete_market(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    Market::delete(&state.db, id).await.map_err(internal)?;
    info!(market_id = %id, admin_id = %admin, "market deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
