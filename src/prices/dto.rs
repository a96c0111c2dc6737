use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::comparison::PriceComparison;

#[derive(Debug, Deserialize)]
pub struct SavePriceRequest {
    pub produto_id: Uuid,
    pub mercado_id: Uuid,
    pub valor: f64,
    #[serde(default = "default_ativo")]
    pub ativo: bool,
}

fn default_ativo() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ComparisonQuery {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct LowestPriceResponse {
    pub valor: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DeletedPricesResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub comparisons: Vec<PriceComparison>,
    /// Most expensive minus cheapest row; zero with fewer than two rows.
    pub savings: f64,
}
