use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::Market;
use crate::geo::calculate_distance;

#[derive(Debug, Deserialize)]
pub struct SaveMarketRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub nome: String,
    #[serde(default = "default_ativo")]
    pub ativo: bool,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

fn default_ativo() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct MarketListQuery {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// Market plus the distance computed from the caller's coordinates.
#[derive(Debug, Serialize)]
pub struct MarketListItem {
    #[serde(flatten)]
    pub market: Market,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distancia: Option<f64>,
}

/// Attach distances when the caller sent coordinates and reorder nearest
/// first; markets without coordinates keep their name order at the end.
pub fn with_distances(markets: Vec<Market>, origin: Option<(f64, f64)>) -> Vec<MarketListItem> {
    let mut items: Vec<MarketListItem> = markets
        .into_iter()
        .map(|market| {
            let distancia = match (origin, market.latitude, market.longitude) {
                (Some((lat, lon)), Some(mlat), Some(mlon)) => {
                    Some(calculate_distance(lat, lon, mlat, mlon))
                }
                _ => None,
            };
            MarketListItem { market, distancia }
        })
        .collect();

    if origin.is_some() {
        items.sort_by(|a, b| match (a.distancia, b.distancia) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn market(nome: &str, coords: Option<(f64, f64)>) -> Market {
        Market {
            id: Uuid::new_v4(),
            nome: nome.into(),
            ativo: true,
            data_criacao: OffsetDateTime::now_utc(),
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
        }
    }

    #[test]
    fn no_origin_keeps_order_and_omits_distance() {
        let items = with_distances(
            vec![market("Atacadão", Some((-23.5, -46.6))), market("Dia", None)],
            None,
        );
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.distancia.is_none()));
        assert_eq!(items[0].market.nome, "Atacadão");
    }

    #[test]
    fn origin_sorts_nearest_first_with_unlocated_last() {
        let items = with_distances(
            vec![
                market("Longe", Some((-22.90, -43.17))),
                market("Sem Endereço", None),
                market("Perto", Some((-23.55, -46.63))),
            ],
            Some((-23.5505, -46.6333)),
        );
        assert_eq!(items[0].market.nome, "Perto");
        assert_eq!(items[1].market.nome, "Longe");
        assert_eq!(items[2].market.nome, "Sem Endereço");
        assert!(items[0].distancia.unwrap() < items[1].distancia.unwrap());
        assert!(items[2].distancia.is_none());
    }
}
