use std::collections::HashMap;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Price;
use crate::geo::calculate_distance;
use crate::markets::repo::Market;

/// Shown when a price row references a market that no longer exists.
pub const UNKNOWN_MARKET: &str = "Mercado desconhecido";

/// One row of the product-detail comparison table; derived, never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceComparison {
    pub market_name: String,
    pub price: f64,
    pub last_update: OffsetDateTime,
    pub is_lowest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distancia: Option<f64>,
}

/// Build the comparison set for one product's active prices: resolve market
/// names from the active markets only, flag every row tied at the minimum
/// (only when the minimum is strictly positive) and sort ascending by
/// price. Rows pointing at an inactive or deleted market keep the
/// placeholder name.
pub fn build_comparisons(
    prices: &[Price],
    markets: &[Market],
    origin: Option<(f64, f64)>,
) -> Vec<PriceComparison> {
    let by_id: HashMap<Uuid, &Market> = markets
        .iter()
        .filter(|m| m.ativo)
        .map(|m| (m.id, m))
        .collect();

    let lowest = prices
        .iter()
        .map(|p| p.valor)
        .fold(None::<f64>, |acc, v| match acc {
            Some(min) if min <= v => Some(min),
            _ => Some(v),
        })
        .filter(|min| *min > 0.0);

    let mut rows: Vec<PriceComparison> = prices
        .iter()
        .map(|p| {
            let market = by_id.get(&p.mercado_id).copied();
            let market_name = market
                .map(|m| m.nome.clone())
                .unwrap_or_else(|| UNKNOWN_MARKET.to_string());
            let distancia = match (origin, market) {
                (Some((lat, lon)), Some(m)) => match (m.latitude, m.longitude) {
                    (Some(mlat), Some(mlon)) => Some(calculate_distance(lat, lon, mlat, mlon)),
                    _ => None,
                },
                _ => None,
            };
            PriceComparison {
                market_name,
                price: p.valor,
                last_update: p.data_atualizacao,
                is_lowest: lowest.map(|min| p.valor == min).unwrap_or(false),
                distancia,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        a.price
            .partial_cmp(&b.price)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}

/// Difference between the most expensive and the cheapest row; zero when
/// fewer than two rows exist or no row carries the lowest flag (a
/// non-positive minimum flags nothing, so it also yields no savings).
pub fn savings(rows: &[PriceComparison]) -> f64 {
    if rows.len() < 2 || !rows.iter().any(|r| r.is_lowest) {
        return 0.0;
    }
    let min = rows.iter().map(|r| r.price).fold(f64::INFINITY, f64::min);
    let max = rows.iter().map(|r| r.price).fold(f64::NEG_INFINITY, f64::max);
    max - min
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(produto_id: Uuid, mercado_id: Uuid, valor: f64) -> Price {
        Price {
            id: Uuid::new_v4(),
            produto_id,
            mercado_id,
            valor,
            ativo: true,
            data_atualizacao: OffsetDateTime::now_utc(),
        }
    }

    fn market(id: Uuid, nome: &str) -> Market {
        Market {
            id,
            nome: nome.into(),
            ativo: true,
            data_criacao: OffsetDateTime::now_utc(),
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn lowest_and_savings_for_two_markets() {
        let p1 = Uuid::new_v4();
        let m1 = Uuid::new_v4();
        let m2 = Uuid::new_v4();
        let prices = vec![price(p1, m1, 24.90), price(p1, m2, 23.50)];
        let markets = vec![market(m1, "Mercado Um"), market(m2, "Mercado Dois")];

        let rows = build_comparisons(&prices, &markets, None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].market_name, "Mercado Dois");
        assert_eq!(rows[0].price, 23.50);
        assert!(rows[0].is_lowest);
        assert!(!rows[1].is_lowest);
        assert!((savings(&rows) - 1.40).abs() < 1e-9);
    }

    #[test]
    fn all_rows_tied_at_minimum_are_flagged() {
        let p1 = Uuid::new_v4();
        let prices = vec![
            price(p1, Uuid::new_v4(), 9.99),
            price(p1, Uuid::new_v4(), 9.99),
            price(p1, Uuid::new_v4(), 12.00),
        ];
        let rows = build_comparisons(&prices, &[], None);
        assert_eq!(rows.iter().filter(|r| r.is_lowest).count(), 2);
        assert!(!rows[2].is_lowest);
    }

    #[test]
    fn missing_market_gets_placeholder_name() {
        let prices = vec![price(Uuid::new_v4(), Uuid::new_v4(), 5.00)];
        let rows = build_comparisons(&prices, &[], None);
        assert_eq!(rows[0].market_name, UNKNOWN_MARKET);
    }

    #[test]
    fn inactive_market_resolves_to_placeholder_name() {
        let p1 = Uuid::new_v4();
        let m1 = Uuid::new_v4();
        let mut inactive = market(m1, "Mercado Desativado");
        inactive.ativo = false;

        let rows = build_comparisons(&[price(p1, m1, 6.00)], &[inactive], None);
        assert_eq!(rows[0].market_name, UNKNOWN_MARKET);
    }

    #[test]
    fn non_positive_minimum_flags_nothing_and_yields_no_savings() {
        let p1 = Uuid::new_v4();
        let prices = vec![price(p1, Uuid::new_v4(), 0.0), price(p1, Uuid::new_v4(), 3.0)];
        let rows = build_comparisons(&prices, &[], None);
        assert!(rows.iter().all(|r| !r.is_lowest));
        assert_eq!(savings(&rows), 0.0);
    }

    #[test]
    fn empty_set_yields_no_rows_and_zero_savings() {
        let rows = build_comparisons(&[], &[], None);
        assert!(rows.is_empty());
        assert_eq!(savings(&rows), 0.0);
    }

    #[test]
    fn single_row_has_zero_savings() {
        let prices = vec![price(Uuid::new_v4(), Uuid::new_v4(), 7.50)];
        let rows = build_comparisons(&prices, &[], None);
        assert_eq!(savings(&rows), 0.0);
    }

    #[test]
    fn rows_are_sorted_ascending_by_price() {
        let p1 = Uuid::new_v4();
        let prices = vec![
            price(p1, Uuid::new_v4(), 12.00),
            price(p1, Uuid::new_v4(), 8.00),
            price(p1, Uuid::new_v4(), 10.00),
        ];
        let rows = build_comparisons(&prices, &[], None);
        let values: Vec<f64> = rows.iter().map(|r| r.price).collect();
        assert_eq!(values, vec![8.00, 10.00, 12.00]);
    }

    #[test]
    fn distance_is_computed_when_market_has_coordinates() {
        let p1 = Uuid::new_v4();
        let m1 = Uuid::new_v4();
        let mut m = market(m1, "Com Coordenadas");
        m.latitude = Some(-23.55);
        m.longitude = Some(-46.63);
        let rows = build_comparisons(
            &[price(p1, m1, 4.20)],
            &[m],
            Some((-23.5505, -46.6333)),
        );
        assert!(rows[0].distancia.is_some());
        assert!(rows[0].distancia.unwrap() < 5.0);
    }
}
