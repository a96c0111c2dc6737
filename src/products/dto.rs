use serde::Deserialize;
use uuid::Uuid;

/// Sentinel category meaning "no category filter".
pub const CATEGORIA_TODAS: &str = "Todas";

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    /// Substring search on the product name.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub categoria: Option<String>,
    /// Client-issued sequence number echoed back in `x-query-seq` so a
    /// debounced search can discard responses that are no longer the
    /// latest issued.
    #[serde(default)]
    pub seq: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SaveProductRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub nome: String,
    pub categoria: String,
    #[serde(default = "default_ativo")]
    pub ativo: bool,
    #[serde(default)]
    pub imagem_url: Option<String>,
}

fn default_ativo() -> bool {
    true
}

/// Empty strings and the "Todas" sentinel mean no filter.
pub fn normalize_categoria(categoria: Option<&str>) -> Option<String> {
    categoria
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != CATEGORIA_TODAS)
        .map(str::to_string)
}

pub fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todas_sentinel_means_no_category_filter() {
        assert_eq!(normalize_categoria(Some("Todas")), None);
        assert_eq!(normalize_categoria(Some("")), None);
        assert_eq!(normalize_categoria(None), None);
        assert_eq!(
            normalize_categoria(Some("Alimentos")).as_deref(),
            Some("Alimentos")
        );
    }

    #[test]
    fn blank_search_terms_are_dropped() {
        assert_eq!(normalize_search(Some("  ")), None);
        assert_eq!(normalize_search(Some(" arroz ")).as_deref(), Some("arroz"));
    }
}
