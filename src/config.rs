use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Reverse-geocoding endpoint settings (Nominatim-compatible).
#[derive(Debug, Clone, Deserialize)]
pub struct GeoConfig {
    pub endpoint: String,
    pub contact_email: String,
    pub locale: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub geo: GeoConfig,
    /// Presence entries older than this are dropped from the online count.
    pub presence_ttl_seconds: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "economiza".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "economiza-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let geo = GeoConfig {
            endpoint: std::env::var("GEO_ENDPOINT")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org/reverse".into()),
            contact_email: std::env::var("GEO_CONTACT_EMAIL")
                .unwrap_or_else(|_| "contato@economizapay.com.br".into()),
            locale: std::env::var("GEO_LOCALE").unwrap_or_else(|_| "pt-BR".into()),
        };
        let presence_ttl_seconds = std::env::var("PRESENCE_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(90);
        Ok(Self {
            database_url,
            jwt,
            geo,
            presence_ttl_seconds,
        })
    }
}
