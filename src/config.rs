use chrono::NaiveTime;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// HS256 signing secret shared with the token issuer. Loaded once at
    /// process start; never reloaded.
    pub secret: String,
    /// Exact-match request paths exempt from the auth gate (join, login,
    /// token exchange and the like).
    pub bypass_paths: Vec<String>,
    /// Lifetime of reissued access tokens, in milliseconds.
    /// Set via TOKENGATE_ACCESS_TTL_MS. Default: 600000 (10 minutes).
    pub access_ttl_ms: i64,
    /// UTC wall-clock time of the daily refresh-token sweep (HH:MM).
    pub sweep_at: NaiveTime,
}

impl Config {
    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.access_ttl_ms)
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let secret = std::env::var("TOKENGATE_SECRET")
        .unwrap_or_else(|_| "CHANGE_ME_INSECURE_DEV_SECRET".into());

    if secret == "CHANGE_ME_INSECURE_DEV_SECRET" {
        let env_mode = std::env::var("TOKENGATE_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "TOKENGATE_SECRET is still the insecure placeholder. \
                 Set a proper signing secret before running in production."
            );
        }
        eprintln!("⚠️  TOKENGATE_SECRET is not set — using insecure placeholder. Set a real signing secret for production.");
    }

    let sweep_at_raw = std::env::var("TOKENGATE_SWEEP_AT").unwrap_or_else(|_| "00:00".into());
    let sweep_at = NaiveTime::parse_from_str(&sweep_at_raw, "%H:%M")
        .map_err(|e| anyhow::anyhow!("invalid TOKENGATE_SWEEP_AT '{}': {}", sweep_at_raw, e))?;

    Ok(Config {
        port: std::env::var("TOKENGATE_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/tokengate".into()),
        secret,
        bypass_paths: std::env::var("TOKENGATE_BYPASS_PATHS")
            .unwrap_or_else(|_| "/join,/login,/reissue".into())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        access_ttl_ms: std::env::var("TOKENGATE_ACCESS_TTL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(600_000),
        sweep_at,
    })
}
