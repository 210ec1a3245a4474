use anyhow::{anyhow, bail, Context, Result};
use common_session::{CookieSameSite, CookieSettings, GateConfig, DEFAULT_COOKIE_NAME};
use std::env;
use std::net::IpAddr;
use std::time::Duration;

/// Upper bound for `SESSION_TTL_HOURS` (one year).
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Staging,
    Development,
    Test,
}

impl Environment {
    /// Production-like environments get strict cookie and storage requirements.
    pub fn is_production_like(&self) -> bool {
        matches!(self, Environment::Production | Environment::Staging)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Development => "development",
            Environment::Test => "test",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: IpAddr,
    pub port: u16,
    pub database_url: Option<String>,
    pub cookie: CookieSettings,
    pub session_ttl_hours: i64,
    pub lookup_timeout: Duration,
    pub cors_origins: Vec<String>,
    pub seed_admin: Option<SeedAdmin>,
}

impl AppConfig {
    pub fn gate_config(&self) -> GateConfig {
        GateConfig::new()
            .with_cookie(self.cookie.clone())
            .with_lookup_timeout(self.lookup_timeout)
    }

    /// Clamped to `1..=MAX_SESSION_TTL_HOURS` so hand-built configs cannot overflow.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS))
    }

    /// Settings for in-process tests: in-memory store, insecure cookies allowed.
    pub fn for_tests() -> Self {
        Self {
            environment: Environment::Test,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            database_url: None,
            cookie: CookieSettings { secure: false, ..CookieSettings::default() },
            session_ttl_hours: 24,
            lookup_timeout: Duration::from_millis(1500),
            cors_origins: vec!["http://localhost:3010".to_string()],
            seed_admin: None,
        }
    }
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(|key| env::var(key).ok())
}

pub fn load_config_from<F>(lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).and_then(|value| normalize_optional(&value));

    let environment = get("APP_ENV")
        .map(|value| parse_environment(&value))
        .transpose()
        .context("Failed to parse APP_ENV")?
        .unwrap_or(Environment::Production);

    let host: IpAddr = get("HOST")
        .unwrap_or_else(|| "0.0.0.0".to_string())
        .parse()
        .context("Failed to parse HOST")?;
    let port: u16 = get("PORT")
        .map(|value| value.parse())
        .transpose()
        .context("Failed to parse PORT")?
        .unwrap_or(8085);

    let database_url = get("DATABASE_URL");

    let cookie_secure = get("SESSION_COOKIE_SECURE")
        .map(|value| parse_bool(&value))
        .unwrap_or(true);
    let same_site = get("SESSION_COOKIE_SAMESITE")
        .map(|value| parse_same_site(&value))
        .transpose()
        .context("Failed to parse SESSION_COOKIE_SAMESITE")?
        .unwrap_or(CookieSameSite::Lax);
    let cookie = CookieSettings {
        name: get("SESSION_COOKIE_NAME").unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string()),
        domain: get("SESSION_COOKIE_DOMAIN"),
        path: "/".to_string(),
        secure: cookie_secure,
        same_site,
    };

    let session_ttl_hours: i64 = get("SESSION_TTL_HOURS")
        .map(|value| value.parse())
        .transpose()
        .context("Failed to parse SESSION_TTL_HOURS")?
        .unwrap_or(168);
    let lookup_timeout_ms: u64 = get("SESSION_LOOKUP_TIMEOUT_MS")
        .map(|value| value.parse())
        .transpose()
        .context("Failed to parse SESSION_LOOKUP_TIMEOUT_MS")?
        .unwrap_or(1500);

    let cors_origins = get("CORS_ALLOWED_ORIGINS")
        .map(|value| parse_list(&value))
        .unwrap_or_else(|| vec!["http://localhost:3010".to_string()]);

    let seed_admin = match (get("SEED_ADMIN_EMAIL"), get("SEED_ADMIN_PASSWORD")) {
        (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
        (None, None) => None,
        _ => bail!("SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD must be set together"),
    };

    let config = AppConfig {
        environment,
        host,
        port,
        database_url,
        cookie,
        session_ttl_hours,
        lookup_timeout: Duration::from_millis(lookup_timeout_ms),
        cors_origins,
        seed_admin,
    };
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.session_ttl_hours <= 0 || config.session_ttl_hours > MAX_SESSION_TTL_HOURS {
        bail!("SESSION_TTL_HOURS must be between 1 and {MAX_SESSION_TTL_HOURS}");
    }
    if config.lookup_timeout.is_zero() {
        bail!("SESSION_LOOKUP_TIMEOUT_MS must be positive");
    }
    if config.cookie.name.is_empty()
        || !config
            .cookie
            .name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-'))
    {
        bail!("SESSION_COOKIE_NAME '{}' is not a valid cookie name", config.cookie.name);
    }
    if config.cookie.same_site == CookieSameSite::None && !config.cookie.secure {
        bail!("SESSION_COOKIE_SAMESITE=None requires SESSION_COOKIE_SECURE=true");
    }
    if config.environment.is_production_like() {
        if !config.cookie.secure {
            bail!(
                "SESSION_COOKIE_SECURE cannot be disabled in {}",
                config.environment.as_str()
            );
        }
        if config.database_url.is_none() {
            bail!("DATABASE_URL must be set in {}", config.environment.as_str());
        }
        if config.seed_admin.is_some() {
            bail!("SEED_ADMIN_* is only honoured outside production-like environments");
        }
    }
    Ok(())
}

fn parse_environment(value: &str) -> Result<Environment> {
    match value.trim().to_ascii_lowercase().as_str() {
        "production" | "prod" => Ok(Environment::Production),
        "staging" => Ok(Environment::Staging),
        "development" | "dev" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        other => Err(anyhow!(
            "Unsupported environment '{other}'. Use production, staging, development, or test."
        )),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(normalize_optional)
        .collect()
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_same_site(value: &str) -> Result<CookieSameSite> {
    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => Ok(CookieSameSite::Lax),
        "strict" => Ok(CookieSameSite::Strict),
        "none" => Ok(CookieSameSite::None),
        other => Err(anyhow!(
            "Unsupported cookie same-site policy '{other}'. Use Lax, Strict, or None."
        )),
    }
}
