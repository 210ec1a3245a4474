use std::time::Duration;

pub const DEFAULT_COOKIE_NAME: &str = "session_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieSameSite {
    Lax,
    Strict,
    None,
}

impl CookieSameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            CookieSameSite::Lax => "Lax",
            CookieSameSite::Strict => "Strict",
            CookieSameSite::None => "None",
        }
    }
}

/// Attributes of the cookie carrying the session token.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub domain: Option<String>,
    pub path: String,
    pub secure: bool,
    pub same_site: CookieSameSite,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            domain: None,
            path: "/".to_string(),
            secure: true,
            same_site: CookieSameSite::Lax,
        }
    }
}

/// Runtime configuration for the session gate.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub cookie: CookieSettings,
    /// Upper bound on a single store lookup; exceeding it fails closed.
    pub lookup_timeout: Duration,
}

impl GateConfig {
    /// Defaults: `session_token` cookie, secure, 1.5 second lookup bound.
    pub fn new() -> Self {
        Self {
            cookie: CookieSettings::default(),
            lookup_timeout: Duration::from_millis(1500),
        }
    }

    pub fn with_cookie(mut self, cookie: CookieSettings) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new()
    }
}
