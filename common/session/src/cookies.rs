use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::config::{CookieSameSite, CookieSettings};

/// Raw token from the configured cookie, if present and non-blank.
pub fn session_token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(cookie_name)
        .map(|c| c.value().trim().to_string())
        .filter(|value| !value.is_empty())
}

fn same_site(value: CookieSameSite) -> SameSite {
    match value {
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::None => SameSite::None,
    }
}

/// Session cookie issued at sign-in. Always HttpOnly.
pub fn session_cookie(settings: &CookieSettings, token: &str, max_age_seconds: i64) -> Cookie<'static> {
    let mut builder = Cookie::build((settings.name.clone(), token.to_string()))
        .http_only(true)
        .secure(settings.secure)
        .same_site(same_site(settings.same_site))
        .path(settings.path.clone())
        .max_age(Duration::seconds(max_age_seconds.max(0)));
    if let Some(domain) = &settings.domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

/// Removal cookie for sign-out.
pub fn clear_session_cookie(settings: &CookieSettings) -> Cookie<'static> {
    let mut builder = Cookie::build((settings.name.clone(), ""))
        .http_only(true)
        .secure(settings.secure)
        .same_site(same_site(settings.same_site))
        .path(settings.path.clone())
        .max_age(Duration::ZERO);
    if let Some(domain) = &settings.domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}
