//! Session Cookies
//!
//! Login and refresh hand the token pair to browsers as `HttpOnly` cookies in
//! addition to the JSON body. Logout and account deletion expire them.

use axum::{
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderName,
    },
    response::AppendHeaders,
};
use cookie::{time::Duration, Cookie, SameSite};

use crate::config::CookieConfig;
use crate::models::TokenPair;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// `Set-Cookie` headers for both token cookies
pub type CookieHeaders = AppendHeaders<[(HeaderName, String); 2]>;

fn token_cookie(
    name: &'static str,
    value: String,
    max_age_seconds: i64,
    config: &CookieConfig,
) -> Cookie<'static> {
    let mut builder = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_seconds));

    if let Some(domain) = &config.domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

/// Cookies carrying a freshly issued token pair, each living as long as its token
pub fn session_cookies(tokens: &TokenPair, config: &CookieConfig) -> CookieHeaders {
    let access = token_cookie(
        ACCESS_TOKEN_COOKIE,
        tokens.access_token.clone(),
        tokens.expires_in,
        config,
    );
    let refresh = token_cookie(
        REFRESH_TOKEN_COOKIE,
        tokens.refresh_token.clone(),
        tokens.refresh_expires_in,
        config,
    );

    AppendHeaders([
        (SET_COOKIE, access.to_string()),
        (SET_COOKIE, refresh.to_string()),
    ])
}

/// Cookies that make the browser drop both tokens
pub fn cleared_cookies(config: &CookieConfig) -> CookieHeaders {
    let mut access = token_cookie(ACCESS_TOKEN_COOKIE, String::new(), 0, config);
    access.make_removal();
    let mut refresh = token_cookie(REFRESH_TOKEN_COOKIE, String::new(), 0, config);
    refresh.make_removal();

    AppendHeaders([
        (SET_COOKIE, access.to_string()),
        (SET_COOKIE, refresh.to_string()),
    ])
}

/// Value of the named request cookie, if present
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
