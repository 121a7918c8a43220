//! Auth cookies set on login and refresh

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// One day
const ACCESS_COOKIE_MAX_AGE: Duration = Duration::seconds(86_400);
/// Seven days
const REFRESH_COOKIE_MAX_AGE: Duration = Duration::seconds(604_800);

fn auth_cookie(name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(max_age)
        .build()
}

pub fn access_cookie(token: &str) -> Cookie<'static> {
    auth_cookie(ACCESS_COOKIE, token.to_string(), ACCESS_COOKIE_MAX_AGE)
}

pub fn refresh_cookie(token: &str) -> Cookie<'static> {
    auth_cookie(REFRESH_COOKIE, token.to_string(), REFRESH_COOKIE_MAX_AGE)
}

/// Expired cookies that make the browser drop both tokens
pub fn cleared_cookies() -> [Cookie<'static>; 2] {
    [
        auth_cookie(ACCESS_COOKIE, String::new(), Duration::ZERO),
        auth_cookie(REFRESH_COOKIE, String::new(), Duration::ZERO),
    ]
}
