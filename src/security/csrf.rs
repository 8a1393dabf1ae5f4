//! Double-submit cookie CSRF protection.
//!
//! Every page with a form carries the token from the `csrf` cookie in a
//! hidden `csrf_token` field; a POST is accepted only when both copies are
//! present and identical.

use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::request::{FromRequest, Outcome, Request};

use super::auth::session_lifetime;
use super::{constant_time_eq, generate_token};
use crate::config::AuthConfig;

pub const CSRF_COOKIE: &str = "csrf";

/// The visitor's CSRF token, minted and set as a cookie on first use.
#[derive(Debug, Clone)]
pub struct CsrfToken(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CsrfToken {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let cookies = request.cookies();
        if let Some(existing) = cookie_token(cookies) {
            return Outcome::Success(CsrfToken(existing));
        }

        let secure = request
            .rocket()
            .state::<AuthConfig>()
            .map(|c| c.secure_cookies)
            .unwrap_or(false);
        let token = generate_token();
        set_csrf_cookie(cookies, &token, secure);
        Outcome::Success(CsrfToken(token))
    }
}

/// Token from the request's cookie, if it carries a non-empty one.
pub fn cookie_token(cookies: &CookieJar<'_>) -> Option<String> {
    cookies
        .get(CSRF_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Site-wide, SameSite=Strict, readable by scripts, same lifetime as a session.
pub fn set_csrf_cookie(cookies: &CookieJar<'_>, token: &str, secure: bool) {
    let mut cookie = Cookie::new(CSRF_COOKIE, token.to_string());
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Strict);
    cookie.set_http_only(false);
    cookie.set_secure(secure);
    cookie.set_max_age(rocket::time::Duration::seconds(session_lifetime().num_seconds()));
    cookies.add(cookie);
}

/// Both tokens must be present and byte-equal.
pub fn validate(cookie_token: &str, form_token: &str) -> bool {
    if cookie_token.is_empty() || form_token.is_empty() {
        return false;
    }
    constant_time_eq(cookie_token.as_bytes(), form_token.as_bytes())
}

/// Check a submitted form token against the request's cookie.
pub fn verify(cookies: &CookieJar<'_>, form_token: &str) -> bool {
    match cookie_token(cookies) {
        Some(cookie) => validate(&cookie, form_token),
        None => false,
    }
}
