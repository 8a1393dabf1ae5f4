use chrono::{Duration, Utc};
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::error::StoreError;
use crate::models::session::Session;
use crate::store::Store;

pub const SESSION_COOKIE: &str = "session";

/// Where unauthenticated requests for protected pages are sent.
pub const LOGIN_PATH: &str = "/login";

/// The single admin principal.
pub const ADMIN_USER_ID: i64 = 1;

pub fn session_lifetime() -> Duration {
    Duration::hours(24)
}

// ── Request guards ──

/// Guard for protected routes: succeeds only with a live session cookie.
/// On failure it forwards with 401 so the lower-ranked login redirect for
/// the same path answers instead.
pub struct AdminUser {
    pub session: Session,
}

impl AdminUser {
    pub fn user_id(&self) -> i64 {
        self.session.user_id
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match resolve_session(request).await {
            Some(session) => Outcome::Success(AdminUser { session }),
            None => Outcome::Forward(Status::Unauthorized),
        }
    }
}

/// Non-failing guard telling a handler whether the visitor is signed in.
pub struct Viewer {
    pub authenticated: bool,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Viewer {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let authenticated = resolve_session(request).await.is_some();
        Outcome::Success(Viewer { authenticated })
    }
}

async fn resolve_session(request: &Request<'_>) -> Option<Session> {
    let store = request
        .guard::<&State<Arc<dyn Store>>>()
        .await
        .succeeded()?;
    let token = request.cookies().get(SESSION_COOKIE)?.value().to_string();

    match get_session(&**store.inner(), &token) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Session lookup failed: {}", e);
            None
        }
    }
}

// ── Password utilities ──

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Check a login attempt. Both halves are always evaluated so a wrong
/// username costs the same bcrypt round as a wrong password.
pub fn check_credentials(config: &AuthConfig, username: &str, password: &str) -> bool {
    let user_ok = super::constant_time_eq(username.as_bytes(), config.admin_username.as_bytes());
    let pass_ok = verify_password(password, &config.admin_password_hash);
    user_ok & pass_ok
}

// ── Session management ──

pub fn create_session(store: &dyn Store, user_id: i64) -> Result<Session, StoreError> {
    let session = Session {
        token: super::generate_token(),
        user_id,
        expires_at: Utc::now().naive_utc() + session_lifetime(),
    };
    store.session_insert(&session)?;
    Ok(session)
}

/// The session for `token`, unless it is unknown or already expired.
pub fn get_session(store: &dyn Store, token: &str) -> Result<Option<Session>, StoreError> {
    store.session_get(token, Utc::now().naive_utc())
}

pub fn destroy_session(store: &dyn Store, token: &str) -> Result<(), StoreError> {
    store.session_delete(token)
}

pub fn cleanup_expired_sessions(store: &dyn Store) -> Result<usize, StoreError> {
    store.session_purge_expired(Utc::now().naive_utc())
}

// ── Cookies ──

/// HttpOnly, SameSite=Lax, living exactly as long as the session row.
pub fn set_session_cookie(cookies: &CookieJar<'_>, session: &Session, secure: bool) {
    let remaining = (session.expires_at - Utc::now().naive_utc()).num_seconds().max(0);

    let mut cookie = Cookie::new(SESSION_COOKIE, session.token.clone());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_secure(secure);
    cookie.set_max_age(rocket::time::Duration::seconds(remaining));
    cookies.add(cookie);
}

pub fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove(Cookie::from(SESSION_COOKIE));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::test_store;

    fn config() -> AuthConfig {
        AuthConfig {
            admin_username: "admin".to_string(),
            admin_password_hash: hash_password("s3cret", 4).unwrap(),
            secure_cookies: false,
        }
    }

    #[test]
    fn password_hash_and_verify() {
        let hash = hash_password("pw", 4).unwrap();
        assert!(verify_password("pw", &hash));
        assert!(!verify_password("PW", &hash));
        assert!(!verify_password("pw", "not-a-bcrypt-hash"));
        assert_ne!(hash, hash_password("pw", 4).unwrap());
    }

    #[test]
    fn credentials_need_both_halves() {
        let c = config();
        assert!(check_credentials(&c, "admin", "s3cret"));
        assert!(!check_credentials(&c, "admin", "wrong"));
        assert!(!check_credentials(&c, "root", "s3cret"));
        assert!(!check_credentials(&c, "", ""));
    }

    #[test]
    fn admin_guard_reports_session_user() {
        let s = test_store();
        let session = create_session(&s, ADMIN_USER_ID).unwrap();
        let admin = AdminUser {
            session: get_session(&s, &session.token).unwrap().unwrap(),
        };
        assert_eq!(admin.user_id(), ADMIN_USER_ID);
    }

    #[test]
    fn session_create_and_lookup() {
        let s = test_store();
        let session = create_session(&s, ADMIN_USER_ID).unwrap();
        assert_eq!(session.token.len(), 64);

        let found = get_session(&s, &session.token).unwrap().unwrap();
        assert_eq!(found.user_id, ADMIN_USER_ID);

        let lifetime = session.expires_at - Utc::now().naive_utc();
        assert!(lifetime > Duration::hours(23) && lifetime <= Duration::hours(24));

        assert!(get_session(&s, "nonexistent").unwrap().is_none());
    }

    #[test]
    fn expired_unpurged_session_is_absent() {
        let s = test_store();
        s.session_insert(&Session {
            token: "stale".to_string(),
            user_id: ADMIN_USER_ID,
            expires_at: Utc::now().naive_utc() - Duration::minutes(1),
        })
        .unwrap();

        assert!(get_session(&s, "stale").unwrap().is_none());
    }

    #[test]
    fn destroy_is_idempotent() {
        let s = test_store();
        let session = create_session(&s, ADMIN_USER_ID).unwrap();
        destroy_session(&s, &session.token).unwrap();
        assert!(get_session(&s, &session.token).unwrap().is_none());
        destroy_session(&s, &session.token).unwrap();
    }

    #[test]
    fn cleanup_keeps_live_sessions() {
        let s = test_store();
        let live = create_session(&s, ADMIN_USER_ID).unwrap();
        s.session_insert(&Session {
            token: "expired-sess".to_string(),
            user_id: ADMIN_USER_ID,
            expires_at: Utc::now().naive_utc() - Duration::days(1),
        })
        .unwrap();

        assert_eq!(cleanup_expired_sessions(&s).unwrap(), 1);
        assert!(get_session(&s, &live.token).unwrap().is_some());
    }
}
