use rocket::form::Form;
use rocket::http::{CookieJar, Status};
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::models::settings::SiteSettings;
use crate::pages::{Chrome, LoginPage};
use crate::security::auth::{self, Viewer};
use crate::security::csrf::{self, CsrfToken};
use crate::store::Store;

use super::{NoCacheTemplate, PageResult, Reply, ServerError};

/// Same message for an unknown user and a wrong password.
pub const INVALID_LOGIN: &str = "Invalid username or password";

#[derive(Debug, FromForm)]
pub struct LoginForm {
    #[field(default = String::new())]
    pub csrf_token: String,
    #[field(default = String::new())]
    pub username: String,
    #[field(default = String::new())]
    pub password: String,
}

/// Body of forms that carry nothing but the CSRF token.
#[derive(Debug, FromForm)]
pub struct CsrfForm {
    #[field(default = String::new())]
    pub csrf_token: String,
}

fn login_template(
    store: &dyn Store,
    csrf_token: &str,
    authenticated: bool,
    error: Option<&str>,
) -> Result<NoCacheTemplate, ServerError> {
    let site = SiteSettings::load(store)?;
    let page = LoginPage {
        chrome: Chrome::new("Login", &site, authenticated, csrf_token),
        error: error.map(str::to_string),
    };
    Ok(NoCacheTemplate(Template::render("login", &page)))
}

#[get("/login")]
pub fn login_page(store: &State<Arc<dyn Store>>, viewer: Viewer, csrf: CsrfToken) -> PageResult {
    let template = login_template(&**store.inner(), &csrf.0, viewer.authenticated, None)?;
    Ok(Reply::Private(template))
}

#[post("/login", data = "<form>")]
pub fn login_submit(
    form: Form<LoginForm>,
    store: &State<Arc<dyn Store>>,
    config: &State<AuthConfig>,
    cookies: &CookieJar<'_>,
) -> PageResult {
    let s: &dyn Store = &**store.inner();

    if !csrf::verify(cookies, &form.csrf_token) {
        return Ok(Reply::forbidden());
    }

    if !auth::check_credentials(config, &form.username, &form.password) {
        log::warn!("Failed login attempt");
        let token = csrf::cookie_token(cookies).unwrap_or_default();
        let template = login_template(s, &token, false, Some(INVALID_LOGIN))?;
        return Ok(Reply::Rejected((Status::Unauthorized, template)));
    }

    let session = auth::create_session(s, auth::ADMIN_USER_ID)?;
    auth::set_session_cookie(cookies, &session, config.secure_cookies);
    log::info!("Admin signed in");

    Ok(Reply::Redirect(Redirect::to("/")))
}

#[get("/logout")]
pub fn logout_page() -> Redirect {
    Redirect::to("/")
}

/// Ends the session. The cookie is cleared even when no session row existed.
#[post("/logout", data = "<form>")]
pub fn logout(
    form: Form<CsrfForm>,
    store: &State<Arc<dyn Store>>,
    cookies: &CookieJar<'_>,
) -> Reply {
    if !csrf::verify(cookies, &form.csrf_token) {
        return Reply::forbidden();
    }

    let token = cookies
        .get(auth::SESSION_COOKIE)
        .map(|c| c.value().to_string());
    if let Some(token) = token {
        if let Err(e) = auth::destroy_session(&**store.inner(), &token) {
            log::error!("Failed to delete session on logout: {}", e);
        }
    }
    auth::clear_session_cookie(cookies);

    Reply::Redirect(Redirect::to("/"))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login_page, login_submit, logout_page, logout]
}
