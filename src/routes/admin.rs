use rocket::form::Form;
use rocket::http::{CookieJar, Status};
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use std::sync::Arc;

use crate::models::post::PostForm;
use crate::models::settings::SiteSettings;
use crate::pages::{self, Chrome, DeletePage, EditorFields, EditorPage, PostView, SettingsPage};
use crate::posts;
use crate::security::auth::{AdminUser, LOGIN_PATH};
use crate::security::csrf::{self, CsrfToken};
use crate::store::Store;

use super::auth::CsrfForm;
use super::{NoCacheTemplate, PageResult, Reply, ServerError};

#[derive(Debug, FromForm)]
pub struct PostSubmission {
    #[field(default = String::new())]
    pub csrf_token: String,
    #[field(default = String::new())]
    pub title: String,
    #[field(default = String::new())]
    pub content: String,
    /// `publish` publishes; anything else saves a draft.
    #[field(default = String::new())]
    pub action: String,
}

impl PostSubmission {
    pub fn to_post_form(&self) -> PostForm {
        PostForm::new(&self.title, &self.content, self.action == "publish")
    }
}

#[derive(Debug, FromForm)]
pub struct SettingsSubmission {
    #[field(default = String::new())]
    pub csrf_token: String,
    #[field(default = String::new())]
    pub intro: String,
    #[field(default = String::new())]
    pub theme: String,
    #[field(default = String::new())]
    pub font: String,
    #[field(default = String::new())]
    pub blog_name: String,
}

fn editor_template(
    store: &dyn Store,
    csrf_token: &str,
    title: String,
    post_id: Option<i64>,
    fields: EditorFields,
    error: Option<&str>,
) -> Result<NoCacheTemplate, ServerError> {
    let site = SiteSettings::load(store)?;
    let page = EditorPage {
        chrome: Chrome::new(title, &site, true, csrf_token),
        post_id,
        fields,
        error: error.map(str::to_string),
    };
    Ok(NoCacheTemplate(Template::render("editor", &page)))
}

fn show_post(slug: &str) -> Reply {
    Reply::Redirect(Redirect::to(uri!(crate::routes::public::detail(slug))))
}

fn cookie_csrf(cookies: &CookieJar<'_>) -> String {
    csrf::cookie_token(cookies).unwrap_or_default()
}

// ── Admin landing ──────────────────────────────────────

#[get("/admin")]
pub fn admin(_admin: AdminUser) -> Redirect {
    Redirect::to("/")
}

// ── Create ─────────────────────────────────────────────

#[get("/new")]
pub fn new_post(_admin: AdminUser, store: &State<Arc<dyn Store>>, csrf: CsrfToken) -> PageResult {
    let template = editor_template(
        &**store.inner(),
        &csrf.0,
        "New Post".to_string(),
        None,
        EditorFields::default(),
        None,
    )?;
    Ok(Reply::Private(template))
}

#[post("/new", data = "<form>")]
pub fn create_post(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    cookies: &CookieJar<'_>,
    form: Form<PostSubmission>,
) -> PageResult {
    let s: &dyn Store = &**store.inner();

    if !csrf::verify(cookies, &form.csrf_token) {
        return Ok(Reply::forbidden());
    }

    let post = form.to_post_form();
    if let Some(message) = post.validation_error() {
        let template = editor_template(
            s,
            &cookie_csrf(cookies),
            "New Post".to_string(),
            None,
            EditorFields::from(&post),
            Some(message),
        )?;
        return Ok(Reply::Rejected((Status::BadRequest, template)));
    }

    let slug = posts::create_post(s, &post)?;
    log::info!("User {} created post '{}'", admin.user_id(), slug);
    Ok(show_post(&slug))
}

// ── Edit ───────────────────────────────────────────────

#[get("/edit/<id>")]
pub fn edit_post(
    id: Result<i64, &str>,
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    csrf: CsrfToken,
) -> PageResult {
    let Ok(id) = id else {
        return Ok(Reply::bad_request());
    };
    let s: &dyn Store = &**store.inner();

    let Some(post) = posts::get_post_by_id(s, id)? else {
        return Ok(Reply::not_found());
    };

    let template = editor_template(
        s,
        &csrf.0,
        format!("Editing \"{}\"", post.title),
        Some(id),
        EditorFields::from(&post),
        None,
    )?;
    Ok(Reply::Private(template))
}

#[post("/edit/<id>", data = "<form>")]
pub fn update_post(
    id: Result<i64, &str>,
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    cookies: &CookieJar<'_>,
    form: Form<PostSubmission>,
) -> PageResult {
    let Ok(id) = id else {
        return Ok(Reply::bad_request());
    };
    if !csrf::verify(cookies, &form.csrf_token) {
        return Ok(Reply::forbidden());
    }
    let s: &dyn Store = &**store.inner();

    let post = form.to_post_form();
    if let Some(message) = post.validation_error() {
        let template = editor_template(
            s,
            &cookie_csrf(cookies),
            format!("Editing \"{}\"", post.title),
            Some(id),
            EditorFields::from(&post),
            Some(message),
        )?;
        return Ok(Reply::Rejected((Status::BadRequest, template)));
    }

    if posts::get_post_by_id(s, id)?.is_none() {
        return Ok(Reply::not_found());
    }

    let slug = posts::update_post(s, id, &post)?;
    log::info!("User {} updated post {} ('{}')", admin.user_id(), id, slug);
    Ok(show_post(&slug))
}

// ── Delete ─────────────────────────────────────────────

#[get("/delete/<id>")]
pub fn delete_confirm(
    id: Result<i64, &str>,
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    csrf: CsrfToken,
) -> PageResult {
    let Ok(id) = id else {
        return Ok(Reply::bad_request());
    };
    let s: &dyn Store = &**store.inner();

    let Some(post) = posts::get_post_by_id(s, id)? else {
        return Ok(Reply::not_found());
    };

    let site = SiteSettings::load(s)?;
    let page = DeletePage {
        chrome: Chrome::new(format!("Deleting \"{}\"", post.title), &site, true, &csrf.0),
        post: PostView::from(&post),
    };
    Ok(Reply::Private(NoCacheTemplate(Template::render("delete", &page))))
}

/// Deleting an id that no longer exists still lands on the home page.
#[post("/delete/<id>", data = "<form>")]
pub fn delete_post(
    id: Result<i64, &str>,
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    cookies: &CookieJar<'_>,
    form: Form<CsrfForm>,
) -> PageResult {
    let Ok(id) = id else {
        return Ok(Reply::bad_request());
    };
    if !csrf::verify(cookies, &form.csrf_token) {
        return Ok(Reply::forbidden());
    }

    posts::delete_post(&**store.inner(), id)?;
    log::info!("User {} deleted post {}", admin.user_id(), id);
    Ok(Reply::Redirect(Redirect::to("/")))
}

// ── Settings ───────────────────────────────────────────

#[get("/settings")]
pub fn settings_page(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    csrf: CsrfToken,
) -> PageResult {
    let site = SiteSettings::load(&**store.inner())?;
    let page = SettingsPage {
        chrome: Chrome::new("Settings", &site, true, &csrf.0),
        intro: site.intro.clone(),
        blog_name: site.blog_name.clone(),
        themes: pages::choices(pages::THEMES, &site.theme),
        fonts: pages::choices(pages::FONTS, &site.font),
    };
    Ok(Reply::Private(NoCacheTemplate(Template::render("settings", &page))))
}

#[post("/settings", data = "<form>")]
pub fn settings_save(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    cookies: &CookieJar<'_>,
    form: Form<SettingsSubmission>,
) -> PageResult {
    if !csrf::verify(cookies, &form.csrf_token) {
        return Ok(Reply::forbidden());
    }

    let form = form.into_inner();
    let site = SiteSettings {
        intro: form.intro,
        theme: form.theme,
        font: form.font,
        blog_name: form.blog_name,
    };
    site.save(&**store.inner())?;
    log::info!("User {} updated settings", admin.user_id());

    Ok(Reply::Redirect(Redirect::to("/")))
}

// ── Login redirects ────────────────────────────────────
//
// `AdminUser` forwards when there is no live session; these lower-priority
// twins of every protected route then send the visitor to the login page
// without running the protected handler.

fn to_login() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

#[get("/admin", rank = 1)]
pub fn admin_login() -> Redirect {
    to_login()
}

#[get("/new", rank = 1)]
pub fn new_post_login() -> Redirect {
    to_login()
}

#[post("/new", rank = 1)]
pub fn create_post_login() -> Redirect {
    to_login()
}

#[get("/edit/<_id>", rank = 1)]
pub fn edit_post_login(_id: &str) -> Redirect {
    to_login()
}

#[post("/edit/<_id>", rank = 1)]
pub fn update_post_login(_id: &str) -> Redirect {
    to_login()
}

#[get("/delete/<_id>", rank = 1)]
pub fn delete_confirm_login(_id: &str) -> Redirect {
    to_login()
}

#[post("/delete/<_id>", rank = 1)]
pub fn delete_post_login(_id: &str) -> Redirect {
    to_login()
}

#[get("/settings", rank = 1)]
pub fn settings_page_login() -> Redirect {
    to_login()
}

#[post("/settings", rank = 1)]
pub fn settings_save_login() -> Redirect {
    to_login()
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        admin,
        new_post,
        create_post,
        edit_post,
        update_post,
        delete_confirm,
        delete_post,
        settings_page,
        settings_save,
        admin_login,
        new_post_login,
        create_post_login,
        edit_post_login,
        update_post_login,
        delete_confirm_login,
        delete_post_login,
        settings_page_login,
        settings_save_login,
    ]
}
