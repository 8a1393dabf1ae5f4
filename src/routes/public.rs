use rocket::http::ContentType;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use std::sync::Arc;

use crate::models::post::Post;
use crate::models::settings::SiteSettings;
use crate::pages::{Chrome, HomePage, PostPage, PostView};
use crate::posts;
use crate::security::auth::Viewer;
use crate::security::csrf::CsrfToken;
use crate::store::Store;

use super::{PageResult, Reply, ServerError};

// ── Homepage ───────────────────────────────────────────

#[get("/")]
pub fn home(store: &State<Arc<dyn Store>>, viewer: Viewer, csrf: CsrfToken) -> PageResult {
    let s: &dyn Store = &**store.inner();
    let site = SiteSettings::load(s)?;

    let (published, drafts): (Vec<Post>, Vec<Post>) = if viewer.authenticated {
        posts::list_all(s)?.into_iter().partition(|p| p.published)
    } else {
        (posts::list_published(s)?, Vec::new())
    };

    let page = HomePage {
        chrome: Chrome::new("Home", &site, viewer.authenticated, &csrf.0).describe(&site.intro),
        intro: site.intro.clone(),
        posts: published.iter().map(PostView::from).collect(),
        drafts: drafts.iter().map(PostView::from).collect(),
    };

    Ok(Reply::Page(Template::render("home", &page)))
}

// ── Single post ────────────────────────────────────────

/// Drafts exist only for the signed-in author; everyone else gets a 404.
#[get("/<slug>", rank = 5)]
pub fn detail(
    slug: &str,
    store: &State<Arc<dyn Store>>,
    viewer: Viewer,
    csrf: CsrfToken,
) -> PageResult {
    let s: &dyn Store = &**store.inner();

    let post = match posts::get_post_by_slug(s, slug)? {
        Some(post) if post.published || viewer.authenticated => post,
        _ => return Ok(Reply::not_found()),
    };

    let site = SiteSettings::load(s)?;
    let page = PostPage {
        chrome: Chrome::new(post.title.clone(), &site, viewer.authenticated, &csrf.0)
            .describe(&post.content),
        post: PostView::from(&post),
    };

    Ok(Reply::Page(Template::render("detail", &page)))
}

/// Old `/post/<slug>` links.
#[get("/post/<slug>")]
pub fn legacy_post(slug: &str) -> Redirect {
    Redirect::moved(uri!(detail(slug)))
}

// ── Feed ───────────────────────────────────────────────

/// Scheme and host the request was addressed to, honoring a proxy's
/// `X-Forwarded-Proto`.
pub struct BaseUrl(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BaseUrl {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let headers = request.headers();
        let scheme = headers
            .get_one("X-Forwarded-Proto")
            .filter(|proto| !proto.is_empty())
            .unwrap_or("http");
        let host = headers.get_one("Host").unwrap_or("localhost");
        Outcome::Success(BaseUrl(format!("{}://{}", scheme, host)))
    }
}

pub fn rss_content_type() -> ContentType {
    ContentType::new("application", "rss+xml").with_params(("charset", "utf-8"))
}

#[get("/feed")]
pub fn feed(
    store: &State<Arc<dyn Store>>,
    base: BaseUrl,
) -> Result<(ContentType, String), ServerError> {
    let xml = crate::rss::generate_feed(&**store.inner(), &base.0)?;
    Ok((rss_content_type(), xml))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![home, detail, legacy_post, feed]
}
