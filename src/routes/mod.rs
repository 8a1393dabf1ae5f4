pub mod admin;
pub mod auth;
pub mod public;

use rocket::http::{Header, Status};
use rocket::response::{self, Redirect, Responder};
use rocket::Request;
use rocket_dyn_templates::Template;

use crate::error::StoreError;

/// Everything a page handler can answer with.
#[derive(Responder)]
pub enum Reply {
    Page(Template),
    Private(NoCacheTemplate),
    Rejected((Status, NoCacheTemplate)),
    Redirect(Redirect),
    Status(Status),
}

impl Reply {
    pub fn not_found() -> Self {
        Reply::Status(Status::NotFound)
    }

    pub fn bad_request() -> Self {
        Reply::Status(Status::BadRequest)
    }

    /// Missing or mismatched CSRF token.
    pub fn forbidden() -> Self {
        Reply::Status(Status::Forbidden)
    }
}

/// Store failure surfaced as a bare 500. The cause is logged, never shown.
#[derive(Debug)]
pub struct ServerError;

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        log::error!("Request failed: {}", e);
        ServerError
    }
}

impl<'r> Responder<'r, 'static> for ServerError {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'static> {
        Err(Status::InternalServerError)
    }
}

pub type PageResult = Result<Reply, ServerError>;

/// Wrapper that adds no-cache headers to a Template response
pub struct NoCacheTemplate(pub Template);

impl<'r> Responder<'r, 'static> for NoCacheTemplate {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let mut resp = self.0.respond_to(req)?;
        resp.set_header(Header::new(
            "Cache-Control",
            "no-store, no-cache, must-revalidate, max-age=0",
        ));
        resp.set_header(Header::new("Pragma", "no-cache"));
        Ok(resp)
    }
}
