#[macro_use]
extern crate rocket;

use rocket::figment::Figment;
use rocket::fs::FileServer;
use rocket::response::content::RawHtml;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;
use std::sync::Arc;

mod boot;
mod config;
mod db;
mod error;
mod models;
mod pages;
mod posts;
mod render;
mod routes;
mod rss;
mod security;
mod slug;
mod store;
mod tasks;


use config::{AuthConfig, BlogConfig};
use store::sqlite::SqliteStore;
use store::Store;

#[catch(403)]
fn forbidden() -> RawHtml<&'static str> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>403</h1><p>Invalid or missing form token. Reload the page and try again.</p><a href='/'>← Home</a></body></html>")
}

#[catch(404)]
fn not_found() -> RawHtml<&'static str> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>404</h1><p>Page not found.</p><a href='/'>← Home</a></body></html>")
}

#[catch(500)]
fn server_error() -> RawHtml<&'static str> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>500</h1><p>Internal server error.</p><a href='/'>← Home</a></body></html>")
}

/// Assemble the server around an already migrated store. The session
/// sweeper is attached separately so tests can run without it.
pub fn build_rocket(figment: Figment, auth: AuthConfig, store: Arc<dyn Store>) -> Rocket<Build> {
    rocket::custom(figment)
        .manage(store)
        .manage(auth)
        .attach(Template::custom(|engines| {
            engines.tera.register_filter("format", render::format_filter);
        }))
        .mount("/static", FileServer::from("static"))
        .mount("/", routes::public::routes())
        .mount("/", routes::auth::routes())
        .mount("/", routes::admin::routes())
        .register("/", catchers![forbidden, not_found, server_error])
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let figment = BlogConfig::figment();
    let config = BlogConfig::from_figment(&figment).expect("Failed to read configuration");

    // Boot check: create missing directories, verify templates
    boot::run(&config.database);

    let store = SqliteStore::open(&config.database).expect("Failed to initialize database pool");
    store.run_migrations().expect("Failed to run database migrations");
    store.seed_defaults().expect("Failed to seed default content");
    log::info!("Database ready at {}", config.database);

    let auth = config
        .into_auth(bcrypt::DEFAULT_COST)
        .expect("Failed to hash admin password");

    let store: Arc<dyn Store> = Arc::new(store);
    build_rocket(figment, auth, store).attach(tasks::SessionSweep::hourly())
}
