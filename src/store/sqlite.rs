use chrono::NaiveDateTime;

use crate::db::DbPool;
use crate::error::StoreError;
use crate::models::post::{Post, PostForm};
use crate::models::session::Session;
use crate::models::settings::Setting;

use super::Store;

/// SQLite-backed implementation of the Store trait.
/// Wraps the r2d2 connection pool and delegates to model methods.
pub struct SqliteStore {
    pub pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn open(path: &str) -> Result<Self, StoreError> {
        let pool = crate::db::init_pool(path)?;
        Ok(Self { pool })
    }
}

impl Store for SqliteStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn run_migrations(&self) -> Result<(), StoreError> {
        crate::db::run_migrations(&self.pool)
    }

    fn seed_defaults(&self) -> Result<(), StoreError> {
        crate::db::seed_defaults(self)
    }

    // ── Settings ────────────────────────────────────────────────────

    fn setting_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Setting::get(&self.pool, key)
    }

    fn setting_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Setting::set(&self.pool, key, value)
    }

    // ── Posts ────────────────────────────────────────────────────────

    fn post_find_by_id(&self, id: i64) -> Result<Option<Post>, StoreError> {
        Post::find_by_id(&self.pool, id)
    }

    fn post_find_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        Post::find_by_slug(&self.pool, slug)
    }

    fn post_list(&self, published_only: bool) -> Result<Vec<Post>, StoreError> {
        Post::list(&self.pool, published_only)
    }

    fn post_slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, StoreError> {
        Post::slug_taken(&self.pool, slug, exclude_id)
    }

    fn post_insert(&self, form: &PostForm, slug: &str) -> Result<i64, StoreError> {
        Post::insert(&self.pool, form, slug)
    }

    fn post_update(&self, id: i64, form: &PostForm, slug: &str) -> Result<(), StoreError> {
        Post::update(&self.pool, id, form, slug)
    }

    fn post_delete(&self, id: i64) -> Result<(), StoreError> {
        Post::delete(&self.pool, id)
    }

    // ── Sessions ────────────────────────────────────────────────────

    fn session_insert(&self, session: &Session) -> Result<(), StoreError> {
        Session::insert(&self.pool, session)
    }

    fn session_get(&self, token: &str, now: NaiveDateTime) -> Result<Option<Session>, StoreError> {
        Session::find_valid(&self.pool, token, now)
    }

    fn session_delete(&self, token: &str) -> Result<(), StoreError> {
        Session::delete(&self.pool, token)
    }

    fn session_purge_expired(&self, now: NaiveDateTime) -> Result<usize, StoreError> {
        Session::purge_expired(&self.pool, now)
    }
}
