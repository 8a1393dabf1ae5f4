use chrono::NaiveDateTime;

use crate::error::StoreError;
use crate::models::post::{Post, PostForm};
use crate::models::session::Session;

pub mod sqlite;

/// Unified data-access trait. Every database operation goes through here.
/// Implementation: `SqliteStore` (wraps rusqlite/r2d2).
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn run_migrations(&self) -> Result<(), StoreError>;
    fn seed_defaults(&self) -> Result<(), StoreError>;

    // ── Settings ────────────────────────────────────────────────────
    fn setting_get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn setting_set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    // ── Posts ────────────────────────────────────────────────────────
    fn post_find_by_id(&self, id: i64) -> Result<Option<Post>, StoreError>;
    fn post_find_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError>;
    fn post_list(&self, published_only: bool) -> Result<Vec<Post>, StoreError>;
    fn post_slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, StoreError>;
    fn post_insert(&self, form: &PostForm, slug: &str) -> Result<i64, StoreError>;
    fn post_update(&self, id: i64, form: &PostForm, slug: &str) -> Result<(), StoreError>;
    fn post_delete(&self, id: i64) -> Result<(), StoreError>;

    // ── Sessions ────────────────────────────────────────────────────
    fn session_insert(&self, session: &Session) -> Result<(), StoreError>;
    fn session_get(&self, token: &str, now: NaiveDateTime) -> Result<Option<Session>, StoreError>;
    fn session_delete(&self, token: &str) -> Result<(), StoreError>;
    /// Delete sessions expired as of `now`, return count deleted.
    fn session_purge_expired(&self, now: NaiveDateTime) -> Result<usize, StoreError>;
}
