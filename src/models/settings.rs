use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::db::DbPool;
use crate::error::StoreError;
use crate::store::Store;

pub const INTRO: &str = "intro";
pub const THEME: &str = "theme";
pub const FONT: &str = "font";
pub const BLOG_NAME: &str = "blog_name";

const DEFAULT_BLOG_NAME: &str = "Blog";

pub struct Setting;

impl Setting {
    pub fn get(pool: &DbPool, key: &str) -> Result<Option<String>, StoreError> {
        let conn = pool.get()?;
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(pool: &DbPool, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// The display settings every page needs, read in one go.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SiteSettings {
    pub intro: String,
    pub theme: String,
    pub font: String,
    pub blog_name: String,
}

impl SiteSettings {
    pub fn load(store: &dyn Store) -> Result<Self, StoreError> {
        let blog_name = store
            .setting_get(BLOG_NAME)?
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BLOG_NAME.to_string());

        Ok(SiteSettings {
            intro: store.setting_get(INTRO)?.unwrap_or_default(),
            theme: store.setting_get(THEME)?.unwrap_or_default(),
            font: store.setting_get(FONT)?.unwrap_or_default(),
            blog_name,
        })
    }

    pub fn save(&self, store: &dyn Store) -> Result<(), StoreError> {
        store.setting_set(INTRO, &self.intro)?;
        store.setting_set(THEME, &self.theme)?;
        store.setting_set(FONT, &self.font)?;
        store.setting_set(BLOG_NAME, &self.blog_name)?;
        Ok(())
    }
}
