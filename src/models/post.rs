use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::error::StoreError;

const POST_COLUMNS: &str = "id, title, slug, content, published, created_at";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub published: bool,
    pub created_at: NaiveDateTime,
}

/// Author-supplied fields of a post. The slug is always derived.
#[derive(Debug, Clone, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    pub published: bool,
}

impl PostForm {
    pub fn new(title: &str, content: &str, published: bool) -> Self {
        PostForm {
            title: title.to_string(),
            content: content.to_string(),
            published,
        }
    }

    /// Human-readable reason the form can't be saved, if any.
    pub fn validation_error(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            Some("Title and content are required")
        } else {
            None
        }
    }
}

impl Post {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Post {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            content: row.get("content")?,
            published: row.get("published")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<Self>, StoreError> {
        let conn = pool.get()?;
        let post = conn
            .query_row(
                &format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS),
                params![id],
                Self::from_row,
            )
            .optional()?;
        Ok(post)
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Result<Option<Self>, StoreError> {
        let conn = pool.get()?;
        let post = conn
            .query_row(
                &format!("SELECT {} FROM posts WHERE slug = ?1", POST_COLUMNS),
                params![slug],
                Self::from_row,
            )
            .optional()?;
        Ok(post)
    }

    /// Newest first; equal timestamps fall back to the higher id.
    pub fn list(pool: &DbPool, published_only: bool) -> Result<Vec<Self>, StoreError> {
        let conn = pool.get()?;
        let filter = if published_only { "WHERE published = 1" } else { "" };
        let sql = format!(
            "SELECT {} FROM posts {} ORDER BY created_at DESC, id DESC",
            POST_COLUMNS, filter
        );

        let mut stmt = conn.prepare(&sql)?;
        let posts = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(posts)
    }

    pub fn slug_taken(
        pool: &DbPool,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, StoreError> {
        let conn = pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE slug = ?1 AND id != ?2",
            params![slug, exclude_id.unwrap_or(0)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn insert(pool: &DbPool, form: &PostForm, slug: &str) -> Result<i64, StoreError> {
        let conn = pool.get()?;
        let now = Utc::now().naive_utc();

        conn.execute(
            "INSERT INTO posts (title, slug, content, published, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![form.title, slug, form.content, form.published, now],
        )
        .map_err(|e| StoreError::from_post_write(e, slug))?;

        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &PostForm, slug: &str) -> Result<(), StoreError> {
        let conn = pool.get()?;
        conn.execute(
            "UPDATE posts SET title = ?1, slug = ?2, content = ?3, published = ?4 WHERE id = ?5",
            params![form.title, slug, form.content, form.published, id],
        )
        .map_err(|e| StoreError::from_post_write(e, slug))?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), StoreError> {
        let conn = pool.get()?;
        conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(())
    }
}
