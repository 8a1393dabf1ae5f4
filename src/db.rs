use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};

use crate::error::StoreError;
use crate::models::post::{Post, PostForm};
use crate::models::settings::INTRO;
use crate::posts;
use crate::slug;
use crate::store::Store;

pub type DbPool = Pool<SqliteConnectionManager>;

const DEFAULT_INTRO: &str = "Lorem ipsum dolor sit amet consectetur adipisicing elit. Dicta incidunt ipsa numquam impedit nostrum, ut cum a autem soluta animi, error, ea tenetur?";

const SAMPLE_POSTS: &[(&str, &str)] = &[
    ("Hey now", "Everything is awesome!"),
    ("What's the deal?", "What is happening?!"),
    ("Football", "Niners and stuff."),
];

pub fn init_pool(path: &str) -> Result<DbPool, StoreError> {
    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder().max_size(10).build(manager)?;

    // WAL lets readers proceed while a request is writing
    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), StoreError> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            published BOOLEAN NOT NULL DEFAULT 1,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            expires_at DATETIME NOT NULL
        );

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;

    // Databases from before drafts existed
    if !column_exists(&conn, "posts", "published")? {
        log::info!("Adding posts.published column");
        conn.execute_batch("ALTER TABLE posts ADD COLUMN published BOOLEAN NOT NULL DEFAULT 1")?;
    }

    // Databases from before slug URLs existed
    if !column_exists(&conn, "posts", "slug")? {
        log::info!("Adding posts.slug column");
        conn.execute_batch("ALTER TABLE posts ADD COLUMN slug TEXT")?;
    }
    drop(conn);

    backfill_slugs(pool)?;

    let conn = pool.get()?;
    conn.execute_batch("CREATE UNIQUE INDEX IF NOT EXISTS idx_posts_slug ON posts(slug)")?;

    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, StoreError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        params![table, column],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Give every slug-less row a unique slug derived from its title.
fn backfill_slugs(pool: &DbPool) -> Result<(), StoreError> {
    let pending: Vec<(i64, String)> = {
        let conn = pool.get()?;
        let mut stmt =
            conn.prepare("SELECT id, title FROM posts WHERE slug IS NULL OR slug = '' ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };

    if pending.is_empty() {
        return Ok(());
    }
    log::info!("Generating slugs for {} existing posts", pending.len());

    for (id, title) in pending {
        let base = slug::base_slug(&title);
        let unique = slug::allocate(&base, |candidate| {
            Post::slug_taken(pool, candidate, Some(id))
        })?;
        let conn = pool.get()?;
        conn.execute(
            "UPDATE posts SET slug = ?1 WHERE id = ?2",
            params![unique, id],
        )?;
    }

    Ok(())
}

/// First-run content: a few sample posts and the intro text.
pub fn seed_defaults(store: &dyn Store) -> Result<(), StoreError> {
    if store.post_list(false)?.is_empty() {
        for (title, content) in SAMPLE_POSTS {
            posts::create_post(store, &PostForm::new(title, content, true))?;
        }
        log::info!("Seeded {} sample posts", SAMPLE_POSTS.len());
    }

    if store.setting_get(INTRO)?.is_none() {
        store.setting_set(INTRO, DEFAULT_INTRO)?;
    }

    Ok(())
}
