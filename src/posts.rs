use crate::error::StoreError;
use crate::models::post::{Post, PostForm};
use crate::slug;
use crate::store::Store;

/// How many times a write is retried after losing a slug race to a
/// concurrent request.
const SLUG_WRITE_ATTEMPTS: usize = 5;

/// Create a post and return the slug it was stored under.
pub fn create_post(store: &dyn Store, form: &PostForm) -> Result<String, StoreError> {
    write_with_slug(store, &form.title, None, |slug| {
        store.post_insert(form, slug).map(|_| ())
    })
}

/// Update a post, re-deriving its slug from the (possibly new) title.
/// An unchanged title keeps the current slug.
pub fn update_post(store: &dyn Store, id: i64, form: &PostForm) -> Result<String, StoreError> {
    write_with_slug(store, &form.title, Some(id), |slug| {
        store.post_update(id, form, slug)
    })
}

/// Hard delete. Deleting a missing post succeeds.
pub fn delete_post(store: &dyn Store, id: i64) -> Result<(), StoreError> {
    store.post_delete(id)
}

pub fn get_post_by_id(store: &dyn Store, id: i64) -> Result<Option<Post>, StoreError> {
    store.post_find_by_id(id)
}

pub fn get_post_by_slug(store: &dyn Store, slug: &str) -> Result<Option<Post>, StoreError> {
    store.post_find_by_slug(slug)
}

pub fn list_all(store: &dyn Store) -> Result<Vec<Post>, StoreError> {
    store.post_list(false)
}

pub fn list_published(store: &dyn Store) -> Result<Vec<Post>, StoreError> {
    store.post_list(true)
}

/// Allocate a slug and run `write` with it. If the unique index rejects the
/// slug (another writer claimed it after our check), allocate again: the
/// next lookup sees the winner's row and moves on to the next suffix.
fn write_with_slug<F>(
    store: &dyn Store,
    title: &str,
    exclude_id: Option<i64>,
    mut write: F,
) -> Result<String, StoreError>
where
    F: FnMut(&str) -> Result<(), StoreError>,
{
    let base = slug::base_slug(title);

    for _ in 0..SLUG_WRITE_ATTEMPTS {
        let candidate = slug::ensure_unique_slug(store, &base, exclude_id)?;
        match write(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(StoreError::SlugTaken(taken)) => {
                log::warn!("Slug '{}' was claimed concurrently, retrying", taken);
            }
            Err(e) => return Err(e),
        }
    }

    Err(StoreError::SlugRetriesExhausted(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Session;
    use crate::store::sqlite::SqliteStore;
    use crate::store::tests::test_store;
    use chrono::NaiveDateTime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn form(title: &str) -> PostForm {
        PostForm::new(title, "Some content", true)
    }

    #[test]
    fn duplicate_titles_get_sequential_suffixes() {
        let s = test_store();
        assert_eq!(create_post(&s, &form("Hello World")).unwrap(), "hello-world");
        assert_eq!(create_post(&s, &form("Hello World")).unwrap(), "hello-world-2");
        assert_eq!(create_post(&s, &form("Hello World")).unwrap(), "hello-world-3");
    }

    #[test]
    fn scan_restarts_from_two_each_time() {
        let s = test_store();
        create_post(&s, &form("Note")).unwrap();
        create_post(&s, &form("Note")).unwrap();
        let third = create_post(&s, &form("Note")).unwrap();
        assert_eq!(third, "note-3");

        let second = get_post_by_slug(&s, "note-2").unwrap().unwrap();
        delete_post(&s, second.id).unwrap();

        // -2 is the first free candidate again
        assert_eq!(create_post(&s, &form("Note")).unwrap(), "note-2");
        assert_eq!(create_post(&s, &form("Note")).unwrap(), "note-4");
    }

    #[test]
    fn reserved_title_gets_suffix() {
        let s = test_store();
        assert_eq!(create_post(&s, &form("Feed")).unwrap(), "feed-2");
        assert_eq!(create_post(&s, &form("settings")).unwrap(), "settings-2");
    }

    #[test]
    fn symbol_only_titles_fall_back_to_untitled() {
        let s = test_store();
        assert_eq!(create_post(&s, &form("!@#$%")).unwrap(), "untitled");
        assert_eq!(create_post(&s, &form("???")).unwrap(), "untitled-2");
        assert_eq!(create_post(&s, &form("...")).unwrap(), "untitled-3");
    }

    #[test]
    fn update_with_same_title_keeps_slug() {
        let s = test_store();
        create_post(&s, &form("Hello World")).unwrap();
        let slug = create_post(&s, &form("Hello World")).unwrap();
        let post = get_post_by_slug(&s, &slug).unwrap().unwrap();

        let updated = update_post(&s, post.id, &PostForm::new("Hello World", "edited", false)).unwrap();
        assert_eq!(updated, "hello-world-2");

        let post = get_post_by_id(&s, post.id).unwrap().unwrap();
        assert_eq!(post.content, "edited");
        assert!(!post.published);
    }

    #[test]
    fn update_with_new_title_renames_slug() {
        let s = test_store();
        create_post(&s, &form("Taken")).unwrap();
        let slug = create_post(&s, &form("Original")).unwrap();
        let id = get_post_by_slug(&s, &slug).unwrap().unwrap().id;

        assert_eq!(update_post(&s, id, &form("Taken")).unwrap(), "taken-2");
        assert!(get_post_by_slug(&s, "original").unwrap().is_none());
        assert_eq!(get_post_by_slug(&s, "taken-2").unwrap().unwrap().id, id);
    }

    #[test]
    fn round_trip_by_slug() {
        let s = test_store();
        let slug = create_post(&s, &PostForm::new("Round Trip", "Body text", false)).unwrap();
        let post = get_post_by_slug(&s, &slug).unwrap().unwrap();
        assert_eq!(post.title, "Round Trip");
        assert_eq!(post.content, "Body text");
        assert!(!post.published);
        assert_eq!(post.slug, slug);
    }

    #[test]
    fn delete_twice_is_fine() {
        let s = test_store();
        let slug = create_post(&s, &form("Gone")).unwrap();
        let id = get_post_by_slug(&s, &slug).unwrap().unwrap().id;
        delete_post(&s, id).unwrap();
        delete_post(&s, id).unwrap();
        assert!(get_post_by_id(&s, id).unwrap().is_none());
    }

    #[test]
    fn list_published_excludes_drafts() {
        let s = test_store();
        create_post(&s, &PostForm::new("Public", "x", true)).unwrap();
        create_post(&s, &PostForm::new("Draft", "x", false)).unwrap();

        let titles: Vec<String> = list_published(&s).unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Public"]);
        assert_eq!(list_all(&s).unwrap().len(), 2);
    }

    /// Claims every slug is free for the first `lies` lookups, the way a
    /// concurrent writer racing between our check and our insert looks.
    struct RacingStore {
        inner: SqliteStore,
        lies: AtomicUsize,
    }

    impl Store for RacingStore {
        fn run_migrations(&self) -> Result<(), StoreError> {
            self.inner.run_migrations()
        }
        fn seed_defaults(&self) -> Result<(), StoreError> {
            self.inner.seed_defaults()
        }
        fn setting_get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.setting_get(key)
        }
        fn setting_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner.setting_set(key, value)
        }
        fn post_find_by_id(&self, id: i64) -> Result<Option<Post>, StoreError> {
            self.inner.post_find_by_id(id)
        }
        fn post_find_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
            self.inner.post_find_by_slug(slug)
        }
        fn post_list(&self, published_only: bool) -> Result<Vec<Post>, StoreError> {
            self.inner.post_list(published_only)
        }
        fn post_slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, StoreError> {
            let lying = self
                .lies
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if lying {
                Ok(false)
            } else {
                self.inner.post_slug_taken(slug, exclude_id)
            }
        }
        fn post_insert(&self, form: &PostForm, slug: &str) -> Result<i64, StoreError> {
            self.inner.post_insert(form, slug)
        }
        fn post_update(&self, id: i64, form: &PostForm, slug: &str) -> Result<(), StoreError> {
            self.inner.post_update(id, form, slug)
        }
        fn post_delete(&self, id: i64) -> Result<(), StoreError> {
            self.inner.post_delete(id)
        }
        fn session_insert(&self, session: &Session) -> Result<(), StoreError> {
            self.inner.session_insert(session)
        }
        fn session_get(&self, token: &str, now: NaiveDateTime) -> Result<Option<Session>, StoreError> {
            self.inner.session_get(token, now)
        }
        fn session_delete(&self, token: &str) -> Result<(), StoreError> {
            self.inner.session_delete(token)
        }
        fn session_purge_expired(&self, now: NaiveDateTime) -> Result<usize, StoreError> {
            self.inner.session_purge_expired(now)
        }
    }

    #[test]
    fn lost_slug_race_retries_with_next_suffix() {
        let s = RacingStore {
            inner: test_store(),
            lies: AtomicUsize::new(0),
        };
        create_post(&s, &form("Race")).unwrap();

        s.lies.store(1, Ordering::SeqCst);
        assert_eq!(create_post(&s, &form("Race")).unwrap(), "race-2");
    }

    #[test]
    fn endless_slug_races_give_up() {
        let s = RacingStore {
            inner: test_store(),
            lies: AtomicUsize::new(0),
        };
        create_post(&s, &form("Race")).unwrap();

        s.lies.store(usize::MAX, Ordering::SeqCst);
        let err = create_post(&s, &form("Race")).unwrap_err();
        assert!(matches!(err, StoreError::SlugRetriesExhausted(ref base) if base == "race"));
    }
}
