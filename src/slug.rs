use crate::error::StoreError;
use crate::store::Store;

/// Top-level route names a post may never claim as a bare slug.
/// `login` is not listed, so a post slugged `login` is shadowed by the
/// login page and only reachable through its edit link.
pub const RESERVED_SLUGS: &[&str] = &[
    "admin", "logout", "feed", "new", "edit", "delete", "settings", "static",
];

/// Base used when a title produces no slug characters at all.
pub const FALLBACK_SLUG: &str = "untitled";

pub fn is_reserved(slug: &str) -> bool {
    RESERVED_SLUGS.contains(&slug)
}

/// Turn a title into a URL slug: lowercase, spaces become hyphens, anything
/// outside `[a-z0-9-]` is dropped, hyphen runs collapse and the ends are
/// trimmed. May return an empty string.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase().replace(' ', "-");

    let mut slug = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        match c {
            'a'..='z' | '0'..='9' => slug.push(c),
            '-' if !slug.ends_with('-') => slug.push('-'),
            _ => {}
        }
    }

    slug.trim_matches('-').to_string()
}

/// `generate_slug` with the `untitled` fallback applied.
pub fn base_slug(title: &str) -> String {
    let slug = generate_slug(title);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Find the first free slug for `base`, probing `base`, `base-2`, `base-3`...
///
/// `taken` answers whether a candidate is already used by some other post.
/// Reserved words are skipped without asking. An empty base is returned
/// unchanged.
pub fn allocate<E, F>(base: &str, mut taken: F) -> Result<String, E>
where
    F: FnMut(&str) -> Result<bool, E>,
{
    if base.is_empty() {
        return Ok(String::new());
    }

    let mut candidate = base.to_string();
    let mut suffix = 2u32;
    loop {
        if !is_reserved(&candidate) && !taken(&candidate)? {
            return Ok(candidate);
        }
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }
}

/// Allocate a slug against the post table. `exclude_id` is the post being
/// updated, so it never collides with its own current slug.
pub fn ensure_unique_slug(
    store: &dyn Store,
    base: &str,
    exclude_id: Option<i64>,
) -> Result<String, StoreError> {
    allocate(base, |candidate| store.post_slug_taken(candidate, exclude_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn slug_shaped(s: &str) -> bool {
        s.is_empty()
            || s.split('-').all(|part| {
                !part.is_empty()
                    && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            })
    }

    #[test]
    fn generates_expected_slugs() {
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("It's a Test"), "its-a-test");
        assert_eq!(generate_slug("---Hello"), "hello");
        assert_eq!(generate_slug("Hello---"), "hello");
        assert_eq!(generate_slug("!@#$%"), "");
        assert_eq!(generate_slug("Rust  2024 -- Edition"), "rust-2024-edition");
        assert_eq!(generate_slug("a - ! - b"), "a-b");
    }

    #[test]
    fn output_is_always_slug_shaped() {
        let titles = [
            "",
            " ",
            "Crème brûlée",
            "日本語のタイトル",
            "tabs\tand\nnewlines",
            "--a--b--",
            "UPPER lower 123",
            "emoji 🚀 launch",
            "under_score.dot",
        ];
        for title in titles {
            let slug = generate_slug(title);
            assert!(slug_shaped(&slug), "{:?} -> {:?}", title, slug);
        }
    }

    #[test]
    fn base_slug_falls_back_to_untitled() {
        assert_eq!(base_slug("!!!"), "untitled");
        assert_eq!(base_slug("Post"), "post");
    }

    #[test]
    fn allocate_appends_sequential_suffixes() {
        let used: HashSet<&str> = ["hello", "hello-2"].into_iter().collect();
        let slug = allocate::<(), _>("hello", |c| Ok(used.contains(c))).unwrap();
        assert_eq!(slug, "hello-3");
    }

    #[test]
    fn allocate_skips_reserved_words() {
        let slug = allocate::<(), _>("feed", |_| Ok(false)).unwrap();
        assert_eq!(slug, "feed-2");
        for word in RESERVED_SLUGS {
            let slug = allocate::<(), _>(word, |_| Ok(false)).unwrap();
            assert_eq!(slug, format!("{}-2", word));
        }
    }

    #[test]
    fn allocate_short_circuits_on_empty_base() {
        let mut asked = false;
        let slug = allocate::<(), _>("", |_| {
            asked = true;
            Ok(true)
        })
        .unwrap();
        assert_eq!(slug, "");
        assert!(!asked);
    }

    #[test]
    fn allocate_propagates_lookup_errors() {
        let result = allocate("hello", |_| Err("db down"));
        assert_eq!(result, Err("db down"));
    }

    #[test]
    fn reserved_words_are_case_sensitive() {
        assert!(is_reserved("feed"));
        assert!(!is_reserved("Feed"));
        assert!(!is_reserved("feeds"));
    }
}
