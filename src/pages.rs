//! Template contexts, one struct per rendered page.

use serde::Serialize;

use crate::models::post::{Post, PostForm};
use crate::models::settings::SiteSettings;
use crate::render;

pub const THEMES: &[(&str, &str)] = &[("light", "Light"), ("dark", "Dark")];
pub const FONTS: &[(&str, &str)] = &[
    ("sans", "Sans-serif"),
    ("serif", "Serif"),
    ("inter", "Inter"),
    ("mono", "Monospace"),
];

/// Everything the shared layout (`base.html.tera`) reads.
#[derive(Debug, Serialize)]
pub struct Chrome {
    pub title: String,
    pub description: String,
    pub authenticated: bool,
    pub csrf_token: String,
    pub theme: String,
    pub font: String,
    pub blog_name: String,
}

impl Chrome {
    pub fn new(title: impl Into<String>, site: &SiteSettings, authenticated: bool, csrf_token: &str) -> Self {
        Chrome {
            title: title.into(),
            description: String::new(),
            authenticated,
            csrf_token: csrf_token.to_string(),
            theme: site.theme.clone(),
            font: site.font.clone(),
            blog_name: site.blog_name.clone(),
        }
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = render::truncate(text, render::DESCRIPTION_LIMIT);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub published: bool,
    pub date: String,
    pub iso_date: String,
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        PostView {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            content: post.content.clone(),
            published: post.published,
            date: post.created_at.format("%B %-d, %Y").to_string(),
            iso_date: post.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub chrome: Chrome,
    pub intro: String,
    pub posts: Vec<PostView>,
    pub drafts: Vec<PostView>,
}

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub chrome: Chrome,
    pub post: PostView,
}

/// Values shown in the editor's inputs.
#[derive(Debug, Default, Serialize)]
pub struct EditorFields {
    pub title: String,
    pub content: String,
    pub published: bool,
}

impl From<&Post> for EditorFields {
    fn from(post: &Post) -> Self {
        EditorFields {
            title: post.title.clone(),
            content: post.content.clone(),
            published: post.published,
        }
    }
}

impl From<&PostForm> for EditorFields {
    fn from(form: &PostForm) -> Self {
        EditorFields {
            title: form.title.clone(),
            content: form.content.clone(),
            published: form.published,
        }
    }
}

/// Create and edit share one template; `post_id` is set when editing.
#[derive(Debug, Serialize)]
pub struct EditorPage {
    pub chrome: Chrome,
    pub post_id: Option<i64>,
    pub fields: EditorFields,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeletePage {
    pub chrome: Chrome,
    pub post: PostView,
}

#[derive(Debug, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub checked: bool,
}

/// Radio options with the stored value checked. An unknown stored value is
/// kept as an extra option so saving the form doesn't silently drop it.
pub fn choices(options: &[(&str, &str)], current: &str) -> Vec<Choice> {
    let mut list: Vec<Choice> = options
        .iter()
        .map(|(value, label)| Choice {
            value: value.to_string(),
            label: label.to_string(),
            checked: *value == current,
        })
        .collect();
    if !current.is_empty() && !options.iter().any(|(value, _)| *value == current) {
        list.push(Choice {
            value: current.to_string(),
            label: current.to_string(),
            checked: true,
        });
    }
    list
}

#[derive(Debug, Serialize)]
pub struct SettingsPage {
    pub chrome: Chrome,
    pub intro: String,
    pub blog_name: String,
    pub themes: Vec<Choice>,
    pub fonts: Vec<Choice>,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub chrome: Chrome,
    pub error: Option<String>,
}
