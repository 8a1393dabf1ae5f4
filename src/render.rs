use regex::{Captures, Regex};
use rocket_dyn_templates::tera::{self, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Meta descriptions are cut to this many bytes.
pub const DESCRIPTION_LIMIT: usize = 160;

const LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // [text](url), allowing one level of balanced parentheses in the url
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(((?:[^()]+|\([^()]*\))+)\)").expect("link pattern"))
}

fn bold_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").expect("bold pattern"))
}

fn italic_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*([^*]+)\*").expect("italic pattern"))
}

/// Tera filter: `{{ post.content | format | safe }}`.
pub fn format_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("format filter expects a string"))?;
    Ok(Value::String(format_content(text)))
}

/// Turn raw post text into HTML. Everything is escaped first; the only
/// markup that survives is what this function emits itself.
pub fn format_content(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n");
    let escaped = html_escape(&normalized);

    let linked = link_regex().replace_all(&escaped, |caps: &Captures| {
        let text = &caps[1];
        let url = &caps[2];
        match url_scheme(url) {
            Some(scheme) if LINK_SCHEMES.contains(&scheme.as_str()) => format!(
                r#"<a href="{}" target="_blank" rel="noopener">{}</a>"#,
                url, text
            ),
            _ => caps[0].to_string(),
        }
    });
    let bolded = bold_regex().replace_all(&linked, "<strong>$1</strong>");
    let styled = italic_regex().replace_all(&bolded, "<em>$1</em>");

    styled
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", p.replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lowercased URL scheme, if the string starts with one.
fn url_scheme(url: &str) -> Option<String> {
    let (scheme, _) = url.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some(scheme.to_ascii_lowercase())
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&#34;")
        .replace('\'', "&#39;")
}

/// Cut `s` to at most `max` bytes (backing off to a char boundary) and mark
/// the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
