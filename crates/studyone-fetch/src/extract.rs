//! Metadata extraction from raw HTML.
//!
//! Regex based, tolerant of malformed markup. Extracted fields:
//!
//! - title: `<title>`, falling back to the first `<h1>`
//! - description / keywords: `<meta name=...>`, falling back to `og:` properties
//! - summary: text of the first three `<p>` elements (empty ones skipped),
//!   joined by a space and cut to 500 characters

use once_cell::sync::Lazy;
use regex::Regex;

use studyone_core::defaults::{SUMMARY_MAX_CHARS, SUMMARY_PARAGRAPHS};
use studyone_core::WebpageData;

static SCRIPT_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)>")
        .expect("valid regex")
});
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
static H1_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h1(?:\s[^>]*)?>(.*?)</h1>").expect("valid regex"));
static P_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p>").expect("valid regex"));
static META_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<meta\b([^>]*)>").expect("valid regex"));
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Extract page metadata for `url` from its HTML body.
pub fn extract_webpage(url: &str, html: &str) -> WebpageData {
    let cleaned = COMMENT_RE.replace_all(html, " ");
    let cleaned = SCRIPT_STYLE_RE.replace_all(&cleaned, " ");

    WebpageData {
        url: url.to_string(),
        title: extract_title(&cleaned),
        description: extract_meta(&cleaned, "description"),
        summary: extract_summary(&cleaned),
        keywords: extract_meta(&cleaned, "keywords"),
    }
}

fn first_text(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| html_to_text(m.as_str()))
        .filter(|s| !s.is_empty())
}

/// `<title>` text, else the first `<h1>`.
pub fn extract_title(html: &str) -> Option<String> {
    first_text(&TITLE_RE, html).or_else(|| first_text(&H1_RE, html))
}

/// `<meta name="{name}">` content, else `<meta property="og:{name}">`.
pub fn extract_meta(html: &str, name: &str) -> Option<String> {
    let og = format!("og:{}", name);
    let metas: Vec<Vec<(String, String)>> = META_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| parse_attributes(m.as_str()))
        .collect();

    let lookup = |key: &str, wanted: &str| {
        metas.iter().find_map(|attrs| {
            let matches = attrs
                .iter()
                .any(|(k, v)| k == key && v.eq_ignore_ascii_case(wanted));
            if !matches {
                return None;
            }
            attrs
                .iter()
                .find(|(k, _)| k == "content")
                .map(|(_, v)| decode_entities(v).trim().to_string())
                .filter(|v| !v.is_empty())
        })
    };

    lookup("name", name).or_else(|| lookup("property", &og))
}

/// First three paragraphs' text, empty ones dropped, capped in length.
pub fn extract_summary(html: &str) -> Option<String> {
    let texts: Vec<String> = P_RE
        .captures_iter(html)
        .take(SUMMARY_PARAGRAPHS)
        .filter_map(|caps| caps.get(1))
        .map(|m| html_to_text(m.as_str()))
        .filter(|t| !t.is_empty())
        .collect();

    if texts.is_empty() {
        return None;
    }
    Some(texts.join(" ").chars().take(SUMMARY_MAX_CHARS).collect())
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Some((key, value))
        })
        .collect()
}

/// Strip tags, decode common entities and collapse whitespace.
pub fn html_to_text(fragment: &str) -> String {
    let text = TAG_RE.replace_all(fragment, " ");
    let text = decode_entities(&text);
    WS_RE.replace_all(text.trim(), " ").to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
