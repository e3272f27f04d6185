use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Absolute http(s) URL pattern, scheme case-insensitive. Anything that does
/// not match is treated as plain text (including other schemes like ftp://).
const URL_PATTERN: &str = r"^(?i:https?)://[^\s/$.?#][^\s]*$";

static URL_REGEX: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| Regex::new(URL_PATTERN).expect("url pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Url,
    Text,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Url => "url",
            ItemKind::Text => "text",
        }
    }
}

/// Classify user content as a URL or plain text.
pub fn classify(content: &str) -> ItemKind {
    if url_regex().is_match(content) {
        ItemKind::Url
    } else {
        ItemKind::Text
    }
}

/// One received text/URL unit awaiting or having received user attention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxItem {
    /// Unique within the item list, stable across merges.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Epoch milliseconds of ingestion (not of origin).
    #[serde(rename = "timestamp")]
    pub received_at: u64,
    /// Defaults to false on creation; only ever transitions false -> true.
    #[serde(default)]
    pub seen: bool,
}

impl InboxItem {
    pub fn new_url(id: String, title: Option<String>, body: String, url: String, received_at: u64) -> Self {
        Self {
            id,
            kind: ItemKind::Url,
            title,
            body,
            url: Some(url),
            received_at,
            seen: false,
        }
    }

    pub fn new_text(id: String, title: Option<String>, body: String, received_at: u64) -> Self {
        Self {
            id,
            kind: ItemKind::Text,
            title,
            body,
            url: None,
            received_at,
            seen: false,
        }
    }
}
