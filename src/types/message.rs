//! Thread messages and their content items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// A message in a thread. Immutable once produced by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    pub role: MessageRole,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

impl Message {
    /// Concatenate all text items.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                ContentItem::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Message author role.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    #[serde(alias = "agent")]
    #[strum(to_string = "assistant", serialize = "agent")]
    Assistant,
}

impl MessageRole {
    /// Role name with its first letter upper-cased ("User", "Assistant").
    pub fn label(&self) -> String {
        let name = self.as_ref();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Sort order for listing thread messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
pub enum ListOrder {
    #[default]
    #[strum(serialize = "asc")]
    Ascending,
    #[strum(serialize = "desc")]
    Descending,
}

/// A single piece of message content.
///
/// Closed over the kinds this crate understands; anything else decodes to
/// [`ContentItem::Other`] so new server-side kinds never fail a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawContentItem", into = "RawContentItem")]
pub enum ContentItem {
    Text { text: String },
    ImageFile { file_id: String },
    ImageUrl { url: String },
    Other { kind: String },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_file(file_id: impl Into<String>) -> Self {
        Self::ImageFile {
            file_id: file_id.into(),
        }
    }

    /// Wire name of this item's kind.
    pub fn kind(&self) -> &str {
        match self {
            Self::Text { .. } => "text",
            Self::ImageFile { .. } => "image_file",
            Self::ImageUrl { .. } => "image_url",
            Self::Other { kind } => kind,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawContentItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<RawText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_file: Option<RawImageFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<RawImageUrl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawText {
    value: String,
    #[serde(default)]
    annotations: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawImageFile {
    file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawImageUrl {
    url: String,
}

impl From<RawContentItem> for ContentItem {
    fn from(raw: RawContentItem) -> Self {
        match (raw.kind.as_str(), raw.text, raw.image_file, raw.image_url) {
            ("text", Some(text), _, _) => Self::Text { text: text.value },
            ("image_file", _, Some(image), _) => Self::ImageFile {
                file_id: image.file_id,
            },
            ("image_url", _, _, Some(image)) => Self::ImageUrl { url: image.url },
            _ => Self::Other { kind: raw.kind },
        }
    }
}

impl From<ContentItem> for RawContentItem {
    fn from(item: ContentItem) -> Self {
        match item {
            ContentItem::Text { text } => Self {
                kind: "text".to_string(),
                text: Some(RawText {
                    value: text,
                    annotations: Vec::new(),
                }),
                ..Default::default()
            },
            ContentItem::ImageFile { file_id } => Self {
                kind: "image_file".to_string(),
                image_file: Some(RawImageFile { file_id }),
                ..Default::default()
            },
            ContentItem::ImageUrl { url } => Self {
                kind: "image_url".to_string(),
                image_url: Some(RawImageUrl { url }),
                ..Default::default()
            },
            ContentItem::Other { kind } => Self {
                kind,
                ..Default::default()
            },
        }
    }
}
