//! Turns a thread's messages into printable lines.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::types::{ContentItem, Message, MessageRole};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One transcript line: a single content item of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub timestamp: DateTime<Utc>,
    pub role: MessageRole,
    pub body: String,
}

impl fmt::Display for RenderedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}: {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.role.label(),
            self.body
        )
    }
}

/// Render messages oldest first, one line per content item.
///
/// Messages with equal timestamps keep their input order; items keep their
/// order within a message. Content the renderer does not understand becomes a
/// placeholder line instead of an error.
pub fn render(messages: &[Message]) -> Vec<RenderedLine> {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by_key(|m| m.created_at);

    ordered
        .into_iter()
        .flat_map(|message| {
            message.content.iter().map(move |item| RenderedLine {
                timestamp: message.created_at,
                role: message.role,
                body: render_item(item),
            })
        })
        .collect()
}

/// Body text for a single content item.
pub fn render_item(item: &ContentItem) -> String {
    match item {
        ContentItem::Text { text } => text.clone(),
        ContentItem::ImageFile { file_id } => format!("<image from ID: {file_id}>"),
        ContentItem::ImageUrl { url } => format!("<image from URL: {url}>"),
        ContentItem::Other { kind } => format!("<unsupported content: {kind}>"),
    }
}
