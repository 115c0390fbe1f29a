//! The normalized intermediate message model passed between extractor,
//! composer and dispatcher, plus the attribution-prefix helpers both
//! directions rely on.

use crate::attach::AttachmentDescriptor;

/// Separator of the bridge's own `"{name}:\n{body}"` attribution prefix.
pub const ATTRIBUTION_SEP: &str = ":\n";

/// One relayed message, fully owned by the pipeline invocation that created
/// it. Exactly one of {plain text, attachment, poll} is the primary payload;
/// the rest is metadata layered onto it.
#[derive(Clone, Debug, Default)]
pub struct NormalizedMessage {
    pub sender_id: String,
    /// Resolved display name; never empty (falls back to the stringified id).
    pub sender_name: String,
    pub body: String,
    pub is_edited: bool,
    pub reply: Option<ReplyContext>,
    pub forward: Option<ForwardContext>,
    pub attachment: Option<AttachmentDescriptor>,
    pub poll: Option<PollContext>,
    /// Appended verbatim after composition (link previews, coordinates,
    /// phone numbers).
    pub addition: String,
}

/// Reply-chain metadata: who was quoted and a bounded preview of what.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyContext {
    pub replied_to_name: String,
    /// Preview of the quoted text, at most `preview_text_limit` characters,
    /// or a synthesized content-kind placeholder when the quoted message had
    /// no text body.
    pub preview: String,
    /// True only when a text body existed and it exceeded the limit; gates
    /// the trailing ellipsis marker.
    pub is_truncated: bool,
    /// The quoted message was originally the bridge's own post; its author
    /// name was recovered from the attribution prefix.
    pub is_self_authored: bool,
}

impl ReplyContext {
    /// Reply to a message with a text body.
    pub fn from_text(name: impl Into<String>, text: &str, limit: usize) -> Self {
        let (preview, is_truncated) = reply_preview(text, limit);
        Self {
            replied_to_name: name.into(),
            preview,
            is_truncated,
            is_self_authored: false,
        }
    }

    /// Reply to a message with no text body: the preview is a content-kind
    /// label ("Photo", "Video Note", ...), never truncated.
    pub fn placeholder(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            replied_to_name: name.into(),
            preview: label.into(),
            is_truncated: false,
            is_self_authored: false,
        }
    }

    /// Reply to one of the bridge's own posts: the author name and the text
    /// offset are parsed back out of the `"{name}:\n{body}"` attribution
    /// prefix, and truncation is computed against the text after it.
    pub fn self_authored(quoted: &str, limit: usize) -> Option<Self> {
        let (name, body) = split_attribution(quoted)?;
        let (preview, is_truncated) = reply_preview(body, limit);
        Some(Self {
            replied_to_name: name.to_string(),
            preview,
            is_truncated,
            is_self_authored: true,
        })
    }
}

/// Forward provenance: a person's name, a channel title/handle, or the name
/// recovered from the bridge's own attribution prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardContext {
    pub origin_name: String,
}

/// A poll, captured once from the source event and consumed once by the
/// composer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollContext {
    pub question: String,
    /// Ordered (label, vote count) pairs.
    pub options: Vec<(String, u32)>,
}

/// Build the attribution prefix the bridge puts in front of every relayed
/// message.
pub fn attribution_prefix(name: &str) -> String {
    format!("{name}{ATTRIBUTION_SEP}")
}

/// Split `"{name}:\n{rest}"` back into its parts. Also recognizes the
/// Markdown-emphasized header `"*{name}:*\n{rest}"`, which is what a
/// Markdown destination stores verbatim. Returns `None` when the text
/// carries neither form.
pub fn split_attribution(text: &str) -> Option<(&str, &str)> {
    if let Some(rest) = text.strip_prefix('*') {
        if let Some(idx) = rest.find(":*\n") {
            return Some((&rest[..idx], &rest[idx + 3..]));
        }
    }
    let idx = text.find(ATTRIBUTION_SEP)?;
    Some((&text[..idx], &text[idx + ATTRIBUTION_SEP.len()..]))
}

/// Character-accurate reply preview: the first `limit` characters and
/// whether the original strictly exceeded the limit.
pub fn reply_preview(text: &str, limit: usize) -> (String, bool) {
    let truncated = text.chars().count() > limit;
    (text.chars().take(limit).collect(), truncated)
}
