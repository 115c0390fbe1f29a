//! Renders a normalized message into the destination platform's markup
//! dialect.
//!
//! The presentation modes are mutually exclusive and checked in priority
//! order: reply quote, forward quote, edited marker, plain. Whatever the
//! branch, the raw addition text (link previews, coordinates, phone numbers)
//! is appended verbatim afterwards.

use crate::message::NormalizedMessage;

/// Destination markup dialect. A configuration switch on the destination
/// adapter, not on the composer: the composer just receives it and emits
/// dialect-appropriate emphasis and escaping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkupDialect {
    /// No markup at all (also used for poll titles, which render no markup).
    Plain,
    /// Telegram legacy Markdown / Messenger markdown. No escape mechanism
    /// exists in this dialect, so dynamic text passes through unchanged.
    Markdown,
    /// Telegram MarkdownV2 with its full reserved-character escape set.
    MarkdownV2,
}

/// Display strings for message framing. The localized string tables of the
/// original deployment are an external collaborator; these are the en-US
/// defaults. `{}` marks the substitution slot.
#[derive(Clone, Debug)]
pub struct Labels {
    pub in_reply_to: String,
    pub forwarded_from: String,
    pub edited: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            in_reply_to: "In reply to {}".to_string(),
            forwarded_from: "Forwarded from {}".to_string(),
            edited: "Edited".to_string(),
        }
    }
}

fn fill(template: &str, value: &str) -> String {
    template.replacen("{}", value, 1)
}

/// Composer output: a text payload (possibly a media caption) or a poll
/// creation call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Composed {
    Text(String),
    Poll {
        title: String,
        options: Vec<(String, u32)>,
    },
}

const MARKDOWN_V2_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape text for the given dialect.
pub fn escape(text: &str, dialect: MarkupDialect) -> String {
    match dialect {
        MarkupDialect::Plain | MarkupDialect::Markdown => text.to_string(),
        MarkupDialect::MarkdownV2 => {
            let mut out = String::with_capacity(text.len());
            for c in text.chars() {
                if MARKDOWN_V2_RESERVED.contains(&c) {
                    out.push('\\');
                }
                out.push(c);
            }
            out
        }
    }
}

fn bold(escaped: &str, dialect: MarkupDialect) -> String {
    match dialect {
        MarkupDialect::Plain => escaped.to_string(),
        MarkupDialect::Markdown | MarkupDialect::MarkdownV2 => format!("*{escaped}*"),
    }
}

/// Remove emphasis markers from a composed header. The destination poll UI
/// renders titles as plain text.
pub fn strip_emphasis(text: &str) -> String {
    text.chars().filter(|c| *c != '*' && *c != '_').collect()
}

/// Render one normalized message. First matching presentation mode wins:
/// reply beats forward beats edited beats plain.
pub fn compose(msg: &NormalizedMessage, dialect: MarkupDialect, labels: &Labels) -> Composed {
    let e = |s: &str| escape(s, dialect);

    let header = bold(&format!("{}:", e(&msg.sender_name)), dialect);
    let body = e(&msg.body);
    let quote_mark = e(">");

    let mut text = if let Some(r) = &msg.reply {
        let label = bold(
            &e(&format!("[{}]", fill(&labels.in_reply_to, &r.replied_to_name))),
            dialect,
        );
        let ellipsis = if r.is_truncated { e("...") } else { String::new() };
        format!(
            "{header}\n{label}\n{quote_mark} {}{ellipsis}\n{body}",
            e(&r.preview)
        )
    } else if let Some(f) = &msg.forward {
        let label = bold(
            &e(&format!("[{}]", fill(&labels.forwarded_from, &f.origin_name))),
            dialect,
        );
        format!("{header}\n{label}\n{body}")
    } else if msg.is_edited {
        format!("{quote_mark} {}\n{header}\n{body}", e(&labels.edited))
    } else {
        format!("{header}\n{body}")
    };

    text.push_str(&msg.addition);

    if let Some(p) = &msg.poll {
        return Composed::Poll {
            title: format!("{}{}", strip_emphasis(&text), p.question),
            options: p.options.clone(),
        };
    }

    Composed::Text(text)
}
