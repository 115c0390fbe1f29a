//! Turns a Messenger event into the normalized relay model.
//!
//! Name lookups happen in the relay loop (they need the live client); this
//! module is pure so the classification rules stay testable.

use tmb_core::attach::{ext, AttachmentDescriptor, AttachmentKind, RemoteRef};
use tmb_core::message::{reply_preview, NormalizedMessage, ReplyContext};

use crate::event::{MsgrAttachment, MsgrMessage, MsgrQuote};

/// Facebook's outbound-link shim; the real target rides in the `u=` query
/// parameter, percent-encoded.
const LINK_SHIM: &str = "//l.facebook.com/l.php?u=";

pub struct MsgrExtractor {
    preview_limit: usize,
}

enum Classified {
    Media(AttachmentDescriptor),
    Addition(String),
}

impl MsgrExtractor {
    pub fn new(preview_limit: usize) -> Self {
        Self { preview_limit }
    }

    /// Build the normalized message. `sender_name` and `quoted_name` are
    /// already resolved through the nickname/profile precedence; `self_id`
    /// is the bridge's own Messenger identity for quoted-self recovery.
    pub fn extract(
        &self,
        msg: &MsgrMessage,
        quote: Option<&MsgrQuote>,
        sender_name: String,
        quoted_name: Option<String>,
        self_id: &str,
    ) -> NormalizedMessage {
        let mut attachment = None;
        let mut additions = Vec::new();
        for att in &msg.attachments {
            match self.classify(att) {
                // One attachment slot per message; extras are dropped.
                Classified::Media(desc) => {
                    if attachment.is_none() {
                        attachment = Some(desc);
                    }
                }
                Classified::Addition(line) => additions.push(line),
            }
        }

        let reply = quote.map(|q| self.reply_context(q, quoted_name, self_id));

        let addition = if additions.is_empty() {
            String::new()
        } else {
            format!("\n{}", additions.join("\n"))
        };

        NormalizedMessage {
            sender_id: msg.sender_id.clone(),
            sender_name,
            body: msg.body.clone(),
            is_edited: false,
            reply,
            forward: None,
            attachment,
            poll: None,
            addition,
        }
    }

    fn reply_context(
        &self,
        quote: &MsgrQuote,
        quoted_name: Option<String>,
        self_id: &str,
    ) -> ReplyContext {
        if quote.sender_id == self_id {
            if let Some(ctx) = ReplyContext::self_authored(&quote.body, self.preview_limit) {
                return ctx;
            }
        }
        let name = quoted_name.unwrap_or_else(|| quote.sender_id.clone());
        ReplyContext::from_text(name, &quote.body, self.preview_limit)
    }

    fn classify(&self, att: &MsgrAttachment) -> Classified {
        match att {
            MsgrAttachment::Sticker { id, url } | MsgrAttachment::Photo { id, url } => {
                Classified::Media(image_descriptor(AttachmentKind::Photo, id, url))
            }
            MsgrAttachment::AnimatedImage { id, url } => {
                Classified::Media(image_descriptor(AttachmentKind::Gif, id, url))
            }
            MsgrAttachment::File { url, file_name } => {
                Classified::Media(AttachmentDescriptor {
                    kind: AttachmentKind::Document,
                    remote: RemoteRef::Url(url.clone()),
                    file_name: Some(file_name.clone()),
                    mime_hint: None,
                })
            }
            MsgrAttachment::Video { url, file_name } => {
                Classified::Media(AttachmentDescriptor {
                    kind: AttachmentKind::Video,
                    remote: RemoteRef::Url(url.clone()),
                    file_name: Some(file_name.clone()),
                    mime_hint: None,
                })
            }
            MsgrAttachment::Audio { url, file_name } => {
                // Voice notes arrive as ogg/opus clips; everything else is
                // relayed as a plain file. The mp4 audio container gets an
                // mp3 suffix so the destination treats it as playable.
                let (kind, file_name) = match ext::extension_from_path(url) {
                    Some("ogg") | Some("opus") => (AttachmentKind::Voice, file_name.clone()),
                    Some("mp4") => (AttachmentKind::Document, format!("{file_name}.mp3")),
                    _ => (AttachmentKind::Document, file_name.clone()),
                };
                Classified::Media(AttachmentDescriptor {
                    kind,
                    remote: RemoteRef::Url(url.clone()),
                    file_name: Some(file_name),
                    mime_hint: None,
                })
            }
            MsgrAttachment::Share {
                url,
                title,
                description,
                source,
            } => Classified::Addition(self.share_line(url, title, description, source)),
        }
    }

    fn share_line(&self, url: &str, title: &str, description: &str, source: &str) -> String {
        if let Some(idx) = url.find(LINK_SHIM) {
            let raw = &url[idx + LINK_SHIM.len()..];
            let raw = raw.split('&').next().unwrap_or(raw);
            let target = percent_decode(raw);
            let label = if title.is_empty() { target.clone() } else { title.to_string() };
            return format!("[{label}]({target})");
        }

        let label = if !description.is_empty() {
            let (preview, truncated) = reply_preview(description, self.preview_limit);
            let ellipsis = if truncated { "..." } else { "" };
            format!("{source}: {preview}{ellipsis}")
        } else if !title.is_empty() {
            title.to_string()
        } else {
            format!("{source} Post")
        };
        format!("[{label}]({url})")
    }
}

fn image_descriptor(kind: AttachmentKind, id: &str, url: &str) -> AttachmentDescriptor {
    let ext = ext::extension_from_path(url).unwrap_or("png");
    AttachmentDescriptor {
        kind,
        remote: RemoteRef::Url(url.to_string()),
        file_name: Some(format!("{id}.{ext}")),
        mime_hint: None,
    }
}

/// Decode `%XX` escapes; malformed sequences pass through untouched.
/// Works on raw bytes so a `%` followed by multibyte text never slices
/// inside a character.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> MsgrExtractor {
        MsgrExtractor::new(8)
    }

    fn msg(attachments: Vec<MsgrAttachment>) -> MsgrMessage {
        MsgrMessage {
            thread_id: 555,
            sender_id: "111".to_string(),
            body: "hello".to_string(),
            attachments,
        }
    }

    fn extract(m: &MsgrMessage) -> NormalizedMessage {
        extractor().extract(m, None, "Ann".to_string(), None, "0")
    }

    #[test]
    fn sticker_without_url_extension_falls_back_to_png() {
        let m = msg(vec![MsgrAttachment::Sticker {
            id: "369".to_string(),
            url: "https://cdn.fb/stick".to_string(),
        }]);
        let desc = extract(&m).attachment.unwrap();
        assert_eq!(desc.kind, AttachmentKind::Photo);
        assert_eq!(desc.file_name.as_deref(), Some("369.png"));
    }

    #[test]
    fn photo_filename_takes_the_url_extension() {
        let m = msg(vec![MsgrAttachment::Photo {
            id: "42".to_string(),
            url: "https://cdn.fb/p/42_n.jpg?oh=1".to_string(),
        }]);
        let desc = extract(&m).attachment.unwrap();
        assert_eq!(desc.file_name.as_deref(), Some("42.jpg"));
    }

    #[test]
    fn animated_image_keeps_its_animation() {
        let m = msg(vec![MsgrAttachment::AnimatedImage {
            id: "7".to_string(),
            url: "https://cdn.fb/a/7.gif".to_string(),
        }]);
        assert_eq!(extract(&m).attachment.unwrap().kind, AttachmentKind::Gif);
    }

    #[test]
    fn ogg_and_opus_audio_are_voice_notes() {
        for url in ["https://cdn.fb/a/clip.ogg", "https://cdn.fb/a/clip.opus?dl=1"] {
            let m = msg(vec![MsgrAttachment::Audio {
                url: url.to_string(),
                file_name: "clip".to_string(),
            }]);
            assert_eq!(extract(&m).attachment.unwrap().kind, AttachmentKind::Voice);
        }
    }

    #[test]
    fn mp4_audio_is_a_file_renamed_to_mp3() {
        let m = msg(vec![MsgrAttachment::Audio {
            url: "https://cdn.fb/a/clip.mp4".to_string(),
            file_name: "clip.mp4".to_string(),
        }]);
        let desc = extract(&m).attachment.unwrap();
        assert_eq!(desc.kind, AttachmentKind::Document);
        assert_eq!(desc.file_name.as_deref(), Some("clip.mp4.mp3"));
    }

    #[test]
    fn only_the_first_media_attachment_is_kept() {
        let m = msg(vec![
            MsgrAttachment::Photo {
                id: "1".to_string(),
                url: "https://cdn.fb/1.png".to_string(),
            },
            MsgrAttachment::Photo {
                id: "2".to_string(),
                url: "https://cdn.fb/2.png".to_string(),
            },
        ]);
        assert_eq!(
            extract(&m).attachment.unwrap().file_name.as_deref(),
            Some("1.png")
        );
    }

    #[test]
    fn internal_share_renders_source_and_truncated_description() {
        let m = msg(vec![MsgrAttachment::Share {
            url: "https://www.facebook.com/groups/x/permalink/1/".to_string(),
            title: "Post title".to_string(),
            description: "a very long description".to_string(),
            source: "Group".to_string(),
        }]);
        let out = extract(&m);
        assert!(out.attachment.is_none());
        assert_eq!(
            out.addition,
            "\n[Group: a very l...](https://www.facebook.com/groups/x/permalink/1/)"
        );
    }

    #[test]
    fn internal_share_without_description_uses_the_title_then_source() {
        let untitled = msg(vec![MsgrAttachment::Share {
            url: "https://www.facebook.com/x".to_string(),
            title: String::new(),
            description: String::new(),
            source: "Page".to_string(),
        }]);
        assert_eq!(
            extract(&untitled).addition,
            "\n[Page Post](https://www.facebook.com/x)"
        );
    }

    #[test]
    fn wrapped_share_link_is_unwrapped_and_decoded() {
        let m = msg(vec![MsgrAttachment::Share {
            url: "https://l.facebook.com/l.php?u=https%3A%2F%2Fexample.com%2Fa%3Fb%3D1&h=tracker"
                .to_string(),
            title: "Example".to_string(),
            description: String::new(),
            source: String::new(),
        }]);
        assert_eq!(
            extract(&m).addition,
            "\n[Example](https://example.com/a?b=1)"
        );
    }

    #[test]
    fn wrapped_share_with_stray_percent_and_multibyte_text_survives() {
        // A literal `%` with a non-hex multibyte continuation must pass
        // through undecoded instead of slicing mid-character.
        let m = msg(vec![MsgrAttachment::Share {
            url: "https://l.facebook.com/l.php?u=https%3A%2F%2Fx.com%2F100%físico".to_string(),
            title: String::new(),
            description: String::new(),
            source: String::new(),
        }]);
        assert_eq!(
            extract(&m).addition,
            "\n[https://x.com/100%físico](https://x.com/100%físico)"
        );
    }

    #[test]
    fn quoted_self_post_recovers_the_original_author() {
        let m = msg(Vec::new());
        let quote = MsgrQuote {
            sender_id: "0".to_string(),
            body: "Carol:\nlong quoted body".to_string(),
        };
        let out = extractor().extract(&m, Some(&quote), "Ann".to_string(), None, "0");
        let reply = out.reply.unwrap();
        assert!(reply.is_self_authored);
        assert_eq!(reply.replied_to_name, "Carol");
        assert_eq!(reply.preview, "long quo");
    }

    #[test]
    fn quoted_self_post_composed_in_markdown_recovers_the_author() {
        // What the bridge actually stores in the thread is the
        // Markdown-rendered header, emphasis markers included.
        let m = msg(Vec::new());
        let quote = MsgrQuote {
            sender_id: "900".to_string(),
            body: "*Alice:*\nhello from telegram".to_string(),
        };
        let out = extractor().extract(&m, Some(&quote), "Ann".to_string(), None, "900");
        let reply = out.reply.unwrap();
        assert!(reply.is_self_authored);
        assert_eq!(reply.replied_to_name, "Alice");
        assert_eq!(reply.preview, "hello fr");
    }

    #[test]
    fn quoted_peer_uses_the_resolved_name() {
        let m = msg(Vec::new());
        let quote = MsgrQuote {
            sender_id: "222".to_string(),
            body: "short".to_string(),
        };
        let out = extractor().extract(
            &m,
            Some(&quote),
            "Ann".to_string(),
            Some("Bob".to_string()),
            "0",
        );
        let reply = out.reply.unwrap();
        assert_eq!(reply.replied_to_name, "Bob");
        assert_eq!(reply.preview, "short");
        assert!(!reply.is_truncated);
    }
}
