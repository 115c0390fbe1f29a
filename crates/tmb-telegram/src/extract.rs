//! Turns a Telegram message snapshot into the normalized relay model:
//! resolve the sender, capture reply/forward context, map media to an
//! attachment descriptor and fold non-downloadable payloads (links,
//! coordinates, phone numbers) into the addition text.

use tmb_core::attach::{AttachmentDescriptor, AttachmentKind, RemoteRef};
use tmb_core::errors::Error;
use tmb_core::identity::IdentityResolver;
use tmb_core::message::{
    split_attribution, ForwardContext, NormalizedMessage, PollContext, ReplyContext,
};
use tmb_core::Result;

use crate::event::{TgForward, TgMedia, TgMessage, TgReply};

pub struct TgExtractor {
    /// The bot's own user id; replies to its posts get the quoted author
    /// recovered from the attribution prefix.
    self_id: i64,
    preview_limit: usize,
    resolver: IdentityResolver,
}

impl TgExtractor {
    pub fn new(self_id: i64, preview_limit: usize, resolver: IdentityResolver) -> Self {
        Self {
            self_id,
            preview_limit,
            resolver,
        }
    }

    pub fn extract(&self, msg: &TgMessage) -> Result<NormalizedMessage> {
        let sender = msg
            .sender
            .as_ref()
            .ok_or_else(|| Error::MalformedEvent("telegram message without a sender".into()))?;
        let sender_name = self.resolver.resolve(sender.id, Some(&sender.full_name()));

        let mut additions: Vec<String> = msg
            .button_links
            .iter()
            .map(|(label, url)| format!("{label}: {url}"))
            .collect();

        let mut attachment = None;
        if let Some(media) = &msg.media {
            match media {
                TgMedia::Contact {
                    phone_number,
                    first_name,
                    last_name,
                } => {
                    let last = last_name
                        .as_deref()
                        .map(|l| format!(" {l}"))
                        .unwrap_or_default();
                    additions.push(format!("{first_name}{last}: {phone_number}"));
                }
                TgMedia::Location {
                    latitude,
                    longitude,
                } => additions.push(maps_link(*latitude, *longitude)),
                TgMedia::Venue {
                    latitude,
                    longitude,
                    title,
                    address,
                } => additions.push(format!(
                    "{title}, {address}\n{}",
                    maps_link(*latitude, *longitude)
                )),
                TgMedia::Game { .. } => {}
                other => attachment = descriptor_of(other),
            }
        }

        let addition = if additions.is_empty() {
            String::new()
        } else {
            format!("\n{}", additions.join("\n"))
        };

        let mut body = msg.text.clone().unwrap_or_default();
        let forward = msg
            .forward
            .as_ref()
            .map(|f| self.forward_context(f, &mut body));

        Ok(NormalizedMessage {
            sender_id: sender.id.to_string(),
            sender_name,
            body,
            is_edited: msg.is_edited,
            reply: msg.reply.as_deref().map(|r| self.reply_context(r)),
            forward,
            attachment,
            poll: msg.poll.as_ref().map(|p| PollContext {
                question: p.question.clone(),
                options: p.options.clone(),
            }),
            addition,
        })
    }

    fn reply_context(&self, reply: &TgReply) -> ReplyContext {
        // A quote of the bridge's own post carries the real author in its
        // attribution prefix; recover it instead of naming the bot.
        if reply.sender.as_ref().map(|u| u.id) == Some(self.self_id) {
            if let Some(ctx) = reply
                .text
                .as_deref()
                .and_then(|t| ReplyContext::self_authored(t, self.preview_limit))
            {
                return ctx;
            }
        }

        let name = match &reply.sender {
            Some(u) => self.resolver.resolve(u.id, Some(&u.full_name())),
            None => "Unknown".to_string(),
        };
        match (&reply.text, &reply.media) {
            (Some(text), _) => ReplyContext::from_text(name, text, self.preview_limit),
            (None, Some(media)) => ReplyContext::placeholder(name, media_label(media)),
            (None, None) => ReplyContext::placeholder(name, "Message"),
        }
    }

    /// A forward of one of the bridge's own posts carries the real author
    /// in the body's attribution prefix; recover it and drop the prefix
    /// from the relayed body.
    fn forward_context(&self, forward: &TgForward, body: &mut String) -> ForwardContext {
        let origin_name = match forward {
            TgForward::User(u) if u.id == self.self_id => match split_attribution(body) {
                Some((name, rest)) => {
                    let name = name.to_string();
                    *body = rest.to_string();
                    name
                }
                None => self.resolver.resolve(u.id, Some(&u.full_name())),
            },
            TgForward::User(u) => self.resolver.resolve(u.id, Some(&u.full_name())),
            TgForward::Chat { title } => title.clone(),
            TgForward::Hidden(name) => name.clone(),
        };
        ForwardContext { origin_name }
    }
}

fn maps_link(latitude: f64, longitude: f64) -> String {
    format!("https://www.google.com/maps/@{latitude},{longitude},16z")
}

/// Content-kind labels used when a quoted message has no text to preview.
fn media_label(media: &TgMedia) -> &'static str {
    match media {
        TgMedia::Audio { .. } => "Audio",
        TgMedia::Document { .. } => "Document",
        TgMedia::Game { .. } => "Game",
        TgMedia::Photo { .. } => "Photo",
        TgMedia::Sticker { .. } => "Sticker",
        TgMedia::Video { .. } => "Video",
        TgMedia::Voice { .. } => "Voice",
        TgMedia::VideoNote { .. } => "Video Note",
        TgMedia::Animation { .. } => "GIF",
        TgMedia::Contact { .. } => "Contact",
        TgMedia::Location { .. } => "Location",
        TgMedia::Venue { .. } => "Venue",
    }
}

fn descriptor_of(media: &TgMedia) -> Option<AttachmentDescriptor> {
    let (kind, file_id, file_name, mime_hint) = match media {
        TgMedia::Photo { file_id } => (AttachmentKind::Photo, file_id, None, None),
        TgMedia::Video {
            file_id,
            file_name,
            mime,
        } => (AttachmentKind::Video, file_id, file_name.clone(), mime.clone()),
        TgMedia::Audio {
            file_id,
            file_name,
            mime,
        } => (AttachmentKind::Audio, file_id, file_name.clone(), mime.clone()),
        TgMedia::Voice { file_id, mime } => (AttachmentKind::Voice, file_id, None, mime.clone()),
        TgMedia::VideoNote { file_id } => (AttachmentKind::VideoNote, file_id, None, None),
        TgMedia::Animation {
            file_id,
            file_name,
            mime,
        } => (AttachmentKind::Gif, file_id, file_name.clone(), mime.clone()),
        TgMedia::Document {
            file_id,
            file_name,
            mime,
        } => (
            AttachmentKind::Document,
            file_id,
            file_name.clone(),
            mime.clone(),
        ),
        TgMedia::Sticker { file_id, animated } => (
            if *animated {
                AttachmentKind::StickerAnimated
            } else {
                AttachmentKind::StickerStatic
            },
            file_id,
            None,
            None,
        ),
        TgMedia::Contact { .. }
        | TgMedia::Location { .. }
        | TgMedia::Venue { .. }
        | TgMedia::Game { .. } => return None,
    };
    Some(AttachmentDescriptor {
        kind,
        remote: RemoteRef::FileId(file_id.clone()),
        file_name,
        mime_hint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TgUser;
    use std::collections::HashMap;

    const BOT_ID: i64 = 999;

    fn extractor() -> TgExtractor {
        TgExtractor::new(
            BOT_ID,
            8,
            IdentityResolver::new(HashMap::from([(42, "Nick".to_string())])),
        )
    }

    fn user(id: i64, first: &str) -> TgUser {
        TgUser {
            id,
            first_name: first.to_string(),
            last_name: None,
        }
    }

    fn base_msg() -> TgMessage {
        TgMessage {
            chat_id: -100,
            sender: Some(user(1, "Alice")),
            text: Some("hello".to_string()),
            is_edited: false,
            reply: None,
            forward: None,
            media: None,
            poll: None,
            button_links: Vec::new(),
        }
    }

    #[test]
    fn sender_is_required() {
        let mut msg = base_msg();
        msg.sender = None;
        assert!(matches!(
            extractor().extract(&msg),
            Err(Error::MalformedEvent(_))
        ));
    }

    #[test]
    fn nickname_overrides_profile_name() {
        let mut msg = base_msg();
        msg.sender = Some(user(42, "Real Name"));
        let out = extractor().extract(&msg).unwrap();
        assert_eq!(out.sender_name, "Nick");
        assert_eq!(out.sender_id, "42");
    }

    #[test]
    fn reply_quotes_text_when_present() {
        let mut msg = base_msg();
        msg.reply = Some(Box::new(TgReply {
            sender: Some(user(2, "Bob")),
            text: Some("a very long original message".to_string()),
            media: None,
        }));
        let out = extractor().extract(&msg).unwrap();
        let reply = out.reply.unwrap();
        assert_eq!(reply.replied_to_name, "Bob");
        assert_eq!(reply.preview, "a very l");
        assert!(reply.is_truncated);
    }

    #[test]
    fn reply_without_text_gets_a_content_label() {
        let mut msg = base_msg();
        msg.reply = Some(Box::new(TgReply {
            sender: Some(user(2, "Bob")),
            text: None,
            media: Some(TgMedia::VideoNote {
                file_id: "f".to_string(),
            }),
        }));
        let out = extractor().extract(&msg).unwrap();
        let reply = out.reply.unwrap();
        assert_eq!(reply.preview, "Video Note");
        assert!(!reply.is_truncated);
    }

    #[test]
    fn reply_to_own_post_recovers_the_quoted_author() {
        let mut msg = base_msg();
        msg.reply = Some(Box::new(TgReply {
            sender: Some(user(BOT_ID, "Bridge Bot")),
            text: Some("Carol:\n0123456789".to_string()),
            media: None,
        }));
        let out = extractor().extract(&msg).unwrap();
        let reply = out.reply.unwrap();
        assert!(reply.is_self_authored);
        assert_eq!(reply.replied_to_name, "Carol");
        assert_eq!(reply.preview, "01234567");
        assert!(reply.is_truncated);
    }

    #[test]
    fn forward_of_own_post_recovers_author_and_strips_prefix() {
        let mut msg = base_msg();
        msg.text = Some("Carol:\nhello there".to_string());
        msg.forward = Some(TgForward::User(user(BOT_ID, "Bridge Bot")));
        let out = extractor().extract(&msg).unwrap();
        assert_eq!(out.forward.unwrap().origin_name, "Carol");
        assert_eq!(out.body, "hello there");
    }

    #[test]
    fn forwarded_channel_uses_the_title() {
        let mut msg = base_msg();
        msg.forward = Some(TgForward::Chat {
            title: "Some Channel".to_string(),
        });
        let out = extractor().extract(&msg).unwrap();
        assert_eq!(out.forward.unwrap().origin_name, "Some Channel");
    }

    #[test]
    fn location_becomes_a_maps_link_not_an_attachment() {
        let mut msg = base_msg();
        msg.media = Some(TgMedia::Location {
            latitude: 1.5,
            longitude: -2.25,
        });
        let out = extractor().extract(&msg).unwrap();
        assert!(out.attachment.is_none());
        assert_eq!(out.addition, "\nhttps://www.google.com/maps/@1.5,-2.25,16z");
    }

    #[test]
    fn contact_and_buttons_stack_in_the_addition() {
        let mut msg = base_msg();
        msg.button_links = vec![("Open".to_string(), "https://example.com/x".to_string())];
        msg.media = Some(TgMedia::Contact {
            phone_number: "+123".to_string(),
            first_name: "Dan".to_string(),
            last_name: Some("Ko".to_string()),
        });
        let out = extractor().extract(&msg).unwrap();
        assert_eq!(out.addition, "\nOpen: https://example.com/x\nDan Ko: +123");
    }

    #[test]
    fn animated_sticker_maps_to_the_animated_kind() {
        let mut msg = base_msg();
        msg.text = None;
        msg.media = Some(TgMedia::Sticker {
            file_id: "st1".to_string(),
            animated: true,
        });
        let out = extractor().extract(&msg).unwrap();
        let desc = out.attachment.unwrap();
        assert_eq!(desc.kind, AttachmentKind::StickerAnimated);
        assert_eq!(desc.remote, RemoteRef::FileId("st1".to_string()));
    }
}
