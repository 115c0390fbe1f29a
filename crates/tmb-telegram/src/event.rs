//! Owned snapshot of an incoming Telegram update.
//!
//! Extraction works on this model rather than on `teloxide::types::Message`
//! directly, so the interesting logic stays constructible in tests without
//! fabricating Bot API payloads.

use teloxide::types::{ForwardedFrom, InlineKeyboardButtonKind, MediaKind, Message, MessageKind};

#[derive(Clone, Debug, PartialEq)]
pub struct TgUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl TgUser {
    /// "{first} {last}" as Telegram clients display it.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

/// Forward provenance as Telegram reports it.
#[derive(Clone, Debug, PartialEq)]
pub enum TgForward {
    User(TgUser),
    Chat { title: String },
    /// Privacy-restricted origin; only a display name survives.
    Hidden(String),
}

/// The single media payload a Telegram message can carry.
#[derive(Clone, Debug, PartialEq)]
pub enum TgMedia {
    Photo { file_id: String },
    Video { file_id: String, file_name: Option<String>, mime: Option<String> },
    Audio { file_id: String, file_name: Option<String>, mime: Option<String> },
    Voice { file_id: String, mime: Option<String> },
    VideoNote { file_id: String },
    Animation { file_id: String, file_name: Option<String>, mime: Option<String> },
    Document { file_id: String, file_name: Option<String>, mime: Option<String> },
    Sticker { file_id: String, animated: bool },
    Contact { phone_number: String, first_name: String, last_name: Option<String> },
    Location { latitude: f64, longitude: f64 },
    Venue { latitude: f64, longitude: f64, title: String, address: String },
    /// Not relayable; only shows up as a reply placeholder.
    Game { title: String },
}

/// Snapshot of the message a reply points at.
#[derive(Clone, Debug, PartialEq)]
pub struct TgReply {
    pub sender: Option<TgUser>,
    pub text: Option<String>,
    pub media: Option<TgMedia>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TgPoll {
    pub question: String,
    pub options: Vec<(String, u32)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TgMessage {
    pub chat_id: i64,
    pub sender: Option<TgUser>,
    /// Text body or media caption.
    pub text: Option<String>,
    pub is_edited: bool,
    pub reply: Option<Box<TgReply>>,
    pub forward: Option<TgForward>,
    pub media: Option<TgMedia>,
    pub poll: Option<TgPoll>,
    /// URL buttons from an inline keyboard, as (label, url) pairs.
    pub button_links: Vec<(String, String)>,
}

impl TgMessage {
    pub fn from_teloxide(msg: &Message, is_edited: bool) -> Self {
        let button_links = msg
            .reply_markup()
            .map(|markup| {
                markup
                    .inline_keyboard
                    .iter()
                    .flatten()
                    .filter_map(|b| match &b.kind {
                        InlineKeyboardButtonKind::Url(url) => {
                            Some((b.text.clone(), url.to_string()))
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            chat_id: msg.chat.id.0,
            sender: msg.from().map(user_of),
            text: msg.text().or_else(|| msg.caption()).map(str::to_string),
            is_edited,
            reply: msg.reply_to_message().map(|r| {
                Box::new(TgReply {
                    sender: r.from().map(user_of),
                    text: r.text().or_else(|| r.caption()).map(str::to_string),
                    media: media_of(r),
                })
            }),
            forward: msg.forward().map(|f| match &f.from {
                ForwardedFrom::User(u) => TgForward::User(user_of(u)),
                ForwardedFrom::Chat(c) => TgForward::Chat {
                    title: c
                        .title()
                        .map(str::to_string)
                        .or_else(|| c.username().map(|u| format!("@{u}")))
                        .unwrap_or_default(),
                },
                ForwardedFrom::SenderName(name) => TgForward::Hidden(name.clone()),
            }),
            media: media_of(msg),
            poll: msg.poll().map(|p| TgPoll {
                question: p.question.clone(),
                options: p
                    .options
                    .iter()
                    .map(|o| (o.text.clone(), o.voter_count as u32))
                    .collect(),
            }),
            button_links,
        }
    }
}

fn user_of(u: &teloxide::types::User) -> TgUser {
    TgUser {
        id: u.id.0 as i64,
        first_name: u.first_name.clone(),
        last_name: u.last_name.clone(),
    }
}

fn mime_str(mime: &Option<mime::Mime>) -> Option<String> {
    mime.as_ref().map(|m| m.to_string())
}

fn media_of(msg: &Message) -> Option<TgMedia> {
    let MessageKind::Common(common) = &msg.kind else {
        return None;
    };
    Some(match &common.media_kind {
        MediaKind::Photo(m) => {
            // Sizes are ordered smallest first; relay the largest rendition.
            let best = m.photo.last()?;
            TgMedia::Photo {
                file_id: best.file.id.clone(),
            }
        }
        MediaKind::Video(m) => TgMedia::Video {
            file_id: m.video.file.id.clone(),
            file_name: m.video.file_name.clone(),
            mime: mime_str(&m.video.mime_type),
        },
        MediaKind::Audio(m) => TgMedia::Audio {
            file_id: m.audio.file.id.clone(),
            file_name: m.audio.file_name.clone(),
            mime: mime_str(&m.audio.mime_type),
        },
        MediaKind::Voice(m) => TgMedia::Voice {
            file_id: m.voice.file.id.clone(),
            mime: mime_str(&m.voice.mime_type),
        },
        MediaKind::VideoNote(m) => TgMedia::VideoNote {
            file_id: m.video_note.file.id.clone(),
        },
        MediaKind::Animation(m) => TgMedia::Animation {
            file_id: m.animation.file.id.clone(),
            file_name: m.animation.file_name.clone(),
            mime: mime_str(&m.animation.mime_type),
        },
        MediaKind::Document(m) => TgMedia::Document {
            file_id: m.document.file.id.clone(),
            file_name: m.document.file_name.clone(),
            mime: mime_str(&m.document.mime_type),
        },
        MediaKind::Sticker(m) => TgMedia::Sticker {
            file_id: m.sticker.file.id.clone(),
            animated: m.sticker.is_animated(),
        },
        MediaKind::Contact(m) => TgMedia::Contact {
            phone_number: m.contact.phone_number.clone(),
            first_name: m.contact.first_name.clone(),
            last_name: m.contact.last_name.clone(),
        },
        MediaKind::Venue(m) => TgMedia::Venue {
            latitude: m.venue.location.latitude,
            longitude: m.venue.location.longitude,
            title: m.venue.title.clone(),
            address: m.venue.address.clone(),
        },
        MediaKind::Location(m) => TgMedia::Location {
            latitude: m.location.latitude,
            longitude: m.location.longitude,
        },
        MediaKind::Game(m) => TgMedia::Game {
            title: m.game.title.clone(),
        },
        _ => return None,
    })
}
