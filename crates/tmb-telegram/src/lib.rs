//! Telegram adapter (teloxide).
//!
//! Inbound, the dispatcher in [`router`] snapshots updates and relays them
//! toward Messenger. Outbound, [`TelegramSender`] implements the core
//! `TelegramPort` over the Bot API send primitives.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};

pub mod event;
pub mod extract;
pub mod fetch;
pub mod router;

use tmb_core::attach::{LocalMedia, ResolvedAttachment};
use tmb_core::errors::Error;
use tmb_core::outbound::{TelegramDelivery, TelegramOutbound, TelegramPort};
use tmb_core::Result;

#[derive(Clone)]
pub struct TelegramSender {
    bot: Bot,
    parse_mode: Option<ParseMode>,
}

impl TelegramSender {
    pub fn new(bot: Bot, parse_mode: Option<ParseMode>) -> Self {
        Self { bot, parse_mode }
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Transport(format!("telegram error: {e}"))
    }

    fn input_file(media: &ResolvedAttachment) -> InputFile {
        match &media.media {
            LocalMedia::Memory(bytes) => {
                InputFile::memory(bytes.clone()).file_name(media.file_name.clone())
            }
            LocalMedia::File(path) => InputFile::file(path.to_path_buf()),
        }
    }

    async fn send_text(&self, chat: ChatId, text: String) -> Result<()> {
        let mut req = self.bot.send_message(chat, text);
        if let Some(mode) = self.parse_mode {
            req = req.parse_mode(mode);
        }
        req.await.map(drop).map_err(Self::map_err)
    }

    async fn send_captioned(
        &self,
        chat: ChatId,
        caption: String,
        media: &ResolvedAttachment,
        primitive: MediaPrimitive,
    ) -> Result<()> {
        let file = Self::input_file(media);
        let result = match primitive {
            MediaPrimitive::Photo => {
                let mut req = self.bot.send_photo(chat, file).caption(caption);
                if let Some(mode) = self.parse_mode {
                    req = req.parse_mode(mode);
                }
                req.await.map(drop)
            }
            MediaPrimitive::Video => {
                let mut req = self.bot.send_video(chat, file).caption(caption);
                if let Some(mode) = self.parse_mode {
                    req = req.parse_mode(mode);
                }
                req.await.map(drop)
            }
            MediaPrimitive::Audio => {
                let mut req = self.bot.send_audio(chat, file).caption(caption);
                if let Some(mode) = self.parse_mode {
                    req = req.parse_mode(mode);
                }
                req.await.map(drop)
            }
            MediaPrimitive::Voice => {
                let mut req = self.bot.send_voice(chat, file).caption(caption);
                if let Some(mode) = self.parse_mode {
                    req = req.parse_mode(mode);
                }
                req.await.map(drop)
            }
            MediaPrimitive::Animation => {
                let mut req = self.bot.send_animation(chat, file).caption(caption);
                if let Some(mode) = self.parse_mode {
                    req = req.parse_mode(mode);
                }
                req.await.map(drop)
            }
            MediaPrimitive::Document => {
                let mut req = self.bot.send_document(chat, file).caption(caption);
                if let Some(mode) = self.parse_mode {
                    req = req.parse_mode(mode);
                }
                req.await.map(drop)
            }
        };
        result.map_err(Self::map_err)
    }
}

#[derive(Clone, Copy)]
enum MediaPrimitive {
    Photo,
    Video,
    Audio,
    Voice,
    Animation,
    Document,
}

#[async_trait]
impl TelegramPort for TelegramSender {
    async fn deliver(&self, delivery: TelegramDelivery) -> Result<()> {
        use TelegramOutbound::*;

        let chat = ChatId(delivery.chat_id);
        let (result, media) = match delivery.payload {
            Text(text) => return self.send_text(chat, text).await,
            Venue {
                latitude,
                longitude,
                title,
                address,
            } => {
                return self
                    .bot
                    .send_venue(chat, latitude, longitude, title, address)
                    .await
                    .map(drop)
                    .map_err(Self::map_err)
            }
            Contact {
                phone_number,
                first_name,
            } => {
                return self
                    .bot
                    .send_contact(chat, phone_number, first_name)
                    .await
                    .map(drop)
                    .map_err(Self::map_err)
            }
            Location {
                latitude,
                longitude,
            } => {
                return self
                    .bot
                    .send_location(chat, latitude, longitude)
                    .await
                    .map(drop)
                    .map_err(Self::map_err)
            }
            Photo { caption, media } => (
                self.send_captioned(chat, caption, &media, MediaPrimitive::Photo)
                    .await,
                media,
            ),
            Video { caption, media } => (
                self.send_captioned(chat, caption, &media, MediaPrimitive::Video)
                    .await,
                media,
            ),
            Audio { caption, media } => (
                self.send_captioned(chat, caption, &media, MediaPrimitive::Audio)
                    .await,
                media,
            ),
            Voice { caption, media } => (
                self.send_captioned(chat, caption, &media, MediaPrimitive::Voice)
                    .await,
                media,
            ),
            Animation { caption, media } => (
                self.send_captioned(chat, caption, &media, MediaPrimitive::Animation)
                    .await,
                media,
            ),
            Document { caption, media } => (
                self.send_captioned(chat, caption, &media, MediaPrimitive::Document)
                    .await,
                media,
            ),
            VideoNote { caption, media } => {
                // sendVideoNote has no caption field; the text follows as
                // its own message.
                let result = self
                    .bot
                    .send_video_note(chat, Self::input_file(&media))
                    .await
                    .map(drop)
                    .map_err(Self::map_err);
                let result = match result {
                    Ok(()) if !caption.is_empty() => self.send_text(chat, caption).await,
                    other => other,
                };
                (result, media)
            }
            Sticker { media } => (
                self.bot
                    .send_sticker(chat, Self::input_file(&media))
                    .await
                    .map(drop)
                    .map_err(Self::map_err),
                media,
            ),
        };
        media.cleanup();
        result
    }
}
