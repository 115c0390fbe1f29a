//! Outbound delivery ports. Each direction of the bridge composes a
//! delivery value and hands it to the opposite platform's port; the
//! adapter crates provide the real implementations, the `Disabled*`
//! stand-ins keep a half-configured bridge wired end to end.

use async_trait::async_trait;
use tracing::debug;

use crate::attach::ResolvedAttachment;
use crate::Result;

/// One message addressed to a Telegram chat.
pub struct TelegramDelivery {
    pub chat_id: i64,
    pub payload: TelegramOutbound,
}

/// The Telegram send primitive to use, with its payload. Media-carrying
/// variants own their attachment until the send settles.
pub enum TelegramOutbound {
    Text(String),
    Photo { caption: String, media: ResolvedAttachment },
    Video { caption: String, media: ResolvedAttachment },
    Audio { caption: String, media: ResolvedAttachment },
    Voice { caption: String, media: ResolvedAttachment },
    VideoNote { caption: String, media: ResolvedAttachment },
    Animation { caption: String, media: ResolvedAttachment },
    Document { caption: String, media: ResolvedAttachment },
    Sticker { media: ResolvedAttachment },
    Venue { latitude: f64, longitude: f64, title: String, address: String },
    Contact { phone_number: String, first_name: String },
    Location { latitude: f64, longitude: f64 },
}

impl TelegramOutbound {
    /// Take the attachment out for cleanup on paths that never reach a send.
    pub fn into_media(self) -> Option<ResolvedAttachment> {
        match self {
            TelegramOutbound::Text(_)
            | TelegramOutbound::Venue { .. }
            | TelegramOutbound::Contact { .. }
            | TelegramOutbound::Location { .. } => None,
            TelegramOutbound::Photo { media, .. }
            | TelegramOutbound::Video { media, .. }
            | TelegramOutbound::Audio { media, .. }
            | TelegramOutbound::Voice { media, .. }
            | TelegramOutbound::VideoNote { media, .. }
            | TelegramOutbound::Animation { media, .. }
            | TelegramOutbound::Document { media, .. }
            | TelegramOutbound::Sticker { media } => Some(media),
        }
    }
}

/// One message addressed to a Messenger thread.
pub struct MessengerDelivery {
    pub thread_id: i64,
    pub payload: MessengerOutbound,
}

pub enum MessengerOutbound {
    Message {
        text: String,
        attachment: Option<ResolvedAttachment>,
    },
    Poll {
        title: String,
        /// Ordered (label, vote count) pairs, counts included so the
        /// destination poll reflects the tally at relay time.
        options: Vec<(String, u32)>,
    },
}

#[async_trait]
pub trait TelegramPort: Send + Sync {
    async fn deliver(&self, delivery: TelegramDelivery) -> Result<()>;
}

#[async_trait]
pub trait MessengerPort: Send + Sync {
    async fn deliver(&self, delivery: MessengerDelivery) -> Result<()>;
}

/// Used when the Telegram side is switched off in the config. Drops
/// deliveries after releasing any staged media.
pub struct DisabledTelegram;

#[async_trait]
impl TelegramPort for DisabledTelegram {
    async fn deliver(&self, delivery: TelegramDelivery) -> Result<()> {
        debug!("telegram disabled, dropping message for chat {}", delivery.chat_id);
        if let Some(media) = delivery.payload.into_media() {
            media.cleanup();
        }
        Ok(())
    }
}

/// Counterpart stand-in for a switched-off Messenger side.
pub struct DisabledMessenger;

#[async_trait]
impl MessengerPort for DisabledMessenger {
    async fn deliver(&self, delivery: MessengerDelivery) -> Result<()> {
        debug!(
            "messenger disabled, dropping message for thread {}",
            delivery.thread_id
        );
        if let MessengerOutbound::Message {
            attachment: Some(media),
            ..
        } = delivery.payload
        {
            media.cleanup();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attach::{AttachmentKind, LocalMedia};

    fn staged_media() -> (ResolvedAttachment, std::path::PathBuf) {
        let path = tempfile::NamedTempFile::new().unwrap().into_temp_path();
        let buf = path.to_path_buf();
        (
            ResolvedAttachment {
                kind: AttachmentKind::Photo,
                file_name: "p.png".to_string(),
                media: LocalMedia::File(path),
            },
            buf,
        )
    }

    #[tokio::test]
    async fn disabled_telegram_still_releases_media() {
        let (media, path) = staged_media();
        assert!(path.exists());
        DisabledTelegram
            .deliver(TelegramDelivery {
                chat_id: 1,
                payload: TelegramOutbound::Photo {
                    caption: String::new(),
                    media,
                },
            })
            .await
            .unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn disabled_messenger_still_releases_media() {
        let (media, path) = staged_media();
        DisabledMessenger
            .deliver(MessengerDelivery {
                thread_id: 2,
                payload: MessengerOutbound::Message {
                    text: "x".to_string(),
                    attachment: Some(media),
                },
            })
            .await
            .unwrap();
        assert!(!path.exists());
    }
}
