//! Bot API implementation of the media download port.

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use tokio::io::AsyncWriteExt;

use tmb_core::attach::{Fetched, LocalMedia, MediaFetcher, RemoteRef};
use tmb_core::errors::Error;
use tmb_core::Result;

/// Downloads Telegram files: `getFile` to learn the server path, then the
/// file endpoint into a buffer or a named temp file.
pub struct TelegramFetcher {
    bot: Bot,
}

impl TelegramFetcher {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MediaFetcher for TelegramFetcher {
    async fn fetch(&self, remote: &RemoteRef, to_buffer: bool) -> Result<Fetched> {
        let file_id = match remote {
            RemoteRef::FileId(id) => id.clone(),
            RemoteRef::Url(url) => {
                return Err(Error::Transport(format!(
                    "plain url {url:?} does not go through the bot file endpoint"
                )))
            }
        };
        let file = self
            .bot
            .get_file(file_id)
            .await
            .map_err(|e| Error::Transport(format!("telegram getFile: {e}")))?;

        let media = if to_buffer {
            let mut buf = std::io::Cursor::new(Vec::new());
            self.bot
                .download_file(&file.path, &mut buf)
                .await
                .map_err(|e| Error::Transport(format!("telegram download: {e}")))?;
            LocalMedia::Memory(buf.into_inner())
        } else {
            let (std_file, path) = tempfile::NamedTempFile::new()?.into_parts();
            let mut dst = tokio::fs::File::from_std(std_file);
            self.bot
                .download_file(&file.path, &mut dst)
                .await
                .map_err(|e| Error::Transport(format!("telegram download: {e}")))?;
            dst.flush().await?;
            LocalMedia::File(path)
        };

        Ok(Fetched {
            media,
            remote_path: Some(file.path),
        })
    }
}
