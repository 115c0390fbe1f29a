//! Media download port and its HTTP implementation.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{LocalMedia, RemoteRef};
use crate::{errors::Error, Result};

/// Downloaded bytes plus the remote path they came from, when the transport
/// exposes one. The path feeds filename inference.
pub struct Fetched {
    pub media: LocalMedia,
    pub remote_path: Option<String>,
}

/// Transport seam for the attachment pipeline. The Telegram adapter
/// provides a Bot API implementation for file ids; plain URLs go through
/// [`HttpFetcher`].
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, remote: &RemoteRef, to_buffer: bool) -> Result<Fetched>;
}

/// Fetches HTTPS URLs with a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn fetch(&self, remote: &RemoteRef, to_buffer: bool) -> Result<Fetched> {
        let url = match remote {
            RemoteRef::Url(url) => url,
            RemoteRef::FileId(id) => {
                return Err(Error::Transport(format!(
                    "file id {id:?} needs the bot file endpoint, not plain HTTP"
                )))
            }
        };
        let response = self.client.get(url).send().await?.error_for_status()?;
        let remote_path = Some(response.url().path().to_string());

        let media = if to_buffer {
            let bytes = response.bytes().await?;
            LocalMedia::Memory(bytes.to_vec())
        } else {
            let (file, path) = tempfile::NamedTempFile::new()?.into_parts();
            let mut file = tokio::fs::File::from_std(file);
            let mut response = response;
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            LocalMedia::File(path)
        };
        Ok(Fetched { media, remote_path })
    }
}
