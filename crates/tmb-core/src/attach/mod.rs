//! Attachment pipeline: resolve a platform media reference into a
//! deliverable local form.
//!
//! Download goes through a [`MediaFetcher`] port (HTTP for Messenger URLs,
//! the Bot API file endpoint for Telegram file ids), buffered in memory or
//! staged to a named temp file depending on the configured mode. Stickers
//! are the two transcode cases; everything else is a byte-for-byte copy
//! plus filename/extension inference.

pub mod ext;
pub mod fetch;
pub mod sticker;

use std::io::Write;

use tracing::warn;

use crate::{errors::Error, Result};

pub use fetch::{Fetched, HttpFetcher, MediaFetcher};

/// What kind of media an attachment carries; drives extension overrides,
/// transcoding and the destination send primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    Video,
    VideoNote,
    Audio,
    Voice,
    Document,
    StickerStatic,
    StickerAnimated,
    Gif,
}

/// Platform-specific handle to the remote bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteRef {
    /// Plain HTTPS URL (Messenger CDN).
    Url(String),
    /// Telegram Bot API file id.
    FileId(String),
}

/// Created by a context extractor; consumed exactly once by
/// [`AttachmentPipeline::resolve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    pub kind: AttachmentKind,
    pub remote: RemoteRef,
    /// Filename dictated by the source platform (documents, renamed audio).
    pub file_name: Option<String>,
    pub mime_hint: Option<String>,
}

/// Where the resolved bytes live.
#[derive(Debug)]
pub enum LocalMedia {
    Memory(Vec<u8>),
    /// Named temp file; deleting it is the cleanup obligation.
    File(tempfile::TempPath),
}

/// The pipeline's output: local bytes plus the final filename the
/// destination platform should see.
#[derive(Debug)]
pub struct ResolvedAttachment {
    pub kind: AttachmentKind,
    pub file_name: String,
    pub media: LocalMedia,
}

impl ResolvedAttachment {
    /// Remove any temp file created during resolution. Consuming `self`
    /// makes the exactly-once contract structural; buffer-mode media is a
    /// no-op. Dispatchers call this after the send settles, on success and
    /// failure alike; a failed delete is logged and never retried.
    pub fn cleanup(self) {
        if let LocalMedia::File(path) = self.media {
            if let Err(e) = path.close() {
                warn!("attachment temp cleanup failed: {e}");
            }
        }
    }
}

/// External renderer for animated stickers (gzipped Lottie JSON → GIF).
const TGS_RENDERER: &str = "lottie_convert.py";

/// Resolves attachment descriptors: download, transcode when the
/// destination requires it, name the result.
pub struct AttachmentPipeline {
    fetcher: std::sync::Arc<dyn MediaFetcher>,
    to_buffer: bool,
}

impl AttachmentPipeline {
    pub fn new(fetcher: std::sync::Arc<dyn MediaFetcher>, to_buffer: bool) -> Self {
        Self { fetcher, to_buffer }
    }

    /// Resolve one descriptor. Transport and transcode failures are fatal to
    /// this attachment only; the caller delivers the message as text-only.
    pub async fn resolve(&self, desc: AttachmentDescriptor) -> Result<ResolvedAttachment> {
        let fetched = self.fetcher.fetch(&desc.remote, self.to_buffer).await?;

        match desc.kind {
            AttachmentKind::StickerStatic => {
                let webp = into_memory(fetched.media).await?;
                let png = sticker::webp_to_png(&webp)?;
                Ok(ResolvedAttachment {
                    kind: desc.kind,
                    file_name: "sticker.png".to_string(),
                    media: self.store(png)?,
                })
            }
            AttachmentKind::StickerAnimated => {
                let tgs = into_memory(fetched.media).await?;
                let gif = sticker::tgs_to_gif(&tgs, TGS_RENDERER).await?;
                let media = if self.to_buffer {
                    let bytes = tokio::fs::read(&gif).await?;
                    if let Err(e) = gif.close() {
                        warn!("sticker temp cleanup failed: {e}");
                    }
                    LocalMedia::Memory(bytes)
                } else {
                    LocalMedia::File(gif)
                };
                Ok(ResolvedAttachment {
                    kind: desc.kind,
                    file_name: "animated.gif".to_string(),
                    media,
                })
            }
            _ => {
                let file_name = ext::final_file_name(&desc, fetched.remote_path.as_deref());
                Ok(ResolvedAttachment {
                    kind: desc.kind,
                    file_name,
                    media: fetched.media,
                })
            }
        }
    }

    fn store(&self, bytes: Vec<u8>) -> Result<LocalMedia> {
        if self.to_buffer {
            return Ok(LocalMedia::Memory(bytes));
        }
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(LocalMedia::File(file.into_temp_path()))
    }
}

async fn into_memory(media: LocalMedia) -> Result<Vec<u8>> {
    match media {
        LocalMedia::Memory(bytes) => Ok(bytes),
        LocalMedia::File(path) => {
            let bytes = tokio::fs::read(&path).await.map_err(Error::Io)?;
            if let Err(e) = path.close() {
                warn!("attachment temp cleanup failed: {e}");
            }
            Ok(bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticFetcher {
        bytes: Vec<u8>,
        remote_path: Option<String>,
    }

    #[async_trait]
    impl MediaFetcher for StaticFetcher {
        async fn fetch(&self, _remote: &RemoteRef, to_buffer: bool) -> Result<Fetched> {
            let media = if to_buffer {
                LocalMedia::Memory(self.bytes.clone())
            } else {
                let mut f = tempfile::NamedTempFile::new()?;
                f.write_all(&self.bytes)?;
                LocalMedia::File(f.into_temp_path())
            };
            Ok(Fetched {
                media,
                remote_path: self.remote_path.clone(),
            })
        }
    }

    fn descriptor(kind: AttachmentKind) -> AttachmentDescriptor {
        AttachmentDescriptor {
            kind,
            remote: RemoteRef::Url("https://cdn.example/v/123.dat".to_string()),
            file_name: None,
            mime_hint: Some("video/mp4".to_string()),
        }
    }

    #[tokio::test]
    async fn plain_media_keeps_bytes_and_infers_name() {
        let pipeline = AttachmentPipeline::new(
            std::sync::Arc::new(StaticFetcher {
                bytes: vec![1, 2, 3],
                remote_path: Some("videos/clip.dat".to_string()),
            }),
            true,
        );
        let out = pipeline.resolve(descriptor(AttachmentKind::Video)).await.unwrap();
        assert_eq!(out.file_name, "clip.mp4");
        match out.media {
            LocalMedia::Memory(b) => assert_eq!(b, vec![1, 2, 3]),
            LocalMedia::File(_) => panic!("expected buffered media"),
        }
    }

    #[tokio::test]
    async fn disk_mode_stages_a_temp_file_and_cleanup_removes_it() {
        let pipeline = AttachmentPipeline::new(
            std::sync::Arc::new(StaticFetcher {
                bytes: vec![9; 16],
                remote_path: None,
            }),
            false,
        );
        let out = pipeline.resolve(descriptor(AttachmentKind::Video)).await.unwrap();
        let path = match &out.media {
            LocalMedia::File(p) => p.to_path_buf(),
            LocalMedia::Memory(_) => panic!("expected staged file"),
        };
        assert!(path.exists());
        out.cleanup();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn static_sticker_is_reencoded_as_png() {
        // Encode a tiny webp in-process so the fetcher hands back real data.
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            3,
            2,
            image::Rgba([255, 0, 0, 255]),
        ));
        let mut webp = std::io::Cursor::new(Vec::new());
        img.write_to(&mut webp, image::ImageFormat::WebP).unwrap();

        let pipeline = AttachmentPipeline::new(
            std::sync::Arc::new(StaticFetcher {
                bytes: webp.into_inner(),
                remote_path: None,
            }),
            true,
        );
        let desc = AttachmentDescriptor {
            kind: AttachmentKind::StickerStatic,
            remote: RemoteRef::FileId("abc".to_string()),
            file_name: None,
            mime_hint: None,
        };
        let out = pipeline.resolve(desc).await.unwrap();
        assert_eq!(out.file_name, "sticker.png");
        let LocalMedia::Memory(png) = out.media else {
            panic!("expected buffered media");
        };
        // PNG signature, original dimensions preserved.
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let meta = image::load_from_memory(&png).unwrap();
        assert_eq!((meta.width(), meta.height()), (3, 2));
    }
}
