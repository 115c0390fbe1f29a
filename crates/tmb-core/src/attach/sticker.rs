//! Sticker transcoding: static webp → png in-process, animated tgs → gif
//! through an external Lottie renderer.

use std::io::{Cursor, Read, Write};
use std::process::Stdio;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::{errors::Error, Result};

/// Re-encode a webp sticker as png so platforms without webp support can
/// display it.
pub fn webp_to_png(webp: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory_with_format(webp, image::ImageFormat::WebP)
        .map_err(|e| Error::Transcode(format!("webp decode: {e}")))?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| Error::Transcode(format!("png encode: {e}")))?;
    Ok(out.into_inner())
}

/// Render an animated sticker (gzipped Lottie JSON) to a GIF via the given
/// renderer command. The returned temp path is the caller's to delete.
pub async fn tgs_to_gif(tgs: &[u8], renderer: &str) -> Result<tempfile::TempPath> {
    let mut json = Vec::new();
    GzDecoder::new(tgs)
        .read_to_end(&mut json)
        .map_err(|e| Error::Transcode(format!("tgs gunzip: {e}")))?;

    let mut input = tempfile::Builder::new().suffix(".json").tempfile()?;
    input.write_all(&json)?;
    input.flush()?;

    let output = tempfile::Builder::new()
        .suffix(".gif")
        .tempfile()?
        .into_temp_path();

    debug!("rendering animated sticker via {renderer}");
    let result = tokio::process::Command::new(renderer)
        .arg(input.path())
        .arg(&*output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| Error::Transcode(format!("spawn {renderer}: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        let tail: String = stderr.lines().rev().take(3).collect::<Vec<_>>().join(" | ");
        return Err(Error::Transcode(format!(
            "{renderer} exited with {}: {tail}",
            result.status
        )));
    }
    Ok(output)
}
