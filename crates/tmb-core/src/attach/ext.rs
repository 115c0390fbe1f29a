//! Filename and extension inference for downloaded media.

use super::{AttachmentDescriptor, AttachmentKind};

/// Some kinds prescribe the container regardless of what the source claims.
pub fn forced_extension(kind: AttachmentKind) -> Option<&'static str> {
    match kind {
        AttachmentKind::Photo => Some("png"),
        AttachmentKind::VideoNote => Some("mp4"),
        AttachmentKind::Gif => Some("gif"),
        AttachmentKind::StickerStatic => Some("png"),
        AttachmentKind::StickerAnimated => Some("gif"),
        _ => None,
    }
}

/// MIME type → extension, covering the types the bridged platforms emit.
/// "audio/mpeg3" is a nonstandard alias some encoders still produce.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    Some(match mime {
        "audio/mpeg" | "audio/mpeg3" | "audio/mp3" => "mp3",
        "audio/ogg" | "application/ogg" => "ogg",
        "audio/mp4" | "audio/x-m4a" => "m4a",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/flac" => "flac",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        "video/x-matroska" => "mkv",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        "text/plain" => "txt",
        _ => return None,
    })
}

/// Extension of the last path segment, with any query string stripped first.
pub fn extension_from_path(path: &str) -> Option<&str> {
    let (_, ext) = last_segment(path).rsplit_once('.')?;
    if ext.is_empty() || ext.contains('/') {
        None
    } else {
        Some(ext)
    }
}

fn last_segment(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.rsplit('/').next().unwrap_or(path)
}

fn stem_from_path(path: &str) -> Option<&str> {
    let name = last_segment(path);
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    };
    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}

/// Final filename for a resolved attachment. A source-supplied name always
/// wins; otherwise the stem comes from the remote path and the extension
/// from, in priority order, the kind override, the MIME hint, the remote
/// path itself, then a generic fallback.
pub fn final_file_name(desc: &AttachmentDescriptor, remote_path: Option<&str>) -> String {
    if let Some(name) = &desc.file_name {
        return name.clone();
    }
    let stem = remote_path.and_then(stem_from_path).unwrap_or("attachment");
    let ext = forced_extension(desc.kind)
        .or_else(|| desc.mime_hint.as_deref().and_then(extension_for_mime))
        .or_else(|| remote_path.and_then(extension_from_path))
        .unwrap_or("bin");
    format!("{stem}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attach::RemoteRef;

    fn desc(kind: AttachmentKind, file_name: Option<&str>, mime: Option<&str>) -> AttachmentDescriptor {
        AttachmentDescriptor {
            kind,
            remote: RemoteRef::FileId("x".to_string()),
            file_name: file_name.map(str::to_string),
            mime_hint: mime.map(str::to_string),
        }
    }

    #[test]
    fn supplied_name_wins_over_everything() {
        let d = desc(AttachmentKind::Document, Some("report.pdf"), Some("video/mp4"));
        assert_eq!(final_file_name(&d, Some("files/blob.dat")), "report.pdf");
    }

    #[test]
    fn kind_override_beats_mime_hint() {
        let d = desc(AttachmentKind::VideoNote, None, Some("video/webm"));
        assert_eq!(final_file_name(&d, Some("notes/round")), "round.mp4");
    }

    #[test]
    fn mpeg3_alias_maps_to_mp3() {
        let d = desc(AttachmentKind::Audio, None, Some("audio/mpeg3"));
        assert_eq!(final_file_name(&d, Some("music/track.weird")), "track.mp3");
    }

    #[test]
    fn remote_path_extension_is_the_last_resort() {
        let d = desc(AttachmentKind::Document, None, Some("application/x-unknown"));
        assert_eq!(
            final_file_name(&d, Some("docs/notes.txt?dl=1")),
            "notes.txt"
        );
    }

    #[test]
    fn generic_fallback_when_nothing_is_known() {
        let d = desc(AttachmentKind::Document, None, None);
        assert_eq!(final_file_name(&d, None), "attachment.bin");
    }

    #[test]
    fn query_strings_do_not_leak_into_extensions() {
        assert_eq!(extension_from_path("a/b.png?oh=1&oe=2"), Some("png"));
        assert_eq!(extension_from_path("a/b?oh=1.5"), None);
    }
}
