use std::path::Path;

/// External programs a file can be handed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalTool {
    /// Office documents rendered to HTML
    DocumentConverter,
    /// Streaming-media containers
    MediaStreamer,
    /// Archives, slideshows and spreadsheets opened on the host desktop
    DesktopOpener,
}

/// How a file's content reaches the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStrategy {
    /// Stream the bytes untouched with this media type
    PassthroughBinary(&'static str),
    /// Run the tool and return its stdout
    ExternalConvert(ExternalTool),
    /// Launch the tool and answer without waiting for it
    ExternalOpen(ExternalTool),
    /// Read as UTF-8 and return verbatim
    RawText,
}

impl ContentStrategy {
    /// Pick a strategy from the file extension (case-insensitive)
    pub fn for_path(path: &Path) -> Self {
        let ext = extension_of(path);

        if let Some(mime_type) = passthrough_mime(&ext) {
            return ContentStrategy::PassthroughBinary(mime_type);
        }

        match ext.as_str() {
            "dex" | "sxi" | "sxa" | "sxv" => ContentStrategy::ExternalOpen(ExternalTool::MediaStreamer),
            "doc" | "docx" => ContentStrategy::ExternalConvert(ExternalTool::DocumentConverter),
            "ppt" | "pptx" | "xls" | "xlsx" | "tgz" | "tar" | "zip" | "gz" => {
                ContentStrategy::ExternalOpen(ExternalTool::DesktopOpener)
            }
            _ => ContentStrategy::RawText,
        }
    }
}

/// Media type for images, audio, video and PDF
fn passthrough_mime(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        // images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        // audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        // video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime)
}

/// Rough media type for the offline tree map tooltips
pub fn guess_mime_from_extension(path: &Path) -> &'static str {
    let ext = extension_of(path);
    if let Some(mime) = passthrough_mime(&ext) {
        return mime;
    }

    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "rs" => "text/x-rust",
        "py" => "text/x-python",
        "sh" | "bash" => "text/x-shellscript",
        "toml" => "text/x-toml",
        "yaml" | "yml" => "text/x-yaml",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "tar" => "application/x-tar",
        _ => "unknown",
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy(name: &str) -> ContentStrategy {
        ContentStrategy::for_path(Path::new(name))
    }

    #[test]
    fn test_media_families_pass_through() {
        assert_eq!(strategy("photo.png"), ContentStrategy::PassthroughBinary("image/png"));
        assert_eq!(strategy("song.FLAC"), ContentStrategy::PassthroughBinary("audio/flac"));
        assert_eq!(strategy("clip.mkv"), ContentStrategy::PassthroughBinary("video/x-matroska"));
        assert_eq!(strategy("paper.Pdf"), ContentStrategy::PassthroughBinary("application/pdf"));
    }

    #[test]
    fn test_ogg_is_audio() {
        assert_eq!(strategy("a.ogg"), ContentStrategy::PassthroughBinary("audio/ogg"));
    }

    #[test]
    fn test_external_families() {
        assert_eq!(
            strategy("report.docx"),
            ContentStrategy::ExternalConvert(ExternalTool::DocumentConverter)
        );
        assert_eq!(
            strategy("show.SXI"),
            ContentStrategy::ExternalOpen(ExternalTool::MediaStreamer)
        );
        assert_eq!(
            strategy("archive.zip"),
            ContentStrategy::ExternalOpen(ExternalTool::DesktopOpener)
        );
        assert_eq!(
            strategy("backup.tar.gz"),
            ContentStrategy::ExternalOpen(ExternalTool::DesktopOpener)
        );
    }

    #[test]
    fn test_everything_else_is_text() {
        assert_eq!(strategy("notes.txt"), ContentStrategy::RawText);
        assert_eq!(strategy("Makefile"), ContentStrategy::RawText);
        assert_eq!(strategy(".bashrc"), ContentStrategy::RawText);
    }
}
