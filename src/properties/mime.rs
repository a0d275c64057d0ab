//! Content type detection

use std::path::Path;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Content-type sniffing boundary.
pub trait MimeSniffer: Send + Sync {
    fn sniff(&self, path: &Path) -> String;
}

/// Maps file extensions to content types.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionSniffer;

const EXTENSIONS: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("xml", "application/xml"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("svg", "image/svg+xml"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("mp4", "video/mp4"),
];

impl MimeSniffer for ExtensionSniffer {
    fn sniff(&self, path: &Path) -> String {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        extension
            .and_then(|ext| {
                EXTENSIONS
                    .iter()
                    .find(|(known, _)| *known == ext)
                    .map(|(_, mime)| mime.to_string())
            })
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_lookup() {
        let sniffer = ExtensionSniffer;
        assert_eq!(sniffer.sniff(Path::new("/a/report.PDF")), "application/pdf");
        assert_eq!(sniffer.sniff(Path::new("notes.txt")), "text/plain");
        assert_eq!(sniffer.sniff(Path::new("blob")), DEFAULT_MIME_TYPE);
        assert_eq!(sniffer.sniff(Path::new("x.unknown")), DEFAULT_MIME_TYPE);
    }
}
