//! # File Category Classifier
//!
//! Maps filenames to mirror categories and MIME types using closed,
//! case-insensitive extension tables.
//!
//! Categories:
//! - `images` — bmp gif jpg jpeg png
//! - `docs`   — pdf docx xlsx pptx txt html
//! - `media`  — mp3 wav mp4 mov
//!
//! Anything else is unsupported and skipped by the engine. `archive` is a
//! metadata-only category: [`classify`] never returns it, and archives
//! have no mirrored blob of their own.

use serde::{Deserialize, Serialize};

/// Mirror category of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Images,
    Docs,
    Media,
    /// Container files (`.zip`). Exists only in metadata records written
    /// for deletion tracking; never produced by [`classify`].
    Archive,
}

impl Category {
    /// String form used in metadata records and storage prefixes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Docs => "docs",
            Category::Media => "media",
            Category::Archive => "archive",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lowercased extension of a filename, including the dot (".pdf").
fn extension(filename: &str) -> Option<String> {
    let dot = filename.rfind('.')?;
    // A leading dot is a hidden-file marker, not an extension
    if dot == 0 {
        return None;
    }
    Some(filename[dot..].to_lowercase())
}

/// Classify a filename by extension. `None` means unsupported.
pub fn classify(filename: &str) -> Option<Category> {
    match extension(filename)?.as_str() {
        ".bmp" | ".gif" | ".jpg" | ".jpeg" | ".png" => Some(Category::Images),
        ".pdf" | ".docx" | ".xlsx" | ".pptx" | ".txt" | ".html" => Some(Category::Docs),
        ".mp3" | ".wav" | ".mp4" | ".mov" => Some(Category::Media),
        _ => None,
    }
}

/// Best-effort MIME type from the extension; always returns a value.
pub fn mime_type(filename: &str) -> &'static str {
    let Some(ext) = extension(filename) else {
        return "application/octet-stream";
    };
    match ext.as_str() {
        ".bmp" => "image/bmp",
        ".gif" => "image/gif",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".pdf" => "application/pdf",
        ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".txt" => "text/plain",
        ".html" => "text/html",
        ".mp3" => "audio/mpeg",
        ".wav" => "audio/wav",
        ".mp4" => "video/mp4",
        ".mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Whether a filename or path denotes a container archive.
pub fn is_archive(name: &str) -> bool {
    name.to_lowercase().ends_with(".zip")
}

/// Lowercased file extension for key derivation ("" when absent).
pub fn key_extension(filename: &str) -> String {
    extension(filename).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_every_supported_extension() {
        let table = [
            ("a.bmp", Category::Images),
            ("a.gif", Category::Images),
            ("a.jpg", Category::Images),
            ("a.jpeg", Category::Images),
            ("a.png", Category::Images),
            ("a.pdf", Category::Docs),
            ("a.docx", Category::Docs),
            ("a.xlsx", Category::Docs),
            ("a.pptx", Category::Docs),
            ("a.txt", Category::Docs),
            ("a.html", Category::Docs),
            ("a.mp3", Category::Media),
            ("a.wav", Category::Media),
            ("a.mp4", Category::Media),
            ("a.mov", Category::Media),
        ];
        for (name, expected) in table {
            assert_eq!(classify(name), Some(expected), "{name}");
        }
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert_eq!(classify("file.xyz"), None);
        assert_eq!(classify("no_extension"), None);
        assert_eq!(classify(".hidden"), None);
        assert_eq!(classify("archive.zip"), None);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify("PHOTO.PNG"), Some(Category::Images));
        assert_eq!(classify("Report.PDF"), Some(Category::Docs));
    }

    #[test]
    fn mime_type_never_fails() {
        assert_eq!(mime_type("a.png"), "image/png");
        assert_eq!(mime_type("a.mov"), "video/quicktime");
        assert_eq!(mime_type("weird.xyz"), "application/octet-stream");
        assert_eq!(mime_type("noext"), "application/octet-stream");
    }

    #[test]
    fn archive_detection() {
        assert!(is_archive("bundle.zip"));
        assert!(is_archive("/folder/Bundle.ZIP"));
        assert!(!is_archive("bundle.zip.txt"));
        assert!(!is_archive("photo.png"));
    }

    #[test]
    fn key_extension_is_lowercased() {
        assert_eq!(key_extension("Report.PDF"), ".pdf");
        assert_eq!(key_extension("noext"), "");
    }
}
