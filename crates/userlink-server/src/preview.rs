//! Placeholder previews for files attached to an assistant.
//!
//! Files uploaded for assistant use cannot be downloaded back from the
//! remote service, so the preview describes the file instead of showing it.

use serde::Serialize;
use userlink_store::FileRecord;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FilePreview {
    pub content: String,
}

pub fn describe(file: &FileRecord) -> FilePreview {
    let content = match file.mime_type.as_str() {
        "text/plain" => format!(
            "# {}\n\nFile ID: {}\nSize: {}\nType: {}\n\nNote: OpenAI doesn't allow direct \
             download of assistant files. The content isn't accessible outside of the \
             assistant's context.",
            file.name,
            file.id,
            format_file_size(file.size),
            file.mime_type
        ),
        "application/pdf" => "[PDF Content] - OpenAI doesn't allow direct download of \
                              assistant files. The PDF content is only accessible to the \
                              assistant during conversation."
            .to_string(),
        _ => String::new(),
    };
    FilePreview { content }
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}
