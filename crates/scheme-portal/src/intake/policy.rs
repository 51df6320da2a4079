use std::path::Path;

/// Allow-list applied to a single upload field. Extension and declared MIME type must both pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePolicy {
    pub extensions: &'static [&'static str],
    pub mime_types: &'static [&'static str],
    pub rejection: &'static str,
}

pub const IMAGE_POLICY: FilePolicy = FilePolicy {
    extensions: &["jpeg", "jpg", "png", "gif", "jfif"],
    mime_types: &[
        "image/jpeg",
        "image/jpg",
        "image/pjpeg",
        "image/png",
        "image/gif",
        "image/jfif",
    ],
    rejection: "Invalid image file type. Only JPEG, JPG, PNG, GIF, JFIF allowed.",
};

pub const DOCUMENT_POLICY: FilePolicy = FilePolicy {
    extensions: &[
        "pdf", "doc", "docx", "txt", "jpeg", "jpg", "png", "csv", "xlsx", "xls",
    ],
    mime_types: &[
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "application/vnd.ms-excel",
        "text/plain",
        "text/csv",
        "image/jpeg",
        "image/png",
    ],
    rejection: "Invalid document type. Only PDF, DOC, DOCX, TXT, CSV, JPEG, JPG, PNG, XLSX, XLS files are allowed.",
};

impl FilePolicy {
    pub fn allows_extension(&self, original_name: &str) -> bool {
        extension_of(original_name)
            .map(|ext| self.extensions.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Parameters such as `; charset=utf-8` are ignored.
    pub fn allows_mime(&self, declared: &str) -> bool {
        match declared.trim().parse::<mime::Mime>() {
            Ok(parsed) => {
                let essence = parsed.essence_str().to_ascii_lowercase();
                self.mime_types.contains(&essence.as_str())
            }
            Err(_) => false,
        }
    }

    pub fn allows(&self, original_name: &str, declared: &str) -> bool {
        self.allows_extension(original_name) && self.allows_mime(declared)
    }
}

/// Extension of the client-supplied file name, without the dot.
pub fn extension_of(original_name: &str) -> Option<&str> {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
}
