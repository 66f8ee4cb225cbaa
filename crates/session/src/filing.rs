//! Filing metadata parsed from upload filenames
//!
//! Uploads are named `<ticker>--<form>--<date>_<timestamp>.<extension>`;
//! the pieces drive store and agent naming.

use crate::{Result, SessionError};
use std::path::{Path, PathBuf};

/// Extensions accepted for upload, compared case-insensitively
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "c", "cpp", "cs", "css", "doc", "docx", "go", "html", "java", "js", "json", "md", "pdf",
    "php", "pptx", "py", "rb", "sh", "tex", "ts", "txt", "png", "jpg", "tiff", "bmp",
];

/// Extensions whose content is rasterized and needs layout analysis
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "tiff", "bmp"];

/// Lowercased extension of a path, empty when there is none
pub fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase()
}

pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension(path).as_str())
}

/// Images and pdf files are flattened to Markdown before upload
pub fn needs_extraction(path: &Path) -> bool {
    let ext = extension(path);
    ext == "pdf" || IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Sibling path holding the Markdown extracted from a processed document
pub fn processed_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    path.with_file_name(format!("{}_processed.md", stem))
}

/// Ticker, form type, and filing date carried in an upload's filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingMeta {
    pub ticker: String,
    pub form: String,
    pub date: String,
}

impl FilingMeta {
    /// Parse the filename stem. The date is the third `--` segment up to
    /// the first underscore; empty segments are skipped.
    pub fn from_path(path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let parts: Vec<&str> = stem.split("--").filter(|p| !p.is_empty()).collect();
        if parts.len() < 3 {
            return Err(SessionError::BadFileName(stem.to_string()));
        }

        Ok(Self {
            ticker: parts[0].to_string(),
            form: parts[1].to_string(),
            date: parts[2].split('_').next().unwrap_or_default().to_string(),
        })
    }

    /// Store name shared by every upload of this form and date
    pub fn store_name(&self) -> String {
        format!("{}--{}", self.form, self.date)
    }

    /// Agent name namespaced by the user prefix
    pub fn agent_name(&self, user_prefix: &str) -> String {
        format!("{}_{}-{}", user_prefix, self.ticker, self.form)
    }
}
