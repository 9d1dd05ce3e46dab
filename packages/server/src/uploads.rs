//! Content-addressed image uploads.
//!
//! Uploaded bytes are named by the first 16 hex characters of their
//! SHA-256 digest, so re-uploading identical content is a no-op and
//! filenames never collide with user input. Only a small extension
//! allow-list is accepted and size is capped before anything touches
//! disk.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Accepted image file extensions (lowercase).
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Upload rejections and failures.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The filename extension is not on the allow-list.
    #[error("file type not allowed; allowed: {}", ALLOWED_EXTENSIONS.join(", "))]
    ExtensionNotAllowed,

    /// The payload exceeds the configured size cap.
    #[error("file too large; max {max} bytes")]
    TooLarge {
        /// Configured maximum in bytes.
        max: usize,
    },

    /// Writing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validates and writes an uploaded image, returning its path.
///
/// # Errors
///
/// Returns [`UploadError`] when the extension is not allowed, the
/// payload exceeds `max_size`, or the write fails.
pub fn save_image(
    dir: &Path,
    prefix: &str,
    original_filename: &str,
    bytes: &[u8],
    max_size: usize,
) -> Result<PathBuf, UploadError> {
    let extension = allowed_extension(original_filename).ok_or(UploadError::ExtensionNotAllowed)?;

    if bytes.len() > max_size {
        return Err(UploadError::TooLarge { max: max_size });
    }

    let digest = Sha256::digest(bytes);
    let short_hash = &hex::encode(digest)[..16];

    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{prefix}_{short_hash}.{extension}"));
    std::fs::write(&path, bytes)?;

    log::debug!("Saved upload {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Returns the lowercase extension when it is on the allow-list.
fn allowed_extension(filename: &str) -> Option<String> {
    let extension = Path::new(filename)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}
