use std::fs;
use std::path::{Path, PathBuf};

use grabbit_contracts::ConfigError;
use tracing::warn;

/// An image file forwarded to the provider as a visual exemplar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ReferenceImage {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|err| ConfigError::ReferenceUnreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            mime_type: mime_for_path(path).unwrap_or("image/png"),
            bytes,
        })
    }
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Where the style exemplar for one artifact kind comes from.
///
/// A missing `Default` file only warns: generation continues without it.
/// A missing `Explicit` file was asked for by name, so it is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleReference {
    Default(PathBuf),
    Explicit(PathBuf),
    Disabled,
}

/// Loads the style exemplar followed by every extra reference, in order.
pub fn load_references(
    style: &StyleReference,
    extras: &[PathBuf],
) -> Result<Vec<ReferenceImage>, ConfigError> {
    let mut loaded = Vec::with_capacity(extras.len() + 1);
    match style {
        StyleReference::Default(path) => {
            if path.is_file() {
                loaded.push(ReferenceImage::load(path)?);
            } else {
                warn!(path = %path.display(), "style reference not found, continuing without it");
            }
        }
        StyleReference::Explicit(path) => loaded.push(ReferenceImage::load(path)?),
        StyleReference::Disabled => {}
    }
    for extra in extras {
        loaded.push(ReferenceImage::load(extra)?);
    }
    Ok(loaded)
}

/// Reference images per artifact kind, loaded once before the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    pub prize: Vec<ReferenceImage>,
    pub banner: Vec<ReferenceImage>,
}

impl ReferenceSet {
    pub fn load(
        prize_style: &StyleReference,
        banner_style: &StyleReference,
        extras: &[PathBuf],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            prize: load_references(prize_style, extras)?,
            banner: load_references(banner_style, extras)?,
        })
    }
}
