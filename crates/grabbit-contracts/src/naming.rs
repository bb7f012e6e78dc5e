use std::path::{Path, PathBuf};

use serde::Serialize;

/// Characters that become a hyphen. Any other whitespace is treated the same way.
const HYPHENATED: &[char] = &[' ', '/', '\\'];
/// Characters that are dropped outright.
const DROPPED: &[char] = &[':', '(', ')', '%', '&', ',', '\'', '"'];

/// Maps a display name to a filesystem-safe identifier.
///
/// Lower-cases, hyphenates whitespace and path separators, drops the
/// remaining forbidden punctuation, collapses hyphen runs and trims hyphens
/// from both ends. An empty result means the name has no usable identifier.
pub fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.to_lowercase().chars() {
        if HYPHENATED.contains(&ch) || ch.is_whitespace() {
            if !out.ends_with('-') {
                out.push('-');
            }
        } else if DROPPED.contains(&ch) {
            continue;
        } else if ch == '-' {
            if !out.ends_with('-') {
                out.push('-');
            }
        } else {
            out.push(ch);
        }
    }
    out.trim_matches('-').to_string()
}

/// The normalized name when it can name a file: not empty and not made of
/// dots alone, which would alias or escape the parent directory.
pub fn identifier(name: &str) -> Option<String> {
    let normalized = normalize(name);
    if normalized.chars().all(|ch| ch == '.') {
        return None;
    }
    Some(normalized)
}

/// True for characters `normalize` never emits.
pub fn is_forbidden(ch: char) -> bool {
    HYPHENATED.contains(&ch) || DROPPED.contains(&ch) || ch.is_whitespace()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Prize,
    Banner,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prize => "prize",
            Self::Banner => "banner",
        }
    }
}

/// Deterministic output tree. The path of an artifact depends only on its
/// kind, game name and (for prizes) prize name. Names without a usable
/// [`identifier`] have no path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub prizes_root: PathBuf,
    pub banners_root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(prizes_root: impl Into<PathBuf>, banners_root: impl Into<PathBuf>) -> Self {
        Self {
            prizes_root: prizes_root.into(),
            banners_root: banners_root.into(),
        }
    }

    /// `<root>/prizes` and `<root>/games`.
    pub fn under(root: &Path) -> Self {
        Self::new(root.join("prizes"), root.join("games"))
    }

    pub fn prize_path(&self, game_name: &str, prize_name: &str) -> Option<PathBuf> {
        let game = identifier(game_name)?;
        let prize = identifier(prize_name)?;
        Some(self.prizes_root.join(game).join(format!("{prize}.png")))
    }

    pub fn banner_path(&self, game_name: &str) -> Option<PathBuf> {
        let game = identifier(game_name)?;
        Some(self.banners_root.join(format!("{game}-banner.png")))
    }
}
