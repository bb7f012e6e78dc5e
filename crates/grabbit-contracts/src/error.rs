use std::path::PathBuf;

use thiserror::Error;

/// Pre-batch failures. Any of these stops the run before a single
/// generation request is sent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "API key required: set GEMINI_API_KEY or GOOGLE_API_KEY \
         (get a key at https://aistudio.google.com/app/apikey)"
    )]
    MissingCredential,

    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("failed to read input {}: {reason}", path.display())]
    InputUnreadable { path: PathBuf, reason: String },

    #[error("{field} name '{value}' has no characters usable in a file name")]
    InvalidName { field: &'static str, value: String },

    #[error("no games found matching '{0}' (filters are case-insensitive substrings)")]
    NoMatchingGames(String),

    #[error("image model '{name}' is not available (known: {available})")]
    UnknownModel { name: String, available: String },

    #[error("image provider '{name}' is not registered (available: {available})")]
    UnknownProvider { name: String, available: String },

    #[error("reference image {} could not be read: {reason}", path.display())]
    ReferenceUnreadable { path: PathBuf, reason: String },

    #[error("failed to build HTTP client: {0}")]
    InvalidHttpClient(String),
}
