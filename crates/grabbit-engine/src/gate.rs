use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistingPolicy {
    #[default]
    SkipExisting,
    Regenerate,
}

impl ExistingPolicy {
    pub fn from_regenerate(regenerate: bool) -> Self {
        if regenerate {
            Self::Regenerate
        } else {
            Self::SkipExisting
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SkipExisting => "skip_existing",
            Self::Regenerate => "regenerate",
        }
    }
}

/// Presence of the file is the only signal; its content is never inspected.
pub fn should_generate(output_path: &Path, policy: ExistingPolicy) -> bool {
    match policy {
        ExistingPolicy::Regenerate => true,
        ExistingPolicy::SkipExisting => !output_path.exists(),
    }
}
