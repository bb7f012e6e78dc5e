use super::registry::{ModelRegistry, ModelSpec, GROUNDING, IMAGE};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Fast,
    Grounded,
}

impl GenerationMode {
    pub fn from_grounding(grounding: bool) -> Self {
        if grounding {
            Self::Grounded
        } else {
            Self::Fast
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Grounded => "grounded",
        }
    }
}

/// Picks the model for a request.
///
/// Grounded requests always get the provider's first grounding-capable model
/// and ignore `requested`. Fast requests honour `requested` when it names an
/// image model of the same provider, otherwise they get the provider's
/// first image model.
pub fn select_model(
    registry: &ModelRegistry,
    provider: &str,
    mode: GenerationMode,
    requested: Option<&str>,
) -> Result<ModelSpec, ConfigError> {
    let capability = match mode {
        GenerationMode::Grounded => GROUNDING,
        GenerationMode::Fast => {
            if let Some(name) = requested {
                return registry
                    .ensure(name, IMAGE)
                    .filter(|model| model.provider == provider)
                    .ok_or_else(|| ConfigError::UnknownModel {
                        name: name.to_string(),
                        available: registry.names().join(", "),
                    });
            }
            IMAGE
        }
    };

    registry
        .by_capability(provider, capability)
        .into_iter()
        .next()
        .ok_or_else(|| ConfigError::UnknownModel {
            name: format!("<{} model for provider '{provider}'>", mode.as_str()),
            available: registry.names().join(", "),
        })
}
