//! Batch orchestration for prize and banner image generation: the image
//! provider seam and its implementations, the dispatcher, the idempotency
//! gate and the batch runner.

pub mod batch;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod gemini;
pub mod placeholder;
pub mod references;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use grabbit_contracts::ConfigError;

pub use batch::{BatchRunner, GeneratorConfig, ItemReport, KindSelection};
pub use dispatch::{DispatchOutcome, DispatchReport, Dispatcher, GenerationRequest};
pub use error::{BatchError, GenerationError};
pub use gate::{should_generate, ExistingPolicy};
pub use gemini::GeminiProvider;
pub use placeholder::PlaceholderProvider;
pub use references::{load_references, ReferenceImage, ReferenceSet, StyleReference};

pub const PROVIDER_NAMES: &[&str] = &["gemini", "placeholder"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderTool {
    SearchGrounding,
}

/// Exactly what is sent to the external capability for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub model: String,
    pub prompt: String,
    pub references: Vec<ReferenceImage>,
    pub response_modalities: Vec<Modality>,
    pub aspect_ratio: String,
    pub image_size: Option<String>,
    pub tools: Vec<ProviderTool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    Image(ImageBuffer),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderResponse {
    pub parts: Vec<ResponsePart>,
    pub warnings: Vec<String>,
}

pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, GenerationError>;
}

/// Builds the named provider. Only `gemini` needs a credential, and its
/// absence is reported here, before any batch work.
pub fn provider_by_name(
    name: &str,
    timeout: Duration,
) -> Result<Box<dyn ImageProvider>, ConfigError> {
    match name {
        "gemini" => Ok(Box::new(GeminiProvider::from_env(timeout)?)),
        "placeholder" => Ok(Box::new(PlaceholderProvider)),
        other => Err(ConfigError::UnknownProvider {
            name: other.to_string(),
            available: PROVIDER_NAMES.join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use grabbit_contracts::ConfigError;

    use super::{provider_by_name, PROVIDER_NAMES};

    #[test]
    fn placeholder_provider_needs_no_credential() -> anyhow::Result<()> {
        let provider = provider_by_name("placeholder", Duration::from_secs(5))?;
        assert_eq!(provider.name(), "placeholder");
        Ok(())
    }

    #[test]
    fn unknown_provider_lists_available_names() {
        let err = provider_by_name("dall-e", Duration::from_secs(5)).err();
        match err {
            Some(ConfigError::UnknownProvider { name, available }) => {
                assert_eq!(name, "dall-e");
                for known in PROVIDER_NAMES {
                    assert!(available.contains(known));
                }
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
