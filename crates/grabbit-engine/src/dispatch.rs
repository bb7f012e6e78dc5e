use grabbit_contracts::models::{
    select_model, GenerationMode, ModelRegistry, ModelSpec, IMAGE_SIZE,
};
use grabbit_contracts::ConfigError;
use tracing::{debug, warn};

use crate::{
    ImageBuffer, ImageProvider, Modality, ProviderRequest, ProviderTool, ReferenceImage,
    ResponsePart,
};

/// One unit of work as handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt_text: String,
    pub reference_assets: Vec<ReferenceImage>,
    pub mode: GenerationMode,
    pub aspect_ratio: String,
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Image(ImageBuffer),
    /// The provider answered but returned no image part. Not a fault.
    Absent,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub model: String,
    pub commentary: Vec<String>,
    pub warnings: Vec<String>,
    pub outcome: DispatchOutcome,
}

pub struct Dispatcher {
    provider: Box<dyn ImageProvider>,
    fast_model: ModelSpec,
    grounded_model: Option<ModelSpec>,
    registry_names: Vec<String>,
}

impl Dispatcher {
    /// Resolves the fast model (honouring `model_override`) up front. The
    /// grounded model is resolved too but only required on first use; call
    /// [`Dispatcher::require`] before a batch to fail early.
    pub fn new(
        provider: Box<dyn ImageProvider>,
        models: &ModelRegistry,
        model_override: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let fast_model = select_model(models, provider.name(), GenerationMode::Fast, model_override)?;
        let grounded_model =
            select_model(models, provider.name(), GenerationMode::Grounded, None).ok();
        Ok(Self {
            provider,
            fast_model,
            grounded_model,
            registry_names: models.names(),
        })
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn require(&self, mode: GenerationMode) -> Result<&ModelSpec, ConfigError> {
        match mode {
            GenerationMode::Fast => Ok(&self.fast_model),
            GenerationMode::Grounded => {
                self.grounded_model
                    .as_ref()
                    .ok_or_else(|| ConfigError::UnknownModel {
                        name: format!("<grounded model for provider '{}'>", self.provider.name()),
                        available: self.registry_names.join(", "),
                    })
            }
        }
    }

    /// Maps a generation request onto the provider wire request for `model`.
    pub fn provider_request(
        &self,
        model: &ModelSpec,
        request: &GenerationRequest,
        warnings: &mut Vec<String>,
    ) -> ProviderRequest {
        let (response_modalities, tools) = match request.mode {
            GenerationMode::Grounded => (
                vec![Modality::Text, Modality::Image],
                vec![ProviderTool::SearchGrounding],
            ),
            GenerationMode::Fast => (vec![Modality::Image], Vec::new()),
        };

        let image_size = match request.resolution.as_ref() {
            Some(size) if model.supports(IMAGE_SIZE) => Some(size.clone()),
            Some(size) => {
                let message = format!(
                    "resolution {size} ignored: model {} does not accept an image size",
                    model.name
                );
                warn!("{message}");
                warnings.push(message);
                None
            }
            None => None,
        };

        ProviderRequest {
            model: model.name.clone(),
            prompt: request.prompt_text.clone(),
            references: request.reference_assets.clone(),
            response_modalities,
            aspect_ratio: request.aspect_ratio.clone(),
            image_size,
            tools,
        }
    }

    /// Sends one request. Provider faults come back as
    /// `DispatchOutcome::Error`; this never fails.
    pub fn dispatch(&self, request: &GenerationRequest) -> DispatchReport {
        let mut warnings = Vec::new();
        let model = match self.require(request.mode) {
            Ok(model) => model,
            Err(err) => {
                return DispatchReport {
                    model: String::new(),
                    commentary: Vec::new(),
                    warnings,
                    outcome: DispatchOutcome::Error(err.to_string()),
                }
            }
        };
        let provider_request = self.provider_request(model, request, &mut warnings);

        let response = match self.provider.generate(&provider_request) {
            Ok(response) => response,
            Err(err) => {
                warn!(model = %model.name, error = %err, "generation request failed");
                return DispatchReport {
                    model: model.name.clone(),
                    commentary: Vec::new(),
                    warnings,
                    outcome: DispatchOutcome::Error(err.to_string()),
                };
            }
        };

        for warning in &response.warnings {
            warn!(model = %model.name, "{warning}");
        }
        warnings.extend(response.warnings);

        let mut commentary = Vec::new();
        let mut image = None;
        for part in response.parts {
            match part {
                ResponsePart::Text(text) => {
                    debug!(model = %model.name, commentary = %text, "model commentary");
                    commentary.push(text);
                }
                ResponsePart::Image(buffer) => {
                    if image.is_none() {
                        image = Some(buffer);
                    }
                }
            }
        }

        DispatchReport {
            model: model.name.clone(),
            commentary,
            warnings,
            outcome: image.map_or(DispatchOutcome::Absent, DispatchOutcome::Image),
        }
    }
}
