mod registry;
mod selectors;

pub use registry::{ModelRegistry, ModelSpec, GROUNDING, IMAGE, IMAGE_SIZE};
pub use selectors::{select_model, GenerationMode};
