//! Data model and pure building blocks for batch prize and banner image
//! generation: catalog parsing, naming, palettes, prompts, model selection,
//! batch statistics and the run event log.

pub mod catalog;
pub mod error;
pub mod events;
pub mod models;
pub mod naming;
pub mod palettes;
pub mod prompts;
pub mod runs;

pub use error::ConfigError;
