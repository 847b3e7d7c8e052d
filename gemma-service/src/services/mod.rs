//! Service layer: model hub client and generation providers.

pub mod hub;
pub mod providers;

pub use hub::{initialize_model, initialize_model_with, KaggleHub, ModelHub, GEMMA_PRESET};
