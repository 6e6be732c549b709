//! Provider profile: config shape and validation.

pub mod config;
pub mod validation;

pub use config::{ProviderConfig, ProviderType};
pub use validation::{api_key_status, validate_provider, ValidationResult};
