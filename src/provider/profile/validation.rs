use super::config::{ProviderConfig, ProviderType};

/// Validation result for provider configuration.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub provider_type: String,
    pub checks: Vec<(String, bool)>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new(provider_type: String) -> Self {
        Self {
            provider_type,
            checks: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_check(&mut self, description: &str, passed: bool) {
        self.checks.push((description.to_string(), passed));
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn passed_checks(&self) -> usize {
        self.checks.iter().filter(|(_, passed)| *passed).count()
    }
}

/// Where the API key comes from, for display.
pub fn api_key_status(provider: &ProviderConfig) -> String {
    match provider.provider_type.api_key_env_var() {
        Some(var) => {
            if provider.api_key.is_some() {
                "Set (from config)".to_string()
            } else if std::env::var(var).is_ok() {
                "Set (from environment)".to_string()
            } else {
                "Not set".to_string()
            }
        }
        None => "Not required".to_string(),
    }
}

/// Run every provider check without failing fast.
pub fn validate_provider(provider: &ProviderConfig) -> ValidationResult {
    let mut result = ValidationResult::new(provider.provider_type.slug().to_string());

    match provider.validate() {
        Ok(()) => result.add_check("Provider settings are valid", true),
        Err(e) => result.add_error(e),
    }

    match provider.resolved_endpoint() {
        Some(endpoint) => result.add_check(&format!("Endpoint resolved: {}", endpoint), true),
        None => result.add_error("No endpoint configured for local provider".to_string()),
    }

    if provider.provider_type == ProviderType::OpenAI && provider.resolved_api_key().is_none() {
        result.add_error("OpenAI API key not set".to_string());
    } else {
        result.add_check("API key available", true);
    }

    if provider.max_retry_attempts == 0 {
        result.add_warning("max_retry_attempts is 0; treated as a single attempt".to_string());
    }

    result
}
