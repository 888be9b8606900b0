//! Configuration validation

use crate::schema::{RawConfig, RawResource};
use nop_api::ConditionStatus;
use nop_util::{parse_duration_text, DurationParseError};
use std::collections::HashSet;
use thiserror::Error;

/// Kubernetes object names are DNS subdomains
const MAX_NAME_LEN: usize = 253;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Resource '{name}': {message}")]
    ResourceError { name: String, message: String },

    #[error("Duplicate resource name: {0}")]
    DuplicateResourceName(String),

    #[error("Resource '{name}' rule {index}: {message}")]
    RuleError {
        name: String,
        index: usize,
        message: String,
    },

    #[error("Invalid poll interval '{value}': {message}")]
    InvalidPollInterval { value: String, message: String },
}

/// Problems that do not fail validation but change runtime behavior
#[derive(Debug, Clone, Error)]
pub enum ConfigWarning {
    #[error(
        "Resource '{name}' rule {index}: threshold '{value}' is not a valid duration ({error}); \
         it will be treated as 0s and apply immediately"
    )]
    DegradedThreshold {
        name: String,
        index: usize,
        value: String,
        error: DurationParseError,
    },

    #[error("Resource '{name}' declares no condition rules")]
    NoRules { name: String },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(value) = &config.daemon.poll_interval {
        match parse_duration_text(value) {
            Ok(d) if d.is_zero() => errors.push(ValidationError::InvalidPollInterval {
                value: value.clone(),
                message: "must be greater than zero".into(),
            }),
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::InvalidPollInterval {
                value: value.clone(),
                message: e.to_string(),
            }),
        }
    }

    // Check for duplicate resource names
    let mut seen = HashSet::new();
    for resource in &config.resources {
        if !seen.insert(&resource.name) {
            errors.push(ValidationError::DuplicateResourceName(resource.name.clone()));
        }
    }

    for resource in &config.resources {
        errors.extend(validate_resource(resource));
    }

    errors
}

fn validate_resource(resource: &RawResource) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Err(message) = validate_name(&resource.name) {
        errors.push(ValidationError::ResourceError {
            name: resource.name.clone(),
            message,
        });
    }

    if let Some(external_name) = &resource.external_name
        && external_name.is_empty()
    {
        errors.push(ValidationError::ResourceError {
            name: resource.name.clone(),
            message: "external_name cannot be empty".into(),
        });
    }

    for (index, rule) in resource.condition_after.iter().enumerate() {
        if rule.condition_type.is_empty() {
            errors.push(ValidationError::RuleError {
                name: resource.name.clone(),
                index,
                message: "condition_type cannot be empty".into(),
            });
        }

        if let Err(e) = rule.condition_status.parse::<ConditionStatus>() {
            errors.push(ValidationError::RuleError {
                name: resource.name.clone(),
                index,
                message: e.to_string(),
            });
        }
        // Malformed thresholds are not errors, see config_warnings
    }

    errors
}

/// Collect non-fatal warnings for a raw configuration
pub fn config_warnings(config: &RawConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    for resource in &config.resources {
        if resource.condition_after.is_empty() {
            warnings.push(ConfigWarning::NoRules {
                name: resource.name.clone(),
            });
        }

        for (index, rule) in resource.condition_after.iter().enumerate() {
            if let Err(error) = parse_duration_text(&rule.time) {
                warnings.push(ConfigWarning::DegradedThreshold {
                    name: resource.name.clone(),
                    index,
                    value: rule.time.clone(),
                    error,
                });
            }
        }
    }

    warnings
}

/// Check a resource name: lowercase alphanumerics, '-' and '.',
/// starting and ending with an alphanumeric
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".into());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!("name must be at most {} characters", MAX_NAME_LEN));
    }

    let valid_char = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.';
    if let Some(bad) = name.chars().find(|c| !valid_char(*c)) {
        return Err(format!("name contains invalid character '{}'", bad));
    }

    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let starts_ok = name.chars().next().is_some_and(alnum);
    let ends_ok = name.chars().last().is_some_and(alnum);
    if !starts_ok || !ends_ok {
        return Err("name must start and end with a lowercase letter or digit".into());
    }

    Ok(())
}
