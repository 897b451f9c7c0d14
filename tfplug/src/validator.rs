//! Built-in attribute validators
//!
//! Validators receive the configuration value of a single attribute. The
//! framework only calls them for known, non-null values, but each validator
//! still ignores values of a type it does not handle.

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{Diagnostic, Dynamic};

fn invalid(request: &ValidatorRequest, detail: String) -> ValidatorResponse {
    ValidatorResponse {
        diagnostics: vec![Diagnostic::error(
            format!("Invalid value for {}", request.path),
            detail,
        )
        .with_attribute(request.path.clone())],
    }
}

fn ok() -> ValidatorResponse {
    ValidatorResponse {
        diagnostics: vec![],
    }
}

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl StringLengthValidator {
    pub fn between(min: usize, max: usize) -> Box<dyn Validator> {
        Box::new(Self {
            min: Some(min),
            max: Some(max),
        })
    }

    pub fn at_least(min: usize) -> Box<dyn Validator> {
        Box::new(Self {
            min: Some(min),
            max: None,
        })
    }
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("string length must be between {} and {}", min, max),
            (Some(min), None) => format!("string length must be at least {}", min),
            (None, Some(max)) => format!("string length must be at most {}", max),
            (None, None) => "any string length".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(s) = request.config_value.value.as_str() else {
            return ok();
        };
        let len = s.chars().count();
        let too_short = self.min.is_some_and(|min| len < min);
        let too_long = self.max.is_some_and(|max| len > max);

        if too_short || too_long {
            return invalid(
                &request,
                format!("{}, got length {}", self.description(), len),
            );
        }
        ok()
    }
}

pub struct StringPatternValidator {
    pattern: Result<regex::Regex, String>,
    description: String,
}

impl StringPatternValidator {
    /// An invalid pattern is reported as a diagnostic when the validator runs
    pub fn create(pattern: &str, description: &str) -> Box<dyn Validator> {
        Box::new(Self {
            pattern: regex::Regex::new(pattern).map_err(|e| e.to_string()),
            description: description.to_string(),
        })
    }
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        format!("value must match {}", self.description)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(s) = request.config_value.value.as_str() else {
            return ok();
        };

        match &self.pattern {
            Ok(re) if re.is_match(s) => ok(),
            Ok(_) => invalid(
                &request,
                format!("Value '{}' does not match {}", s, self.description),
            ),
            Err(e) => invalid(&request, format!("Validator pattern is invalid: {}", e)),
        }
    }
}

/// Restricts a string to a fixed set of values
pub struct OneOfValidator {
    pub allowed: Vec<String>,
}

impl OneOfValidator {
    pub fn create(allowed: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl Validator for OneOfValidator {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.allowed.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        match request.config_value.value.as_str() {
            Some(s) if !self.allowed.iter().any(|a| a == s) => invalid(
                &request,
                format!("Got '{}', {}", s, self.description()),
            ),
            _ => ok(),
        }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRangeValidator {
    pub fn between(min: f64, max: f64) -> Box<dyn Validator> {
        Box::new(Self {
            min: Some(min),
            max: Some(max),
        })
    }

    pub fn at_least(min: f64) -> Box<dyn Validator> {
        Box::new(Self {
            min: Some(min),
            max: None,
        })
    }
}

impl Validator for NumberRangeValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("value must be between {} and {}", min, max),
            (Some(min), None) => format!("value must be at least {}", min),
            (None, Some(max)) => format!("value must be at most {}", max),
            (None, None) => "any number".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(n) = request.config_value.value.as_number() else {
            return ok();
        };
        if self.min.is_some_and(|min| n < min) || self.max.is_some_and(|max| n > max) {
            return invalid(&request, format!("{}, got {}", self.description(), n));
        }
        ok()
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl ListLengthValidator {
    pub fn at_least(min: usize) -> Box<dyn Validator> {
        Box::new(Self {
            min: Some(min),
            max: None,
        })
    }
}

impl Validator for ListLengthValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("list must have between {} and {} items", min, max),
            (Some(min), None) => format!("list must have at least {} items", min),
            (None, Some(max)) => format!("list must have at most {} items", max),
            (None, None) => "any number of items".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Dynamic::List(items) = &request.config_value.value else {
            return ok();
        };
        let len = items.len();
        if self.min.is_some_and(|min| len < min) || self.max.is_some_and(|max| len > max) {
            return invalid(&request, format!("{}, got {} items", self.description(), len));
        }
        ok()
    }
}

/// Requires a string holding a JSON document, optionally an object
pub struct JsonStringValidator {
    pub require_object: bool,
}

impl JsonStringValidator {
    pub fn create() -> Box<dyn Validator> {
        Box::new(Self {
            require_object: false,
        })
    }

    pub fn object() -> Box<dyn Validator> {
        Box::new(Self {
            require_object: true,
        })
    }
}

impl Validator for JsonStringValidator {
    fn description(&self) -> String {
        if self.require_object {
            "value must be a JSON object".to_string()
        } else {
            "value must be valid JSON".to_string()
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(s) = request.config_value.value.as_str() else {
            return ok();
        };
        match serde_json::from_str::<serde_json::Value>(s) {
            Ok(v) if self.require_object && !v.is_object() => {
                invalid(&request, self.description())
            }
            Ok(_) => ok(),
            Err(e) => invalid(&request, format!("{}: {}", self.description(), e)),
        }
    }
}

/// Requires an RFC 3339 timestamp such as `2025-01-31T00:00:00Z`
pub struct Rfc3339Validator;

impl Rfc3339Validator {
    pub fn create() -> Box<dyn Validator> {
        Box::new(Self)
    }
}

impl Validator for Rfc3339Validator {
    fn description(&self) -> String {
        "value must be an RFC 3339 timestamp".to_string()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(s) = request.config_value.value.as_str() else {
            return ok();
        };
        match chrono::DateTime::parse_from_rfc3339(s) {
            Ok(_) => ok(),
            Err(e) => invalid(&request, format!("{}: {}", self.description(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributePath, DynamicValue};

    fn run(validator: &dyn Validator, value: Dynamic) -> ValidatorResponse {
        validator.validate(ValidatorRequest {
            config_value: DynamicValue::new(value),
            path: AttributePath::new("attr"),
        })
    }

    #[test]
    fn string_length_validator_accepts_valid_length() {
        let validator = StringLengthValidator::between(3, 10);
        assert!(run(validator.as_ref(), Dynamic::from("hello")).diagnostics.is_empty());
    }

    #[test]
    fn string_length_validator_rejects_short_and_long_strings() {
        let validator = StringLengthValidator::between(3, 5);
        let short = run(validator.as_ref(), Dynamic::from("hi"));
        assert_eq!(short.diagnostics.len(), 1);
        assert!(short.diagnostics[0].detail.contains("got length 2"));

        let long = run(validator.as_ref(), Dynamic::from("toolong"));
        assert_eq!(long.diagnostics.len(), 1);
    }

    #[test]
    fn validators_ignore_other_types() {
        let validator = StringLengthValidator::at_least(3);
        assert!(run(validator.as_ref(), Dynamic::Number(1.0)).diagnostics.is_empty());
        assert!(run(validator.as_ref(), Dynamic::Null).diagnostics.is_empty());
    }

    #[test]
    fn string_pattern_validator() {
        let validator = StringPatternValidator::create(r"^[a-z][a-z0-9._-]*$", "a lowercase username");
        assert!(run(validator.as_ref(), Dynamic::from("jdoe")).diagnostics.is_empty());

        let response = run(validator.as_ref(), Dynamic::from("John Doe"));
        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].detail.contains("lowercase username"));
    }

    #[test]
    fn invalid_pattern_surfaces_as_diagnostic() {
        let validator = StringPatternValidator::create("(", "broken");
        let response = run(validator.as_ref(), Dynamic::from("x"));
        assert!(response.diagnostics[0].detail.contains("pattern is invalid"));
    }

    #[test]
    fn one_of_validator_rejects_unlisted_values() {
        let validator = OneOfValidator::create(&["low", "medium", "high", "critical"]);
        assert!(run(validator.as_ref(), Dynamic::from("high")).diagnostics.is_empty());

        let response = run(validator.as_ref(), Dynamic::from("urgent"));
        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].detail.contains("low, medium, high, critical"));
        assert_eq!(
            response.diagnostics[0].attribute,
            Some(AttributePath::new("attr"))
        );
    }

    #[test]
    fn number_range_validator() {
        let validator = NumberRangeValidator::between(1.0, 100.0);
        assert!(run(validator.as_ref(), Dynamic::Number(50.0)).diagnostics.is_empty());
        assert_eq!(run(validator.as_ref(), Dynamic::Number(0.0)).diagnostics.len(), 1);
        assert_eq!(run(validator.as_ref(), Dynamic::Number(101.0)).diagnostics.len(), 1);
    }

    #[test]
    fn list_length_validator() {
        let validator = ListLengthValidator::at_least(1);
        assert_eq!(run(validator.as_ref(), Dynamic::List(vec![])).diagnostics.len(), 1);
        assert!(run(validator.as_ref(), Dynamic::List(vec![Dynamic::from("a")]))
            .diagnostics
            .is_empty());
    }

    #[test]
    fn json_string_validator() {
        let validator = JsonStringValidator::object();
        assert!(run(validator.as_ref(), Dynamic::from(r#"{"a":1}"#)).diagnostics.is_empty());
        assert_eq!(run(validator.as_ref(), Dynamic::from("[1,2]")).diagnostics.len(), 1);
        assert_eq!(run(validator.as_ref(), Dynamic::from("{nope")).diagnostics.len(), 1);

        let any = JsonStringValidator::create();
        assert!(run(any.as_ref(), Dynamic::from("[1,2]")).diagnostics.is_empty());
    }

    #[test]
    fn rfc3339_validator() {
        let validator = Rfc3339Validator::create();
        assert!(run(validator.as_ref(), Dynamic::from("2025-06-01T12:00:00Z"))
            .diagnostics
            .is_empty());
        assert_eq!(
            run(validator.as_ref(), Dynamic::from("June 1st")).diagnostics.len(),
            1
        );
    }
}
