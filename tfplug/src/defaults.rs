//! Default value providers for attributes
//!
//! Defaults are evaluated during planning when an optional attribute is null
//! in configuration. Attributes with a default are always computed, so the
//! chosen value is recorded in the plan.
//!
//! ```no_run
//! use tfplug::schema::{AttributeBuilder, AttributeType};
//! use tfplug::defaults::{StaticDefault, EnvDefault};
//!
//! let timeout = AttributeBuilder::new("timeout_seconds", AttributeType::Number)
//!     .optional()
//!     .default(StaticDefault::number(30.0))
//!     .build();
//!
//! let url = AttributeBuilder::new("api_url", AttributeType::String)
//!     .optional()
//!     .default(EnvDefault::create("JUMPCLOUD_URL", "https://console.jumpcloud.com"))
//!     .build();
//! ```

use crate::schema::{Default, DefaultRequest, DefaultResponse};
use crate::types::{Dynamic, DynamicValue};
use std::env;

/// StaticDefault provides a fixed default value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Box<dyn Default> {
        Box::new(Self { value })
    }

    pub fn string(value: &str) -> Box<dyn Default> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Box<dyn Default> {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Box<dyn Default> {
        Self::create(Dynamic::Bool(value))
    }

    /// Empty list default, used for collections that should never be null
    pub fn empty_list() -> Box<dyn Default> {
        Self::create(Dynamic::List(Vec::new()))
    }
}

impl Default for StaticDefault {
    fn description(&self) -> String {
        format!("defaults to {:?}", self.value)
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: DynamicValue::new(self.value.clone()),
        }
    }
}

/// EnvDefault reads the default from an environment variable, falling back
/// to a fixed string when the variable is unset or empty
pub struct EnvDefault {
    var: String,
    fallback: Option<String>,
}

impl EnvDefault {
    pub fn create(var: &str, fallback: &str) -> Box<dyn Default> {
        Box::new(Self {
            var: var.to_string(),
            fallback: Some(fallback.to_string()),
        })
    }

    /// Null when the variable is unset
    pub fn optional(var: &str) -> Box<dyn Default> {
        Box::new(Self {
            var: var.to_string(),
            fallback: None,
        })
    }
}

impl Default for EnvDefault {
    fn description(&self) -> String {
        match &self.fallback {
            Some(fallback) => format!("defaults to ${} or \"{}\"", self.var, fallback),
            None => format!("defaults to ${}", self.var),
        }
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        let value = env::var(&self.var)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.fallback.clone());

        DefaultResponse {
            value: DynamicValue::new(Dynamic::from(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributePath;

    fn request() -> DefaultRequest {
        DefaultRequest {
            path: AttributePath::new("attr"),
        }
    }

    #[test]
    fn static_defaults() {
        assert_eq!(
            StaticDefault::string("ops").default_value(request()).value.value,
            Dynamic::from("ops")
        );
        assert_eq!(
            StaticDefault::number(30.0).default_value(request()).value.value,
            Dynamic::Number(30.0)
        );
        assert_eq!(
            StaticDefault::bool(true).default_value(request()).value.value,
            Dynamic::Bool(true)
        );
        assert_eq!(
            StaticDefault::empty_list().default_value(request()).value.value,
            Dynamic::List(vec![])
        );
    }

    #[test]
    fn env_default_reads_variable() {
        env::set_var("TFPLUG_TEST_ENV_DEFAULT_SET", "from-env");
        let default = EnvDefault::create("TFPLUG_TEST_ENV_DEFAULT_SET", "fallback");
        assert_eq!(
            default.default_value(request()).value.value,
            Dynamic::from("from-env")
        );
        env::remove_var("TFPLUG_TEST_ENV_DEFAULT_SET");
    }

    #[test]
    fn env_default_falls_back() {
        let default = EnvDefault::create("TFPLUG_TEST_ENV_DEFAULT_UNSET", "fallback");
        assert_eq!(
            default.default_value(request()).value.value,
            Dynamic::from("fallback")
        );

        let optional = EnvDefault::optional("TFPLUG_TEST_ENV_DEFAULT_UNSET");
        assert!(optional.default_value(request()).value.is_null());
    }
}
