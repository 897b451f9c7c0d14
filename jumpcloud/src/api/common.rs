//! Common types and utilities for the JumpCloud API

use serde::{Deserialize, Serialize};
use std::fmt;

/// JumpCloud error bodies use `message` (v1) or `error`/`message` (v2)
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ApiErrorResponse {
    pub fn text(&self) -> Option<String> {
        match (&self.error, &self.message) {
            (Some(error), Some(message)) if error != message => {
                Some(format!("{}: {}", error, message))
            }
            (_, Some(message)) => Some(message.clone()),
            (Some(error), None) => Some(error.clone()),
            (None, None) => None,
        }
    }
}

pub trait JumpCloudApiResource: Sized {
    fn api_path() -> &'static str;
    fn resource_path(id: &str) -> String {
        format!("{}/{}", Self::api_path(), urlencoding::encode(id))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// v1 endpoints (`/api/...`) and v2 endpoints (`/api/v2/...`) spell
/// filters and field lists differently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterSyntax {
    V1,
    #[default]
    V2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Search,
    In,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Gt => "gt",
            FilterOperator::Ge => "ge",
            FilterOperator::Lt => "lt",
            FilterOperator::Le => "le",
            FilterOperator::Search => "search",
            FilterOperator::In => "in",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_start_matches('$').to_ascii_lowercase().as_str() {
            "eq" => Some(FilterOperator::Eq),
            "ne" => Some(FilterOperator::Ne),
            "gt" => Some(FilterOperator::Gt),
            "ge" => Some(FilterOperator::Ge),
            "lt" => Some(FilterOperator::Lt),
            "le" => Some(FilterOperator::Le),
            "search" => Some(FilterOperator::Search),
            "in" => Some(FilterOperator::In),
            _ => None,
        }
    }

    pub const ALL: [&'static str; 8] = ["eq", "ne", "gt", "ge", "lt", "le", "search", "in"];
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// `field:op:value` for v2, `field:$op:value` for v1
    pub fn render(&self, syntax: FilterSyntax) -> String {
        match syntax {
            FilterSyntax::V1 => format!("{}:${}:{}", self.field, self.operator.as_str(), self.value),
            FilterSyntax::V2 => format!("{}:{}:{}", self.field, self.operator.as_str(), self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortField {
    pub field: String,
    pub descending: bool,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Accepts `name` or `-name`
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        match value.strip_prefix('-') {
            Some("") => None,
            Some(field) => Some(Self::desc(field)),
            None if value.is_empty() => None,
            None => Some(Self::asc(value)),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            write!(f, "{}", self.field)
        }
    }
}

/// Filter, sort and pagination inputs for list endpoints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub filters: Vec<Filter>,
    pub sort: Vec<SortField>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub fields: Vec<String>,
    pub syntax: FilterSyntax,
}

impl ListOptions {
    pub fn new(syntax: FilterSyntax) -> Self {
        Self {
            syntax,
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_sort(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn to_query_params(&self) -> ApiQueryParams {
        let mut params = ApiQueryParams::new();
        for filter in &self.filters {
            params = params.add("filter", filter.render(self.syntax));
        }
        if !self.sort.is_empty() {
            let separator = match self.syntax {
                FilterSyntax::V1 => " ",
                FilterSyntax::V2 => ",",
            };
            let sort = self
                .sort
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(separator);
            params = params.add("sort", sort);
        }
        params = params.add_optional("limit", self.limit);
        params = params.add_optional("skip", self.skip);
        if !self.fields.is_empty() {
            let separator = match self.syntax {
                FilterSyntax::V1 => " ",
                FilterSyntax::V2 => ",",
            };
            params = params.add("fields", self.fields.join(separator));
        }
        params
    }
}

/// v1 list endpoints wrap results in `{results, totalCount}`, v2 list
/// endpoints return a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PagedResponse<T> {
    Envelope {
        results: Vec<T>,
        #[serde(rename = "totalCount", default)]
        total_count: Option<u64>,
    },
    List(Vec<T>),
}

impl<T> PagedResponse<T> {
    pub fn results(&self) -> &[T] {
        match self {
            PagedResponse::Envelope { results, .. } => results,
            PagedResponse::List(results) => results,
        }
    }

    pub fn total_count(&self) -> Option<u64> {
        match self {
            PagedResponse::Envelope { total_count, .. } => *total_count,
            PagedResponse::List(_) => None,
        }
    }

    pub fn into_results(self) -> Vec<T> {
        match self {
            PagedResponse::Envelope { results, .. } => results,
            PagedResponse::List(results) => results,
        }
    }
}

/// JumpCloud v2 references other objects as `{"id": ...}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectRef {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub object_type: Option<String>,
}

/// Some v1 numeric fields are sent and returned as strings
pub mod string_or_u64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrU64 {
            String(String),
            U64(u64),
        }

        match Option::<StringOrU64>::deserialize(deserializer)? {
            Some(StringOrU64::String(s)) if s.trim().is_empty() => Ok(None),
            Some(StringOrU64::String(s)) => s
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(serde::de::Error::custom),
            Some(StringOrU64::U64(u)) => Ok(Some(u)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_params_render_nothing() {
        assert_eq!(ApiQueryParams::new().to_query_string(), "");
        assert_eq!(ListOptions::default().to_query_params().to_query_string(), "");
    }

    #[test]
    fn params_are_joined_and_encoded() {
        let query = ApiQueryParams::new()
            .add("filter", "email:eq:a b@example.com")
            .add("limit", 10)
            .add_optional("skip", None::<u32>)
            .add_optional("sort", Some("-name"))
            .to_query_string();

        assert_eq!(
            query,
            "?filter=email%3Aeq%3Aa%20b%40example.com&limit=10&sort=-name"
        );
    }

    #[test]
    fn filters_render_per_syntax() {
        let filter = Filter::eq("username", "jdoe");
        assert_eq!(filter.render(FilterSyntax::V1), "username:$eq:jdoe");
        assert_eq!(filter.render(FilterSyntax::V2), "username:eq:jdoe");

        let search = Filter::new("hostname", FilterOperator::Search, "web");
        assert_eq!(search.render(FilterSyntax::V2), "hostname:search:web");
    }

    #[test]
    fn operators_parse_with_or_without_dollar() {
        assert_eq!(FilterOperator::parse("$eq"), Some(FilterOperator::Eq));
        assert_eq!(FilterOperator::parse("SEARCH"), Some(FilterOperator::Search));
        assert_eq!(FilterOperator::parse("like"), None);
    }

    #[test]
    fn sort_fields_parse() {
        assert_eq!(SortField::parse("name"), Some(SortField::asc("name")));
        assert_eq!(SortField::parse("-created"), Some(SortField::desc("created")));
        assert_eq!(SortField::parse("-"), None);
        assert_eq!(SortField::parse(""), None);
        assert_eq!(SortField::desc("created").to_string(), "-created");
    }

    #[test]
    fn list_options_cover_every_optional_combination() {
        let filter = Filter::eq("name", "ops");
        let sort = SortField::desc("name");

        for mask in 0..32u8 {
            let mut options = ListOptions::new(FilterSyntax::V2);
            if mask & 1 != 0 {
                options = options.with_filter(filter.clone());
            }
            if mask & 2 != 0 {
                options = options.with_sort(sort.clone());
            }
            if mask & 4 != 0 {
                options = options.with_limit(50);
            }
            if mask & 8 != 0 {
                options = options.with_skip(100);
            }
            if mask & 16 != 0 {
                options = options.with_fields(&["id", "name"]);
            }

            let query = options.to_query_params().to_query_string();
            if mask == 0 {
                assert_eq!(query, "");
                continue;
            }

            assert!(query.starts_with('?'), "{}", query);
            assert!(!query.contains("&&"), "{}", query);
            assert!(!query.ends_with('&'), "{}", query);

            let pairs: Vec<&str> = query[1..].split('&').collect();
            assert_eq!(pairs.len(), mask.count_ones() as usize, "{}", query);
            for pair in &pairs {
                let (key, value) = pair.split_once('=').expect("key=value pair");
                assert!(!key.is_empty());
                assert!(!value.is_empty());
            }

            assert_eq!(query.contains("filter=name%3Aeq%3Aops"), mask & 1 != 0);
            assert_eq!(query.contains("sort=-name"), mask & 2 != 0);
            assert_eq!(query.contains("limit=50"), mask & 4 != 0);
            assert_eq!(query.contains("skip=100"), mask & 8 != 0);
            assert_eq!(query.contains("fields=id%2Cname"), mask & 16 != 0);
        }
    }

    #[test]
    fn v1_fields_are_space_separated() {
        let query = ListOptions::new(FilterSyntax::V1)
            .with_filter(Filter::eq("email", "a@example.com"))
            .with_fields(&["username", "email"])
            .to_query_params()
            .to_query_string();

        assert_eq!(
            query,
            "?filter=email%3A%24eq%3Aa%40example.com&fields=username%20email"
        );
    }

    #[test]
    fn repeated_filters_become_repeated_params() {
        let query = ListOptions::new(FilterSyntax::V2)
            .with_filter(Filter::eq("os", "Ubuntu"))
            .with_filter(Filter::new("active", FilterOperator::Eq, "true"))
            .to_query_params()
            .to_query_string();

        assert_eq!(query.matches("filter=").count(), 2);
    }

    #[test]
    fn paged_response_accepts_envelope_and_array() {
        let envelope: PagedResponse<serde_json::Value> =
            serde_json::from_str(r#"{"totalCount":3,"results":[{"_id":"a"}]}"#).unwrap();
        assert_eq!(envelope.total_count(), Some(3));
        assert_eq!(envelope.results().len(), 1);

        let list: PagedResponse<serde_json::Value> =
            serde_json::from_str(r#"[{"id":"a"},{"id":"b"}]"#).unwrap();
        assert_eq!(list.total_count(), None);
        assert_eq!(list.into_results().len(), 2);
    }

    #[test]
    fn error_body_text_prefers_message() {
        let body: ApiErrorResponse =
            serde_json::from_str(r#"{"message":"User not found"}"#).unwrap();
        assert_eq!(body.text().as_deref(), Some("User not found"));

        let body: ApiErrorResponse =
            serde_json::from_str(r#"{"error":"Conflict","message":"name taken"}"#).unwrap();
        assert_eq!(body.text().as_deref(), Some("Conflict: name taken"));
    }

    #[test]
    fn string_or_u64_accepts_both_forms() {
        #[derive(Deserialize, Serialize)]
        struct Holder {
            #[serde(with = "string_or_u64", default)]
            timeout: Option<u64>,
        }

        let h: Holder = serde_json::from_str(r#"{"timeout":"120"}"#).unwrap();
        assert_eq!(h.timeout, Some(120));
        let h: Holder = serde_json::from_str(r#"{"timeout":30}"#).unwrap();
        assert_eq!(h.timeout, Some(30));
        let h: Holder = serde_json::from_str(r#"{"timeout":""}"#).unwrap();
        assert_eq!(h.timeout, None);
        assert_eq!(
            serde_json::to_string(&Holder { timeout: Some(5) }).unwrap(),
            r#"{"timeout":"5"}"#
        );
    }
}
