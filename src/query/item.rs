//! Queryable Items
//!
//! Flat operation records produced by the document parser. The pipeline
//! only reads them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::query::schema::Schema;

// == HTTP Method ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            other => Err(format!("unknown HTTP method: {}", other)),
        }
    }
}

// == Complexity ==
/// Operation complexity. Ordering is the sort rank: low < medium < high.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }

    /// Estimates complexity from parameter count and request schema size.
    ///
    /// Score is `parameters + fields + 2 * depth + references`; up to 5 is
    /// low, up to 15 is medium.
    pub fn estimate(parameter_count: usize, schema: Option<&Schema>) -> Self {
        let metrics = schema.map(Schema::metrics).unwrap_or_default();
        let score = parameter_count + metrics.fields + 2 * metrics.depth + metrics.references;
        match score {
            0..=5 => Complexity::Low,
            6..=15 => Complexity::Medium,
            _ => Complexity::High,
        }
    }
}

// == Response Time ==
/// Expected latency bucket. Ordering is the sort rank: fast < medium < slow.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResponseTime {
    #[default]
    Fast,
    Medium,
    Slow,
}

// == Api Item ==
/// One API operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiItem {
    pub id: String,
    pub method: HttpMethod,
    pub path: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub status_codes: Vec<u16>,
    /// Names of the security schemes guarding the operation
    #[serde(default)]
    pub security: Vec<String>,
    #[serde(default)]
    pub parameter_count: usize,
    #[serde(default)]
    pub has_request_body: bool,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub response_time: ResponseTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<Schema>,
}

impl ApiItem {
    pub fn new(id: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method,
            path: path.into(),
            summary: String::new(),
            description: String::new(),
            operation_id: None,
            tags: Vec::new(),
            deprecated: false,
            status_codes: Vec::new(),
            security: Vec::new(),
            parameter_count: 0,
            has_request_body: false,
            complexity: Complexity::Low,
            response_time: ResponseTime::Fast,
            request_schema: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_security<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.security = schemes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.status_codes = codes.into_iter().collect();
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_response_time(mut self, response_time: ResponseTime) -> Self {
        self.response_time = response_time;
        self
    }

    pub fn with_parameters(mut self, count: usize) -> Self {
        self.parameter_count = count;
        self
    }

    /// Attaches a request body schema and re-estimates complexity from it.
    pub fn with_request_schema(mut self, schema: Schema) -> Self {
        self.has_request_body = true;
        self.complexity = Complexity::estimate(self.parameter_count, Some(&schema));
        self.request_schema = Some(schema);
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn has_parameters(&self) -> bool {
        self.parameter_count > 0
    }

    /// First non-empty path segment, e.g. `users` for `/users/{id}`.
    pub fn first_path_segment(&self) -> Option<&str> {
        self.path.split('/').find(|segment| !segment.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::schema::PrimitiveType;

    #[test]
    fn test_item_deserialize_with_defaults() {
        let json = r#"{"id":"op1","method":"GET","path":"/users"}"#;
        let item: ApiItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.method, HttpMethod::Get);
        assert!(item.tags.is_empty());
        assert_eq!(item.complexity, Complexity::Low);
        assert_eq!(item.response_time, ResponseTime::Fast);
        assert!(!item.has_parameters());
    }

    #[test]
    fn test_first_path_segment() {
        let item = ApiItem::new("a", HttpMethod::Get, "/users/{id}/orders");
        assert_eq!(item.first_path_segment(), Some("users"));
        assert_eq!(ApiItem::new("b", HttpMethod::Get, "/").first_path_segment(), None);
    }

    #[test]
    fn test_method_parse_and_display() {
        assert_eq!("delete".parse::<HttpMethod>(), Ok(HttpMethod::Delete));
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert!("FETCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_rank_ordering() {
        assert!(Complexity::Low < Complexity::Medium && Complexity::Medium < Complexity::High);
        assert!(ResponseTime::Fast < ResponseTime::Medium && ResponseTime::Medium < ResponseTime::Slow);
    }

    #[test]
    fn test_complexity_estimate() {
        assert_eq!(Complexity::estimate(2, None), Complexity::Low);

        let body = Schema::object([
            ("name", Schema::primitive(PrimitiveType::String)),
            ("email", Schema::primitive(PrimitiveType::String)),
        ]);
        // 3 params + 2 fields + 2 * depth 2 = 9
        assert_eq!(Complexity::estimate(3, Some(&body)), Complexity::Medium);
        assert_eq!(Complexity::estimate(20, Some(&body)), Complexity::High);
    }

    #[test]
    fn test_with_request_schema_sets_body_flag() {
        let item = ApiItem::new("c", HttpMethod::Post, "/users")
            .with_parameters(3)
            .with_request_schema(Schema::reference("User"));
        assert!(item.has_request_body);
        // 3 params + 2 * depth 1 + 1 reference = 6
        assert_eq!(item.complexity, Complexity::Medium);
    }
}
