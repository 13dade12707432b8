//! Query Specifications
//!
//! Immutable value objects describing the current query. Field-wise equal
//! specs serialize to the same cache key: every set is a `BTreeSet` and
//! free text is trimmed and lowercased before keying.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::query::item::{Complexity, HttpMethod, ResponseTime};

// == Search Field ==
/// Item fields the free-text search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Path,
    Summary,
    Description,
    OperationId,
    Tags,
    Method,
}

impl SearchField {
    /// Fields searched when a spec names none.
    pub fn defaults() -> BTreeSet<SearchField> {
        [
            SearchField::Path,
            SearchField::Summary,
            SearchField::Description,
            SearchField::OperationId,
            SearchField::Tags,
        ]
        .into_iter()
        .collect()
    }
}

// == Filter Spec ==
/// Free-text query plus predicates, combined with logical AND. An empty set
/// or `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub query: String,
    pub search_fields: BTreeSet<SearchField>,
    pub methods: BTreeSet<HttpMethod>,
    pub tags: BTreeSet<String>,
    pub status_codes: BTreeSet<u16>,
    pub deprecated: Option<bool>,
    pub complexity: BTreeSet<Complexity>,
    pub security: BTreeSet<String>,
    pub path_contains: String,
    pub has_parameters: Option<bool>,
    pub has_request_body: Option<bool>,
    pub response_time: BTreeSet<ResponseTime>,
}

impl FilterSpec {
    /// Normalized copy: trimmed lowercase text, explicit search fields.
    pub fn canonical(&self) -> Self {
        let mut spec = self.clone();
        spec.query = normalize_text(&self.query);
        spec.path_contains = normalize_text(&self.path_contains);
        if spec.search_fields.is_empty() {
            spec.search_fields = SearchField::defaults();
        }
        spec
    }

    /// Fields the search stage should consult.
    pub fn effective_search_fields(&self) -> BTreeSet<SearchField> {
        if self.search_fields.is_empty() {
            SearchField::defaults()
        } else {
            self.search_fields.clone()
        }
    }

    /// True when no predicate constrains the result.
    pub fn has_predicates(&self) -> bool {
        !self.methods.is_empty()
            || !self.tags.is_empty()
            || !self.status_codes.is_empty()
            || self.deprecated.is_some()
            || !self.complexity.is_empty()
            || !self.security.is_empty()
            || !self.path_contains.trim().is_empty()
            || self.has_parameters.is_some()
            || self.has_request_body.is_some()
            || !self.response_time.is_empty()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        self.methods = methods.into_iter().collect();
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
}

fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

// == Sort Spec ==
/// Sort key. Unknown names deserialize to [`SortKey::None`], which keeps
/// the search/input order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum SortKey {
    #[default]
    None,
    Path,
    Method,
    Summary,
    Complexity,
    ResponseTime,
}

impl From<String> for SortKey {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "path" => SortKey::Path,
            "method" => SortKey::Method,
            "summary" => SortKey::Summary,
            "complexity" => SortKey::Complexity,
            "response_time" | "responsetime" => SortKey::ResponseTime,
            _ => SortKey::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "ascending")]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSpec {
    pub by: SortKey,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(by: SortKey, order: SortOrder) -> Self {
        Self { by, order }
    }
}

// == Group Spec ==
/// Grouping dimension. Unknown names deserialize to [`GroupBy::None`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum GroupBy {
    #[default]
    None,
    Tag,
    Method,
    /// First path segment
    Path,
    Complexity,
    Security,
}

impl From<String> for GroupBy {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tag" | "tags" => GroupBy::Tag,
            "method" => GroupBy::Method,
            "path" => GroupBy::Path,
            "complexity" => GroupBy::Complexity,
            "security" => GroupBy::Security,
            _ => GroupBy::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSpec {
    pub by: GroupBy,
}

impl GroupSpec {
    pub fn new(by: GroupBy) -> Self {
        Self { by }
    }
}

// == Query Spec ==
/// Full query: search + filter, sort and grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySpec {
    pub filter: FilterSpec,
    pub sort: SortSpec,
    pub group: GroupSpec,
}

impl QuerySpec {
    pub fn new(filter: FilterSpec, sort: SortSpec, group: GroupSpec) -> Self {
        Self {
            filter,
            sort,
            group,
        }
    }

    pub fn canonical(&self) -> Self {
        Self {
            filter: self.filter.canonical(),
            sort: self.sort,
            group: self.group,
        }
    }

    /// Key of the composite search/filter/sort/group result.
    pub fn cache_key(&self) -> String {
        format!("query:{}", canonical_json(&self.canonical()))
    }

    /// Key of the search-stage result.
    pub fn search_key(&self) -> String {
        let filter = self.filter.canonical();
        format!(
            "search:{}",
            canonical_json(&(&filter.query, &filter.search_fields))
        )
    }

    /// Key of the filter-stage result; includes the query it filters.
    pub fn filter_key(&self) -> String {
        format!("filter:{}", canonical_json(&self.filter.canonical()))
    }
}

fn canonical_json<T: Serialize + std::fmt::Debug>(value: &T) -> String {
    // Every spec type serializes to a JSON object with string keys.
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}
