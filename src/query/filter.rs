//! Filter Stage
//!
//! Applies every active predicate of a [`FilterSpec`] as a logical AND.

use crate::query::item::ApiItem;
use crate::query::spec::FilterSpec;

/// Keeps the indices whose items satisfy `spec`, preserving order.
pub fn filter(items: &[ApiItem], indices: &[usize], spec: &FilterSpec) -> Vec<usize> {
    if !spec.has_predicates() {
        return indices.to_vec();
    }
    let path_contains = spec.path_contains.trim().to_lowercase();

    indices
        .iter()
        .copied()
        .filter(|&index| {
            items
                .get(index)
                .is_some_and(|item| matches(item, spec, &path_contains))
        })
        .collect()
}

/// True when `item` passes every predicate. `path_contains` is the
/// normalized path needle.
pub fn matches(item: &ApiItem, spec: &FilterSpec, path_contains: &str) -> bool {
    if !spec.methods.is_empty() && !spec.methods.contains(&item.method) {
        return false;
    }
    if !spec.tags.is_empty() && !item.tags.iter().any(|tag| spec.tags.contains(tag)) {
        return false;
    }
    if !spec.status_codes.is_empty()
        && !item.status_codes.iter().any(|code| spec.status_codes.contains(code))
    {
        return false;
    }
    if spec.deprecated.is_some_and(|wanted| item.deprecated != wanted) {
        return false;
    }
    if !spec.complexity.is_empty() && !spec.complexity.contains(&item.complexity) {
        return false;
    }
    if !spec.security.is_empty()
        && !item.security.iter().any(|scheme| spec.security.contains(scheme))
    {
        return false;
    }
    if !path_contains.is_empty() && !item.path.to_lowercase().contains(path_contains) {
        return false;
    }
    if spec
        .has_parameters
        .is_some_and(|wanted| item.has_parameters() != wanted)
    {
        return false;
    }
    if spec
        .has_request_body
        .is_some_and(|wanted| item.has_request_body != wanted)
    {
        return false;
    }
    if !spec.response_time.is_empty() && !spec.response_time.contains(&item.response_time) {
        return false;
    }
    true
}
