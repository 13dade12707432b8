//! Sort Stage
//!
//! Stable sort by one key. Descending order reverses the comparator, not
//! the output, so equal keys keep their incoming order both ways.

use std::cmp::Ordering;

use crate::query::item::ApiItem;
use crate::query::spec::{SortKey, SortOrder, SortSpec};

/// Sorts `indices` in place according to `spec`.
pub fn sort(items: &[ApiItem], indices: &mut [usize], spec: &SortSpec) {
    if spec.by == SortKey::None {
        return;
    }
    indices.sort_by(|&a, &b| match (items.get(a), items.get(b)) {
        (Some(left), Some(right)) => {
            let ordering = compare(left, right, spec.by);
            match spec.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
        _ => Ordering::Equal,
    });
}

fn compare(a: &ApiItem, b: &ApiItem, key: SortKey) -> Ordering {
    match key {
        SortKey::None => Ordering::Equal,
        SortKey::Path => a.path.cmp(&b.path),
        SortKey::Method => a.method.as_str().cmp(b.method.as_str()),
        SortKey::Summary => a.summary.to_lowercase().cmp(&b.summary.to_lowercase()),
        SortKey::Complexity => a.complexity.cmp(&b.complexity),
        SortKey::ResponseTime => a.response_time.cmp(&b.response_time),
    }
}
