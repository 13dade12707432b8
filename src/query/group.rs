//! Group Stage
//!
//! Partitions the ordered result by one dimension. Groups are keyed by name
//! in a `BTreeMap`; items inside a group keep pipeline order.

use std::collections::BTreeMap;

use crate::query::item::ApiItem;
use crate::query::spec::GroupBy;

pub const ALL_GROUP: &str = "All";
pub const UNTAGGED_GROUP: &str = "Untagged";
pub const ROOT_GROUP: &str = "root";
pub const PUBLIC_GROUP: &str = "Public";

/// Groups `indices` by `by`. An item with N distinct tags lands in N groups
/// under [`GroupBy::Tag`]; every other dimension places it exactly once.
pub fn group(items: &[ApiItem], indices: &[usize], by: GroupBy) -> BTreeMap<String, Vec<usize>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for &index in indices {
        let Some(item) = items.get(index) else {
            continue;
        };
        for name in group_names(item, by) {
            groups.entry(name).or_default().push(index);
        }
    }

    if by == GroupBy::None && groups.is_empty() {
        groups.insert(ALL_GROUP.to_string(), Vec::new());
    }
    groups
}

fn group_names(item: &ApiItem, by: GroupBy) -> Vec<String> {
    match by {
        GroupBy::None => vec![ALL_GROUP.to_string()],
        GroupBy::Tag => distinct_or(&item.tags, UNTAGGED_GROUP),
        GroupBy::Method => vec![item.method.as_str().to_string()],
        GroupBy::Path => vec![item.first_path_segment().unwrap_or(ROOT_GROUP).to_string()],
        GroupBy::Complexity => vec![item.complexity.as_str().to_string()],
        GroupBy::Security => distinct_or(&item.security, PUBLIC_GROUP),
    }
}

fn distinct_or(values: &[String], fallback: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !names.contains(value) {
            names.push(value.clone());
        }
    }
    if names.is_empty() {
        names.push(fallback.to_string());
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::item::{Complexity, HttpMethod};

    fn items() -> Vec<ApiItem> {
        vec![
            ApiItem::new("0", HttpMethod::Get, "/users").with_tags(["users", "admin"]),
            ApiItem::new("1", HttpMethod::Post, "/users/{id}").with_tags(["users"]),
            ApiItem::new("2", HttpMethod::Get, "/")
                .with_security(["apiKey"])
                .with_complexity(Complexity::High),
            ApiItem::new("3", HttpMethod::Get, "/pets").with_tags(["pets", "pets"]),
        ]
    }

    #[test]
    fn test_group_none_is_single_group() {
        let groups = group(&items(), &[3, 1, 0, 2], GroupBy::None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[ALL_GROUP], vec![3, 1, 0, 2]);
    }

    #[test]
    fn test_group_none_on_empty_input() {
        let groups = group(&items(), &[], GroupBy::None);
        assert_eq!(groups[ALL_GROUP], Vec::<usize>::new());
    }

    #[test]
    fn test_group_by_tag_duplicates_multi_tagged() {
        let groups = group(&items(), &[0, 1, 2, 3], GroupBy::Tag);
        assert_eq!(groups["users"], vec![0, 1]);
        assert_eq!(groups["admin"], vec![0]);
        assert_eq!(groups[UNTAGGED_GROUP], vec![2]);
        // Repeated tag counts once
        assert_eq!(groups["pets"], vec![3]);
    }

    #[test]
    fn test_group_by_path_segment() {
        let groups = group(&items(), &[0, 1, 2, 3], GroupBy::Path);
        assert_eq!(groups["users"], vec![0, 1]);
        assert_eq!(groups[ROOT_GROUP], vec![2]);
        assert_eq!(groups["pets"], vec![3]);
    }

    #[test]
    fn test_group_by_method_complexity_security() {
        let groups = group(&items(), &[0, 1, 2, 3], GroupBy::Method);
        assert_eq!(groups["GET"], vec![0, 2, 3]);
        assert_eq!(groups["POST"], vec![1]);

        let groups = group(&items(), &[0, 1, 2, 3], GroupBy::Complexity);
        assert_eq!(groups["low"], vec![0, 1, 3]);
        assert_eq!(groups["high"], vec![2]);

        let groups = group(&items(), &[0, 1, 2, 3], GroupBy::Security);
        assert_eq!(groups["apiKey"], vec![2]);
        assert_eq!(groups[PUBLIC_GROUP], vec![0, 1, 3]);
    }
}
