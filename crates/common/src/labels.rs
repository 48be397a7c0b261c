use std::collections::HashMap;

/// True iff every `(key, value)` pair of `selector` is present in `labels`
/// with an equal value. An empty selector matches everything.
pub fn match_labels(labels: &HashMap<String, String>, selector: &HashMap<String, String>) -> bool {
    selector
        .iter()
        .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
}

/// Deduplicates while keeping the first occurrence's position. Sink targets
/// come from a rendered template split on a delimiter, so repeats are common.
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}
