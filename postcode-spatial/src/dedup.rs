//! Deduplication of query results.
//!
//! A record can be reached along more than one path (several index cells,
//! the oversized list, the membership relation). Results keep the first
//! occurrence of each key so their order stays stable for identical input.

use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Deduplicate by key, keeping the first occurrence.
pub fn dedup_keep_first<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen: FxHashSet<K> = FxHashSet::default();
    let mut result = Vec::new();

    for item in items {
        if seen.insert(key(&item)) {
            result.push(item);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keep_first() {
        let items = vec![(1, "a"), (2, "b"), (1, "c"), (3, "d"), (2, "e")];

        let result = dedup_keep_first(items, |(id, _)| *id);

        assert_eq!(result, vec![(1, "a"), (2, "b"), (3, "d")]);
    }

    #[test]
    fn test_dedup_empty() {
        let result = dedup_keep_first(Vec::<u32>::new(), |v| *v);
        assert!(result.is_empty());
    }
}
