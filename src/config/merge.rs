//! The merge primitive behind all three precedence tiers.
//!
//! `merge` combines N keyed sequences into one ordered, unique sequence:
//! the first occurrence of a key establishes output position, and the last
//! occurrence determines content. Profile precedence, include precedence,
//! and local-override precedence are all this one primitive with different
//! argument order.

use std::collections::HashMap;

/// Types that carry a merge key.
///
/// Rules key by `id` when non-empty, else `name`; sections by `id` else
/// `title`.
pub trait MergeKey {
    /// The key collisions are resolved on.
    fn merge_key(&self) -> &str;
}

/// Merge keyed sequences: last occurrence of a key wins, first-seen order is
/// preserved.
///
/// Sequences are scanned left to right, so callers express precedence purely
/// through argument order — pass the highest-precedence sequence last.
///
/// # Examples
///
/// ```
/// use ai_rulez::config::{Rule, merge};
///
/// let base = vec![Rule { id: None, name: "fmt".into(), priority: 1, content: "old".into() }];
/// let wins = vec![Rule { id: None, name: "fmt".into(), priority: 9, content: "new".into() }];
///
/// let merged = merge([base, wins]);
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged[0].content, "new");
/// ```
pub fn merge<T, I>(sequences: I) -> Vec<T>
where
    T: MergeKey,
    I: IntoIterator<Item = Vec<T>>,
{
    let mut by_key: HashMap<String, T> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for sequence in sequences {
        for item in sequence {
            let key = item.merge_key().to_string();
            if !by_key.contains_key(&key) {
                order.push(key.clone());
            }
            by_key.insert(key, item);
        }
    }

    // Rebuild in first-seen order; map iteration order is never exposed.
    order.into_iter().filter_map(|key| by_key.remove(&key)).collect()
}
