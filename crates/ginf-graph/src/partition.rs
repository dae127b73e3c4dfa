//! Partition canonicalization helpers.

use std::collections::{BTreeMap, BTreeSet};

use ginf_core::errors::{ErrorInfo, GinfError};
use ginf_core::{Labels, NestedLabels};

/// Number of distinct labels in use.
pub fn block_count(labels: &[usize]) -> usize {
    labels.iter().collect::<BTreeSet<_>>().len()
}

/// Compacts label values onto `0..B` while preserving their relative order.
///
/// `[2, 0, 2, 5]` becomes `[1, 0, 1, 2]`. This is the reduced form produced by
/// partition enumeration.
pub fn reduce_partition(labels: &[usize]) -> Labels {
    let ranks: BTreeMap<usize, usize> = labels
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .enumerate()
        .map(|(rank, label)| (label, rank))
        .collect();
    labels.iter().map(|label| ranks[label]).collect()
}

/// Relabels blocks in order of first appearance.
///
/// Two label vectors describe the same partition exactly when their canonical
/// forms are equal.
pub fn canonical_partition(labels: &[usize]) -> Labels {
    let mut mapping = BTreeMap::new();
    labels
        .iter()
        .map(|label| {
            let next = mapping.len();
            *mapping.entry(*label).or_insert(next)
        })
        .collect()
}

/// Canonicalizes a label hierarchy level by level.
///
/// Level `l + 1` assigns a block to every block of level `l`. Each level is
/// relabeled by first appearance, and the next level is re-indexed to follow
/// the new block ids. The hierarchy is truncated after the first level holding
/// a single entry.
pub fn reduce_nested_partition(levels: &[Labels]) -> Result<NestedLabels, GinfError> {
    let mut reduced: NestedLabels = Vec::with_capacity(levels.len());
    // Original block id of level l, indexed by its canonical id.
    let mut originals: Vec<usize> = Vec::new();
    for (depth, level) in levels.iter().enumerate() {
        let ordered: Vec<usize> = if depth == 0 {
            level.clone()
        } else {
            originals
                .iter()
                .map(|&block| {
                    level.get(block).copied().ok_or_else(|| {
                        GinfError::Labels(
                            ErrorInfo::new("nested-level-too-short", "label level misses a block")
                                .with_context("level", depth.to_string())
                                .with_context("block", block.to_string()),
                        )
                    })
                })
                .collect::<Result<_, _>>()?
        };
        let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
        originals.clear();
        let mut canonical = Vec::with_capacity(ordered.len());
        for label in ordered {
            let next = mapping.len();
            let id = *mapping.entry(label).or_insert_with(|| {
                originals.push(label);
                next
            });
            canonical.push(id);
        }
        let single_entry = canonical.len() == 1;
        reduced.push(canonical);
        if single_entry {
            break;
        }
    }
    Ok(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_preserves_order() {
        assert_eq!(reduce_partition(&[2, 0, 2, 5]), vec![1, 0, 1, 2]);
        assert_eq!(reduce_partition(&[1, 0]), vec![1, 0]);
    }

    #[test]
    fn canonical_uses_first_appearance() {
        assert_eq!(canonical_partition(&[2, 0, 2, 5]), vec![0, 1, 0, 2]);
        assert_eq!(canonical_partition(&[1, 0]), canonical_partition(&[0, 1]));
    }

    #[test]
    fn nested_reduction_follows_parent_relabeling() {
        // Level 0 uses blocks {3, 1}; level 1 maps block 1 -> 0 and block 3 -> 1.
        let levels = vec![vec![3, 3, 1], vec![0, 0, 0, 1], vec![0, 0]];
        let reduced = reduce_nested_partition(&levels).unwrap();
        assert_eq!(reduced[0], vec![0, 0, 1]);
        // canonical block 0 is original 3 -> 1, canonical block 1 is original 1 -> 0
        assert_eq!(reduced[1], vec![0, 1]);
        assert_eq!(reduced[2], vec![0, 0]);
    }

    #[test]
    fn nested_reduction_rejects_short_levels() {
        let levels = vec![vec![0, 4], vec![0]];
        let err = reduce_nested_partition(&levels).unwrap_err();
        assert_eq!(err.info().code, "nested-level-too-short");
    }
}
