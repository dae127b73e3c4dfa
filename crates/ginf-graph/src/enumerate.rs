use std::collections::HashSet;

use ginf_core::{all_pairs, Edge, Labels};

use crate::multigraph::Multigraph;
use crate::partition::{block_count, reduce_partition};

/// Iterator over every graph with a fixed vertex count and edge count.
///
/// With parallel edges allowed, graphs are multisets of `edge_count` pairs;
/// otherwise they are sets. Self-loop pairs are admissible only when requested.
#[derive(Debug, Clone)]
pub struct GraphEnumerator {
    size: usize,
    pairs: Vec<Edge>,
    slots: Vec<usize>,
    parallel_edges: bool,
    done: bool,
}

/// Enumerates every admissible graph of `size` vertices and `edge_count` edges.
pub fn enumerate_all_graphs(
    size: usize,
    edge_count: usize,
    self_loops: bool,
    parallel_edges: bool,
) -> GraphEnumerator {
    let pairs: Vec<Edge> = all_pairs(size)
        .filter(|edge| self_loops || !edge.is_self_loop())
        .collect();
    let done = if parallel_edges {
        edge_count > 0 && pairs.is_empty()
    } else {
        edge_count > pairs.len()
    };
    let slots = if parallel_edges {
        vec![0; edge_count]
    } else {
        (0..edge_count).collect()
    };
    GraphEnumerator {
        size,
        pairs,
        slots,
        parallel_edges,
        done,
    }
}

impl GraphEnumerator {
    fn current(&self) -> Multigraph {
        let mut graph = Multigraph::new(self.size);
        for &slot in &self.slots {
            graph.bump(self.pairs[slot], 1);
        }
        graph
    }

    fn advance(&mut self) {
        let pair_count = self.pairs.len();
        let len = self.slots.len();
        // Rightmost slot that can still move.
        let pivot = (0..len).rev().find(|&idx| {
            if self.parallel_edges {
                self.slots[idx] + 1 < pair_count
            } else {
                self.slots[idx] + len - idx < pair_count
            }
        });
        let Some(pivot) = pivot else {
            self.done = true;
            return;
        };
        self.slots[pivot] += 1;
        for idx in pivot + 1..len {
            self.slots[idx] = if self.parallel_edges {
                self.slots[pivot]
            } else {
                self.slots[idx - 1] + 1
            };
        }
    }
}

impl Iterator for GraphEnumerator {
    type Item = Multigraph;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let graph = self.current();
        self.advance();
        Some(graph)
    }
}

/// Number of graphs produced by [`enumerate_all_graphs`] for the same arguments.
pub fn count_all_graphs(size: usize, edge_count: usize, self_loops: bool, parallel_edges: bool) -> u128 {
    let pairs = if self_loops {
        size * (size + 1) / 2
    } else {
        size * size.saturating_sub(1) / 2
    };
    let pair_count = pairs as u128;
    let edge_count = edge_count as u128;
    if parallel_edges {
        if pair_count == 0 {
            return u128::from(edge_count == 0);
        }
        binomial(pair_count + edge_count - 1, edge_count)
    } else {
        binomial(pair_count, edge_count)
    }
}

fn binomial(n: u128, k: u128) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result = 1u128;
    for i in 0..k {
        result = result * (n - i) / (i + 1);
    }
    result
}

/// Iterator over label assignments of a fixed vertex set.
///
/// Codes are visited in base-`B` counting order with the most significant digit
/// on vertex 0, where `B` is the requested block count or the vertex count.
#[derive(Debug, Clone)]
pub struct PartitionEnumerator {
    digits: Vec<usize>,
    base: usize,
    block_count: Option<usize>,
    reduce: bool,
    seen: HashSet<Labels>,
    done: bool,
}

/// Enumerates partitions of `size` vertices.
///
/// When `block_count` is given, only codes using exactly that many labels are
/// kept. When `reduce` is set, codes are reduced with [`reduce_partition`] and
/// each reduced form is produced once.
pub fn enumerate_all_partitions(size: usize, block_count: Option<usize>, reduce: bool) -> PartitionEnumerator {
    let base = block_count.unwrap_or(size);
    PartitionEnumerator {
        digits: vec![0; size],
        base,
        block_count,
        reduce,
        seen: HashSet::new(),
        done: size > 0 && base == 0,
    }
}

impl PartitionEnumerator {
    fn advance(&mut self) {
        for idx in (0..self.digits.len()).rev() {
            if self.digits[idx] + 1 < self.base {
                self.digits[idx] += 1;
                return;
            }
            self.digits[idx] = 0;
        }
        self.done = true;
    }
}

impl Iterator for PartitionEnumerator {
    type Item = Labels;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let code = self.digits.clone();
            self.advance();
            if let Some(expected) = self.block_count {
                if block_count(&code) != expected {
                    continue;
                }
            }
            if !self.reduce {
                return Some(code);
            }
            let reduced = reduce_partition(&code);
            if self.seen.insert(reduced.clone()) {
                return Some(reduced);
            }
        }
        None
    }
}
