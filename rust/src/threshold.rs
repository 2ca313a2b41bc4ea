//! Threshold candidates by recursive bisection of a sorted attribute list.

use crate::graph::TaskGraph;
use crate::sorting::TaskAttribute;

/// Bisect `sorted_values`, emitting the midpoint value of every sub-list.
///
/// Pre-order: the midpoint of the whole list comes first, then the left half's
/// candidates, then the right half's. Stops at `depth == 0` or when a sub-list
/// has at most one element, so at most `2^depth - 1` values come back.
pub fn find_thresholds(sorted_values: &[f64], depth: u32) -> Vec<f64> {
    let mut thresholds = Vec::new();
    bisect(sorted_values, depth, &mut thresholds);
    thresholds
}

fn bisect(values: &[f64], depth: u32, out: &mut Vec<f64>) {
    if depth == 0 || values.len() <= 1 {
        return;
    }
    let mid = values.len() / 2;
    out.push(values[mid]);
    bisect(&values[..mid], depth - 1, out);
    bisect(&values[mid..], depth - 1, out);
}

/// Sort `values` ascending and bisect them.
pub fn thresholds_for(mut values: Vec<f64>, depth: u32) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    find_thresholds(&values, depth)
}

/// Threshold candidates for one attribute over every task in a graph.
#[derive(Clone, Copy, Debug)]
pub struct ThresholdFinder {
    attribute: TaskAttribute,
}

impl ThresholdFinder {
    pub fn new(attribute: TaskAttribute) -> Self {
        Self { attribute }
    }

    pub fn attribute(&self) -> TaskAttribute {
        self.attribute
    }

    pub fn values(&self, graph: &TaskGraph) -> Vec<f64> {
        graph
            .tasks()
            .iter()
            .map(|t| self.attribute.extract(t))
            .collect()
    }

    pub fn find(&self, graph: &TaskGraph, depth: u32) -> Vec<f64> {
        thresholds_for(self.values(graph), depth)
    }
}

/// How many values fall into each band delimited by `thresholds`.
///
/// Bands are bounded by the observed minimum, the sorted distinct thresholds
/// and the observed maximum. Each entry is `(lower_bound, count)`; a value
/// sitting exactly on a boundary is counted in the lower band.
pub fn bucket_counts(values: &[f64], thresholds: &[f64]) -> Vec<(f64, usize)> {
    let Some(min) = values.iter().copied().min_by(f64::total_cmp) else {
        return Vec::new();
    };
    let max = values
        .iter()
        .copied()
        .max_by(f64::total_cmp)
        .unwrap_or(min);

    let mut bounds = Vec::with_capacity(thresholds.len() + 2);
    bounds.push(min);
    bounds.extend(thresholds.iter().copied().filter(|t| *t > min && *t < max));
    bounds.push(max);
    bounds.sort_by(f64::total_cmp);
    bounds.dedup();

    if bounds.len() == 1 {
        return vec![(min, values.len())];
    }

    let mut counts = vec![0usize; bounds.len() - 1];
    for &value in values {
        let band = bounds[1..]
            .iter()
            .position(|&upper| value <= upper)
            .unwrap_or(counts.len() - 1);
        counts[band] += 1;
    }

    bounds
        .iter()
        .copied()
        .zip(counts)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_three_yields_seven_candidates() {
        let values: Vec<f64> = (1..=8).map(f64::from).collect();
        let thresholds = find_thresholds(&values, 3);
        assert_eq!(thresholds, vec![5.0, 3.0, 2.0, 4.0, 7.0, 6.0, 8.0]);
    }

    #[test]
    fn test_small_lists_stop_early() {
        assert!(find_thresholds(&[], 3).is_empty());
        assert!(find_thresholds(&[1.0], 3).is_empty());
        assert_eq!(find_thresholds(&[1.0, 2.0], 3), vec![2.0]);
        assert!(find_thresholds(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn test_candidate_count_bound() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        for depth in 0..6 {
            let thresholds = find_thresholds(&values, depth);
            assert_eq!(thresholds.len(), (1usize << depth) - 1);
        }
    }

    #[test]
    fn test_thresholds_for_sorts_first() {
        let thresholds = thresholds_for(vec![3.0, 1.0, 2.0, 0.0], 1);
        assert_eq!(thresholds, vec![2.0]);
    }

    #[test]
    fn test_finder_over_graph() {
        let mut graph = TaskGraph::new();
        for (i, duration) in [4.0, 1.0, 3.0, 2.0].into_iter().enumerate() {
            graph.add_task(&format!("t{i}"), duration, 0, 0).unwrap();
        }
        let finder = ThresholdFinder::new(TaskAttribute::Duration);
        assert_eq!(finder.find(&graph, 2), vec![3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_bucket_counts() {
        let values = vec![1.0, 2.0, 2.0, 3.0, 5.0, 8.0];
        let buckets = bucket_counts(&values, &[3.0, 2.0, 100.0]);
        assert_eq!(buckets, vec![(1.0, 3), (2.0, 1), (3.0, 2)]);

        let total: usize = buckets.iter().map(|(_, c)| c).sum();
        assert_eq!(total, values.len());

        assert!(bucket_counts(&[], &[1.0]).is_empty());
        assert_eq!(bucket_counts(&[4.0, 4.0], &[4.0]), vec![(4.0, 2)]);
    }
}
