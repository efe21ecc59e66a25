//! Partitions of the corpus index space and ground-truth extraction.

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use super::error::{AnalysisError, Result};
use super::models::Dataset;

/// One cluster: a key and the corpus indices it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster<K> {
    pub key: K,
    pub members: BTreeSet<usize>,
}

impl<K> Cluster<K> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Disjoint clusters keyed by `K`, kept in key insertion order.
///
/// Predicted partitions use dense `usize` keys `0..K`; the ground truth is
/// keyed by source-group label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition<K> {
    clusters: Vec<Cluster<K>>,
}

/// Reference partition keyed by source group.
pub type TruePartition = Partition<String>;

/// Partition produced by the partitioner, keyed `0..K`.
pub type PredictedPartition = Partition<usize>;

impl<K> Default for Partition<K> {
    fn default() -> Self {
        Self {
            clusters: Vec::new(),
        }
    }
}

impl<K: Clone + PartialEq> Partition<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, members)` pairs. Keys must be unique and member sets
    /// disjoint.
    pub fn from_clusters<I>(clusters: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<usize>)>,
    {
        let mut partition = Self::new();
        let mut seen = BTreeSet::new();
        for (key, members) in clusters {
            if partition.get(&key).is_some() {
                return Err(AnalysisError::precondition("duplicate cluster key"));
            }
            let members: BTreeSet<usize> = members.into_iter().collect();
            if let Some(&index) = members.iter().find(|i| seen.contains(*i)) {
                return Err(AnalysisError::precondition(format!(
                    "item {} appears in more than one cluster",
                    index
                )));
            }
            seen.extend(members.iter().copied());
            partition.clusters.push(Cluster { key, members });
        }
        Ok(partition)
    }

    /// Add `index` to the cluster `key`, creating the cluster at the end if needed.
    fn insert(&mut self, key: K, index: usize) {
        match self.clusters.iter_mut().find(|c| c.key == key) {
            Some(cluster) => {
                cluster.members.insert(index);
            }
            None => self.clusters.push(Cluster {
                key,
                members: BTreeSet::from([index]),
            }),
        }
    }

    pub fn clusters(&self) -> &[Cluster<K>] {
        &self.clusters
    }

    pub fn keys(&self) -> Vec<&K> {
        self.clusters.iter().map(|c| &c.key).collect()
    }

    /// Number of clusters, empty ones included.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn non_empty_count(&self) -> usize {
        self.clusters.iter().filter(|c| !c.is_empty()).count()
    }

    pub fn get(&self, key: &K) -> Option<&BTreeSet<usize>> {
        self.clusters
            .iter()
            .find(|c| &c.key == key)
            .map(|c| &c.members)
    }

    /// Key of the cluster holding `index`.
    pub fn cluster_of(&self, index: usize) -> Option<&K> {
        self.clusters
            .iter()
            .find(|c| c.members.contains(&index))
            .map(|c| &c.key)
    }

    /// Position (in key order) of the cluster holding `index`.
    pub fn position_of(&self, index: usize) -> Option<usize> {
        self.clusters
            .iter()
            .position(|c| c.members.contains(&index))
    }

    pub fn item_count(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }

    /// True when every index in `0..n` sits in exactly one cluster and nothing else does.
    pub fn covers(&self, n: usize) -> bool {
        let mut seen = vec![false; n];
        for index in self.clusters.iter().flat_map(|c| c.members.iter().copied()) {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        seen.into_iter().all(|s| s)
    }
}

impl<K: Clone + PartialEq + fmt::Display> Partition<K> {
    /// One block per cluster listing member titles.
    pub fn describe(&self, titles: &[&str]) -> String {
        let mut out = String::new();
        for cluster in &self.clusters {
            let _ = writeln!(out, "Cluster {}:", cluster.key);
            for &index in &cluster.members {
                let title = titles.get(index).copied().unwrap_or("<unknown>");
                let _ = writeln!(out, "  - {}", title);
            }
        }
        out
    }
}

impl Partition<usize> {
    /// Partition with keys `0..k` from per-item labels. Clusters no item was
    /// assigned to are kept empty.
    pub fn from_labels(labels: &[usize], k: usize) -> Self {
        let mut clusters: Vec<Cluster<usize>> = (0..k)
            .map(|key| Cluster {
                key,
                members: BTreeSet::new(),
            })
            .collect();
        for (index, &label) in labels.iter().enumerate() {
            if label >= clusters.len() {
                clusters.extend((clusters.len()..=label).map(|key| Cluster {
                    key,
                    members: BTreeSet::new(),
                }));
            }
            clusters[label].members.insert(index);
        }
        Self { clusters }
    }
}

/// Ground-truth partition: test cases grouped by source group, groups in
/// order of first appearance.
pub fn ground_truth(dataset: &Dataset) -> TruePartition {
    let mut partition = Partition::new();
    for (index, test) in dataset.test_cases.iter().enumerate() {
        partition.insert(test.source_group.clone(), index);
    }
    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::TestCase;

    #[test]
    fn test_ground_truth_groups_by_source() {
        let dataset = Dataset::new(vec![
            TestCase::new(1, "item1", "A", vec![]),
            TestCase::new(2, "item2", "A", vec![]),
            TestCase::new(3, "item3", "B", vec![]),
        ]);
        let truth = ground_truth(&dataset);

        assert_eq!(truth.keys(), vec!["A", "B"]);
        assert_eq!(truth.get(&"A".to_string()), Some(&BTreeSet::from([0, 1])));
        assert_eq!(truth.get(&"B".to_string()), Some(&BTreeSet::from([2])));
        assert!(truth.covers(3));
    }

    #[test]
    fn test_ground_truth_first_appearance_order() {
        let dataset = Dataset::new(vec![
            TestCase::new(1, "t1", "zeta.feature", vec![]),
            TestCase::new(2, "t2", "alpha.feature", vec![]),
            TestCase::new(3, "t3", "zeta.feature", vec![]),
        ]);
        let truth = ground_truth(&dataset);
        assert_eq!(truth.keys(), vec!["zeta.feature", "alpha.feature"]);
        assert_eq!(truth.position_of(2), Some(0));
    }

    #[test]
    fn test_from_labels_keeps_empty_clusters() {
        let predicted = Partition::from_labels(&[0, 2, 0], 4);
        assert_eq!(predicted.len(), 4);
        assert_eq!(predicted.non_empty_count(), 2);
        assert!(predicted.get(&1).unwrap().is_empty());
        assert_eq!(predicted.cluster_of(1), Some(&2));
        assert!(predicted.covers(3));
    }

    #[test]
    fn test_from_clusters_rejects_overlap() {
        let result = Partition::from_clusters(vec![(0usize, vec![0, 1]), (1, vec![1, 2])]);
        assert!(matches!(
            result,
            Err(AnalysisError::PreconditionViolation { .. })
        ));
        let result = Partition::from_clusters(vec![("a", vec![0]), ("a", vec![1])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_covers_detects_gaps() {
        let partial = Partition::from_clusters(vec![(0usize, vec![0, 2])]).unwrap();
        assert!(!partial.covers(3));
        assert!(!partial.covers(2));
    }

    #[test]
    fn test_describe_lists_titles() {
        let predicted = Partition::from_labels(&[1, 0], 2);
        let text = predicted.describe(&["Build a site", "Serve a site"]);
        assert_eq!(text, "Cluster 0:\n  - Serve a site\nCluster 1:\n  - Build a site\n");
    }
}
