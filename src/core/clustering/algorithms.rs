//! Clustering Algorithms - K-means
//!
//! Pure Rust k-means with k-means++ seeding. No external ML dependencies.
//! Runs are deterministic for a given seed.

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Error)]
pub enum ClusteringError {
    #[error("Empty dataset")]
    EmptyDataset,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Non-finite feature value at point {point}")]
    NonFiniteValue { point: usize },
}

pub type ClusteringResult<T> = Result<T, ClusteringError>;

// =============================================================================
// Cluster Result
// =============================================================================

/// Result of a clustering operation.
#[derive(Debug, Clone)]
pub struct ClusterResult {
    /// Cluster label for each data point
    pub labels: Vec<usize>,
    /// Cluster centroids
    pub centroids: Vec<Vec<f64>>,
    /// Number of clusters requested
    pub n_clusters: usize,
    /// Inertia (within-cluster sum of squares)
    pub inertia: f64,
    /// Silhouette score (-1 to 1, higher is better)
    pub silhouette_score: f64,
    /// Size of each cluster
    pub cluster_sizes: Vec<usize>,
    /// Lloyd iterations actually run
    pub iterations: usize,
}

impl ClusterResult {
    /// Get indices of points in a specific cluster.
    pub fn get_cluster_indices(&self, cluster_id: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == cluster_id)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of clusters that ended up with no points.
    pub fn empty_clusters(&self) -> usize {
        self.cluster_sizes.iter().filter(|&&s| s == 0).count()
    }
}

// =============================================================================
// K-Means Clustering
// =============================================================================

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct KMeans {
    /// Number of clusters
    pub k: usize,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on inertia
    pub tolerance: f64,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            k: 8,
            max_iter: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Perform K-means clustering.
    pub fn fit(&self, data: &[Vec<f64>]) -> ClusteringResult<ClusterResult> {
        if data.is_empty() {
            return Err(ClusteringError::EmptyDataset);
        }

        let n_samples = data.len();
        let n_features = data[0].len();

        if self.k > n_samples {
            return Err(ClusteringError::InvalidParameters(format!(
                "k={} cannot exceed sample count={}",
                self.k, n_samples
            )));
        }

        if self.k == 0 {
            return Err(ClusteringError::InvalidParameters(
                "k must be at least 1".to_string(),
            ));
        }

        // Validate dimensions and values
        for (i, point) in data.iter().enumerate() {
            if point.len() != n_features {
                return Err(ClusteringError::DimensionMismatch {
                    expected: n_features,
                    actual: point.len(),
                });
            }
            if point.iter().any(|v| !v.is_finite()) {
                return Err(ClusteringError::NonFiniteValue { point: i });
            }
        }

        // k == n: every point is its own centroid, inertia 0
        if self.k == n_samples {
            return Ok(self.singleton_result(data));
        }

        let mut centroids = self.initialize_centroids_plusplus(data);
        let mut labels = vec![0usize; n_samples];
        let mut prev_inertia = f64::INFINITY;
        let mut iterations = 0;

        for iteration in 0..self.max_iter {
            iterations = iteration + 1;

            // Assign points to nearest centroid
            let mut inertia = 0.0;
            let mut changed = iteration == 0;
            for (i, point) in data.iter().enumerate() {
                let (nearest, dist) = find_nearest_centroid(point, &centroids);
                if labels[i] != nearest {
                    labels[i] = nearest;
                    changed = true;
                }
                inertia += dist * dist;
            }

            // Check for convergence
            if !changed || (prev_inertia - inertia).abs() < self.tolerance {
                break;
            }
            prev_inertia = inertia;

            centroids = self.update_centroids(data, &labels, &centroids);
        }

        let inertia = calculate_inertia(data, &labels, &centroids);

        let mut cluster_sizes = vec![0usize; self.k];
        for &label in &labels {
            cluster_sizes[label] += 1;
        }

        let silhouette_score = silhouette(data, &labels, self.k);

        Ok(ClusterResult {
            labels,
            centroids,
            n_clusters: self.k,
            inertia,
            silhouette_score,
            cluster_sizes,
            iterations,
        })
    }

    fn singleton_result(&self, data: &[Vec<f64>]) -> ClusterResult {
        ClusterResult {
            labels: (0..data.len()).collect(),
            centroids: data.to_vec(),
            n_clusters: self.k,
            inertia: 0.0,
            silhouette_score: 0.0,
            cluster_sizes: vec![1; data.len()],
            iterations: 0,
        }
    }

    /// K-means++ initialization for better starting centroids.
    fn initialize_centroids_plusplus(&self, data: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let n_samples = data.len();
        let mut centroids = Vec::with_capacity(self.k);
        let mut chosen = vec![false; n_samples];

        // First centroid: random point
        let first_idx = self.simple_random(0, n_samples);
        centroids.push(data[first_idx].clone());
        chosen[first_idx] = true;

        // Remaining centroids: weighted by distance squared
        for c in 1..self.k {
            let distances: Vec<f64> = data
                .iter()
                .map(|point| {
                    centroids
                        .iter()
                        .map(|centroid| euclidean_distance(point, centroid))
                        .fold(f64::INFINITY, f64::min)
                        .powi(2)
                })
                .collect();

            let total: f64 = distances.iter().sum();
            if total == 0.0 {
                // Every point coincides with a centroid; take the next unused one
                let idx = (0..n_samples)
                    .map(|offset| (self.simple_random(c, n_samples) + offset) % n_samples)
                    .find(|&i| !chosen[i])
                    .unwrap_or(0);
                centroids.push(data[idx].clone());
                chosen[idx] = true;
                continue;
            }

            let threshold = (self.simple_random(c * 100, 1000) as f64 / 1000.0) * total;
            let mut cumsum = 0.0;
            let mut selected = None;

            for (i, &dist) in distances.iter().enumerate() {
                if dist == 0.0 {
                    continue;
                }
                cumsum += dist;
                selected = Some(i);
                if cumsum >= threshold {
                    break;
                }
            }

            let idx = selected.unwrap_or(0);
            centroids.push(data[idx].clone());
            chosen[idx] = true;
        }

        centroids
    }

    /// Mean of each cluster; an empty cluster is reseeded with the point
    /// farthest from its current centroid.
    fn update_centroids(
        &self,
        data: &[Vec<f64>],
        labels: &[usize],
        previous: &[Vec<f64>],
    ) -> Vec<Vec<f64>> {
        let n_features = data[0].len();
        let mut sums = vec![vec![0.0f64; n_features]; self.k];
        let mut counts = vec![0usize; self.k];

        for (point, &label) in data.iter().zip(labels.iter()) {
            counts[label] += 1;
            for (i, &val) in point.iter().enumerate() {
                sums[label][i] += val;
            }
        }

        let mut taken = vec![false; data.len()];
        sums.into_iter()
            .zip(counts.iter())
            .enumerate()
            .map(|(cluster, (sum, &count))| {
                if count > 0 {
                    return sum.into_iter().map(|v| v / count as f64).collect();
                }
                let farthest = data
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !taken[*i])
                    .map(|(i, point)| (i, euclidean_distance(point, &previous[labels[i]])))
                    .max_by(|a, b| a.1.total_cmp(&b.1));
                match farthest {
                    Some((i, _)) => {
                        taken[i] = true;
                        data[i].clone()
                    }
                    None => previous[cluster].clone(),
                }
            })
            .collect()
    }

    fn simple_random(&self, iter: usize, max: usize) -> usize {
        // Simple deterministic "random" for reproducibility
        let hash = self
            .seed
            .wrapping_mul(iter as u64 + 1)
            .wrapping_add(0x9e3779b97f4a7c15);
        (hash % max as u64) as usize
    }
}

fn find_nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, euclidean_distance(point, c)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((0, f64::INFINITY))
}

fn calculate_inertia(data: &[Vec<f64>], labels: &[usize], centroids: &[Vec<f64>]) -> f64 {
    data.iter()
        .zip(labels.iter())
        .map(|(point, &label)| {
            let dist = euclidean_distance(point, &centroids[label]);
            dist * dist
        })
        .sum()
}

/// Mean silhouette over points whose own cluster has another member.
fn silhouette(data: &[Vec<f64>], labels: &[usize], k: usize) -> f64 {
    if data.len() <= 1 || k <= 1 {
        return 0.0;
    }

    let mut total_score = 0.0;
    let mut valid_points = 0;

    for i in 0..data.len() {
        let mut sums = vec![0.0f64; k];
        let mut counts = vec![0usize; k];
        for j in 0..data.len() {
            if i != j {
                sums[labels[j]] += euclidean_distance(&data[i], &data[j]);
                counts[labels[j]] += 1;
            }
        }

        let own = labels[i];
        if counts[own] == 0 {
            continue;
        }
        let a_i = sums[own] / counts[own] as f64;

        let b_i = (0..k)
            .filter(|&c| c != own && counts[c] > 0)
            .map(|c| sums[c] / counts[c] as f64)
            .fold(f64::INFINITY, f64::min);
        if b_i == f64::INFINITY {
            continue;
        }

        let s_i = (b_i - a_i) / a_i.max(b_i);
        if !s_i.is_nan() {
            total_score += s_i;
            valid_points += 1;
        }
    }

    if valid_points > 0 {
        total_score / valid_points as f64
    } else {
        0.0
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Calculate Euclidean distance between two vectors.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

// =============================================================================
// Tests
// =============================================================================
