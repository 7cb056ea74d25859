use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::{rngs::StdRng, seq::index::sample, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{error::{Result, TopicModelError}, utils::math::compare::{Compare, DefaultCompare}};

pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Lloyd k-means
///
/// Initial centroids are `k` distinct input vectors sampled with a seeded
/// `StdRng`, so the same seed and input always give the same result.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
    seed: u64,
}

/// Result of a k-means run
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    /// cluster label of each input vector, in `0..k`
    pub labels: Vec<usize>,
    /// (k, dim)
    pub centroids: Array2<f64>,
    /// number of assignment passes run
    pub iterations: usize,
    /// assignments stopped changing before the iteration limit
    pub converged: bool,
}

impl ClusterAssignment {
    #[inline]
    pub fn k(&self) -> usize {
        self.centroids.nrows()
    }

    /// indices of the vectors assigned to `label`
    pub fn members(&self, label: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == label)
            .map(|(i, _)| i)
            .collect()
    }

    /// member indices of every cluster, indexed by label
    /// labels outside `0..k` belong to no group, see `check`
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.k()];
        for (i, &label) in self.labels.iter().enumerate() {
            if let Some(group) = groups.get_mut(label) {
                group.push(i);
            }
        }
        groups
    }

    /// Consistency with `n` clustered vectors of dimension `dim`
    ///
    /// # Errors
    /// `InvalidInput` if the label count is not `n`, a label is outside `0..k`
    /// or the centroids are not `(k, dim)`
    pub fn check(&self, n: usize, dim: usize) -> Result<()> {
        if self.labels.len() != n {
            return Err(TopicModelError::invalid(format!(
                "{} cluster labels for {} vectors",
                self.labels.len(),
                n
            )));
        }
        if let Some(label) = self.labels.iter().find(|&&l| l >= self.k()) {
            return Err(TopicModelError::invalid(format!(
                "cluster label {} is out of range for {} clusters",
                label,
                self.k()
            )));
        }
        if self.centroids.ncols() != dim {
            return Err(TopicModelError::invalid(format!(
                "centroids have dimension {}, vectors have {}",
                self.centroids.ncols(),
                dim
            )));
        }
        Ok(())
    }
}

impl KMeans {
    /// `k` has no default, the caller picks it for the domain
    pub fn new(k: usize) -> Self {
        KMeans {
            k,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: 0,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Cluster the rows of `data` (n, dim)
    ///
    /// # Errors
    /// `InvalidInput` if `k < 1`, `k > n`, `max_iterations == 0` or `data` holds non-finite values
    pub fn fit(&self, data: ArrayView2<'_, f64>) -> Result<ClusterAssignment> {
        let n = data.nrows();
        if self.k < 1 || self.k > n {
            return Err(TopicModelError::invalid(format!(
                "cluster count {} is out of bounds for {} vectors",
                self.k, n
            )));
        }
        if self.max_iterations == 0 {
            return Err(TopicModelError::invalid("max_iterations must be at least 1"));
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(TopicModelError::invalid("vectors contain non-finite values"));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let seeds = sample(&mut rng, n, self.k).into_vec();
        let mut centroids = data.select(Axis(0), &seeds);

        let mut labels = assign(data, centroids.view());
        let mut iterations = 1;
        let mut converged = false;
        while iterations < self.max_iterations {
            update_centroids(data, &labels, &mut centroids);
            let next = assign(data, centroids.view());
            iterations += 1;
            let changed = next.iter().zip(labels.iter()).filter(|(a, b)| a != b).count();
            log::trace!("k-means iteration {}: {} assignments changed", iterations, changed);
            labels = next;
            if changed == 0 {
                converged = true;
                break;
            }
        }
        // 最終の割り当てに合わせて重心を更新 (収束時は不変)
        update_centroids(data, &labels, &mut centroids);

        if converged {
            log::debug!("k-means (k={}) converged after {} iterations", self.k, iterations);
        } else {
            log::warn!(
                "k-means (k={}) stopped at max_iterations={} without converging",
                self.k,
                self.max_iterations
            );
        }

        Ok(ClusterAssignment {
            labels,
            centroids,
            iterations,
            converged,
        })
    }
}

/// nearest centroid per row, ties go to the lowest cluster index
fn assign(data: ArrayView2<'_, f64>, centroids: ArrayView2<'_, f64>) -> Vec<usize> {
    (0..data.nrows())
        .into_par_iter()
        .map(|i| nearest(data.row(i), centroids))
        .collect()
}

fn nearest(vector: ArrayView1<'_, f64>, centroids: ArrayView2<'_, f64>) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (label, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = <DefaultCompare as Compare<f64>>::squared_euclidean_distance(
            vector.iter().copied(),
            centroid.iter().copied(),
        );
        if dist < best_dist {
            best = label;
            best_dist = dist;
        }
    }
    best
}

/// mean of the assigned rows; an empty cluster keeps its centroid
fn update_centroids(data: ArrayView2<'_, f64>, labels: &[usize], centroids: &mut Array2<f64>) {
    let mut sums = Array2::<f64>::zeros(centroids.dim());
    let mut sizes = vec![0usize; centroids.nrows()];
    for (row, &label) in data.rows().into_iter().zip(labels.iter()) {
        sums.row_mut(label).scaled_add(1.0, &row);
        sizes[label] += 1;
    }
    for (label, &size) in sizes.iter().enumerate() {
        if size > 0 {
            let mean = sums.row(label).mapv(|x| x / size as f64);
            centroids.row_mut(label).assign(&mean);
        }
    }
}
