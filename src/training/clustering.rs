//! K-Means clustering
//!
//! Unsupervised: takes X only. Runs several k-means++ seeded restarts and
//! keeps the one with the lowest inertia.

use crate::error::{Result, SketchError};
use super::config::{KMEANS_N_INIT, RANDOM_SEED};
use ndarray::{Array1, Array2, ArrayView1};
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// K-Means clustering with k-means++ initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeans {
    pub n_clusters: usize,
    pub n_init: usize,
    pub max_iter: usize,
    pub tol: f64,
    pub random_state: u64,
    /// Fitted cluster centroids (n_clusters × n_features)
    centroids: Option<Array2<f64>>,
    /// Cluster index assigned to each training point
    labels: Option<Vec<usize>>,
    /// Sum of squared distances to the assigned centroid
    inertia: Option<f64>,
}

/// Outcome of one restart
struct Run {
    centroids: Array2<f64>,
    labels: Vec<usize>,
    inertia: f64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new(3)
    }
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            n_init: KMEANS_N_INIT,
            max_iter: 300,
            tol: 1e-4,
            random_state: RANDOM_SEED,
            centroids: None,
            labels: None,
            inertia: None,
        }
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// K-means++ initialization: pick centroids spread apart
    fn kmeans_pp_init(x: &Array2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
        let n_samples = x.nrows();
        let mut centroids = Array2::zeros((k, x.ncols()));

        let first = (rng.next_u64() as usize) % n_samples;
        centroids.row_mut(0).assign(&x.row(first));

        for c in 1..k {
            // Squared distance to the nearest chosen centroid
            let dists: Vec<f64> = (0..n_samples)
                .map(|i| {
                    (0..c)
                        .map(|j| Self::euclidean_sq(&x.row(i), &centroids.row(j)))
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            let total: f64 = dists.iter().sum();
            if total <= 0.0 {
                let idx = (rng.next_u64() as usize) % n_samples;
                centroids.row_mut(c).assign(&x.row(idx));
                continue;
            }

            // Weighted random selection proportional to D²
            let r = (rng.next_u64() as f64 / u64::MAX as f64) * total;
            let mut cumulative = 0.0;
            let mut chosen = n_samples - 1;
            for (i, &d) in dists.iter().enumerate() {
                cumulative += d;
                if d > 0.0 && cumulative >= r {
                    chosen = i;
                    break;
                }
            }
            centroids.row_mut(c).assign(&x.row(chosen));
        }

        centroids
    }

    fn euclidean_sq(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
    }

    fn nearest(row: &ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
        let mut best_c = 0;
        let mut best_dist = f64::MAX;
        for (c, centroid) in centroids.rows().into_iter().enumerate() {
            let d = Self::euclidean_sq(row, &centroid);
            if d < best_dist {
                best_dist = d;
                best_c = c;
            }
        }
        best_c
    }

    fn run_once(&self, x: &Array2<f64>, seed: u64) -> Run {
        let n_samples = x.nrows();
        let k = self.n_clusters;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut centroids = Self::kmeans_pp_init(x, k, &mut rng);
        let mut labels: Vec<usize> = Vec::new();

        for _iter in 0..self.max_iter {
            // Assignment step
            let new_labels: Vec<usize> = (0..n_samples)
                .into_par_iter()
                .map(|i| Self::nearest(&x.row(i), &centroids))
                .collect();

            let unchanged = new_labels == labels;
            labels = new_labels;

            // Update step
            let mut new_centroids = Array2::zeros(centroids.dim());
            let mut counts = vec![0usize; k];
            for (i, &c) in labels.iter().enumerate() {
                counts[c] += 1;
                let mut row = new_centroids.row_mut(c);
                row += &x.row(i);
            }
            for c in 0..k {
                if counts[c] > 0 {
                    new_centroids.row_mut(c).mapv_inplace(|v| v / counts[c] as f64);
                } else {
                    // Empty cluster: reseed from a random point
                    let idx = (rng.next_u64() as usize) % n_samples;
                    new_centroids.row_mut(c).assign(&x.row(idx));
                }
            }

            let shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            centroids = new_centroids;

            if unchanged || shift <= self.tol * self.tol {
                break;
            }
        }

        // Final assignment against the settled centroids
        let labels: Vec<usize> = (0..n_samples)
            .map(|i| Self::nearest(&x.row(i), &centroids))
            .collect();
        let inertia = labels
            .iter()
            .enumerate()
            .map(|(i, &c)| Self::euclidean_sq(&x.row(i), &centroids.row(c)))
            .sum();

        Run {
            centroids,
            labels,
            inertia,
        }
    }

    /// Fit the model (unsupervised, no y needed)
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if self.n_clusters == 0 {
            return Err(SketchError::invalid_parameter(
                "n_clusters",
                self.n_clusters,
                "must be at least 1",
            ));
        }
        if n_samples < self.n_clusters {
            return Err(SketchError::ComputationError(format!(
                "n_samples ({}) < n_clusters ({})",
                n_samples, self.n_clusters
            )));
        }

        let mut seeder = ChaCha8Rng::seed_from_u64(self.random_state);
        let seeds: Vec<u64> = (0..self.n_init.max(1)).map(|_| seeder.next_u64()).collect();

        let best = seeds
            .into_iter()
            .map(|seed| self.run_once(x, seed))
            .reduce(|best, run| if run.inertia < best.inertia { run } else { best })
            .ok_or_else(|| SketchError::ComputationError("no k-means run completed".to_string()))?;

        self.centroids = Some(best.centroids);
        self.labels = Some(best.labels);
        self.inertia = Some(best.inertia);
        Ok(self)
    }

    /// Predict cluster indices for new data
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let centroids = self
            .centroids
            .as_ref()
            .ok_or_else(|| SketchError::EvaluationFailure("k-means model is not fitted".to_string()))?;

        Ok((0..x.nrows())
            .map(|i| Self::nearest(&x.row(i), centroids) as f64)
            .collect())
    }

    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.centroids.as_ref()
    }

    pub fn labels(&self) -> Option<&[usize]> {
        self.labels.as_deref()
    }

    pub fn inertia(&self) -> Option<f64> {
        self.inertia
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_blobs() -> Array2<f64> {
        array![
            [0.0, 0.0], [0.2, 0.1], [0.1, 0.3],
            [9.0, 9.0], [9.2, 8.9], [8.8, 9.1],
        ]
    }

    #[test]
    fn test_kmeans_separates_blobs() {
        let x = two_blobs();
        let mut km = KMeans::new(2);
        km.fit(&x).unwrap();

        let labels = km.labels().unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_ne!(labels[0], labels[3]);
        assert!(km.inertia().unwrap() < 1.0);
    }

    #[test]
    fn test_kmeans_is_deterministic() {
        let x = two_blobs();
        let mut a = KMeans::new(3);
        let mut b = KMeans::new(3);
        a.fit(&x).unwrap();
        b.fit(&x).unwrap();
        assert_eq!(a.labels(), b.labels());
        assert_eq!(a.centroids(), b.centroids());
    }

    #[test]
    fn test_one_cluster_per_point() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let mut km = KMeans::new(2);
        km.fit(&x).unwrap();
        assert!(km.inertia().unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_single_point() {
        let x = array![[1.0, -1.0]];
        let mut km = KMeans::new(1);
        km.fit(&x).unwrap();
        assert_eq!(km.labels().unwrap(), &[0]);
        assert_eq!(km.centroids().unwrap().row(0).to_vec(), vec![1.0, -1.0]);
    }

    #[test]
    fn test_predict_nearest_centroid() {
        let x = two_blobs();
        let mut km = KMeans::new(2);
        km.fit(&x).unwrap();
        let p = km.predict(&array![[0.1, 0.1], [9.0, 9.0]]).unwrap();
        assert_eq!(p[0] as usize, km.labels().unwrap()[0]);
        assert_eq!(p[1] as usize, km.labels().unwrap()[3]);
    }

    #[test]
    fn test_too_few_samples() {
        let x = array![[0.0, 0.0]];
        assert!(KMeans::new(2).fit(&x).is_err());
    }
}
