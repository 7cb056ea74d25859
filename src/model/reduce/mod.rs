pub mod jacobi;

use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::{error::{Result, TopicModelError}, model::matrix::NormalizedMatrix};

pub use jacobi::JacobiSvd;

/// Default rank of the topic space
pub const DEFAULT_RANK: usize = 10;

/// Truncated SVD backend
///
/// Contract for `factorize(matrix, k)`:
/// - `singular_values`: `k` non-negative values, descending
/// - `left`: (rows, k) with orthonormal columns
/// - `right`: (k, cols) with orthonormal rows
/// - fails when `k == 0` or `k > min(rows, cols)`
///
/// The sign of each (left, right) vector pair is up to the backend.
/// Callers comparing embeddings across backends must compare up to sign.
pub trait Factorizer {
    fn factorize(&self, matrix: ArrayView2<'_, f64>, k: usize) -> Result<Factorization>;
}

/// Rank-k factors `U · diag(Σ) · V`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Factorization {
    pub singular_values: Array1<f64>,
    /// U (rows, k)
    pub left: Array2<f64>,
    /// V (k, cols)
    pub right: Array2<f64>,
}

impl Factorization {
    #[inline]
    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }

    /// `U · diag(Σ) · V`
    pub fn reconstruct(&self) -> Array2<f64> {
        let mut scaled = self.left.clone();
        for (mut col, &sigma) in scaled.columns_mut().into_iter().zip(self.singular_values.iter()) {
            col *= sigma;
        }
        scaled.dot(&self.right)
    }

    /// Frobenius norm of `matrix - U · diag(Σ) · V`
    pub fn reconstruction_error(&self, matrix: ArrayView2<'_, f64>) -> Result<f64> {
        let approx = self.reconstruct();
        if approx.dim() != matrix.dim() {
            return Err(TopicModelError::invalid(format!(
                "cannot compare a {:?} reconstruction with a {:?} matrix",
                approx.dim(),
                matrix.dim()
            )));
        }
        Ok((&matrix - &approx).iter().map(|d| d * d).sum::<f64>().sqrt())
    }

    /// share of the captured energy held by each singular value, `σ_i² / Σ σ²`
    pub fn explained_variance_ratio(&self) -> Vec<f64> {
        let total: f64 = self.singular_values.iter().map(|s| s * s).sum();
        if total == 0.0 {
            return vec![0.0; self.rank()];
        }
        self.singular_values.iter().map(|s| s * s / total).collect()
    }

    /// shape / ordering check of a backend's result
    fn check_contract(&self, rows: usize, cols: usize, k: usize) -> Result<()> {
        if self.singular_values.len() != k || self.left.dim() != (rows, k) || self.right.dim() != (k, cols) {
            return Err(TopicModelError::invalid(format!(
                "factorizer returned shapes sigma={} U={:?} V={:?}, expected sigma={} U={:?} V={:?}",
                self.singular_values.len(),
                self.left.dim(),
                self.right.dim(),
                k,
                (rows, k),
                (k, cols)
            )));
        }
        let descending = self.singular_values.windows(2).into_iter().all(|w| w[0] >= w[1]);
        let non_negative = self.singular_values.iter().all(|s| *s >= 0.0);
        if !descending || !non_negative {
            return Err(TopicModelError::invalid(
                "factorizer returned singular values that are not descending and non-negative",
            ));
        }
        Ok(())
    }
}

/// Documents and words projected into the same k latent dimensions
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TopicSpace {
    pub factorization: Factorization,
    /// `Nᵀ · U`, (doc_num, k)
    pub document_embeddings: Array2<f64>,
    /// `N · Vᵀ`, (term_num, k)
    pub word_embeddings: Array2<f64>,
}

impl TopicSpace {
    #[inline]
    pub fn rank(&self) -> usize {
        self.factorization.rank()
    }

    #[inline]
    pub fn singular_values(&self) -> &Array1<f64> {
        &self.factorization.singular_values
    }
}

/// Projects a normalized matrix into topic space through an injected `Factorizer`
#[derive(Debug, Clone)]
pub struct Reducer<F> {
    factorizer: F,
}

impl<F> Reducer<F>
where
    F: Factorizer,
{
    pub fn new(factorizer: F) -> Self {
        Reducer { factorizer }
    }

    /// Rank-k factorization and projection
    ///
    /// # Errors
    /// `InvalidInput` if `k` is outside `1..=min(term_num, doc_num)`
    /// or the factorizer breaks its contract
    pub fn reduce(&self, matrix: &NormalizedMatrix, k: usize) -> Result<TopicSpace> {
        let values = matrix.values();
        let (rows, cols) = values.dim();
        let max_rank = rows.min(cols);
        if k == 0 || k > max_rank {
            return Err(TopicModelError::invalid(format!(
                "rank {} is out of bounds, must be in 1..={} for a {}x{} matrix",
                k, max_rank, rows, cols
            )));
        }

        let factorization = self.factorizer.factorize(values, k)?;
        factorization.check_contract(rows, cols, k)?;
        log::debug!(
            "factorized {}x{} matrix at rank {}, leading singular value {:.6}",
            rows,
            cols,
            k,
            factorization.singular_values[0]
        );

        // documents: 各列を左特異ベクトルへ射影
        let document_embeddings = values.t().dot(&factorization.left);
        // words: 各行を右特異ベクトルへ射影
        let word_embeddings = values.dot(&factorization.right.t());

        Ok(TopicSpace {
            factorization,
            document_embeddings,
            word_embeddings,
        })
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use ndarray::{array, s};

    use super::*;
    use crate::model::{matrix::DocumentTermMatrix, weight::{LogEntropyEngine, WeightingEngine}};

    /// Fake backend: axis-aligned factors taken from the identity
    struct AxisFactorizer;

    impl Factorizer for AxisFactorizer {
        fn factorize(&self, matrix: ArrayView2<'_, f64>, k: usize) -> Result<Factorization> {
            let (rows, cols) = matrix.dim();
            if k == 0 || k > rows.min(cols) {
                return Err(TopicModelError::invalid("k out of bounds"));
            }
            Ok(Factorization {
                singular_values: Array1::from_iter((0..k).rev().map(|i| i as f64 + 1.0)),
                left: Array2::eye(rows).slice(s![.., ..k]).to_owned(),
                right: Array2::eye(cols).slice(s![..k, ..]).to_owned(),
            })
        }
    }

    /// Broken backend returning the wrong shapes
    struct ShortFactorizer;

    impl Factorizer for ShortFactorizer {
        fn factorize(&self, matrix: ArrayView2<'_, f64>, _k: usize) -> Result<Factorization> {
            Ok(Factorization {
                singular_values: array![1.0],
                left: Array2::zeros((matrix.nrows(), 1)),
                right: Array2::zeros((1, matrix.ncols())),
            })
        }
    }

    fn normalized() -> NormalizedMatrix {
        let counts = DocumentTermMatrix::from_counts(array![
            [2.0, 0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0, 0.0],
            [0.0, 1.0, 2.0, 1.0],
            [0.0, 0.0, 1.0, 3.0],
            [1.0, 0.0, 0.0, 2.0]
        ])
        .unwrap();
        LogEntropyEngine::normalize(&counts).unwrap()
    }

    #[test]
    fn projection_uses_injected_factors() {
        let matrix = normalized();
        let space = Reducer::new(AxisFactorizer).reduce(&matrix, 2).unwrap();
        let values = matrix.values();

        assert_eq!(space.document_embeddings.dim(), (4, 2));
        assert_eq!(space.word_embeddings.dim(), (5, 2));
        // Nᵀ·U with U = first two unit columns -> first two rows of N, transposed
        assert_eq!(space.document_embeddings, values.slice(s![..2, ..]).reversed_axes());
        // N·Vᵀ with V = first two unit rows -> first two columns of N
        assert_eq!(space.word_embeddings, values.slice(s![.., ..2]));
    }

    #[test]
    fn rank_out_of_bounds_is_invalid_input() {
        let matrix = normalized();
        let reducer = Reducer::new(AxisFactorizer);
        assert!(reducer.reduce(&matrix, 0).unwrap_err().is_invalid_input());
        assert!(reducer.reduce(&matrix, 5).unwrap_err().is_invalid_input());
        assert!(reducer.reduce(&matrix, 4).is_ok());
    }

    #[test]
    fn contract_violation_is_reported() {
        let matrix = normalized();
        let err = Reducer::new(ShortFactorizer).reduce(&matrix, 3).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn reconstruction_error_never_grows_with_rank() {
        let matrix = normalized();
        let reducer = Reducer::new(JacobiSvd::new());
        let mut last = f64::INFINITY;
        for k in 1..=4 {
            let space = reducer.reduce(&matrix, k).unwrap();
            let err = space.factorization.reconstruction_error(matrix.values()).unwrap();
            assert!(err <= last + 1e-9, "error grew at k={}: {} > {}", k, err, last);
            last = err;
        }
        // full rank reproduces the matrix
        assert!(approx_eq!(f64, last, 0.0, epsilon = 1e-8));
    }

    #[test]
    fn explained_variance_sums_to_one() {
        let space = Reducer::new(JacobiSvd::new()).reduce(&normalized(), 3).unwrap();
        let ratios = space.factorization.explained_variance_ratio();
        assert_eq!(ratios.len(), 3);
        assert!(approx_eq!(f64, ratios.iter().sum::<f64>(), 1.0, epsilon = 1e-12));
        assert!(ratios.windows(2).all(|w| w[0] >= w[1]));
    }
}
