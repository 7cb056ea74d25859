use ndarray::{Array1, ArrayView2, Axis, Zip};

use crate::{error::{Result, TopicModelError}, model::matrix::{DocumentTermMatrix, NormalizedMatrix}};

pub trait WeightingEngine {
    /// 局所重み (1要素ごとの変換)
    /// # Arguments
    /// * `count` - term count of one (word, document) cell
    fn local_weight(count: f64) -> f64;

    /// 大域重み (word ごとのスカラー)
    /// # Arguments
    /// * `counts` - document-term count matrix (term_num, doc_num)
    /// # Returns
    /// * `Array1<f64>` - one factor per row
    fn global_weights(counts: ArrayView2<'_, f64>) -> Result<Array1<f64>>;

    /// `N[i, j] = local_weight(M[i, j]) * global_weights(M)[i]`
    fn normalize(matrix: &DocumentTermMatrix) -> Result<NormalizedMatrix> {
        let counts = matrix.counts();
        let global = Self::global_weights(counts)?;
        let mut values = counts.mapv(Self::local_weight);
        Zip::from(values.rows_mut())
            .and(&global)
            .for_each(|mut row, &g| row *= g);
        if values.iter().any(|v| !v.is_finite()) {
            return Err(TopicModelError::invalid("weighting produced a non-finite value"));
        }
        Ok(NormalizedMatrix::new(values))
    }
}

/// Log local weight with entropy global weight
/// - local: `ln(1 + count)`
/// - global: `1 + Σ_j p_ij ln p_ij / ln(doc_num)`, `p_ij = count_ij / row_sum_i`
///
/// The global factor is near 0 for a word spread evenly over the documents
/// and 1 for a word concentrated in a single document.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEntropyEngine;

impl LogEntropyEngine {
    pub fn new() -> Self {
        LogEntropyEngine
    }
}

impl WeightingEngine for LogEntropyEngine {
    #[inline]
    fn local_weight(count: f64) -> f64 {
        count.ln_1p()
    }

    fn global_weights(counts: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let (term_num, doc_num) = counts.dim();
        if term_num == 0 || doc_num == 0 {
            return Err(TopicModelError::invalid("document-term matrix is empty"));
        }
        // ln(1) = 0 で割ることになる
        if doc_num < 2 {
            return Err(TopicModelError::invalid(
                "entropy weighting needs at least two documents",
            ));
        }
        let log_doc_num = (doc_num as f64).ln();
        let row_sums = counts.sum_axis(Axis(1));
        if let Some((row, sum)) = row_sums.iter().enumerate().find(|(_, s)| !(**s > 0.0)) {
            return Err(TopicModelError::invalid(format!(
                "row {} of the document-term matrix sums to {}, every word must occur at least once",
                row, sum
            )));
        }

        let global = counts
            .rows()
            .into_iter()
            .zip(row_sums.iter())
            .map(|(row, &sum)| {
                let entropy: f64 = row
                    .iter()
                    .map(|&count| {
                        let p = count / sum;
                        // p = 0 の項は 0 とする (log(0) 回避)
                        if p > 0.0 { p * p.ln() } else { 0.0 }
                    })
                    .sum();
                1.0 + entropy / log_doc_num
            })
            .collect::<Array1<f64>>();
        Ok(global)
    }
}
