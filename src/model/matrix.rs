use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::{error::{Result, TopicModelError}, model::{document::Document, vocab::Vocabulary}};

/// Dense document-term count matrix
/// shape: (term_num, doc_num), `[i, j]` = count of word `i` in document `j`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DocumentTermMatrix {
    counts: Array2<f64>,
}

/// Weighted matrix produced by a `WeightingEngine`, same shape as the counts
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NormalizedMatrix {
    values: Array2<f64>,
}

impl DocumentTermMatrix {
    /// Count every document's tokens and scatter them into its column
    ///
    /// # Errors
    /// `InvalidInput` if a token is not part of `vocab`
    pub fn build(corpus: &[Document], vocab: &Vocabulary) -> Result<Self> {
        let mut counts = Array2::<f64>::zeros((vocab.len(), corpus.len()));
        for (doc_idx, doc) in corpus.iter().enumerate() {
            for (term, count) in doc.term_counts().iter() {
                let row = vocab.index_of(term).ok_or_else(|| {
                    TopicModelError::invalid(format!("token `{}` of document `{}` is not in the vocabulary", term, doc.id))
                })?;
                counts[[row, doc_idx]] = count as f64;
            }
        }
        log::debug!("document-term matrix built: {} terms x {} documents", vocab.len(), corpus.len());
        Ok(DocumentTermMatrix { counts })
    }

    /// Wrap a raw count matrix
    /// counts must be finite and non-negative
    pub fn from_counts(counts: Array2<f64>) -> Result<Self> {
        if counts.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(TopicModelError::invalid("counts must be finite and non-negative"));
        }
        Ok(DocumentTermMatrix { counts })
    }

    #[inline]
    pub fn counts(&self) -> ArrayView2<'_, f64> {
        self.counts.view()
    }

    /// (term_num, doc_num)
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.counts.dim()
    }

    #[inline]
    pub fn term_num(&self) -> usize {
        self.counts.nrows()
    }

    #[inline]
    pub fn doc_num(&self) -> usize {
        self.counts.ncols()
    }

    /// per word total count over all documents
    pub fn row_sums(&self) -> Array1<f64> {
        self.counts.sum_axis(Axis(1))
    }
}

impl NormalizedMatrix {
    pub(crate) fn new(values: Array2<f64>) -> Self {
        NormalizedMatrix { values }
    }

    #[inline]
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.values
    }
}
