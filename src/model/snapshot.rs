use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::{error::{Result, TopicModelError}, model::{cluster::ClusterAssignment, evaluate::similarity::SimilarityIndex, vocab::Vocabulary, weight::WeightingEngine, TopicModel}};

/// Current snapshot layout version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Serializable result of one batch run
/// dimensions are recorded next to the data so a reader can check them
/// before touching the matrices.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TopicModelData {
    pub format_version: u32,
    pub term_num: usize,
    pub doc_num: usize,
    pub rank: usize,
    /// vocabulary words in index order
    pub words: Vec<String>,
    pub document_ids: Vec<String>,
    pub singular_values: Array1<f64>,
    /// (doc_num, rank)
    pub document_embeddings: Array2<f64>,
    /// (term_num, rank)
    pub word_embeddings: Array2<f64>,
    pub document_clusters: Option<ClusterAssignment>,
    pub word_clusters: Option<ClusterAssignment>,
}

impl TopicModelData {
    /// Snapshot of a fitted model and optional clusterings
    pub fn from_model<E>(
        model: &TopicModel<E>,
        document_clusters: Option<&ClusterAssignment>,
        word_clusters: Option<&ClusterAssignment>,
    ) -> Self
    where
        E: WeightingEngine,
    {
        TopicModelData {
            format_version: SNAPSHOT_FORMAT_VERSION,
            term_num: model.term_num(),
            doc_num: model.doc_num(),
            rank: model.rank(),
            words: model.vocabulary().iter().map(str::to_string).collect(),
            document_ids: model.document_ids().to_vec(),
            singular_values: model.singular_values().clone(),
            document_embeddings: model.document_embeddings().clone(),
            word_embeddings: model.word_embeddings().clone(),
            document_clusters: document_clusters.cloned(),
            word_clusters: word_clusters.cloned(),
        }
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }

    /// Decode and check version and dimensions
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let data: TopicModelData = serde_cbor::from_slice(bytes)?;
        data.validate()?;
        Ok(data)
    }

    pub fn validate(&self) -> Result<()> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(TopicModelError::invalid(format!(
                "unsupported snapshot format version {}, expected {}",
                self.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }
        let consistent = self.words.len() == self.term_num
            && self.document_ids.len() == self.doc_num
            && self.singular_values.len() == self.rank
            && self.document_embeddings.dim() == (self.doc_num, self.rank)
            && self.word_embeddings.dim() == (self.term_num, self.rank);
        if !consistent {
            return Err(TopicModelError::invalid("snapshot dimensions do not match its contents"));
        }
        if let Some(clusters) = &self.document_clusters {
            clusters
                .check(self.doc_num, self.rank)
                .map_err(|e| TopicModelError::invalid(format!("snapshot document clusters: {}", e)))?;
        }
        if let Some(clusters) = &self.word_clusters {
            clusters
                .check(self.term_num, self.rank)
                .map_err(|e| TopicModelError::invalid(format!("snapshot word clusters: {}", e)))?;
        }
        Ok(())
    }

    pub fn vocabulary(&self) -> Result<Vocabulary> {
        Vocabulary::from_sorted_words(self.words.clone())
    }

    /// Query index over the stored word embeddings
    pub fn similarity_index<'a>(&'a self, vocabulary: &'a Vocabulary) -> Result<SimilarityIndex<'a>> {
        SimilarityIndex::new(vocabulary, self.word_embeddings.view())
    }
}
