pub mod document;
pub mod token;
pub mod vocab;
pub mod matrix;
pub mod weight;
pub mod reduce;
pub mod cluster;
pub mod evaluate;
pub mod snapshot;

use ndarray::{Array1, Array2};

use crate::{
    config::ModelConfig,
    error::{Result, TopicModelError},
    model::{
        cluster::ClusterAssignment,
        document::Document,
        evaluate::similarity::{Hits, SimilarityIndex},
        matrix::{DocumentTermMatrix, NormalizedMatrix},
        reduce::{Factorizer, JacobiSvd, Reducer, TopicSpace},
        snapshot::TopicModelData,
        vocab::Vocabulary,
        weight::{LogEntropyEngine, WeightingEngine},
    },
};

/// One fitted batch run: vocabulary, weighted matrix and topic space
///
/// `TopicModel<E>` generic parameter:
/// - `E`: weighting engine (default `LogEntropyEngine`)
#[derive(Debug, Clone)]
pub struct TopicModel<E = LogEntropyEngine>
where
    E: WeightingEngine,
{
    config: ModelConfig,
    vocabulary: Vocabulary,
    document_ids: Vec<String>,
    normalized: NormalizedMatrix,
    topic_space: TopicSpace,
    _marker: std::marker::PhantomData<E>,
}

impl TopicModel<LogEntropyEngine> {
    /// Fit with the log-entropy weighting and the Jacobi SVD backend
    pub fn fit(corpus: &[Document], config: &ModelConfig) -> Result<Self> {
        Self::fit_with(corpus, config, JacobiSvd::new())
    }
}

impl<E> TopicModel<E>
where
    E: WeightingEngine,
{
    /// vocabulary -> counts -> weighting -> rank-k projection
    ///
    /// # Errors
    /// `InvalidInput` on an empty corpus, a single document,
    /// or a rank outside `1..=min(term_num, doc_num)`
    pub fn fit_with<F>(corpus: &[Document], config: &ModelConfig, factorizer: F) -> Result<Self>
    where
        F: Factorizer,
    {
        config.validate()?;
        let vocabulary = Vocabulary::build(corpus)?;
        let counts = DocumentTermMatrix::build(corpus, &vocabulary)?;
        let normalized = E::normalize(&counts)?;
        let topic_space = Reducer::new(factorizer).reduce(&normalized, config.rank)?;
        log::info!(
            "topic model fitted: {} documents, {} words, rank {}",
            corpus.len(),
            vocabulary.len(),
            topic_space.rank()
        );

        Ok(TopicModel {
            config: config.clone(),
            vocabulary,
            document_ids: corpus.iter().map(|doc| doc.id.clone()).collect(),
            normalized,
            topic_space,
            _marker: std::marker::PhantomData,
        })
    }

    #[inline]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    #[inline]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    #[inline]
    pub fn document_ids(&self) -> &[String] {
        &self.document_ids
    }

    #[inline]
    pub fn normalized(&self) -> &NormalizedMatrix {
        &self.normalized
    }

    #[inline]
    pub fn topic_space(&self) -> &TopicSpace {
        &self.topic_space
    }

    #[inline]
    pub fn singular_values(&self) -> &Array1<f64> {
        self.topic_space.singular_values()
    }

    /// (doc_num, rank)
    #[inline]
    pub fn document_embeddings(&self) -> &Array2<f64> {
        &self.topic_space.document_embeddings
    }

    /// (term_num, rank)
    #[inline]
    pub fn word_embeddings(&self) -> &Array2<f64> {
        &self.topic_space.word_embeddings
    }

    #[inline]
    pub fn doc_num(&self) -> usize {
        self.document_ids.len()
    }

    #[inline]
    pub fn term_num(&self) -> usize {
        self.vocabulary.len()
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.topic_space.rank()
    }
}

/// clustering
impl<E> TopicModel<E>
where
    E: WeightingEngine,
{
    /// k-means over the document embeddings, `k` clusters
    pub fn cluster_documents(&self, k: usize) -> Result<ClusterAssignment> {
        self.config.kmeans.engine(k).fit(self.document_embeddings().view())
    }

    /// k-means over the word embeddings, `k` clusters
    pub fn cluster_words(&self, k: usize) -> Result<ClusterAssignment> {
        self.config.kmeans.engine(k).fit(self.word_embeddings().view())
    }

    /// words of each word cluster, indexed by label
    pub fn word_clusters(&self, assignment: &ClusterAssignment) -> Result<Vec<Vec<&str>>> {
        assignment.check(self.term_num(), self.rank())?;
        Ok(assignment
            .groups()
            .into_iter()
            .map(|group| group.into_iter().filter_map(|i| self.vocabulary.word(i)).collect())
            .collect())
    }

    /// documents of each document cluster, indexed by label
    /// `corpus` must be the corpus the model was fitted on
    pub fn document_clusters<'c>(
        &self,
        corpus: &'c [Document],
        assignment: &ClusterAssignment,
    ) -> Result<Vec<Vec<&'c Document>>> {
        if corpus.len() != self.doc_num() {
            return Err(TopicModelError::invalid(format!(
                "{} documents for a model fitted on {} documents",
                corpus.len(),
                self.doc_num()
            )));
        }
        assignment.check(self.doc_num(), self.rank())?;
        Ok(assignment
            .groups()
            .into_iter()
            .map(|group| group.into_iter().map(|i| &corpus[i]).collect())
            .collect())
    }
}

/// queries
impl<E> TopicModel<E>
where
    E: WeightingEngine,
{
    pub fn similarity_index(&self) -> Result<SimilarityIndex<'_>> {
        SimilarityIndex::new(&self.vocabulary, self.word_embeddings().view())
    }

    /// nearest words of `word`, `config.neighbor_limit` hits
    pub fn similar_words(&self, word: &str) -> Result<Hits> {
        self.similarity_index()?.similar_words(word, self.config.neighbor_limit)
    }

    /// `w1 - w2 + w3`, `config.neighbor_limit` hits
    pub fn analogy(&self, w1: &str, w2: &str, w3: &str) -> Result<Hits> {
        self.similarity_index()?.analogy(w1, w2, w3, self.config.neighbor_limit)
    }

    /// serializable snapshot of this run
    pub fn to_data(
        &self,
        document_clusters: Option<&ClusterAssignment>,
        word_clusters: Option<&ClusterAssignment>,
    ) -> TopicModelData {
        TopicModelData::from_model(self, document_clusters, word_clusters)
    }
}
