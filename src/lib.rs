/// This crate is a latent topic model: log-entropy weighting, truncated SVD,
/// k-means clustering and word analogy queries over a tokenized corpus.
pub mod config;
pub mod error;
pub mod model;
pub mod utils;

/// Topic Model
/// The top-level struct of this crate, one fitted batch run over a corpus.
///
/// Internally, it holds:
/// - The sorted corpus vocabulary
/// - The log-entropy weighted document-term matrix
/// - The rank-k factorization and the document / word embeddings
/// - The settings it was fitted with
///
/// `TopicModel<E>` has the following generic parameter:
/// - `E`: weighting engine type (e.g., LogEntropyEngine)
///
/// Clustering and similarity queries borrow the fitted embeddings,
/// nothing is recomputed after `fit`.
///
/// # Serialization
/// Through `TopicModelData`.
pub use model::TopicModel;

/// Topic Model Data Structure for Serialization
/// A versioned, self-describing snapshot of a fitted model:
/// vocabulary, document ids, singular values, embeddings and optional clusterings.
/// It can be written to CBOR and read back for queries without refitting.
///
/// # Serialization
/// Supported.
///
/// # Deserialization
/// Supported, the format version and dimensions are checked.
pub use model::snapshot::{TopicModelData, SNAPSHOT_FORMAT_VERSION};

/// Pipeline settings
/// rank, neighbor limit and k-means settings, loadable from JSON.
pub use config::{KMeansConfig, ModelConfig};

/// Error type of every fallible operation, and its `Result` alias
pub use error::{Result, TopicModelError};

/// Corpus input
/// - `Document`: an id and its token sequence
/// - `TermCounts`: token occurrence counts of one document
pub use model::document::Document;
pub use model::token::TermCounts;

/// Vocabulary and count matrices
/// - `Vocabulary`: sorted distinct words, index lookup in both directions
/// - `DocumentTermMatrix`: (term_num, doc_num) raw counts
/// - `NormalizedMatrix`: the weighted counts
pub use model::vocab::Vocabulary;
pub use model::matrix::{DocumentTermMatrix, NormalizedMatrix};

/// Weighting Engine Trait
/// A trait that defines how raw counts are weighted before factorization.
///
/// By implementing this trait, you can plug different weighting schemes
/// into `TopicModel<E>`.
/// A default implementation, `LogEntropyEngine`, applies `ln(1 + count)`
/// locally and the entropy weight of each word globally.
pub use model::weight::{LogEntropyEngine, WeightingEngine};

/// Rank reduction
/// - `Factorizer`: truncated SVD backend trait
/// - `JacobiSvd`: the built-in one-sided Jacobi backend
/// - `Reducer`: projects documents and words into the topic space
pub use model::reduce::{Factorization, Factorizer, JacobiSvd, Reducer, TopicSpace};

/// k-means clustering of document or word embeddings
pub use model::cluster::{ClusterAssignment, KMeans};

/// Similarity queries
/// - `SimilarityIndex`: cosine nearest neighbors and analogies over word embeddings
/// - `Hits`: holds the ranked results
/// - `HitEntry`: a single result entry, word, vocabulary index and similarity
pub use model::evaluate::similarity::{HitEntry, Hits, SimilarityIndex};
