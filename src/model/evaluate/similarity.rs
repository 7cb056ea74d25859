use std::fmt::{self, Debug, Display};

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{error::{Result, TopicModelError}, model::vocab::Vocabulary, utils::math::compare::{Compare, DefaultCompare}};

/// Default number of neighbors returned by a query
pub const DEFAULT_NEIGHBOR_LIMIT: usize = 10;

/// One neighbor of a query vector
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HitEntry {
    pub word: Box<str>,
    /// vocabulary index of `word`
    pub index: usize,
    /// cosine similarity to the query, in [-1, 1]
    pub similarity: f64,
}

/// Structure to store query results
/// sorted by similarity descending, ties by ascending vocabulary index
#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct Hits {
    pub list: Vec<HitEntry>,
}

impl Hits {
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// best hit
    #[inline]
    pub fn top(&self) -> Option<&HitEntry> {
        self.list.first()
    }

    pub fn words(&self) -> Vec<&str> {
        self.list.iter().map(|hit| hit.word.as_ref()).collect()
    }

    /// Drop the given words (e.g. the words of an analogy query)
    pub fn exclude(mut self, words: &[&str]) -> Self {
        self.list.retain(|hit| !words.contains(&hit.word.as_ref()));
        self
    }
}

impl Debug for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            // 1行1件
            writeln!(f, "Hits [")?;
            for hit in &self.list {
                writeln!(f, "    {:?} (#{}): {:.6}", hit.word, hit.index, hit.similarity)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

impl Display for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for hit in &self.list {
            writeln!(f, "{:.6}\t{}", hit.similarity, hit.word)?;
        }
        Ok(())
    }
}

/// Cosine nearest-neighbor and analogy queries over word embeddings
#[derive(Debug, Clone)]
pub struct SimilarityIndex<'a> {
    vocabulary: &'a Vocabulary,
    /// (term_num, k)
    embeddings: ArrayView2<'a, f64>,
}

impl<'a> SimilarityIndex<'a> {
    /// # Errors
    /// `InvalidInput` if the embedding rows do not match the vocabulary
    pub fn new(vocabulary: &'a Vocabulary, embeddings: ArrayView2<'a, f64>) -> Result<Self> {
        if embeddings.nrows() != vocabulary.len() {
            return Err(TopicModelError::invalid(format!(
                "{} embedding rows for a vocabulary of {} words",
                embeddings.nrows(),
                vocabulary.len()
            )));
        }
        Ok(SimilarityIndex { vocabulary, embeddings })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.embeddings.ncols()
    }

    /// vocabulary index of `word`
    ///
    /// # Errors
    /// `NotFound` if `word` is not in the vocabulary
    pub fn lookup(&self, word: &str) -> Result<usize> {
        self.vocabulary.index_of(word).ok_or_else(|| TopicModelError::not_found(word))
    }

    /// embedding row of `word`
    pub fn embedding(&self, word: &str) -> Result<ArrayView1<'a, f64>> {
        let index = self.lookup(word)?;
        Ok(self.embeddings.index_axis_move(Axis(0), index))
    }

    /// Up to `limit` words closest to `vector` by cosine similarity
    /// returns exactly `min(limit, term_num)` hits
    ///
    /// # Errors
    /// `InvalidInput` if `vector` does not have the embedding dimension
    pub fn nearest_neighbors(&self, vector: ArrayView1<'_, f64>, limit: usize) -> Result<Hits> {
        if vector.len() != self.dim() {
            return Err(TopicModelError::invalid(format!(
                "query vector has dimension {}, embeddings have {}",
                vector.len(),
                self.dim()
            )));
        }
        let embeddings = self.embeddings;
        let mut scored: Vec<(usize, f64)> = (0..embeddings.nrows())
            .into_par_iter()
            .map(|index| {
                let row = embeddings.row(index);
                let similarity = <DefaultCompare as Compare<f64>>::cosine_similarity(vector.iter().copied(), row.iter().copied());
                (index, similarity)
            })
            .collect();
        // 類似度降順, 同値は index 昇順
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(limit);

        let list = scored
            .into_iter()
            .filter_map(|(index, similarity)| {
                self.vocabulary.word(index).map(|word| HitEntry {
                    word: Box::from(word),
                    index,
                    similarity,
                })
            })
            .collect();
        Ok(Hits { list })
    }

    /// Neighbors of a vocabulary word's own embedding
    /// the word itself is part of the result (similarity 1 unless its embedding is zero)
    pub fn similar_words(&self, word: &str, limit: usize) -> Result<Hits> {
        let vector = self.embedding(word)?;
        self.nearest_neighbors(vector, limit)
    }

    /// `embedding(w1) - embedding(w2) + embedding(w3)` and its neighbors
    /// the three query words are not excluded, see `Hits::exclude`
    ///
    /// # Errors
    /// `NotFound` if any of the words is absent
    pub fn analogy(&self, w1: &str, w2: &str, w3: &str, limit: usize) -> Result<Hits> {
        let v1 = self.embedding(w1)?;
        let v2 = self.embedding(w2)?;
        let v3 = self.embedding(w3)?;
        let shifted: Array1<f64> = &v1 - &v2 + &v3;
        self.nearest_neighbors(shifted.view(), limit)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use ndarray::{array, Array2};

    use super::*;
    use crate::model::document::Document;

    fn vocabulary(words: &[&str]) -> Vocabulary {
        Vocabulary::build(&[Document::from_tokens("all", words)]).unwrap()
    }

    /// 2-D space, indices follow the sorted words
    /// king - man + woman = (1, 2), closest in direction to queen
    fn royal() -> (Vocabulary, Array2<f64>) {
        let vocab = vocabulary(&["apple", "king", "man", "queen", "woman"]);
        let embeddings = array![
            [-1.0, -0.2], // apple
            [3.0, 1.0],   // king
            [2.0, 0.0],   // man
            [1.1, 2.0],   // queen
            [0.0, 1.0],   // woman
        ];
        (vocab, embeddings)
    }

    #[test]
    fn analogy_finds_queen() {
        let (vocab, emb) = royal();
        let index = SimilarityIndex::new(&vocab, emb.view()).unwrap();
        let hits = index.analogy("king", "man", "woman", DEFAULT_NEIGHBOR_LIMIT).unwrap();
        assert_eq!(hits.top().unwrap().word.as_ref(), "queen");
        assert_eq!(hits.top().unwrap().index, 3);
    }

    #[test]
    fn neighbors_sorted_and_sized() {
        let (vocab, emb) = royal();
        let index = SimilarityIndex::new(&vocab, emb.view()).unwrap();
        let query = array![1.0, 0.5];
        for limit in [0, 1, 3, 5, 10] {
            let hits = index.nearest_neighbors(query.view(), limit).unwrap();
            assert_eq!(hits.len(), limit.min(vocab.len()));
            assert!(hits.list.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        }
    }

    #[test]
    fn ties_broken_by_ascending_index() {
        let vocab = vocabulary(&["a", "b", "c"]);
        let emb = array![[1.0, 0.0], [2.0, 0.0], [0.0, 1.0]];
        let index = SimilarityIndex::new(&vocab, emb.view()).unwrap();
        let hits = index.nearest_neighbors(array![5.0, 0.0].view(), 3).unwrap();
        assert_eq!(hits.words(), vec!["a", "b", "c"]);
        assert!(approx_eq!(f64, hits.list[0].similarity, 1.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, hits.list[1].similarity, 1.0, epsilon = 1e-12));
    }

    #[test]
    fn zero_vector_query_yields_zero_similarity() {
        let (vocab, emb) = royal();
        let index = SimilarityIndex::new(&vocab, emb.view()).unwrap();
        let hits = index.nearest_neighbors(array![0.0, 0.0].view(), 5).unwrap();
        assert!(hits.list.iter().all(|h| h.similarity == 0.0));
        assert_eq!(hits.list.iter().map(|h| h.index).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn missing_words_are_not_found() {
        let (vocab, emb) = royal();
        let index = SimilarityIndex::new(&vocab, emb.view()).unwrap();
        assert!(index.lookup("prince").unwrap_err().is_not_found());
        assert!(index.analogy("king", "man", "girl", 3).unwrap_err().is_not_found());
        assert!(index.analogy("boy", "man", "woman", 3).unwrap_err().is_not_found());
        assert!(index.similar_words("prince", 3).unwrap_err().is_not_found());
        assert_eq!(index.lookup("woman").unwrap(), 4);
    }

    #[test]
    fn wrong_dimension_is_invalid_input() {
        let (vocab, emb) = royal();
        let index = SimilarityIndex::new(&vocab, emb.view()).unwrap();
        let err = index.nearest_neighbors(array![1.0, 2.0, 3.0].view(), 3).unwrap_err();
        assert!(err.is_invalid_input());

        let short = array![[1.0, 0.0]];
        assert!(SimilarityIndex::new(&vocab, short.view()).unwrap_err().is_invalid_input());
    }

    #[test]
    fn similar_words_starts_with_itself_and_exclude_drops_it() {
        let (vocab, emb) = royal();
        let index = SimilarityIndex::new(&vocab, emb.view()).unwrap();
        let hits = index.similar_words("king", 3).unwrap();
        assert_eq!(hits.top().unwrap().word.as_ref(), "king");
        let rest = hits.exclude(&["king"]);
        assert_eq!(rest.len(), 2);
        assert!(!rest.words().contains(&"king"));
    }
}
