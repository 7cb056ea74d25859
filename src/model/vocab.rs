use std::collections::BTreeSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::{error::{Result, TopicModelError}, model::document::Document};

/// Bidirectional word <-> index mapping
/// indices are contiguous `0..len` and follow the lexicographic order of the words
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    words: IndexSet<Box<str>>,
}

impl Vocabulary {
    /// Union of the token sets of all documents, sorted ascending
    ///
    /// # Errors
    /// `InvalidInput` if the corpus is empty or holds no token at all
    pub fn build(corpus: &[Document]) -> Result<Self> {
        if corpus.is_empty() {
            return Err(TopicModelError::invalid("corpus is empty"));
        }
        // BTreeSet で重複排除とソートを同時に
        let sorted: BTreeSet<&str> = corpus
            .iter()
            .flat_map(|doc| doc.tokens.iter().map(|t| t.as_str()))
            .collect();
        if sorted.is_empty() {
            return Err(TopicModelError::invalid("corpus contains no tokens, vocabulary would be empty"));
        }
        let words: IndexSet<Box<str>> = sorted.into_iter().map(Box::from).collect();
        log::debug!("vocabulary built: {} distinct words from {} documents", words.len(), corpus.len());
        Ok(Vocabulary { words })
    }

    /// Rebuild from an already sorted word list (snapshot restore)
    pub(crate) fn from_sorted_words(words: Vec<String>) -> Result<Self> {
        if words.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TopicModelError::invalid("vocabulary words must be strictly ascending"));
        }
        Ok(Vocabulary { words: words.into_iter().map(String::into_boxed_str).collect() })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// index of `word`, exact match
    #[inline]
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.words.get_index_of(word)
    }

    #[inline]
    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get_index(index).map(|w| w.as_ref())
    }

    #[inline]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// words in index order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(|w| w.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Document> {
        vec![
            Document::from_tokens("doc0", &["cat", "cat", "dog"]),
            Document::from_tokens("doc1", &["dog", "fish"]),
            Document::from_tokens("doc2", &["fish", "fish", "cat"]),
        ]
    }

    #[test]
    fn sorted_contiguous_indices() {
        let vocab = Vocabulary::build(&corpus()).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.index_of("cat"), Some(0));
        assert_eq!(vocab.index_of("dog"), Some(1));
        assert_eq!(vocab.index_of("fish"), Some(2));
        assert_eq!(vocab.word(2), Some("fish"));
        assert_eq!(vocab.word(3), None);
        assert_eq!(vocab.index_of("bird"), None);
    }

    #[test]
    fn deterministic_and_independent_of_document_order() {
        let a = Vocabulary::build(&corpus()).unwrap();
        let b = Vocabulary::build(&corpus()).unwrap();
        assert_eq!(a, b);

        let mut reversed = corpus();
        reversed.reverse();
        let c = Vocabulary::build(&reversed).unwrap();
        assert_eq!(a.iter().collect::<Vec<_>>(), c.iter().collect::<Vec<_>>());
    }

    #[test]
    fn size_equals_distinct_tokens() {
        let docs = vec![
            Document::from_tokens("a", &["z", "y", "z", "x"]),
            Document::from_tokens("b", &["x", "w"]),
        ];
        let vocab = Vocabulary::build(&docs).unwrap();
        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab.iter().collect::<Vec<_>>(), vec!["w", "x", "y", "z"]);
    }

    #[test]
    fn empty_corpus_is_invalid_input() {
        let err = Vocabulary::build(&[]).unwrap_err();
        assert!(err.is_invalid_input());

        let no_tokens = vec![Document::from_tokens::<&str>("a", &[])];
        assert!(Vocabulary::build(&no_tokens).unwrap_err().is_invalid_input());
    }

    #[test]
    fn restore_rejects_unsorted_words() {
        assert!(Vocabulary::from_sorted_words(vec!["a".into(), "b".into()]).is_ok());
        assert!(Vocabulary::from_sorted_words(vec!["b".into(), "a".into()]).is_err());
    }
}
