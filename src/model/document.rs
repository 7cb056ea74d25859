use serde::{Deserialize, Serialize};

use crate::model::token::TermCounts;

/// A single tokenized document of the corpus
/// `tokens` keeps order and repetition, it is the only field the pipeline reads
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    /// caller defined identifier (file name, story id, ...)
    pub id: String,
    /// ordered tokens, repeats allowed
    pub tokens: Vec<String>,
    /// raw text, kept for presentation only
    #[serde(default)]
    pub text: String,
}

impl Document {
    pub fn new<T>(id: impl Into<String>, tokens: &[T], text: impl Into<String>) -> Self
    where
        T: AsRef<str>,
    {
        Document {
            id: id.into(),
            tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
            text: text.into(),
        }
    }

    /// Build a document whose raw text is the tokens joined by spaces
    pub fn from_tokens<T>(id: impl Into<String>, tokens: &[T]) -> Self
    where
        T: AsRef<str>,
    {
        let text = tokens.iter().map(|t| t.as_ref()).collect::<Vec<_>>().join(" ");
        Self::new(id, tokens, text)
    }

    /// token occurrence counts of this document
    pub fn term_counts(&self) -> TermCounts {
        let mut counts = TermCounts::new();
        counts.add_terms(&self.tokens);
        counts
    }

    pub fn token_num(&self) -> usize {
        self.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_field_is_required_when_deserializing() {
        let ok: Document = serde_json::from_str(r#"{"id":"a","tokens":["x","y"]}"#).unwrap();
        assert_eq!(ok.tokens, vec!["x", "y"]);
        assert_eq!(ok.text, "");

        let missing = serde_json::from_str::<Document>(r#"{"id":"a","text":"x y"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn from_tokens_joins_text() {
        let doc = Document::from_tokens("d", &["cat", "dog"]);
        assert_eq!(doc.text, "cat dog");
        assert_eq!(doc.token_num(), 2);
    }
}
