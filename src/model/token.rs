use std::fmt::Debug;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

///  TermCounts 構造体
/// 1ドキュメント内の term の出現回数を管理する
/// 挿入順を保持するので、同じ token 列からは常に同じ走査順になる
///
/// # Examples
/// ```
/// use svd_topic_model::TermCounts;
/// let mut counts = TermCounts::new();
/// counts.add_terms(&["cat", "cat", "dog"]);
/// assert_eq!(counts.term_count("cat"), 2);
/// assert_eq!(counts.term_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TermCounts {
    #[serde(with = "indexmap::map::serde_seq")]
    term_count: IndexMap<String, u32>,
    total_term_count: u64,
}

/// term の追加
impl TermCounts {
    pub fn new() -> Self {
        TermCounts {
            term_count: IndexMap::new(),
            total_term_count: 0,
        }
    }

    /// term を1つ追加する
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        if let Some(count) = self.term_count.get_mut(term) {
            *count += 1;
        } else {
            self.term_count.insert(term.to_string(), 1);
        }
        self.total_term_count += 1;
        self
    }

    /// 複数の term を追加する
    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }
}

/// 参照系
impl TermCounts {
    /// count of `term`, 0 when absent
    #[inline]
    pub fn term_count(&self, term: &str) -> u32 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    /// total number of terms added (with repetition)
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// number of distinct terms
    #[inline]
    pub fn term_num(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.term_count.is_empty()
    }

    #[inline]
    pub fn contains_term(&self, term: &str) -> bool {
        self.term_count.contains_key(term)
    }

    /// (term, count) in first-seen order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.term_count.iter().map(|(term, &count)| (term.as_str(), count))
    }

    /// distinct terms in first-seen order
    #[inline]
    pub fn term_set_ref_str(&self) -> Vec<&str> {
        self.term_count.keys().map(|s| s.as_str()).collect()
    }

    /// 最も多く出現した term の出現回数
    #[inline]
    pub fn most_frequent_term_count(&self) -> u32 {
        self.term_count.values().copied().max().unwrap_or(0)
    }
}
