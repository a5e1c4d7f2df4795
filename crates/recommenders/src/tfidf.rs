//! TF-IDF text vectorizer.
//!
//! ## Algorithm
//! 1. Tokenize: lowercase, split on anything that is not alphanumeric or `_`,
//!    keep tokens of two or more characters, drop stop words
//! 2. Vocabulary: the `max_features` terms with the highest corpus count,
//!    ties broken by the term itself; columns are in lexical order
//! 3. Weight: `tf * idf` with `idf = ln((1 + n) / (1 + df)) + 1`
//! 4. Scale each document vector to unit length
//!
//! Everything is keyed by sorted terms, so the same corpus always yields
//! the same columns and the same vectors.

use crate::error::{RecommendError, Result};
use crate::stop_words::StopWords;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

/// Default vocabulary size
pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// A sparse vector: column indices strictly ascending, one value per index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Build from (column, value) pairs in any order; repeated columns are summed
    pub fn from_entries(entries: impl IntoIterator<Item = (u32, f64)>) -> Self {
        let mut entries: Vec<(u32, f64)> = entries.into_iter().collect();
        entries.sort_by_key(|&(column, _)| column);

        let mut vector = Self::default();
        for (column, value) in entries {
            if vector.indices.last() == Some(&column) {
                if let Some(slot) = vector.values.last_mut() {
                    *slot += value;
                }
            } else {
                vector.indices.push(column);
                vector.values.push(value);
            }
        }
        vector
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Scale to unit Euclidean norm; an all-zero vector stays all-zero
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.values {
                *value /= norm;
            }
        }
    }

    /// Dot product by merging the two sorted index lists
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Expand to a dense vector of length `dim`
    pub fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dim];
        for (index, value) in self.iter() {
            if let Some(slot) = dense.get_mut(index as usize) {
                *slot = value;
            }
        }
        dense
    }
}

/// Split text into lowercase tokens of at least two word characters
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
}

/// Vectorizer settings
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfVectorizer {
    max_features: usize,
    stop_words: StopWords,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            stop_words: StopWords::English,
        }
    }

    /// Configure the vocabulary size (default: 5000)
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Configure the stop-word policy (default: English)
    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.stop_words = stop_words;
        self
    }

    /// Count the retained terms of one document
    fn term_counts(&self, doc: &str) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for token in tokenize(doc) {
            if !self.stop_words.is_stop_word(&token) {
                *counts.entry(token).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Learn the vocabulary and idf weights from `docs` and vectorize them
    ///
    /// Fails with `EmptyCatalog` when `docs` is empty.
    #[instrument(skip(self, docs), fields(docs = docs.len()))]
    pub fn fit<S: AsRef<str> + Sync>(&self, docs: &[S]) -> Result<FittedTfidf> {
        if docs.is_empty() {
            return Err(RecommendError::EmptyCatalog);
        }

        let doc_counts: Vec<BTreeMap<String, u32>> = docs
            .par_iter()
            .map(|doc| self.term_counts(doc.as_ref()))
            .collect();

        // Corpus frequency and document frequency per term
        let mut corpus: BTreeMap<&str, (u64, u32)> = BTreeMap::new();
        for counts in &doc_counts {
            for (term, &count) in counts {
                let entry = corpus.entry(term.as_str()).or_insert((0, 0));
                entry.0 += count as u64;
                entry.1 += 1;
            }
        }

        // Most frequent first, then lexical; BTreeMap order makes the sort input stable
        let mut ranked: Vec<(&str, u64, u32)> = corpus
            .into_iter()
            .map(|(term, (total, df))| (term, total, df))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);
        ranked.sort_by(|a, b| a.0.cmp(b.0));

        let n_docs = docs.len() as f64;
        let vocabulary: Vec<String> = ranked.iter().map(|(term, _, _)| term.to_string()).collect();
        let idf: Vec<f64> = ranked
            .iter()
            .map(|&(_, _, df)| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        let term_index: HashMap<String, u32> = vocabulary
            .iter()
            .enumerate()
            .map(|(column, term)| (term.clone(), column as u32))
            .collect();

        let mut fitted = FittedTfidf {
            vectorizer: self.clone(),
            vocabulary,
            idf,
            term_index,
            vectors: Vec::new(),
        };
        let vectors: Vec<SparseVector> = doc_counts
            .par_iter()
            .map(|counts| fitted.weigh(counts))
            .collect();
        fitted.vectors = vectors;

        debug!(
            "Fitted TF-IDF over {} documents, {} terms",
            fitted.vectors.len(),
            fitted.vocabulary.len()
        );
        Ok(fitted)
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// A vectorizer fitted to a corpus, with the corpus' own vectors
#[derive(Debug, Clone)]
pub struct FittedTfidf {
    vectorizer: TfidfVectorizer,
    vocabulary: Vec<String>,
    idf: Vec<f64>,
    term_index: HashMap<String, u32>,
    vectors: Vec<SparseVector>,
}

impl FittedTfidf {
    /// Retained terms in column order
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Number of columns
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    /// Unit-length vectors of the fitted documents, in input order
    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    /// Vectorize a new document against the fitted vocabulary
    ///
    /// Terms outside the vocabulary are ignored.
    pub fn transform(&self, doc: &str) -> SparseVector {
        self.weigh(&self.vectorizer.term_counts(doc))
    }

    fn weigh(&self, counts: &BTreeMap<String, u32>) -> SparseVector {
        let entries = counts.iter().filter_map(|(term, &count)| {
            let column = *self.term_index.get(term)?;
            Some((column, count as f64 * self.idf[column as usize]))
        });

        let mut vector = SparseVector::from_entries(entries);
        vector.normalize();
        vector
    }
}
