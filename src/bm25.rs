//! Okapi BM25 over an in-memory inverted index.
//!
//! - postings are `term -> {doc_id -> tf}`, kept sorted by doc id
//! - scoring is standard Okapi BM25 with the "+1" IDF
//! - ranking is deterministic (score desc, then doc_id asc)
//!
//! References:
//! - Robertson & Walker (1994). "Some simple effective approximations to the 2-Poisson model..."
//! - Robertson & Zaragoza (2009). "The Probabilistic Relevance Framework: BM25 and Beyond."

use crate::Error;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation parameter.
    pub k1: f32,
    /// Length normalization parameter.
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// IDF with the BM25 "+1" form: `ln(1 + (N - df + 0.5) / (df + 0.5))`, always positive.
pub fn bm25_idf_plus1(num_docs: f32, doc_frequency: f32) -> f32 {
    (1.0 + (num_docs - doc_frequency + 0.5) / (doc_frequency + 0.5)).ln()
}

/// Saturated, length-normalized term frequency.
pub fn bm25_tf(tf: f32, doc_length: f32, avg_doc_len: f32, k1: f32, b: f32) -> f32 {
    let norm = k1 * (1.0 - b + b * doc_length / avg_doc_len);
    tf * (k1 + 1.0) / (tf + norm)
}

/// In-memory inverted index shared by BM25 and TF-IDF scoring.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, BTreeMap<u32, u32>>,
    doc_lengths: BTreeMap<u32, u32>,
    total_len: u64,
    // Lazily computed IDF cache (term -> idf), invalidated on write.
    precomputed_idf: RefCell<HashMap<String, f32>>,
    idf_computed_at_num_docs: RefCell<u32>,
}

impl InvertedIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of documents currently indexed.
    pub fn num_docs(&self) -> u32 {
        self.doc_lengths.len() as u32
    }

    /// Add/update a document by doc id and token stream.
    pub fn add_document(&mut self, doc_id: u32, terms: &[String]) {
        // Updates are delete+add.
        self.delete_document(doc_id);
        for term in terms {
            *self
                .postings
                .entry(term.clone())
                .or_default()
                .entry(doc_id)
                .or_insert(0) += 1;
        }
        self.doc_lengths.insert(doc_id, terms.len() as u32);
        self.total_len += terms.len() as u64;
        self.invalidate_idf();
    }

    /// Delete a document by id.
    ///
    /// Returns whether the document existed.
    pub fn delete_document(&mut self, doc_id: u32) -> bool {
        let Some(len) = self.doc_lengths.remove(&doc_id) else {
            return false;
        };
        self.total_len -= len as u64;
        self.postings.retain(|_, docs| {
            docs.remove(&doc_id);
            !docs.is_empty()
        });
        self.invalidate_idf();
        true
    }

    fn invalidate_idf(&mut self) {
        self.precomputed_idf.get_mut().clear();
        *self.idf_computed_at_num_docs.get_mut() = 0;
    }

    /// Term frequency of `term` in `doc_id` (0 if doc missing / term absent).
    pub fn term_frequency(&self, doc_id: u32, term: &str) -> u32 {
        self.postings
            .get(term)
            .and_then(|docs| docs.get(&doc_id))
            .copied()
            .unwrap_or(0)
    }

    /// Number of documents containing `term`.
    pub fn doc_frequency(&self, term: &str) -> u32 {
        self.postings.get(term).map_or(0, |docs| docs.len() as u32)
    }

    /// Document length (in terms). Returns 0 for unknown doc ids.
    pub fn document_length(&self, doc_id: u32) -> u32 {
        self.doc_lengths.get(&doc_id).copied().unwrap_or(0)
    }

    /// Average document length (in terms).
    pub fn avg_doc_len(&self) -> f32 {
        if self.doc_lengths.is_empty() {
            return 0.0;
        }
        self.total_len as f32 / self.doc_lengths.len() as f32
    }

    /// Whether `doc_id` contains `term`.
    pub fn contains(&self, doc_id: u32, term: &str) -> bool {
        self.term_frequency(doc_id, term) > 0
    }

    /// Candidate documents: docs that contain at least one query term, ascending.
    pub fn candidates(&self, query_terms: &[String]) -> Vec<u32> {
        let docs: BTreeSet<u32> = query_terms
            .iter()
            .filter_map(|t| self.postings.get(t))
            .flat_map(|docs| docs.keys().copied())
            .collect();
        docs.into_iter().collect()
    }

    fn ensure_idf_computed(&self) {
        let computed_at = *self.idf_computed_at_num_docs.borrow();
        if computed_at == self.num_docs() && !self.precomputed_idf.borrow().is_empty() {
            return;
        }

        let mut idf_map = self.precomputed_idf.borrow_mut();
        idf_map.clear();
        let n = self.num_docs() as f32;
        for (term, docs) in &self.postings {
            idf_map.insert(term.clone(), bm25_idf_plus1(n, docs.len() as f32));
        }
        *self.idf_computed_at_num_docs.borrow_mut() = self.num_docs();
    }

    /// IDF with BM25 "+1" variant (positive idf, stable for frequent terms).
    pub fn idf(&self, term: &str) -> f32 {
        if let Some(&idf) = self.precomputed_idf.borrow().get(term) {
            return idf;
        }
        bm25_idf_plus1(self.num_docs() as f32, self.doc_frequency(term) as f32)
    }

    /// Retrieve the top-k documents accepted by `keep`, using BM25 scoring.
    ///
    /// Output is sorted deterministically by `(score desc, doc_id asc)`.
    pub fn retrieve<F>(
        &self,
        query_terms: &[String],
        k: usize,
        params: Bm25Params,
        keep: F,
    ) -> Result<Vec<(u32, f32)>, Error>
    where
        F: Fn(u32) -> bool,
    {
        if query_terms.is_empty() {
            return Err(Error::EmptyQuery);
        }
        if self.num_docs() == 0 {
            return Err(Error::EmptyIndex);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        self.ensure_idf_computed();
        let query_idfs: Vec<f32> = query_terms.iter().map(|t| self.idf(t)).collect();
        let candidates = self.candidates(query_terms);

        // Min-heap top-k.
        use std::cmp::Reverse;
        use std::collections::BinaryHeap;

        #[derive(PartialEq)]
        struct FloatOrd(f32);
        impl Eq for FloatOrd {}
        impl PartialOrd for FloatOrd {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for FloatOrd {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        // Doc ids are reversed inside the heap so that, at equal score, the larger
        // doc id is evicted first.
        // `k` is caller-controlled and may be far larger than the candidate set.
        let mut heap: BinaryHeap<Reverse<(FloatOrd, Reverse<u32>)>> =
            BinaryHeap::with_capacity(k.min(candidates.len()).saturating_add(1));
        for doc_id in candidates.into_iter().filter(|&d| keep(d)) {
            let score = score_with_idfs(self, doc_id, query_terms, &query_idfs, params);
            if !score.is_finite() || score <= 0.0 {
                continue;
            }
            heap.push(Reverse((FloatOrd(score), Reverse(doc_id))));
            if heap.len() > k {
                heap.pop();
            }
        }

        let mut results: Vec<(u32, f32)> = heap
            .into_iter()
            .map(|Reverse((FloatOrd(score), Reverse(doc_id)))| (doc_id, score))
            .collect();

        // Deterministic: score desc, then doc_id asc.
        results.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(results)
    }
}

fn score_with_idfs(
    index: &InvertedIndex,
    doc_id: u32,
    query_terms: &[String],
    query_idfs: &[f32],
    params: Bm25Params,
) -> f32 {
    let avg_doc_len = index.avg_doc_len();
    if avg_doc_len == 0.0 {
        return 0.0;
    }
    let doc_length = index.document_length(doc_id) as f32;
    let mut score = 0.0;
    for (term, &idf) in query_terms.iter().zip(query_idfs.iter()) {
        if idf == 0.0 {
            continue;
        }
        let tf = index.term_frequency(doc_id, term) as f32;
        if tf == 0.0 {
            continue;
        }
        score += idf * bm25_tf(tf, doc_length, avg_doc_len, params.k1, params.b);
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn all(_: u32) -> bool {
        true
    }

    #[test]
    fn retrieve_tie_breaks_by_doc_id() {
        let mut ix = InvertedIndex::new();
        ix.add_document(1, &terms("a x"));
        ix.add_document(2, &terms("a x"));

        let hits = ix
            .retrieve(&terms("a"), 10, Bm25Params::default(), all)
            .unwrap();
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[1].0, 2);
    }

    #[test]
    fn top_k_keeps_lowest_doc_ids_on_ties() {
        let mut ix = InvertedIndex::new();
        for doc_id in 0..5u32 {
            ix.add_document(doc_id, &terms("same words"));
        }
        ix.add_document(9, &terms("other"));
        let hits = ix
            .retrieve(&terms("same"), 2, Bm25Params::default(), all)
            .unwrap();
        let ids: Vec<u32> = hits.iter().map(|h| h.0).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn higher_tf_ranks_first() {
        let mut ix = InvertedIndex::new();
        ix.add_document(0, &terms("retrieval cat dog"));
        ix.add_document(1, &terms("retrieval retrieval dog"));
        ix.add_document(2, &terms("fish"));
        let hits = ix
            .retrieve(&terms("retrieval"), 10, Bm25Params::default(), all)
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, 1);
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn update_replaces_document() {
        let mut ix = InvertedIndex::new();
        ix.add_document(0, &terms("alpha beta"));
        ix.add_document(0, &terms("gamma"));
        assert_eq!(ix.num_docs(), 1);
        assert_eq!(ix.doc_frequency("alpha"), 0);
        assert_eq!(ix.term_frequency(0, "gamma"), 1);
        assert_eq!(ix.avg_doc_len(), 1.0);
        assert!(ix.delete_document(0));
        assert!(!ix.delete_document(0));
        assert_eq!(ix.num_docs(), 0);
    }

    #[test]
    fn unbounded_depth_returns_every_match() {
        let mut ix = InvertedIndex::new();
        ix.add_document(0, &terms("a b"));
        ix.add_document(1, &terms("a"));
        ix.add_document(2, &terms("c"));
        let hits = ix
            .retrieve(&terms("a"), usize::MAX, Bm25Params::default(), all)
            .unwrap();
        let ids: Vec<u32> = hits.iter().map(|h| h.0).collect();
        assert_eq!(ids, vec![1, 0]);
    }

    #[test]
    fn errors_on_empty_query_or_index() {
        let ix = InvertedIndex::new();
        assert!(matches!(
            ix.retrieve(&terms("a"), 10, Bm25Params::default(), all),
            Err(Error::EmptyIndex)
        ));
        let mut ix = InvertedIndex::new();
        ix.add_document(0, &terms("a"));
        assert!(matches!(
            ix.retrieve(&[], 10, Bm25Params::default(), all),
            Err(Error::EmptyQuery)
        ));
    }

    #[test]
    fn keep_filter_excludes_candidates() {
        let mut ix = InvertedIndex::new();
        ix.add_document(0, &terms("a"));
        ix.add_document(1, &terms("a b"));
        let hits = ix
            .retrieve(&terms("a"), 10, Bm25Params::default(), |d| d != 0)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 1);
    }
}
