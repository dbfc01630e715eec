//! TF-IDF (vector space) scoring over the shared inverted index.
//!
//! This module reuses the same index statistics as BM25, so callers can compare BM25
//! vs TF-IDF with identical tokenization and corpus stats.
//!
//! Weighting is the cosine-style scheme of classic vector-space engines:
//! `sqrt(tf) · idf² · 1/sqrt(|d|)`, with `idf = 1 + ln(N / (df + 1))`. The idf is
//! squared because query and document vectors are both idf-weighted.
//!
//! References:
//! - Spärck Jones (1972): term specificity / IDF motivation.
//! - Salton, Wong & Yang (1975): a vector space model for automatic indexing.

use crate::bm25::InvertedIndex;
use crate::Error;

fn classic_tf(tf_count: u32) -> f32 {
    (tf_count as f32).sqrt()
}

fn classic_idf(num_docs: u32, doc_frequency: u32) -> f32 {
    1.0 + (num_docs as f32 / (doc_frequency as f32 + 1.0)).ln()
}

/// TF-IDF score for a document, given analyzed query terms.
pub fn score_tfidf(index: &InvertedIndex, doc_id: u32, query_terms: &[String]) -> f32 {
    let num_docs = index.num_docs();
    let mut score = 0.0;
    for term in query_terms {
        let tf_count = index.term_frequency(doc_id, term);
        if tf_count == 0 {
            continue;
        }
        let idf = classic_idf(num_docs, index.doc_frequency(term));
        score += classic_tf(tf_count) * idf * idf;
    }
    let len = index.document_length(doc_id);
    if len > 0 {
        score /= (len as f32).sqrt();
    }
    score
}

/// Retrieve the top-k documents accepted by `keep`, using TF-IDF.
///
/// Output is sorted deterministically by `(score desc, doc_id asc)`.
pub fn retrieve_tfidf<F>(
    index: &InvertedIndex,
    query_terms: &[String],
    k: usize,
    keep: F,
) -> Result<Vec<(u32, f32)>, Error>
where
    F: Fn(u32) -> bool,
{
    if query_terms.is_empty() {
        return Err(Error::EmptyQuery);
    }
    if index.num_docs() == 0 {
        return Err(Error::EmptyIndex);
    }
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut scored: Vec<(u32, f32)> = index
        .candidates(query_terms)
        .into_iter()
        .filter(|&doc_id| keep(doc_id))
        .map(|doc_id| (doc_id, score_tfidf(index, doc_id, query_terms)))
        .filter(|(_, score)| score.is_finite() && *score > 0.0)
        .collect();

    // Deterministic: score desc, then doc_id asc.
    scored.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(k);
    Ok(scored)
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

    fn index() -> InvertedIndex {
        let mut ix = InvertedIndex::new();
        ix.add_document(0, &terms("information retrieval systems"));
        ix.add_document(1, &terms("retrieval retrieval"));
        ix.add_document(2, &terms("cooking recipes"));
        ix
    }

    #[test]
    fn favours_short_dense_docs() {
        let ix = index();
        let hits = retrieve_tfidf(&ix, &terms("retrieval"), 10, all).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, 1);
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn idf_stays_positive_for_common_terms() {
        assert!(classic_idf(3, 2) > 0.0);
        // A term in every document still scores.
        let mut ix = InvertedIndex::new();
        ix.add_document(0, &terms("a"));
        ix.add_document(1, &terms("a"));
        assert_eq!(retrieve_tfidf(&ix, &terms("a"), 10, all).unwrap().len(), 2);
    }

    #[test]
    fn score_matches_formula() {
        let ix = index();
        // doc 1: tf 2, df 2, N 3, |d| 2.
        let idf = 1.0 + (3.0f32 / 3.0).ln();
        let expected = 2.0f32.sqrt() * idf * idf / 2.0f32.sqrt();
        let got = score_tfidf(&ix, 1, &terms("retrieval"));
        assert!((got - expected).abs() < 1e-6, "{got} vs {expected}");
    }

    #[test]
    fn depth_and_filter_bound_results() {
        let ix = index();
        let hits = retrieve_tfidf(&ix, &terms("retrieval"), 1, all).unwrap();
        assert_eq!(hits.len(), 1);
        let hits = retrieve_tfidf(&ix, &terms("retrieval"), usize::MAX, |d| d != 1).unwrap();
        assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn errors_on_empty_query() {
        let ix = index();
        assert!(matches!(
            retrieve_tfidf(&ix, &[], 10, all),
            Err(Error::EmptyQuery)
        ));
    }
}
