//! The text search seam, and the bundled in-memory lexical implementation.
//!
//! Evaluation only needs two things from a search backend: build an index for a
//! configuration, and return ranked `(doc_id, score)` hits for a query string.
//! Document ids are positions in the indexed collection.

use crate::analysis::Analyzer;
use crate::bm25::InvertedIndex;
use crate::config::{PipelineConfig, Scoring};
use crate::corpus::Document;
use crate::query;
use crate::tfidf::retrieve_tfidf;
use crate::Error;
use serde::Serialize;

/// One ranked hit returned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hit {
    /// Position of the document in the indexed collection.
    pub doc_id: u32,
    /// Ranking score (higher is better).
    pub score: f32,
}

/// A search backend that can be evaluated.
pub trait TextSearch {
    /// Index built for one configuration.
    type Index;

    /// Index every document of the collection under `config`.
    ///
    /// Fails with [`Error::Indexing`] if a document lacks a required text field.
    fn build_index(
        &self,
        documents: &[Document],
        config: PipelineConfig,
    ) -> Result<Self::Index, Error>;

    /// Run `query`, returning at most `depth` hits by descending score.
    ///
    /// Fails with [`Error::QueryParse`] if the query is not valid syntax.
    fn run_query(&self, index: &Self::Index, query: &str, depth: usize)
        -> Result<Vec<Hit>, Error>;
}

/// In-memory lexical search: analyzer + inverted index + BM25 / TF-IDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSearch;

/// Index produced by [`LexicalSearch`].
#[derive(Debug)]
pub struct LexicalIndex {
    analyzer: Analyzer,
    scoring: Scoring,
    index: InvertedIndex,
}

impl TextSearch for LexicalSearch {
    type Index = LexicalIndex;

    fn build_index(
        &self,
        documents: &[Document],
        config: PipelineConfig,
    ) -> Result<LexicalIndex, Error> {
        let analyzer = Analyzer::new(config.analysis());
        let mut index = InvertedIndex::new();
        for (doc_id, doc) in (0u32..).zip(documents) {
            if doc.title.is_none() {
                return Err(Error::Indexing {
                    doc: doc_id,
                    field: "title",
                });
            }
            let Some(text) = doc.abstract_text.as_deref() else {
                return Err(Error::Indexing {
                    doc: doc_id,
                    field: "abstract_text",
                });
            };
            index.add_document(doc_id, &analyzer.analyze(text));
        }
        tracing::debug!(
            config = %config.code(),
            docs = index.num_docs(),
            avg_len = index.avg_doc_len(),
            "built lexical index"
        );
        Ok(LexicalIndex {
            analyzer,
            scoring: config.scoring(),
            index,
        })
    }

    fn run_query(&self, index: &LexicalIndex, query: &str, depth: usize) -> Result<Vec<Hit>, Error> {
        let analyzed = query::parse(query)?.analyze(&index.analyzer);
        if analyzed.scoring.is_empty() {
            // Every term was analyzed away (e.g. only stopwords).
            return Ok(Vec::new());
        }
        let ix = &index.index;
        let keep = |doc_id| analyzed.admits(ix, doc_id);
        let scored = match index.scoring {
            Scoring::Bm25(params) => ix.retrieve(&analyzed.scoring, depth, params, keep)?,
            Scoring::VectorSpace => retrieve_tfidf(ix, &analyzed.scoring, depth, keep)?,
        };
        Ok(scored
            .into_iter()
            .map(|(doc_id, score)| Hit { doc_id, score })
            .collect())
    }
}
