//! `ireval`: retrieval evaluation over lexical search pipelines.
//!
//! Runs a fixed set of queries against a judged document collection under a
//! matrix of pipeline configurations (ranking model × stemming × stopwords) and
//! reports 11-point precision-recall curves, raw and interpolated, averaged
//! across the queries of each configuration.
//!
//! Layout:
//! - [`curve`]: per-rank precision/recall and the 11-point curves
//! - [`average`]: positional averaging of curves
//! - [`eval`]: the configuration × query driver
//! - [`search`]: the `TextSearch` seam plus an in-memory lexical backend
//!   ([`analysis`], [`bm25`], [`tfidf`], [`query`])
//!
//! Non-goals:
//! - Positional postings / phrase scoring
//! - Graded relevance (judgments are binary)
//!
//! References:
//! - Manning, Raghavan & Schütze (2008), ch. 8: evaluation in IR
//! - Robertson & Zaragoza (2009): BM25 and beyond

pub mod analysis;
pub mod average;
pub mod bm25;
pub mod config;
pub mod corpus;
pub mod curve;
pub mod eval;
pub mod query;
pub mod report;
pub mod search;
pub mod tfidf;

pub use error::Error;

mod error {
    /// Errors for retrieval evaluation.
    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        /// The evaluation topic has no relevant documents, so recall is undefined.
        #[error("recall undefined: no relevant documents for the evaluation topic")]
        UndefinedRecall,
        /// A query returned no hits, so no precision can be reported.
        #[error("query returned no results")]
        EmptyResult,
        /// A precision curve had the wrong number of points (or none were given).
        #[error("arity mismatch: expected {expected}, found {found}")]
        ArityMismatch {
            /// Expected count.
            expected: usize,
            /// Observed count.
            found: usize,
        },
        /// A document could not be indexed.
        #[error("cannot index document {doc}: missing {field}")]
        Indexing {
            /// Position of the document in the collection.
            doc: u32,
            /// Name of the missing field.
            field: &'static str,
        },
        /// Query string is not valid query syntax.
        #[error("query parse error: {0}")]
        QueryParse(String),
        /// Pipeline configuration code was malformed.
        #[error("invalid configuration code {0:?} (expected three digits: [12][01][01])")]
        InvalidConfigCode(String),
        /// Query term list was empty.
        #[error("empty query")]
        EmptyQuery,
        /// Index contains no documents.
        #[error("empty index")]
        EmptyIndex,
        /// Reading an input file failed.
        #[error(transparent)]
        Io(#[from] std::io::Error),
        /// JSON (collection input or report output) could not be processed.
        #[error("json error: {0}")]
        Json(#[from] serde_json::Error),
        /// Evaluation plan was not valid TOML.
        #[error("invalid evaluation plan: {0}")]
        Plan(#[from] toml::de::Error),
    }
}
