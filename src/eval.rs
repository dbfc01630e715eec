//! Evaluation driver: configuration matrix × queries → averaged curves.
//!
//! For every configuration of an [`EvalPlan`] the driver builds one index, runs each
//! query, tags the hits with relevance judgments and computes both 11-point curves.
//! Curves of the queries that succeeded are averaged per configuration.
//!
//! Failures stay local:
//! - a bad query (parse error, no hits) is recorded on that query and skipped
//! - a topic without relevant documents, or an index that cannot be built, is
//!   recorded on that configuration
//!
//! A run never aborts because of one matrix cell.

use crate::average::{average_precisions, AveragedCurve};
use crate::config::{EvalPlan, PipelineConfig};
use crate::corpus::{Document, Judgments};
use crate::curve::{CurveKind, QueryCurves, RankedResults};
use crate::search::TextSearch;
use crate::Error;
use serde::Serialize;
use tracing::{debug, info, warn};

/// A hit as shown in per-query summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopHit {
    /// 1-based rank.
    pub rank: usize,
    /// Position in the collection.
    pub doc_id: u32,
    /// Document title.
    pub title: String,
    /// Judged relevant for the topic.
    pub relevant: bool,
    /// Ranking score.
    pub score: f32,
}

/// Outcome of one successfully evaluated query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySummary {
    /// Documents in the collection.
    pub total_documents: usize,
    /// Relevant documents for the topic.
    pub relevant_documents: usize,
    /// Hits retrieved.
    pub retrieved: usize,
    /// Relevant hits retrieved.
    pub relevant_retrieved: usize,
    /// Precision over all retrieved hits.
    pub precision: f64,
    /// Recall over all retrieved hits.
    pub recall: f64,
    /// Highest-ranked hits.
    pub top_hits: Vec<TopHit>,
    /// Raw and interpolated 11-point curves.
    pub curves: QueryCurves,
}

/// Result of one query under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// Curves were computed.
    Completed(QuerySummary),
    /// The query could not be evaluated; excluded from averaging.
    Failed {
        /// Error message.
        error: String,
    },
}

/// One query's entry in a configuration report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReport {
    /// Query string.
    pub query: String,
    /// What happened.
    pub outcome: QueryOutcome,
}

/// Everything evaluated for one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigReport {
    /// Configuration (serialized as its code).
    pub config: PipelineConfig,
    /// Human-readable description of the configuration.
    pub label: String,
    /// Per-query results, in plan order.
    pub queries: Vec<QueryReport>,
    /// Mean raw curve over completed queries.
    pub raw: Option<AveragedCurve>,
    /// Mean interpolated curve over completed queries.
    pub interpolated: Option<AveragedCurve>,
    /// Set when the whole configuration could not be evaluated.
    pub failure: Option<String>,
}

impl ConfigReport {
    fn failed(config: PipelineConfig, error: &Error) -> Self {
        Self {
            config,
            label: config.to_string(),
            queries: Vec::new(),
            raw: None,
            interpolated: None,
            failure: Some(error.to_string()),
        }
    }

    /// Averaged curve of the given kind, if any query completed.
    pub fn averaged(&self, kind: CurveKind) -> Option<&AveragedCurve> {
        match kind {
            CurveKind::Raw => self.raw.as_ref(),
            CurveKind::Interpolated => self.interpolated.as_ref(),
        }
    }

    /// Number of queries that failed.
    pub fn failed_queries(&self) -> usize {
        self.queries
            .iter()
            .filter(|q| matches!(q.outcome, QueryOutcome::Failed { .. }))
            .count()
    }
}

/// Results of a whole plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalReport {
    /// Topic evaluated.
    pub topic: u32,
    /// Retrieval depth used.
    pub depth: usize,
    /// One report per configuration, in plan order.
    pub configs: Vec<ConfigReport>,
}

/// Drives a [`TextSearch`] backend over a judged collection.
#[derive(Debug)]
pub struct Evaluator<'a, S> {
    search: &'a S,
    documents: &'a [Document],
}

impl<'a, S: TextSearch> Evaluator<'a, S> {
    /// Evaluate `search` over `documents`.
    pub fn new(search: &'a S, documents: &'a [Document]) -> Self {
        Self { search, documents }
    }

    /// Run every configuration of `plan`.
    pub fn run(&self, plan: &EvalPlan) -> EvalReport {
        let judgments = Judgments::for_topic(self.documents, plan.topic);
        info!(
            topic = plan.topic,
            documents = self.documents.len(),
            relevant = judgments.relevant_count(),
            configs = plan.engines.len(),
            queries = plan.queries.len(),
            "starting evaluation"
        );
        let configs = plan
            .engines
            .iter()
            .map(|&config| self.evaluate_config(config, &judgments, plan))
            .collect();
        EvalReport {
            topic: plan.topic,
            depth: plan.depth,
            configs,
        }
    }

    /// Evaluate one configuration; failures are recorded on the report.
    pub fn evaluate_config(
        &self,
        config: PipelineConfig,
        judgments: &Judgments,
        plan: &EvalPlan,
    ) -> ConfigReport {
        info!(config = %config.code(), "evaluating {config}");
        match self.try_evaluate_config(config, judgments, plan) {
            Ok(report) => report,
            Err(err) => {
                warn!(config = %config.code(), topic = judgments.topic(), "configuration failed: {err}");
                ConfigReport::failed(config, &err)
            }
        }
    }

    fn try_evaluate_config(
        &self,
        config: PipelineConfig,
        judgments: &Judgments,
        plan: &EvalPlan,
    ) -> Result<ConfigReport, Error> {
        if judgments.relevant_count() == 0 {
            return Err(Error::UndefinedRecall);
        }
        let index = self.search.build_index(self.documents, config)?;

        let queries: Vec<QueryReport> = plan
            .queries
            .iter()
            .map(|query| {
                let outcome =
                    match self.evaluate_query(&index, query, judgments, plan.depth, plan.top_hits) {
                        Ok(summary) => {
                            debug!(
                                config = %config.code(),
                                query = %query,
                                retrieved = summary.retrieved,
                                relevant_retrieved = summary.relevant_retrieved,
                                "query evaluated"
                            );
                            QueryOutcome::Completed(summary)
                        }
                        Err(err) => {
                            warn!(config = %config.code(), query = %query, "query failed: {err}");
                            QueryOutcome::Failed {
                                error: err.to_string(),
                            }
                        }
                    };
                QueryReport {
                    query: query.clone(),
                    outcome,
                }
            })
            .collect();

        let completed: Vec<&QueryCurves> = queries
            .iter()
            .filter_map(|q| match &q.outcome {
                QueryOutcome::Completed(summary) => Some(&summary.curves),
                QueryOutcome::Failed { .. } => None,
            })
            .collect();

        let (raw, interpolated) = if completed.is_empty() {
            (None, None)
        } else {
            let raws: Vec<_> = completed.iter().map(|c| c.raw).collect();
            let interps: Vec<_> = completed.iter().map(|c| c.interpolated).collect();
            (
                Some(average_precisions(&raws)?),
                Some(average_precisions(&interps)?),
            )
        };

        Ok(ConfigReport {
            config,
            label: config.to_string(),
            queries,
            raw,
            interpolated,
            failure: None,
        })
    }

    /// Run one query against a built index and compute its curves.
    pub fn evaluate_query(
        &self,
        index: &S::Index,
        query: &str,
        judgments: &Judgments,
        depth: usize,
        top_hits: usize,
    ) -> Result<QuerySummary, Error> {
        let hits = self.search.run_query(index, query, depth)?;
        let results = RankedResults::from_scored(
            hits.iter()
                .map(|h| (judgments.is_relevant(h.doc_id), h.score)),
        );
        let relevant_documents = judgments.relevant_count();
        let curves = QueryCurves::compute(&results, relevant_documents)?;

        let retrieved = results.len();
        let relevant_retrieved = results.relevant_retrieved();
        let top_hits = hits
            .iter()
            .zip(results.hits())
            .take(top_hits)
            .map(|(hit, ranked)| TopHit {
                rank: ranked.rank,
                doc_id: hit.doc_id,
                title: self
                    .documents
                    .get(hit.doc_id as usize)
                    .and_then(|d| d.title.clone())
                    .unwrap_or_default(),
                relevant: ranked.relevant,
                score: hit.score,
            })
            .collect();

        Ok(QuerySummary {
            total_documents: self.documents.len(),
            relevant_documents,
            retrieved,
            relevant_retrieved,
            precision: relevant_retrieved as f64 / retrieved as f64,
            recall: relevant_retrieved as f64 / relevant_documents as f64,
            top_hits,
            curves,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{Hit, LexicalSearch};

    /// Backend returning canned rankings, keyed by query string.
    struct Canned;

    impl TextSearch for Canned {
        type Index = ();

        fn build_index(&self, _: &[Document], _: PipelineConfig) -> Result<(), Error> {
            Ok(())
        }

        fn run_query(&self, _: &(), query: &str, depth: usize) -> Result<Vec<Hit>, Error> {
            let ids: &[u32] = match query {
                "good" => &[0, 2, 1, 3, 4],
                "perfect" => &[0, 1, 2, 3, 4],
                "nothing" => &[],
                _ => return Err(Error::QueryParse(query.to_string())),
            };
            Ok(ids
                .iter()
                .take(depth)
                .enumerate()
                .map(|(i, &doc_id)| Hit {
                    doc_id,
                    score: 10.0 - i as f32,
                })
                .collect())
        }
    }

    fn docs() -> Vec<Document> {
        // Relevant for topic 5: docs 0 and 1.
        vec![
            Document::new("d0", "x", 5, true),
            Document::new("d1", "x", 5, true),
            Document::new("d2", "x", 5, false),
            Document::new("d3", "x", 2, true),
            Document::new("d4", "x", 5, false),
        ]
    }

    fn plan(queries: &[&str]) -> EvalPlan {
        EvalPlan {
            queries: queries.iter().map(|q| q.to_string()).collect(),
            engines: vec![PipelineConfig::from_code("211").unwrap()],
            ..EvalPlan::default()
        }
    }

    #[test]
    fn summary_counts_and_curves() {
        let docs = docs();
        let report = Evaluator::new(&Canned, &docs).run(&plan(&["good"]));
        let config = &report.configs[0];
        assert!(config.failure.is_none());
        let QueryOutcome::Completed(summary) = &config.queries[0].outcome else {
            panic!("query should complete");
        };
        assert_eq!(summary.total_documents, 5);
        assert_eq!(summary.relevant_documents, 2);
        assert_eq!(summary.retrieved, 5);
        // Doc 3 is relevant only for another topic.
        assert_eq!(summary.relevant_retrieved, 2);
        assert_eq!(summary.top_hits[1].title, "d2");
        assert!(!summary.top_hits[1].relevant);
        assert!((summary.precision - 0.4).abs() < 1e-12);
        assert!((summary.recall - 1.0).abs() < 1e-12);

        let raw = config.raw.unwrap();
        assert_eq!(raw.queries, 1);
        assert!((raw.values()[10] - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn failed_queries_are_reported_inline_and_excluded() {
        let docs = docs();
        let report = Evaluator::new(&Canned, &docs).run(&plan(&["perfect", "bad (", "nothing"]));
        let config = &report.configs[0];
        assert!(config.failure.is_none());
        assert_eq!(config.failed_queries(), 2);
        assert!(matches!(
            &config.queries[2].outcome,
            QueryOutcome::Failed { error } if error.contains("no results")
        ));

        // Only the perfect ranking is averaged: precision 1.0 everywhere.
        let interp = config.interpolated.unwrap();
        assert_eq!(interp.queries, 1);
        assert_eq!(interp.values(), &[1.0; 11]);
    }

    #[test]
    fn all_queries_failing_leaves_no_curve() {
        let docs = docs();
        let report = Evaluator::new(&Canned, &docs).run(&plan(&["nothing"]));
        let config = &report.configs[0];
        assert!(config.raw.is_none());
        assert!(config.averaged(CurveKind::Interpolated).is_none());
    }

    #[test]
    fn topic_without_relevant_docs_fails_the_config() {
        let docs = docs();
        let mut plan = plan(&["good"]);
        plan.topic = 9;
        let report = Evaluator::new(&Canned, &docs).run(&plan);
        let config = &report.configs[0];
        assert!(config.failure.as_deref().unwrap().contains("recall undefined"));
        assert!(config.queries.is_empty());
    }

    #[test]
    fn averaging_is_per_configuration() {
        let docs = vec![
            Document::new("a", "cross language information retrieval", 5, true),
            Document::new("b", "translingual retrieval of information", 5, true),
            Document::new("c", "information about cooking", 1, false),
            Document::new("d", "polyglot searching of documents", 5, false),
        ];
        let plan = EvalPlan {
            queries: vec!["information retrieval".into(), "retrieval".into()],
            engines: ["111", "211"]
                .iter()
                .map(|c| PipelineConfig::from_code(c).unwrap())
                .collect(),
            ..EvalPlan::default()
        };
        let report = Evaluator::new(&LexicalSearch, &docs).run(&plan);
        assert_eq!(report.configs.len(), 2);
        for config in &report.configs {
            assert!(config.failure.is_none(), "{:?}", config.failure);
            assert_eq!(config.failed_queries(), 0);
            assert_eq!(config.raw.unwrap().queries, 2);
            let interp = config.interpolated.unwrap();
            assert!(interp.values().windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn huge_depth_does_not_abort_the_run() {
        let docs = vec![
            Document::new("a", "information retrieval", 5, true),
            Document::new("b", "information about cooking", 1, false),
        ];
        let plan = EvalPlan {
            depth: usize::MAX,
            queries: vec!["information".into()],
            ..EvalPlan::default()
        };
        let report = Evaluator::new(&LexicalSearch, &docs).run(&plan);
        assert_eq!(report.configs.len(), 6);
        for config in &report.configs {
            assert!(config.failure.is_none(), "{:?}", config.failure);
            assert_eq!(config.failed_queries(), 0);
        }
    }

    #[test]
    fn indexing_failure_fails_the_config() {
        let mut docs = docs();
        docs[1].title = None;
        let report = Evaluator::new(&LexicalSearch, &docs).run(&plan(&["x"]));
        assert!(report.configs[0]
            .failure
            .as_deref()
            .unwrap()
            .contains("missing title"));
    }
}
