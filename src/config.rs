//! Pipeline configurations and the evaluation plan.
//!
//! A [`PipelineConfig`] is one cell of the evaluation matrix. Configurations are
//! written as three-digit codes:
//!
//! | digit | meaning | values |
//! |---|---|---|
//! | 1 | ranking model | `1` vector space (TF-IDF), `2` BM25 |
//! | 2 | stemming | `0` off, `1` on |
//! | 3 | stopword removal | `0` off, `1` on |
//!
//! so `"211"` is BM25 with stemming and stopword removal.

use crate::analysis::AnalysisParams;
use crate::bm25::Bm25Params;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Ranking model used to order hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingModel {
    /// TF-IDF cosine-style vector space model.
    VectorSpace,
    /// Okapi BM25 probabilistic model.
    Bm25,
}

/// Scoring function with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scoring {
    /// Vector space TF-IDF.
    VectorSpace,
    /// BM25.
    Bm25(Bm25Params),
}

/// One search pipeline variant: ranking model × stemming × stopword removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PipelineConfig {
    /// Ranking model.
    pub ranking: RankingModel,
    /// Stem terms at index and query time.
    pub stemming: bool,
    /// Remove stopwords at index and query time.
    pub stopwords: bool,
}

impl PipelineConfig {
    /// Build a configuration.
    pub fn new(ranking: RankingModel, stemming: bool, stopwords: bool) -> Self {
        Self {
            ranking,
            stemming,
            stopwords,
        }
    }

    /// Parse a three-digit configuration code.
    pub fn from_code(code: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidConfigCode(code.to_string());
        let bytes = code.as_bytes();
        let [r, s, w] = bytes else {
            return Err(invalid());
        };
        let ranking = match r {
            b'1' => RankingModel::VectorSpace,
            b'2' => RankingModel::Bm25,
            _ => return Err(invalid()),
        };
        let flag = |b: &u8| match b {
            b'0' => Ok(false),
            b'1' => Ok(true),
            _ => Err(invalid()),
        };
        Ok(Self::new(ranking, flag(s)?, flag(w)?))
    }

    /// Three-digit configuration code.
    pub fn code(&self) -> String {
        let r = match self.ranking {
            RankingModel::VectorSpace => '1',
            RankingModel::Bm25 => '2',
        };
        let flag = |b: bool| if b { '1' } else { '0' };
        [r, flag(self.stemming), flag(self.stopwords)]
            .into_iter()
            .collect()
    }

    /// Analysis steps for this configuration.
    pub fn analysis(&self) -> AnalysisParams {
        AnalysisParams {
            stemming: self.stemming,
            stopwords: self.stopwords,
        }
    }

    /// Scoring function for this configuration.
    pub fn scoring(&self) -> Scoring {
        match self.ranking {
            RankingModel::VectorSpace => Scoring::VectorSpace,
            RankingModel::Bm25 => Scoring::Bm25(Bm25Params::default()),
        }
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ranking = match self.ranking {
            RankingModel::VectorSpace => "VSM",
            RankingModel::Bm25 => "BM25",
        };
        let yes_no = |b: bool| if b { "YES" } else { "NO" };
        write!(
            f,
            "ranking:{ranking}, stemming:{}, stopwords:{}",
            yes_no(self.stemming),
            yes_no(self.stopwords)
        )
    }
}

impl FromStr for PipelineConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

impl TryFrom<String> for PipelineConfig {
    type Error = Error;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::from_code(&code)
    }
}

impl From<PipelineConfig> for String {
    fn from(config: PipelineConfig) -> Self {
        config.code()
    }
}

/// What to evaluate: topic, queries and configuration matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvalPlan {
    /// Search task whose judgments define relevance.
    #[serde(default = "default_topic")]
    pub topic: u32,

    /// Retrieval depth per query.
    #[serde(default = "default_depth")]
    pub depth: usize,

    /// Number of top hits kept in per-query summaries.
    #[serde(default = "default_top_hits")]
    pub top_hits: usize,

    /// Queries run under every configuration.
    #[serde(default = "default_queries")]
    pub queries: Vec<String>,

    /// Configurations, as three-digit codes.
    #[serde(default = "default_engines")]
    pub engines: Vec<PipelineConfig>,
}

fn default_topic() -> u32 {
    5
}

fn default_depth() -> usize {
    1000
}

fn default_top_hits() -> usize {
    25
}

fn default_queries() -> Vec<String> {
    [
        "translingual information retrieval",
        "polyglot information searching",
        "cross-language information retrieval",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_engines() -> Vec<PipelineConfig> {
    use RankingModel::*;
    vec![
        PipelineConfig::new(VectorSpace, true, true),
        PipelineConfig::new(VectorSpace, true, false),
        PipelineConfig::new(VectorSpace, false, true),
        PipelineConfig::new(Bm25, true, true),
        PipelineConfig::new(Bm25, true, false),
        PipelineConfig::new(Bm25, false, true),
    ]
}

impl Default for EvalPlan {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            depth: default_depth(),
            top_hits: default_top_hits(),
            queries: default_queries(),
            engines: default_engines(),
        }
    }
}

impl EvalPlan {
    /// Parse a TOML plan; missing keys take the reference-run defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    /// Load a TOML plan from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
