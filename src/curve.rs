//! Precision/recall over a ranked relevance sequence, and 11-point curves.
//!
//! Given the relevance flags of one query's ranked hits and the number of relevant
//! documents for the topic, this module computes precision and recall at every rank
//! and samples them at the recall levels `0.0, 0.1, ..., 1.0`:
//! - **raw**: precision at the rank whose recall is nearest the level
//! - **interpolated**: the maximum precision at that rank or any later one
//!
//! Nearest-rank lookup compares exact counts (`relevant_seen / relevant` against
//! `level / 10`), so ranks exactly halfway from a level tie, and the earliest one wins.
//!
//! References:
//! - Manning, Raghavan & Schütze (2008), §8.4: evaluation of ranked retrieval results.

use crate::Error;
use serde::Serialize;
use std::fmt;

/// Number of points on an 11-point curve.
pub const CURVE_POINTS: usize = 11;

/// Levels are `i / LEVEL_STEPS` for `i = 0..=LEVEL_STEPS`.
const LEVEL_STEPS: usize = CURVE_POINTS - 1;

/// Nominal recall levels `0.0, 0.1, ..., 1.0`.
pub fn recall_levels() -> [f64; CURVE_POINTS] {
    std::array::from_fn(|i| i as f64 / LEVEL_STEPS as f64)
}

/// One ranked hit, reduced to what evaluation needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedHit {
    /// 1-based rank.
    pub rank: usize,
    /// Whether the hit is judged relevant for the topic.
    pub relevant: bool,
    /// Score assigned by the ranking model.
    pub score: f32,
}

/// Ordered hits of one query execution. Ranks are contiguous from 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedResults {
    hits: Vec<RankedHit>,
}

impl RankedResults {
    /// Build from `(relevant, score)` pairs already in rank order.
    pub fn from_scored<I>(hits: I) -> Self
    where
        I: IntoIterator<Item = (bool, f32)>,
    {
        let hits = hits
            .into_iter()
            .enumerate()
            .map(|(i, (relevant, score))| RankedHit {
                rank: i + 1,
                relevant,
                score,
            })
            .collect();
        Self { hits }
    }

    /// Build from bare relevance flags (scores are zero).
    pub fn from_relevances(relevances: &[bool]) -> Self {
        Self::from_scored(relevances.iter().map(|&r| (r, 0.0)))
    }

    /// Hits in rank order.
    pub fn hits(&self) -> &[RankedHit] {
        &self.hits
    }

    /// Number of hits retrieved.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Number of relevant hits retrieved.
    pub fn relevant_retrieved(&self) -> usize {
        self.hits.iter().filter(|h| h.relevant).count()
    }
}

/// Precision and recall after a given rank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrecisionRecallPoint {
    /// Relevant hits seen up to this rank.
    pub relevant_seen: usize,
    /// Fraction of the topic's relevant documents seen so far.
    pub recall: f64,
    /// Fraction of hits seen so far that are relevant.
    pub precision: f64,
}

/// Precision and recall at every rank.
///
/// Fails with [`Error::UndefinedRecall`] when `relevant_documents` is zero (checked
/// first) and with [`Error::EmptyResult`] when nothing was retrieved.
pub fn precision_recall_points(
    results: &RankedResults,
    relevant_documents: usize,
) -> Result<Vec<PrecisionRecallPoint>, Error> {
    if relevant_documents == 0 {
        return Err(Error::UndefinedRecall);
    }
    if results.is_empty() {
        return Err(Error::EmptyResult);
    }

    let mut seen_relevant = 0usize;
    let points = results
        .hits()
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            if hit.relevant {
                seen_relevant += 1;
            }
            let seen_total = i + 1;
            PrecisionRecallPoint {
                relevant_seen: seen_relevant,
                recall: seen_relevant as f64 / relevant_documents as f64,
                precision: seen_relevant as f64 / seen_total as f64,
            }
        })
        .collect();
    Ok(points)
}

/// Index of the rank whose recall `relevant_seen / relevant_documents` is closest to
/// recall level `level / 10`.
///
/// Distances are compared as integers, `|10 * relevant_seen - level * relevant_documents|`,
/// so equal distances are exactly equal and the earlier index wins. Returns `None` for
/// an empty input.
pub fn nearest_recall_index<I>(
    relevant_seen: I,
    relevant_documents: usize,
    level: usize,
) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    let target = level as u128 * relevant_documents as u128;
    let mut best: Option<(usize, u128)> = None;
    for (i, seen) in relevant_seen.into_iter().enumerate() {
        let diff = (seen as u128 * LEVEL_STEPS as u128).abs_diff(target);
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((i, diff)),
        }
    }
    best.map(|(i, _)| i)
}

/// Which precision an 11-point curve reports at each level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    /// Precision at the nearest-recall rank.
    Raw,
    /// Maximum precision at the nearest-recall rank or beyond.
    Interpolated,
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => f.write_str("raw"),
            Self::Interpolated => f.write_str("interpolated"),
        }
    }
}

/// Precision at the 11 nominal recall levels, index 0 = recall 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ElevenPointCurve([f64; CURVE_POINTS]);

impl ElevenPointCurve {
    /// Wrap 11 precision values.
    pub fn new(values: [f64; CURVE_POINTS]) -> Self {
        Self(values)
    }

    /// Precision values, index 0 = recall 0.0.
    pub fn values(&self) -> &[f64; CURVE_POINTS] {
        &self.0
    }
}

impl TryFrom<&[f64]> for ElevenPointCurve {
    type Error = Error;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        let values: [f64; CURVE_POINTS] =
            values.try_into().map_err(|_| Error::ArityMismatch {
                expected: CURVE_POINTS,
                found: values.len(),
            })?;
        Ok(Self(values))
    }
}

impl AsRef<[f64]> for ElevenPointCurve {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Sample per-rank points at the 11 recall levels.
///
/// `relevant_documents` must be the total the points were computed against.
pub fn eleven_point_curve(
    points: &[PrecisionRecallPoint],
    relevant_documents: usize,
    kind: CurveKind,
) -> Result<ElevenPointCurve, Error> {
    if relevant_documents == 0 {
        return Err(Error::UndefinedRecall);
    }
    let mut values = [0.0; CURVE_POINTS];
    for (level, value) in values.iter_mut().enumerate() {
        let seen = points.iter().map(|p| p.relevant_seen);
        let nearest =
            nearest_recall_index(seen, relevant_documents, level).ok_or(Error::EmptyResult)?;
        *value = match kind {
            CurveKind::Raw => points[nearest].precision,
            CurveKind::Interpolated => points[nearest..]
                .iter()
                .map(|p| p.precision)
                .fold(points[nearest].precision, f64::max),
        };
    }
    Ok(ElevenPointCurve(values))
}

/// Raw and interpolated curves of one query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryCurves {
    /// Non-interpolated curve.
    pub raw: ElevenPointCurve,
    /// Interpolated curve.
    pub interpolated: ElevenPointCurve,
}

impl QueryCurves {
    /// Compute both curves for one query's ranked results.
    pub fn compute(results: &RankedResults, relevant_documents: usize) -> Result<Self, Error> {
        let points = precision_recall_points(results, relevant_documents)?;
        Ok(Self {
            raw: eleven_point_curve(&points, relevant_documents, CurveKind::Raw)?,
            interpolated: eleven_point_curve(
                &points,
                relevant_documents,
                CurveKind::Interpolated,
            )?,
        })
    }

    /// The curve of the given kind.
    pub fn get(&self, kind: CurveKind) -> &ElevenPointCurve {
        match kind {
            CurveKind::Raw => &self.raw,
            CurveKind::Interpolated => &self.interpolated,
        }
    }
}
