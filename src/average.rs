//! Positional averaging of 11-point curves across queries.

use crate::curve::{ElevenPointCurve, CURVE_POINTS};
use crate::Error;
use serde::Serialize;

/// Mean precision at each recall level over several queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AveragedCurve {
    /// Mean curve.
    pub curve: ElevenPointCurve,
    /// Number of curves averaged.
    pub queries: usize,
}

impl AveragedCurve {
    /// Precision values, index 0 = recall 0.0.
    pub fn values(&self) -> &[f64; CURVE_POINTS] {
        self.curve.values()
    }
}

/// Average precision curves point by point (index `j` of the output is the mean of
/// index `j` of every input).
///
/// The mean is kept as a running mean, `m += (x - m) / k`, so averaging identical
/// curves returns them bit for bit.
///
/// Fails with [`Error::ArityMismatch`] if the input is empty or any curve does not
/// have exactly 11 points.
pub fn average_precisions<C: AsRef<[f64]>>(curves: &[C]) -> Result<AveragedCurve, Error> {
    if curves.is_empty() {
        return Err(Error::ArityMismatch {
            expected: 1,
            found: 0,
        });
    }

    let mut means = [0.0f64; CURVE_POINTS];
    for (k, curve) in (1u32..).zip(curves) {
        let curve = curve.as_ref();
        if curve.len() != CURVE_POINTS {
            return Err(Error::ArityMismatch {
                expected: CURVE_POINTS,
                found: curve.len(),
            });
        }
        for (mean, value) in means.iter_mut().zip(curve) {
            *mean += (value - *mean) / f64::from(k);
        }
    }

    Ok(AveragedCurve {
        curve: ElevenPointCurve::new(means),
        queries: curves.len(),
    })
}
