//! Response curves mapping an emitter signal to a gain.

use crate::error::{Result, SumoSoundError};
use std::fmt;
use std::sync::Arc;

/// Maps a signal value to a gain multiplier.
///
/// A curve is either a piecewise-linear table of `(input, output)` control
/// points or an arbitrary function. Point tables can only be built through
/// [`ResponseCurve::points`], which rejects degenerate tables.
#[derive(Clone)]
pub struct ResponseCurve {
    kind: CurveKind,
}

#[derive(Clone)]
enum CurveKind {
    /// Control points with strictly increasing inputs
    Points(Vec<(f32, f32)>),
    Function(Arc<dyn Fn(f32) -> f32 + Send + Sync>),
}

impl ResponseCurve {
    /// Builds a piecewise-linear curve, rejecting degenerate point sets.
    pub fn points(points: Vec<(f32, f32)>) -> Result<Self> {
        check_points(&points)?;
        Ok(Self::from_points_unchecked(points))
    }

    /// Stock curves whose control points are constants.
    pub(crate) fn from_points_unchecked(points: Vec<(f32, f32)>) -> Self {
        Self {
            kind: CurveKind::Points(points),
        }
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(f32) -> f32 + Send + Sync + 'static,
    {
        Self {
            kind: CurveKind::Function(Arc::new(f)),
        }
    }

    /// Control points, or `None` for a function curve.
    pub fn control_points(&self) -> Option<&[(f32, f32)]> {
        match &self.kind {
            CurveKind::Points(points) => Some(points),
            CurveKind::Function(_) => None,
        }
    }

    /// Re-checks the control points. Function curves are always valid.
    pub fn validate(&self) -> Result<()> {
        match &self.kind {
            CurveKind::Points(points) => check_points(points),
            CurveKind::Function(_) => Ok(()),
        }
    }

    /// Evaluates the curve at `x`, clamping to the endpoint outputs outside the domain.
    pub fn evaluate(&self, x: f32) -> f32 {
        let points = match &self.kind {
            CurveKind::Function(f) => return f(x),
            CurveKind::Points(points) => points,
        };
        let (Some(&(first_x, first_y)), Some(&(last_x, last_y))) = (points.first(), points.last())
        else {
            return 0.0;
        };
        if x.is_nan() || x <= first_x {
            return first_y;
        }
        if x >= last_x {
            return last_y;
        }
        // first_x < x < last_x, so exactly one segment brackets x
        let i = points
            .partition_point(|&(px, _)| px <= x)
            .saturating_sub(1)
            .min(points.len() - 2);
        let (x0, y0) = points[i];
        let (x1, y1) = points[i + 1];
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }
}

fn check_points(points: &[(f32, f32)]) -> Result<()> {
    if points.len() < 2 {
        return Err(SumoSoundError::Configuration(format!(
            "response curve needs at least 2 control points, got {}",
            points.len()
        )));
    }
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(SumoSoundError::Configuration(
            "response curve control points must be finite".to_string(),
        ));
    }
    if points.windows(2).any(|pair| pair[1].0 <= pair[0].0) {
        return Err(SumoSoundError::Configuration(
            "response curve inputs must be strictly increasing".to_string(),
        ));
    }
    Ok(())
}

impl fmt::Debug for ResponseCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CurveKind::Points(points) => f.debug_tuple("Points").field(points).finish(),
            CurveKind::Function(_) => f.write_str("Function(..)"),
        }
    }
}
