//! Global and local spline fits.

use log::{debug, trace};

use super::{BoundaryCondition, FittedSpline, SegmentBasis, SplineFitRequest};
use crate::error::{MathError, MathResult};
use crate::interpolation::validate_knots;

/// Fits [`SplineFitRequest`]s.
///
/// One knot gives a constant, two knots a straight line; from three knots on
/// the request's `calibrate` flag selects the global or the local fit.
///
/// ```rust
/// use bgm_math::spline::{BoundaryCondition, SplineFitRequest, SplineFitter};
///
/// let request = SplineFitRequest::new("df", vec![0.0, 1.0, 2.0, 3.0], vec![1.0, 0.97, 0.94, 0.91])
///     .with_boundary(BoundaryCondition::Financial);
/// let spline = SplineFitter::default().fit(&request).unwrap();
/// assert!(spline.slope(3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SplineFitter;

impl SplineFitter {
    /// Fits the request.
    ///
    /// # Errors
    ///
    /// Returns `MathError::FitFailed` naming the request when the knots are
    /// not finite or not strictly increasing, when the segment or weight
    /// vectors do not match the knots, or when the fitted slopes are not finite.
    pub fn fit(&self, request: &SplineFitRequest) -> MathResult<FittedSpline> {
        fit_inner(request).map_err(|err| match err {
            MathError::FitFailed { .. } => err,
            other => MathError::fit_failed(&request.name, other.to_string()),
        })
    }
}

fn fit_inner(request: &SplineFitRequest) -> MathResult<FittedSpline> {
    let xs = &request.xs;
    let ys = &request.values;
    validate_knots(xs, ys, 1)?;
    let n = xs.len();

    let bases = segment_bases(request, n)?;
    let weights = knot_weights(request, n)?;
    validate_boundary(request.boundary)?;

    let slopes = match n {
        1 => vec![0.0],
        2 => {
            let secant = (ys[1] - ys[0]) / (xs[1] - xs[0]);
            vec![secant, secant]
        }
        _ if request.calibrate => global_slopes(xs, ys, request.boundary),
        _ => local_slopes(xs, ys, &weights, request.boundary),
    };

    for (i, &m) in slopes.iter().enumerate() {
        if !m.is_finite() {
            return Err(MathError::non_finite(format!("slope at knot {i}"), m));
        }
    }

    debug!(
        "fitted spline '{}' over {} knots (calibrate = {}, boundary = {:?})",
        request.name, n, request.calibrate, request.boundary
    );
    trace!("spline '{}' knot slopes: {:?}", request.name, slopes);

    Ok(FittedSpline {
        name: request.name.clone(),
        xs: xs.clone(),
        ys: ys.clone(),
        slopes,
        bases,
    })
}

fn segment_bases(request: &SplineFitRequest, n: usize) -> MathResult<Vec<SegmentBasis>> {
    let segments = n.saturating_sub(1);
    if request.segments.is_empty() {
        return Ok(vec![SegmentBasis::Cubic; segments]);
    }
    if request.segments.len() != segments {
        return Err(MathError::invalid_input(format!(
            "{} segment controls for {} segments",
            request.segments.len(),
            segments
        )));
    }
    Ok(request.segments.clone())
}

fn knot_weights(request: &SplineFitRequest, n: usize) -> MathResult<Vec<f64>> {
    let Some(weights) = &request.weights else {
        return Ok(vec![1.0; n]);
    };
    if weights.len() != n {
        return Err(MathError::invalid_input(format!(
            "{} weights for {} knots",
            weights.len(),
            n
        )));
    }
    if let Some((i, w)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !(w.is_finite() && **w > 0.0))
    {
        return Err(MathError::invalid_input(format!(
            "weight[{i}] = {w} must be positive and finite"
        )));
    }
    Ok(weights.clone())
}

fn validate_boundary(boundary: BoundaryCondition) -> MathResult<()> {
    if let BoundaryCondition::Clamped {
        start_slope,
        end_slope,
    } = boundary
    {
        MathError::ensure_finite("clamped start slope", start_slope)?;
        MathError::ensure_finite("clamped end slope", end_slope)?;
    }
    Ok(())
}

/// Knot slopes of the C2 cubic spline, via the tridiagonal system for the
/// knot second derivatives. Requires at least three knots.
fn global_slopes(xs: &[f64], ys: &[f64], boundary: BoundaryCondition) -> Vec<f64> {
    let n = xs.len();
    let mut y2s = vec![0.0; n];
    let mut u = vec![0.0; n - 1];

    let first_secant = (ys[1] - ys[0]) / (xs[1] - xs[0]);
    if let BoundaryCondition::Clamped { start_slope, .. } = boundary {
        y2s[0] = -0.5;
        u[0] = 3.0 / (xs[1] - xs[0]) * (first_secant - start_slope);
    }

    // Decomposition
    for i in 1..n - 1 {
        let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
        let p = sig * y2s[i - 1] + 2.0;
        y2s[i] = (sig - 1.0) / p;
        let jump = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
            - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
        u[i] = (6.0 * jump / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
    }

    let h_last = xs[n - 1] - xs[n - 2];
    let last_secant = (ys[n - 1] - ys[n - 2]) / h_last;
    let (qn, un) = match boundary {
        BoundaryCondition::Natural => (0.0, 0.0),
        BoundaryCondition::Clamped { end_slope, .. } => {
            (0.5, 3.0 / h_last * (end_slope - last_secant))
        }
        BoundaryCondition::Financial => (0.5, 3.0 / h_last * (0.0 - last_secant)),
    };
    y2s[n - 1] = (un - qn * u[n - 2]) / (qn * y2s[n - 2] + 1.0);

    // Back-substitution
    for i in (0..n - 1).rev() {
        y2s[i] = y2s[i] * y2s[i + 1] + u[i];
    }

    let mut slopes = Vec::with_capacity(n);
    for i in 0..n - 1 {
        let h = xs[i + 1] - xs[i];
        slopes.push((ys[i + 1] - ys[i]) / h - h * (2.0 * y2s[i] + y2s[i + 1]) / 6.0);
    }
    slopes.push(last_secant + h_last * (y2s[n - 2] + 2.0 * y2s[n - 1]) / 6.0);
    slopes
}

/// Knot slopes of the local C1 fit. Interior slopes average the two
/// neighbouring secants; with unit weights this is the slope of the parabola
/// through the three surrounding knots. Requires at least three knots.
fn local_slopes(xs: &[f64], ys: &[f64], weights: &[f64], boundary: BoundaryCondition) -> Vec<f64> {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let secants: Vec<f64> = (0..n - 1).map(|j| (ys[j + 1] - ys[j]) / h[j]).collect();

    let mut slopes = vec![0.0; n];
    for i in 1..n - 1 {
        let left = h[i] * weights[i - 1];
        let right = h[i - 1] * weights[i + 1];
        slopes[i] = (left * secants[i - 1] + right * secants[i]) / (left + right);
    }

    // Zero curvature at an end: m_end = (3 s - m_inner) / 2.
    slopes[0] = match boundary {
        BoundaryCondition::Clamped { start_slope, .. } => start_slope,
        BoundaryCondition::Natural | BoundaryCondition::Financial => {
            0.5 * (3.0 * secants[0] - slopes[1])
        }
    };
    slopes[n - 1] = match boundary {
        BoundaryCondition::Clamped { end_slope, .. } => end_slope,
        BoundaryCondition::Financial => 0.0,
        BoundaryCondition::Natural => 0.5 * (3.0 * secants[n - 2] - slopes[n - 2]),
    };
    slopes
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn fit(request: &SplineFitRequest) -> FittedSpline {
        SplineFitter.fit(request).unwrap()
    }

    fn curvature(spline: &FittedSpline, x: f64, dir: f64) -> f64 {
        let h = 1e-6;
        (spline.slope(x + dir * h) - spline.slope(x)) / (dir * h)
    }

    #[test]
    fn test_calibrated_passes_through_knots() {
        let xs = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = vec![0.0, 1.0, 0.0, 1.0, 0.0];
        let spline = fit(&SplineFitRequest::new("wave", xs.clone(), ys.clone()));
        for (x, y) in xs.iter().zip(&ys) {
            assert_relative_eq!(spline.value(*x), *y, epsilon = 1e-12);
        }
        let mid = spline.value(0.5);
        assert!(mid > 0.0 && mid < 1.5);
    }

    #[test]
    fn test_natural_has_zero_end_curvature() {
        let xs = vec![0.0, 0.5, 1.5, 3.0];
        let ys = vec![0.02, 0.025, 0.03, 0.028];
        let spline = fit(&SplineFitRequest::new("natural", xs, ys));
        assert!(curvature(&spline, 0.0, 1.0).abs() < 1e-4);
        assert!(curvature(&spline, 3.0, -1.0).abs() < 1e-4);
    }

    #[test]
    fn test_natural_reproduces_linear_data() {
        let xs = vec![0.0, 1.0, 2.5, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 0.01 + 0.002 * x).collect();
        let spline = fit(&SplineFitRequest::new("line", xs, ys));
        assert_relative_eq!(spline.value(1.7), 0.01 + 0.002 * 1.7, epsilon = 1e-14);
        assert_relative_eq!(spline.slope(3.3), 0.002, epsilon = 1e-12);
    }

    #[test]
    fn test_clamped_reproduces_cubic() {
        let xs = vec![0.0, 1.0, 2.0, 3.0];
        let ys: Vec<f64> = xs.iter().map(|x| x * x * x).collect();
        let request = SplineFitRequest::new("cube", xs, ys).with_boundary(
            BoundaryCondition::Clamped {
                start_slope: 0.0,
                end_slope: 27.0,
            },
        );
        let spline = fit(&request);
        assert_relative_eq!(spline.value(1.5), 3.375, epsilon = 1e-10);
        assert_relative_eq!(spline.slope(2.5), 18.75, epsilon = 1e-10);
    }

    #[test]
    fn test_financial_flat_long_end() {
        let xs = vec![0.25, 0.5, 1.0, 2.0];
        let ys = vec![0.03, 0.031, 0.033, 0.034];
        for calibrate in [true, false] {
            let request = SplineFitRequest::new("libor", xs.clone(), ys.clone())
                .with_boundary(BoundaryCondition::Financial)
                .with_calibration(calibrate);
            let spline = fit(&request);
            assert_relative_eq!(spline.slope(2.0), 0.0, epsilon = 1e-12);
            assert_relative_eq!(spline.value(5.0), 0.034, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_local_reproduces_quadratic_with_exact_ends() {
        let xs = vec![0.0, 0.5, 2.0, 3.0];
        let ys: Vec<f64> = xs.iter().map(|x| x * x).collect();
        let request = SplineFitRequest::new("square", xs, ys)
            .with_calibration(false)
            .with_boundary(BoundaryCondition::Clamped {
                start_slope: 0.0,
                end_slope: 6.0,
            });
        let spline = fit(&request);
        assert_relative_eq!(spline.value(1.25), 1.5625, epsilon = 1e-12);
        assert_relative_eq!(spline.slope(2.5), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_local_natural_ends() {
        let xs = vec![0.0, 1.0, 2.0, 3.0];
        let ys = vec![1.0, 0.97, 0.95, 0.94];
        let spline = fit(&SplineFitRequest::new("df", xs, ys).with_calibration(false));
        assert!(curvature(&spline, 0.0, 1.0).abs() < 1e-4);
        assert!(curvature(&spline, 3.0, -1.0).abs() < 1e-4);
    }

    #[test]
    fn test_weights_pull_slope_towards_trusted_side() {
        let xs = vec![0.0, 1.0, 2.0];
        let ys = vec![0.0, 1.0, 3.0];
        let unweighted = fit(&SplineFitRequest::new("w", xs.clone(), ys.clone()).with_calibration(false));
        let weighted = fit(
            &SplineFitRequest::new("w", xs, ys)
                .with_calibration(false)
                .with_weights(vec![1.0, 1.0, 9.0]),
        );
        assert_relative_eq!(unweighted.slope(1.0), 1.5, epsilon = 1e-12);
        assert_relative_eq!(weighted.slope(1.0), 0.1 * 1.0 + 0.9 * 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_one_and_two_knots() {
        let constant = fit(&SplineFitRequest::new("c", vec![1.0], vec![0.04]));
        assert_relative_eq!(constant.value(-3.0), 0.04);
        assert_relative_eq!(constant.value(7.0), 0.04);
        assert_relative_eq!(constant.slope(7.0), 0.0);

        let line = fit(&SplineFitRequest::new("l", vec![1.0, 2.0], vec![0.03, 0.05]));
        assert_relative_eq!(line.value(1.5), 0.04, epsilon = 1e-14);
        assert_relative_eq!(line.value(3.0), 0.07, epsilon = 1e-14);
        assert_relative_eq!(line.value(0.0), 0.01, epsilon = 1e-14);
    }

    #[test]
    fn test_linear_segment_is_a_chord() {
        let xs = vec![0.0, 1.0, 2.0, 3.0];
        let ys = vec![0.0, 1.0, 4.0, 9.0];
        let request = SplineFitRequest::new("mixed", xs, ys).with_segments(vec![
            SegmentBasis::Cubic,
            SegmentBasis::Linear,
            SegmentBasis::Cubic,
        ]);
        let spline = fit(&request);
        assert_relative_eq!(spline.value(1.5), 2.5, epsilon = 1e-14);
        assert_relative_eq!(spline.slope(1.25), 3.0, epsilon = 1e-14);

        let all_linear = fit(
            &SplineFitRequest::new("lin", vec![0.0, 1.0, 3.0], vec![0.0, 2.0, 3.0])
                .with_basis(SegmentBasis::Linear),
        );
        assert_relative_eq!(all_linear.value(2.0), 2.5, epsilon = 1e-14);
        assert_relative_eq!(all_linear.value(4.0), 3.5, epsilon = 1e-14);
    }

    #[test]
    fn test_fit_failures_name_the_request() {
        let bad_order = SplineFitRequest::new("libor", vec![0.0, 2.0, 1.0], vec![1.0, 2.0, 3.0]);
        let err = SplineFitter.fit(&bad_order).unwrap_err();
        assert!(matches!(&err, MathError::FitFailed { name, .. } if name == "libor"));

        let nan = SplineFitRequest::new("df", vec![0.0, 1.0, 2.0], vec![1.0, f64::NAN, 0.9]);
        assert!(SplineFitter.fit(&nan).is_err());

        let empty = SplineFitRequest::new("empty", vec![], vec![]);
        assert!(SplineFitter.fit(&empty).is_err());

        let weights = SplineFitRequest::new("w", vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0])
            .with_weights(vec![1.0, 1.0]);
        assert!(SplineFitter.fit(&weights).is_err());

        let zero_weight = SplineFitRequest::new("w", vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0])
            .with_weights(vec![1.0, 0.0, 1.0]);
        assert!(SplineFitter.fit(&zero_weight).is_err());

        let segments = SplineFitRequest::new("s", vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0])
            .with_segments(vec![SegmentBasis::Linear]);
        assert!(SplineFitter.fit(&segments).is_err());
    }

    fn knots() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
        prop::collection::vec((0.01f64..1.0, -0.05f64..0.1), 3..12).prop_map(|steps| {
            let mut x = 0.0;
            let mut xs = Vec::with_capacity(steps.len());
            let mut ys = Vec::with_capacity(steps.len());
            for (dx, y) in steps {
                x += dx;
                xs.push(x);
                ys.push(y);
            }
            (xs, ys)
        })
    }

    proptest! {
        #[test]
        fn prop_fits_interpolate_knots((xs, ys) in knots(), calibrate in any::<bool>()) {
            let request = SplineFitRequest::new("prop", xs.clone(), ys.clone())
                .with_calibration(calibrate);
            let spline = SplineFitter.fit(&request).unwrap();
            for (x, y) in xs.iter().zip(&ys) {
                prop_assert!((spline.value(*x) - y).abs() < 1e-10);
            }
        }

        #[test]
        fn prop_calibrated_fit_is_c1((xs, ys) in knots()) {
            let spline = SplineFitter.fit(&SplineFitRequest::new("prop", xs.clone(), ys)).unwrap();
            for i in 1..xs.len() - 1 {
                let left = spline.segment_slope(i - 1, xs[i]);
                let right = spline.segment_slope(i, xs[i]);
                prop_assert!((left - right).abs() < 1e-9 * (1.0 + left.abs()));
            }
        }
    }
}
