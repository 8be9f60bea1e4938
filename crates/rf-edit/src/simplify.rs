//! Curve thinning (Ramer–Douglas–Peucker)
//!
//! Both axes are normalized to `[0, 1]` before measuring deviation, so a
//! tolerance means the same thing whether the lane runs in seconds or beats
//! and whether values span 0..1 or -96..12 dB.

use rf_core::{AutomationPoint, TIME_EPSILON};

/// Smallest usable tolerance
pub const MIN_THRESHOLD: f64 = 1e-6;

/// Axis ranges narrower than this are treated as flat
const COLLAPSED_RANGE: f64 = TIME_EPSILON;

/// Reduce a time-ordered point snapshot
///
/// Returns clones of the kept points, in their original order and with every
/// field (including ids) intact. The first and last points are always kept.
pub fn simplify_points(points: &[AutomationPoint], threshold: f64) -> Vec<AutomationPoint> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let coords = normalize(points);
    reduce_indices(&coords, threshold)
        .into_iter()
        .map(|idx| points[idx].clone())
        .collect()
}

/// Indices of the points to keep, ascending
///
/// `coords` are `(x, y)` pairs; the caller decides on normalization.
pub fn reduce_indices(coords: &[(f64, f64)], threshold: f64) -> Vec<usize> {
    let n = coords.len();
    if n <= 2 {
        return (0..n).collect();
    }

    let threshold = threshold.max(MIN_THRESHOLD);
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    // Work stack instead of recursion; dense recordings can run to 100k points
    let mut ranges = vec![(0, n - 1)];
    while let Some((start, end)) = ranges.pop() {
        if end <= start + 1 {
            continue;
        }

        let (a, b) = (coords[start], coords[end]);
        let mut max_dist = 0.0;
        let mut max_idx = start;
        for (i, &p) in coords.iter().enumerate().take(end).skip(start + 1) {
            let dist = perpendicular_distance(p, a, b);
            if dist > max_dist {
                max_dist = dist;
                max_idx = i;
            }
        }

        if max_dist > threshold {
            keep[max_idx] = true;
            ranges.push((start, max_idx));
            ranges.push((max_idx, end));
        }
    }

    keep.iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect()
}

/// Map time and value independently onto `[0, 1]`
fn normalize(points: &[AutomationPoint]) -> Vec<(f64, f64)> {
    let (mut t_min, mut t_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut v_min, mut v_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        t_min = t_min.min(p.time);
        t_max = t_max.max(p.time);
        v_min = v_min.min(p.value);
        v_max = v_max.max(p.value);
    }

    let t_range = span_or_unit(t_max - t_min);
    let v_range = span_or_unit(v_max - v_min);

    points
        .iter()
        .map(|p| ((p.time - t_min) / t_range, (p.value - v_min) / v_range))
        .collect()
}

#[inline]
fn span_or_unit(span: f64) -> f64 {
    if span < COLLAPSED_RANGE { 1.0 } else { span }
}

/// Distance from `p` to the line through `a` and `b`
fn perpendicular_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let len = (dx * dx + dy * dy).sqrt();

    if len < f64::EPSILON {
        // Degenerate chord
        let ex = p.0 - a.0;
        let ey = p.1 - a.1;
        return (ex * ex + ey * ey).sqrt();
    }

    ((p.0 - a.0) * dy - (p.1 - a.1) * dx).abs() / len
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rf_core::{CurveType, TimeRange};

    fn points(coords: &[(f64, f64)]) -> Vec<AutomationPoint> {
        coords
            .iter()
            .map(|&(t, v)| AutomationPoint::new(t, v))
            .collect()
    }

    fn times(points: &[AutomationPoint]) -> Vec<f64> {
        points.iter().map(|p| p.time).collect()
    }

    #[test]
    fn test_near_straight_line_reduces_to_endpoints() {
        let input = points(&[(0.0, 0.0), (1.0, 0.0001), (2.0, 0.0)]);
        let out = simplify_points(&input, 0.01);
        assert_eq!(times(&out), vec![0.0, 2.0]);
        assert_eq!(out[0].id, input[0].id);
        assert_eq!(out[1].id, input[2].id);
    }

    #[test]
    fn test_bent_line_is_kept() {
        let input = points(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        assert_eq!(simplify_points(&input, 0.01).len(), 3);
    }

    #[test]
    fn test_small_inputs_untouched() {
        assert!(simplify_points(&[], 0.1).is_empty());
        let one = points(&[(1.0, 0.5)]);
        assert_eq!(simplify_points(&one, 0.1), one);
        let two = points(&[(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(simplify_points(&two, 10.0), two);
    }

    #[test]
    fn test_collinear_ramp_collapses() {
        let input: Vec<_> = (0..50)
            .map(|i| AutomationPoint::new(i as f64 * 0.1, i as f64 * 0.02))
            .collect();
        let out = simplify_points(&input, 0.001);
        assert_eq!(out.len(), 2);
        assert_abs_diff_eq!(out[1].time, 4.9, epsilon = 1e-9);
    }

    #[test]
    fn test_shape_fields_survive() {
        let mut input = points(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        input[1].curve = CurveType::Bezier;
        input[1].tension = 0.4;
        input[1].label = Some("peak".into());
        let out = simplify_points(&input, 0.01);
        assert_eq!(out[1], input[1]);
    }

    #[test]
    fn test_axis_scale_does_not_matter() {
        // Same shape, values in dB instead of 0..1
        let a = points(&[(0.0, 0.0), (1.0, 0.3), (2.0, 0.45), (3.0, 1.0)]);
        let b: Vec<_> = a
            .iter()
            .map(|p| AutomationPoint::new(p.time * 100.0, p.value * 96.0 - 96.0))
            .collect();
        assert_eq!(
            simplify_points(&a, 0.05).len(),
            simplify_points(&b, 0.05).len()
        );
    }

    #[test]
    fn test_threshold_floor() {
        let input = points(&[(0.0, 0.0), (1.0, 0.5), (2.0, 1.0)]);
        // Exactly collinear: even a zero/negative/NaN tolerance must terminate
        assert_eq!(simplify_points(&input, 0.0).len(), 2);
        assert_eq!(simplify_points(&input, -1.0).len(), 2);
        assert_eq!(simplify_points(&input, f64::NAN).len(), 2);
    }

    #[test]
    fn test_degenerate_chord_uses_euclidean_distance() {
        let coords = [(0.0, 0.0), (0.5, 0.5), (0.0, 0.0)];
        assert_eq!(reduce_indices(&coords, 0.1), vec![0, 1, 2]);
        assert_abs_diff_eq!(
            perpendicular_distance((3.0, 4.0), (0.0, 0.0), (0.0, 0.0)),
            5.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_output_count_monotonic_in_threshold() {
        let input: Vec<_> = (0..200)
            .map(|i| {
                let t = i as f64 * 0.05;
                AutomationPoint::new(t, (t * 1.7).sin() * 0.5 + (t * 5.3).cos() * 0.1)
            })
            .collect();

        let mut previous = usize::MAX;
        for threshold in [0.0, 0.001, 0.005, 0.01, 0.05, 0.1, 0.3, 1.0, 5.0] {
            let out = simplify_points(&input, threshold);
            assert!(out.len() <= previous);
            assert!(!out.is_empty());
            assert_eq!(out.first().unwrap().id, input.first().unwrap().id);
            assert_eq!(out.last().unwrap().id, input.last().unwrap().id);
            previous = out.len();
        }
        assert_eq!(previous, 2);
    }

    #[test]
    fn test_result_is_time_ordered_subset() {
        let input: Vec<_> = (0..100)
            .map(|i| AutomationPoint::new(i as f64, ((i * 37) % 11) as f64))
            .collect();
        let out = simplify_points(&input, 0.05);
        assert!(out.windows(2).all(|w| w[0].time < w[1].time));
        let range = TimeRange::new(0.0, 99.0);
        assert!(out.iter().all(|p| range.contains(p.time)));
    }
}
