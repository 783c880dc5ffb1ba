//! # Outline
//!
//! Converts a list of freehand samples into the boundary polygon of a variable-width stroke.
//!
//! This happens in two passes: first the samples are streamlined into [`StrokePoint`]s, carrying
//! direction and running length. Then each stroke point is offset to its left and right by a radius
//! derived from (real or simulated) pressure, the two sides are joined with round caps, and the
//! result is walked as one closed polygon: left side, end cap, right side reversed, start cap.

use super::Point;

/// Scales the nominal stroke width into the width model's `size`.
pub const SIZE_PER_STROKE_WIDTH: f32 = 4.25;
/// How quickly simulated pressure follows sample spacing.
const RATE_OF_PRESSURE_CHANGE: f32 = 0.275;
// Slightly more than a half turn, so that caps overlap their sides instead of leaving a seam.
const FIXED_PI: f32 = std::f32::consts::PI + 0.0001;
const CAP_STEP: f32 = 1.0 / 13.0;
const END_CAP_STEP: f32 = 1.0 / 29.0;
/// Pressure assumed for the first sample if the device reports none.
const FIRST_PRESSURE: f32 = 0.25;
/// Pressure assumed for every other sample if the device reports none.
const DEFAULT_PRESSURE: f32 = 0.5;

/// Ease-out-sine, used for pressure to width.
#[must_use]
pub fn ease_out_sine(t: f32) -> f32 {
    (t * std::f32::consts::FRAC_PI_2).sin()
}
fn ease_out_quad(t: f32) -> f32 {
    t * (2.0 - t)
}
fn ease_out_cubic(t: f32) -> f32 {
    let t = t - 1.0;
    t * t * t + 1.0
}

#[derive(Copy, Clone, Debug)]
pub struct OutlineOptions {
    /// Base diameter of the stroke.
    pub size: f32,
    /// How much pressure affects the radius. Zero is a constant-width stroke.
    pub thinning: f32,
    /// Minimum spacing between emitted side points, as a fraction of `size`.
    pub smoothing: f32,
    /// How far the drawn line lags behind the raw samples, `[0, 1]`.
    pub streamline: f32,
    /// Derive pressure from sample spacing instead of the reported values.
    pub simulate_pressure: bool,
    /// Pressure to radius curve.
    pub easing: fn(f32) -> f32,
    /// Length over which the start narrows to a point. Zero disables.
    pub taper_start: f32,
    /// Length over which the end narrows to a point. Zero disables.
    pub taper_end: f32,
    pub cap_start: bool,
    pub cap_end: bool,
    /// The final sample is authoritative end-cap data, not to be streamlined away.
    pub last: bool,
}
impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            size: 16.0,
            thinning: 0.5,
            smoothing: 0.5,
            streamline: 0.5,
            simulate_pressure: true,
            easing: |t| t,
            taper_start: 0.0,
            taper_end: 0.0,
            cap_start: true,
            cap_end: true,
            last: false,
        }
    }
}
impl OutlineOptions {
    /// The settings used for whiteboard strokes.
    #[must_use]
    pub fn for_stroke(stroke_width: f32, simulate_pressure: bool, is_final: bool) -> Self {
        Self {
            size: stroke_width * SIZE_PER_STROKE_WIDTH,
            thinning: 0.6,
            smoothing: 0.5,
            streamline: 0.5,
            simulate_pressure,
            easing: ease_out_sine,
            last: is_final,
            ..Default::default()
        }
    }
}

/// A streamlined sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StrokePoint {
    pub point: Point,
    pub pressure: f32,
    /// Unit vector from this point back towards the previous.
    pub vector: Point,
    /// Distance from the previous point.
    pub distance: f32,
    /// Total length up to and including this point.
    pub running_length: f32,
}

/// Build the closed outline polygon of a freehand stroke.
///
/// `pressures`, when present, must be parallel to `points`. When absent, pressure is simulated from
/// sample spacing.
#[must_use]
pub fn build_outline(
    points: &[Point],
    pressures: Option<&[f32]>,
    stroke_width: f32,
    is_final_stroke: bool,
) -> Vec<Point> {
    let options = OutlineOptions::for_stroke(stroke_width, pressures.is_none(), is_final_stroke);
    build_outline_with(points, pressures, &options)
}

/// [`build_outline`] with explicit options.
#[must_use]
pub fn build_outline_with(
    points: &[Point],
    pressures: Option<&[f32]>,
    options: &OutlineOptions,
) -> Vec<Point> {
    if let Some(pressures) = pressures {
        debug_assert_eq!(
            pressures.len(),
            points.len(),
            "pressures must parallel points"
        );
        if pressures.len() != points.len() {
            return Vec::new();
        }
    }
    let mut samples: Vec<(Point, Option<f32>)> = points
        .iter()
        .enumerate()
        .map(|(idx, &point)| (point, pressures.map(|p| p[idx])))
        .collect();
    nudge_degenerate(&mut samples);

    let stroke = stroke_points(&samples, options);
    outline_points(&stroke, options)
}

/// If the terminal sample sits exactly on the first one (a click without drag), push it
/// off by [`super::DOT_EPSILON`] so the outline has area.
fn nudge_degenerate(samples: &mut [(Point, Option<f32>)]) {
    if let [(first, _), .., (last, _)] = samples {
        *last = nudge_terminal(*first, *last);
    }
}

/// Returns `terminal`, nudged by [`super::DOT_EPSILON`] on both axes if it coincides with `first`.
#[must_use]
pub fn nudge_terminal(first: Point, terminal: Point) -> Point {
    if first == terminal {
        terminal.add(Point::new(super::DOT_EPSILON, super::DOT_EPSILON))
    } else {
        terminal
    }
}

/// Simulated pressure of a sample `distance` away from the last, given the previous pressure.
/// Quickly spaced (fast) samples thin the stroke, tightly spaced samples thicken it.
#[must_use]
pub fn simulate_pressure(previous: f32, distance: f32, size: f32) -> f32 {
    let spacing = (distance / size).min(1.0);
    let rest = (1.0 - spacing).min(1.0);
    (previous + (rest - previous) * (spacing * RATE_OF_PRESSURE_CHANGE)).min(1.0)
}

/// Radius of the stroke at the given pressure.
#[must_use]
pub fn stroke_radius(size: f32, thinning: f32, pressure: f32, easing: fn(f32) -> f32) -> f32 {
    size * easing(0.5 - thinning * (0.5 - pressure))
}

/// Streamline raw samples into stroke points.
#[must_use]
pub fn stroke_points(samples: &[(Point, Option<f32>)], options: &OutlineOptions) -> Vec<StrokePoint> {
    let Some(&first) = samples.first() else {
        return Vec::new();
    };
    let t = 0.15 + (1.0 - options.streamline) * 0.85;

    let mut samples = samples.to_vec();
    // Two samples is too few to streamline, fill in between.
    if let [start, end] = samples[..] {
        samples.truncate(1);
        for i in 1..5 {
            let f = i as f32 / 4.0;
            let pressure = start.1.zip(end.1).map(|(a, b)| a + (b - a) * f);
            samples.push((start.0.lerp(end.0, f), pressure));
        }
    }
    // One sample is a dot, give it somewhere to go.
    if samples.len() == 1 {
        samples.push((first.0.add(Point::new(1.0, 1.0)), first.1));
    }

    let mut out = Vec::with_capacity(samples.len());
    out.push(StrokePoint {
        point: first.0,
        pressure: first.1.filter(|p| *p >= 0.0).unwrap_or(FIRST_PRESSURE),
        vector: Point::new(1.0, 1.0),
        distance: 0.0,
        running_length: 0.0,
    });

    let max = samples.len() - 1;
    let mut has_reached_minimum_length = false;
    let mut running_length = 0.0;
    for (i, &(sample, pressure)) in samples.iter().enumerate().skip(1) {
        // Always Some - seeded above.
        let Some(&prev) = out.last() else { break };
        let point = if options.last && i == max {
            sample
        } else {
            prev.point.lerp(sample, t)
        };
        if point == prev.point {
            continue;
        }
        let distance = point.distance(prev.point);
        running_length += distance;
        // Skip ahead until the line is long enough to have a meaningful direction.
        if i < max && !has_reached_minimum_length {
            if running_length < options.size {
                continue;
            }
            has_reached_minimum_length = true;
        }
        out.push(StrokePoint {
            point,
            pressure: pressure.filter(|p| *p >= 0.0).unwrap_or(DEFAULT_PRESSURE),
            vector: prev.point.sub(point).normalized(),
            distance,
            running_length,
        });
    }
    let second_vector = out.get(1).map_or(Point::ZERO, |p| p.vector);
    out[0].vector = second_vector;
    out
}

/// Offset stroke points into a closed outline.
#[allow(clippy::too_many_lines)]
#[must_use]
pub fn outline_points(points: &[StrokePoint], options: &OutlineOptions) -> Vec<Point> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let size = options.size;
    if !(size > 0.0) {
        return Vec::new();
    }
    let total_length = last.running_length;
    let (taper_start, taper_end) = (options.taper_start, options.taper_end);
    let min_distance = (size * options.smoothing).powi(2);

    let mut left = Vec::<Point>::with_capacity(points.len());
    let mut right = Vec::<Point>::with_capacity(points.len());

    // Seed pressure from the first few points, so the start isn't a blob.
    let mut prev_pressure = points.iter().take(10).fold(first.pressure, |acc, curr| {
        let pressure = if options.simulate_pressure {
            simulate_pressure(acc, curr.distance, size)
        } else {
            curr.pressure
        };
        (acc + pressure) / 2.0
    });
    let mut radius = stroke_radius(size, options.thinning, last.pressure, options.easing);
    let mut first_radius = None;
    let mut prev_vector = first.vector;
    let mut pl = first.point;
    let mut pr = first.point;
    let mut is_prev_sharp = false;

    let n = points.len();
    for (i, sp) in points.iter().enumerate() {
        let is_last = i == n - 1;
        let mut pressure = sp.pressure;
        // Points within the final few pixels are swallowed by the end cap.
        if !is_last && total_length - sp.running_length < 3.0 {
            continue;
        }
        if options.thinning == 0.0 {
            radius = size / 2.0;
        } else {
            if options.simulate_pressure {
                pressure = simulate_pressure(prev_pressure, sp.distance, size);
            }
            radius = stroke_radius(size, options.thinning, pressure, options.easing);
        }
        first_radius.get_or_insert(radius);

        let ts = if sp.running_length < taper_start {
            ease_out_quad(sp.running_length / taper_start)
        } else {
            1.0
        };
        let remaining = total_length - sp.running_length;
        let te = if remaining < taper_end {
            ease_out_cubic(remaining / taper_end)
        } else {
            1.0
        };
        radius = (radius * ts.min(te)).max(0.01);

        let next_vector = if is_last {
            sp.vector
        } else {
            points[i + 1].vector
        };
        let next_dpr = if is_last {
            1.0
        } else {
            sp.vector.dot(next_vector)
        };
        let prev_dpr = sp.vector.dot(prev_vector);
        let is_sharp = prev_dpr < 0.0 && !is_prev_sharp;
        let is_next_sharp = next_dpr < 0.0;

        // Hairpin: swing a half circle around the point instead of crossing the sides.
        if is_sharp || is_next_sharp {
            let offset = prev_vector.perpendicular().mul(radius);
            let (mut tl, mut tr) = (pl, pr);
            let mut t = 0.0;
            while t <= 1.0 {
                tl = sp.point.sub(offset).rotate_about(sp.point, FIXED_PI * t);
                left.push(tl);
                tr = sp.point.add(offset).rotate_about(sp.point, FIXED_PI * -t);
                right.push(tr);
                t += CAP_STEP;
            }
            pl = tl;
            pr = tr;
            if is_next_sharp {
                is_prev_sharp = true;
            }
            continue;
        }
        is_prev_sharp = false;

        if is_last {
            let offset = sp.vector.perpendicular().mul(radius);
            left.push(sp.point.sub(offset));
            right.push(sp.point.add(offset));
            continue;
        }

        let offset = next_vector
            .lerp(sp.vector, next_dpr)
            .perpendicular()
            .mul(radius);
        let tl = sp.point.sub(offset);
        if i <= 1 || pl.distance_squared(tl) > min_distance {
            left.push(tl);
            pl = tl;
        }
        let tr = sp.point.add(offset);
        if i <= 1 || pr.distance_squared(tr) > min_distance {
            right.push(tr);
            pr = tr;
        }
        prev_pressure = pressure;
        prev_vector = sp.vector;
    }

    let first_point = first.point;
    let last_point = if n > 1 {
        last.point
    } else {
        first.point.add(Point::new(1.0, 1.0))
    };

    if n == 1 {
        if (taper_start == 0.0 && taper_end == 0.0) || options.last {
            // Just a dot.
            let start = first_point.project(
                first_point.sub(last_point).perpendicular().normalized(),
                -first_radius.unwrap_or(radius),
            );
            let mut dot = Vec::with_capacity(13);
            let mut t = CAP_STEP;
            while t <= 1.0 {
                dot.push(start.rotate_about(first_point, FIXED_PI * 2.0 * t));
                t += CAP_STEP;
            }
            return dot;
        }
        left.extend(right.into_iter().rev());
        return left;
    }

    let mut start_cap = Vec::new();
    if taper_start == 0.0 {
        if let (Some(&l0), Some(&r0)) = (left.first(), right.first()) {
            if options.cap_start {
                let mut t = CAP_STEP;
                while t <= 1.0 {
                    start_cap.push(r0.rotate_about(first_point, FIXED_PI * t));
                    t += CAP_STEP;
                }
            } else {
                let corners = l0.sub(r0);
                let (a, b) = (corners.mul(0.5), corners.mul(0.51));
                start_cap.extend([
                    first_point.sub(a),
                    first_point.sub(b),
                    first_point.add(b),
                    first_point.add(a),
                ]);
            }
        }
    }

    let mut end_cap = Vec::new();
    let direction = last.vector.neg().perpendicular();
    if taper_end != 0.0 {
        end_cap.push(last_point);
    } else if options.cap_end {
        let start = last_point.project(direction, radius);
        let mut t = END_CAP_STEP;
        while t < 1.0 {
            end_cap.push(start.rotate_about(last_point, FIXED_PI * 3.0 * t));
            t += END_CAP_STEP;
        }
    } else {
        end_cap.extend([
            last_point.add(direction.mul(radius)),
            last_point.add(direction.mul(radius * 0.99)),
            last_point.sub(direction.mul(radius * 0.99)),
            last_point.sub(direction.mul(radius)),
        ]);
    }

    let mut outline = left;
    outline.reserve(end_cap.len() + right.len() + start_cap.len());
    outline.extend(end_cap);
    outline.extend(right.into_iter().rev());
    outline.extend(start_cap);
    outline
}

#[cfg(test)]
mod test {
    use super::*;

    fn line(count: usize, spacing: f32) -> Vec<Point> {
        (0..count)
            .map(|i| Point::new(i as f32 * spacing, 0.0))
            .collect()
    }
    fn max_x(outline: &[Point]) -> f32 {
        outline.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max)
    }

    #[test]
    fn deterministic() {
        let points: Vec<_> = (0..40)
            .map(|i| {
                let t = i as f32 * 0.3;
                Point::new(t.cos() * 30.0 + t * 5.0, t.sin() * 20.0)
            })
            .collect();
        let pressures: Vec<_> = (0..40).map(|i| (i as f32 / 40.0).sqrt()).collect();

        for pressures in [None, Some(pressures.as_slice())] {
            for is_final in [false, true] {
                let a = build_outline(&points, pressures, 2.0, is_final);
                let b = build_outline(&points, pressures, 2.0, is_final);
                assert!(!a.is_empty());
                let a: &[u8] = bytemuck::cast_slice(&a);
                let b: &[u8] = bytemuck::cast_slice(&b);
                assert_eq!(a, b);
            }
        }
    }
    #[test]
    fn empty_input_is_empty() {
        assert!(build_outline(&[], None, 1.0, true).is_empty());
    }
    #[test]
    fn single_point_is_dot() {
        let outline = build_outline(&[Point::new(5.0, 5.0)], None, 2.0, false);
        assert!(outline.len() > 3);
        // Every vertex sits within a small radius of the sample.
        for p in &outline {
            assert!(p.distance(Point::new(5.0, 5.0)) < 2.0 * SIZE_PER_STROKE_WIDTH);
        }
    }
    #[test]
    fn click_has_area() {
        let outline = build_outline(&[Point::ZERO, Point::ZERO], None, 1.0, true);
        assert!(outline.len() > 3);
        let spread = outline
            .iter()
            .map(|p| p.distance(outline[0]))
            .fold(0.0_f32, f32::max);
        assert!(spread > 0.1);
    }
    #[test]
    fn nudge_only_when_coincident() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(nudge_terminal(p, Point::new(3.0, 5.0)), Point::new(3.0, 5.0));
        let nudged = nudge_terminal(p, p);
        assert_ne!(nudged, p);
        assert!((nudged.x - p.x - crate::geometry::DOT_EPSILON).abs() < 1e-6);
    }
    #[test]
    fn final_stroke_keeps_tail() {
        let points = line(20, 10.0);
        let final_outline = build_outline(&points, None, 1.0, true);
        let live_outline = build_outline(&points, None, 1.0, false);
        let end = points.last().unwrap().x;
        // Committed strokes reach (past) their final sample, live ones lag behind it.
        assert!(max_x(&final_outline) > end);
        assert!(max_x(&final_outline) > max_x(&live_outline));
    }
    #[test]
    fn simulated_pressure_thins_fast_strokes() {
        let size = 4.25;
        let slow = simulate_pressure(0.5, 0.01 * size, size);
        let fast = simulate_pressure(0.5, size, size);
        assert!(fast < slow);
        // Beyond `size`, spacing saturates.
        assert_eq!(simulate_pressure(0.5, 10.0 * size, size), fast);
    }
    #[test]
    fn radius_follows_pressure() {
        let light = stroke_radius(4.25, 0.6, 0.1, ease_out_sine);
        let heavy = stroke_radius(4.25, 0.6, 0.9, ease_out_sine);
        assert!(light < heavy);
        assert!(heavy <= 4.25);
    }
    #[test]
    fn easing_endpoints() {
        assert_eq!(ease_out_sine(0.0), 0.0);
        assert!((ease_out_sine(1.0) - 1.0).abs() < 1e-6);
    }
    #[test]
    fn reported_pressure_widens_outline() {
        let points = line(30, 3.0);
        let light = vec![0.05; points.len()];
        let heavy = vec![1.0; points.len()];
        let span = |pressures: &[f32]| {
            let outline = build_outline(&points, Some(pressures), 2.0, true);
            let (min, max) = outline.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
                (lo.min(p.y), hi.max(p.y))
            });
            max - min
        };
        assert!(span(&light) < span(&heavy));
    }
}
