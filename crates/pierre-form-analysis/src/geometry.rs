// ABOUTME: Vector math over pose landmarks: included angles, tilt from vertical, line offsets
// ABOUTME: Degenerate segments resolve to a straight joint instead of NaN
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use pierre_form_core::constants::landmarks::{MIN_SEGMENT_LENGTH, STRAIGHT_JOINT_DEGREES};
use pierre_form_core::models::PoseLandmark;

fn delta(from: &PoseLandmark, to: &PoseLandmark) -> [f64; 3] {
    [to.x - from.x, to.y - from.y, to.z - from.z]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0].mul_add(b[0], a[1].mul_add(b[1], a[2] * b[2]))
}

fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

/// Included angle at `vertex` between the segments to `a` and `c`, in degrees
///
/// Uses the 3-D dot product with the cosine clamped to [-1, 1]. Returns
/// 180 when either segment is shorter than `MIN_SEGMENT_LENGTH`.
#[must_use]
pub fn included_angle(a: &PoseLandmark, vertex: &PoseLandmark, c: &PoseLandmark) -> f64 {
    let v1 = delta(vertex, a);
    let v2 = delta(vertex, c);
    let (m1, m2) = (norm(v1), norm(v2));
    if m1 < MIN_SEGMENT_LENGTH || m2 < MIN_SEGMENT_LENGTH {
        return STRAIGHT_JOINT_DEGREES;
    }
    let cos = (dot(v1, v2) / (m1 * m2)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Tilt of the segment `lower -> upper` away from image vertical, in degrees
///
/// Image y grows downward, so an upright segment has `upper.y < lower.y` and
/// a tilt of 0. A horizontal segment is 90, an inverted one approaches 180.
#[must_use]
pub fn tilt_from_vertical(lower: &PoseLandmark, upper: &PoseLandmark) -> f64 {
    let dx = (upper.x - lower.x).abs();
    let rise = lower.y - upper.y;
    if dx < MIN_SEGMENT_LENGTH && rise.abs() < MIN_SEGMENT_LENGTH {
        return 0.0;
    }
    dx.atan2(rise).to_degrees()
}

/// Vertical offset of `point` from the image-plane line through `a` and `b`
///
/// Positive when the point sits below the line (larger y). `None` when the
/// line is too close to vertical to interpolate.
#[must_use]
pub fn offset_below_line(a: &PoseLandmark, b: &PoseLandmark, point: &PoseLandmark) -> Option<f64> {
    let run = b.x - a.x;
    if run.abs() < MIN_SEGMENT_LENGTH {
        return None;
    }
    let t = (point.x - a.x) / run;
    let line_y = t.mul_add(b.y - a.y, a.y);
    Some(point.y - line_y)
}

/// Yaw implied by a left/right landmark pair: 0 when the pair spans the
/// image width, 90 when it spans only depth
#[must_use]
pub fn pair_yaw(left: &PoseLandmark, right: &PoseLandmark) -> f64 {
    let dx = (left.x - right.x).abs();
    let dz = (left.z - right.z).abs();
    if dx < MIN_SEGMENT_LENGTH && dz < MIN_SEGMENT_LENGTH {
        return 0.0;
    }
    dz.atan2(dx).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64) -> PoseLandmark {
        PoseLandmark::new(x, y, 0.0, 1.0)
    }

    #[test]
    fn test_straight_and_right_angles() {
        let straight = included_angle(&point(0.0, 0.0), &point(0.5, 0.0), &point(1.0, 0.0));
        assert!((straight - 180.0).abs() < 1e-6);
        let right = included_angle(&point(0.0, 0.0), &point(0.5, 0.0), &point(0.5, 0.5));
        assert!((right - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_segment_is_straight() {
        let p = point(0.3, 0.3);
        assert!((included_angle(&p, &p, &point(0.9, 0.9)) - 180.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_depth_contributes_to_angle() {
        let a = PoseLandmark::new(0.5, 0.5, -0.2, 1.0);
        let vertex = PoseLandmark::new(0.5, 0.5, 0.0, 1.0);
        let c = PoseLandmark::new(0.7, 0.5, 0.0, 1.0);
        assert!((included_angle(&a, &vertex, &c) - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_tilt_from_vertical() {
        assert!(tilt_from_vertical(&point(0.5, 0.8), &point(0.5, 0.4)).abs() < 1e-6);
        let forty_five = tilt_from_vertical(&point(0.5, 0.8), &point(0.7, 0.6));
        assert!((forty_five - 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_offset_below_line() {
        let sag = offset_below_line(&point(0.2, 0.5), &point(0.8, 0.5), &point(0.5, 0.6));
        assert!(sag.is_some_and(|v| (v - 0.1).abs() < 1e-9));
        assert!(offset_below_line(&point(0.5, 0.2), &point(0.5, 0.8), &point(0.5, 0.5)).is_none());
    }

    #[test]
    fn test_pair_yaw_front_and_side() {
        let front = pair_yaw(&point(0.6, 0.3), &point(0.4, 0.3));
        assert!(front.abs() < 1e-6);
        let side = pair_yaw(
            &PoseLandmark::new(0.5, 0.3, -0.1, 1.0),
            &PoseLandmark::new(0.5, 0.3, 0.1, 1.0),
        );
        assert!((side - 90.0).abs() < 1e-6);
    }
}
