//! Software clipping against convex regions.
//!
//! Polygons go through Sutherland–Hodgman, segments through Cyrus–Beck.
//! Both assume the clip polygon is convex, which holds for every region the
//! canvas can produce (rectangles and circles).

use itertools::Itertools;

use super::canvas::ClipRegion;
use super::{pt, Point};

const CIRCLE_SEGMENTS: usize = 64;

/// Convex polygon standing in for a clip region, counter-clockwise in a
/// y-down frame (positive signed area).
pub fn region_polygon(region: &ClipRegion) -> Vec<Point> {
    let poly = match *region {
        ClipRegion::Rect(rect) => rect.corners().to_vec(),
        ClipRegion::Circle { center, radius } => (0..CIRCLE_SEGMENTS)
            .map(|i| {
                let a = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
                pt(center.x + radius * a.cos(), center.y + radius * a.sin())
            })
            .collect(),
    };
    if signed_area(&poly) < 0.0 {
        poly.into_iter().rev().collect()
    } else {
        poly
    }
}

pub fn signed_area(poly: &[Point]) -> f32 {
    poly.iter()
        .circular_tuple_windows()
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum::<f32>()
        * 0.5
}

fn cross(a: Point, b: Point, p: Point) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn intersect_line(s: Point, e: Point, a: Point, b: Point) -> Point {
    let ds = cross(a, b, s);
    let de = cross(a, b, e);
    let denom = ds - de;
    if denom.abs() <= f32::EPSILON {
        return s;
    }
    s.lerp(e, ds / denom)
}

/// Part of `subject` lying inside the convex `clip` polygon.
pub fn clip_polygon(subject: &[Point], clip: &[Point]) -> Vec<Point> {
    let mut output = subject.to_vec();
    for (&a, &b) in clip.iter().circular_tuple_windows() {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        for (&s, &e) in input.iter().circular_tuple_windows() {
            let s_in = cross(a, b, s) >= 0.0;
            let e_in = cross(a, b, e) >= 0.0;
            match (s_in, e_in) {
                (true, true) => output.push(e),
                (true, false) => output.push(intersect_line(s, e, a, b)),
                (false, true) => {
                    output.push(intersect_line(s, e, a, b));
                    output.push(e);
                }
                (false, false) => {}
            }
        }
    }
    if output.len() < 3 { Vec::new() } else { output }
}

pub fn clip_segment(a: Point, b: Point, clip: &[Point]) -> Option<(Point, Point)> {
    let mut t_enter = 0.0f32;
    let mut t_exit = 1.0f32;
    let d = pt(b.x - a.x, b.y - a.y);

    for (&p0, &p1) in clip.iter().circular_tuple_windows() {
        // Inward normal for a positively oriented polygon in a y-down frame.
        let normal = pt(-(p1.y - p0.y), p1.x - p0.x);
        let num = normal.x * (a.x - p0.x) + normal.y * (a.y - p0.y);
        let den = normal.x * d.x + normal.y * d.y;

        if den.abs() <= f32::EPSILON {
            if num < 0.0 {
                return None;
            }
            continue;
        }
        let t = -num / den;
        if den > 0.0 {
            t_enter = t_enter.max(t);
        } else {
            t_exit = t_exit.min(t);
        }
        if t_enter > t_exit {
            return None;
        }
    }
    Some((a.lerp(b, t_enter), a.lerp(b, t_exit)))
}
