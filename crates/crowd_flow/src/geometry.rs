//! Polygon helpers for zone floor plans.
//!
//! Zones are arbitrary (possibly concave) polygons in the normalized viewport
//! space. Nothing here needs exact area-uniform results: the outputs are label
//! anchors, particle targets and particle spawn points.

use bevy::prelude::*;
use rand::Rng;

use crate::config::{SAMPLE_ATTEMPTS, SPAWN_JITTER};

/// Arithmetic mean of the vertices.
///
/// This is the vertex centroid, not the area centroid; for label placement and
/// arrival targets the difference does not matter. Returns `Vec2::ZERO` for an
/// empty list.
pub fn centroid(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }
    points.iter().copied().sum::<Vec2>() / points.len() as f32
}

/// Axis-aligned bounding box as `(min, max)`, or `None` for an empty list.
pub fn bounding_box(points: &[Vec2]) -> Option<(Vec2, Vec2)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
    )
}

#[inline]
pub fn squared_distance(a: Vec2, b: Vec2) -> f32 {
    a.distance_squared(b)
}

/// Ray-casting point-in-polygon test.
/// The polygon is implicitly closed (last vertex connects back to first).
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        // Does the ray from `point` going right cross edge (i, j)?
        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Uniformly random offset of length at most `radius`.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec2 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let r = radius * rng.gen::<f32>().sqrt();
    Vec2::new(angle.cos(), angle.sin()) * r
}

/// A random point inside the polygon.
///
/// Rejection-samples the bounding box with [`point_in_polygon`]. Polygons with
/// fewer than 3 points return the centroid plus up to one unit of jitter. After
/// `SAMPLE_ATTEMPTS` misses the centroid itself is returned, which biases thin
/// or strongly concave shapes towards their middle. A bounding box whose
/// extent is not finite also yields the centroid.
pub fn sample_interior<R: Rng + ?Sized>(points: &[Vec2], rng: &mut R) -> Vec2 {
    if points.len() < 3 {
        return centroid(points) + jitter(rng, SPAWN_JITTER);
    }
    let Some((lo, hi)) = bounding_box(points) else {
        return centroid(points);
    };
    if !(hi - lo).is_finite() {
        return centroid(points);
    }
    for _ in 0..SAMPLE_ATTEMPTS {
        let candidate = Vec2::new(rng.gen_range(lo.x..=hi.x), rng.gen_range(lo.y..=hi.y));
        if point_in_polygon(candidate, points) {
            return candidate;
        }
    }
    centroid(points)
}

/// Position of the exit closest to `point` (squared Euclidean distance).
///
/// Returns `point` itself when there are no exits, so a particle targeting it
/// is retired immediately instead of wandering.
pub fn nearest_exit(exits: &[Vec2], point: Vec2) -> Vec2 {
    exits
        .iter()
        .copied()
        .min_by(|a, b| {
            squared_distance(*a, point).total_cmp(&squared_distance(*b, point))
        })
        .unwrap_or(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(10.0, 10.0),
            Vec2::new(30.0, 10.0),
            Vec2::new(30.0, 30.0),
            Vec2::new(10.0, 30.0),
        ]
    }

    #[test]
    fn test_centroid_of_square() {
        assert_eq!(centroid(&square()), Vec2::new(20.0, 20.0));
    }

    #[test]
    fn test_centroid_is_vertex_mean_not_area() {
        // Extra vertex on one edge pulls the vertex mean but not the area centroid.
        let mut pts = square();
        pts.insert(1, Vec2::new(20.0, 10.0));
        let c = centroid(&pts);
        assert!((c.x - 20.0).abs() < 1e-4);
        assert!((c.y - 18.0).abs() < 1e-4);
    }

    #[test]
    fn test_bounding_box() {
        let (lo, hi) = bounding_box(&square()).unwrap();
        assert_eq!(lo, Vec2::new(10.0, 10.0));
        assert_eq!(hi, Vec2::new(30.0, 30.0));
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_point_in_polygon_triangle() {
        let tri = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(5.0, 10.0)];
        assert!(point_in_polygon(Vec2::new(5.0, 5.0), &tri));
        assert!(!point_in_polygon(Vec2::new(0.0, 10.0), &tri));
        assert!(!point_in_polygon(Vec2::new(20.0, 5.0), &tri));
    }

    #[test]
    fn test_point_in_polygon_concave_notch() {
        // U shape: the notch between the arms is outside.
        let u = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(30.0, 0.0),
            Vec2::new(30.0, 30.0),
            Vec2::new(20.0, 30.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 30.0),
            Vec2::new(0.0, 30.0),
        ];
        assert!(point_in_polygon(Vec2::new(5.0, 20.0), &u));
        assert!(!point_in_polygon(Vec2::new(15.0, 20.0), &u));
    }

    #[test]
    fn test_point_in_polygon_insufficient_vertices() {
        let line = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0)];
        assert!(!point_in_polygon(Vec2::new(5.0, 5.0), &line));
    }

    #[test]
    fn test_sample_interior_convex_always_inside() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let sq = square();
        for _ in 0..1000 {
            let p = sample_interior(&sq, &mut rng);
            assert!(point_in_polygon(p, &sq), "{p:?} escaped the square");
        }
    }

    #[test]
    fn test_sample_interior_degenerate_stays_near_centroid() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let pts = vec![Vec2::new(4.0, 4.0), Vec2::new(6.0, 6.0)];
        for _ in 0..100 {
            let p = sample_interior(&pts, &mut rng);
            assert!(p.distance(Vec2::new(5.0, 5.0)) <= SPAWN_JITTER + 1e-4);
        }
    }

    #[test]
    fn test_sample_interior_sliver_falls_back_to_centroid() {
        // Zero-area polygon: every draw misses, so the budget runs out.
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let sliver = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)];
        assert_eq!(sample_interior(&sliver, &mut rng), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_nearest_exit_picks_closest() {
        let exits = vec![Vec2::new(0.0, 0.0), Vec2::new(50.0, 50.0), Vec2::new(90.0, 10.0)];
        assert_eq!(nearest_exit(&exits, Vec2::new(80.0, 5.0)), Vec2::new(90.0, 10.0));
        assert_eq!(nearest_exit(&exits, Vec2::new(45.0, 40.0)), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_nearest_exit_single_exit_always_wins() {
        let exits = vec![Vec2::new(12.0, 34.0)];
        for q in [Vec2::ZERO, Vec2::new(99.0, 62.0), Vec2::new(12.0, 34.0)] {
            assert_eq!(nearest_exit(&exits, q), Vec2::new(12.0, 34.0));
        }
    }

    #[test]
    fn test_nearest_exit_empty_returns_query() {
        let q = Vec2::new(7.0, 8.0);
        assert_eq!(nearest_exit(&[], q), q);
    }

    #[test]
    fn test_sample_interior_unbounded_extent_returns_centroid() {
        let pts = vec![
            Vec2::new(-3e38, 0.0),
            Vec2::new(3e38, 0.0),
            Vec2::new(0.0, 10.0),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(sample_interior(&pts, &mut rng), centroid(&pts));
    }

    #[test]
    fn test_jitter_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..500 {
            assert!(jitter(&mut rng, 1.0).length() <= 1.0 + 1e-5);
        }
    }
}
