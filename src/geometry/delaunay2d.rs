//! Incremental Bowyer-Watson triangulation in the plane.

use bevy_math::DVec2;
use error_stack::report;

use crate::{MeshPlotError, Result};

/// Delaunay-triangulate a 2D point set. Cells come back with CCW winding
/// and indices into `points`. Coincident points are silently skipped; a
/// fully collinear or undersized set is an error.
pub(crate) fn triangulate(points: &[DVec2]) -> Result<Vec<[u32; 3]>> {
    if points.len() < 3 {
        return Err(report!(MeshPlotError::GeometryReconstruction).attach(format!(
            "Delaunay triangulation needs at least 3 points, got {}",
            points.len()
        )));
    }
    if let Some(bad) = points.iter().position(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(report!(MeshPlotError::GeometryReconstruction)
            .attach(format!("non-finite coordinate at point {bad}")));
    }

    let mut min = points[0];
    let mut max = points[0];
    for p in points {
        min = min.min(*p);
        max = max.max(*p);
    }
    let span = (max - min).max_element().max(1.0);
    let mid = (min + max) * 0.5;

    // Super-triangle vertices live past the real indices.
    let n = points.len();
    let supers = [
        DVec2::new(mid.x - 32.0 * span, mid.y - span),
        DVec2::new(mid.x + 32.0 * span, mid.y - span),
        DVec2::new(mid.x, mid.y + 32.0 * span),
    ];
    let vert = |i: usize| -> DVec2 {
        if i < n { points[i] } else { supers[i - n] }
    };

    let mut tris: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];

    for p in 0..n {
        let pt = points[p];

        let bad: Vec<usize> = tris
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                circumcircle(vert(t[0]), vert(t[1]), vert(t[2]))
                    .is_some_and(|(c, r2)| pt.distance_squared(c) < r2 * (1.0 - 1e-12))
            })
            .map(|(ti, _)| ti)
            .collect();
        if bad.is_empty() {
            // coincident with an existing site
            continue;
        }

        let mut edges: Vec<(usize, usize)> = Vec::new();
        for &ti in &bad {
            let t = tris[ti];
            edges.extend([(t[0], t[1]), (t[1], t[2]), (t[2], t[0])]);
        }
        // Cavity boundary: directed edges whose reverse is absent.
        let boundary: Vec<(usize, usize)> = edges
            .iter()
            .copied()
            .filter(|&(a, b)| !edges.contains(&(b, a)))
            .collect();

        for &ti in bad.iter().rev() {
            tris.swap_remove(ti);
        }
        for (a, b) in boundary {
            tris.push([a, b, p]);
        }
    }

    let mut cells: Vec<[u32; 3]> = Vec::new();
    for t in &tris {
        if t[0] >= n || t[1] >= n || t[2] >= n {
            continue;
        }
        let (a, b, c) = (vert(t[0]), vert(t[1]), vert(t[2]));
        let area2 = (b - a).perp_dot(c - a);
        if area2.abs() <= 1e-12 * span * span {
            continue;
        }
        if area2 < 0.0 {
            cells.push([t[0] as u32, t[2] as u32, t[1] as u32]);
        } else {
            cells.push([t[0] as u32, t[1] as u32, t[2] as u32]);
        }
    }
    if cells.is_empty() {
        return Err(report!(MeshPlotError::GeometryReconstruction)
            .attach("degenerate (collinear) point set"));
    }
    cells.sort_unstable();
    Ok(cells)
}

fn circumcircle(a: DVec2, b: DVec2, c: DVec2) -> Option<(DVec2, f64)> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() <= 1e-14 * (b - a).length() * (c - a).length() {
        return None;
    }
    let a2 = a.length_squared();
    let b2 = b.length_squared();
    let c2 = c.length_squared();
    let center = DVec2::new(
        (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    );
    Some((center, center.distance_squared(a)))
}
