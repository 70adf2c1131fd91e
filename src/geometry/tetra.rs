//! Incremental Bowyer-Watson Delaunay tetrahedralization.
//!
//! The union of the returned tetrahedra is the convex hull of the input,
//! which is what both hull and alpha-shape reconstruction consume.

use bevy_math::{DMat3, DVec3};
use error_stack::report;
use std::collections::{HashMap, HashSet};

use crate::{MeshPlotError, Result};

#[derive(Debug)]
pub(crate) struct Tet {
    pub verts: [usize; 4],
    pub center: DVec3,
    pub radius2: f64,
}

pub(crate) fn sorted3(mut f: [usize; 3]) -> [usize; 3] {
    f.sort_unstable();
    f
}

pub(crate) fn tetrahedralize(points: &[DVec3]) -> Result<Vec<Tet>> {
    if points.len() < 4 {
        return Err(report!(MeshPlotError::GeometryReconstruction).attach(format!(
            "volumetric reconstruction needs at least 4 points, got {}",
            points.len()
        )));
    }
    if let Some(bad) = points
        .iter()
        .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
    {
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

    let n = points.len();
    let supers = [
        mid + span * DVec3::new(-50.0, -50.0, -50.0),
        mid + span * DVec3::new(150.0, -50.0, -50.0),
        mid + span * DVec3::new(-50.0, 150.0, -50.0),
        mid + span * DVec3::new(-50.0, -50.0, 150.0),
    ];
    let vert = |i: usize| -> DVec3 {
        if i < n { points[i] } else { supers[i - n] }
    };

    let mut tets: Vec<Tet> = Vec::new();
    match make_tet([n, n + 1, n + 2, n + 3], &vert) {
        Some(t) => tets.push(t),
        None => {
            return Err(report!(MeshPlotError::GeometryReconstruction)
                .attach("failed to seed enclosing tetrahedron"));
        }
    }

    for p in 0..n {
        let pt = points[p];

        let bad: Vec<usize> = tets
            .iter()
            .enumerate()
            .filter(|(_, t)| pt.distance_squared(t.center) < t.radius2 * (1.0 - 1e-12))
            .map(|(ti, _)| ti)
            .collect();
        if bad.is_empty() {
            // coincident with an existing site
            continue;
        }

        let mut faces: Vec<[usize; 3]> = Vec::new();
        for &ti in &bad {
            let v = tets[ti].verts;
            faces.extend([
                [v[0], v[1], v[2]],
                [v[0], v[1], v[3]],
                [v[0], v[2], v[3]],
                [v[1], v[2], v[3]],
            ]);
        }
        let mut counts: HashMap<[usize; 3], usize> = HashMap::new();
        for f in &faces {
            *counts.entry(sorted3(*f)).or_insert(0) += 1;
        }

        for &ti in bad.iter().rev() {
            tets.swap_remove(ti);
        }

        // Re-triangulate the cavity: one new tet per boundary face.
        let mut seen: HashSet<[usize; 3]> = HashSet::new();
        for f in faces {
            let key = sorted3(f);
            if counts[&key] != 1 || !seen.insert(key) {
                continue;
            }
            if let Some(t) = make_tet([f[0], f[1], f[2], p], &vert) {
                tets.push(t);
            }
        }
    }

    let real: Vec<Tet> = tets
        .into_iter()
        .filter(|t| t.verts.iter().all(|&v| v < n))
        .collect();
    if real.is_empty() {
        return Err(report!(MeshPlotError::GeometryReconstruction)
            .attach("degenerate (coplanar or collinear) point set"));
    }
    Ok(real)
}

fn make_tet(verts: [usize; 4], vert: &impl Fn(usize) -> DVec3) -> Option<Tet> {
    let (a, b, c, d) = (vert(verts[0]), vert(verts[1]), vert(verts[2]), vert(verts[3]));
    let (ab, ac, ad) = (b - a, c - a, d - a);

    let det = ab.dot(ac.cross(ad));
    let scale = ab.length() * ac.length() * ad.length();
    if det.abs() <= 1e-12 * scale.max(f64::MIN_POSITIVE) {
        // flat tetrahedron
        return None;
    }

    // 2 (b-a) . x = |b|^2 - |a|^2 and cyclic, solved for the circumcenter.
    let m = DMat3::from_cols(ab, ac, ad).transpose();
    let rhs = 0.5
        * DVec3::new(
            b.length_squared() - a.length_squared(),
            c.length_squared() - a.length_squared(),
            d.length_squared() - a.length_squared(),
        );
    let center = m.inverse() * rhs;
    Some(Tet {
        verts,
        center,
        radius2: center.distance_squared(a),
    })
}
