//! Triangle-list reconstruction from mapped 3D positions.
//!
//! Four interchangeable modes: explicit index triples, convex hull,
//! alpha-shape carving, and axis-projected Delaunay triangulation.

mod delaunay2d;
mod tetra;

use bevy_math::{DVec2, DVec3};
use error_stack::report;
use std::collections::HashMap;

use crate::trace::{DelaunayAxis, TraceSpec};
use crate::{MeshPlotError, Result};

use tetra::{Tet, sorted3};

/// Reconstruction mode, chosen once per update from the trace fields.
#[derive(Clone, Debug, PartialEq)]
pub enum ReconstructionMode {
    /// Caller-supplied index triples, zipped verbatim into cells.
    Explicit {
        i: Vec<u32>,
        j: Vec<u32>,
        k: Vec<u32>,
    },
    /// Triangulated boundary of the convex hull.
    ConvexHull,
    /// Alpha-complex surface: boundary of the Delaunay tetrahedra whose
    /// circumradius is at most `radius`. Converges to the hull as the
    /// radius grows.
    AlphaShape { radius: f64 },
    /// Drop one axis and Delaunay-triangulate the remaining plane.
    ProjectedDelaunay { axis: DelaunayAxis },
}

impl ReconstructionMode {
    /// First match wins: explicit indices, then `alphahull == 0` (hull),
    /// then `alphahull > 0` (alpha shape), else projected Delaunay.
    pub fn select(spec: &TraceSpec) -> Self {
        if let (Some(i), Some(j), Some(k)) = (&spec.i, &spec.j, &spec.k) {
            return Self::Explicit {
                i: i.clone(),
                j: j.clone(),
                k: k.clone(),
            };
        }
        if spec.alphahull == 0.0 {
            Self::ConvexHull
        } else if spec.alphahull > 0.0 {
            Self::AlphaShape {
                radius: spec.alphahull,
            }
        } else {
            Self::ProjectedDelaunay {
                axis: spec.delaunayaxis,
            }
        }
    }
}

/// Produce the cell list for `positions` under the given mode.
pub fn reconstruct(mode: &ReconstructionMode, positions: &[DVec3]) -> Result<Vec<[u32; 3]>> {
    if positions.len() < 3 {
        return Err(report!(MeshPlotError::GeometryReconstruction).attach(format!(
            "mesh reconstruction needs at least 3 points, got {}",
            positions.len()
        )));
    }
    match mode {
        ReconstructionMode::Explicit { i, j, k } => explicit_cells(i, j, k, positions.len()),
        ReconstructionMode::ConvexHull => {
            let tets = tetra::tetrahedralize(positions)?;
            Ok(boundary_cells(positions, &tets, |_| true))
        }
        ReconstructionMode::AlphaShape { radius } => {
            let r2 = radius * radius;
            let tets = tetra::tetrahedralize(positions)?;
            Ok(boundary_cells(positions, &tets, |t| t.radius2 <= r2))
        }
        ReconstructionMode::ProjectedDelaunay { axis } => {
            let d = axis.index();
            let planar: Vec<DVec2> = positions
                .iter()
                .map(|p| {
                    let c = p.to_array();
                    DVec2::new(c[(d + 1) % 3], c[(d + 2) % 3])
                })
                .collect();
            delaunay2d::triangulate(&planar)
        }
    }
}

fn explicit_cells(i: &[u32], j: &[u32], k: &[u32], point_count: usize) -> Result<Vec<[u32; 3]>> {
    if i.len() != j.len() || i.len() != k.len() {
        return Err(report!(MeshPlotError::GeometryReconstruction).attach(format!(
            "index triple lengths differ: i={} j={} k={}",
            i.len(),
            j.len(),
            k.len()
        )));
    }
    let limit = point_count as u32;
    let mut cells = Vec::with_capacity(i.len());
    for (ci, ((&a, &b), &c)) in i.iter().zip(j).zip(k).enumerate() {
        if a >= limit || b >= limit || c >= limit {
            return Err(report!(MeshPlotError::GeometryReconstruction).attach(format!(
                "cell {ci} references a point outside 0..{point_count}"
            )));
        }
        cells.push([a, b, c]);
    }
    Ok(cells)
}

/// Faces belonging to exactly one kept tetrahedron, wound so the normal
/// points away from the solid.
fn boundary_cells(
    points: &[DVec3],
    tets: &[Tet],
    keep: impl Fn(&Tet) -> bool,
) -> Vec<[u32; 3]> {
    let mut faces: HashMap<[usize; 3], (usize, [usize; 3], usize)> = HashMap::new();
    for t in tets.iter().filter(|t| keep(t)) {
        let v = t.verts;
        for (f, opp) in [
            ([v[1], v[2], v[3]], v[0]),
            ([v[0], v[2], v[3]], v[1]),
            ([v[0], v[1], v[3]], v[2]),
            ([v[0], v[1], v[2]], v[3]),
        ] {
            faces
                .entry(sorted3(f))
                .and_modify(|e| e.0 += 1)
                .or_insert((1, f, opp));
        }
    }

    let mut cells = Vec::new();
    for (count, f, opp) in faces.into_values() {
        if count != 1 {
            continue;
        }
        let (a, b, c) = (points[f[0]], points[f[1]], points[f[2]]);
        let normal = (b - a).cross(c - a);
        let mut cell = [f[0] as u32, f[1] as u32, f[2] as u32];
        if normal.dot(points[opp] - a) > 0.0 {
            cell.swap(1, 2);
        }
        cells.push(cell);
    }
    cells.sort_unstable();
    cells
}

/// Undirected edge set of a cell list, deduplicated and sorted.
pub fn unique_edges(cells: &[[u32; 3]]) -> Vec<[u32; 2]> {
    let mut edges: Vec<[u32; 2]> = cells
        .iter()
        .flat_map(|c| [[c[0], c[1]], [c[1], c[2]], [c[2], c[0]]])
        .map(|[a, b]| if a <= b { [a, b] } else { [b, a] })
        .collect();
    edges.sort_unstable();
    edges.dedup();
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetra_points() -> Vec<DVec3> {
        vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
        ]
    }

    // Slight jitter keeps the corners out of exactly cospherical position.
    fn cube_points() -> Vec<DVec3> {
        let mut points = Vec::new();
        for z in 0..2 {
            for y in 0..2 {
                for x in 0..2 {
                    let j = ((x * 3 + y * 5 + z * 7) % 11) as f64 * 1e-4;
                    points.push(DVec3::new(x as f64 + j, y as f64 - j, z as f64 + 2.0 * j));
                }
            }
        }
        points
    }

    fn edge_use_counts(cells: &[[u32; 3]]) -> HashMap<(u32, u32), usize> {
        let mut counts = HashMap::new();
        for c in cells {
            for (a, b) in [(c[0], c[1]), (c[1], c[2]), (c[2], c[0])] {
                let key = (a.min(b), a.max(b));
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }

    fn sorted_cell_set(cells: &[[u32; 3]]) -> Vec<[u32; 3]> {
        let mut set: Vec<[u32; 3]> = cells
            .iter()
            .map(|c| {
                let mut s = *c;
                s.sort_unstable();
                s
            })
            .collect();
        set.sort_unstable();
        set
    }

    #[test]
    fn test_mode_selection_order() {
        let base = TraceSpec::new(vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]);

        let explicit = base
            .clone()
            .with_cells(vec![0], vec![1], vec![2])
            .with_alphahull(0.0);
        assert!(matches!(
            ReconstructionMode::select(&explicit),
            ReconstructionMode::Explicit { .. }
        ));

        let hull = base.clone().with_alphahull(0.0);
        assert_eq!(ReconstructionMode::select(&hull), ReconstructionMode::ConvexHull);

        let alpha = base.clone().with_alphahull(2.5);
        assert_eq!(
            ReconstructionMode::select(&alpha),
            ReconstructionMode::AlphaShape { radius: 2.5 }
        );

        let delaunay = base.with_alphahull(-1.0).with_delaunayaxis(DelaunayAxis::Y);
        assert_eq!(
            ReconstructionMode::select(&delaunay),
            ReconstructionMode::ProjectedDelaunay {
                axis: DelaunayAxis::Y
            }
        );
    }

    #[test]
    fn test_explicit_cells_pass_through() {
        let mode = ReconstructionMode::Explicit {
            i: vec![0],
            j: vec![1],
            k: vec![2],
        };
        let positions = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let cells = reconstruct(&mode, &positions).unwrap();
        assert_eq!(cells, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_explicit_out_of_range_index() {
        let mode = ReconstructionMode::Explicit {
            i: vec![0],
            j: vec![1],
            k: vec![3],
        };
        let positions = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let err = reconstruct(&mode, &positions).unwrap_err();
        assert_eq!(*err.current_context(), MeshPlotError::GeometryReconstruction);
    }

    #[test]
    fn test_explicit_mismatched_triples() {
        let mode = ReconstructionMode::Explicit {
            i: vec![0, 1],
            j: vec![1],
            k: vec![2],
        };
        let positions = [DVec3::ZERO, DVec3::X, DVec3::Y];
        assert!(reconstruct(&mode, &positions).is_err());
    }

    #[test]
    fn test_tetrahedron_hull() {
        let cells = reconstruct(&ReconstructionMode::ConvexHull, &tetra_points()).unwrap();
        assert_eq!(cells.len(), 4);
        let counts = edge_use_counts(&cells);
        assert_eq!(counts.len(), 6);
        assert!(counts.values().all(|&c| c == 2));
    }

    #[test]
    fn test_cube_hull_is_closed_manifold() {
        let cells = reconstruct(&ReconstructionMode::ConvexHull, &cube_points()).unwrap();
        // 8 hull vertices -> 12 boundary triangles (Euler: F = 2V - 4).
        assert_eq!(cells.len(), 12);
        assert!(edge_use_counts(&cells).values().all(|&c| c == 2));
    }

    #[test]
    fn test_hull_faces_wind_outward() {
        let points = tetra_points();
        let centroid = points.iter().sum::<DVec3>() / points.len() as f64;
        let cells = reconstruct(&ReconstructionMode::ConvexHull, &points).unwrap();
        for c in &cells {
            let (a, b, d) = (
                points[c[0] as usize],
                points[c[1] as usize],
                points[c[2] as usize],
            );
            let normal = (b - a).cross(d - a);
            assert!(normal.dot(a - centroid) > 0.0, "inward-facing cell {c:?}");
        }
    }

    #[test]
    fn test_large_alpha_converges_to_hull() {
        let points = cube_points();
        let hull = reconstruct(&ReconstructionMode::ConvexHull, &points).unwrap();
        let alpha =
            reconstruct(&ReconstructionMode::AlphaShape { radius: 1e6 }, &points).unwrap();
        assert_eq!(sorted_cell_set(&alpha), sorted_cell_set(&hull));
    }

    #[test]
    fn test_tiny_alpha_carves_everything_away() {
        let cells = reconstruct(
            &ReconstructionMode::AlphaShape { radius: 1e-6 },
            &cube_points(),
        )
        .unwrap();
        assert!(cells.is_empty());
    }

    #[test]
    fn test_moderate_alpha_keeps_local_surface() {
        // 3x3x3 jittered grid, radius sized to the grid spacing: short
        // tetrahedra survive, large slivers are carved away.
        let mut points = Vec::new();
        for z in 0..3 {
            for y in 0..3 {
                for x in 0..3 {
                    let j = ((x * 7 + y * 13 + z * 17) % 19) as f64 * 1e-4;
                    points.push(DVec3::new(x as f64 + j, y as f64 - j, z as f64 + 2.0 * j));
                }
            }
        }
        let cells =
            reconstruct(&ReconstructionMode::AlphaShape { radius: 0.9 }, &points).unwrap();
        assert!(!cells.is_empty());
        let limit = points.len() as u32;
        assert!(cells.iter().all(|c| c.iter().all(|&v| v < limit)));
    }

    #[test]
    fn test_projected_delaunay_matches_planar_triangulation() {
        // Planar along z: dropping z keeps (x, y) and must reproduce the 2D
        // result. The empty-circumcircle property is checked in delaunay2d.
        let positions = [
            DVec3::new(0.0, 0.0, 5.0),
            DVec3::new(1.0, 0.0, 5.0),
            DVec3::new(1.0, 1.0, 5.0),
            DVec3::new(0.0, 1.0, 5.0),
            DVec3::new(0.5, 0.5, 5.0),
        ];
        let cells = reconstruct(
            &ReconstructionMode::ProjectedDelaunay {
                axis: DelaunayAxis::Z,
            },
            &positions,
        )
        .unwrap();
        assert_eq!(cells.len(), 4);
        assert!(cells.iter().all(|c| c.contains(&4)));
    }

    #[test]
    fn test_projected_axis_cyclic_order() {
        // Dropping x keeps (y, z); a set planar in x must triangulate.
        let positions = [
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(2.0, 1.0, 0.0),
            DVec3::new(2.0, 0.0, 1.0),
            DVec3::new(2.0, 1.0, 1.0),
        ];
        let cells = reconstruct(
            &ReconstructionMode::ProjectedDelaunay {
                axis: DelaunayAxis::X,
            },
            &positions,
        )
        .unwrap();
        assert_eq!(cells.len(), 2);
    }

    #[test]
    fn test_hull_needs_volume() {
        let coplanar = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
        ];
        let err = reconstruct(&ReconstructionMode::ConvexHull, &coplanar).unwrap_err();
        assert_eq!(*err.current_context(), MeshPlotError::GeometryReconstruction);
    }

    #[test]
    fn test_too_few_points_any_mode() {
        let positions = [DVec3::ZERO, DVec3::X];
        for mode in [
            ReconstructionMode::ConvexHull,
            ReconstructionMode::AlphaShape { radius: 1.0 },
            ReconstructionMode::ProjectedDelaunay {
                axis: DelaunayAxis::Z,
            },
        ] {
            assert!(reconstruct(&mode, &positions).is_err());
        }
    }

    #[test]
    fn test_unique_edges() {
        let cells = [[0, 1, 2], [0, 2, 3]];
        let edges = unique_edges(&cells);
        assert_eq!(edges, vec![[0, 1], [0, 2], [0, 3], [1, 2], [2, 3]]);
    }
}
