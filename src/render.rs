//! Assembled render configuration and its translation into mesh assets.

use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_mesh::{Indices, PrimitiveTopology};

use crate::color::{ColorBinding, Rgba, sample_lut};
use crate::geometry::unique_edges;

/// Everything one update resolved: geometry, color binding, lighting and
/// contour scalars. Assembly is fallible; applying a config is not, which
/// is what keeps updates apply-or-reject.
///
/// `cells` are assumed validated against `positions`.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub positions: Vec<[f32; 3]>,
    pub cells: Vec<[u32; 3]>,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub roughness: f32,
    pub fresnel: f32,
    pub opacity: f32,
    pub contour_enable: bool,
    pub contour_color: [f32; 3],
    pub contour_width: f32,
    pub use_facet_normals: bool,
    pub color: ColorBinding,
}

/// Build the triangle mesh for a config.
///
/// Per-face colors and facet normals both need corner expansion because
/// mesh attributes are per-vertex; everything else stays indexed.
pub fn build_mesh(cfg: &RenderConfig) -> Mesh {
    let expanded =
        cfg.use_facet_normals || matches!(cfg.color, ColorBinding::PerFaceColor(_));
    if expanded {
        build_expanded(cfg)
    } else {
        build_indexed(cfg)
    }
}

fn build_indexed(cfg: &RenderConfig) -> Mesh {
    let indices: Vec<u32> = cfg.cells.iter().flatten().copied().collect();
    let normals = smooth_normals(&cfg.positions, &indices);

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, cfg.positions.clone())
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
    .with_inserted_indices(Indices::U32(indices));

    if let Some(colors) = per_point_colors(cfg) {
        mesh = mesh.with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    }
    mesh
}

fn build_expanded(cfg: &RenderConfig) -> Mesh {
    let point_colors = per_point_colors(cfg);
    let shared_normals = if cfg.use_facet_normals {
        None
    } else {
        let indices: Vec<u32> = cfg.cells.iter().flatten().copied().collect();
        Some(smooth_normals(&cfg.positions, &indices))
    };

    let corner_count = cfg.cells.len() * 3;
    let mut positions = Vec::with_capacity(corner_count);
    let mut normals = Vec::with_capacity(corner_count);
    let face_colors = match &cfg.color {
        ColorBinding::PerFaceColor(colors) => Some(colors),
        _ => None,
    };
    let mut colors: Vec<[f32; 4]> = Vec::new();

    for (ci, cell) in cfg.cells.iter().enumerate() {
        let [a, b, c] = cell.map(|v| v as usize);
        positions.extend([cfg.positions[a], cfg.positions[b], cfg.positions[c]]);

        if let Some(shared) = &shared_normals {
            normals.extend([shared[a], shared[b], shared[c]]);
        } else {
            let n = facet_normal(cfg.positions[a], cfg.positions[b], cfg.positions[c]);
            normals.extend([n, n, n]);
        }

        if let Some(face) = face_colors {
            colors.extend([face[ci].to_array(); 3]);
        } else if let Some(point) = &point_colors {
            colors.extend([point[a], point[b], point[c]]);
        }
    }

    let indices: Vec<u32> = (0..corner_count as u32).collect();
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
    .with_inserted_indices(Indices::U32(indices));

    if !colors.is_empty() {
        mesh = mesh.with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    }
    mesh
}

/// Line-list mesh over the deduplicated cell edges, or an empty mesh when
/// contours are off. Width is carried in the config for renderers that
/// support it; line lists rasterize hairline.
pub fn build_contour_mesh(cfg: &RenderConfig) -> Mesh {
    let mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
    if !cfg.contour_enable {
        return mesh.with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, Vec::<[f32; 3]>::new());
    }

    let edges = unique_edges(&cfg.cells);
    let mut positions = Vec::with_capacity(edges.len() * 2);
    for e in edges {
        positions.push(cfg.positions[e[0] as usize]);
        positions.push(cfg.positions[e[1] as usize]);
    }
    let color = [
        cfg.contour_color[0],
        cfg.contour_color[1],
        cfg.contour_color[2],
        1.0,
    ];
    let colors = vec![color; positions.len()];
    mesh.with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors)
}

/// Material for a config. Vertex colors multiply the base color, so the
/// base stays white for every non-uniform binding.
pub fn material(cfg: &RenderConfig) -> StandardMaterial {
    let base = match &cfg.color {
        ColorBinding::Uniform(c) => *c,
        _ => Rgba::WHITE,
    };
    let alpha = base.a * cfg.opacity;
    let glow = cfg.ambient * 0.15;

    StandardMaterial {
        base_color: Color::srgba(base.r, base.g, base.b, alpha),
        emissive: Color::srgb(base.r * glow, base.g * glow, base.b * glow).into(),
        perceptual_roughness: cfg.roughness.clamp(0.089, 1.0),
        reflectance: cfg.specular,
        metallic: 0.0,
        cull_mode: None,
        double_sided: true,
        alpha_mode: if alpha < 1.0 {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        ..default()
    }
}

fn per_point_colors(cfg: &RenderConfig) -> Option<Vec<[f32; 4]>> {
    match &cfg.color {
        ColorBinding::Uniform(_) | ColorBinding::PerFaceColor(_) => None,
        ColorBinding::PerVertexColor(colors) => {
            Some(colors.iter().map(|c| c.to_array()).collect())
        }
        ColorBinding::PerVertexScalar {
            intensity,
            colormap,
        } => {
            let min = intensity.iter().copied().fold(f64::INFINITY, f64::min);
            let max = intensity.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let span = max - min;
            Some(
                intensity
                    .iter()
                    .map(|&v| {
                        let t = if span > 0.0 && span.is_finite() {
                            ((v - min) / span) as f32
                        } else {
                            0.5
                        };
                        sample_lut(colormap, t).to_array()
                    })
                    .collect(),
            )
        }
    }
}

fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    let pos = |i: usize| Vec3::from_array(positions[i]);

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let n = (pos(b) - pos(a)).cross(pos(c) - pos(a));
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }

    normals
        .into_iter()
        .map(|n| n.normalize_or_zero().to_array())
        .collect()
}

fn facet_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let (a, b, c) = (Vec3::from_array(a), Vec3::from_array(b), Vec3::from_array(c));
    (b - a).cross(c - a).normalize_or_zero().to_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorStop;
    use bevy_mesh::VertexAttributeValues;

    fn tetra_config(color: ColorBinding) -> RenderConfig {
        RenderConfig {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
            cells: vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
            ambient: 0.8,
            diffuse: 0.8,
            specular: 0.05,
            roughness: 0.5,
            fresnel: 0.2,
            opacity: 1.0,
            contour_enable: false,
            contour_color: [0.2, 0.2, 0.2],
            contour_width: 2.0,
            use_facet_normals: false,
            color,
        }
    }

    fn color_attr(mesh: &Mesh) -> Option<Vec<[f32; 4]>> {
        match mesh.attribute(Mesh::ATTRIBUTE_COLOR)? {
            VertexAttributeValues::Float32x4(v) => Some(v.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_indexed_build_shares_vertices() {
        let mesh = build_mesh(&tetra_config(ColorBinding::Uniform(Rgba::WHITE)));
        assert_eq!(mesh.count_vertices(), 4);
        assert_eq!(mesh.indices().unwrap().len(), 12);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some());
        assert!(mesh.attribute(Mesh::ATTRIBUTE_COLOR).is_none());
    }

    #[test]
    fn test_flatshading_expands_corners() {
        let mut cfg = tetra_config(ColorBinding::Uniform(Rgba::WHITE));
        cfg.use_facet_normals = true;
        let mesh = build_mesh(&cfg);
        assert_eq!(mesh.count_vertices(), 12);
    }

    #[test]
    fn test_face_colors_replicate_per_corner() {
        let face_colors = vec![
            Rgba::rgb(1.0, 0.0, 0.0),
            Rgba::rgb(0.0, 1.0, 0.0),
            Rgba::rgb(0.0, 0.0, 1.0),
            Rgba::rgb(1.0, 1.0, 0.0),
        ];
        let cfg = tetra_config(ColorBinding::PerFaceColor(face_colors.clone()));
        let mesh = build_mesh(&cfg);
        assert_eq!(mesh.count_vertices(), 12);
        let colors = color_attr(&mesh).unwrap();
        for (ci, face) in face_colors.iter().enumerate() {
            for corner in 0..3 {
                assert_eq!(colors[ci * 3 + corner], face.to_array());
            }
        }
    }

    #[test]
    fn test_intensity_maps_through_lut() {
        let colormap = vec![
            ColorStop {
                t: 0.0,
                rgba: Rgba::BLACK,
            },
            ColorStop {
                t: 1.0,
                rgba: Rgba::WHITE,
            },
        ];
        let cfg = tetra_config(ColorBinding::PerVertexScalar {
            intensity: vec![0.0, 5.0, 10.0, 10.0],
            colormap,
        });
        let mesh = build_mesh(&cfg);
        let colors = color_attr(&mesh).unwrap();
        assert_eq!(colors[0], Rgba::BLACK.to_array());
        assert_eq!(colors[2], Rgba::WHITE.to_array());
        assert!((colors[1][0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_contour_mesh_covers_unique_edges() {
        let mut cfg = tetra_config(ColorBinding::Uniform(Rgba::WHITE));
        cfg.contour_enable = true;
        let mesh = build_contour_mesh(&cfg);
        // tetrahedron: 6 edges, 2 endpoints each
        assert_eq!(mesh.count_vertices(), 12);
    }

    #[test]
    fn test_contour_mesh_empty_when_disabled() {
        let cfg = tetra_config(ColorBinding::Uniform(Rgba::WHITE));
        let mesh = build_contour_mesh(&cfg);
        assert_eq!(mesh.count_vertices(), 0);
    }

    #[test]
    fn test_material_uniform_color_and_opacity() {
        let mut cfg = tetra_config(ColorBinding::Uniform(Rgba::rgb(1.0, 0.0, 0.0)));
        cfg.opacity = 0.5;
        let mat = material(&cfg);
        assert_eq!(mat.alpha_mode, AlphaMode::Blend);
        assert!((mat.base_color.alpha() - 0.5).abs() < 1e-6);
        assert!(!matches!(mat.cull_mode, Some(_)));
        assert!(mat.double_sided);
    }

    #[test]
    fn test_material_white_base_for_vertex_colors() {
        let cfg = tetra_config(ColorBinding::PerVertexColor(vec![
            Rgba::rgb(1.0, 0.0, 0.0);
            4
        ]));
        let mat = material(&cfg);
        assert_eq!(mat.alpha_mode, AlphaMode::Opaque);
        assert!((mat.base_color.alpha() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_smooth_normals_average_adjacent_faces() {
        // Two triangles in the xy-plane share an edge; every normal is +z.
        let positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ];
        let normals = smooth_normals(&positions, &[0, 1, 2, 1, 3, 2]);
        for n in normals {
            assert!((Vec3::from_array(n) - Vec3::Z).length() < 1e-6);
        }
    }
}
