//! Mesh trace resource: owns the GPU-side assets for one trace, applies
//! spec updates to them, and answers pick queries from retained data.

use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_math::DVec3;
use bevy_mesh::PrimitiveTopology;
use error_stack::report;

use crate::axis::map_coords;
use crate::color::{self, Rgba};
use crate::geometry::{ReconstructionMode, reconstruct};
use crate::render::{self, RenderConfig};
use crate::scene::{ObjectId, Scene3d};
use crate::trace::TraceSpec;
use crate::{MeshPlotError, Result};

/// Low-level hit event: which scene object was hit and the index of the
/// point within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PickHit {
    pub object: ObjectId,
    pub index: usize,
}

/// Raw data coordinates retained from the last applied spec; the pick
/// path reads these, never the mapped render positions.
#[derive(Default, Debug)]
struct PickData {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

/// One mesh trace attached to a scene.
///
/// Lifecycle is attached -> disposed, one way. Every operation on a
/// disposed trace reports `UseAfterDispose`; callers track disposal.
#[derive(Debug)]
pub struct Mesh3dTrace {
    object: ObjectId,
    mesh: Handle<Mesh>,
    contour_mesh: Handle<Mesh>,
    material: Handle<StandardMaterial>,
    pub name: String,
    /// Nominal trace color for legends, refreshed on every update.
    pub display_color: Rgba,
    data: PickData,
    disposed: bool,
}

impl Mesh3dTrace {
    /// Allocate the GPU assets, apply the initial spec, and register the
    /// trace in the scene draw list. Nothing is left allocated or
    /// registered when the initial update fails.
    pub fn create(
        scene: &mut Scene3d,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
        spec: &TraceSpec,
    ) -> Result<Self> {
        let object = scene.alloc_object();
        let mesh = meshes.add(empty_mesh(PrimitiveTopology::TriangleList));
        let contour_mesh = meshes.add(empty_mesh(PrimitiveTopology::LineList));
        let material = materials.add(StandardMaterial::default());

        let mut trace = Self {
            object,
            mesh,
            contour_mesh,
            material,
            name: spec.name.clone(),
            display_color: Rgba::WHITE,
            data: PickData::default(),
            disposed: false,
        };

        match trace.update(scene, meshes, materials, spec) {
            Ok(()) => {
                scene.add_object(object);
                Ok(trace)
            }
            Err(err) => {
                meshes.remove(&trace.mesh);
                meshes.remove(&trace.contour_mesh);
                materials.remove(&trace.material);
                Err(err)
            }
        }
    }

    /// Recompute positions, cells and color binding from `spec` and apply
    /// the result to the GPU assets.
    ///
    /// Everything fallible runs before anything is written, so a failed
    /// update leaves the previously rendered state untouched.
    pub fn update(
        &mut self,
        scene: &Scene3d,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
        spec: &TraceSpec,
    ) -> Result<()> {
        if self.disposed {
            return Err(report!(MeshPlotError::UseAfterDispose).attach("update"));
        }
        spec.validate()?;

        let xs = map_coords(&scene.x_axis, &spec.x, scene.data_scale.x);
        let ys = map_coords(&scene.y_axis, &spec.y, scene.data_scale.y);
        let zs = map_coords(&scene.z_axis, &spec.z, scene.data_scale.z);
        let positions: Vec<DVec3> = xs
            .iter()
            .zip(&ys)
            .zip(&zs)
            .map(|((&x, &y), &z)| DVec3::new(x, y, z))
            .collect();

        let mode = ReconstructionMode::select(spec);
        let cells = reconstruct(&mode, &positions)?;
        let (binding, display_color) = color::resolve(spec, positions.len(), cells.len())?;
        let contour_color = spec.contour.color.to_rgba()?;

        let config = RenderConfig {
            positions: positions
                .iter()
                .map(|p| [p.x as f32, p.y as f32, p.z as f32])
                .collect(),
            cells,
            ambient: spec.lighting.ambient as f32,
            diffuse: spec.lighting.diffuse as f32,
            specular: spec.lighting.specular as f32,
            roughness: spec.lighting.roughness as f32,
            fresnel: spec.lighting.fresnel as f32,
            opacity: spec.opacity as f32,
            contour_enable: spec.contour.show,
            contour_color: [contour_color.r, contour_color.g, contour_color.b],
            contour_width: spec.contour.width as f32,
            use_facet_normals: spec.flatshading,
            color: binding,
        };

        meshes.insert(&self.mesh, render::build_mesh(&config));
        meshes.insert(&self.contour_mesh, render::build_contour_mesh(&config));
        materials.insert(&self.material, render::material(&config));

        self.name = spec.name.clone();
        self.display_color = display_color;
        self.data = PickData {
            x: spec.x.clone(),
            y: spec.y.clone(),
            z: spec.z.clone(),
        };
        Ok(())
    }

    /// Deregister from the scene and release the GPU assets. Valid once.
    pub fn dispose(
        &mut self,
        scene: &mut Scene3d,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
    ) -> Result<()> {
        if self.disposed {
            return Err(report!(MeshPlotError::UseAfterDispose).attach("dispose called twice"));
        }
        scene.remove_object(self.object);
        meshes.remove(&self.mesh);
        meshes.remove(&self.contour_mesh);
        materials.remove(&self.material);
        self.data = PickData::default();
        self.disposed = true;
        Ok(())
    }

    /// Map a hit back to the originating data coordinate.
    ///
    /// `Ok(Some(..))` when the hit targets this trace's object and the
    /// point index is in range; `Ok(None)` for hits on other objects.
    pub fn handle_pick(&self, hit: &PickHit) -> Result<Option<[f64; 3]>> {
        if self.disposed {
            return Err(report!(MeshPlotError::UseAfterDispose).attach("handle_pick"));
        }
        if hit.object != self.object || hit.index >= self.data.x.len() {
            return Ok(None);
        }
        Ok(Some([
            self.data.x[hit.index],
            self.data.y[hit.index],
            self.data.z[hit.index],
        ]))
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn mesh(&self) -> &Handle<Mesh> {
        &self.mesh
    }

    pub fn contour_mesh(&self) -> &Handle<Mesh> {
        &self.contour_mesh
    }

    pub fn material(&self) -> &Handle<StandardMaterial> {
        &self.material
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

fn empty_mesh(topology: PrimitiveTopology) -> Mesh {
    Mesh::new(topology, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, Vec::<[f32; 3]>::new())
}
