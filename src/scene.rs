use bevy_math::DVec3;
use serde::{Deserialize, Serialize};

use crate::axis::Axis;

/// Identity of a renderable object in the scene draw list. Pick events
/// carry the id of the object that was hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// Shared rendering scene state: the per-axis data transforms, the data
/// scale applied after them, and the draw list traces register in.
///
/// Asset stores are deliberately not owned here; trace operations take
/// `&mut Assets<Mesh>` / `&mut Assets<StandardMaterial>` alongside the
/// scene, so the same code runs inside or outside an ECS app.
#[derive(Debug)]
pub struct Scene3d {
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub z_axis: Axis,
    pub data_scale: DVec3,
    objects: Vec<ObjectId>,
    next_object: u64,
}

impl Default for Scene3d {
    fn default() -> Self {
        Self {
            x_axis: Axis::linear(),
            y_axis: Axis::linear(),
            z_axis: Axis::linear(),
            data_scale: DVec3::ONE,
            objects: Vec::new(),
            next_object: 1,
        }
    }
}

impl Scene3d {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc_object(&mut self) -> ObjectId {
        let id = ObjectId(self.next_object);
        self.next_object += 1;
        id
    }

    pub(crate) fn add_object(&mut self, id: ObjectId) {
        if !self.objects.contains(&id) {
            self.objects.push(id);
        }
    }

    pub(crate) fn remove_object(&mut self, id: ObjectId) {
        self.objects.retain(|&o| o != id);
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains(&id)
    }

    /// Draw list, in registration order.
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }
}
