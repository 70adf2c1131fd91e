pub mod axis;
pub mod color;
pub mod geometry;
pub mod mesh3d;
pub mod render;
pub mod scene;
pub mod trace;

use std::fmt;

/// Error taxonomy for the trace pipeline. Detail strings travel as
/// `error_stack` attachments on the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshPlotError {
    /// Degenerate or insufficient point set, or out-of-range explicit indices.
    GeometryReconstruction,
    /// Unparsable color representation or malformed colorscale.
    InvalidColorSpec,
    /// Operation invoked on a disposed mesh resource.
    UseAfterDispose,
}

impl fmt::Display for MeshPlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeometryReconstruction => write!(f, "geometry reconstruction failed"),
            Self::InvalidColorSpec => write!(f, "invalid color specification"),
            Self::UseAfterDispose => write!(f, "operation on a disposed mesh resource"),
        }
    }
}

impl std::error::Error for MeshPlotError {}

pub type Result<T> = std::result::Result<T, error_stack::Report<MeshPlotError>>;

pub mod prelude {
    pub use crate::MeshPlotError;
    pub use crate::axis::{Axis, Scale, map_coords};
    pub use crate::color::{ColorBinding, ColorScale, ColorSpec, Rgba};
    pub use crate::geometry::ReconstructionMode;
    pub use crate::mesh3d::{Mesh3dTrace, PickHit};
    pub use crate::render::RenderConfig;
    pub use crate::scene::{ObjectId, Scene3d};
    pub use crate::trace::{Contour, DelaunayAxis, Lighting, TraceSpec};
}
