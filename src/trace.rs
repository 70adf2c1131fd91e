use error_stack::report;
use serde::{Deserialize, Serialize};

use crate::color::{ColorScale, ColorSpec};
use crate::{MeshPlotError, Result};

/// Axis dropped when falling back to projected Delaunay triangulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelaunayAxis {
    X,
    Y,
    #[default]
    Z,
}

impl DelaunayAxis {
    /// Coordinate index of the dropped axis.
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lighting {
    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub roughness: f64,
    pub fresnel: f64,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.8,
            diffuse: 0.8,
            specular: 0.05,
            roughness: 0.5,
            fresnel: 0.2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub show: bool,
    pub color: ColorSpec,
    pub width: f64,
}

impl Default for Contour {
    fn default() -> Self {
        Self {
            show: false,
            color: "#444".into(),
            width: 2.0,
        }
    }
}

/// Input description of one mesh trace, immutable per update call.
///
/// Field names and defaults follow the trace JSON schema, so a spec
/// round-trips through `serde_json` in the external wire form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSpec {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub i: Option<Vec<u32>>,
    pub j: Option<Vec<u32>>,
    pub k: Option<Vec<u32>>,
    #[serde(default = "default_alphahull")]
    pub alphahull: f64,
    pub delaunayaxis: DelaunayAxis,
    pub intensity: Option<Vec<f64>>,
    #[serde(rename = "vertexcolor")]
    pub vertex_color: Option<Vec<ColorSpec>>,
    #[serde(rename = "facecolor")]
    pub face_color: Option<Vec<ColorSpec>>,
    pub color: ColorSpec,
    pub colorscale: ColorScale,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    pub lighting: Lighting,
    pub contour: Contour,
    pub flatshading: bool,
}

fn default_alphahull() -> f64 {
    -1.0
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for TraceSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            i: None,
            j: None,
            k: None,
            alphahull: default_alphahull(),
            delaunayaxis: DelaunayAxis::default(),
            intensity: None,
            vertex_color: None,
            face_color: None,
            color: ColorSpec::default(),
            colorscale: ColorScale::default(),
            opacity: default_opacity(),
            lighting: Lighting::default(),
            contour: Contour::default(),
            flatshading: false,
        }
    }
}

impl TraceSpec {
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Self {
        Self {
            x,
            y,
            z,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Explicit triangle indices; selects explicit reconstruction.
    pub fn with_cells(mut self, i: Vec<u32>, j: Vec<u32>, k: Vec<u32>) -> Self {
        self.i = Some(i);
        self.j = Some(j);
        self.k = Some(k);
        self
    }

    pub fn with_alphahull(mut self, alphahull: f64) -> Self {
        self.alphahull = alphahull;
        self
    }

    pub fn with_delaunayaxis(mut self, axis: DelaunayAxis) -> Self {
        self.delaunayaxis = axis;
        self
    }

    pub fn with_intensity(mut self, intensity: Vec<f64>) -> Self {
        self.intensity = Some(intensity);
        self
    }

    pub fn with_vertex_colors(mut self, colors: Vec<ColorSpec>) -> Self {
        self.vertex_color = Some(colors);
        self
    }

    pub fn with_face_colors(mut self, colors: Vec<ColorSpec>) -> Self {
        self.face_color = Some(colors);
        self
    }

    pub fn with_color(mut self, color: impl Into<ColorSpec>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_flatshading(mut self, flatshading: bool) -> Self {
        self.flatshading = flatshading;
        self
    }

    pub fn with_contour(mut self, contour: Contour) -> Self {
        self.contour = contour;
        self
    }

    pub fn point_count(&self) -> usize {
        self.x.len()
    }

    /// Strict structural validation: `x`, `y`, `z` must agree in length.
    /// Truncation is never inferred.
    pub fn validate(&self) -> Result<()> {
        if self.x.len() != self.y.len() || self.x.len() != self.z.len() {
            return Err(report!(MeshPlotError::GeometryReconstruction).attach(format!(
                "coordinate lengths differ: x={} y={} z={}",
                self.x.len(),
                self.y.len(),
                self.z.len()
            )));
        }
        Ok(())
    }
}
