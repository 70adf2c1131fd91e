use bevy::color::palettes::css;
use bevy::color::{Color, Srgba};
use error_stack::report;
use serde::{Deserialize, Serialize};

use crate::trace::TraceSpec;
use crate::{MeshPlotError, Result};

/// Normalized color value, channels in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn opaque(self) -> Self {
        Self { a: 1.0, ..self }
    }

    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Srgba> for Rgba {
    fn from(c: Srgba) -> Self {
        Self::rgba(c.red, c.green, c.blue, c.alpha)
    }
}

impl From<Rgba> for Color {
    #[inline]
    fn from(c: Rgba) -> Self {
        Color::srgba(c.r, c.g, c.b, c.a)
    }
}

/// A single color as it appears in a trace spec: either an already-normalized
/// channel array or a string form (`#rrggbb`, `rgb(..)`, `rgba(..)`, or a CSS
/// name). Untagged so JSON `"red"` and `[1,0,0,1]` both deserialize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Value([f32; 4]),
    Named(String),
}

impl Default for ColorSpec {
    fn default() -> Self {
        Self::Value([1.0, 1.0, 1.0, 1.0])
    }
}

impl From<&str> for ColorSpec {
    fn from(s: &str) -> Self {
        Self::Named(s.to_owned())
    }
}

impl From<[f32; 4]> for ColorSpec {
    fn from(v: [f32; 4]) -> Self {
        Self::Value(v)
    }
}

impl ColorSpec {
    /// Parse into a normalized color. Unrecognized representations are an
    /// `InvalidColorSpec` error with the offending input attached.
    pub fn to_rgba(&self) -> Result<Rgba> {
        match self {
            Self::Value(v) => Ok(Rgba::rgba(v[0], v[1], v[2], v[3])),
            Self::Named(s) => parse_color_str(s),
        }
    }
}

fn parse_color_str(s: &str) -> Result<Rgba> {
    let s = s.trim();
    if s.starts_with('#') {
        let parsed = Srgba::hex(s).map_err(|_| {
            report!(MeshPlotError::InvalidColorSpec).attach(format!("bad hex color: {s}"))
        })?;
        return Ok(parsed.into());
    }
    if let Some(body) = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))
    {
        return parse_rgb_func(s, body);
    }
    named_color(s).ok_or_else(|| {
        report!(MeshPlotError::InvalidColorSpec).attach(format!("unknown color name: {s}"))
    })
}

/// `rgb(r, g, b)` / `rgba(r, g, b, a)` with byte channels and unit alpha.
fn parse_rgb_func(full: &str, body: &str) -> Result<Rgba> {
    let bad = || report!(MeshPlotError::InvalidColorSpec).attach(format!("bad rgb() color: {full}"));
    let body = body.strip_suffix(')').ok_or_else(bad)?;
    let parts: Vec<f32> = body
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| bad())?;
    match parts.as_slice() {
        [r, g, b] => Ok(Rgba::rgb(r / 255.0, g / 255.0, b / 255.0)),
        [r, g, b, a] => Ok(Rgba::rgba(r / 255.0, g / 255.0, b / 255.0, *a)),
        _ => Err(bad()),
    }
}

fn named_color(s: &str) -> Option<Rgba> {
    let c: Srgba = match s.to_ascii_lowercase().as_str() {
        "white" => css::WHITE,
        "silver" => css::SILVER,
        "gray" | "grey" => css::GRAY,
        "black" => css::BLACK,
        "red" => css::RED,
        "maroon" => css::MAROON,
        "yellow" => css::YELLOW,
        "olive" => css::OLIVE,
        "lime" => css::LIME,
        "green" => css::GREEN,
        "aqua" | "cyan" => css::AQUA,
        "teal" => css::TEAL,
        "blue" => css::BLUE,
        "navy" => css::NAVY,
        "fuchsia" | "magenta" => css::FUCHSIA,
        "purple" => css::PURPLE,
        "orange" => css::ORANGE,
        _ => return None,
    };
    Some(c.into())
}

/// One entry of a resolved colormap lookup table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub t: f32,
    pub rgba: Rgba,
}

/// Ordered `(stop, color)` pairs mapping normalized scalars to colors.
/// Stops must lie in [0, 1] and be non-decreasing; anything else is
/// rejected rather than sorted behind the caller's back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorScale(pub Vec<(f64, ColorSpec)>);

impl Default for ColorScale {
    fn default() -> Self {
        Self(vec![
            (0.0, "rgb(5,10,172)".into()),
            (0.35, "rgb(106,137,247)".into()),
            (0.5, "rgb(190,190,190)".into()),
            (0.6, "rgb(220,170,132)".into()),
            (0.7, "rgb(230,145,90)".into()),
            (1.0, "rgb(178,10,28)".into()),
        ])
    }
}

impl ColorScale {
    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(report!(MeshPlotError::InvalidColorSpec).attach("empty colorscale"));
        }
        let mut prev = 0.0f64;
        for (i, (t, _)) in self.0.iter().enumerate() {
            if !(0.0..=1.0).contains(t) {
                return Err(report!(MeshPlotError::InvalidColorSpec)
                    .attach(format!("colorscale stop {t} at index {i} outside [0, 1]")));
            }
            if *t < prev {
                return Err(report!(MeshPlotError::InvalidColorSpec)
                    .attach(format!("colorscale stops not sorted at index {i}")));
            }
            prev = *t;
        }
        Ok(())
    }

    /// Resolve every stop color, forcing alpha to 1.
    pub fn to_lut(&self) -> Result<Vec<ColorStop>> {
        self.validate()?;
        self.0
            .iter()
            .map(|(t, spec)| {
                Ok(ColorStop {
                    t: *t as f32,
                    rgba: spec.to_rgba()?.opaque(),
                })
            })
            .collect()
    }
}

/// Piecewise-linear colormap lookup; `t` is clamped to the stop range.
pub fn sample_lut(lut: &[ColorStop], t: f32) -> Rgba {
    debug_assert!(!lut.is_empty());
    if t <= lut[0].t {
        return lut[0].rgba;
    }
    for pair in lut.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.t {
            let span = hi.t - lo.t;
            if span <= f32::EPSILON {
                return hi.rgba;
            }
            let f = (t - lo.t) / span;
            return Rgba::rgba(
                lo.rgba.r + (hi.rgba.r - lo.rgba.r) * f,
                lo.rgba.g + (hi.rgba.g - lo.rgba.g) * f,
                lo.rgba.b + (hi.rgba.b - lo.rgba.b) * f,
                lo.rgba.a + (hi.rgba.a - lo.rgba.a) * f,
            );
        }
    }
    lut[lut.len() - 1].rgba
}

/// How resolved colors bind to the GPU mesh. Exactly one variant is active
/// per update.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorBinding {
    Uniform(Rgba),
    PerVertexScalar {
        intensity: Vec<f64>,
        colormap: Vec<ColorStop>,
    },
    PerVertexColor(Vec<Rgba>),
    PerFaceColor(Vec<Rgba>),
}

/// Resolve a trace's color fields into a binding plus the trace's nominal
/// display color (used for legends).
///
/// Strict priority: `intensity`, then `vertex_color`, then `face_color`,
/// then the uniform `color`; later fields are ignored even when present.
pub fn resolve(spec: &TraceSpec, point_count: usize, cell_count: usize) -> Result<(ColorBinding, Rgba)> {
    if let Some(intensity) = &spec.intensity {
        if intensity.len() != point_count {
            return Err(report!(MeshPlotError::InvalidColorSpec).attach(format!(
                "intensity has {} entries for {point_count} points",
                intensity.len()
            )));
        }
        let colormap = spec.colorscale.to_lut()?;
        return Ok((
            ColorBinding::PerVertexScalar {
                intensity: intensity.clone(),
                colormap,
            },
            Rgba::WHITE,
        ));
    }

    if let Some(vertex_color) = &spec.vertex_color {
        if vertex_color.len() != point_count {
            return Err(report!(MeshPlotError::InvalidColorSpec).attach(format!(
                "vertexcolor has {} entries for {point_count} points",
                vertex_color.len()
            )));
        }
        let colors = parse_color_array(vertex_color)?;
        let display = colors[0];
        return Ok((ColorBinding::PerVertexColor(colors), display));
    }

    if let Some(face_color) = &spec.face_color {
        if face_color.len() != cell_count {
            return Err(report!(MeshPlotError::InvalidColorSpec).attach(format!(
                "facecolor has {} entries for {cell_count} cells",
                face_color.len()
            )));
        }
        let colors = parse_color_array(face_color)?;
        let display = colors[0];
        return Ok((ColorBinding::PerFaceColor(colors), display));
    }

    let uniform = spec.color.to_rgba()?;
    Ok((ColorBinding::Uniform(uniform), uniform))
}

fn parse_color_array(specs: &[ColorSpec]) -> Result<Vec<Rgba>> {
    specs.iter().map(ColorSpec::to_rgba).collect()
}
