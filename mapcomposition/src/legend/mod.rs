//! Legend image generation.
//!
//! One PNG per layer is written next to the project file after every
//! successful composition. Rendering goes through the [`LegendRenderer`]
//! trait so a host engine's real legend renderer can be swapped in; the
//! default [`SwatchRenderer`] draws the layer's style colors only.

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::layer::{sanitize, Layer};
use crate::source::SourceKind;

/// Default legend edge length in pixels.
pub const DEFAULT_LEGEND_SIZE: u32 = 96;

/// Border thickness of vector swatches in pixels.
const BORDER: u32 = 2;

/// Renders a legend image for a single layer.
pub trait LegendRenderer: Send + Sync {
    fn render(&self, layer: &Layer) -> RgbaImage;
}

/// Default renderer: a flat style swatch.
///
/// Vector layers get the fill color inside a stroke-colored border; raster
/// layers get a horizontal ramp from the style color to white.
#[derive(Debug, Clone)]
pub struct SwatchRenderer {
    size: u32,
}

impl SwatchRenderer {
    pub fn new(size: u32) -> Self {
        Self { size: size.max(8) }
    }
}

impl Default for SwatchRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_LEGEND_SIZE)
    }
}

impl LegendRenderer for SwatchRenderer {
    fn render(&self, layer: &Layer) -> RgbaImage {
        let size = self.size;
        match layer.kind {
            SourceKind::Vector => {
                let mut image = RgbaImage::from_pixel(size, size, Rgba(layer.style.stroke));
                for y in BORDER..size - BORDER {
                    for x in BORDER..size - BORDER {
                        image.put_pixel(x, y, Rgba(layer.style.fill));
                    }
                }
                image
            }
            SourceKind::Raster => {
                let mut image = RgbaImage::new(size, size);
                let [r, g, b, _] = layer.style.fill;
                for x in 0..size {
                    let t = x as f32 / (size - 1) as f32;
                    let ramp = |c: u8| c as f32 + (255.0 - c as f32) * t;
                    let pixel = Rgba([ramp(r) as u8, ramp(g) as u8, ramp(b) as u8, 255]);
                    for y in 0..size {
                        image.put_pixel(x, y, pixel);
                    }
                }
                image
            }
        }
    }
}

/// Path of the legend file for `layer`, next to the project file.
pub fn legend_path(project_path: &Path, layer: &Layer) -> PathBuf {
    let stem = project_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    let file_name = format!("{}_legend_{}.png", stem, sanitize(&layer.name));
    match project_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

/// Render and write a legend PNG for every layer.
///
/// A layer whose legend cannot be written is logged and skipped; legend
/// failures never fail the composition. Returns the paths written.
pub fn write_legends(
    renderer: &dyn LegendRenderer,
    layers: &[Layer],
    project_path: &Path,
) -> Vec<PathBuf> {
    let mut written = Vec::with_capacity(layers.len());
    for layer in layers {
        let path = legend_path(project_path, layer);
        let image = renderer.render(layer);
        match image.save(&path) {
            Ok(()) => {
                debug!(layer = %layer.name, path = %path.display(), "legend written");
                written.push(path);
            }
            Err(e) => {
                warn!(layer = %layer.name, path = %path.display(), error = %e, "failed to write legend");
            }
        }
    }
    written
}
