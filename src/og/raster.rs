use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use resvg::tiny_skia::{Pixmap, Transform};

use super::fonts::FontAssets;
use super::{ImageQuality, RasterOptions, Rasterizer, ShapeQuality, TextQuality};

/// Rasterizes SVG with resvg against the configured font faces only.
pub struct ResvgRasterizer {
    fonts: Arc<FontAssets>,
}

impl ResvgRasterizer {
    pub fn new(fonts: Arc<FontAssets>) -> Self {
        Self { fonts }
    }

    fn usvg_options(&self, options: &RasterOptions) -> usvg::Options<'static> {
        usvg::Options {
            dpi: options.dpi,
            font_family: self.fonts.regular_family().to_string(),
            text_rendering: match options.text {
                TextQuality::Speed => usvg::TextRendering::OptimizeSpeed,
                TextQuality::Legibility => usvg::TextRendering::OptimizeLegibility,
                TextQuality::Geometric => usvg::TextRendering::GeometricPrecision,
            },
            shape_rendering: match options.shape {
                ShapeQuality::Speed => usvg::ShapeRendering::OptimizeSpeed,
                ShapeQuality::CrispEdges => usvg::ShapeRendering::CrispEdges,
                ShapeQuality::Geometric => usvg::ShapeRendering::GeometricPrecision,
            },
            image_rendering: match options.image {
                ImageQuality::Quality => usvg::ImageRendering::OptimizeQuality,
                ImageQuality::Speed => usvg::ImageRendering::OptimizeSpeed,
            },
            fontdb: self.fonts.database(),
            ..usvg::Options::default()
        }
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
        let tree = usvg::Tree::from_str(svg, &self.usvg_options(options))
            .context("failed to parse generated SVG")?;
        let size = tree.size().to_int_size();
        let mut pixmap = Pixmap::new(size.width(), size.height())
            .ok_or_else(|| anyhow!("invalid image size {}x{}", size.width(), size.height()))?;
        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());
        pixmap.encode_png().context("failed to encode PNG")
    }
}
