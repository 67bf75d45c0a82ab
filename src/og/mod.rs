//! Open Graph preview images: a box tree is laid out to SVG and rasterized
//! to PNG.

mod fonts;
mod layout;
mod raster;
mod svg;

use std::sync::Arc;

use anyhow::{Context, Result};

pub use fonts::FontAssets;
pub use layout::{Align, Container, Direction, Display, Justify, LayoutNode, Position, Style};
pub use raster::ResvgRasterizer;
pub use svg::SvgLayoutEngine;

pub const OG_WIDTH: u32 = 1200;
pub const OG_HEIGHT: u32 = 630;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: OG_WIDTH,
            height: OG_HEIGHT,
        }
    }
}

/// Turns a box tree into an SVG document of the canvas size.
pub trait LayoutEngine: Send + Sync {
    fn layout(&self, tree: &LayoutNode, fonts: &FontAssets, canvas: Canvas) -> Result<String>;
}

/// Turns an SVG document into PNG bytes.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, svg: &str, options: &RasterOptions) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextQuality {
    Speed,
    Legibility,
    Geometric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeQuality {
    Speed,
    CrispEdges,
    Geometric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageQuality {
    Quality,
    Speed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    pub dpi: f32,
    pub text: TextQuality,
    pub shape: ShapeQuality,
    pub image: ImageQuality,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            dpi: 192.0,
            text: TextQuality::Legibility,
            shape: ShapeQuality::Geometric,
            image: ImageQuality::Quality,
        }
    }
}

/// Site-wide strings printed on every card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OgTemplate {
    pub site_title: String,
    pub category_label: String,
    pub font_family: String,
}

pub struct OgRenderer {
    layout: Box<dyn LayoutEngine>,
    rasterizer: Box<dyn Rasterizer>,
    fonts: Arc<FontAssets>,
    template: OgTemplate,
    canvas: Canvas,
    options: RasterOptions,
}

impl OgRenderer {
    pub fn new(
        layout: Box<dyn LayoutEngine>,
        rasterizer: Box<dyn Rasterizer>,
        fonts: Arc<FontAssets>,
        template: OgTemplate,
    ) -> Self {
        Self {
            layout,
            rasterizer,
            fonts,
            template,
            canvas: Canvas::default(),
            options: RasterOptions::default(),
        }
    }

    pub fn with_default_engines(fonts: Arc<FontAssets>, template: OgTemplate) -> Self {
        let rasterizer = ResvgRasterizer::new(Arc::clone(&fonts));
        Self::new(
            Box::new(SvgLayoutEngine),
            Box::new(rasterizer),
            fonts,
            template,
        )
    }

    /// Renders one card. Layout and raster failures propagate; there is no
    /// placeholder image.
    pub fn render(&self, title: &str, description: &str, date_label: &str) -> Result<Vec<u8>> {
        let tree = self.markup(title, description, date_label);
        let svg = self
            .layout
            .layout(&tree, &self.fonts, self.canvas)
            .with_context(|| format!("failed to lay out preview for '{title}'"))?;
        self.rasterizer
            .rasterize(&svg, &self.options)
            .with_context(|| format!("failed to rasterize preview for '{title}'"))
    }

    pub fn markup(&self, title: &str, description: &str, date_label: &str) -> LayoutNode {
        let family = Some(self.template.font_family.clone());
        let muted = Some("#94a3b8".to_string());

        let glow = |position: Position, size: f32, color: &str| {
            LayoutNode::container(
                Style {
                    position,
                    width: Some(size),
                    height: Some(size),
                    radius: 9999.0,
                    background: Some(color.to_string()),
                    ..Style::default()
                },
                Vec::new(),
            )
        };

        let category = LayoutNode::container(
            Style {
                align: Align::Center,
                gap: 12.0,
                font_size: Some(18.0),
                letter_spacing: Some(0.22),
                uppercase: true,
                color: muted.clone(),
                font_family: family.clone(),
                ..Style::default()
            },
            vec![
                LayoutNode::container(
                    Style {
                        width: Some(44.0),
                        height: Some(3.0),
                        radius: 9999.0,
                        background: Some("#38bdf8".to_string()),
                        ..Style::default()
                    },
                    Vec::new(),
                ),
                LayoutNode::text(self.template.category_label.as_str()),
            ],
        );

        let heading = LayoutNode::container(
            Style {
                font_size: Some(68.0),
                font_weight: Some(700),
                line_height: Some(1.05),
                letter_spacing: Some(-0.02),
                ..Style::default()
            },
            vec![LayoutNode::text(title)],
        );

        let summary = LayoutNode::container(
            Style {
                font_size: Some(32.0),
                color: Some("#cbd5e1".to_string()),
                line_height: Some(1.5),
                font_family: family.clone(),
                ..Style::default()
            },
            vec![LayoutNode::text(description)],
        );

        let body = LayoutNode::container(
            Style {
                direction: Direction::Column,
                gap: 22.0,
                max_width: Some(900.0),
                z_index: 1,
                ..Style::default()
            },
            vec![category, heading, summary],
        );

        let footer_item = |text: &str, weight: Option<u16>, color: &str, spacing: Option<f32>| {
            LayoutNode::container(
                Style {
                    align: Align::Center,
                    gap: 10.0,
                    font_size: Some(24.0),
                    font_weight: weight,
                    color: Some(color.to_string()),
                    letter_spacing: spacing,
                    font_family: family.clone(),
                    ..Style::default()
                },
                vec![LayoutNode::text(text)],
            )
        };

        let footer = LayoutNode::container(
            Style {
                align: Align::Center,
                justify: Justify::SpaceBetween,
                gap: 24.0,
                font_size: Some(20.0),
                color: muted,
                z_index: 1,
                ..Style::default()
            },
            vec![
                footer_item(&self.template.site_title, None, "#e2e8f0", None),
                footer_item(date_label, Some(500), "#f1f5f9", Some(0.02)),
            ],
        );

        LayoutNode::container(
            Style {
                width: Some(self.canvas.width as f32),
                height: Some(self.canvas.height as f32),
                direction: Direction::Column,
                justify: Justify::SpaceBetween,
                padding: 80.0,
                font_family: family.clone(),
                background: Some("#0b0f14".to_string()),
                color: Some("#f8fafc".to_string()),
                overflow_hidden: true,
                border: Some((1.0, "rgba(255,255,255,0.08)".to_string())),
                ..Style::default()
            },
            vec![
                glow(
                    Position::Absolute {
                        top: Some(-180.0),
                        right: Some(-140.0),
                        bottom: None,
                        left: None,
                    },
                    520.0,
                    "rgba(56,189,248,0.15)",
                ),
                glow(
                    Position::Absolute {
                        top: None,
                        right: None,
                        bottom: Some(-140.0),
                        left: Some(-120.0),
                    },
                    420.0,
                    "rgba(99,102,241,0.12)",
                ),
                body,
                footer,
            ],
        )
    }
}
