use std::fmt::Write as _;

use anyhow::Result;

use crate::markdown::escape_html;

use super::fonts::FontAssets;
use super::layout::{Align, Container, Direction, Display, Justify, LayoutNode, Position, Style};
use super::{Canvas, LayoutEngine};

const DEFAULT_FONT_SIZE: f32 = 16.0;
const DEFAULT_LINE_HEIGHT: f32 = 1.2;
const DEFAULT_COLOR: &str = "#000000";
const DEFAULT_WEIGHT: u16 = 400;
/// Slack for float drift between measuring and placing wrapped text.
const WRAP_TOLERANCE: f32 = 0.5;

/// Lays the box tree out with a small flexbox subset and emits SVG.
///
/// Glyph advances are estimated per character class rather than read from
/// the font tables, so output depends only on the tree and family names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgLayoutEngine;

impl LayoutEngine for SvgLayoutEngine {
    fn layout(&self, tree: &LayoutNode, fonts: &FontAssets, canvas: Canvas) -> Result<String> {
        let mut writer = SvgWriter {
            fonts,
            out: String::new(),
            clip_ids: 0,
        };
        write!(
            writer.out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = canvas.width,
            h = canvas.height
        )?;
        let root = Rect {
            x: 0.0,
            y: 0.0,
            width: canvas.width as f32,
            height: canvas.height as f32,
        };
        writer.place(tree, root, &TextStyle::default())?;
        writer.out.push_str("</svg>");
        Ok(writer.out)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TextStyle {
    color: String,
    family: Option<String>,
    size: f32,
    weight: u16,
    line_height: f32,
    letter_spacing: f32,
    uppercase: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            family: None,
            size: DEFAULT_FONT_SIZE,
            weight: DEFAULT_WEIGHT,
            line_height: DEFAULT_LINE_HEIGHT,
            letter_spacing: 0.0,
            uppercase: false,
        }
    }
}

impl TextStyle {
    fn inherit(&self, style: &Style) -> Self {
        Self {
            color: style.color.clone().unwrap_or_else(|| self.color.clone()),
            family: style.font_family.clone().or_else(|| self.family.clone()),
            size: style.font_size.unwrap_or(self.size),
            weight: style.font_weight.unwrap_or(self.weight),
            line_height: style.line_height.unwrap_or(self.line_height),
            letter_spacing: style.letter_spacing.unwrap_or(self.letter_spacing),
            uppercase: style.uppercase || self.uppercase,
        }
    }

    fn line_px(&self) -> f32 {
        self.size * self.line_height
    }

    fn advance(&self, ch: char) -> f32 {
        let base = if is_wide(ch) {
            1.0
        } else if ch == ' ' {
            0.28
        } else if ch.is_ascii_uppercase() || ch.is_ascii_digit() {
            0.62
        } else {
            0.52
        };
        (base + self.letter_spacing) * self.size
    }

    fn measure(&self, text: &str) -> f32 {
        text.chars().map(|ch| self.advance(ch)).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Size {
    width: f32,
    height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Rect {
    fn inset(self, padding: f32) -> Self {
        Self {
            x: self.x + padding,
            y: self.y + padding,
            width: (self.width - 2.0 * padding).max(0.0),
            height: (self.height - 2.0 * padding).max(0.0),
        }
    }
}

struct SvgWriter<'f> {
    fonts: &'f FontAssets,
    out: String,
    clip_ids: usize,
}

impl SvgWriter<'_> {
    fn place(&mut self, node: &LayoutNode, rect: Rect, inherited: &TextStyle) -> Result<()> {
        match node {
            LayoutNode::Text(text) => self.text(text, rect, inherited),
            LayoutNode::Container(container) => self.container(container, rect, inherited),
        }
    }

    fn container(&mut self, container: &Container, rect: Rect, inherited: &TextStyle) -> Result<()> {
        let style = &container.style;
        if style.display == Some(Display::None) {
            return Ok(());
        }
        let text_style = inherited.inherit(style);
        self.decorate(style, rect)?;

        let clipped = style.overflow_hidden;
        if clipped {
            self.clip_ids += 1;
            write!(
                self.out,
                r#"<clipPath id="clip{id}"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}"/></clipPath><g clip-path="url(#clip{id})">"#,
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                style.radius,
                id = self.clip_ids
            )?;
        }

        let mut placed = arrange(container, rect, &text_style);
        placed.sort_by_key(|(index, _)| {
            container.children[*index]
                .style()
                .map_or(0, |child| child.z_index)
        });
        for (index, child_rect) in placed {
            self.place(&container.children[index], child_rect, &text_style)?;
        }

        if clipped {
            self.out.push_str("</g>");
        }
        Ok(())
    }

    fn decorate(&mut self, style: &Style, rect: Rect) -> Result<()> {
        if let Some(fill) = &style.background {
            let round = (rect.width - rect.height).abs() < 0.01 && style.radius * 2.0 >= rect.width;
            if round {
                write!(
                    self.out,
                    r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
                    rect.x + rect.width / 2.0,
                    rect.y + rect.height / 2.0,
                    rect.width / 2.0,
                    escape_html(fill)
                )?;
            } else {
                write!(
                    self.out,
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="{}"/>"#,
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    style.radius.min(rect.width / 2.0).min(rect.height / 2.0),
                    escape_html(fill)
                )?;
            }
        }
        if let Some((width, color)) = &style.border {
            write!(
                self.out,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="none" stroke="{}" stroke-width="{:.2}"/>"#,
                rect.x + width / 2.0,
                rect.y + width / 2.0,
                (rect.width - width).max(0.0),
                (rect.height - width).max(0.0),
                style.radius,
                escape_html(color),
                width
            )?;
        }
        Ok(())
    }

    fn text(&mut self, text: &str, rect: Rect, style: &TextStyle) -> Result<()> {
        let content = if style.uppercase {
            text.to_uppercase()
        } else {
            text.to_string()
        };
        let family = self.family_list(style);
        let line_px = style.line_px();
        let spacing = style.letter_spacing * style.size;

        for (row, (line, _)) in wrap(&content, style, rect.width + WRAP_TOLERANCE)
            .into_iter()
            .enumerate()
        {
            let baseline =
                rect.y + row as f32 * line_px + (line_px - style.size) / 2.0 + style.size * 0.8;
            write!(
                self.out,
                r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" font-weight="{}" fill="{}""#,
                rect.x,
                baseline,
                escape_html(&family),
                style.size,
                style.weight,
                escape_html(&style.color)
            )?;
            if spacing != 0.0 {
                write!(self.out, r#" letter-spacing="{:.2}""#, spacing)?;
            }
            write!(self.out, ">{}</text>", escape_html(&line))?;
        }
        Ok(())
    }

    /// The face matching the weight first, then whatever the style asked for.
    fn family_list(&self, style: &TextStyle) -> String {
        let primary = self.fonts.family_for(style.weight);
        match &style.family {
            Some(requested) if requested != primary => format!("'{primary}', '{requested}'"),
            _ => format!("'{primary}'"),
        }
    }
}

/// Positions every visible child of `container` inside `rect`; returns
/// `(child index, rect)` pairs in document order.
fn arrange(container: &Container, rect: Rect, text_style: &TextStyle) -> Vec<(usize, Rect)> {
    let style = &container.style;
    let inner = rect.inset(style.padding);
    let mut placed = Vec::with_capacity(container.children.len());

    let flow: Vec<(usize, &LayoutNode, Size)> = container
        .children
        .iter()
        .enumerate()
        .filter(|(_, child)| child.display() != Display::None)
        .filter(|(_, child)| !child.style().is_some_and(Style::is_absolute))
        .map(|(index, child)| (index, child, measure(child, text_style, inner.width)))
        .collect();

    let column = style.direction == Direction::Column;
    let (main_avail, cross_avail) = if column {
        (inner.height, inner.width)
    } else {
        (inner.width, inner.height)
    };
    let main_of = |size: Size| if column { size.height } else { size.width };
    let cross_of = |size: Size| if column { size.width } else { size.height };

    let used: f32 = flow.iter().map(|(_, _, size)| main_of(*size)).sum();
    let count = flow.len();
    let gaps = style.gap * count.saturating_sub(1) as f32;
    let (mut cursor, spacing) = match style.justify {
        Justify::Start => (0.0, style.gap),
        Justify::Center => (((main_avail - used - gaps) / 2.0).max(0.0), style.gap),
        Justify::SpaceBetween if count > 1 => {
            (0.0, ((main_avail - used) / (count - 1) as f32).max(style.gap))
        }
        Justify::SpaceBetween => (0.0, style.gap),
    };

    for (index, child, size) in flow {
        let stretches = matches!(child, LayoutNode::Container(_)) && style.align == Align::Stretch;
        let explicit_cross = child.style().and_then(|child_style| {
            if column {
                child_style.width
            } else {
                child_style.height
            }
        });
        let cross = match explicit_cross {
            Some(value) => value,
            None if stretches => cross_avail,
            None => cross_of(size).min(cross_avail),
        };
        let cross = match child.style().and_then(|child_style| child_style.max_width) {
            Some(max_width) if column => cross.min(max_width),
            _ => cross,
        };
        let offset = match style.align {
            Align::Center => ((cross_avail - cross) / 2.0).max(0.0),
            Align::Start | Align::Stretch => 0.0,
        };
        let main = main_of(size);
        let child_rect = if column {
            Rect {
                x: inner.x + offset,
                y: inner.y + cursor,
                width: cross,
                height: main,
            }
        } else {
            Rect {
                x: inner.x + cursor,
                y: inner.y + offset,
                width: main,
                height: cross,
            }
        };
        placed.push((index, child_rect));
        cursor += main + spacing;
    }

    for (index, child) in container.children.iter().enumerate() {
        let Some(child_style) = child.style() else {
            continue;
        };
        let Position::Absolute {
            top,
            right,
            bottom,
            left,
        } = child_style.position
        else {
            continue;
        };
        if child_style.display == Some(Display::None) {
            continue;
        }
        let size = measure(child, text_style, rect.width);
        let x = left
            .map(|left| rect.x + left)
            .or_else(|| right.map(|right| rect.x + rect.width - right - size.width))
            .unwrap_or(inner.x);
        let y = top
            .map(|top| rect.y + top)
            .or_else(|| bottom.map(|bottom| rect.y + rect.height - bottom - size.height))
            .unwrap_or(inner.y);
        placed.push((
            index,
            Rect {
                x,
                y,
                width: size.width,
                height: size.height,
            },
        ));
    }

    placed.sort_by_key(|(index, _)| *index);
    placed
}

fn measure(node: &LayoutNode, inherited: &TextStyle, max_width: f32) -> Size {
    match node {
        LayoutNode::Text(text) => {
            let content = if inherited.uppercase {
                text.to_uppercase()
            } else {
                text.clone()
            };
            let lines = wrap(&content, inherited, max_width);
            Size {
                width: lines.iter().map(|(_, width)| *width).fold(0.0, f32::max),
                height: lines.len() as f32 * inherited.line_px(),
            }
        }
        LayoutNode::Container(container) => {
            let style = &container.style;
            if style.display == Some(Display::None) {
                return Size::default();
            }
            let text_style = inherited.inherit(style);
            let outer_max = style
                .width
                .unwrap_or(max_width)
                .min(style.max_width.unwrap_or(f32::INFINITY));
            let inner_max = (outer_max - 2.0 * style.padding).max(0.0);

            let sizes: Vec<Size> = container
                .children
                .iter()
                .filter(|child| child.display() != Display::None)
                .filter(|child| !child.style().is_some_and(Style::is_absolute))
                .map(|child| measure(child, &text_style, inner_max))
                .collect();
            let gaps = style.gap * sizes.len().saturating_sub(1) as f32;
            let content = match style.direction {
                Direction::Row => Size {
                    width: sizes.iter().map(|size| size.width).sum::<f32>() + gaps,
                    height: sizes.iter().map(|size| size.height).fold(0.0, f32::max),
                },
                Direction::Column => Size {
                    width: sizes.iter().map(|size| size.width).fold(0.0, f32::max),
                    height: sizes.iter().map(|size| size.height).sum::<f32>() + gaps,
                },
            };

            Size {
                width: style
                    .width
                    .unwrap_or((content.width + 2.0 * style.padding).min(outer_max)),
                height: style
                    .height
                    .unwrap_or(content.height + 2.0 * style.padding),
            }
        }
    }
}

/// Greedy line breaking. Wide (CJK) characters may break anywhere, other
/// text breaks at spaces; a single overlong word keeps its own line.
fn wrap(text: &str, style: &TextStyle, max_width: f32) -> Vec<(String, f32)> {
    let mut tokens: Vec<(String, bool)> = Vec::new();
    let mut pending_space = false;
    let mut word = String::new();

    for ch in text.chars() {
        if ch.is_whitespace() {
            if !word.is_empty() {
                tokens.push((std::mem::take(&mut word), pending_space));
                pending_space = false;
            }
            pending_space = pending_space || !tokens.is_empty();
        } else if is_wide(ch) {
            if !word.is_empty() {
                tokens.push((std::mem::take(&mut word), pending_space));
                pending_space = false;
            }
            tokens.push((ch.to_string(), pending_space));
            pending_space = false;
        } else {
            word.push(ch);
        }
    }
    if !word.is_empty() {
        tokens.push((word, pending_space));
    }

    let space = style.advance(' ');
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut width = 0.0;
    for (token, spaced) in tokens {
        let token_width = style.measure(&token);
        let gap = if spaced && !line.is_empty() { space } else { 0.0 };
        if !line.is_empty() && width + gap + token_width > max_width {
            lines.push((std::mem::take(&mut line), width));
            line = token;
            width = token_width;
        } else {
            if gap > 0.0 {
                line.push(' ');
            }
            line.push_str(&token);
            width += gap + token_width;
        }
    }
    if !line.is_empty() {
        lines.push((line, width));
    }
    lines
}

fn is_wide(ch: char) -> bool {
    matches!(
        ch,
        '\u{1100}'..='\u{115F}'
            | '\u{2E80}'..='\u{A4CF}'
            | '\u{AC00}'..='\u{D7A3}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{FE30}'..='\u{FE4F}'
            | '\u{FF00}'..='\u{FF60}'
            | '\u{FFE0}'..='\u{FFE6}'
            | '\u{1F300}'..='\u{1FAFF}'
            | '\u{20000}'..='\u{3FFFD}'
    )
}
