//! Engine-neutral box tree describing a preview card.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Flex,
    Block,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Start,
    Center,
    SpaceBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Stretch,
    Start,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Relative,
    Absolute {
        top: Option<f32>,
        right: Option<f32>,
        bottom: Option<f32>,
        left: Option<f32>,
    },
}

/// Box and text attributes. Text attributes left as `None` inherit from the
/// enclosing box.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub display: Option<Display>,
    pub direction: Direction,
    pub justify: Justify,
    pub align: Align,
    pub gap: f32,
    pub padding: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub max_width: Option<f32>,
    pub position: Position,
    pub z_index: i32,
    pub radius: f32,
    pub background: Option<String>,
    pub border: Option<(f32, String)>,
    pub overflow_hidden: bool,
    pub color: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_weight: Option<u16>,
    pub line_height: Option<f32>,
    /// In em.
    pub letter_spacing: Option<f32>,
    pub uppercase: bool,
}

impl Style {
    pub fn is_absolute(&self) -> bool {
        matches!(self.position, Position::Absolute { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub style: Style,
    pub children: Vec<LayoutNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutNode {
    Container(Container),
    Text(String),
}

impl LayoutNode {
    /// Builds a box. Boxes lay out as flex unless the style says otherwise,
    /// and empty text children are dropped.
    pub fn container(mut style: Style, children: Vec<LayoutNode>) -> Self {
        if style.display.is_none() {
            style.display = Some(Display::Flex);
        }
        let children = children
            .into_iter()
            .filter(|child| !matches!(child, LayoutNode::Text(text) if text.is_empty()))
            .collect();
        LayoutNode::Container(Container { style, children })
    }

    pub fn text(value: impl Into<String>) -> Self {
        LayoutNode::Text(value.into())
    }

    pub fn display(&self) -> Display {
        match self {
            LayoutNode::Container(container) => container.style.display.unwrap_or_default(),
            LayoutNode::Text(_) => Display::Block,
        }
    }

    pub fn style(&self) -> Option<&Style> {
        match self {
            LayoutNode::Container(container) => Some(&container.style),
            LayoutNode::Text(_) => None,
        }
    }
}
