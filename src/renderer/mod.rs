//! Draw intents
//!
//! Screens describe what they want drawn as a flat list of `DrawCommand`s.
//! A platform backend (canvas, terminal, test harness) turns them into pixels;
//! nothing here ever reads back from the screen.

pub mod hud;
pub mod palette;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Horizontal anchor for text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// One primitive draw request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCommand {
    Clear(Color),
    Text {
        text: String,
        pos: Vec2,
        color: Color,
        size: f32,
        align: TextAlign,
    },
    Rect {
        pos: Vec2,
        size: Vec2,
        color: Color,
        alpha: f32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
        alpha: f32,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Color,
        width: f32,
    },
}

/// Ordered draw list for one frame
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    /// Centered text
    pub fn text(&mut self, text: impl Into<String>, pos: Vec2, color: Color, size: f32) {
        self.text_aligned(text, pos, color, size, TextAlign::Center);
    }

    pub fn text_aligned(
        &mut self,
        text: impl Into<String>,
        pos: Vec2,
        color: Color,
        size: f32,
        align: TextAlign,
    ) {
        self.commands.push(DrawCommand::Text {
            text: text.into(),
            pos,
            color,
            size,
            align,
        });
    }

    pub fn rect(&mut self, pos: Vec2, size: Vec2, color: Color) {
        self.rect_alpha(pos, size, color, 1.0);
    }

    pub fn rect_alpha(&mut self, pos: Vec2, size: Vec2, color: Color, alpha: f32) {
        self.commands.push(DrawCommand::Rect {
            pos,
            size,
            color,
            alpha: alpha.clamp(0.0, 1.0),
        });
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.circle_alpha(center, radius, color, 1.0);
    }

    pub fn circle_alpha(&mut self, center: Vec2, radius: f32, color: Color, alpha: f32) {
        if radius <= 0.0 {
            return;
        }
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
            alpha: alpha.clamp(0.0, 1.0),
        });
    }

    pub fn line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Hand the frame's commands to the host
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// All text strings drawn this frame (handy for assertions and logging)
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}
