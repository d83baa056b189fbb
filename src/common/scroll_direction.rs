use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollDirection {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn from_str(direction: &str) -> Option<Self> {
        match direction.to_lowercase().as_str() {
            "up" => Some(ScrollDirection::Up),
            "down" => Some(ScrollDirection::Down),
            "left" => Some(ScrollDirection::Left),
            "right" => Some(ScrollDirection::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }

    /// True for up/down, false for left/right.
    pub fn is_vertical(&self) -> bool {
        matches!(self, ScrollDirection::Up | ScrollDirection::Down)
    }

    /// The frame extent (in pixels) travelled along this direction.
    pub fn frame_extent(&self, frame_width: u32, frame_height: u32) -> u32 {
        if self.is_vertical() {
            frame_height
        } else {
            frame_width
        }
    }
}
