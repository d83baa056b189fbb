use serde::{Deserialize, Serialize};

use crate::common::ScrollDirection;

/// One detected comic panel, as a pixel rectangle of the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PanelRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// The panel edge a reader crosses when scrolling in `direction`.
    pub fn trailing_edge(&self, direction: ScrollDirection) -> u32 {
        match direction {
            ScrollDirection::Down => self.bottom(),
            ScrollDirection::Up => self.y,
            ScrollDirection::Right => self.right(),
            ScrollDirection::Left => self.x,
        }
    }

    /// Sorts panels into reading order, top-to-bottom then left-to-right.
    pub fn sort_reading_order(panels: &mut [PanelRect]) {
        panels.sort_by(|a, b| a.y.cmp(&b.y).then(a.x.cmp(&b.x)));
    }
}
