mod complexity;
mod panels;

pub use complexity::image_complexity;
pub use panels::{detect_panels, fallback_grid};
