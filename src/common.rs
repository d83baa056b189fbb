mod categories;
mod det_box;
mod detection;
mod detection_result;
mod model_status;
mod panel_rect;
mod scroll_direction;

pub use categories::{ComicCategory, ContentCategory};
pub use det_box::DetBox;
pub use detection::Detection;
pub use detection_result::DetectionResult;
pub use model_status::ModelStatus;
pub use panel_rect::PanelRect;
pub use scroll_direction::ScrollDirection;
