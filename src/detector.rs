mod bubble_detector;
pub mod nms;
mod postprocess;
mod preprocess;

pub use bubble_detector::BubbleDetector;
pub use postprocess::process_predictions;
pub(crate) use preprocess::process_image;
