mod controller;
mod damping;
mod state;

pub use controller::{AdaptiveController, FrameSignals};
pub use damping::Damping;
pub use state::AdaptiveState;
