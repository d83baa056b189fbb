use std::time::Duration;

/// Outcome of one panel-boundary proximity check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Damping {
    /// No boundary close enough, or the check is rate-limited.
    None,
    /// Scale the next swipe by this factor; always within `(0, 1]`, so the
    /// scroll keeps moving.
    SlowDown(f32),
    /// Hold scrolling for this long, then resume at normal speed. Emitted
    /// once per boundary approach when auto-pause is on.
    Pause(Duration),
}

impl Damping {
    pub fn is_none(&self) -> bool {
        matches!(self, Damping::None)
    }
}
