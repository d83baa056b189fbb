/// Lifecycle of the detection model within a session.
///
/// Transitions are monotonic (NotLoaded -> Loading -> Ready/NotAvailable/Error)
/// except that a successful re-initialization may take Error back to Ready,
/// and `release()` returns any terminal state to NotLoaded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    #[default]
    NotLoaded,
    Loading,
    Ready,
    Error,
    /// No model asset could be resolved. Detection is skipped for the whole
    /// session and the controller runs on density-only signals.
    NotAvailable,
}

impl ModelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelStatus::NotLoaded => "not_loaded",
            ModelStatus::Loading => "loading",
            ModelStatus::Ready => "ready",
            ModelStatus::Error => "error",
            ModelStatus::NotAvailable => "not_available",
        }
    }

    /// True once initialization has finished, whatever the outcome.
    pub fn is_settled(&self) -> bool {
        !matches!(self, ModelStatus::NotLoaded | ModelStatus::Loading)
    }

    /// True when a detection pass should be attempted. `Error` is included:
    /// an inference failure is transient, the next frame retries, and a
    /// clean pass restores `Ready`.
    pub fn allows_detection(&self) -> bool {
        matches!(self, ModelStatus::Ready | ModelStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_is_attempted_while_ready_or_errored() {
        assert!(ModelStatus::Ready.allows_detection());
        assert!(ModelStatus::Error.allows_detection());
        assert!(!ModelStatus::NotLoaded.allows_detection());
        assert!(!ModelStatus::Loading.allows_detection());
        assert!(!ModelStatus::NotAvailable.allows_detection());
    }

    #[test]
    fn settled_means_initialization_finished() {
        assert!(!ModelStatus::NotLoaded.is_settled());
        assert!(!ModelStatus::Loading.is_settled());
        assert!(ModelStatus::Ready.is_settled());
        assert!(ModelStatus::Error.is_settled());
        assert!(ModelStatus::NotAvailable.is_settled());
    }
}
