//! Session state machine for the monitoring loop
//!
//! States: Idle -> Starting -> Active -> Stopping -> Idle.
//! Transitions are serialized by the controller's transition lock; this
//! module only defines the states and the session snapshot.

use serde::Serialize;

/// State of the monitoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session in progress
    #[default]
    Idle,
    /// Acquiring the audio source and starting the scheduler
    Starting,
    /// Capturing and dispatching chunks
    Active,
    /// Tearing down the scheduler and capture session
    Stopping,
}

impl SessionState {
    /// Check if in idle state
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Check if actively monitoring
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }

    /// Check if a start or stop transition is in flight
    pub fn is_transitioning(&self) -> bool {
        matches!(self, SessionState::Starting | SessionState::Stopping)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Starting => write!(f, "Starting"),
            SessionState::Active => write!(f, "Active"),
            SessionState::Stopping => write!(f, "Stopping"),
        }
    }
}

/// Snapshot describing the current or last session
///
/// Replaced on each start, marked inactive on stop. Read-only to
/// subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    /// Label for the monitored source
    pub source_label: String,
    /// When the session started, epoch milliseconds
    pub started_at_epoch_ms: i64,
    /// Whether the session is still running
    pub is_active: bool,
}

impl SessionInfo {
    /// Create a snapshot for a session starting now
    pub fn started_now(source_label: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
            started_at_epoch_ms: chrono::Utc::now().timestamp_millis(),
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let state = SessionState::default();
        assert!(state.is_idle());
        assert!(!state.is_active());
    }

    #[test]
    fn test_transitioning_states() {
        assert!(SessionState::Starting.is_transitioning());
        assert!(SessionState::Stopping.is_transitioning());
        assert!(!SessionState::Idle.is_transitioning());
        assert!(!SessionState::Active.is_transitioning());
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::Idle.to_string(), "Idle");
        assert_eq!(SessionState::Active.to_string(), "Active");
    }

    #[test]
    fn test_session_info_started_now() {
        let info = SessionInfo::started_now("Live Call");
        assert_eq!(info.source_label, "Live Call");
        assert!(info.is_active);
        assert!(info.started_at_epoch_ms > 0);
    }
}
