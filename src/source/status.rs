//! Source lifecycle status and window events

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Current state of a source, with progress in `[0, 1]` and a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub state: StatusState,
    pub progress: f64,
    pub message: String,
}

impl Status {
    pub fn idle() -> Self {
        Self {
            state: StatusState::Idle,
            progress: 0.0,
            message: "Idle".to_string(),
        }
    }

    pub fn loading(progress: f64, message: impl Into<String>) -> Self {
        Self {
            state: StatusState::Loading,
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    pub fn ready(message: impl Into<String>) -> Self {
        Self {
            state: StatusState::Ready,
            progress: 1.0,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: StatusState::Error,
            progress: 0.0,
            message: message.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == StatusState::Ready
    }

    pub fn is_error(&self) -> bool {
        self.state == StatusState::Error
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::idle()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowEventReason {
    Loaded,
    Evicted,
}

/// Rows `[start, end)` became resident or were dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEvent {
    pub start: u64,
    pub end: u64,
    pub reason: WindowEventReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_progress_is_clamped() {
        assert_eq!(Status::loading(1.7, "x").progress, 1.0);
        assert_eq!(Status::loading(-0.2, "x").progress, 0.0);
    }

    #[test]
    fn test_status_wire_shape() {
        let json = serde_json::to_string(&Status::ready("Loaded 3 rows")).unwrap();
        assert_eq!(
            json,
            r#"{"state":"ready","progress":1.0,"message":"Loaded 3 rows"}"#
        );
    }
}
