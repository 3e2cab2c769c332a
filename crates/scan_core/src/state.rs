use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    domain::{ItemId, ItemRecord},
    error::{ErrorCode, LookupError},
};

pub const INVALID_CODE_ALERT: &str = "invalid code scanned";
pub const NOT_FOUND_ALERT: &str = "no data found for the scanned id";
pub const LOOKUP_FAILED_ALERT_PREFIX: &str = "failed to fetch item details";
pub const LOADING_STATUS_TEXT: &str = "Loading item details...";
pub const FAILED_STATUS_TEXT: &str = "Failed to fetch item details.";

/// Lifecycle of one scan-to-result attempt.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(tag = "state", content = "item_id", rename_all = "snake_case")]
pub enum CycleState {
    #[default]
    Idle,
    Locked(ItemId),
    Loading(ItemId),
    Resolved(ItemId),
    NotFound(ItemId),
    Failed(ItemId),
}

impl CycleState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved(_) | Self::NotFound(_) | Self::Failed(_))
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Locked(_) | Self::Loading(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Locked(_) => "locked",
            Self::Loading(_) => "loading",
            Self::Resolved(_) => "resolved",
            Self::NotFound(_) => "not_found",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AlertMessage {
    pub code: ErrorCode,
    pub text: String,
    pub raised_at: DateTime<Utc>,
}

impl AlertMessage {
    pub fn new(code: ErrorCode, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn invalid_code() -> Self {
        Self::new(ErrorCode::InvalidPayload, INVALID_CODE_ALERT)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorCode::EmptyResult, NOT_FOUND_ALERT)
    }

    pub fn lookup_failed(err: &LookupError) -> Self {
        Self::new(err.code(), format!("{LOOKUP_FAILED_ALERT_PREFIX}: {err}"))
    }
}

/// Read-only view handed to the UI collaborator.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct ScanSnapshot {
    pub state: CycleState,
    pub item: Option<ItemRecord>,
    pub alert: Option<AlertMessage>,
}

impl ScanSnapshot {
    /// The camera collaborator must stop delivering detections while this is true.
    pub fn scanning_paused(&self) -> bool {
        !self.state.is_idle()
    }

    pub fn scan_again_available(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn status_text(&self) -> Option<&'static str> {
        self.state.is_in_flight().then_some(LOADING_STATUS_TEXT)
    }

    pub fn error_text(&self) -> Option<&'static str> {
        matches!(self.state, CycleState::Failed(_)).then_some(FAILED_STATUS_TEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_follows_cycle_state() {
        let mut snapshot = ScanSnapshot::default();
        assert!(!snapshot.scanning_paused());
        assert_eq!(snapshot.status_text(), None);

        snapshot.state = CycleState::Loading(ItemId(3));
        assert!(snapshot.scanning_paused());
        assert!(!snapshot.scan_again_available());
        assert_eq!(snapshot.status_text(), Some(LOADING_STATUS_TEXT));

        snapshot.state = CycleState::Failed(ItemId(3));
        assert!(snapshot.scan_again_available());
        assert_eq!(snapshot.status_text(), None);
        assert_eq!(snapshot.error_text(), Some(FAILED_STATUS_TEXT));
    }

    #[test]
    fn lookup_failed_alert_carries_detail() {
        let alert = AlertMessage::lookup_failed(&LookupError::Status {
            status: 500,
            body: "boom".into(),
        });
        assert_eq!(alert.code, ErrorCode::TransportError);
        assert_eq!(
            alert.text,
            "failed to fetch item details: lookup service returned 500: boom"
        );
    }
}
