use thiserror::Error;

use crate::state::CycleState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("cannot {action} while {}", .state.name())]
    InvalidTransition {
        action: &'static str,
        state: CycleState,
    },
    #[error("lookup completion for cycle {ticket_cycle} does not match the active cycle")]
    StaleCompletion { ticket_cycle: u64 },
    #[error("scan session is no longer running")]
    SessionClosed,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid lookup url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
