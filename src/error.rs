// MIT License - Copyright (c) 2026 Peter Wright

use std::fmt;

use crate::devices::partition::AlarmMode;

/// Classification of a reported controller error.
///
/// All of these are non-fatal: the engine reports them over the event bus
/// and keeps running. `ConnectionError` is the only kind after which the
/// session is unusable until the consumer calls `connect()` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerErrorKind {
    /// Socket timeout or transport error; requires an external reconnect.
    ConnectionError,
    /// Frame with an unrecognized top-level `event` value.
    InvalidPayloadEvent,
    /// INFO frame with an unrecognized `info_type`.
    InvalidPayloadInfoType,
    /// ZONE_EVENT frame with an unrecognized `zone_event_type`.
    InvalidZoneEventType,
    /// ARMING frame (or outbound arm request) with an unrecognized arming type.
    InvalidArmingType,
    /// ALARM frame with an unrecognized `alarm_type`.
    InvalidAlarmType,
    /// The panel itself reported an application-level error.
    QolsysPanelError,
}

impl ControllerErrorKind {
    /// Human-readable description, matching the panel integration's
    /// long-standing log vocabulary.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ConnectionError => "Panel Connection Error",
            Self::InvalidPayloadEvent => "Received Invalid Payload Event",
            Self::InvalidPayloadInfoType => "Received Invalid Payload Info Type",
            Self::InvalidZoneEventType => "Received Invalid Zone Event Type",
            Self::InvalidArmingType => "Received Invalid Arming Type",
            Self::InvalidAlarmType => "Received Invalid Alarm Type",
            Self::QolsysPanelError => "Qolsys Panel Error",
        }
    }
}

impl fmt::Display for ControllerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// All errors that can be returned by the qolsys-panel API.
#[derive(Debug, thiserror::Error)]
pub enum QolsysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Not connected to panel")]
    Disconnected,

    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Arming type not sendable: {mode}")]
    InvalidArmingType { mode: AlarmMode },
}

pub type Result<T> = std::result::Result<T, QolsysError>;
