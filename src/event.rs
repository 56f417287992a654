// MIT License - Copyright (c) 2026 Peter Wright

use crate::devices::partition::Partition;
use crate::devices::zone::Zone;
use crate::error::ControllerErrorKind;

/// All events that can be emitted by the controller.
///
/// Users subscribe via `controller.subscribe()` to receive a
/// `tokio::sync::broadcast::Receiver<ControllerEvent>`. Delivery is in order
/// per subscriber; device events carry a snapshot of the device at emission
/// time.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// First summary of the connection has been ingested; the model is
    /// complete and commands may be issued. Fires once per connection.
    PanelReadyForOperation(bool),
    /// Live change notifications started (true) or stopped on connection
    /// loss (false).
    PanelReceivingNotification(bool),
    /// A classified, non-fatal error. The message includes the raw frame
    /// text where one was involved.
    ControllerError {
        kind: ControllerErrorKind,
        message: String,
    },
    /// A zone underwent a genuine status transition.
    ZoneStatusChange(Zone),
    /// A partition underwent a genuine alarm-mode transition.
    PartitionAlarmModeChange(Partition),
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<ControllerEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<ControllerEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}
