// MIT License - Copyright (c) 2026 Peter Wright

//! # qolsys-panel
//!
//! Direct TLS communication with Qolsys IQ Panel alarm systems.
//!
//! This library maintains a persistent session with the panel's control
//! service, rebuilds an in-memory model of its partitions and zones from
//! summary payloads, and emits change notifications only on genuine state
//! transitions. Arm/disarm commands are encoded into the same framed-JSON
//! wire format. No dependencies beyond tokio, native-tls, serde, thiserror
//! and tracing.
//!
//! A secure access token and user PIN must already be provisioned on the
//! panel (dealer menu, third-party connections); this library does not
//! perform pairing.
//!
//! ## Quick Start
//!
//! ```no_run
//! use qolsys_panel::{AlarmMode, ControllerEvent, PanelConfig, QolsysController};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PanelConfig::builder()
//!         .host("192.168.0.100")
//!         .port(14999)
//!         .secure_token("0123456789ab")
//!         .user_pin_code("1234")
//!         .build();
//!
//!     let mut controller = QolsysController::new(config);
//!     let mut events = controller.subscribe();
//!     controller.connect().await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             ControllerEvent::PanelReadyForOperation(_) => {
//!                 controller.start_operation().await?;
//!             }
//!             ControllerEvent::ZoneStatusChange(zone) => {
//!                 println!("Zone {} is now {}", zone.zone_id, zone.status());
//!             }
//!             ControllerEvent::PartitionAlarmModeChange(partition) => {
//!                 println!("Partition {} is now {}", partition.id, partition.status());
//!             }
//!             _ => {}
//!         }
//!     }
//!
//!     controller.send_arm_command(AlarmMode::ArmStay, 0, 0, true).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod devices;
pub mod error;
pub mod event;
pub mod protocol;

// Re-exports for convenience
pub use config::{PanelConfig, PanelConfigBuilder};
pub use controller::QolsysController;
pub use devices::partition::{AlarmMode, Partition};
pub use devices::zone::{Zone, ZoneStatus, ZoneType};
pub use error::{ControllerErrorKind, QolsysError, Result};
pub use event::{ControllerEvent, EventReceiver, EventSender};
