// MIT License - Copyright (c) 2026 Peter Wright

use std::fmt;

/// Sensor category of a zone, as announced in summary payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneType {
    Motion,
    PanelMotion,
    DoorWindow,
    Water,
    SmokeDetector,
    CODetector,
    Bluetooth,
    GlassBreak,
    PanelGlassBreak,
    TakeoverModule,
    Unknown,
}

impl ZoneType {
    /// Parse a `type` wire string from a summary zone entry.
    ///
    /// The panel mixes underscore and space conventions; both spellings
    /// observed in the field are listed here. Unrecognized types map to
    /// `Unknown` — the caller decides whether that is worth logging.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "Motion" => Self::Motion,
            "Panel Motion" => Self::PanelMotion,
            "Door_Window" => Self::DoorWindow,
            "Water" => Self::Water,
            "SmokeDetector" => Self::SmokeDetector,
            "CODetector" => Self::CODetector,
            "Bluetooth" => Self::Bluetooth,
            "GlassBreak" => Self::GlassBreak,
            "Panel Glass Break" => Self::PanelGlassBreak,
            "Takeover Module" => Self::TakeoverModule,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Motion => "Motion",
            Self::PanelMotion => "PanelMotion",
            Self::DoorWindow => "DoorWindow",
            Self::Water => "Water",
            Self::SmokeDetector => "SmokeDetector",
            Self::CODetector => "CODetector",
            Self::Bluetooth => "Bluetooth",
            Self::GlassBreak => "GlassBreak",
            Self::PanelGlassBreak => "PanelGlassBreak",
            Self::TakeoverModule => "TakeoverModule",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Reported condition of a zone.
///
/// The status space is shared by all zone types; what a value means depends
/// on the sensor (a Water zone reporting `Open` has detected a leak).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneStatus {
    Open,
    Closed,
    Active,
    Idle,
    Unknown,
}

impl ZoneStatus {
    /// Parse a `status` wire string. Unrecognized values map to `Unknown`.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "Open" => Self::Open,
            "Closed" => Self::Closed,
            "Active" => Self::Active,
            "Idle" => Self::Idle,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::Active => "Active",
            Self::Idle => "Idle",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// A single sensor point belonging to one partition.
#[derive(Debug, Clone)]
pub struct Zone {
    pub zone_id: u32,
    pub name: String,
    pub partition_id: u32,
    zone_type: ZoneType,
    status: ZoneStatus,
}

impl Zone {
    pub fn new(zone_id: u32) -> Self {
        Self {
            zone_id,
            name: String::new(),
            partition_id: 0,
            zone_type: ZoneType::Unknown,
            status: ZoneStatus::Unknown,
        }
    }

    pub fn zone_type(&self) -> ZoneType {
        self.zone_type
    }

    pub fn status(&self) -> ZoneStatus {
        self.status
    }

    /// Assign the zone type from its summary wire string.
    pub fn set_type(&mut self, s: &str) {
        self.zone_type = ZoneType::from_wire(s);
    }

    /// Set the status from a wire string. Returns true iff the status
    /// actually changed; re-announcements of the current status are no-ops.
    pub fn set_status_from_string(&mut self, s: &str) -> bool {
        let new_status = ZoneStatus::from_wire(s);
        if new_status == self.status {
            return false;
        }
        self.status = new_status;
        true
    }
}
