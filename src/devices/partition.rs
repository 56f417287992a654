// MIT License - Copyright (c) 2026 Peter Wright

use std::fmt;

/// Arming/alarm mode of a partition.
///
/// Values mirror the panel's `arming_type`/`status` wire strings. The three
/// `Alarm*` members are never carried by summary statuses; they are entered
/// via ALARM events and left via a later DISARM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmMode {
    Disarm,
    ExitDelay,
    EntryDelay,
    ArmStay,
    ArmAway,
    AlarmPolice,
    AlarmFire,
    AlarmAuxiliary,
    Unknown,
}

impl AlarmMode {
    /// Parse a partition status / arming type wire string.
    ///
    /// Anything unrecognized maps to `Unknown` — the panel occasionally
    /// announces transitional statuses we do not track.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "DISARM" => Self::Disarm,
            "EXIT_DELAY" => Self::ExitDelay,
            "ENTRY_DELAY" => Self::EntryDelay,
            "ARM_STAY" => Self::ArmStay,
            "ARM_AWAY" => Self::ArmAway,
            _ => Self::Unknown,
        }
    }

    /// The wire string representation (e.g., "ARM_STAY").
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Disarm => "DISARM",
            Self::ExitDelay => "EXIT_DELAY",
            Self::EntryDelay => "ENTRY_DELAY",
            Self::ArmStay => "ARM_STAY",
            Self::ArmAway => "ARM_AWAY",
            Self::AlarmPolice => "ALARM_POLICE",
            Self::AlarmFire => "ALARM_FIRE",
            Self::AlarmAuxiliary => "ALARM_AUXILIARY",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether this mode may be requested with an outbound arm command.
    ///
    /// The panel only accepts DISARM, ARM_STAY and ARM_AWAY; delay and alarm
    /// states are entered by the panel on its own.
    pub fn is_sendable(&self) -> bool {
        matches!(self, Self::Disarm | Self::ArmStay | Self::ArmAway)
    }
}

impl fmt::Display for AlarmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// A single arming area of the panel.
#[derive(Debug, Clone)]
pub struct Partition {
    pub id: u32,
    pub name: String,
    pub secure_arm: bool,
    status: AlarmMode,
    previous_status: AlarmMode,
}

impl Partition {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            name: String::new(),
            secure_arm: false,
            status: AlarmMode::Unknown,
            previous_status: AlarmMode::Unknown,
        }
    }

    /// Current alarm mode.
    pub fn status(&self) -> AlarmMode {
        self.status
    }

    /// The mode held immediately before the current one.
    ///
    /// Consumers use this to attribute an ENTRY_DELAY to the arming mode it
    /// interrupts: "entering from Stay" vs "entering from Away".
    pub fn previous_status(&self) -> AlarmMode {
        self.previous_status
    }

    /// Set the alarm mode. Returns true iff the mode actually changed.
    ///
    /// `previous_status` only rolls forward on a genuine transition, so a
    /// re-announcement of the current mode never disturbs it.
    pub fn set_alarm_mode(&mut self, mode: AlarmMode) -> bool {
        if mode == self.status {
            return false;
        }
        self.previous_status = self.status;
        self.status = mode;
        true
    }

    /// Set the alarm mode from a wire string. Returns true iff changed.
    pub fn set_alarm_mode_from_string(&mut self, s: &str) -> bool {
        self.set_alarm_mode(AlarmMode::from_wire(s))
    }

    /// Whether an alarm is currently sounding on this partition.
    pub fn alarm_active(&self) -> bool {
        matches!(
            self.status,
            AlarmMode::AlarmPolice | AlarmMode::AlarmFire | AlarmMode::AlarmAuxiliary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_mode_from_wire() {
        assert_eq!(AlarmMode::from_wire("DISARM"), AlarmMode::Disarm);
        assert_eq!(AlarmMode::from_wire("EXIT_DELAY"), AlarmMode::ExitDelay);
        assert_eq!(AlarmMode::from_wire("ENTRY_DELAY"), AlarmMode::EntryDelay);
        assert_eq!(AlarmMode::from_wire("ARM_STAY"), AlarmMode::ArmStay);
        assert_eq!(AlarmMode::from_wire("ARM_AWAY"), AlarmMode::ArmAway);
        assert_eq!(AlarmMode::from_wire("ARM-AWAY"), AlarmMode::Unknown);
        assert_eq!(AlarmMode::from_wire(""), AlarmMode::Unknown);
    }

    #[test]
    fn test_set_alarm_mode_reports_change() {
        let mut part = Partition::new(1);
        assert!(part.set_alarm_mode(AlarmMode::Disarm));
        assert!(!part.set_alarm_mode(AlarmMode::Disarm));
        assert!(part.set_alarm_mode(AlarmMode::ArmStay));
        assert_eq!(part.status(), AlarmMode::ArmStay);
    }

    #[test]
    fn test_previous_status_tracks_one_step() {
        let mut part = Partition::new(1);
        part.set_alarm_mode(AlarmMode::Disarm);
        part.set_alarm_mode(AlarmMode::ExitDelay);
        part.set_alarm_mode(AlarmMode::ArmAway);
        assert_eq!(part.previous_status(), AlarmMode::ExitDelay);

        // A no-op set must not roll previous_status forward
        part.set_alarm_mode(AlarmMode::ArmAway);
        assert_eq!(part.previous_status(), AlarmMode::ExitDelay);
    }

    #[test]
    fn test_entry_delay_attributable_to_stay() {
        let mut part = Partition::new(1);
        part.set_alarm_mode(AlarmMode::ArmStay);
        assert!(part.set_alarm_mode_from_string("ENTRY_DELAY"));
        assert_eq!(part.status(), AlarmMode::EntryDelay);
        assert_eq!(part.previous_status(), AlarmMode::ArmStay);
    }

    #[test]
    fn test_unrecognized_string_maps_to_unknown() {
        let mut part = Partition::new(1);
        part.set_alarm_mode(AlarmMode::Disarm);
        assert!(part.set_alarm_mode_from_string("ARM_NIGHT"));
        assert_eq!(part.status(), AlarmMode::Unknown);
        // Same unknown string again is a no-op
        assert!(!part.set_alarm_mode_from_string("ARM_NIGHT"));
    }

    #[test]
    fn test_alarm_active() {
        let mut part = Partition::new(1);
        assert!(!part.alarm_active());
        part.set_alarm_mode(AlarmMode::AlarmFire);
        assert!(part.alarm_active());
        part.set_alarm_mode(AlarmMode::AlarmPolice);
        assert!(part.alarm_active());
        part.set_alarm_mode(AlarmMode::Disarm);
        assert!(!part.alarm_active());
    }

    #[test]
    fn test_sendable_modes() {
        assert!(AlarmMode::Disarm.is_sendable());
        assert!(AlarmMode::ArmStay.is_sendable());
        assert!(AlarmMode::ArmAway.is_sendable());
        assert!(!AlarmMode::EntryDelay.is_sendable());
        assert!(!AlarmMode::ExitDelay.is_sendable());
        assert!(!AlarmMode::AlarmFire.is_sendable());
        assert!(!AlarmMode::Unknown.is_sendable());
    }
}
