use perceiver_roster::RosterRules;
use rosterbot_core_types::SiteLayout;
use serde::{Deserialize, Serialize};
use tree_navigator::AttendanceRetry;

/// Which students of the previous period are queued for the current one.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CarryOver {
    /// Only low-attendance students the operator chose to re-enroll.
    #[default]
    LowAttendance,
    /// Every regular student, plus confirmed low-attendance ones.
    FullRoster,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunPolicy {
    pub low_attendance_threshold: u32,
    /// Slot count assumed for rows that render no slot cells.
    pub fallback_slots: u32,
    pub attendance: AttendanceRetry,
    pub carry_over: CarryOver,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            low_attendance_threshold: 3,
            fallback_slots: 4,
            attendance: AttendanceRetry::default(),
            carry_over: CarryOver::default(),
        }
    }
}

impl RunPolicy {
    pub fn roster_rules(&self, layout: &SiteLayout) -> RosterRules {
        RosterRules {
            low_attendance_threshold: self.low_attendance_threshold,
            fallback_slots: self.fallback_slots,
            waitlist_marker: layout.waitlist_marker.clone(),
            makeup_marker: layout.makeup_marker.clone(),
        }
    }
}
