//! Row classification, independent of the document.

use serde::{Deserialize, Serialize};

use crate::model::{
    AttendanceRow, LowAttendance, RawRow, RosterAlert, RosterSnapshot, SeparatorKind, StudentRow,
};

/// Markers and thresholds used while classifying a roster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterRules {
    /// Regular students below this many present marks are flagged.
    pub low_attendance_threshold: u32,
    /// Slot count reported when a row carries no slot cells at all.
    pub fallback_slots: u32,
    pub waitlist_marker: String,
    pub makeup_marker: String,
}

impl Default for RosterRules {
    fn default() -> Self {
        Self {
            low_attendance_threshold: 3,
            fallback_slots: 4,
            waitlist_marker: "Waitlisted".to_string(),
            makeup_marker: "Make-up".to_string(),
        }
    }
}

impl RosterRules {
    pub fn separator_kind(&self, text: &str) -> SeparatorKind {
        if text.contains(&self.makeup_marker) {
            SeparatorKind::MakeUp
        } else if text.contains(&self.waitlist_marker) {
            SeparatorKind::Waitlist
        } else {
            SeparatorKind::Other
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Halt,
}

/// Streaming classifier fed one raw row at a time.
///
/// Rows following a waitlist separator are waitlist entries until the next
/// separator. A make-up separator halts: [`push`](Self::push) returns
/// [`Flow::Halt`] and later rows are ignored.
#[derive(Debug)]
pub struct Classifier {
    rules: RosterRules,
    in_waitlist: bool,
    halted: bool,
    snapshot: RosterSnapshot,
    alert: RosterAlert,
}

impl Classifier {
    pub fn new(rules: RosterRules) -> Self {
        Self {
            rules,
            in_waitlist: false,
            halted: false,
            snapshot: RosterSnapshot::default(),
            alert: RosterAlert::default(),
        }
    }

    pub fn push(&mut self, raw: RawRow) -> Flow {
        if self.halted {
            return Flow::Halt;
        }

        match raw {
            RawRow::Separator { text } => {
                let kind = self.rules.separator_kind(&text);
                self.in_waitlist = kind == SeparatorKind::Waitlist;
                self.snapshot
                    .rows
                    .push(AttendanceRow::Separator { kind, text });
                if kind == SeparatorKind::MakeUp {
                    self.halted = true;
                    self.snapshot.truncated = true;
                    return Flow::Halt;
                }
            }
            RawRow::Data {
                name: Some(name),
                phone,
                present,
                slots,
            } if !name.trim().is_empty() => {
                let mut student = StudentRow::new(name.trim());
                student.phone = phone.filter(|p| !p.trim().is_empty());
                student.present_count = present;
                student.tracked_slots = if slots == 0 {
                    self.rules.fallback_slots
                } else {
                    slots
                };
                student.waitlisted = self.in_waitlist;
                self.record(&student);
                self.snapshot.rows.push(AttendanceRow::Student(student));
            }
            RawRow::Data { .. } | RawRow::Empty => self.snapshot.rows.push(AttendanceRow::Empty),
        }
        Flow::Continue
    }

    fn record(&mut self, student: &StudentRow) {
        if student.waitlisted {
            self.alert.waitlist.push(student.canonical_name.clone());
            self.alert.waitlist_count = self.alert.waitlist.len();
        } else if student.present_count < self.rules.low_attendance_threshold {
            self.alert.low_attendance.push(LowAttendance {
                name: student.canonical_name.clone(),
                phone: student.phone.clone(),
                present_count: student.present_count,
                tracked_slots: student.tracked_slots,
            });
        }
    }

    pub fn finish(self) -> (RosterSnapshot, RosterAlert) {
        (self.snapshot, self.alert)
    }
}

/// Classify a complete list of raw rows.
pub fn classify(rows: &[RawRow], rules: &RosterRules) -> (RosterSnapshot, RosterAlert) {
    let mut classifier = Classifier::new(rules.clone());
    for row in rows {
        if classifier.push(row.clone()) == Flow::Halt {
            break;
        }
    }
    classifier.finish()
}
