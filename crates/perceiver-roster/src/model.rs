use serde::{Deserialize, Serialize};

use crate::names::{canonicalize, name_key};

pub const NO_PHONE: &str = "No phone number available";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeparatorKind {
    Waitlist,
    MakeUp,
    Other,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StudentRow {
    /// As rendered, usually "Last, First".
    pub display_name: String,
    pub canonical_name: String,
    pub phone: Option<String>,
    pub present_count: u32,
    pub tracked_slots: u32,
    /// Row sits in the waitlist block of the table.
    pub waitlisted: bool,
}

impl StudentRow {
    pub fn new(display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            canonical_name: canonicalize(&display_name),
            display_name,
            phone: None,
            present_count: 0,
            tracked_slots: 0,
            waitlisted: false,
        }
    }

    pub fn key(&self) -> String {
        name_key(&self.canonical_name)
    }

    pub fn phone_or_unavailable(&self) -> &str {
        self.phone.as_deref().unwrap_or(NO_PHONE)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AttendanceRow {
    Student(StudentRow),
    Separator { kind: SeparatorKind, text: String },
    Empty,
}

/// Row descriptor as extracted from the document, before classification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RawRow {
    Separator {
        text: String,
    },
    Data {
        /// `None` when the row has cells but no name element.
        name: Option<String>,
        phone: Option<String>,
        present: u32,
        slots: u32,
    },
    Empty,
}

impl RawRow {
    pub fn separator(text: impl Into<String>) -> Self {
        RawRow::Separator { text: text.into() }
    }

    pub fn student(name: impl Into<String>, present: u32, slots: u32) -> Self {
        RawRow::Data {
            name: Some(name.into()),
            phone: None,
            present,
            slots,
        }
    }
}

/// Ordered rows of one Program x Session x Day roster.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub rows: Vec<AttendanceRow>,
    /// A make-up separator ended the read early.
    pub truncated: bool,
}

impl RosterSnapshot {
    fn students(&self) -> impl Iterator<Item = &StudentRow> {
        self.rows.iter().filter_map(|row| match row {
            AttendanceRow::Student(student) => Some(student),
            _ => None,
        })
    }

    /// Regular (non-waitlist) students in table order.
    pub fn regular(&self) -> impl Iterator<Item = &StudentRow> {
        self.students().filter(|s| !s.waitlisted)
    }

    pub fn waitlist(&self) -> impl Iterator<Item = &StudentRow> {
        self.students().filter(|s| s.waitlisted)
    }

    /// Whether `name` appears as a regular or waitlisted student.
    pub fn contains(&self, name: &str) -> bool {
        let key = name_key(name);
        self.students().any(|s| s.key() == key)
    }

    pub fn student_count(&self) -> usize {
        self.students().count()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LowAttendance {
    pub name: String,
    pub phone: Option<String>,
    pub present_count: u32,
    pub tracked_slots: u32,
}

impl LowAttendance {
    pub fn phone_or_unavailable(&self) -> &str {
        self.phone.as_deref().unwrap_or(NO_PHONE)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RosterAlert {
    pub waitlist_count: usize,
    pub waitlist: Vec<String>,
    pub low_attendance: Vec<LowAttendance>,
}

impl RosterAlert {
    pub fn is_empty(&self) -> bool {
        self.waitlist.is_empty() && self.low_attendance.is_empty()
    }
}
