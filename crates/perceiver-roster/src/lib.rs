//! Attendance roster perception: row extraction, classification and the
//! name canonicalization every comparison goes through.

pub mod classify;
pub mod model;
pub mod names;
mod reader;

pub use classify::{classify, Classifier, Flow, RosterRules};
pub use model::{
    AttendanceRow, LowAttendance, RawRow, RosterAlert, RosterSnapshot, SeparatorKind, StudentRow,
    NO_PHONE,
};
pub use names::{canonicalize, name_key, same_person};
pub use reader::AttendanceTableReader;
