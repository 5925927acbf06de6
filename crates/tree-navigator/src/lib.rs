//! Navigation of the Program → Session → Day scheduling tree.

mod controller;
mod periods;

pub use controller::{AttendanceRetry, NavigationController};
pub use periods::{resolve_periods, Periods};
