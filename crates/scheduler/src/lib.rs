//! Cross-month scheduler
//!
//! Walks every program, reads the rosters of the previous period into
//! per-day worklists, then enrolls those students into the days of the
//! current period that carry the same label.

mod model;
mod orchestrator;
mod policy;

pub use model::{Alert, DayWorklist, OutcomeRecord, ProgramSummary, RunSummary};
pub use orchestrator::CrossMonthScheduler;
pub use policy::{CarryOver, RunPolicy};
