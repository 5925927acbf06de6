//! Action primitives for the remote scheduling document
//!
//! This crate provides the building blocks every higher layer drives the
//! document through:
//! - the [`Driver`] port the host environment implements
//! - [`DocumentReader`]: bounded polling waits and child enumeration
//! - [`RetryableAction`]: one interaction with fallback strategies
//! - [`stub::MemoryDriver`]: an in-memory document for demos and tests

mod driver;
pub mod errors;
mod primitives;
pub mod stub;
pub mod types;
mod waiting;

pub use driver::{Driver, DriverError};
pub use errors::ActionError;
pub use primitives::RetryableAction;
pub use types::{ActionReport, ActionTimeouts, InvokeStrategy};
pub use waiting::DocumentReader;

pub use rosterbot_core_types::{By, Locator, NodeHandle};
