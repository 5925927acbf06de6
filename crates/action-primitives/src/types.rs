//! Core data types for action primitives

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing knobs shared by the readers and actions.
///
/// Millisecond fields so the struct maps directly onto the `timeouts`
/// section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionTimeouts {
    /// Default bound for a wait on an element.
    pub wait_ms: u64,

    /// Bound for the "is this node already selected" probe.
    pub probe_ms: u64,

    /// Pause after scrolling a target into view.
    pub settle_ms: u64,

    /// Pause after a mutating click or typing before reading again.
    pub after_action_ms: u64,

    /// Pause after submitting a registration before verifying it.
    pub after_submit_ms: u64,

    /// Interval between two polls of the document.
    pub poll_ms: u64,
}

impl ActionTimeouts {
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn after_action(&self) -> Duration {
        Duration::from_millis(self.after_action_ms)
    }

    pub fn after_submit(&self) -> Duration {
        Duration::from_millis(self.after_submit_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }

    /// Short timings for in-memory documents.
    pub fn instant() -> Self {
        Self {
            wait_ms: 200,
            probe_ms: 100,
            settle_ms: 0,
            after_action_ms: 0,
            after_submit_ms: 0,
            poll_ms: 5,
        }
    }
}

impl Default for ActionTimeouts {
    fn default() -> Self {
        Self {
            wait_ms: 10_000,
            probe_ms: 5_000,
            settle_ms: 200,
            after_action_ms: 300,
            after_submit_ms: 500,
            poll_ms: 100,
        }
    }
}

/// Which strategy finally dispatched an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvokeStrategy {
    /// Native click after the target became actionable.
    Direct,

    /// Script click on the same element.
    Forced,

    /// Script click on a freshly re-resolved element.
    Reresolved,
}

/// Outcome of a successful action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReport {
    pub action_id: String,
    pub target: String,
    pub strategy: InvokeStrategy,
    /// Number of invocation strategies tried, including the winning one.
    pub attempts: u8,
    pub latency_ms: u64,
}
