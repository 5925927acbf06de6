//! Retryable interactions with the remote document
//!
//! Two primitives:
//! 1. invoke - click a node with fallback strategies
//! 2. enter_text - clear and type into an input

mod click;
mod type_text;

use rosterbot_core_types::{Locator, NodeHandle};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::{
    driver::Driver,
    errors::ActionError,
    types::{ActionReport, ActionTimeouts},
    waiting::DocumentReader,
};

/// Issues single interactions with bounded retries.
///
/// `perform` and `force_perform` never surface errors: `false` means "this
/// step did not happen" and the caller decides what to skip. A failed
/// attempt is presumed, not guaranteed, to have left the remote state alone.
#[derive(Clone)]
pub struct RetryableAction {
    driver: Arc<dyn Driver>,
    reader: DocumentReader,
    timeouts: ActionTimeouts,
}

impl RetryableAction {
    pub fn new(driver: Arc<dyn Driver>, timeouts: ActionTimeouts) -> Self {
        let reader = DocumentReader::new(driver.clone(), timeouts.poll());
        Self {
            driver,
            reader,
            timeouts,
        }
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn reader(&self) -> &DocumentReader {
        &self.reader
    }

    pub fn timeouts(&self) -> &ActionTimeouts {
        &self.timeouts
    }

    /// Click `target`, walking the full fallback chain.
    pub async fn perform(&self, target: &Locator, timeout: Duration) -> bool {
        match self.perform_with_report(target, timeout).await {
            Ok(_) => true,
            Err(err) => {
                warn!(target = %target, error = %err, "action did not happen");
                false
            }
        }
    }

    /// Same as [`perform`](Self::perform) but reports how the click landed.
    pub async fn perform_with_report(
        &self,
        target: &Locator,
        timeout: Duration,
    ) -> Result<ActionReport, ActionError> {
        click::execute_click(self, target, timeout).await
    }

    /// Script-click `target` as soon as it exists, even if hidden.
    pub async fn force_perform(&self, target: &Locator, timeout: Duration) -> bool {
        match click::execute_forced_click(self, target, timeout).await {
            Ok(_) => true,
            Err(err) => {
                warn!(target = %target, error = %err, "forced action did not happen");
                false
            }
        }
    }

    /// Script-click an element that has no stable locator, such as one
    /// entry of a freshly rendered suggestion list. No re-resolution.
    pub async fn force_perform_node(&self, node: &NodeHandle) -> bool {
        match click::execute_forced_on_node(self, node).await {
            Ok(_) => true,
            Err(err) => {
                warn!(node = %node, error = %err, "forced action did not happen");
                false
            }
        }
    }

    /// Clear `target` and type `text` into it.
    pub async fn enter_text(
        &self,
        target: &Locator,
        text: &str,
        timeout: Duration,
    ) -> Result<(), ActionError> {
        type_text::execute_type_text(self, target, text, timeout).await
    }
}
