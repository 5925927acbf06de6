use async_trait::async_trait;
use rosterbot_core_types::{Locator, NodeHandle};
use thiserror::Error;

/// Errors surfaced by a [`Driver`] implementation.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum DriverError {
    /// The handle no longer refers to an element of the live document.
    #[error("stale element: {0}")]
    Stale(NodeHandle),

    /// The element exists but refused the interaction.
    #[error("element not interactable: {0}")]
    NotInteractable(String),

    /// The selector could not be understood.
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// Transport or protocol fault talking to the browser.
    #[error("transport error: {0}")]
    Transport(String),
}

impl DriverError {
    /// Faults that a later poll or re-resolution can outgrow.
    pub fn is_transient(&self) -> bool {
        matches!(self, DriverError::Stale(_) | DriverError::NotInteractable(_))
    }
}

/// Port to the browser-driving client provided by the host environment.
///
/// `invoke` and `force_invoke` are best effort: `Ok(())` only means the
/// interaction was dispatched, never that the remote state changed.
#[async_trait]
pub trait Driver: Send + Sync {
    /// First element matching `locator`, in document order.
    async fn locate(&self, locator: &Locator) -> Result<Option<NodeHandle>, DriverError>;

    /// All elements matching `locator`, in document order.
    async fn locate_all(&self, locator: &Locator) -> Result<Vec<NodeHandle>, DriverError>;

    async fn is_actionable(&self, node: &NodeHandle) -> Result<bool, DriverError>;

    async fn is_visible(&self, node: &NodeHandle) -> Result<bool, DriverError>;

    async fn scroll_into_view(&self, node: &NodeHandle) -> Result<(), DriverError>;

    /// Native click through the normal event dispatch.
    async fn invoke(&self, node: &NodeHandle) -> Result<(), DriverError>;

    /// Script-level click that bypasses hit testing and overlays.
    async fn force_invoke(&self, node: &NodeHandle) -> Result<(), DriverError>;

    async fn read_text(&self, node: &NodeHandle) -> Result<String, DriverError>;

    async fn read_attribute(
        &self,
        node: &NodeHandle,
        key: &str,
    ) -> Result<Option<String>, DriverError>;

    async fn type_text(&self, node: &NodeHandle, text: &str) -> Result<(), DriverError>;

    async fn clear(&self, node: &NodeHandle) -> Result<(), DriverError>;

    async fn document_root(&self) -> Result<NodeHandle, DriverError>;
}
