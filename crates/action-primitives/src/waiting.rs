//! Bounded polling waits over the remote document

use rosterbot_core_types::{Locator, NodeHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::driver::{Driver, DriverError};
use crate::errors::ActionError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Readiness {
    Present,
    Visible,
    Actionable,
}

impl Readiness {
    fn describe(self) -> &'static str {
        match self {
            Readiness::Present => "present",
            Readiness::Visible => "visible",
            Readiness::Actionable => "actionable",
        }
    }
}

/// Waits for regions of the document and enumerates their children.
///
/// Every wait probes at least once, then polls at a fixed interval until the
/// bound expires. Stale handles and not-yet-interactable elements are treated
/// as "not there yet"; transport faults end the wait immediately.
#[derive(Clone)]
pub struct DocumentReader {
    driver: Arc<dyn Driver>,
    poll_interval: Duration,
}

impl DocumentReader {
    pub fn new(driver: Arc<dyn Driver>, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval,
        }
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Wait until `locator` exists in the document, possibly hidden.
    pub async fn wait_present(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<NodeHandle, ActionError> {
        self.wait_until(locator, timeout, Readiness::Present).await
    }

    /// Wait until `locator` is rendered.
    pub async fn wait_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<NodeHandle, ActionError> {
        self.wait_until(locator, timeout, Readiness::Visible).await
    }

    /// Wait until `locator` is rendered and accepts interaction.
    pub async fn wait_actionable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<NodeHandle, ActionError> {
        self.wait_until(locator, timeout, Readiness::Actionable).await
    }

    /// Currently rendered children of `container` matching `child_pattern`,
    /// in document order.
    pub async fn list_children(
        &self,
        container: &NodeHandle,
        child_pattern: &str,
    ) -> Result<Vec<NodeHandle>, ActionError> {
        let locator = Locator::within(container, child_pattern);
        let mut children = Vec::new();
        for child in self.driver.locate_all(&locator).await? {
            match self.driver.is_visible(&child).await {
                Ok(true) => children.push(child),
                Ok(false) => {}
                Err(err) if err.is_transient() => {}
                Err(err) => return Err(err.into()),
            }
        }
        trace!(
            container = %container,
            pattern = child_pattern,
            count = children.len(),
            "listed children"
        );
        Ok(children)
    }

    /// Single probe without waiting.
    pub async fn find(&self, locator: &Locator) -> Result<Option<NodeHandle>, ActionError> {
        match self.driver.locate(locator).await {
            Ok(found) => Ok(found),
            Err(err) if err.is_transient() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Trimmed text of the first match of `selector` under `scope`, if any.
    pub async fn text_within(
        &self,
        scope: &NodeHandle,
        selector: &str,
    ) -> Result<Option<String>, ActionError> {
        let Some(node) = self.find(&Locator::within(scope, selector)).await? else {
            return Ok(None);
        };
        match self.driver.read_text(&node).await {
            Ok(text) => Ok(Some(text.trim().to_string())),
            Err(err) if err.is_transient() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Whether the `class` attribute of `node` contains `class` as a token.
    pub async fn has_class(&self, node: &NodeHandle, class: &str) -> Result<bool, ActionError> {
        let classes = self.driver.read_attribute(node, "class").await?;
        Ok(classes
            .as_deref()
            .map(|value| value.split_whitespace().any(|token| token == class))
            .unwrap_or(false))
    }

    async fn wait_until(
        &self,
        locator: &Locator,
        timeout: Duration,
        readiness: Readiness,
    ) -> Result<NodeHandle, ActionError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.probe(locator, readiness).await {
                Ok(Some(node)) => return Ok(node),
                Ok(None) => {}
                Err(err) if err.is_transient() => {
                    trace!(locator = %locator, error = %err, "transient fault while waiting");
                }
                Err(err) => return Err(err.into()),
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(
                    locator = %locator,
                    timeout_ms = timeout.as_millis() as u64,
                    "element never became {}",
                    readiness.describe()
                );
                return Err(ActionError::WaitTimeout(format!(
                    "{} not {} after {}ms",
                    locator,
                    readiness.describe(),
                    timeout.as_millis()
                )));
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    async fn probe(
        &self,
        locator: &Locator,
        readiness: Readiness,
    ) -> Result<Option<NodeHandle>, DriverError> {
        let Some(node) = self.driver.locate(locator).await? else {
            return Ok(None);
        };
        let ready = match readiness {
            Readiness::Present => true,
            Readiness::Visible => self.driver.is_visible(&node).await?,
            Readiness::Actionable => self.driver.is_actionable(&node).await?,
        };
        Ok(ready.then_some(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{Element, MemoryDriver};

    fn reader(driver: &Arc<MemoryDriver>) -> DocumentReader {
        DocumentReader::new(driver.clone(), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn wait_present_accepts_hidden_elements() {
        let driver = Arc::new(MemoryDriver::new());
        driver.edit(|doc| {
            let root = doc.root();
            doc.append(root, Element::new("div").id("program_1_list").hidden());
        });

        let reader = reader(&driver);
        let locator = Locator::id("program_1_list");
        assert!(reader
            .wait_present(&locator, Duration::from_millis(20))
            .await
            .is_ok());
        let err = reader
            .wait_visible(&locator, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::WaitTimeout(_)));
    }

    #[tokio::test]
    async fn wait_visible_picks_up_late_rendering() {
        let driver = Arc::new(MemoryDriver::new());
        driver.edit(|doc| {
            let root = doc.root();
            doc.append(root, Element::new("div").id("session_9_list").hidden());
        });

        let revealer = driver.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            revealer.edit(|doc| {
                if let Some(key) = doc.by_id("session_9_list") {
                    doc.set_hidden(key, false);
                }
            });
        });

        let node = reader(&driver)
            .wait_visible(&Locator::id("session_9_list"), Duration::from_millis(500))
            .await
            .expect("container should become visible");
        assert!(driver.is_visible(&node).await.unwrap());
    }

    #[tokio::test]
    async fn list_children_preserves_document_order() {
        let driver = Arc::new(MemoryDriver::new());
        driver.edit(|doc| {
            let root = doc.root();
            let list = doc.append(root, Element::new("div").id("program_3_list"));
            for (id, label) in [(11, "January"), (12, "February"), (13, "March")] {
                doc.append(
                    list,
                    Element::new("a")
                        .id(format!("row_session_{id}"))
                        .text(label),
                );
            }
            doc.append(list, Element::new("span").text("not a session"));
            doc.append(
                list,
                Element::new("a").id("row_session_14").text("April").hidden(),
            );
        });

        let reader = reader(&driver);
        let container = reader
            .wait_visible(&Locator::id("program_3_list"), Duration::from_millis(20))
            .await
            .unwrap();
        let children = reader
            .list_children(&container, "a[id^='row_session_']")
            .await
            .unwrap();
        let mut labels = Vec::new();
        for child in &children {
            labels.push(driver.read_text(child).await.unwrap());
        }
        assert_eq!(labels, ["January", "February", "March"]);
    }

    #[tokio::test]
    async fn has_class_matches_whole_tokens() {
        let driver = Arc::new(MemoryDriver::new());
        driver.edit(|doc| {
            let root = doc.root();
            doc.append(
                root,
                Element::new("a").id("row_program_1").class("row selected_row"),
            );
        });
        let reader = reader(&driver);
        let node = reader.find(&Locator::id("row_program_1")).await.unwrap().unwrap();
        assert!(reader.has_class(&node, "selected_row").await.unwrap());
        assert!(!reader.has_class(&node, "selected").await.unwrap());
    }
}
