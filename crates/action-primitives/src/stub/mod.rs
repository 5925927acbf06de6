//! In-memory [`Driver`] used by the demo site and by tests.
//!
//! The document is an element arena guarded by a mutex. Clicks and typing can
//! trigger hooks that mutate the document, which is how simulated pages react
//! to the flow.

mod document;
mod selector;

pub use document::{Document, Element, ElementKey};
pub use selector::{Selector, SelectorError};

use async_trait::async_trait;
use parking_lot::Mutex;
use rosterbot_core_types::{Locator, NodeHandle};
use std::sync::Arc;
use tracing::trace;

use crate::driver::{Driver, DriverError};

pub type InvokeHook = Arc<dyn Fn(&mut Document, ElementKey) + Send + Sync>;
pub type TypeHook = Arc<dyn Fn(&mut Document, ElementKey, &str) + Send + Sync>;

/// One dispatched interaction, as seen by the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub element_id: Option<String>,
    pub text: String,
    pub forced: bool,
}

struct State {
    doc: Document,
    on_invoke: Option<InvokeHook>,
    on_type: Option<TypeHook>,
    invocations: Vec<Invocation>,
}

pub struct MemoryDriver {
    state: Mutex<State>,
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    pub fn with_document(doc: Document) -> Self {
        Self {
            state: Mutex::new(State {
                doc,
                on_invoke: None,
                on_type: None,
                invocations: Vec::new(),
            }),
        }
    }

    /// Run `f` against the document under the lock.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut self.state.lock().doc)
    }

    /// Called after every successful click, native or forced.
    pub fn on_invoke(&self, hook: InvokeHook) {
        self.state.lock().on_invoke = Some(hook);
    }

    /// Called after text was typed, with the full current value.
    pub fn on_type(&self, hook: TypeHook) {
        self.state.lock().on_type = Some(hook);
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.state.lock().invocations.clone()
    }

    pub fn clear_invocations(&self) {
        self.state.lock().invocations.clear();
    }

    pub fn handle(key: ElementKey) -> NodeHandle {
        NodeHandle(format!("mem-{key}"))
    }

    fn key_of(doc: &Document, node: &NodeHandle) -> Result<ElementKey, DriverError> {
        node.0
            .strip_prefix("mem-")
            .and_then(|raw| raw.parse::<ElementKey>().ok())
            .filter(|key| doc.is_attached(*key))
            .ok_or_else(|| DriverError::Stale(node.clone()))
    }

    fn matching(doc: &Document, locator: &Locator) -> Result<Vec<ElementKey>, DriverError> {
        let scope = match &locator.scope {
            Some(scope) => Self::key_of(doc, scope)?,
            None => doc.root(),
        };
        doc.select_within(scope, &locator.to_css())
            .map_err(|err| DriverError::InvalidSelector(err.to_string()))
    }

    fn dispatch(&self, node: &NodeHandle, forced: bool) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let key = Self::key_of(&state.doc, node)?;

        if forced {
            if state.doc.take_forced_fault(key) {
                return Err(DriverError::NotInteractable(format!(
                    "{node}: script click swallowed"
                )));
            }
        } else {
            if state.doc.take_direct_fault(key) {
                return Err(DriverError::NotInteractable(format!(
                    "{node}: click intercepted"
                )));
            }
            if !state.doc.is_actionable(key) {
                return Err(DriverError::NotInteractable(format!(
                    "{node}: not visible or disabled"
                )));
            }
        }

        let invocation = Invocation {
            element_id: state.doc.id_of(key).map(str::to_string),
            text: state.doc.text_content(key),
            forced,
        };
        trace!(node = %node, forced, "memory click");
        state.invocations.push(invocation);

        if let Some(hook) = state.on_invoke.clone() {
            hook(&mut state.doc, key);
        }
        Ok(())
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn locate(&self, locator: &Locator) -> Result<Option<NodeHandle>, DriverError> {
        let state = self.state.lock();
        Ok(Self::matching(&state.doc, locator)?
            .first()
            .map(|key| Self::handle(*key)))
    }

    async fn locate_all(&self, locator: &Locator) -> Result<Vec<NodeHandle>, DriverError> {
        let state = self.state.lock();
        Ok(Self::matching(&state.doc, locator)?
            .into_iter()
            .map(Self::handle)
            .collect())
    }

    async fn is_actionable(&self, node: &NodeHandle) -> Result<bool, DriverError> {
        let state = self.state.lock();
        let key = Self::key_of(&state.doc, node)?;
        Ok(state.doc.is_actionable(key))
    }

    async fn is_visible(&self, node: &NodeHandle) -> Result<bool, DriverError> {
        let state = self.state.lock();
        let key = Self::key_of(&state.doc, node)?;
        Ok(state.doc.is_visible(key))
    }

    async fn scroll_into_view(&self, node: &NodeHandle) -> Result<(), DriverError> {
        let state = self.state.lock();
        Self::key_of(&state.doc, node).map(|_| ())
    }

    async fn invoke(&self, node: &NodeHandle) -> Result<(), DriverError> {
        self.dispatch(node, false)
    }

    async fn force_invoke(&self, node: &NodeHandle) -> Result<(), DriverError> {
        self.dispatch(node, true)
    }

    async fn read_text(&self, node: &NodeHandle) -> Result<String, DriverError> {
        let state = self.state.lock();
        let key = Self::key_of(&state.doc, node)?;
        Ok(state.doc.text_content(key))
    }

    async fn read_attribute(
        &self,
        node: &NodeHandle,
        key: &str,
    ) -> Result<Option<String>, DriverError> {
        let state = self.state.lock();
        let element = Self::key_of(&state.doc, node)?;
        Ok(state.doc.attr(element, key))
    }

    async fn type_text(&self, node: &NodeHandle, text: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let key = Self::key_of(&state.doc, node)?;
        let value = format!("{}{}", state.doc.value(key), text);
        state.doc.set_value(key, value.clone());
        if let Some(hook) = state.on_type.clone() {
            hook(&mut state.doc, key, &value);
        }
        Ok(())
    }

    async fn clear(&self, node: &NodeHandle) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let key = Self::key_of(&state.doc, node)?;
        state.doc.set_value(key, "");
        Ok(())
    }

    async fn document_root(&self) -> Result<NodeHandle, DriverError> {
        let state = self.state.lock();
        Ok(Self::handle(state.doc.root()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stale_handles_after_rerender() {
        let driver = MemoryDriver::new();
        driver.edit(|doc| {
            let root = doc.root();
            let table = doc.append(root, Element::new("tbody").id("table-body"));
            doc.append(table, Element::new("tr").text("Doe, Jane"));
        });

        let row = driver
            .locate(&Locator::css("#table-body tr"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(driver.read_text(&row).await.unwrap(), "Doe, Jane");

        driver.edit(|doc| {
            let table = doc.by_id("table-body").unwrap();
            doc.clear_children(table);
        });
        assert_eq!(
            driver.read_text(&row).await.unwrap_err(),
            DriverError::Stale(row.clone())
        );
    }

    #[tokio::test]
    async fn click_hooks_mutate_document() {
        let driver = MemoryDriver::new();
        driver.edit(|doc| {
            let root = doc.root();
            doc.append(root, Element::new("a").id("row_program_1").text("Tennis"));
            doc.append(root, Element::new("div").id("program_1_list").hidden());
        });
        driver.on_invoke(Arc::new(|doc: &mut Document, key: ElementKey| {
            if doc.id_of(key) == Some("row_program_1") {
                doc.add_class(key, "selected_row");
                if let Some(list) = doc.by_id("program_1_list") {
                    doc.set_hidden(list, false);
                }
            }
        }));

        let link = driver
            .locate(&Locator::id("row_program_1"))
            .await
            .unwrap()
            .unwrap();
        driver.invoke(&link).await.unwrap();

        assert_eq!(
            driver.read_attribute(&link, "class").await.unwrap().as_deref(),
            Some("selected_row")
        );
        let list = driver
            .locate(&Locator::id("program_1_list"))
            .await
            .unwrap()
            .unwrap();
        assert!(driver.is_visible(&list).await.unwrap());
        assert_eq!(
            driver.invocations(),
            vec![Invocation {
                element_id: Some("row_program_1".to_string()),
                text: "Tennis".to_string(),
                forced: false,
            }]
        );
    }

    #[tokio::test]
    async fn scoped_lookup_and_bad_selectors() {
        let driver = MemoryDriver::new();
        driver.edit(|doc| {
            let root = doc.root();
            let first = doc.append(root, Element::new("div").id("a"));
            doc.append(first, Element::new("li").text("one"));
            let second = doc.append(root, Element::new("div").id("b"));
            doc.append(second, Element::new("li").text("two"));
        });

        let scope = driver.locate(&Locator::id("b")).await.unwrap().unwrap();
        let items = driver
            .locate_all(&Locator::within(&scope, "li"))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(driver.read_text(&items[0]).await.unwrap(), "two");

        assert!(matches!(
            driver.locate(&Locator::css("li:first-child")).await,
            Err(DriverError::InvalidSelector(_))
        ));
    }

    #[tokio::test]
    async fn typing_appends_and_runs_hook() {
        let driver = MemoryDriver::new();
        driver.edit(|doc| {
            let root = doc.root();
            doc.append(root, Element::new("input").id("userInput"));
        });
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = seen.clone();
        driver.on_type(Arc::new(move |_doc: &mut Document, _key: ElementKey, value: &str| {
            sink.lock().push(value.to_string());
        }));

        let input = driver.locate(&Locator::id("userInput")).await.unwrap().unwrap();
        driver.type_text(&input, "Jane").await.unwrap();
        driver.type_text(&input, " Doe").await.unwrap();
        driver.clear(&input).await.unwrap();

        assert_eq!(*seen.lock(), vec!["Jane".to_string(), "Jane Doe".to_string()]);
        assert_eq!(
            driver.read_attribute(&input, "value").await.unwrap().as_deref(),
            Some("")
        );
    }
}
