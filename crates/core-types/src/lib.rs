//! Shared primitives for the RosterBot crates: tree nodes, locators, the
//! flow error taxonomy and the per-step result type.

use std::fmt;

use uuid::Uuid;

mod errors;
mod layout;

pub use errors::{ErrorKind, FlowError};
pub use layout::SiteLayout;

/// Opaque reference to an element held by the driver.
///
/// Handles may go stale when the remote document re-renders; callers that
/// need to act again after a mutation re-resolve through a [`Locator`].
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeHandle(pub String);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Level of the scheduling tree a node belongs to.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    Program,
    Session,
    Day,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Program => "program",
            NodeKind::Session => "session",
            NodeKind::Day => "day",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selectable element of the remote tree.
///
/// Selection state is deliberately absent: it is invalidated by every
/// navigation step and must be re-read from the document when needed.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub id: String,
    pub label: String,
    pub element_id: String,
}

impl Node {
    pub fn new(
        kind: NodeKind,
        id: impl Into<String>,
        label: impl Into<String>,
        element_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            id: id.into(),
            label: label.into(),
            element_id: element_id.into(),
        }
    }

    /// Locator of the node's click target.
    pub fn locator(&self) -> Locator {
        Locator::id(self.element_id.clone())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' ({})", self.kind, self.label, self.id)
    }
}

/// Strategy used to find an element.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum By {
    Id(String),
    Name(String),
    Css(String),
}

/// How to find an element, optionally relative to an already located node.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Locator {
    pub by: By,
    pub scope: Option<NodeHandle>,
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            by: By::Id(id.into()),
            scope: None,
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            by: By::Name(name.into()),
            scope: None,
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            by: By::Css(selector.into()),
            scope: None,
        }
    }

    /// CSS selector evaluated relative to `scope`.
    pub fn within(scope: &NodeHandle, selector: impl Into<String>) -> Self {
        Self {
            by: By::Css(selector.into()),
            scope: Some(scope.clone()),
        }
    }

    /// The same locator as a CSS selector, for drivers that only speak CSS.
    pub fn to_css(&self) -> String {
        match &self.by {
            By::Id(id) => format!("[id=\"{}\"]", css_escape(id)),
            By::Name(name) => format!("[name=\"{}\"]", css_escape(name)),
            By::Css(selector) => selector.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.by {
            By::Id(id) => write!(f, "#{id}")?,
            By::Name(name) => write!(f, "[name={name}]")?,
            By::Css(selector) => f.write_str(selector)?,
        }
        if let Some(scope) = &self.scope {
            write!(f, " (within {scope})")?;
        }
        Ok(())
    }
}

fn css_escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Why a step was skipped rather than attempted.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// Fewer than two sessions exist, so there is no previous period.
    NoPreviousPeriod { sessions: usize },
    /// The program has no sessions at all.
    NoSessions,
    /// Nothing was queued for this day label in the previous period.
    NoWorklist { day: String },
    /// A recoverable failure at a lower level turned this step into a no-op.
    Recovered(FlowError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoPreviousPeriod { sessions } => {
                write!(f, "no previous period ({sessions} session(s) listed)")
            }
            SkipReason::NoSessions => f.write_str("no sessions listed"),
            SkipReason::NoWorklist { day } => write!(f, "no worklist for day '{day}'"),
            SkipReason::Recovered(err) => write!(f, "recovered: {err}"),
        }
    }
}

/// Result of one navigation or reconciliation step.
#[derive(Clone, Debug, PartialEq)]
pub enum Step<T> {
    Ok(T),
    Skip(SkipReason),
    Fail(FlowError),
}

impl<T> Step<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Step::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Step::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Step<U> {
        match self {
            Step::Ok(value) => Step::Ok(f(value)),
            Step::Skip(reason) => Step::Skip(reason),
            Step::Fail(err) => Step::Fail(err),
        }
    }

    /// Drop the payload, keeping the skip/fail reason.
    pub fn discard(self) -> Step<()> {
        self.map(|_| ())
    }
}

impl<T> From<Result<T, FlowError>> for Step<T> {
    fn from(result: Result<T, FlowError>) -> Self {
        match result {
            Ok(value) => Step::Ok(value),
            Err(err) => Step::Fail(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_to_css_escapes_quotes() {
        assert_eq!(Locator::id("row_day_7").to_css(), "[id=\"row_day_7\"]");
        assert_eq!(Locator::name("lo\"gin").to_css(), "[name=\"lo\\\"gin\"]");
        assert_eq!(Locator::css("td.date").to_css(), "td.date");
    }

    #[test]
    fn step_map_keeps_reasons() {
        let skipped: Step<u8> = Step::Skip(SkipReason::NoSessions);
        assert_eq!(skipped.map(|v| v + 1), Step::Skip(SkipReason::NoSessions));

        let failed: Step<u8> = Err(FlowError::action_exhausted("#attendance")).into();
        assert!(matches!(
            failed.discard(),
            Step::Fail(err) if err.kind() == ErrorKind::ActionExhausted
        ));
    }

    #[test]
    fn node_display_names_kind_and_label() {
        let node = Node::new(NodeKind::Session, "42", "March 2025", "row_session_42");
        assert_eq!(node.to_string(), "session 'March 2025' (42)");
        assert_eq!(node.locator(), Locator::id("row_session_42"));
    }
}
