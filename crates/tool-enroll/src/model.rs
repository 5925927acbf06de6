use perceiver_roster::name_key;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::ports::NameListSource;

/// Terminal result of one registration attempt.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "kebab-case")]
pub enum RegistrationOutcome {
    AlreadyEnrolled,
    SkippedByOverride,
    Enrolled,
    AmbiguousMatch { candidates: usize },
    NotFound,
    Failed(String),
}

impl RegistrationOutcome {
    /// The student ends up on the roster.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RegistrationOutcome::Enrolled | RegistrationOutcome::AlreadyEnrolled
        )
    }

    /// Console marker: ✓ done, ⚠ needs attention, ✗ failed.
    pub fn marker(&self) -> &'static str {
        match self {
            RegistrationOutcome::Enrolled => "✓",
            RegistrationOutcome::AlreadyEnrolled
            | RegistrationOutcome::SkippedByOverride
            | RegistrationOutcome::AmbiguousMatch { .. } => "⚠",
            RegistrationOutcome::NotFound | RegistrationOutcome::Failed(_) => "✗",
        }
    }
}

impl fmt::Display for RegistrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationOutcome::AlreadyEnrolled => f.write_str("already enrolled"),
            RegistrationOutcome::SkippedByOverride => f.write_str("skipped by operator"),
            RegistrationOutcome::Enrolled => f.write_str("enrolled"),
            RegistrationOutcome::AmbiguousMatch { candidates } => {
                write!(f, "{candidates} matching accounts, select manually")
            }
            RegistrationOutcome::NotFound => f.write_str("no matching account"),
            RegistrationOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Names that need an explicit operator decision before enrolling.
///
/// Loaded once at the start of a run and never modified afterwards.
#[derive(Clone, Debug, Default)]
pub struct SpecialEnrollmentSet {
    keys: HashSet<String>,
    names: BTreeSet<String>,
}

impl SpecialEnrollmentSet {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let mut set = Self::default();
        for name in names {
            set.keys.insert(name_key(&name));
            set.names.insert(name);
        }
        set
    }

    pub async fn load(source: &dyn NameListSource) -> Self {
        Self::new(source.load_names().await)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains(&name_key(name))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
