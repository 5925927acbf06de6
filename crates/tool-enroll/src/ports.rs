use async_trait::async_trait;
use parking_lot::Mutex;
use perceiver_roster::canonicalize;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Asks the operator a yes/no question. May wait indefinitely.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Source of the special enrollment names.
#[async_trait]
pub trait NameListSource: Send + Sync {
    /// Canonical names; empty on any failure.
    async fn load_names(&self) -> HashSet<String>;
}

/// Replays prepared answers, then falls back to a default.
pub struct ScriptedConfirmer {
    answers: Mutex<VecDeque<bool>>,
    fallback: bool,
    asked: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    pub fn new(answers: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            fallback,
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Answer every prompt with `answer`.
    pub fn always(answer: bool) -> Self {
        Self::new(std::iter::empty(), answer)
    }

    /// Prompts seen so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        self.asked.lock().push(prompt.to_string());
        let answer = self.answers.lock().pop_front().unwrap_or(self.fallback);
        debug!(answer, "scripted confirmation");
        answer
    }
}

#[derive(Debug, Error)]
pub enum NameListError {
    #[error("failed to read name list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One name per line; blank lines and `#` comments are ignored.
#[derive(Clone, Debug)]
pub struct FileNameList {
    path: PathBuf,
}

impl FileNameList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<HashSet<String>, NameListError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| NameListError::Read {
                path: self.path.clone(),
                source,
            })?;
        Ok(parse_names(&text))
    }
}

#[async_trait]
impl NameListSource for FileNameList {
    async fn load_names(&self) -> HashSet<String> {
        match self.read().await {
            Ok(names) => names,
            Err(err) => {
                warn!(error = %err, "special enrollment list unavailable, using an empty list");
                HashSet::new()
            }
        }
    }
}

/// Names given inline, typically from configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticNameList(pub Vec<String>);

#[async_trait]
impl NameListSource for StaticNameList {
    async fn load_names(&self) -> HashSet<String> {
        self.0
            .iter()
            .map(|name| canonicalize(name))
            .filter(|name| !name.is_empty())
            .collect()
    }
}

pub(crate) fn parse_names(text: &str) -> HashSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(canonicalize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn scripted_answers_then_fallback() {
        let confirmer = ScriptedConfirmer::new([true, false], false);
        assert!(confirmer.confirm("first?").await);
        assert!(!confirmer.confirm("second?").await);
        assert!(!confirmer.confirm("third?").await);
        assert_eq!(confirmer.asked(), ["first?", "second?", "third?"]);
    }

    #[tokio::test]
    async fn file_list_is_canonicalized() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# staff children").unwrap();
        writeln!(file, "Doe, Jane").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  Sam   Lee ").unwrap();

        let names = FileNameList::new(file.path()).load_names().await;
        assert_eq!(names.len(), 2);
        assert!(names.contains("Jane Doe"));
        assert!(names.contains("Sam Lee"));
    }

    #[tokio::test]
    async fn missing_file_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let names = FileNameList::new(dir.path().join("absent.txt"))
            .load_names()
            .await;
        assert!(names.is_empty());
    }
}
