//! In-memory browser history.

use parking_lot::RwLock;

use crate::ports::BrowserHistory;

#[derive(Debug, Default)]
struct Entries {
    paths: Vec<String>,
    index: usize,
    title: Option<String>,
}

/// Session history kept in memory, with synchronous back/forward.
#[derive(Debug, Default)]
pub struct InMemoryBrowserHistory {
    inner: RwLock<Entries>,
}

impl InMemoryBrowserHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entry.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        let inner = self.inner.read();
        inner.paths.get(inner.index).cloned()
    }

    /// Every entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.inner.read().paths.clone()
    }

    /// Last title set.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.inner.read().title.clone()
    }
}

impl BrowserHistory for InMemoryBrowserHistory {
    fn push(&self, path: &str) {
        let mut inner = self.inner.write();
        if !inner.paths.is_empty() {
            let keep = inner.index + 1;
            inner.paths.truncate(keep);
        }
        inner.paths.push(path.to_string());
        inner.index = inner.paths.len() - 1;
    }

    fn replace(&self, path: &str) {
        let mut inner = self.inner.write();
        let index = inner.index;
        match inner.paths.get_mut(index) {
            Some(entry) => *entry = path.to_string(),
            None => inner.paths.push(path.to_string()),
        }
    }

    fn back(&self) -> Option<String> {
        let mut inner = self.inner.write();
        if inner.index == 0 {
            return None;
        }
        inner.index -= 1;
        inner.paths.get(inner.index).cloned()
    }

    fn forward(&self) -> Option<String> {
        let mut inner = self.inner.write();
        if inner.index + 1 >= inner.paths.len() {
            return None;
        }
        inner.index += 1;
        inner.paths.get(inner.index).cloned()
    }

    fn set_title(&self, title: &str) {
        self.inner.write().title = Some(title.to_string());
    }
}
