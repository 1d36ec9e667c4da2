//! Outbound ports for the Navigation Shell.

/// The host page's address bar and session history.
pub trait BrowserHistory: Send + Sync {
    /// Add an entry.
    fn push(&self, path: &str);

    /// Overwrite the current entry.
    fn replace(&self, path: &str);

    /// Move back one entry.
    ///
    /// Returns the path now current when the implementation knows it right
    /// away. Real browsers answer `None` and later deliver a pop-state event
    /// that the host forwards to `NavigationShell::handle_pop_state`.
    fn back(&self) -> Option<String>;

    /// Move forward one entry. Same contract as `back`.
    fn forward(&self) -> Option<String>;

    /// Set the page title.
    fn set_title(&self, title: &str);
}
