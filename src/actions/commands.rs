//! Workflow commands written to stdout
//!
//! See the `::group::`, `::endgroup::` and `::error::` commands understood by
//! the GitHub Actions runner.

use tracing::debug;

/// Escape a command message
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Mark the run as failed with a message
pub fn error(message: &str) {
    println!("::error::{}", escape_data(message));
}

/// A collapsible log group, closed when dropped
#[must_use = "the group closes as soon as the guard is dropped"]
pub struct Group {
    title: String,
}

impl Group {
    /// Open a group with the given title
    pub fn start(title: &str) -> Self {
        println!("::group::{}", escape_data(title));
        Self {
            title: title.to_string(),
        }
    }
}

impl Drop for Group {
    fn drop(&mut self) {
        println!("::endgroup::");
        debug!("Closed group {}", self.title);
    }
}
