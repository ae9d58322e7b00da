pub mod repository;

use crate::error::Result;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Delimiter between commit blocks in the history text handed to the
/// prompt builder.
pub const HISTORY_DELIMITER: &str = "\n\n----------------------------------------\n\n";

/// Narrow contract to the version-control collaborator.
///
/// The only implementation shells out to the `git` binary
/// ([`repository::GitCli`]); the trait exists so the interactive flow
/// can be exercised against mocks.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait GitOperations {
    /// Diff of staged changes: changed lines only, no context lines,
    /// no path prefixes (`git diff --staged --no-prefix -U0`).
    ///
    /// # Errors
    /// - [`KomittoError::Repository`] outside a git work tree
    /// - [`KomittoError::NoStagedChanges`] when the index is clean
    ///
    /// [`KomittoError::Repository`]: crate::error::KomittoError::Repository
    /// [`KomittoError::NoStagedChanges`]: crate::error::KomittoError::NoStagedChanges
    fn staged_diff(&self) -> Result<String>;

    /// Last `limit` commits as pre-formatted text blocks (hash, date,
    /// message, per-file status) separated by [`HISTORY_DELIMITER`].
    ///
    /// Returns `None` when there is no usable history (empty repository
    /// or log failure); the prompt simply omits its history section.
    fn recent_log(&self, limit: usize) -> Result<Option<String>>;

    /// Raw messages of the last `limit` commits, newest first.
    fn commit_messages(&self, limit: usize) -> Result<Vec<String>>;

    /// Commits the staged changes with `message`.
    fn commit(&self, message: &str) -> Result<()>;
}
