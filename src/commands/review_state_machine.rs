//! Review loop state machine.
//!
//! Pure transition functions manage the generate/review/edit/regenerate
//! cycle; all I/O (provider calls, keypresses, editor, clipboard,
//! commit) lives in the driver (`commands/generate.rs`).
//!
//! # State transition diagram
//! ```text
//! Generating ──────────> Presenting ──────────> Accepted
//!     ^                      │                      │
//!     └──── regenerate ──────┤                      └──> clipboard + commit
//!                            ├──> Presenting (edit / cancelled edit)
//!                            └──> Cancelled
//! ```

use crate::error::{KomittoError, Result};

/// Where the review loop currently stands.
///
/// # Variants
/// - [`Generating`] - a provider call is about to be made
/// - [`Presenting`] - a candidate is on screen, awaiting one keypress
/// - [`Accepted`] - terminal: the candidate becomes the commit message
/// - [`Cancelled`] - terminal: nothing is committed or copied
///
/// [`Generating`]: ReviewState::Generating
/// [`Presenting`]: ReviewState::Presenting
/// [`Accepted`]: ReviewState::Accepted
/// [`Cancelled`]: ReviewState::Cancelled
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewState {
    /// About to call the provider (first attempt or regeneration).
    Generating {
        /// Zero-based attempt counter, shown in the message header.
        attempt: usize,
    },
    /// Candidate displayed, blocked on a single keypress.
    Presenting {
        /// Current candidate message (survives edits).
        message: String,
        /// Attempt that produced the original candidate.
        attempt: usize,
    },
    /// Terminal: candidate accepted.
    Accepted { message: String },
    /// Terminal: user cancelled.
    Cancelled,
}

/// Decision taken while presenting.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewAction {
    /// Accept the candidate: copy, commit, exit.
    Accept,
    /// Replace the candidate with editor output; stay presenting.
    Edit { new_message: String },
    /// Editor backed out (cleared buffer or editor failure); the prior
    /// candidate stays intact.
    EditCancelled,
    /// Discard the candidate and generate again with the same built
    /// prompt.
    Regenerate,
    /// Stop without committing or copying.
    Cancel,
}

impl ReviewState {
    /// Consumes a successful generation (pure).
    ///
    /// # Errors
    /// Calling outside [`ReviewState::Generating`] is a logic error.
    pub fn handle_generation(self, message: String) -> Result<Self> {
        match self {
            ReviewState::Generating { attempt } => Ok(ReviewState::Presenting { message, attempt }),
            _ => Err(KomittoError::Other(format!(
                "handle_generation called in wrong state: {:?}",
                self
            ))),
        }
    }

    /// Consumes a user decision (pure).
    ///
    /// # State transitions
    /// - `Accept` → `Accepted`
    /// - `Edit { new_message }` → `Presenting` (message replaced)
    /// - `EditCancelled` → `Presenting` (message unchanged)
    /// - `Regenerate` → `Generating` (attempt + 1)
    /// - `Cancel` → `Cancelled`
    ///
    /// Outside `Presenting` the action is logged and collapses to
    /// `Cancelled`.
    pub fn handle_action(self, action: ReviewAction) -> Self {
        match self {
            ReviewState::Presenting { message, attempt } => match action {
                ReviewAction::Accept => ReviewState::Accepted { message },

                ReviewAction::Edit { new_message } => ReviewState::Presenting {
                    message: new_message,
                    attempt,
                },

                ReviewAction::EditCancelled => ReviewState::Presenting { message, attempt },

                ReviewAction::Regenerate => ReviewState::Generating {
                    attempt: attempt + 1,
                },

                ReviewAction::Cancel => ReviewState::Cancelled,
            },
            _ => {
                tracing::error!("handle_action called in wrong state: {:?}", self);
                ReviewState::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generation_success_moves_to_presenting() {
        let state = ReviewState::Generating { attempt: 0 };
        let state = state
            .handle_generation("feat: add login".to_string())
            .unwrap();

        assert!(matches!(state, ReviewState::Presenting {
            ref message,
            attempt: 0,
        } if message == "feat: add login"));
    }

    #[test]
    fn test_generation_in_wrong_state_errors() {
        let state = ReviewState::Cancelled;
        assert!(state.handle_generation("msg".to_string()).is_err());
    }

    #[test]
    fn test_accept_keeps_message() {
        let state = ReviewState::Presenting {
            message: "test msg".to_string(),
            attempt: 0,
        };

        let result = state.handle_action(ReviewAction::Accept);
        assert!(matches!(result, ReviewState::Accepted { message }
            if message == "test msg"));
    }

    #[test]
    fn test_edit_replaces_candidate() {
        let state = ReviewState::Presenting {
            message: "original".to_string(),
            attempt: 1,
        };

        let result = state.handle_action(ReviewAction::Edit {
            new_message: "edited".to_string(),
        });

        assert!(matches!(result, ReviewState::Presenting {
            ref message,
            attempt: 1,
        } if message == "edited"));
    }

    #[test]
    fn test_edit_cancelled_preserves_candidate() {
        let state = ReviewState::Presenting {
            message: "original".to_string(),
            attempt: 0,
        };

        let result = state.handle_action(ReviewAction::EditCancelled);

        assert!(matches!(result, ReviewState::Presenting {
            ref message,
            ..
        } if message == "original"));
    }

    #[test]
    fn test_regenerate_discards_and_increments_attempt() {
        let state = ReviewState::Presenting {
            message: "msg".to_string(),
            attempt: 2,
        };

        let result = state.handle_action(ReviewAction::Regenerate);
        assert_eq!(result, ReviewState::Generating { attempt: 3 });
    }

    #[test]
    fn test_cancel_is_terminal() {
        let state = ReviewState::Presenting {
            message: "msg".to_string(),
            attempt: 5,
        };

        let result = state.handle_action(ReviewAction::Cancel);
        assert_eq!(result, ReviewState::Cancelled);
    }

    #[test]
    fn test_action_in_wrong_state_collapses_to_cancelled() {
        let state = ReviewState::Generating { attempt: 0 };
        let result = state.handle_action(ReviewAction::Accept);
        assert_eq!(result, ReviewState::Cancelled);
    }

    #[test]
    fn test_edit_then_accept_keeps_edited_text() {
        let state = ReviewState::Presenting {
            message: "first".to_string(),
            attempt: 0,
        };
        let state = state.handle_action(ReviewAction::Edit {
            new_message: "second".to_string(),
        });
        let state = state.handle_action(ReviewAction::Accept);

        assert!(matches!(state, ReviewState::Accepted { message }
            if message == "second"));
    }
}
