//! Best-effort clipboard sink.
//!
//! Clipboard failures are never fatal anywhere in the program: the
//! caller either downgrades to a warning or echoes the text so the user
//! can copy it by hand.

use crate::error::{KomittoError, Result};

/// Destination for text the user wants to keep.
///
/// The production implementation is [`SystemClipboard`]; tests record
/// what would have been copied.
pub trait ClipboardSink {
    fn copy(&mut self, text: &str) -> Result<()>;
}

/// OS clipboard via arboard.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| KomittoError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| KomittoError::Clipboard(e.to_string()))
    }
}

/// Copies `text`, printing `success_message` on success; on failure
/// prints a warning and echoes the text for manual copying.
///
/// Returns whether the copy succeeded.
pub fn copy_or_echo(
    sink: &mut dyn ClipboardSink,
    text: &str,
    success_message: &str,
    colored: bool,
) -> bool {
    match sink.copy(text) {
        Ok(()) => {
            super::colors::success(success_message, colored);
            true
        }
        Err(e) => {
            tracing::debug!("clipboard copy failed: {}", e);
            super::colors::warning(&rust_i18n::t!("clipboard.failed"), colored);
            println!("\n{}", text);
            false
        }
    }
}
