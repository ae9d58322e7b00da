use crate::error::{KomittoError, Result};

/// Opens the candidate message in the system editor and returns the
/// edited text.
///
/// The `edit` crate writes the content to a temp file, picks the editor
/// by priority ($VISUAL > $EDITOR > platform defaults), blocks until it
/// exits, reads the file back, and removes it on every path.
///
/// # Returns
/// * `Ok(String)` - edited content
/// * `Err(KomittoError::UserCancelled)` - the user cleared the buffer
/// * `Err(KomittoError::Editor)` - the editor failed to launch or exited abnormally
pub fn edit_text(initial_content: &str) -> Result<String> {
    let edited =
        edit::edit(initial_content).map_err(|e| KomittoError::Editor(e.to_string()))?;

    // An emptied buffer means the user abandoned the edit
    if edited.trim().is_empty() {
        return Err(KomittoError::UserCancelled);
    }

    Ok(edited)
}
