//! Single-keypress action menu for the review loop.
//!
//! The terminal enters raw mode only for the duration of one read, via
//! an RAII guard that restores the previous settings on every path.

use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::error::Result;

/// Key decision made while a candidate message is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewKey {
    Accept,
    Edit,
    Regenerate,
    Cancel,
}

struct RawModeGuard;

impl RawModeGuard {
    fn acquire() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn print_prompt() {
    print!("{}", rust_i18n::t!("review.action_prompt"));
    io::stdout().flush().ok();
}

/// Blocks for one recognized keypress.
///
/// `y` accept, `e` edit, `r` regenerate, `n`/`q`/Esc/Ctrl-C cancel.
/// Unrecognized keys re-prompt without changing anything.
pub fn read_review_key() -> Result<ReviewKey> {
    print_prompt();
    let _guard = RawModeGuard::acquire()?;

    loop {
        let ev = event::read()?;

        let Event::Key(key) = ev else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            print!("\r\n");
            return Ok(ReviewKey::Cancel);
        }

        let decision = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(ReviewKey::Accept),
            KeyCode::Char('e') | KeyCode::Char('E') => Some(ReviewKey::Edit),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(ReviewKey::Regenerate),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char('q') | KeyCode::Esc => {
                Some(ReviewKey::Cancel)
            }
            _ => None,
        };

        match decision {
            Some(key) => {
                print!("\r\n");
                io::stdout().flush().ok();
                return Ok(key);
            }
            None => {
                // Re-prompt on anything unrecognized
                print!("\r\n");
                print_prompt();
            }
        }
    }
}
