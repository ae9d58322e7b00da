pub mod clipboard;
pub mod colors;
pub mod editor;
pub mod keys;
pub mod spinner;
pub mod streaming;

pub use clipboard::*;
pub use colors::*;
pub use editor::*;
pub use keys::*;
pub use spinner::*;
pub use streaming::*;
