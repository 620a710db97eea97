//! Batteries-included facade over [`gridkit-core`](gridkit_core).
//!
//! Re-exports the core modules and adds opt-in host integrations:
//! - `crossterm` feature: event conversion via [`crossterm_input`].
//! - `clipboard` feature: [`system_clipboard::SystemClipboard`], an `arboard`-backed
//!   [`clipboard::ClipboardWriter`] for routing
//!   [`grid::view::GridAction::CopyRequested`] payloads.
//!
//! See the `grid` and `editable_grid` examples for complete app loops.
pub use gridkit_core::address;
pub use gridkit_core::clipboard;
pub use gridkit_core::column;
pub use gridkit_core::editor;
pub use gridkit_core::grid;
pub use gridkit_core::input;
pub use gridkit_core::keymap;
pub use gridkit_core::render;
pub use gridkit_core::selection;
pub use gridkit_core::source;
pub use gridkit_core::theme;
pub use gridkit_core::viewport;

#[cfg(feature = "crossterm")]
pub use gridkit_core::crossterm_input;

#[cfg(feature = "clipboard")]
pub mod system_clipboard;
