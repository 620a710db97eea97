//! `gridkit-core` provides the building blocks of a spreadsheet-style data grid
//! for terminal UIs.
//!
//! ## Design goals
//!
//! - Event-loop agnostic: you drive input + rendering from your app.
//! - No async runtime: all components run on the main thread.
//! - Side effects are app-controlled: copy surfaces as
//!   [`grid::view::GridAction::CopyRequested`] and committed edits as
//!   [`grid::view::GridAction::CellsUpdated`]; the caller integrates a clipboard
//!   and applies updates to its own data store.
//!
//! ## Getting started
//!
//! Most users should depend on the facade crate `gridkit`. Use this crate
//! directly if you only need the engine and widget.
//!
//! Useful entry points:
//! - [`grid::view::GridView`]: virtualized 2D grid with cell selection and
//!   optional in-place editing.
//! - [`selection::SelectionState`]: the selection/range engine on its own.
//! - [`editor::EditorKind`]: per-column editor descriptors.
//! - [`source::RowSource`]: how the app supplies row data.
//!
//! ## Selection / copy
//!
//! The grid tracks one focused cell plus a set of selected cells keyed by
//! [`address::CellKey`]. Plain clicks and arrow keys select single cells,
//! Shift extends a rectangle, Ctrl/Cmd toggles membership. Ctrl/Cmd+C
//! serializes the selection as CSV and hands it to the app; an empty selection
//! produces a "nothing to copy" notice instead of touching any clipboard.
pub mod theme;

#[cfg(feature = "crossterm")]
pub mod crossterm_input;

pub mod render;
pub mod viewport;

pub mod address;
pub mod clipboard;
pub mod column;
pub mod editor;
pub mod grid;
pub mod input;
pub mod keymap;
pub mod selection;
pub mod source;
