use crate::address::CellPosition;
use crate::clipboard;
use crate::column::GridColumn;
use crate::column::NavigableColumns;
use crate::editor::CellUpdate;
use crate::editor::CellValue;
use crate::editor::EditSession;
use crate::input::InputEvent;
use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::MouseButton;
use crate::input::MouseEvent;
use crate::input::MouseEventKind;
use crate::keymap;
use crate::render;
use crate::selection::SelectionState;
use crate::source::RowSource;
use crate::theme::Theme;
use crate::viewport::ViewportState;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Span;
use std::sync::Arc;
use unicode_width::UnicodeWidthChar;
use virtualizer::Align;
use virtualizer::VirtualItem;
use virtualizer::Virtualizer;
use virtualizer::VirtualizerOptions;

/// Actions produced by [`GridView::handle_event`].
///
/// The grid never talks to a clipboard or a data store itself: copy surfaces as
/// [`GridAction::CopyRequested`] with the CSV payload, and committed edits or
/// pasted batches as [`GridAction::CellsUpdated`] for the app to apply.
#[derive(Clone, Debug, PartialEq)]
pub enum GridAction {
    None,
    Redraw,
    SelectionChanged,
    /// Enter on a cell whose column has no editor.
    Activated(CellPosition),
    CopyRequested(String),
    CellsUpdated(Vec<CellUpdate>),
    /// Transient user-facing message, e.g. copy with nothing selected.
    Notice(String),
}

/// Key bindings for grid navigation and selection.
///
/// Shift held together with a non-character directional key extends the
/// selection range instead of collapsing it to the candidate cell.
#[derive(Clone, Debug)]
pub struct GridBindings {
    pub up: Vec<KeyEvent>,
    pub down: Vec<KeyEvent>,
    pub left: Vec<KeyEvent>,
    pub right: Vec<KeyEvent>,
    pub home: Vec<KeyEvent>,
    pub end: Vec<KeyEvent>,
    pub row_first: Vec<KeyEvent>,
    pub row_last: Vec<KeyEvent>,
    pub page_up: Vec<KeyEvent>,
    pub page_down: Vec<KeyEvent>,
    pub copy: Vec<KeyEvent>,
    pub clear: Vec<KeyEvent>,
    pub toggle: Vec<KeyEvent>,
    pub activate: Vec<KeyEvent>,
}

impl Default for GridBindings {
    fn default() -> Self {
        Self {
            up: vec![KeyEvent::new(KeyCode::Up), keymap::key_char('k')],
            down: vec![KeyEvent::new(KeyCode::Down), keymap::key_char('j')],
            left: vec![KeyEvent::new(KeyCode::Left), keymap::key_char('h')],
            right: vec![KeyEvent::new(KeyCode::Right), keymap::key_char('l')],
            home: vec![KeyEvent::new(KeyCode::Home)],
            end: vec![KeyEvent::new(KeyCode::End)],
            row_first: vec![keymap::key_char('g')],
            row_last: vec![keymap::key_char('G')],
            page_up: vec![KeyEvent::new(KeyCode::PageUp), keymap::key_ctrl('u')],
            page_down: vec![KeyEvent::new(KeyCode::PageDown), keymap::key_ctrl('d')],
            copy: vec![keymap::key_ctrl('c'), keymap::key_cmd('c')],
            clear: vec![KeyEvent::new(KeyCode::Esc)],
            toggle: vec![keymap::key_char(' ')],
            activate: vec![KeyEvent::new(KeyCode::Enter)],
        }
    }
}

/// Options for [`GridView`].
#[derive(Clone, Debug)]
pub struct GridOptions {
    pub show_header: bool,
    pub show_scrollbar_y: bool,
    pub overscan_rows: usize,
    pub overscan_cols: usize,
    pub row_height: u32,
    pub col_gap: u32,
    pub style: Style,
    pub header_style: Style,
    pub grid_line_style: Style,
    pub scrollbar_style: Style,
    pub focus_style: Style,
    pub selected_style: Style,
    pub editing_style: Style,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            show_header: true,
            show_scrollbar_y: true,
            overscan_rows: 2,
            overscan_cols: 2,
            row_height: 1,
            col_gap: 1,
            style: Style::default(),
            header_style: Style::default().add_modifier(Modifier::BOLD),
            grid_line_style: Style::default(),
            scrollbar_style: Style::default(),
            focus_style: Style::default().add_modifier(Modifier::REVERSED),
            selected_style: Style::default().add_modifier(Modifier::BOLD),
            editing_style: Style::default().add_modifier(Modifier::UNDERLINED),
        }
    }
}

#[derive(Clone, Copy)]
enum Move {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    RowFirst,
    RowLast,
    PageUp,
    PageDown,
}

enum Command {
    Clear,
    Copy,
    Toggle,
    Activate,
    Move(Move, bool),
}

#[derive(Clone, Copy)]
struct CellStyles {
    base: Style,
    focus: Style,
    selected: Style,
    editing: Style,
    grid_line: Style,
}

/// A virtualized 2D grid with spreadsheet-style cell selection and optional
/// in-place editing.
///
/// The grid is event-loop agnostic: the app loop feeds it
/// [`InputEvent`]s through [`GridView::handle_event`] and draws it with
/// [`GridView::render`]. Row data comes from a read-only [`RowSource`]; the grid
/// owns only focus, selection, scroll, and the in-flight edit session.
pub struct GridView {
    pub state: ViewportState,
    options: GridOptions,
    bindings: GridBindings,
    columns: Vec<GridColumn>,
    navigable: NavigableColumns,
    rows: usize,
    focus: Option<CellPosition>,
    selection: SelectionState,
    edit: Option<EditSession>,
    row_v: Virtualizer,
    col_v: Virtualizer,
    row_items: Vec<VirtualItem>,
    col_items: Vec<VirtualItem>,
    body_area: Rect,
}

impl Default for GridView {
    fn default() -> Self {
        let options = GridOptions::default();

        let row_height = options.row_height.max(1);
        let mut row_opts = VirtualizerOptions::new(0, move |_| row_height);
        row_opts.overscan = options.overscan_rows;
        let row_v = Virtualizer::new(row_opts);

        let mut col_opts = VirtualizerOptions::new(0, |_| 1);
        col_opts.gap = options.col_gap;
        col_opts.overscan = options.overscan_cols;
        let col_v = Virtualizer::new(col_opts);

        Self {
            state: ViewportState::default(),
            options,
            bindings: GridBindings::default(),
            columns: Vec::new(),
            navigable: NavigableColumns::default(),
            rows: 0,
            focus: None,
            selection: SelectionState::default(),
            edit: None,
            row_v,
            col_v,
            row_items: Vec::new(),
            col_items: Vec::new(),
            body_area: Rect::default(),
        }
    }
}

impl GridView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GridOptions) -> Self {
        let mut v = Self::default();
        v.set_options(options);
        v
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: GridOptions) {
        self.options = options;
        self.rebuild_row_virtualizer();
        self.rebuild_col_virtualizer();
        self.state.clamp();
    }

    pub fn bindings(&self) -> &GridBindings {
        &self.bindings
    }

    pub fn set_bindings(&mut self, bindings: GridBindings) {
        self.bindings = bindings;
    }

    pub fn set_columns(&mut self, columns: Vec<GridColumn>) {
        self.columns = columns;
        self.navigable = NavigableColumns::from_columns(&self.columns);
        self.rebuild_col_virtualizer();
        match &self.focus {
            Some(f) if !self.navigable.contains(&f.column) => {
                self.focus = self.seed_focus_at(f.row);
            }
            None => self.focus = self.seed_focus(),
            _ => {}
        }
        if let Some(session) = &self.edit {
            if !self.navigable.contains(session.column_id()) {
                self.edit = None;
            }
        }
        self.state.clamp();
    }

    /// Replaces the row set. Selection and focus are display-index based, so
    /// both are discarded; focus re-seeds to the first navigable cell of row 0.
    pub fn set_row_count(&mut self, rows: usize) {
        self.rows = rows;
        self.rebuild_row_virtualizer();
        self.edit = None;
        self.selection.clear();
        self.focus = self.seed_focus();
        self.state.clamp();
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[GridColumn] {
        &self.columns
    }

    pub fn navigable_columns(&self) -> &NavigableColumns {
        &self.navigable
    }

    pub fn focus(&self) -> Option<&CellPosition> {
        self.focus.as_ref()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    /// Moves focus to `pos` (if navigable), selects it, and scrolls it into
    /// view. Silent no-op for non-navigable columns or out-of-range rows.
    pub fn set_focus(&mut self, pos: CellPosition) {
        if pos.row >= self.rows || !self.navigable.contains(&pos.column) {
            return;
        }
        self.selection.select_single(&pos);
        self.focus = Some(pos);
        self.ensure_focus_visible();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Opens an edit session on `pos` if its column declares an editor and the
    /// source can name the row. Returns whether a session is now open there.
    pub fn start_edit(&mut self, pos: &CellPosition, source: &dyn RowSource) -> bool {
        let editor = self
            .column_index(&pos.column)
            .and_then(|i| self.columns[i].editor.clone());
        let Some(editor) = editor else {
            return false;
        };
        let Some(row_id) = source.row_id(pos.row) else {
            return false;
        };
        let current = source
            .value(pos.row, &pos.column)
            .unwrap_or(CellValue::Null);
        self.edit = Some(EditSession::open(row_id, pos.column.clone(), editor, current));
        true
    }

    /// Coerces the open draft and closes the session on success. `None` when no
    /// session is open or the draft is rejected (the editor then stays open).
    pub fn commit_edit(&mut self) -> Option<CellUpdate> {
        let session = self.edit.as_ref()?;
        let value = session.commit()?;
        let update = CellUpdate {
            row_id: session.row_id().to_string(),
            column_id: session.column_id().to_string(),
            value,
        };
        self.edit = None;
        Some(update)
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    pub fn handle_event(&mut self, event: InputEvent, source: &dyn RowSource) -> GridAction {
        match event {
            InputEvent::Key(key) => self.handle_key(key, source),
            InputEvent::Paste(text) => self.handle_paste(&text, source),
            InputEvent::Mouse(m) => self.handle_mouse(m),
        }
    }

    pub fn scroll_y_by(&mut self, delta: i32) {
        self.sync_virtualizers_from_state();
        self.state.scroll_y_by(delta);
        self.row_v.set_scroll_offset(self.state.y as u64);
        self.state.y = self.row_v.scroll_offset().min(u32::MAX as u64) as u32;
    }

    pub fn scroll_x_by(&mut self, delta: i32) {
        self.sync_virtualizers_from_state();
        self.state.scroll_x_by(delta);
        self.col_v.set_scroll_offset(self.state.x as u64);
        self.state.x = self.col_v.scroll_offset().min(u32::MAX as u64) as u32;
    }

    /// Best-effort scroll so the focused cell is mounted. Dispatched after
    /// logical state commits; selection math never depends on it.
    pub fn ensure_focus_visible(&mut self) {
        self.sync_virtualizers_from_state();
        let Some(focus) = &self.focus else {
            return;
        };
        let Some(col_idx) = self.column_index(&focus.column) else {
            return;
        };
        self.row_v.scroll_to_index(focus.row, Align::Auto);
        self.col_v.scroll_to_index(col_idx, Align::Auto);
        self.state.y = self.row_v.scroll_offset().min(u32::MAX as u64) as u32;
        self.state.x = self.col_v.scroll_offset().min(u32::MAX as u64) as u32;
        self.state.clamp();
    }

    fn column_index(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    fn seed_focus(&self) -> Option<CellPosition> {
        self.seed_focus_at(0)
    }

    fn seed_focus_at(&self, row: usize) -> Option<CellPosition> {
        if self.rows == 0 {
            return None;
        }
        let first = self.navigable.first()?;
        Some(CellPosition::new(row.min(self.rows - 1), first))
    }

    fn handle_key(&mut self, key: KeyEvent, source: &dyn RowSource) -> GridAction {
        if self.edit.is_some() {
            return self.handle_edit_key(key);
        }
        if self.rows == 0 || self.navigable.is_empty() {
            self.focus = None;
            self.selection.clear();
            self.state.to_top();
            self.state.to_left();
            return GridAction::None;
        }

        self.sync_virtualizers_from_state();
        if self.focus.is_none() {
            self.focus = self.seed_focus();
        }

        let Some(command) = self.command_for(&key) else {
            return GridAction::None;
        };
        match command {
            Command::Clear => {
                if self.selection.is_empty() && self.selection.range().is_none() {
                    GridAction::None
                } else {
                    self.selection.clear();
                    GridAction::SelectionChanged
                }
            }
            Command::Copy => self.copy_selection(source),
            Command::Toggle => {
                let Some(focus) = self.focus.clone() else {
                    return GridAction::None;
                };
                self.selection.toggle_cell(&focus);
                GridAction::SelectionChanged
            }
            Command::Activate => self.activate(source),
            Command::Move(m, shift) => self.apply_move(m, shift),
        }
    }

    fn command_for(&self, key: &KeyEvent) -> Option<Command> {
        let b = &self.bindings;
        if keymap::any_match(&b.clear, key) {
            return Some(Command::Clear);
        }
        if keymap::any_match(&b.copy, key) {
            return Some(Command::Copy);
        }
        if keymap::any_match(&b.toggle, key) {
            return Some(Command::Toggle);
        }
        if keymap::any_match(&b.activate, key) {
            return Some(Command::Activate);
        }

        // Shift on a character key produces a different character, so only
        // non-character keys can carry a range extension.
        let shift = key.modifiers.shift && !matches!(key.code, KeyCode::Char(_));
        let base = KeyEvent {
            code: key.code.clone(),
            modifiers: key.modifiers.without_shift(),
        };
        let m = if keymap::any_match(&b.up, &base) {
            Move::Up
        } else if keymap::any_match(&b.down, &base) {
            Move::Down
        } else if keymap::any_match(&b.left, &base) {
            Move::Left
        } else if keymap::any_match(&b.right, &base) {
            Move::Right
        } else if keymap::any_match(&b.home, &base) {
            Move::Home
        } else if keymap::any_match(&b.end, &base) {
            Move::End
        } else if keymap::any_match(&b.row_first, &base) {
            Move::RowFirst
        } else if keymap::any_match(&b.row_last, &base) {
            Move::RowLast
        } else if keymap::any_match(&b.page_up, &base) {
            Move::PageUp
        } else if keymap::any_match(&b.page_down, &base) {
            Move::PageDown
        } else {
            return None;
        };
        Some(Command::Move(m, shift))
    }

    fn candidate_for(&self, m: Move, from: &CellPosition) -> Option<CellPosition> {
        let last_row = self.rows - 1;
        let page = (self.state.viewport_h as usize / self.options.row_height.max(1) as usize).max(1);
        let same_col = |row: usize| Some(CellPosition::new(row, from.column.clone()));
        match m {
            Move::Up => same_col(from.row.saturating_sub(1)),
            Move::Down => same_col((from.row + 1).min(last_row)),
            Move::Left => self
                .navigable
                .step(&from.column, -1)
                .map(|c| CellPosition::new(from.row, c)),
            Move::Right => self
                .navigable
                .step(&from.column, 1)
                .map(|c| CellPosition::new(from.row, c)),
            Move::Home => self
                .navigable
                .first()
                .map(|c| CellPosition::new(from.row, c)),
            Move::End => self
                .navigable
                .last()
                .map(|c| CellPosition::new(from.row, c)),
            Move::RowFirst => same_col(0),
            Move::RowLast => same_col(last_row),
            Move::PageUp => same_col(from.row.saturating_sub(page)),
            Move::PageDown => same_col((from.row + page).min(last_row)),
        }
    }

    fn apply_move(&mut self, m: Move, shift: bool) -> GridAction {
        let Some(focus) = self.focus.clone() else {
            return GridAction::None;
        };
        let Some(candidate) = self.candidate_for(m, &focus) else {
            return GridAction::None;
        };
        if candidate == focus {
            return GridAction::None;
        }

        if shift {
            let anchor = self
                .selection
                .anchor()
                .cloned()
                .unwrap_or_else(|| focus.clone());
            self.selection.select_range(&anchor, &candidate, &self.navigable);
        } else {
            self.selection.select_single(&candidate);
        }
        self.focus = Some(candidate);
        self.ensure_focus_visible();
        GridAction::Redraw
    }

    fn copy_selection(&self, source: &dyn RowSource) -> GridAction {
        if self.selection.is_empty() {
            return GridAction::Notice("nothing to copy".to_string());
        }
        match clipboard::selection_csv(&self.selection, &self.columns, source) {
            Some(csv) => GridAction::CopyRequested(csv),
            None => GridAction::Notice("nothing to copy".to_string()),
        }
    }

    fn activate(&mut self, source: &dyn RowSource) -> GridAction {
        let Some(focus) = self.focus.clone() else {
            return GridAction::None;
        };
        self.ensure_focus_visible();
        if self.start_edit(&focus, source) {
            GridAction::Redraw
        } else {
            GridAction::Activated(focus)
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> GridAction {
        if key.code == KeyCode::Esc {
            self.edit = None;
            return GridAction::Redraw;
        }
        if key.code == KeyCode::Enter && !key.modifiers.alt {
            return match self.commit_edit() {
                Some(update) => GridAction::CellsUpdated(vec![update]),
                None => GridAction::None,
            };
        }
        let Some(session) = self.edit.as_mut() else {
            return GridAction::None;
        };
        if session.handle_key(&key) {
            GridAction::Redraw
        } else {
            GridAction::None
        }
    }

    fn handle_mouse(&mut self, ev: MouseEvent) -> GridAction {
        match ev.kind {
            MouseEventKind::ScrollUp => {
                self.scroll_y_by(-3);
                GridAction::Redraw
            }
            MouseEventKind::ScrollDown => {
                self.scroll_y_by(3);
                GridAction::Redraw
            }
            MouseEventKind::Down(MouseButton::Left) => self.handle_click(ev),
            MouseEventKind::Drag(MouseButton::Left) => self.handle_drag(ev),
            _ => GridAction::None,
        }
    }

    /// Hit-test a screen coordinate against the last rendered body area.
    /// `None` for structural columns and anything outside the body.
    fn cell_at(&mut self, x: u16, y: u16) -> Option<CellPosition> {
        let body = self.body_area;
        if self.rows == 0
            || x < body.x
            || y < body.y
            || x >= body.x.saturating_add(body.width)
            || y >= body.y.saturating_add(body.height)
        {
            return None;
        }

        self.sync_virtualizers_from_state();
        let rel_x = (x - body.x) as u64;
        let rel_y = (y - body.y) as u64;
        let row = self.row_v.index_at_offset(self.row_v.scroll_offset() + rel_y)?;
        let col = self.col_v.index_at_offset(self.col_v.scroll_offset() + rel_x)?;
        if row >= self.rows || col >= self.columns.len() {
            return None;
        }
        let column = &self.columns[col];
        if !column.is_navigable() {
            return None;
        }
        Some(CellPosition::new(row, column.id.clone()))
    }

    fn handle_click(&mut self, ev: MouseEvent) -> GridAction {
        if self.edit.is_some() {
            // Commit-on-blur. A rejected draft keeps the editor sticky, so the
            // click is swallowed rather than tearing down an invalid edit.
            return match self.commit_edit() {
                Some(update) => GridAction::CellsUpdated(vec![update]),
                None => GridAction::None,
            };
        }

        let Some(clicked) = self.cell_at(ev.x, ev.y) else {
            return GridAction::None;
        };
        let prev_focus = self.focus.replace(clicked.clone());
        self.ensure_focus_visible();

        if ev.modifiers.shift {
            let anchor = self
                .selection
                .anchor()
                .cloned()
                .or(prev_focus)
                .unwrap_or_else(|| clicked.clone());
            self.selection.select_range(&anchor, &clicked, &self.navigable);
        } else if ev.modifiers.ctrl || ev.modifiers.cmd {
            self.selection.toggle_cell(&clicked);
        } else {
            self.selection.select_single(&clicked);
        }
        GridAction::SelectionChanged
    }

    /// Dragging with the left button extends the range from the mouse-down
    /// anchor, like shift-click.
    fn handle_drag(&mut self, ev: MouseEvent) -> GridAction {
        if self.edit.is_some() {
            return GridAction::None;
        }
        let Some(cell) = self.cell_at(ev.x, ev.y) else {
            return GridAction::None;
        };
        if self.focus.as_ref() == Some(&cell) {
            return GridAction::None;
        }
        let anchor = self
            .selection
            .anchor()
            .cloned()
            .or_else(|| self.focus.clone())
            .unwrap_or_else(|| cell.clone());
        self.selection.select_range(&anchor, &cell, &self.navigable);
        self.focus = Some(cell);
        self.ensure_focus_visible();
        GridAction::SelectionChanged
    }

    /// Overlays pasted CSV/TSV on the grid starting at the focused cell across
    /// navigable columns. Fields coerce through each target column's editor;
    /// non-editable columns and rejected fields are skipped.
    fn handle_paste(&mut self, text: &str, source: &dyn RowSource) -> GridAction {
        if let Some(session) = self.edit.as_mut() {
            return if session.paste(text) {
                GridAction::Redraw
            } else {
                GridAction::None
            };
        }

        let Some(focus) = self.focus.clone() else {
            return GridAction::None;
        };
        let Some(start_col) = self.navigable.index_of(&focus.column) else {
            return GridAction::None;
        };

        let delimiter = if text.contains('\t') { b'\t' } else { b',' };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut updates = Vec::new();
        for (dr, record) in reader.records().filter_map(Result::ok).enumerate() {
            let row = focus.row + dr;
            if row >= self.rows {
                break;
            }
            let Some(row_id) = source.row_id(row) else {
                continue;
            };
            for (dc, field) in record.iter().enumerate() {
                let Some(column_id) = self.navigable.id_at(start_col + dc) else {
                    break;
                };
                let editor = self
                    .column_index(column_id)
                    .and_then(|i| self.columns[i].editor.as_ref());
                let Some(editor) = editor else {
                    continue;
                };
                if let Some(value) = editor.coerce(field) {
                    updates.push(CellUpdate {
                        row_id: row_id.clone(),
                        column_id: column_id.to_string(),
                        value,
                    });
                }
            }
        }

        if updates.is_empty() {
            GridAction::None
        } else {
            GridAction::CellsUpdated(updates)
        }
    }

    pub fn render(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme, source: &dyn RowSource) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let header_h = if self.options.show_header { 1u16 } else { 0u16 };
        let header_h = header_h.min(area.height);

        let (content_area, scrollbar_x) = if self.options.show_scrollbar_y && area.width >= 2 {
            (
                Rect::new(area.x, area.y, area.width - 1, area.height),
                Some(area.x + area.width - 1),
            )
        } else {
            (area, None)
        };

        let header_area = Rect::new(content_area.x, content_area.y, content_area.width, header_h);
        let body_area = Rect::new(
            content_area.x,
            content_area.y + header_h,
            content_area.width,
            content_area.height.saturating_sub(header_h),
        );

        let base_style = if self.options.style == Style::default() {
            theme.text_primary
        } else {
            self.options.style
        };
        let header_style = self.options.header_style.patch(theme.header);
        let grid_line_style = if self.options.grid_line_style == Style::default() {
            theme.text_muted
        } else {
            self.options.grid_line_style
        };
        let styles = CellStyles {
            base: base_style,
            focus: self.options.focus_style.patch(theme.accent),
            selected: self.options.selected_style.patch(theme.accent),
            editing: self.options.editing_style.patch(theme.accent),
            grid_line: grid_line_style,
        };

        buf.set_style(content_area, base_style);
        buf.set_style(header_area, header_style);

        self.sync_virtualizers(body_area);
        self.collect_virtual_items();
        self.body_area = body_area;

        if header_area.height > 0 {
            self.render_header(header_area, buf, header_style, grid_line_style);
        }
        self.render_body(body_area, buf, styles, source);

        if let Some(sb_x) = scrollbar_x {
            render::render_scrollbar(
                Rect::new(sb_x, body_area.y, 1, body_area.height),
                buf,
                &ViewportState {
                    x: 0,
                    y: self.state.y,
                    viewport_w: 1,
                    viewport_h: body_area.height,
                    content_w: 1,
                    content_h: self.state.content_h,
                },
                self.options.scrollbar_style,
            );
        }
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer, style: Style, grid_line_style: Style) {
        if area.width == 0 || area.height == 0 || self.columns.is_empty() {
            return;
        }
        let scroll_x = self.col_v.scroll_offset();
        for col_item in self.col_items.iter().copied() {
            let column = &self.columns[col_item.index];
            let (rect, clip_left) = clipped_rect_x(area, scroll_x, col_item.start, col_item.size);
            if rect.width == 0 {
                continue;
            }
            let clipped = render::slice_by_cols(&column.title, clip_left, rect.width);
            buf.set_stringn(rect.x, rect.y, clipped, rect.width as usize, style);
            if self.options.col_gap > 0 {
                self.draw_col_separator(area, buf, grid_line_style, col_item);
            }
        }
    }

    fn render_body(&self, area: Rect, buf: &mut Buffer, styles: CellStyles, source: &dyn RowSource) {
        if area.width == 0 || area.height == 0 || self.rows == 0 || self.columns.is_empty() {
            return;
        }

        let scroll_x = self.col_v.scroll_offset();
        let scroll_y = self.row_v.scroll_offset();
        let focus_cell: Option<(usize, usize)> = self
            .focus
            .as_ref()
            .and_then(|f| self.column_index(&f.column).map(|ci| (f.row, ci)));

        for row_item in self.row_items.iter().copied() {
            let (row_rect, _clip_top) = clipped_rect_y(area, scroll_y, row_item.start, row_item.size);
            if row_rect.height == 0 {
                continue;
            }
            for col_item in self.col_items.iter().copied() {
                let (cell_rect, clip_left) =
                    clipped_rect_x(row_rect, scroll_x, col_item.start, col_item.size);
                if cell_rect.width == 0 || cell_rect.height == 0 {
                    continue;
                }

                let column = &self.columns[col_item.index];
                let is_focus = focus_cell == Some((row_item.index, col_item.index));
                let is_editing = is_focus && self.edit.is_some();
                let pos = CellPosition::new(row_item.index, column.id.clone());
                let is_selected = self.selection.is_selected(&pos);

                let style = if is_editing {
                    styles.editing
                } else if is_focus {
                    styles.focus
                } else if is_selected {
                    styles.selected
                } else {
                    styles.base
                };
                buf.set_style(cell_rect, style);

                if is_editing {
                    self.render_editing_cell(cell_rect, clip_left, buf, style);
                } else {
                    let text = source
                        .value(row_item.index, &column.id)
                        .map(|v| v.display())
                        .unwrap_or_default();
                    let clipped = render::slice_by_cols(&text, clip_left, cell_rect.width);
                    buf.set_stringn(cell_rect.x, cell_rect.y, clipped, cell_rect.width as usize, style);
                }

                if self.options.col_gap > 0 {
                    self.draw_col_separator(row_rect, buf, styles.grid_line, col_item);
                }
            }
        }
    }

    fn render_editing_cell(&self, cell_rect: Rect, clip_left: u32, buf: &mut Buffer, style: Style) {
        let Some(session) = &self.edit else {
            return;
        };
        let draft = session.draft_text().replace('\n', "⏎");
        let clipped = render::slice_by_cols(&draft, clip_left, cell_rect.width);
        buf.set_stringn(cell_rect.x, cell_rect.y, clipped, cell_rect.width as usize, style);

        if let Some(cursor_chars) = session.cursor_chars() {
            let caret_col: usize = draft
                .chars()
                .take(cursor_chars)
                .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
                .sum();
            let caret_col = caret_col.saturating_sub(clip_left as usize);
            if caret_col < cell_rect.width as usize {
                let caret = Rect::new(cell_rect.x + caret_col as u16, cell_rect.y, 1, 1);
                buf.set_style(caret, style.add_modifier(Modifier::REVERSED));
            }
        }
    }

    fn draw_col_separator(&self, area: Rect, buf: &mut Buffer, style: Style, col_item: VirtualItem) {
        if col_item.index + 1 >= self.columns.len() {
            return;
        }
        let scroll_x = self.col_v.scroll_offset();
        let sep_x_rel = (col_item.start + col_item.size as u64) as i64 - scroll_x as i64;
        if sep_x_rel < 0 {
            return;
        }
        let sep_x = sep_x_rel as u16;
        if sep_x >= area.width {
            return;
        }
        for dy in 0..area.height {
            buf.set_span(area.x + sep_x, area.y + dy, &Span::styled("│", style), 1);
        }
    }

    fn sync_virtualizers(&mut self, body_area: Rect) {
        self.state.set_viewport(body_area.width, body_area.height);

        self.row_v.set_count(self.rows);
        self.row_v.set_viewport_size(body_area.height as u32);
        self.row_v.set_scroll_offset(self.state.y as u64);
        self.state.y = self.row_v.scroll_offset().min(u32::MAX as u64) as u32;

        self.col_v.set_count(self.columns.len());
        self.col_v.set_viewport_size(body_area.width as u32);
        self.col_v.set_scroll_offset(self.state.x as u64);
        self.state.x = self.col_v.scroll_offset().min(u32::MAX as u64) as u32;

        self.state.set_content(self.total_w_u32(), self.total_h_u32());
        self.state.clamp();

        self.row_v.set_overscan(self.options.overscan_rows);
        self.col_v.set_overscan(self.options.overscan_cols);
    }

    fn sync_virtualizers_from_state(&mut self) {
        self.row_v.set_count(self.rows);
        self.col_v.set_count(self.columns.len());

        self.row_v.set_viewport_size(self.state.viewport_h as u32);
        self.col_v.set_viewport_size(self.state.viewport_w as u32);

        self.row_v.set_scroll_offset(self.state.y as u64);
        self.col_v.set_scroll_offset(self.state.x as u64);

        self.state.y = self.row_v.scroll_offset().min(u32::MAX as u64) as u32;
        self.state.x = self.col_v.scroll_offset().min(u32::MAX as u64) as u32;

        self.state.set_content(self.total_w_u32(), self.total_h_u32());
        self.state.clamp();

        self.row_v.set_overscan(self.options.overscan_rows);
        self.col_v.set_overscan(self.options.overscan_cols);
    }

    fn total_h_u32(&self) -> u32 {
        self.row_v.total_size().min(u32::MAX as u64) as u32
    }

    fn total_w_u32(&self) -> u32 {
        self.col_v.total_size().min(u32::MAX as u64) as u32
    }

    fn rebuild_row_virtualizer(&mut self) {
        let row_height = self.options.row_height.max(1);
        let mut opts = VirtualizerOptions::new(self.rows, move |_| row_height);
        opts.overscan = self.options.overscan_rows;
        self.row_v = Virtualizer::new(opts);
        self.row_v.set_viewport_size(self.state.viewport_h as u32);
        self.row_v.set_scroll_offset(self.state.y as u64);
        self.state.y = self.row_v.scroll_offset().min(u32::MAX as u64) as u32;
    }

    fn rebuild_col_virtualizer(&mut self) {
        let widths: Arc<Vec<u32>> = Arc::new(self.columns.iter().map(|c| c.width as u32).collect());
        let widths2 = widths.clone();
        let mut opts = VirtualizerOptions::new(self.columns.len(), move |i| {
            widths2.get(i).copied().unwrap_or(1).max(1)
        });
        opts.gap = self.options.col_gap;
        opts.overscan = self.options.overscan_cols;
        self.col_v = Virtualizer::new(opts);
        self.col_v.set_viewport_size(self.state.viewport_w as u32);
        self.col_v.set_scroll_offset(self.state.x as u64);
        self.state.x = self.col_v.scroll_offset().min(u32::MAX as u64) as u32;
    }

    fn collect_virtual_items(&mut self) {
        self.row_v.collect_virtual_items(&mut self.row_items);
        self.col_v.collect_virtual_items(&mut self.col_items);
    }
}

fn clipped_rect_x(area: Rect, scroll_x: u64, start: u64, size: u32) -> (Rect, u32) {
    let rel = start as i64 - scroll_x as i64;
    let clip_left = (-rel).max(0) as u32;
    let x = rel.max(0) as u16;
    let max_w = area.width.saturating_sub(x);
    let visible_w = size.saturating_sub(clip_left).min(max_w as u32) as u16;
    (
        Rect::new(area.x + x, area.y, visible_w, area.height),
        clip_left,
    )
}

fn clipped_rect_y(area: Rect, scroll_y: u64, start: u64, size: u32) -> (Rect, u32) {
    let rel = start as i64 - scroll_y as i64;
    let clip_top = (-rel).max(0) as u32;
    let y = rel.max(0) as u16;
    let max_h = area.height.saturating_sub(y);
    let visible_h = size.saturating_sub(clip_top).min(max_h as u32) as u16;
    (
        Rect::new(area.x, area.y + y, area.width, visible_h),
        clip_top,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorKind;
    use crate::editor::NumberEditor;
    use crate::input::KeyModifiers;

    struct Items(Vec<(String, String, f64)>);

    impl Items {
        fn new(n: usize) -> Self {
            Self(
                (0..n)
                    .map(|i| (format!("row-{i}"), format!("item {i}"), i as f64))
                    .collect(),
            )
        }
    }

    impl RowSource for Items {
        fn row_count(&self) -> usize {
            self.0.len()
        }

        fn row_id(&self, row: usize) -> Option<String> {
            self.0.get(row).map(|(id, _, _)| id.clone())
        }

        fn value(&self, row: usize, column_id: &str) -> Option<CellValue> {
            let (id, name, qty) = self.0.get(row)?;
            match column_id {
                "id" => Some(CellValue::Text(id.clone())),
                "name" => Some(CellValue::Text(name.clone())),
                "qty" => Some(CellValue::Number(*qty)),
                _ => None,
            }
        }
    }

    fn grid(rows: usize) -> GridView {
        let mut g = GridView::new();
        g.set_columns(vec![
            GridColumn::selection(3),
            GridColumn::new("id", "ID", 8),
            GridColumn::new("name", "Name", 12),
            GridColumn::new("qty", "Qty", 6).with_editor(EditorKind::Number(NumberEditor {
                min: Some(0.0),
                ..NumberEditor::default()
            })),
        ]);
        g.set_row_count(rows);
        g.state.set_viewport(40, 10);
        g
    }

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code))
    }

    fn shift_key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code).with_modifiers(KeyModifiers {
            shift: true,
            ..KeyModifiers::none()
        }))
    }

    #[test]
    fn focus_seeds_to_first_navigable_cell() {
        let g = grid(5);
        assert_eq!(g.focus(), Some(&CellPosition::new(0, "id")));
        assert!(g.selection().is_empty());
    }

    #[test]
    fn arrows_stay_inside_the_navigable_rectangle() {
        let src = Items::new(3);
        let mut g = grid(3);
        g.handle_event(key(KeyCode::Left), &src);
        assert_eq!(g.focus(), Some(&CellPosition::new(0, "id")));
        g.handle_event(key(KeyCode::Up), &src);
        assert_eq!(g.focus(), Some(&CellPosition::new(0, "id")));
        for _ in 0..10 {
            g.handle_event(key(KeyCode::Right), &src);
            g.handle_event(key(KeyCode::Down), &src);
        }
        assert_eq!(g.focus(), Some(&CellPosition::new(2, "qty")));
    }

    #[test]
    fn plain_move_selects_the_candidate() {
        let src = Items::new(3);
        let mut g = grid(3);
        g.handle_event(key(KeyCode::Down), &src);
        assert!(g.selection().is_selected(&CellPosition::new(1, "id")));
        assert_eq!(g.selection().len(), 1);
    }

    #[test]
    fn shift_arrows_extend_a_rectangle_from_the_anchor() {
        let src = Items::new(10);
        let mut g = grid(10);
        g.handle_event(key(KeyCode::Down), &src);
        g.handle_event(shift_key(KeyCode::Down), &src);
        g.handle_event(shift_key(KeyCode::Right), &src);
        assert_eq!(g.selection().len(), 4);
        assert!(g.selection().is_selected(&CellPosition::new(2, "name")));
        assert_eq!(g.focus(), Some(&CellPosition::new(2, "name")));
    }

    #[test]
    fn home_and_end_jump_within_the_row() {
        let src = Items::new(3);
        let mut g = grid(3);
        g.handle_event(key(KeyCode::End), &src);
        assert_eq!(g.focus(), Some(&CellPosition::new(0, "qty")));
        g.handle_event(key(KeyCode::Home), &src);
        assert_eq!(g.focus(), Some(&CellPosition::new(0, "id")));
    }

    #[test]
    fn escape_clears_selection_but_not_focus() {
        let src = Items::new(3);
        let mut g = grid(3);
        g.handle_event(key(KeyCode::Down), &src);
        let focus_before = g.focus().cloned();
        let action = g.handle_event(key(KeyCode::Esc), &src);
        assert_eq!(action, GridAction::SelectionChanged);
        assert!(g.selection().is_empty());
        assert!(g.selection().range().is_none());
        assert_eq!(g.focus().cloned(), focus_before);
    }

    #[test]
    fn copy_with_empty_selection_is_a_notice() {
        let src = Items::new(3);
        let mut g = grid(3);
        let action = g.handle_event(InputEvent::Key(keymap::key_ctrl('c')), &src);
        assert_eq!(action, GridAction::Notice("nothing to copy".to_string()));
    }

    #[test]
    fn copy_serializes_the_selection() {
        let src = Items::new(3);
        let mut g = grid(3);
        g.handle_event(key(KeyCode::Down), &src);
        g.handle_event(InputEvent::Key(
            KeyEvent::new(KeyCode::Right).with_modifiers(KeyModifiers {
                shift: true,
                ..KeyModifiers::none()
            }),
        ), &src);
        match g.handle_event(InputEvent::Key(keymap::key_ctrl('c')), &src) {
            GridAction::CopyRequested(csv) => {
                assert_eq!(csv, "id,name\nrow-1,item 1");
            }
            other => panic!("expected CopyRequested, got {other:?}"),
        }
    }

    #[test]
    fn enter_opens_an_editor_only_on_editable_columns() {
        let src = Items::new(3);
        let mut g = grid(3);
        let action = g.handle_event(key(KeyCode::Enter), &src);
        assert_eq!(action, GridAction::Activated(CellPosition::new(0, "id")));
        assert!(!g.is_editing());

        g.handle_event(key(KeyCode::End), &src);
        g.handle_event(key(KeyCode::Enter), &src);
        assert!(g.is_editing());
    }

    #[test]
    fn committing_an_edit_emits_one_update() {
        let src = Items::new(3);
        let mut g = grid(3);
        g.handle_event(key(KeyCode::End), &src);
        g.handle_event(key(KeyCode::Enter), &src);
        // snapshot "0"; retype to 12
        g.handle_event(key(KeyCode::Backspace), &src);
        g.handle_event(InputEvent::Key(keymap::key_char('1')), &src);
        g.handle_event(InputEvent::Key(keymap::key_char('2')), &src);
        match g.handle_event(key(KeyCode::Enter), &src) {
            GridAction::CellsUpdated(updates) => {
                assert_eq!(updates.len(), 1);
                assert_eq!(updates[0].row_id, "row-0");
                assert_eq!(updates[0].column_id, "qty");
                assert_eq!(updates[0].value, CellValue::Number(12.0));
            }
            other => panic!("expected CellsUpdated, got {other:?}"),
        }
        assert!(!g.is_editing());
    }

    #[test]
    fn invalid_numeric_draft_keeps_the_editor_open() {
        let src = Items::new(3);
        let mut g = grid(3);
        g.handle_event(key(KeyCode::End), &src);
        g.handle_event(key(KeyCode::Enter), &src);
        g.handle_event(InputEvent::Key(keymap::key_char('x')), &src);
        let action = g.handle_event(key(KeyCode::Enter), &src);
        assert_eq!(action, GridAction::None);
        assert!(g.is_editing());
    }

    #[test]
    fn replacing_the_row_set_resets_selection_and_reseeds_focus() {
        let src = Items::new(5);
        let mut g = grid(5);
        g.handle_event(key(KeyCode::Down), &src);
        g.handle_event(shift_key(KeyCode::Down), &src);
        assert!(!g.selection().is_empty());
        g.set_row_count(2);
        assert!(g.selection().is_empty());
        assert_eq!(g.focus(), Some(&CellPosition::new(0, "id")));
    }

    #[test]
    fn click_policy_applies_selection_by_modifier() {
        let src = Items::new(20);
        let mut g = grid(20);
        let theme = Theme::default();
        let mut buf = Buffer::empty(Rect::new(0, 0, 41, 11));
        g.render(Rect::new(0, 0, 41, 11), &mut buf, &theme, &src);

        // body starts below the header; x=5 lands in the "id" column
        let click = |x, y, modifiers| {
            InputEvent::Mouse(MouseEvent {
                x,
                y,
                kind: MouseEventKind::Down(MouseButton::Left),
                modifiers,
            })
        };
        g.handle_event(click(5, 3, KeyModifiers::none()), &src);
        assert_eq!(g.focus(), Some(&CellPosition::new(2, "id")));
        assert_eq!(g.selection().len(), 1);

        g.handle_event(
            click(
                5,
                5,
                KeyModifiers {
                    shift: true,
                    ..KeyModifiers::none()
                },
            ),
            &src,
        );
        assert_eq!(g.selection().len(), 3);

        g.handle_event(
            click(
                5,
                8,
                KeyModifiers {
                    ctrl: true,
                    ..KeyModifiers::none()
                },
            ),
            &src,
        );
        assert_eq!(g.selection().len(), 4);
        assert!(g.selection().is_selected(&CellPosition::new(7, "id")));
    }

    #[test]
    fn drag_extends_the_range_from_the_pressed_cell() {
        let src = Items::new(20);
        let mut g = grid(20);
        let theme = Theme::default();
        let mut buf = Buffer::empty(Rect::new(0, 0, 41, 11));
        g.render(Rect::new(0, 0, 41, 11), &mut buf, &theme, &src);

        g.handle_event(
            InputEvent::Mouse(MouseEvent {
                x: 5,
                y: 3,
                kind: MouseEventKind::Down(MouseButton::Left),
                modifiers: KeyModifiers::none(),
            }),
            &src,
        );
        g.handle_event(
            InputEvent::Mouse(MouseEvent {
                x: 15,
                y: 5,
                kind: MouseEventKind::Drag(MouseButton::Left),
                modifiers: KeyModifiers::none(),
            }),
            &src,
        );
        // rows 2..=4 x columns id..name
        assert_eq!(g.selection().len(), 6);
        assert_eq!(g.focus(), Some(&CellPosition::new(4, "name")));
    }

    #[test]
    fn paste_overlays_coerced_fields_from_the_focused_cell() {
        let src = Items::new(5);
        let mut g = grid(5);
        g.handle_event(key(KeyCode::End), &src);
        match g.handle_event(InputEvent::Paste("3\n4\nbad".to_string()), &src) {
            GridAction::CellsUpdated(updates) => {
                assert_eq!(updates.len(), 2);
                assert_eq!(updates[0].value, CellValue::Number(3.0));
                assert_eq!(updates[1].row_id, "row-1");
            }
            other => panic!("expected CellsUpdated, got {other:?}"),
        }
    }
}
