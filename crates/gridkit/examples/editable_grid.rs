use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEventKind;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use gridkit::clipboard::ClipboardWriter;
use gridkit::column::GridColumn;
use gridkit::crossterm_input::input_event_from_crossterm;
use gridkit::editor::CellUpdate;
use gridkit::editor::CellValue;
use gridkit::editor::EditorKind;
use gridkit::editor::NumberEditor;
use gridkit::grid::view::GridAction;
use gridkit::grid::view::GridView;
use gridkit::source::RowSource;
use gridkit::system_clipboard::SystemClipboard;
use gridkit::theme::Theme;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use std::io;
use std::time::Duration;

struct Product {
    id: String,
    name: String,
    qty: Option<f64>,
    status: String,
    active: bool,
}

struct Inventory(Vec<Product>);

impl Inventory {
    fn demo() -> Self {
        let statuses = ["in stock", "backorder", "discontinued"];
        Self(
            (0..500)
                .map(|i| Product {
                    id: format!("SKU-{i:04}"),
                    name: format!("Item {i}"),
                    qty: (i % 7 != 0).then(|| (i % 40) as f64),
                    status: statuses[i % statuses.len()].to_string(),
                    active: i % 3 != 0,
                })
                .collect(),
        )
    }

    fn apply(&mut self, updates: &[CellUpdate]) {
        for u in updates {
            let Some(p) = self.0.iter_mut().find(|p| p.id == u.row_id) else {
                continue;
            };
            match (u.column_id.as_str(), &u.value) {
                ("name", CellValue::Text(s)) => p.name = s.clone(),
                ("qty", CellValue::Number(n)) => p.qty = Some(*n),
                ("qty", CellValue::Null) => p.qty = None,
                ("status", CellValue::Text(s)) => p.status = s.clone(),
                ("active", CellValue::Bool(b)) => p.active = *b,
                _ => {}
            }
        }
    }
}

impl RowSource for Inventory {
    fn row_count(&self) -> usize {
        self.0.len()
    }

    fn row_id(&self, row: usize) -> Option<String> {
        self.0.get(row).map(|p| p.id.clone())
    }

    fn value(&self, row: usize, column_id: &str) -> Option<CellValue> {
        let p = self.0.get(row)?;
        match column_id {
            "id" => Some(CellValue::Text(p.id.clone())),
            "name" => Some(CellValue::Text(p.name.clone())),
            "qty" => Some(p.qty.map(CellValue::Number).unwrap_or(CellValue::Null)),
            "status" => Some(CellValue::Text(p.status.clone())),
            "active" => Some(CellValue::Bool(p.active)),
            _ => None,
        }
    }
}

fn columns() -> Vec<GridColumn> {
    vec![
        GridColumn::new("id", "ID", 10),
        GridColumn::new("name", "Name", 18).with_editor(EditorKind::Text { multiline: false }),
        GridColumn::new("qty", "Qty", 8).with_editor(EditorKind::Number(NumberEditor {
            min: Some(0.0),
            allow_empty: true,
            ..NumberEditor::default()
        })),
        GridColumn::new("status", "Status", 14).with_editor(EditorKind::Select {
            options: vec![
                "in stock".to_string(),
                "backorder".to_string(),
                "discontinued".to_string(),
            ],
        }),
        GridColumn::new("active", "Active", 8).with_editor(EditorKind::Bool),
    ]
}

fn main() -> io::Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        crossterm::event::EnableMouseCapture,
        crossterm::event::EnableBracketedPaste
    )?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let theme = Theme::default();
    let mut inventory = Inventory::demo();

    let mut grid = GridView::new();
    grid.set_columns(columns());
    grid.set_row_count(inventory.row_count());

    let res = run(&mut terminal, &theme, &mut grid, &mut inventory);

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::event::DisableBracketedPaste,
        crossterm::event::DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    res
}

fn run<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    theme: &Theme,
    grid: &mut GridView,
    inventory: &mut Inventory,
) -> io::Result<()> {
    // clipboard construction fails on headless hosts; degrade to notices
    let mut clipboard = SystemClipboard::new().ok();
    let mut notice = String::new();

    loop {
        terminal.draw(|f| {
            let area = f.area();
            let block = Block::default()
                .title("editable grid (Enter edit, Esc cancel, Ctrl+C copy, paste CSV/TSV, q quit)")
                .borders(Borders::ALL);
            let inner = block.inner(area);
            f.render_widget(block, area);

            let buf = f.buffer_mut();
            let grid_area = Rect::new(
                inner.x,
                inner.y,
                inner.width,
                inner.height.saturating_sub(1),
            );
            let status_area = Rect::new(inner.x, inner.y + grid_area.height, inner.width, 1);

            grid.render(grid_area, buf, theme, inventory);
            render_status(status_area, buf, theme, grid, &notice);
        })?;

        if crossterm::event::poll(Duration::from_millis(50))? {
            let ev = crossterm::event::read()?;
            if let Event::Key(key) = &ev {
                let quit = key.kind == KeyEventKind::Press
                    && matches!(key.code, KeyCode::Char('q'))
                    && !grid.is_editing();
                if quit {
                    return Ok(());
                }
            }
            let Some(ev) = input_event_from_crossterm(ev) else {
                continue;
            };
            match grid.handle_event(ev, inventory) {
                GridAction::CopyRequested(csv) => {
                    notice = match clipboard.as_mut() {
                        Some(cb) => match cb.write_text(&csv) {
                            Ok(()) => format!("copied {} cell(s)", grid.selection().len()),
                            Err(e) => e.to_string(),
                        },
                        None => "clipboard unavailable".to_string(),
                    };
                }
                GridAction::CellsUpdated(updates) => {
                    inventory.apply(&updates);
                    notice = format!("updated {} cell(s)", updates.len());
                }
                GridAction::Notice(n) => notice = n,
                GridAction::Activated(pos) => {
                    notice = format!("activated r{} {}", pos.row, pos.column);
                }
                GridAction::Redraw | GridAction::SelectionChanged | GridAction::None => {}
            }
        }
    }
}

fn render_status(
    area: Rect,
    buf: &mut ratatui::buffer::Buffer,
    theme: &Theme,
    grid: &GridView,
    notice: &str,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let focus = grid
        .focus()
        .map(|f| format!("r{} {}", f.row, f.column))
        .unwrap_or("-".to_string());
    let mode = if grid.is_editing() { "EDIT" } else { "NAV" };
    let s = format!(
        "[{mode}] focus={focus}  selected={}  {notice}",
        grid.selection().len()
    );
    let span = Span::styled(s, theme.text_muted);
    buf.set_span(area.x, area.y, &span, area.width);
}
