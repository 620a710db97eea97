use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEventKind;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use gridkit::column::GridColumn;
use gridkit::crossterm_input::input_event_from_crossterm;
use gridkit::editor::CellValue;
use gridkit::grid::view::GridAction;
use gridkit::grid::view::GridView;
use gridkit::source::RowSource;
use gridkit::theme::Theme;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use std::io;
use std::time::Duration;

struct Numbers {
    rows: usize,
}

impl RowSource for Numbers {
    fn row_count(&self) -> usize {
        self.rows
    }

    fn row_id(&self, row: usize) -> Option<String> {
        (row < self.rows).then(|| format!("r{row}"))
    }

    fn value(&self, row: usize, column_id: &str) -> Option<CellValue> {
        if row >= self.rows {
            return None;
        }
        Some(CellValue::Text(format!("{row}·{column_id}")))
    }
}

fn main() -> io::Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let theme = Theme::default();
    let source = Numbers { rows: 200_000 };

    let columns: Vec<GridColumn> = (0..200)
        .map(|i| GridColumn::new(format!("col_{i:03}"), format!("col_{i:03}"), 12))
        .collect();

    let mut grid = GridView::new();
    grid.set_columns(columns);
    grid.set_row_count(source.row_count());

    let res = run(&mut terminal, &theme, &mut grid, &source);

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
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
    source: &Numbers,
) -> io::Result<()> {
    let mut notice = String::new();

    loop {
        terminal.draw(|f| {
            let area = f.area();
            let block = Block::default()
                .title("GridView (arrows/hjkl, Shift+arrows, Space, Esc, Ctrl+C, q)")
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

            grid.render(grid_area, buf, theme, source);
            render_status(status_area, buf, theme, grid, &notice);
        })?;

        if crossterm::event::poll(Duration::from_millis(50))? {
            let ev = crossterm::event::read()?;
            if let Event::Key(key) = &ev {
                if key.kind == KeyEventKind::Press && matches!(key.code, KeyCode::Char('q')) {
                    return Ok(());
                }
            }
            if let Some(ev) = input_event_from_crossterm(ev) {
                match grid.handle_event(ev, source) {
                    GridAction::CopyRequested(csv) => {
                        // no clipboard feature here; editable_grid shows the real wiring
                        notice = format!("copy payload: {} bytes", csv.len());
                    }
                    GridAction::Notice(n) => notice = n,
                    GridAction::Activated(pos) => {
                        notice = format!("activated r{} {}", pos.row, pos.column);
                    }
                    _ => {}
                }
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
    let pct = grid.state.percent_y().unwrap_or(0);
    let s = format!(
        "focus={focus}  selected={}  scroll={pct}%  {notice}",
        grid.selection().len()
    );
    let span = Span::styled(s, theme.text_muted);
    buf.set_span(area.x, area.y, &span, area.width);
}
