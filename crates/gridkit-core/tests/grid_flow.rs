//! End-to-end flow over an in-memory row source: navigate, select, copy, edit,
//! and apply the emitted updates back to the store.

use gridkit_core::address::CellPosition;
use gridkit_core::column::GridColumn;
use gridkit_core::editor::CellUpdate;
use gridkit_core::editor::CellValue;
use gridkit_core::editor::EditorKind;
use gridkit_core::editor::NumberEditor;
use gridkit_core::grid::view::GridAction;
use gridkit_core::grid::view::GridView;
use gridkit_core::input::InputEvent;
use gridkit_core::input::KeyCode;
use gridkit_core::input::KeyEvent;
use gridkit_core::input::KeyModifiers;
use gridkit_core::keymap;
use gridkit_core::source::RowSource;

#[derive(Clone)]
struct Product {
    id: String,
    name: String,
    qty: Option<f64>,
    active: bool,
}

struct Store(Vec<Product>);

impl Store {
    fn demo() -> Self {
        Self(vec![
            Product {
                id: "A".into(),
                name: "Widget".into(),
                qty: Some(3.0),
                active: true,
            },
            Product {
                id: "B".into(),
                name: "Gadget".into(),
                qty: Some(5.0),
                active: false,
            },
            Product {
                id: "C".into(),
                name: "Gizmo".into(),
                qty: None,
                active: true,
            },
        ])
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
                ("active", CellValue::Bool(b)) => p.active = *b,
                _ => {}
            }
        }
    }
}

impl RowSource for Store {
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
            "active" => Some(CellValue::Bool(p.active)),
            _ => None,
        }
    }
}

fn grid() -> GridView {
    let mut g = GridView::new();
    g.set_columns(vec![
        GridColumn::new("id", "ID", 6),
        GridColumn::new("name", "Name", 14).with_editor(EditorKind::Text { multiline: false }),
        GridColumn::new("qty", "Qty", 6).with_editor(EditorKind::Number(NumberEditor {
            min: Some(0.0),
            allow_empty: true,
            ..NumberEditor::default()
        })),
        GridColumn::new("active", "Active", 8).with_editor(EditorKind::Bool),
        GridColumn::actions("", 8),
    ]);
    g.set_row_count(3);
    g.state.set_viewport(50, 8);
    g
}

fn press(g: &mut GridView, store: &Store, code: KeyCode) -> GridAction {
    g.handle_event(InputEvent::Key(KeyEvent::new(code)), store)
}

fn press_shift(g: &mut GridView, store: &Store, code: KeyCode) -> GridAction {
    g.handle_event(
        InputEvent::Key(KeyEvent::new(code).with_modifiers(KeyModifiers {
            shift: true,
            ..KeyModifiers::none()
        })),
        store,
    )
}

#[test]
fn select_copy_matches_the_documented_payload() {
    let store = Store::demo();
    let mut g = grid();

    // anchor at (0,id), extend to (1,name)
    press(&mut g, &store, KeyCode::Down);
    press(&mut g, &store, KeyCode::Up);
    press_shift(&mut g, &store, KeyCode::Down);
    press_shift(&mut g, &store, KeyCode::Right);

    match g.handle_event(InputEvent::Key(keymap::key_ctrl('c')), &store) {
        GridAction::CopyRequested(csv) => assert_eq!(csv, "id,name\nA,Widget\nB,Gadget"),
        other => panic!("expected CopyRequested, got {other:?}"),
    }
}

#[test]
fn edit_commit_round_trips_through_the_store() {
    let mut store = Store::demo();
    let mut g = grid();

    // focus (0,qty), edit 3 -> 12
    press(&mut g, &store, KeyCode::Right);
    press(&mut g, &store, KeyCode::Right);
    press(&mut g, &store, KeyCode::Enter);
    assert!(g.is_editing());
    press(&mut g, &store, KeyCode::Backspace);
    g.handle_event(InputEvent::Key(keymap::key_char('1')), &store);
    g.handle_event(InputEvent::Key(keymap::key_char('2')), &store);
    let action = press(&mut g, &store, KeyCode::Enter);
    let GridAction::CellsUpdated(updates) = action else {
        panic!("expected CellsUpdated, got {action:?}");
    };
    store.apply(&updates);
    assert_eq!(store.0[0].qty, Some(12.0));
}

#[test]
fn empty_numeric_commit_clears_the_value_when_allowed() {
    let mut store = Store::demo();
    let mut g = grid();

    press(&mut g, &store, KeyCode::Right);
    press(&mut g, &store, KeyCode::Right);
    press(&mut g, &store, KeyCode::Enter);
    press(&mut g, &store, KeyCode::Backspace);
    let action = press(&mut g, &store, KeyCode::Enter);
    let GridAction::CellsUpdated(updates) = action else {
        panic!("expected CellsUpdated, got {action:?}");
    };
    assert_eq!(updates[0].value, CellValue::Null);
    store.apply(&updates);
    assert_eq!(store.0[0].qty, None);
}

#[test]
fn bool_edit_toggles_and_commits() {
    let mut store = Store::demo();
    let mut g = grid();

    press(&mut g, &store, KeyCode::End);
    assert_eq!(g.focus(), Some(&CellPosition::new(0, "active")));
    press(&mut g, &store, KeyCode::Enter);
    g.handle_event(InputEvent::Key(keymap::key_char(' ')), &store);
    let action = press(&mut g, &store, KeyCode::Enter);
    let GridAction::CellsUpdated(updates) = action else {
        panic!("expected CellsUpdated, got {action:?}");
    };
    assert_eq!(updates[0].value, CellValue::Bool(false));
    store.apply(&updates);
    assert!(!store.0[0].active);
}

#[test]
fn escape_cancels_an_edit_without_updates() {
    let store = Store::demo();
    let mut g = grid();

    press(&mut g, &store, KeyCode::Right);
    press(&mut g, &store, KeyCode::Enter);
    assert!(g.is_editing());
    g.handle_event(InputEvent::Key(keymap::key_char('!')), &store);
    let action = press(&mut g, &store, KeyCode::Esc);
    assert_eq!(action, GridAction::Redraw);
    assert!(!g.is_editing());
    // the store was never touched, so the cell still reads its old value
    assert_eq!(
        store.value(0, "name"),
        Some(CellValue::Text("Widget".into()))
    );
}

#[test]
fn paste_updates_a_block_of_editable_cells() {
    let mut store = Store::demo();
    let mut g = grid();

    press(&mut g, &store, KeyCode::Right);
    let action = g.handle_event(InputEvent::Paste("Sprocket\t9\nDoohickey\t1".into()), &store);
    let GridAction::CellsUpdated(updates) = action else {
        panic!("expected CellsUpdated, got {action:?}");
    };
    store.apply(&updates);
    assert_eq!(store.0[0].name, "Sprocket");
    assert_eq!(store.0[0].qty, Some(9.0));
    assert_eq!(store.0[1].name, "Doohickey");
    assert_eq!(store.0[1].qty, Some(1.0));
}
