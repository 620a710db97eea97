use std::collections::BTreeSet;

use thiserror::Error;

use crate::column::GridColumn;
use crate::selection::SelectionState;
use crate::source::RowSource;

/// Host clipboard boundary.
///
/// The core never links a clipboard implementation. Widgets emit
/// [`GridAction::CopyRequested`](crate::grid::view::GridAction) and the app routes
/// the payload — to a `ClipboardWriter` (the `gridkit` facade ships one backed by
/// `arboard`), a file, or anywhere else. A write failure is non-fatal by contract:
/// report it and move on, selection state is never rolled back.
pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard write failed: {0}")]
    WriteFailed(String),
}

/// Serializes the selected cells as CSV: a header row of column ids, then one row
/// per distinct selected row index (ascending), one field per distinct selected
/// column id (in table column order). Fields are quoted per RFC 4180 (commas,
/// quotes, newlines). The payload carries no trailing record terminator.
///
/// Returns `None` when the selection is empty or references only unknown columns.
pub fn selection_csv(
    selection: &SelectionState,
    columns: &[GridColumn],
    source: &dyn RowSource,
) -> Option<String> {
    let mut rows: BTreeSet<usize> = BTreeSet::new();
    let mut present: BTreeSet<String> = BTreeSet::new();
    for key in selection.keys() {
        if let Some(pos) = key.position() {
            rows.insert(pos.row);
            present.insert(pos.column);
        }
    }

    let ordered: Vec<&str> = columns
        .iter()
        .map(|c| c.id.as_str())
        .filter(|id| present.contains(*id))
        .collect();
    if rows.is_empty() || ordered.is_empty() {
        return None;
    }

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(&ordered).ok()?;
    for row in rows {
        let record: Vec<String> = ordered
            .iter()
            .map(|id| {
                source
                    .value(row, id)
                    .map(|v| v.display())
                    .unwrap_or_default()
            })
            .collect();
        writer.write_record(&record).ok()?;
    }

    let mut text = String::from_utf8(writer.into_inner().ok()?).ok()?;
    if text.ends_with('\n') {
        text.pop();
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::CellPosition;
    use crate::column::NavigableColumns;
    use crate::editor::CellValue;

    struct Rows(Vec<(&'static str, &'static str)>);

    impl RowSource for Rows {
        fn row_count(&self) -> usize {
            self.0.len()
        }

        fn row_id(&self, row: usize) -> Option<String> {
            self.0.get(row).map(|(id, _)| id.to_string())
        }

        fn value(&self, row: usize, column_id: &str) -> Option<CellValue> {
            let (id, name) = self.0.get(row)?;
            match column_id {
                "id" => Some(CellValue::Text(id.to_string())),
                "name" => Some(CellValue::Text(name.to_string())),
                _ => None,
            }
        }
    }

    fn columns() -> Vec<GridColumn> {
        vec![
            GridColumn::new("id", "ID", 6),
            GridColumn::new("name", "Name", 12),
        ]
    }

    #[test]
    fn serializes_the_selected_rectangle_exactly() {
        let cols = columns();
        let nav = NavigableColumns::from_columns(&cols);
        let mut sel = SelectionState::default();
        sel.select_range(
            &CellPosition::new(0, "id"),
            &CellPosition::new(1, "name"),
            &nav,
        );
        let source = Rows(vec![("A", "Widget"), ("B", "Gadget")]);
        assert_eq!(
            selection_csv(&sel, &cols, &source).as_deref(),
            Some("id,name\nA,Widget\nB,Gadget")
        );
    }

    #[test]
    fn empty_selection_yields_nothing() {
        let sel = SelectionState::default();
        let source = Rows(vec![("A", "Widget")]);
        assert_eq!(selection_csv(&sel, &columns(), &source), None);
    }

    #[test]
    fn fields_with_commas_and_quotes_are_quoted() {
        let cols = columns();
        let mut sel = SelectionState::default();
        sel.toggle_cell(&CellPosition::new(0, "name"));

        struct Tricky;
        impl RowSource for Tricky {
            fn row_count(&self) -> usize {
                1
            }
            fn row_id(&self, _row: usize) -> Option<String> {
                Some("r0".into())
            }
            fn value(&self, _row: usize, _column_id: &str) -> Option<CellValue> {
                Some(CellValue::Text("a \"b\", c".into()))
            }
        }

        assert_eq!(
            selection_csv(&sel, &cols, &Tricky).as_deref(),
            Some("name\n\"a \"\"b\"\", c\"")
        );
    }

    #[test]
    fn stale_columns_are_dropped_from_the_payload() {
        let cols = columns();
        let mut sel = SelectionState::default();
        sel.toggle_cell(&CellPosition::new(0, "hidden"));
        let source = Rows(vec![("A", "Widget")]);
        assert_eq!(selection_csv(&sel, &cols, &source), None);
    }
}
