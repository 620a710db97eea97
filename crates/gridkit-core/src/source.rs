use crate::editor::CellValue;

/// Read-only row data supplied by the owning app.
///
/// `row_id` is the stable identity carried in emitted
/// [`CellUpdate`](crate::editor::CellUpdate)s; `value` is read fresh on every use —
/// the grid never caches values across frames. Mutation flows the other way, via
/// [`GridAction::CellsUpdated`](crate::grid::view::GridAction).
pub trait RowSource {
    fn row_count(&self) -> usize;

    fn row_id(&self, row: usize) -> Option<String>;

    fn value(&self, row: usize, column_id: &str) -> Option<CellValue>;
}
