use std::collections::BTreeSet;

use crate::address::CellKey;
use crate::address::CellPosition;
use crate::column::NavigableColumns;

/// Anchor/focus pair of the last range-producing operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: CellPosition,
    pub end: CellPosition,
}

/// The selected-cell set plus the last anchor/focus pair.
///
/// Invariant: if `range` is `None` the set is empty. The converse does not hold —
/// a scattered ctrl-click set keeps a range covering only the last touched cell,
/// not the full set.
#[derive(Clone, Debug, Default)]
pub struct SelectionState {
    selected: BTreeSet<CellKey>,
    range: Option<SelectionRange>,
}

impl SelectionState {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CellKey> {
        self.selected.iter()
    }

    pub fn range(&self) -> Option<&SelectionRange> {
        self.range.as_ref()
    }

    /// Anchor for the next range operation: the last range's start.
    pub fn anchor(&self) -> Option<&CellPosition> {
        self.range.as_ref().map(|r| &r.start)
    }

    pub fn is_selected(&self, pos: &CellPosition) -> bool {
        self.selected.contains(&pos.key())
    }

    /// Clears all prior selection and selects exactly `pos`.
    pub fn select_single(&mut self, pos: &CellPosition) {
        self.selected.clear();
        self.selected.insert(pos.key());
        self.range = Some(SelectionRange {
            start: pos.clone(),
            end: pos.clone(),
        });
    }

    /// Replaces the selection with the rectangle spanned by `start` and `end`
    /// over the navigable columns. Silent no-op if either column id is not
    /// navigable (stale state after a column was hidden).
    pub fn select_range(
        &mut self,
        start: &CellPosition,
        end: &CellPosition,
        columns: &NavigableColumns,
    ) {
        let (Some(c0), Some(c1)) = (columns.index_of(&start.column), columns.index_of(&end.column))
        else {
            return;
        };
        let (c0, c1) = (c0.min(c1), c0.max(c1));
        let (r0, r1) = (start.row.min(end.row), start.row.max(end.row));

        self.selected.clear();
        for row in r0..=r1 {
            for col in c0..=c1 {
                if let Some(id) = columns.id_at(col) {
                    self.selected.insert(CellKey::of(row, id));
                }
            }
        }
        self.range = Some(SelectionRange {
            start: start.clone(),
            end: end.clone(),
        });
    }

    /// Flips membership of `pos`. The range always moves to `pos` regardless of
    /// prior state ("last touched" semantics).
    pub fn toggle_cell(&mut self, pos: &CellPosition) {
        let key = pos.key();
        if !self.selected.remove(&key) {
            self.selected.insert(key);
        }
        self.range = Some(SelectionRange {
            start: pos.clone(),
            end: pos.clone(),
        });
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.range = None;
    }
}
