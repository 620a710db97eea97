use std::fmt;

/// A cell address in display coordinates.
///
/// `row` indexes the currently rendered row ordering (post-sort, post-filter) and
/// is not a stable row identity. `column` is the logical column id, independent of
/// display order and of which columns are currently visible.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellPosition {
    pub row: usize,
    pub column: String,
}

impl CellPosition {
    pub fn new(row: usize, column: impl Into<String>) -> Self {
        Self {
            row,
            column: column.into(),
        }
    }

    pub fn key(&self) -> CellKey {
        CellKey::of(self.row, &self.column)
    }
}

/// Set-element key for one cell: `"{row}:{column}"`.
///
/// Two positions produce the same key iff row and column id are both equal. The
/// row part never contains `:`, so parsing splits on the first separator and
/// column ids may contain anything.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey(String);

impl CellKey {
    pub fn of(row: usize, column: &str) -> Self {
        Self(format!("{row}:{column}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn position(&self) -> Option<CellPosition> {
        let (row, column) = self.0.split_once(':')?;
        Some(CellPosition {
            row: row.parse().ok()?,
            column: column.to_string(),
        })
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
