use crate::editor::EditorKind;

/// Distinguishes data columns from structural ones. Only `Data` columns are
/// keyboard-navigation and selection targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColumnKind {
    #[default]
    Data,
    /// Leading row-selection checkbox column.
    Selection,
    /// Trailing actions column.
    Actions,
}

/// Column configuration for [`GridView`](crate::grid::view::GridView).
#[derive(Clone, Debug)]
pub struct GridColumn {
    pub id: String,
    pub title: String,
    pub width: u16,
    pub kind: ColumnKind,
    pub editor: Option<EditorKind>,
}

impl GridColumn {
    pub fn new(id: impl Into<String>, title: impl Into<String>, width: u16) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            width,
            kind: ColumnKind::Data,
            editor: None,
        }
    }

    pub fn selection(width: u16) -> Self {
        Self {
            kind: ColumnKind::Selection,
            ..Self::new("__select", "", width)
        }
    }

    pub fn actions(title: impl Into<String>, width: u16) -> Self {
        Self {
            kind: ColumnKind::Actions,
            ..Self::new("__actions", title, width)
        }
    }

    pub fn with_editor(mut self, editor: EditorKind) -> Self {
        self.editor = Some(editor);
        self
    }

    pub fn is_navigable(&self) -> bool {
        self.kind == ColumnKind::Data
    }
}

/// Ordered column ids eligible as navigation and selection targets.
#[derive(Clone, Debug, Default)]
pub struct NavigableColumns {
    ids: Vec<String>,
}

impl NavigableColumns {
    pub fn from_columns(columns: &[GridColumn]) -> Self {
        Self {
            ids: columns
                .iter()
                .filter(|c| c.is_navigable())
                .map(|c| c.id.clone())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|c| c == id)
    }

    pub fn id_at(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.id_at(0)
    }

    pub fn last(&self) -> Option<&str> {
        self.ids.last().map(String::as_str)
    }

    /// One step left/right of `from`, clamped at the ends (no wraparound).
    /// `None` if `from` is not navigable.
    pub fn step(&self, from: &str, delta: i32) -> Option<&str> {
        let idx = self.index_of(from)? as i64;
        let next = (idx + delta as i64).clamp(0, self.ids.len().saturating_sub(1) as i64);
        self.id_at(next as usize)
    }
}
