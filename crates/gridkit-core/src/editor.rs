use crate::input::KeyCode;
use crate::input::KeyEvent;

/// Value of one cell as seen by editors and the copy serializer.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Raw display form: what the copy payload carries and what an editor
    /// snapshot starts from. `Null` is the empty string.
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => (if *b { "true" } else { "false" }).to_string(),
            CellValue::Null => String::new(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NumberEditor {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: f64,
    /// Whether an empty draft commits as `Null` (otherwise it commits as `0`).
    pub allow_empty: bool,
}

impl Default for NumberEditor {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            step: 1.0,
            allow_empty: false,
        }
    }
}

/// Per-column editor descriptor. Columns without one are read-only.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorKind {
    Text { multiline: bool },
    Number(NumberEditor),
    Select { options: Vec<String> },
    Bool,
}

impl EditorKind {
    /// Coerce free-form input into this editor's value type. `None` means the
    /// input is rejected. This is the commit path for drafts and pasted fields.
    pub fn coerce(&self, input: &str) -> Option<CellValue> {
        match self {
            EditorKind::Text { .. } => Some(CellValue::Text(input.to_string())),
            EditorKind::Number(ed) => coerce_number(ed, input),
            EditorKind::Select { options } => {
                let t = input.trim();
                options
                    .iter()
                    .find(|o| o.as_str() == t)
                    .map(|o| CellValue::Text(o.clone()))
            }
            EditorKind::Bool => match input.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(CellValue::Bool(true)),
                "false" | "no" | "0" => Some(CellValue::Bool(false)),
                _ => None,
            },
        }
    }
}

fn coerce_number(ed: &NumberEditor, input: &str) -> Option<CellValue> {
    let t = input.trim();
    if t.is_empty() {
        return Some(if ed.allow_empty {
            CellValue::Null
        } else {
            CellValue::Number(0.0)
        });
    }
    let mut n: f64 = t.parse().ok()?;
    if let Some(min) = ed.min {
        n = n.max(min);
    }
    if let Some(max) = ed.max {
        n = n.min(max);
    }
    Some(CellValue::Number(n))
}

/// A committed edit, addressed by stable row identity.
#[derive(Clone, Debug, PartialEq)]
pub struct CellUpdate {
    pub row_id: String,
    pub column_id: String,
    pub value: CellValue,
}

#[derive(Clone, Debug)]
enum Draft {
    Line {
        buf: String,
        /// Byte offset into `buf`, always on a char boundary.
        cursor: usize,
    },
    Choice {
        index: usize,
    },
    Toggle {
        on: bool,
    },
}

/// One in-flight edit session. At most one exists per grid; opening a new one
/// implicitly discards an uncommitted predecessor.
#[derive(Clone, Debug)]
pub struct EditSession {
    row_id: String,
    column_id: String,
    editor: EditorKind,
    draft: Draft,
}

impl EditSession {
    /// Snapshot `current` into the editor's draft shape: numbers as their string
    /// form, unset values as empty string / first option / `false`.
    pub fn open(
        row_id: impl Into<String>,
        column_id: impl Into<String>,
        editor: EditorKind,
        current: CellValue,
    ) -> Self {
        let draft = match &editor {
            EditorKind::Text { .. } | EditorKind::Number(_) => {
                let buf = current.display();
                let cursor = buf.len();
                Draft::Line { buf, cursor }
            }
            EditorKind::Select { options } => Draft::Choice {
                index: options
                    .iter()
                    .position(|o| *o == current.display())
                    .unwrap_or(0),
            },
            EditorKind::Bool => Draft::Toggle {
                on: current == CellValue::Bool(true),
            },
        };
        Self {
            row_id: row_id.into(),
            column_id: column_id.into(),
            editor,
            draft,
        }
    }

    pub fn row_id(&self) -> &str {
        &self.row_id
    }

    pub fn column_id(&self) -> &str {
        &self.column_id
    }

    pub fn editor(&self) -> &EditorKind {
        &self.editor
    }

    /// Draft text for rendering.
    pub fn draft_text(&self) -> String {
        match &self.draft {
            Draft::Line { buf, .. } => buf.clone(),
            Draft::Choice { index } => match &self.editor {
                EditorKind::Select { options } => {
                    options.get(*index).cloned().unwrap_or_default()
                }
                _ => String::new(),
            },
            Draft::Toggle { on } => (if *on { "[x]" } else { "[ ]" }).to_string(),
        }
    }

    /// Char offset of the caret within the draft text, for line drafts only.
    pub fn cursor_chars(&self) -> Option<usize> {
        match &self.draft {
            Draft::Line { buf, cursor } => Some(buf[..*cursor].chars().count()),
            _ => None,
        }
    }

    /// Apply one key to the draft. Returns `true` if the draft changed (or the
    /// key was consumed), `false` if the key is not an editing key.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match &mut self.draft {
            Draft::Line { buf, cursor } => match (&key.code, &self.editor) {
                (KeyCode::Char(c), _)
                    if !key.modifiers.ctrl && !key.modifiers.alt && !key.modifiers.cmd =>
                {
                    buf.insert(*cursor, *c);
                    *cursor += c.len_utf8();
                    true
                }
                (KeyCode::Enter, EditorKind::Text { multiline: true })
                    if key.modifiers.alt =>
                {
                    buf.insert(*cursor, '\n');
                    *cursor += 1;
                    true
                }
                (KeyCode::Backspace, _) => {
                    if let Some((idx, _)) = buf[..*cursor].char_indices().next_back() {
                        buf.remove(idx);
                        *cursor = idx;
                        true
                    } else {
                        false
                    }
                }
                (KeyCode::Delete, _) => {
                    if *cursor < buf.len() {
                        buf.remove(*cursor);
                        true
                    } else {
                        false
                    }
                }
                (KeyCode::Left, _) => {
                    if let Some((idx, _)) = buf[..*cursor].char_indices().next_back() {
                        *cursor = idx;
                    }
                    true
                }
                (KeyCode::Right, _) => {
                    if let Some(c) = buf[*cursor..].chars().next() {
                        *cursor += c.len_utf8();
                    }
                    true
                }
                (KeyCode::Home, _) => {
                    *cursor = 0;
                    true
                }
                (KeyCode::End, _) => {
                    *cursor = buf.len();
                    true
                }
                (KeyCode::Up, EditorKind::Number(ed)) => {
                    step_number(buf, cursor, ed, 1.0);
                    true
                }
                (KeyCode::Down, EditorKind::Number(ed)) => {
                    step_number(buf, cursor, ed, -1.0);
                    true
                }
                _ => false,
            },
            Draft::Choice { index } => {
                let len = match &self.editor {
                    EditorKind::Select { options } => options.len(),
                    _ => 0,
                };
                if len == 0 {
                    return false;
                }
                match key.code {
                    KeyCode::Up | KeyCode::Left => {
                        *index = (*index + len - 1) % len;
                        true
                    }
                    KeyCode::Down | KeyCode::Right | KeyCode::Char(' ') => {
                        *index = (*index + 1) % len;
                        true
                    }
                    _ => false,
                }
            }
            Draft::Toggle { on } => match key.code {
                KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right | KeyCode::Up
                | KeyCode::Down => {
                    *on = !*on;
                    true
                }
                _ => false,
            },
        }
    }

    /// Insert pasted text into a line draft. Newlines survive only in multiline
    /// text editors; otherwise they collapse to spaces. Returns `false` for
    /// choice/toggle drafts, which have no text to paste into.
    pub fn paste(&mut self, text: &str) -> bool {
        let Draft::Line { buf, cursor } = &mut self.draft else {
            return false;
        };
        let keep_newlines = matches!(self.editor, EditorKind::Text { multiline: true });
        for ch in text.chars() {
            let ch = match ch {
                '\r' => continue,
                '\n' if !keep_newlines => ' ',
                _ => ch,
            };
            buf.insert(*cursor, ch);
            *cursor += ch.len_utf8();
        }
        true
    }

    /// Coerce the draft back to the target type. `None` keeps the editor open
    /// (the only rejection path is unparseable numeric text).
    pub fn commit(&self) -> Option<CellValue> {
        match &self.draft {
            Draft::Line { buf, .. } => self.editor.coerce(buf),
            Draft::Choice { index } => match &self.editor {
                EditorKind::Select { options } => {
                    options.get(*index).cloned().map(CellValue::Text)
                }
                _ => None,
            },
            Draft::Toggle { on } => Some(CellValue::Bool(*on)),
        }
    }
}

fn step_number(buf: &mut String, cursor: &mut usize, ed: &NumberEditor, direction: f64) {
    let current: f64 = buf.trim().parse().unwrap_or(0.0);
    let mut next = current + ed.step * direction;
    if let Some(min) = ed.min {
        next = next.max(min);
    }
    if let Some(max) = ed.max {
        next = next.min(max);
    }
    *buf = format_number(next);
    *cursor = buf.len();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::key_char;

    fn number(min: Option<f64>, allow_empty: bool) -> EditorKind {
        EditorKind::Number(NumberEditor {
            min,
            allow_empty,
            ..NumberEditor::default()
        })
    }

    #[test]
    fn numeric_commit_parses_valid_draft() {
        let mut s = EditSession::open("r1", "qty", number(Some(0.0), false), CellValue::Null);
        for c in "12".chars() {
            s.handle_key(&key_char(c));
        }
        assert_eq!(s.commit(), Some(CellValue::Number(12.0)));
    }

    #[test]
    fn numeric_commit_rejects_garbage_and_stays_open() {
        let mut s = EditSession::open("r1", "qty", number(None, false), CellValue::Number(7.0));
        for c in "abc".chars() {
            s.handle_key(&key_char(c));
        }
        assert_eq!(s.commit(), None);
    }

    #[test]
    fn empty_numeric_draft_resolves_by_allow_empty() {
        let strict = EditSession::open("r", "qty", number(None, false), CellValue::Null);
        assert_eq!(strict.commit(), Some(CellValue::Number(0.0)));

        let lax = EditSession::open("r", "qty", number(None, true), CellValue::Null);
        assert_eq!(lax.commit(), Some(CellValue::Null));
    }

    #[test]
    fn numeric_snapshot_renders_as_string() {
        let s = EditSession::open("r", "qty", number(None, false), CellValue::Number(42.0));
        assert_eq!(s.draft_text(), "42");
        assert_eq!(s.cursor_chars(), Some(2));
    }

    #[test]
    fn bool_editor_toggles_on_space() {
        let mut s = EditSession::open("r", "active", EditorKind::Bool, CellValue::Bool(false));
        assert_eq!(s.draft_text(), "[ ]");
        s.handle_key(&key_char(' '));
        assert_eq!(s.commit(), Some(CellValue::Bool(true)));
    }

    #[test]
    fn select_editor_cycles_options() {
        let editor = EditorKind::Select {
            options: vec!["open".into(), "closed".into()],
        };
        let mut s = EditSession::open("r", "status", editor, CellValue::Text("open".into()));
        s.handle_key(&KeyEvent::new(KeyCode::Down));
        assert_eq!(s.commit(), Some(CellValue::Text("closed".into())));
        s.handle_key(&KeyEvent::new(KeyCode::Down));
        assert_eq!(s.commit(), Some(CellValue::Text("open".into())));
    }

    #[test]
    fn line_editing_moves_and_deletes_by_chars() {
        let editor = EditorKind::Text { multiline: false };
        let mut s = EditSession::open("r", "name", editor, CellValue::Text("ab".into()));
        s.handle_key(&KeyEvent::new(KeyCode::Left));
        s.handle_key(&key_char('x'));
        assert_eq!(s.draft_text(), "axb");
        s.handle_key(&KeyEvent::new(KeyCode::Backspace));
        assert_eq!(s.draft_text(), "ab");
    }

    #[test]
    fn coerce_clamps_numbers_into_range() {
        let ed = EditorKind::Number(NumberEditor {
            min: Some(0.0),
            max: Some(10.0),
            ..NumberEditor::default()
        });
        assert_eq!(ed.coerce("-5"), Some(CellValue::Number(0.0)));
        assert_eq!(ed.coerce("99"), Some(CellValue::Number(10.0)));
    }

    #[test]
    fn coerce_select_requires_known_option() {
        let ed = EditorKind::Select {
            options: vec!["a".into()],
        };
        assert_eq!(ed.coerce(" a "), Some(CellValue::Text("a".into())));
        assert_eq!(ed.coerce("b"), None);
    }
}
