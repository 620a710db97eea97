use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use unicode_width::UnicodeWidthChar;

use crate::viewport::ViewportState;

/// Slice `input` to the display-column window `[start_col, start_col + max_cols)`.
///
/// Tabs expand to 4 spaces, zero-width chars are dropped, and a wide char that
/// straddles either edge of the window is omitted rather than half-drawn.
pub fn slice_by_cols(input: &str, start_col: u32, max_cols: u16) -> String {
    if max_cols == 0 {
        return String::new();
    }

    let start_col = start_col as usize;
    let end_col = start_col + max_cols as usize;
    let mut col = 0usize;
    let mut out = String::new();

    let mut push = |out: &mut String, col: &mut usize, ch: char, w: usize| {
        if *col >= start_col && *col + w <= end_col {
            out.push(ch);
        }
        *col += w;
    };

    for ch in input.chars() {
        if col >= end_col {
            break;
        }
        if ch == '\t' {
            for _ in 0..4 {
                push(&mut out, &mut col, ' ', 1);
            }
            continue;
        }
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if w == 0 {
            continue;
        }
        push(&mut out, &mut col, ch, w);
    }

    out
}

pub fn render_scrollbar(area: Rect, buf: &mut Buffer, state: &ViewportState, style: Style) {
    buf.set_style(area, style);
    if area.height == 0 {
        return;
    }

    let thumb = thumb_range(area.height, state);
    for dy in 0..area.height {
        let ch = match &thumb {
            Some(range) if range.contains(&dy) => "█",
            _ => " ",
        };
        buf.set_stringn(area.x, area.y + dy, ch, 1, style);
    }
}

/// Thumb rows within a track of `track_h` cells. `None` when the content fits
/// and no thumb should be drawn.
fn thumb_range(track_h: u16, state: &ViewportState) -> Option<std::ops::Range<u16>> {
    if state.content_h == 0 || state.content_h <= state.viewport_h as u32 {
        return None;
    }
    let track = track_h as f64;
    let thumb_h = ((state.viewport_h as f64 / state.content_h as f64) * track)
        .round()
        .clamp(1.0, track) as u16;
    let max_y = state
        .content_h
        .saturating_sub(state.viewport_h as u32)
        .max(1) as f64;
    let free = (track - thumb_h as f64).max(0.0);
    let top = ((state.y as f64 / max_y) * free).round().clamp(0.0, free) as u16;
    Some(top..top + thumb_h)
}
