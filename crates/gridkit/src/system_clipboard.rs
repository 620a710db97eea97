use gridkit_core::clipboard::ClipboardError;
use gridkit_core::clipboard::ClipboardWriter;

/// System clipboard backed by `arboard`.
///
/// Construction fails on headless hosts (no display server); treat that the same
/// way as a failed write: report a notice and keep going.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        arboard::Clipboard::new()
            .map(|inner| Self { inner })
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
    }
}
