use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::KeyModifiers;

pub fn key_event_matches(pattern: &KeyEvent, event: &KeyEvent) -> bool {
    pattern.code == event.code && pattern.modifiers == event.modifiers
}

/// Returns `true` if `event` matches any pattern in `patterns`.
pub fn any_match(patterns: &[KeyEvent], event: &KeyEvent) -> bool {
    patterns.iter().any(|p| key_event_matches(p, event))
}

pub fn key_char(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c))
}

pub fn key_ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c)).with_modifiers(KeyModifiers {
        ctrl: true,
        ..KeyModifiers::none()
    })
}

pub fn key_cmd(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c)).with_modifiers(KeyModifiers {
        cmd: true,
        ..KeyModifiers::none()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_requires_exact_modifiers() {
        assert!(key_event_matches(&key_char('c'), &key_char('c')));
        assert!(!key_event_matches(&key_char('c'), &key_ctrl('c')));
        assert!(!key_event_matches(&key_ctrl('c'), &key_cmd('c')));
    }

    #[test]
    fn any_match_scans_all_patterns() {
        let copy = [key_ctrl('c'), key_cmd('c')];
        assert!(any_match(&copy, &key_cmd('c')));
        assert!(!any_match(&copy, &key_char('c')));
    }
}
