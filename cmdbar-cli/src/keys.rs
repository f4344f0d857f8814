//! Keyboard mapping for the interactive console.
//!
//! Translates crossterm key events into console events. Editing is
//! end-of-line only: printable characters are appended and Backspace drops
//! the last character, so every edit becomes a full `TextEdited` value.

use cmdbar_core::ConsoleEvent;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What the REPL should do with a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Feed an event to the session, followed by a key release.
    Console(ConsoleEvent),
    /// Leave the console.
    Quit,
    /// Key has no binding.
    Ignore,
}

/// Keys handled regardless of the current input.
pub fn map_global_key(event: &KeyEvent) -> Option<KeyAction> {
    match (event.modifiers, event.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(KeyAction::Quit),
        (KeyModifiers::CONTROL, KeyCode::Char('d')) => Some(KeyAction::Quit),
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
            Some(KeyAction::Console(ConsoleEvent::TextEdited(String::new())))
        }
        _ => None,
    }
}

/// Map a key press against the text currently in the input field.
pub fn map_key(event: &KeyEvent, input: &str) -> KeyAction {
    if let Some(action) = map_global_key(event) {
        return action;
    }
    match event.code {
        KeyCode::Enter => KeyAction::Console(ConsoleEvent::Submit),
        KeyCode::Up => KeyAction::Console(ConsoleEvent::RecallUp),
        KeyCode::Down => KeyAction::Console(ConsoleEvent::RecallDown),
        KeyCode::Tab => KeyAction::Console(ConsoleEvent::CycleCompletion),
        KeyCode::Esc => KeyAction::Console(ConsoleEvent::TextEdited(String::new())),
        KeyCode::Backspace => {
            let mut edited = input.to_string();
            if edited.pop().is_none() {
                return KeyAction::Ignore;
            }
            KeyAction::Console(ConsoleEvent::TextEdited(edited))
        }
        KeyCode::Char(ch)
            if !event
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            KeyAction::Console(ConsoleEvent::TextEdited(format!("{input}{ch}")))
        }
        _ => KeyAction::Ignore,
    }
}

/// Append pasted text to the input, flattening line breaks into spaces.
pub fn paste(input: &str, pasted: &str) -> ConsoleEvent {
    let flattened: String = pasted
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    ConsoleEvent::TextEdited(format!("{input}{flattened}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    #[test]
    fn test_ctrl_c_and_ctrl_d_quit() {
        assert_eq!(map_key(&ctrl(KeyCode::Char('c')), "set"), KeyAction::Quit);
        assert_eq!(map_key(&ctrl(KeyCode::Char('d')), ""), KeyAction::Quit);
    }

    #[test]
    fn test_regular_key_not_global() {
        assert_eq!(map_global_key(&key(KeyCode::Char('a'))), None);
    }

    #[test]
    fn test_char_appends_to_input() {
        assert_eq!(
            map_key(&key(KeyCode::Char('t')), "se"),
            KeyAction::Console(ConsoleEvent::TextEdited("set".into()))
        );
    }

    #[test]
    fn test_shifted_char_is_text() {
        let event = KeyEvent::new(KeyCode::Char('X'), KeyModifiers::SHIFT);
        assert_eq!(
            map_key(&event, "set "),
            KeyAction::Console(ConsoleEvent::TextEdited("set X".into()))
        );
    }

    #[test]
    fn test_backspace_drops_last_char() {
        assert_eq!(
            map_key(&key(KeyCode::Backspace), "sét"),
            KeyAction::Console(ConsoleEvent::TextEdited("sé".into()))
        );
        assert_eq!(map_key(&key(KeyCode::Backspace), ""), KeyAction::Ignore);
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(
            map_key(&key(KeyCode::Enter), "help"),
            KeyAction::Console(ConsoleEvent::Submit)
        );
        assert_eq!(
            map_key(&key(KeyCode::Up), ""),
            KeyAction::Console(ConsoleEvent::RecallUp)
        );
        assert_eq!(
            map_key(&key(KeyCode::Down), ""),
            KeyAction::Console(ConsoleEvent::RecallDown)
        );
        assert_eq!(
            map_key(&key(KeyCode::Tab), "s"),
            KeyAction::Console(ConsoleEvent::CycleCompletion)
        );
    }

    #[test]
    fn test_escape_and_ctrl_u_clear() {
        let cleared = KeyAction::Console(ConsoleEvent::TextEdited(String::new()));
        assert_eq!(map_key(&key(KeyCode::Esc), "set x"), cleared);
        assert_eq!(map_key(&ctrl(KeyCode::Char('u')), "set x"), cleared);
    }

    #[test]
    fn test_unbound_keys_are_ignored() {
        assert_eq!(map_key(&key(KeyCode::F(5)), "x"), KeyAction::Ignore);
        assert_eq!(map_key(&ctrl(KeyCode::Char('z')), "x"), KeyAction::Ignore);
    }

    #[test]
    fn test_paste_flattens_newlines() {
        assert_eq!(
            paste("set ", "a\nb"),
            ConsoleEvent::TextEdited("set a b".into())
        );
    }
}
