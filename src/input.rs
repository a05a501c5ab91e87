//! Key bindings: normal and vim-style.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    /// Click the cell under the cursor.
    Select,
    Hint,
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Supports both normal (arrows, space) and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::Restart,
        KeyCode::Char('?') | KeyCode::Char('t') => Action::Hint,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_arrows_and_vim_keys_agree() {
        let none = KeyModifiers::NONE;
        assert_eq!(key_to_action(key(KeyCode::Left, none)), Action::Left);
        assert_eq!(key_to_action(key(KeyCode::Char('h'), none)), Action::Left);
        assert_eq!(key_to_action(key(KeyCode::Char('j'), none)), Action::Down);
        assert_eq!(key_to_action(key(KeyCode::Char(' '), none)), Action::Select);
    }

    #[test]
    fn test_modified_keys_are_ignored_except_ctrl_c() {
        assert_eq!(
            key_to_action(key(KeyCode::Char('h'), KeyModifiers::ALT)),
            Action::None
        );
        assert_eq!(
            key_to_action(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(key(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            Action::Hint
        );
    }
}
