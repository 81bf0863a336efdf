use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Cursor editing shared by the query box and the API base popup.
/// Returns false for keys it does not handle.
fn edit_line(text: &mut String, cursor: &mut usize, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < text.chars().count() {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(text.chars().count()),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = text.chars().count(),
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => return false,
    }
    true
}

fn insert_at_cursor(text: &mut String, cursor: &mut usize, pasted: &str) {
    let byte_pos = char_to_byte_index(text, *cursor);
    text.insert_str(byte_pos, pasted);
    *cursor += pasted.chars().count();
}

/// Pasted text goes in at the cursor as a single line.
fn handle_paste(app: &mut App, pasted: &str) {
    let line: String = pasted
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    if app.show_api_base_input {
        insert_at_cursor(&mut app.api_base_input, &mut app.api_base_cursor, line.trim());
    } else if app.input_mode == InputMode::Editing {
        insert_at_cursor(&mut app.conversation.input, &mut app.query_cursor, &line);
    }
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Tick => app.tick_animation(),
    }
    app.poll_tasks().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_api_base_input {
        handle_api_base_input(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_api_base_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_api_base_input(),
        KeyCode::Enter => app.apply_api_base(),
        _ => {
            edit_line(&mut app.api_base_input, &mut app.api_base_cursor, key);
        }
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to typing
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.query_cursor = app.conversation.input.chars().count();
        }

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(app.chat_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(app.chat_height / 2);
        }
        KeyCode::PageDown => app.scroll_down(app.chat_height),
        KeyCode::PageUp => app.scroll_up(app.chat_height),
        KeyCode::Char('g') => app.scroll_up(u16::MAX),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        // Settings
        KeyCode::Char('d') => app.toggle_demo_mode(),
        KeyCode::Char('p') => app.cycle_pipeline(),
        KeyCode::Char('a') => app.open_api_base_input(),
        KeyCode::Char('H') => app.check_health(),

        // Follow-up offered by the last answer
        KeyCode::Char('s') => app.accept_follow_up(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit(None);
        }
        _ => {
            edit_line(&mut app.conversation.input, &mut app.query_cursor, key);
        }
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use tempfile::tempdir;
    use trustaid_core::{PrefStore, Settings};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn test_app(dir: &std::path::Path) -> App {
        App::new(Settings::default(), PrefStore::at(dir.join("prefs.json")))
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[test]
    fn test_edit_line_inserts_at_cursor() {
        let mut text = "helo".to_string();
        let mut cursor = 3;
        assert!(edit_line(&mut text, &mut cursor, key(KeyCode::Char('l'))));
        assert_eq!(text, "hello");
        assert_eq!(cursor, 4);

        edit_line(&mut text, &mut cursor, key(KeyCode::Home));
        edit_line(&mut text, &mut cursor, key(KeyCode::Delete));
        assert_eq!(text, "ello");
        assert!(!edit_line(&mut text, &mut cursor, key(KeyCode::Tab)));
    }

    #[test]
    fn test_backspace_handles_unicode() {
        let mut text = "café".to_string();
        let mut cursor = 4;
        edit_line(&mut text, &mut cursor, key(KeyCode::Backspace));
        assert_eq!(text, "caf");
        assert_eq!(cursor, 3);
    }

    #[test]
    fn test_enter_on_blank_input_does_nothing() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.conversation.input = "   ".to_string();

        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.conversation.transcript().len(), 1);
        assert!(app.query_task.is_none());
    }

    #[test]
    fn test_paste_inserts_one_line_at_cursor() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.conversation.input = "how do I ?".to_string();
        app.query_cursor = 9;

        handle_paste(&mut app, "apply for\ncarer payment");
        assert_eq!(app.conversation.input, "how do I apply for carer payment?");
        assert_eq!(app.query_cursor, 32);
        assert!(app.query_task.is_none(), "a pasted newline does not submit");
    }

    #[test]
    fn test_paste_into_api_base_popup_is_trimmed() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.input_mode = InputMode::Normal;
        app.open_api_base_input();
        app.api_base_input.clear();
        app.api_base_cursor = 0;

        handle_paste(&mut app, "  https://trustaid.example.org\n");
        assert_eq!(app.api_base_input, "https://trustaid.example.org");
        assert_eq!(app.conversation.input, "");
    }

    #[test]
    fn test_paste_ignored_in_normal_mode() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.input_mode = InputMode::Normal;

        handle_paste(&mut app, "text");
        assert_eq!(app.conversation.input, "");
    }

    #[test]
    fn test_escape_then_quit() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());

        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit, "q is typed while editing");
        assert_eq!(app.conversation.input, "q");

        handle_key(&mut app, key(KeyCode::Esc));
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_api_base_popup_captures_keys() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.input_mode = InputMode::Normal;

        handle_key(&mut app, key(KeyCode::Char('a')));
        assert!(app.show_api_base_input);
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(!app.show_api_base_input);
    }
}
