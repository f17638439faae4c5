use crate::application::{App, AppMode};
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key),
            AppMode::Form(_) => Self::handle_text_input_mode(app, key, modifiers),
            AppMode::Details => Self::handle_text_input_mode(app, key, modifiers),
            AppMode::Attendance => Self::handle_text_input_mode(app, key, modifiers),
            AppMode::ConfirmDelete => Self::handle_confirm_mode(app, key),
            AppMode::Search => Self::handle_search_mode(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
        }
    }

    fn handle_normal_mode(app: &mut App, key: KeyCode) {
        app.status_message = None;

        match key {
            KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::Home => app.selected = 0,
            KeyCode::End => {
                app.selected = app.visible_students().len().saturating_sub(1);
            }
            KeyCode::Char('a') => app.start_add(),
            KeyCode::Char('e') => app.start_edit(),
            KeyCode::Char('d') | KeyCode::Delete => app.start_delete(),
            KeyCode::Enter => app.open_details(),
            KeyCode::Char('t') => app.start_attendance(),
            KeyCode::Char('b') => app.backup_data(),
            KeyCode::Char('x') => app.export_csv(),
            KeyCode::Char('w') => app.sync_data(),
            KeyCode::Char('s') => app.cycle_sort(),
            KeyCode::Char('r') => app.refresh(),
            KeyCode::Char('/') => app.start_search(),
            KeyCode::F(1) | KeyCode::Char('?') => app.show_help(),
            KeyCode::Esc => {
                if !app.search_query.is_empty() {
                    app.cancel_search();
                }
            }
            KeyCode::Char('q') => {
                // Will be handled by main loop
            }
            _ => {}
        }
    }

    fn handle_text_input_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match key {
            KeyCode::Enter => match app.mode {
                AppMode::Form(_) => app.submit_form(),
                AppMode::Details => app.submit_grade(),
                AppMode::Attendance => app.submit_attendance(),
                _ => {}
            },
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Tab if modifiers.contains(KeyModifiers::SHIFT) => app.focus_previous(),
            KeyCode::Tab | KeyCode::Down => app.focus_next(),
            KeyCode::BackTab | KeyCode::Up => app.focus_previous(),
            KeyCode::Backspace => app.backspace(),
            KeyCode::Delete => app.delete_char(),
            KeyCode::Left => app.move_cursor_left(),
            KeyCode::Right => app.move_cursor_right(),
            KeyCode::Home => app.move_cursor_home(),
            KeyCode::End => app.move_cursor_end(),
            KeyCode::Char(c) => app.insert_char(c),
            _ => {}
        }
    }

    fn handle_confirm_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.confirm_delete(false),
            _ => {}
        }
    }

    fn handle_search_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.finish_search(),
            KeyCode::Esc => app.cancel_search(),
            KeyCode::Backspace => app.backspace(),
            KeyCode::Delete => app.delete_char(),
            KeyCode::Left => app.move_cursor_left(),
            KeyCode::Right => app.move_cursor_right(),
            KeyCode::Home => app.move_cursor_home(),
            KeyCode::End => app.move_cursor_end(),
            KeyCode::Down => app.select_next(),
            KeyCode::Up => app.select_previous(),
            KeyCode::Char(c) => app.insert_char(c),
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.close_help();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::FormKind;
    use crate::domain::StudentService;
    use crate::infrastructure::JsonFileStore;
    use tempfile::{TempDir, tempdir};

    fn app() -> (App, TempDir) {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("students.json"));
        (App::new(StudentService::new(Box::new(store))), dir)
    }

    fn press(app: &mut App, key: KeyCode) {
        InputHandler::handle_key_event(app, key, KeyModifiers::NONE);
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_add_student_with_keys() {
        let (mut app, _dir) = app();
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.mode, AppMode::Form(FormKind::Add));

        type_text(&mut app, "Ali");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Yilmaz");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "10A");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, AppMode::Normal);
        let student = app.selected_student().unwrap();
        assert_eq!(student.full_name(), "Ali Yilmaz");
        assert_eq!(student.class_name, "10A");
    }

    #[test]
    fn test_typing_in_form_does_not_trigger_shortcuts() {
        let (mut app, _dir) = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "dq");
        assert_eq!(app.inputs[0], "dq");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.service.is_empty());
    }

    #[test]
    fn test_back_tab_wraps_to_last_field() {
        let (mut app, _dir) = app();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, 2);
        InputHandler::handle_key_event(&mut app, KeyCode::Tab, KeyModifiers::SHIFT);
        assert_eq!(app.focus, 1);
    }

    #[test]
    fn test_delete_with_confirmation_keys() {
        let (mut app, _dir) = app();
        app.service.add_student("Ali", "Yilmaz", "10A");

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.mode, AppMode::ConfirmDelete);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.service.len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.service.is_empty());
    }

    #[test]
    fn test_details_grade_entry_with_keys() {
        let (mut app, _dir) = app();
        app.service.add_student("Ali", "Yilmaz", "10A");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Details);
        type_text(&mut app, "Math");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "90");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.selected_student().unwrap().average(Some("Math")), 90.0);
    }

    #[test]
    fn test_search_and_escape() {
        let (mut app, _dir) = app();
        app.service.add_student("Ali", "Yilmaz", "10A");
        app.service.add_student("Ayse", "Demir", "11B");

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "yil");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.visible_students().len(), 1);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.visible_students().len(), 2);
    }

    #[test]
    fn test_help_scrolling() {
        let (mut app, _dir) = app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, AppMode::Help);
        press(&mut app, KeyCode::PageDown);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.help_scroll, 4);
        press(&mut app, KeyCode::Home);
        assert_eq!(app.help_scroll, 0);
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn test_sort_key_binding() {
        let (mut app, _dir) = app();
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.sort.label(), "average");
        assert_eq!(app.status_message.as_deref(), Some("Sorted by average"));
    }
}
