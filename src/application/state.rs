//! Application state for the terminal user interface.
//!
//! [`App`] holds only what the screen needs (selection, input buffers, the
//! current mode and a status line) and forwards every operation to the
//! [`StudentService`].

use crate::domain::{ProfileUpdate, SortKey, Student, StudentService};

/// Represents the current mode of the application.
///
/// The mode decides how key presses are interpreted and which popup is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Browsing the student table
    Normal,
    /// Add or edit form with name, surname and class fields
    Form(FormKind),
    /// Waiting for y/n before deleting the selected student
    ConfirmDelete,
    /// Details popup with lesson and grade inputs
    Details,
    /// Prompt for an absence change such as `1` or `-1`
    Attendance,
    /// Typing a search filter
    Search,
    /// Help screen is displayed
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Add,
    Edit,
}

pub const FORM_LABELS: [&str; 3] = ["Name", "Surname", "Class"];
pub const GRADE_LABELS: [&str; 2] = ["Lesson", "Grade"];

/// Main application state.
///
/// # Examples
///
/// ```no_run
/// use roster::application::App;
/// use roster::domain::StudentService;
/// use roster::infrastructure::JsonFileStore;
///
/// let service = StudentService::new(Box::new(JsonFileStore::new("data/students.json")));
/// let app = App::new(service);
/// assert_eq!(app.selected, 0);
/// ```
pub struct App {
    /// The record service every action goes through
    pub service: StudentService,
    /// Index of the selected row in the visible (sorted, filtered) list
    pub selected: usize,
    /// Current application mode
    pub mode: AppMode,
    /// Ordering of the table
    pub sort: SortKey,
    /// Case-insensitive filter on name and surname
    pub search_query: String,
    /// Input buffers of the active form or prompt
    pub inputs: Vec<String>,
    /// Which input has focus
    pub focus: usize,
    /// Cursor position (in characters) within the focused input
    pub cursor_position: usize,
    /// Id of the student an open form, prompt or popup applies to
    pub target_id: Option<String>,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Scroll position in help text
    pub help_scroll: usize,
}

impl App {
    pub fn new(service: StudentService) -> Self {
        Self {
            service,
            selected: 0,
            mode: AppMode::Normal,
            sort: SortKey::default(),
            search_query: String::new(),
            inputs: Vec::new(),
            focus: 0,
            cursor_position: 0,
            target_id: None,
            status_message: None,
            help_scroll: 0,
        }
    }

    /// Students in table order after sorting and filtering.
    pub fn visible_students(&self) -> Vec<&Student> {
        let query = self.search_query.to_lowercase();
        self.service
            .list_students(self.sort)
            .into_iter()
            .filter(|s| {
                query.is_empty()
                    || s.name.to_lowercase().contains(&query)
                    || s.surname.to_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn selected_student(&self) -> Option<&Student> {
        self.visible_students().get(self.selected).copied()
    }

    /// The student a popup refers to, falling back to the table selection.
    pub fn target_student(&self) -> Option<&Student> {
        match &self.target_id {
            Some(id) => self.service.get_student(id),
            None => self.selected_student(),
        }
    }

    fn require_selection(&mut self) -> Option<String> {
        let id = self.selected_student().map(|s| s.id.clone());
        if id.is_none() {
            self.status_message = Some("Please select a student.".to_string());
        }
        id
    }

    pub fn select_next(&mut self) {
        let count = self.visible_students().len();
        if self.selected + 1 < count {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keeps the selection inside the visible list after it shrinks.
    pub fn clamp_selection(&mut self) {
        let count = self.visible_students().len();
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
    }

    pub fn refresh(&mut self) {
        self.clamp_selection();
        self.status_message = None;
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        self.selected = 0;
        self.status_message = Some(format!("Sorted by {}", self.sort.label()));
    }

    fn open_inputs(&mut self, mode: AppMode, values: Vec<String>, target_id: Option<String>) {
        self.mode = mode;
        self.inputs = values;
        self.focus = 0;
        self.cursor_position = self.inputs.first().map_or(0, |v| v.chars().count());
        self.target_id = target_id;
        self.status_message = None;
    }

    fn close_inputs(&mut self) {
        self.mode = AppMode::Normal;
        self.inputs.clear();
        self.focus = 0;
        self.cursor_position = 0;
        self.target_id = None;
    }

    /// Cancels the active form or prompt and returns to normal mode.
    pub fn cancel_input(&mut self) {
        self.close_inputs();
    }

    pub fn start_add(&mut self) {
        self.open_inputs(AppMode::Form(FormKind::Add), vec![String::new(); 3], None);
    }

    pub fn start_edit(&mut self) {
        let Some(id) = self.require_selection() else {
            return;
        };
        let values = self
            .service
            .get_student(&id)
            .map(|s| vec![s.name.clone(), s.surname.clone(), s.class_name.clone()])
            .unwrap_or_else(|| vec![String::new(); 3]);
        self.open_inputs(AppMode::Form(FormKind::Edit), values, Some(id));
    }

    /// Saves the add/edit form. Fields are trimmed first. Adding requires
    /// every field; when editing, blank ones keep their current value.
    pub fn submit_form(&mut self) {
        let AppMode::Form(kind) = self.mode else {
            return;
        };
        let field = |i: usize| self.inputs.get(i).map(|v| v.trim().to_string()).unwrap_or_default();
        let (name, surname, class_name) = (field(0), field(1), field(2));

        match kind {
            FormKind::Add => {
                if name.is_empty() || surname.is_empty() || class_name.is_empty() {
                    self.status_message = Some("All fields are required.".to_string());
                    return;
                }
                let student = self.service.add_student(&name, &surname, &class_name);
                self.close_inputs();
                self.select_id(&student.id);
                self.set_result_status(format!("Added {}", student.full_name()));
            }
            FormKind::Edit => {
                let id = self.target_id.clone().unwrap_or_default();
                let update = ProfileUpdate::from_inputs(&name, &surname, &class_name);
                let updated = self.service.update_student(&id, &update);
                self.close_inputs();
                self.clamp_selection();
                if updated {
                    self.set_result_status("Student updated.".to_string());
                } else {
                    self.status_message = Some("Student not found.".to_string());
                }
            }
        }
    }

    pub fn start_delete(&mut self) {
        let Some(id) = self.require_selection() else {
            return;
        };
        self.mode = AppMode::ConfirmDelete;
        self.target_id = Some(id);
        self.status_message = None;
    }

    pub fn confirm_delete(&mut self, confirmed: bool) {
        let id = self.target_id.take();
        self.mode = AppMode::Normal;
        let Some(id) = id.filter(|_| confirmed) else {
            return;
        };
        if self.service.delete_student(&id) {
            self.clamp_selection();
            self.set_result_status("Student deleted.".to_string());
        } else {
            self.status_message = Some("Student not found.".to_string());
        }
    }

    pub fn open_details(&mut self) {
        let Some(id) = self.require_selection() else {
            return;
        };
        self.open_inputs(AppMode::Details, vec![String::new(); 2], Some(id));
    }

    /// Adds the grade typed in the details popup. The popup stays open so
    /// several grades can be entered in a row.
    pub fn submit_grade(&mut self) {
        let id = self.target_id.clone().unwrap_or_default();
        let lesson = self.inputs.first().map(|v| v.trim().to_string()).unwrap_or_default();
        let grade = self.inputs.get(1).and_then(|v| v.trim().parse::<i32>().ok());

        let (false, Some(grade)) = (lesson.is_empty(), grade) else {
            self.status_message = Some("Invalid input.".to_string());
            return;
        };

        match self.service.add_grade(&id, &lesson, grade) {
            Ok(true) => {
                self.inputs = vec![String::new(); 2];
                self.focus = 0;
                self.cursor_position = 0;
                self.set_result_status(format!("Added {grade} in {lesson}"));
            }
            Ok(false) => self.status_message = Some("Student not found.".to_string()),
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    pub fn start_attendance(&mut self) {
        let Some(id) = self.require_selection() else {
            return;
        };
        self.open_inputs(AppMode::Attendance, vec![String::new()], Some(id));
    }

    pub fn submit_attendance(&mut self) {
        let id = self.target_id.clone().unwrap_or_default();
        let Some(delta) = self.inputs.first().and_then(|v| v.trim().parse::<i64>().ok()) else {
            self.status_message = Some("Invalid number.".to_string());
            return;
        };
        let exists = self.service.get_student(&id).is_some();
        let updated = self.service.update_attendance(&id, delta);
        self.close_inputs();
        self.clamp_selection();
        if updated {
            self.set_result_status("Attendance updated.".to_string());
        } else if exists {
            self.status_message = Some("Result cannot be negative.".to_string());
        } else {
            self.status_message = Some("Student not found.".to_string());
        }
    }

    pub fn backup_data(&mut self) {
        self.status_message = Some(self.service.backup_data());
    }

    pub fn export_csv(&mut self) {
        self.status_message = Some(self.service.export_csv());
    }

    /// Writes the data file again after a failed save.
    pub fn sync_data(&mut self) {
        self.status_message = Some(match self.service.sync() {
            Ok(()) => format!("Saved to {}", self.service.data_location()),
            Err(e) => format!("Save failed: {e}"),
        });
    }

    pub fn start_search(&mut self) {
        self.mode = AppMode::Search;
        self.cursor_position = self.search_query.chars().count();
        self.status_message = None;
    }

    pub fn finish_search(&mut self) {
        self.mode = AppMode::Normal;
        self.clamp_selection();
    }

    pub fn cancel_search(&mut self) {
        self.mode = AppMode::Normal;
        self.search_query.clear();
        self.cursor_position = 0;
        self.clamp_selection();
    }

    pub fn show_help(&mut self) {
        self.mode = AppMode::Help;
        self.help_scroll = 0;
    }

    pub fn close_help(&mut self) {
        self.mode = AppMode::Normal;
    }

    /// Moves focus to the next input of a multi-field form, wrapping around.
    pub fn focus_next(&mut self) {
        if self.inputs.is_empty() {
            return;
        }
        self.focus = (self.focus + 1) % self.inputs.len();
        self.cursor_position = self.inputs[self.focus].chars().count();
    }

    pub fn focus_previous(&mut self) {
        if self.inputs.is_empty() {
            return;
        }
        self.focus = (self.focus + self.inputs.len() - 1) % self.inputs.len();
        self.cursor_position = self.inputs[self.focus].chars().count();
    }

    /// The buffer keystrokes go to in the current mode.
    fn active_buffer(&mut self) -> Option<&mut String> {
        match self.mode {
            AppMode::Search => Some(&mut self.search_query),
            AppMode::Form(_) | AppMode::Details | AppMode::Attendance => self.inputs.get_mut(self.focus),
            _ => None,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let cursor = self.cursor_position;
        let inserted = match self.active_buffer() {
            Some(buffer) => {
                let at = byte_index(buffer, cursor);
                buffer.insert(at, c);
                true
            }
            None => false,
        };
        if inserted {
            self.cursor_position += 1;
        }
        self.after_search_edit();
    }

    pub fn backspace(&mut self) {
        let cursor = self.cursor_position;
        if cursor == 0 {
            return;
        }
        let removed = match self.active_buffer() {
            Some(buffer) => {
                let at = byte_index(buffer, cursor - 1);
                buffer.remove(at);
                true
            }
            None => false,
        };
        if removed {
            self.cursor_position -= 1;
        }
        self.after_search_edit();
    }

    pub fn delete_char(&mut self) {
        let cursor = self.cursor_position;
        if let Some(buffer) = self.active_buffer() {
            if cursor < buffer.chars().count() {
                let at = byte_index(buffer, cursor);
                buffer.remove(at);
            }
        }
        self.after_search_edit();
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        let len = self.active_buffer().map_or(0, |b| b.chars().count());
        if self.cursor_position < len {
            self.cursor_position += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_position = self.active_buffer().map_or(0, |b| b.chars().count());
    }

    fn after_search_edit(&mut self) {
        if self.mode == AppMode::Search {
            // Live filtering restarts at the top of the list.
            self.selected = 0;
        }
    }

    fn select_id(&mut self, id: &str) {
        if let Some(index) = self.visible_students().iter().position(|s| s.id == id) {
            self.selected = index;
        }
    }

    /// Status after a successful mutation, with a warning if it did not reach disk.
    fn set_result_status(&mut self, message: String) {
        self.status_message = Some(match self.service.last_save_error() {
            Some(err) => format!("{message} (not saved: {err})"),
            None => message,
        });
    }
}

fn byte_index(s: &str, char_pos: usize) -> usize {
    s.char_indices().nth(char_pos).map_or(s.len(), |(i, _)| i)
}
