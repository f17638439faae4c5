//! In-memory record set and the persistence port it writes through.
//!
//! [`StudentRepository`] owns the ordered list of students for a session and
//! mirrors every change into a [`RecordStore`]. The store is injected, so the
//! service never touches files or global state directly.

use super::errors::PersistenceError;
use super::models::Student;

/// Result of reading the backing document.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// No document yet. This is the first-run state.
    Missing,
    /// Document read and parsed.
    Loaded(Vec<Student>),
    /// Document exists but could not be read or parsed.
    Fallback { reason: String },
}

/// Durable storage for the full record set plus its auxiliary exports.
pub trait RecordStore {
    /// Reads the whole record set.
    fn load(&self) -> LoadOutcome;

    /// Overwrites the stored document with `students`.
    fn save(&self, students: &[Student]) -> Result<(), PersistenceError>;

    /// Copies the current document aside and returns a status message.
    fn backup(&self) -> String;

    /// Writes a CSV snapshot of `students` and returns a status message.
    fn export_csv(&self, students: &[Student]) -> String;

    /// Human-readable location of the backing document, for logs and headers.
    fn location(&self) -> String;
}

pub struct StudentRepository {
    students: Vec<Student>,
    store: Box<dyn RecordStore>,
    last_save_error: Option<String>,
}

impl StudentRepository {
    /// Loads the record set from `store`. Unreadable documents yield an empty set.
    pub fn open(store: Box<dyn RecordStore>) -> Self {
        let students = match store.load() {
            LoadOutcome::Loaded(students) => {
                log::info!("Loaded {} students from {}", students.len(), store.location());
                students
            }
            LoadOutcome::Missing => {
                log::info!("No data file at {}, starting empty", store.location());
                Vec::new()
            }
            LoadOutcome::Fallback { reason } => {
                log::warn!("Error loading data from {}: {}; starting empty", store.location(), reason);
                Vec::new()
            }
        };

        Self {
            students,
            store,
            last_save_error: None,
        }
    }

    pub fn all(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.id == id)
    }

    pub fn push(&mut self, student: Student) {
        self.students.push(student);
    }

    pub fn remove(&mut self, id: &str) -> Option<Student> {
        let index = self.students.iter().position(|s| s.id == id)?;
        Some(self.students.remove(index))
    }

    /// Rewrites the whole document. A failure is logged and remembered but the
    /// in-memory records are kept as they are.
    pub fn persist(&mut self) -> Result<(), PersistenceError> {
        match self.store.save(&self.students) {
            Ok(()) => {
                log::debug!("Saved {} students to {}", self.students.len(), self.store.location());
                self.last_save_error = None;
                Ok(())
            }
            Err(err) => {
                log::error!("Error saving data to {}: {}", self.store.location(), err);
                self.last_save_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }
}
