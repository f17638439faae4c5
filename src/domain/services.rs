//! Student record service.
//!
//! [`StudentService`] is the single entry point for both front ends. It owns a
//! [`StudentRepository`] and rewrites the backing document after every
//! successful mutation. A failed write never undoes the change in memory; it
//! is logged and reported through [`StudentService::last_save_error`], and
//! [`StudentService::sync`] retries it.

use super::errors::{DomainError, DomainResult, PersistenceError};
use super::models::{MAX_GRADE, MIN_GRADE, ProfileUpdate, SortKey, Student};
use super::repository::{RecordStore, StudentRepository};

pub struct StudentService {
    repository: StudentRepository,
}

impl StudentService {
    /// Creates a service over `store`, loading its current contents.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use roster::domain::StudentService;
    /// use roster::infrastructure::JsonFileStore;
    ///
    /// let mut service = StudentService::new(Box::new(JsonFileStore::new("data/students.json")));
    /// let ali = service.add_student("Ali", "Yilmaz", "10A");
    /// service.add_grade(&ali.id, "Math", 85).unwrap();
    /// assert_eq!(service.calculate_average(&ali.id, None), 85.0);
    /// ```
    pub fn new(store: Box<dyn RecordStore>) -> Self {
        Self {
            repository: StudentRepository::open(store),
        }
    }

    pub fn add_student(&mut self, name: &str, surname: &str, class_name: &str) -> Student {
        let student = Student::new(name, surname, class_name);
        log::info!("Adding student {} ({})", student.full_name(), student.id);
        self.repository.push(student.clone());
        self.persist();
        student
    }

    pub fn get_student(&self, id: &str) -> Option<&Student> {
        self.repository.get(id)
    }

    pub fn delete_student(&mut self, id: &str) -> bool {
        match self.repository.remove(id) {
            Some(student) => {
                log::info!("Deleted student {} ({})", student.full_name(), id);
                self.persist();
                true
            }
            None => false,
        }
    }

    /// Applies the non-empty fields of `update`. Returns `false` for an unknown id.
    pub fn update_student(&mut self, id: &str, update: &ProfileUpdate) -> bool {
        let Some(student) = self.repository.get_mut(id) else {
            return false;
        };
        update.apply_to(student);
        student.touch();
        log::debug!("Updated profile of {id}");
        self.persist();
        true
    }

    /// Appends `grade` to `lesson`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] when `grade` is outside 0..=100,
    /// whether or not the id exists.
    pub fn add_grade(&mut self, id: &str, lesson: &str, grade: i32) -> DomainResult<bool> {
        if !(MIN_GRADE..=MAX_GRADE).contains(&grade) {
            return Err(DomainError::grade_out_of_range(grade));
        }
        let Some(student) = self.repository.get_mut(id) else {
            return Ok(false);
        };
        student.push_grade(lesson, grade);
        student.touch();
        log::debug!("Added grade {grade} in {lesson} for {id}");
        self.persist();
        Ok(true)
    }

    /// Average for one lesson, or across all lessons when `lesson` is `None`.
    /// Unknown ids average to 0.0.
    pub fn calculate_average(&self, id: &str, lesson: Option<&str>) -> f64 {
        self.repository
            .get(id)
            .map(|s| s.average(lesson))
            .unwrap_or(0.0)
    }

    /// Changes the absence count by `delta`. Rejects results below zero.
    pub fn update_attendance(&mut self, id: &str, delta: i64) -> bool {
        let Some(student) = self.repository.get_mut(id) else {
            return false;
        };
        let next = i64::from(student.absence_count)
            .checked_add(delta)
            .and_then(|n| u32::try_from(n).ok());
        let Some(next) = next else {
            log::debug!("Rejected attendance change {delta} for {id}");
            return false;
        };
        student.absence_count = next;
        student.touch();
        self.persist();
        true
    }

    /// All students in the requested order. Sorting is stable, so ties keep
    /// storage order.
    pub fn list_students(&self, sort: SortKey) -> Vec<&Student> {
        let mut students: Vec<&Student> = self.repository.all().iter().collect();
        match sort {
            SortKey::Insertion => {}
            SortKey::AverageDesc => {
                let mut keyed: Vec<(f64, &Student)> =
                    students.into_iter().map(|s| (s.average(None), s)).collect();
                keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
                students = keyed.into_iter().map(|(_, s)| s).collect();
            }
            SortKey::AbsenceDesc => {
                students.sort_by(|a, b| b.absence_count.cmp(&a.absence_count));
            }
        }
        students
    }

    pub fn len(&self) -> usize {
        self.repository.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repository.is_empty()
    }

    pub fn backup_data(&self) -> String {
        let message = self.repository.store().backup();
        log::info!("{message}");
        message
    }

    pub fn export_csv(&self) -> String {
        let message = self.repository.store().export_csv(self.repository.all());
        log::info!("{message}");
        message
    }

    /// Message of the last failed write, cleared by the next successful one.
    pub fn last_save_error(&self) -> Option<&str> {
        self.repository.last_save_error()
    }

    pub fn is_synced(&self) -> bool {
        self.repository.last_save_error().is_none()
    }

    /// Rewrites the backing document from memory, e.g. after a failed save.
    pub fn sync(&mut self) -> Result<(), PersistenceError> {
        self.repository.persist()
    }

    pub fn data_location(&self) -> String {
        self.repository.store().location()
    }

    /// Adds the three demonstration students.
    pub fn seed_demo(&mut self) -> DomainResult<()> {
        let ali = self.add_student("Ali", "Yilmaz", "10A");
        self.add_grade(&ali.id, "Math", 85)?;
        self.add_grade(&ali.id, "Physics", 90)?;

        let ayse = self.add_student("Ayse", "Demir", "11B");
        self.add_grade(&ayse.id, "Math", 95)?;
        self.update_attendance(&ayse.id, 2);

        let mehmet = self.add_student("Mehmet", "Kaya", "10A");
        self.add_grade(&mehmet.id, "History", 70)?;
        Ok(())
    }

    fn persist(&mut self) {
        // Already logged and recorded by the repository.
        let _ = self.repository.persist();
    }
}
