//! Line-oriented menu front end.
//!
//! Reads choices from any [`BufRead`] and writes to any [`Write`], so the
//! whole session can be driven from a string in tests. End of input ends the
//! session like choosing Exit.

use crate::domain::{ProfileUpdate, SortKey, StudentService};
use std::io::{self, BufRead, Write};

const MENU: &str = "
--- Student Management System ---
1. Add Student
2. List Students
3. View Student Details
4. Update Student
5. Delete Student
6. Add Grade
7. Calculate Lesson Average
8. Calculate General Average
9. Update Attendance
10. Backup Data / Export CSV
11. Exit
---------------------------------";

pub struct TextMenu<'a, R, W> {
    service: &'a mut StudentService,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> TextMenu<'a, R, W> {
    pub fn new(service: &'a mut StudentService, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        if self.service.is_empty() {
            let answer = self.prompt("No data found. Add demo students? (y/n): ")?;
            if answer.as_deref().is_some_and(|a| a.eq_ignore_ascii_case("y")) {
                match self.service.seed_demo() {
                    Ok(()) => writeln!(self.output, "Demo students added.")?,
                    Err(e) => writeln!(self.output, "Could not add demo students: {e}")?,
                }
            }
        }

        loop {
            writeln!(self.output, "{MENU}")?;
            let Some(choice) = self.prompt("Select an option (1-11): ")? else {
                return Ok(());
            };
            let keep_going = match choice.as_str() {
                "1" => self.add_student()?,
                "2" => self.list_students()?,
                "3" => self.view_details()?,
                "4" => self.update_student()?,
                "5" => self.delete_student()?,
                "6" => self.add_grade()?,
                "7" => self.lesson_average()?,
                "8" => self.general_average()?,
                "9" => self.update_attendance()?,
                "10" => self.backup_or_export()?,
                "11" => {
                    writeln!(self.output, "Goodbye!")?;
                    return Ok(());
                }
                _ => {
                    writeln!(self.output, "Invalid option.")?;
                    true
                }
            };
            if !keep_going {
                return Ok(());
            }
            if let Some(err) = self.service.last_save_error() {
                writeln!(self.output, "Warning: changes not saved to disk ({err}).")?;
            }
        }
    }

    /// Prints `text` and reads one trimmed line; `None` at end of input.
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt_required(&mut self, text: &str) -> io::Result<Option<String>> {
        loop {
            match self.prompt(text)? {
                Some(value) if value.is_empty() => writeln!(self.output, "This field is required.")?,
                other => return Ok(other),
            }
        }
    }

    // Each action returns Ok(false) when input ran out mid-way.

    fn add_student(&mut self) -> io::Result<bool> {
        let Some(name) = self.prompt_required("Name: ")? else {
            return Ok(false);
        };
        let Some(surname) = self.prompt_required("Surname: ")? else {
            return Ok(false);
        };
        let Some(class_name) = self.prompt_required("Class: ")? else {
            return Ok(false);
        };
        self.service.add_student(&name, &surname, &class_name);
        writeln!(self.output, "Student added successfully.")?;
        Ok(true)
    }

    fn list_students(&mut self) -> io::Result<bool> {
        let Some(sort_opt) = self.prompt("Sort by (1: Default, 2: Average, 3: Absence): ")? else {
            return Ok(false);
        };
        let sort = match sort_opt.as_str() {
            "2" => SortKey::AverageDesc,
            "3" => SortKey::AbsenceDesc,
            _ => SortKey::Insertion,
        };

        writeln!(
            self.output,
            "\n{:<36} | {:<15} | {:<15} | {:<5} | {:<7} | {:<5}",
            "ID", "Name", "Surname", "Class", "Absence", "Avg"
        )?;
        writeln!(self.output, "{}", "-".repeat(100))?;
        for s in self.service.list_students(sort) {
            writeln!(
                self.output,
                "{:<36} | {:<15} | {:<15} | {:<5} | {:<7} | {:.2}",
                s.id,
                s.name,
                s.surname,
                s.class_name,
                s.absence_count,
                s.average(None)
            )?;
        }
        Ok(true)
    }

    fn view_details(&mut self) -> io::Result<bool> {
        let Some(id) = self.prompt_required("Student ID: ")? else {
            return Ok(false);
        };
        match self.service.get_student(&id) {
            Some(student) => {
                writeln!(
                    self.output,
                    "\n--- {} {} ({}) ---",
                    student.name, student.surname, student.class_name
                )?;
                writeln!(self.output, "Absence: {}", student.absence_count)?;
                writeln!(self.output, "Grades:")?;
                for (lesson, scores) in &student.grades {
                    writeln!(self.output, "  {lesson}: {}", crate::domain::format_scores(scores))?;
                }
            }
            None => writeln!(self.output, "Student not found.")?,
        }
        Ok(true)
    }

    fn update_student(&mut self) -> io::Result<bool> {
        let Some(id) = self.prompt_required("Student ID: ")? else {
            return Ok(false);
        };
        writeln!(self.output, "Leave blank to keep current value.")?;
        let (Some(name), Some(surname), Some(class_name)) = (
            self.prompt("New Name: ")?,
            self.prompt("New Surname: ")?,
            self.prompt("New Class: ")?,
        ) else {
            return Ok(false);
        };

        let update = ProfileUpdate::from_inputs(&name, &surname, &class_name);
        if self.service.update_student(&id, &update) {
            writeln!(self.output, "Student updated.")?;
        } else {
            writeln!(self.output, "Update failed. Check ID.")?;
        }
        Ok(true)
    }

    fn delete_student(&mut self) -> io::Result<bool> {
        let Some(id) = self.prompt_required("Student ID to delete: ")? else {
            return Ok(false);
        };
        if self.service.delete_student(&id) {
            writeln!(self.output, "Student deleted.")?;
        } else {
            writeln!(self.output, "Student not found.")?;
        }
        Ok(true)
    }

    fn add_grade(&mut self) -> io::Result<bool> {
        let Some(id) = self.prompt_required("Student ID: ")? else {
            return Ok(false);
        };
        let Some(lesson) = self.prompt_required("Lesson Name: ")? else {
            return Ok(false);
        };
        let Some(raw) = self.prompt_required("Grade (0-100): ")? else {
            return Ok(false);
        };
        let Ok(grade) = raw.parse::<i32>() else {
            writeln!(self.output, "Invalid input. Grade must be a whole number.")?;
            return Ok(true);
        };
        match self.service.add_grade(&id, &lesson, grade) {
            Ok(true) => writeln!(self.output, "Grade added.")?,
            Ok(false) => writeln!(self.output, "Failed to add grade.")?,
            Err(e) => writeln!(self.output, "Invalid input: {e}")?,
        }
        Ok(true)
    }

    fn lesson_average(&mut self) -> io::Result<bool> {
        let Some(id) = self.prompt_required("Student ID: ")? else {
            return Ok(false);
        };
        let Some(lesson) = self.prompt_required("Lesson Name: ")? else {
            return Ok(false);
        };
        let avg = self.service.calculate_average(&id, Some(lesson.as_str()));
        writeln!(self.output, "Average for {lesson}: {avg:.2}")?;
        Ok(true)
    }

    fn general_average(&mut self) -> io::Result<bool> {
        let Some(id) = self.prompt_required("Student ID: ")? else {
            return Ok(false);
        };
        let avg = self.service.calculate_average(&id, None);
        writeln!(self.output, "General Average: {avg:.2}")?;
        Ok(true)
    }

    fn update_attendance(&mut self) -> io::Result<bool> {
        let Some(id) = self.prompt_required("Student ID: ")? else {
            return Ok(false);
        };
        let Some(raw) = self.prompt_required("Absence change (e.g., 1 or -1): ")? else {
            return Ok(false);
        };
        let Ok(delta) = raw.parse::<i64>() else {
            writeln!(self.output, "Invalid number.")?;
            return Ok(true);
        };
        if self.service.update_attendance(&id, delta) {
            writeln!(self.output, "Attendance updated.")?;
        } else {
            writeln!(self.output, "Update failed (check ID or if result is negative).")?;
        }
        Ok(true)
    }

    fn backup_or_export(&mut self) -> io::Result<bool> {
        let Some(choice) = self.prompt("1. Backup Data\n2. Export CSV\nSelect: ")? else {
            return Ok(false);
        };
        let message = match choice.as_str() {
            "1" => self.service.backup_data(),
            "2" => self.service.export_csv(),
            _ => "Invalid selection.".to_string(),
        };
        writeln!(self.output, "{message}")?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::JsonFileStore;
    use std::io::Cursor;
    use tempfile::{TempDir, tempdir};

    fn service() -> (StudentService, TempDir) {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("students.json"));
        (StudentService::new(Box::new(store)), dir)
    }

    fn run(service: &mut StudentService, script: &str) -> String {
        let mut output = Vec::new();
        TextMenu::new(service, Cursor::new(script.to_string()), &mut output)
            .run()
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_declining_demo_then_exit() {
        let (mut service, _dir) = service();
        let output = run(&mut service, "n\n11\n");
        assert!(output.contains("No data found."));
        assert!(output.contains("Goodbye!"));
        assert!(service.is_empty());
    }

    #[test]
    fn test_demo_data_and_sorted_listing() {
        let (mut service, _dir) = service();
        let output = run(&mut service, "y\n2\n2\n11\n");
        assert!(output.contains("Demo students added."));

        let ayse = output.find("Ayse").unwrap();
        let ali = output.find("Ali ").unwrap();
        let mehmet = output.find("Mehmet").unwrap();
        assert!(ayse < ali && ali < mehmet);
        assert!(output.contains("| 95.00"));
    }

    #[test]
    fn test_add_requires_fields_and_end_of_input_exits() {
        let (mut service, _dir) = service();
        let output = run(&mut service, "n\n1\n\nAli\nYilmaz\n10A\n");
        assert!(output.contains("This field is required."));
        assert!(output.contains("Student added successfully."));
        assert_eq!(service.len(), 1);
    }

    #[test]
    fn test_grade_and_average_flow() {
        let (mut service, _dir) = service();
        let id = service.add_student("Ali", "Yilmaz", "10A").id;
        let script = format!(
            "6\n{id}\nMath\n85\n6\n{id}\nPhysics\n90\n6\n{id}\nMath\n101\n6\n{id}\nMath\nabc\n8\n{id}\n7\n{id}\nMath\n11\n"
        );
        let output = run(&mut service, &script);

        assert_eq!(output.matches("Grade added.").count(), 2);
        assert!(output.contains("Invalid input: Validation error"));
        assert!(output.contains("Invalid input. Grade must be a whole number."));
        assert!(!output.contains("invalid digit"));
        assert!(output.contains("General Average: 87.50"));
        assert!(output.contains("Average for Math: 85.00"));
    }

    #[test]
    fn test_update_keeps_blank_fields() {
        let (mut service, _dir) = service();
        let id = service.add_student("Ali", "Yilmaz", "10A").id;
        let output = run(&mut service, &format!("4\n{id}\n\n\n11B\n4\nnope\nX\n\n\n11\n"));

        assert!(output.contains("Student updated."));
        assert!(output.contains("Update failed. Check ID."));
        let student = service.get_student(&id).unwrap();
        assert_eq!(student.name, "Ali");
        assert_eq!(student.class_name, "11B");
    }

    #[test]
    fn test_attendance_and_delete() {
        let (mut service, _dir) = service();
        let id = service.add_student("Ali", "Yilmaz", "10A").id;
        let script = format!("9\n{id}\n-1\n9\n{id}\n2\n3\n{id}\n5\n{id}\n5\n{id}\n11\n");
        let output = run(&mut service, &script);

        assert!(output.contains("Update failed (check ID or if result is negative)."));
        assert!(output.contains("Attendance updated."));
        assert!(output.contains("Absence: 2"));
        assert!(output.contains("Student deleted."));
        assert!(output.contains("Student not found."));
        assert!(service.is_empty());
    }

    #[test]
    fn test_backup_and_export_submenu() {
        let (mut service, dir) = service();
        service.add_student("Ali", "Yilmaz", "10A");
        let output = run(&mut service, "10\n2\n10\n1\n10\n9\n11\n");

        assert!(output.contains("Data exported to"));
        assert!(output.contains("Backup created:"));
        assert!(output.contains("Invalid selection."));
        assert!(dir.path().join("students_export.csv").exists());
    }
}
