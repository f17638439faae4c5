use crate::domain::{LoadOutcome, PersistenceError, RecordStore, Student};
use chrono::Local;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_FILE: &str = "data/students.json";
pub const CSV_EXPORT_FILE: &str = "students_export.csv";
pub const CSV_HEADER: &str = "ID,Name,Surname,Class,Absence,Grades";

/// Stores the roster as one pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn data_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn export_path(&self) -> PathBuf {
        self.data_dir().join(CSV_EXPORT_FILE)
    }

    pub fn backup_path(&self, stamp: &str) -> PathBuf {
        PathBuf::from(format!("{}.{}.bak", self.path.display(), stamp))
    }

    fn write_json(&self, students: &[Student]) -> Result<(), PersistenceError> {
        let dir = self.data_dir();
        fs::create_dir_all(&dir)?;

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        students.serialize(&mut serializer)?;
        fs::write(&self.path, buf)?;
        Ok(())
    }

    fn copy_with_metadata(&self, target: &Path) -> std::io::Result<()> {
        fs::copy(&self.path, target)?;
        let modified = fs::metadata(&self.path)?.modified()?;
        // The copy carries the source's permission bits, which may be read-only.
        File::open(target)?.set_modified(modified)?;
        Ok(())
    }

    fn write_csv(&self, target: &Path, students: &[Student]) -> Result<(), PersistenceError> {
        let mut out = BufWriter::new(File::create(target)?);
        writeln!(out, "{CSV_HEADER}")?;
        for student in students {
            out.write_all(&csv_leading_fields(student)?)?;
            writeln!(out, "\"{}\"", student.grades_summary().replace('"', "\"\""))?;
        }
        out.flush()?;
        Ok(())
    }
}

/// The first five columns of a row, escaped only where CSV needs it and
/// followed by the separator before the always-quoted grades column.
fn csv_leading_fields(student: &Student) -> Result<Vec<u8>, PersistenceError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b','))
        .from_writer(Vec::new());
    let absence = student.absence_count.to_string();
    writer.write_record([
        student.id.as_str(),
        student.name.as_str(),
        student.surname.as_str(),
        student.class_name.as_str(),
        absence.as_str(),
    ])?;
    writer
        .into_inner()
        .map_err(|e| PersistenceError::Io(e.into_error()))
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> LoadOutcome {
        if !self.path.exists() {
            return LoadOutcome::Missing;
        }
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<Vec<Student>>(&content) {
                Ok(students) => LoadOutcome::Loaded(students),
                Err(e) => LoadOutcome::Fallback {
                    reason: format!("Invalid file format - {e}"),
                },
            },
            Err(e) => LoadOutcome::Fallback {
                reason: e.to_string(),
            },
        }
    }

    fn save(&self, students: &[Student]) -> Result<(), PersistenceError> {
        self.write_json(students)
    }

    fn backup(&self) -> String {
        if !self.path.exists() {
            return "No data to backup.".to_string();
        }
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let target = self.backup_path(&stamp);
        match self.copy_with_metadata(&target) {
            Ok(()) => format!("Backup created: {}", target.display()),
            Err(e) => format!("Backup failed: {e}"),
        }
    }

    fn export_csv(&self, students: &[Student]) -> String {
        if students.is_empty() {
            return "No data to export.".to_string();
        }
        let target = self.export_path();
        match self.write_csv(&target, students) {
            Ok(()) => format!("Data exported to {}", target.display()),
            Err(e) => format!("Export failed: {e}"),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_students() -> Vec<Student> {
        let mut ali = Student::new("Ali", "Yilmaz", "10A");
        ali.push_grade("Math", 85);
        ali.push_grade("Math", 90);
        ali.push_grade("Physics", 90);
        let mut ayse = Student::new("Ayşe", "Demir", "11B");
        ayse.absence_count = 2;
        let plain = Student::new("Mehmet", "Kaya", "10A");
        vec![ali, ayse, plain]
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("students.json"));
        assert_eq!(store.load(), LoadOutcome::Missing);
    }

    #[test]
    fn test_load_corrupt_file_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("students.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), LoadOutcome::Fallback { .. }));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("students.json"));
        let students = sample_students();

        store.save(&students).unwrap();
        assert_eq!(store.load(), LoadOutcome::Loaded(students));
    }

    #[test]
    fn test_save_is_indented_and_unescaped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("students.json");
        let store = JsonFileStore::new(&path);
        store.save(&sample_students()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Ayşe"));
        assert!(content.contains("\n    {\n        \"id\""));
        assert!(content.find("\"Math\"").unwrap() < content.find("\"Physics\"").unwrap());
    }

    #[test]
    fn test_save_failure_is_an_error_value() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let store = JsonFileStore::new(blocker.join("students.json"));
        assert!(store.save(&sample_students()).is_err());
    }

    #[test]
    fn test_backup_without_data() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("students.json"));
        assert_eq!(store.backup(), "No data to backup.");
    }

    #[test]
    fn test_backup_copies_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("students.json");
        let store = JsonFileStore::new(&path);
        store.save(&sample_students()).unwrap();

        let message = store.backup();
        assert!(message.starts_with("Backup created: "), "{message}");

        let backup = PathBuf::from(message.trim_start_matches("Backup created: "));
        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("students.json."));
        assert!(name.ends_with(".bak"));
        // students.json.YYYYMMDD_HHMMSS.bak
        assert_eq!(name.len(), "students.json.".len() + 15 + ".bak".len());
        assert_eq!(fs::read(&backup).unwrap(), fs::read(&path).unwrap());
        assert_eq!(
            fs::metadata(&backup).unwrap().modified().unwrap(),
            fs::metadata(&path).unwrap().modified().unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_backup_of_read_only_document() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("students.json");
        let store = JsonFileStore::new(&path);
        store.save(&sample_students()).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();

        let message = store.backup();
        assert!(message.starts_with("Backup created: "), "{message}");
        let backup = PathBuf::from(message.trim_start_matches("Backup created: "));
        assert_eq!(fs::read(&backup).unwrap(), fs::read(&path).unwrap());
        assert_eq!(
            fs::metadata(&backup).unwrap().modified().unwrap(),
            fs::metadata(&path).unwrap().modified().unwrap()
        );
    }

    #[test]
    fn test_export_empty_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("students.json"));
        assert_eq!(store.export_csv(&[]), "No data to export.");
        assert!(!store.export_path().exists());
    }

    #[test]
    fn test_export_csv_layout() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("students.json"));
        let students = sample_students();

        let message = store.export_csv(&students);
        assert_eq!(message, format!("Data exported to {}", store.export_path().display()));

        let content = fs::read_to_string(store.export_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            format!("{},Ali,Yilmaz,10A,0,\"Math: [85, 90]; Physics: [90]\"", students[0].id)
        );
        assert_eq!(lines[2], format!("{},Ayşe,Demir,11B,2,\"\"", students[1].id));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_export_csv_escapes_leading_fields() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("students.json"));
        let mut student = Student::new("Jo, Jr", "O\"Neil", "12C");
        student.push_grade("Art", 70);

        store.export_csv(&[student.clone()]);
        let mut reader = csv::Reader::from_path(store.export_path()).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], student.id.as_str());
        assert_eq!(&record[1], "Jo, Jr");
        assert_eq!(&record[2], "O\"Neil");
        assert_eq!(&record[5], "Art: [70]");
    }

    #[test]
    fn test_export_path_next_to_document() {
        let store = JsonFileStore::new("students.json");
        assert_eq!(store.export_path(), PathBuf::from(".").join(CSV_EXPORT_FILE));
        let nested = JsonFileStore::new(DEFAULT_DATA_FILE);
        assert_eq!(nested.export_path(), PathBuf::from("data").join(CSV_EXPORT_FILE));
    }
}
