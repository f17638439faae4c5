use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Lowest grade accepted by [`Student::push_grade`] callers.
pub const MIN_GRADE: i32 = 0;
/// Highest grade accepted by [`Student::push_grade`] callers.
pub const MAX_GRADE: i32 = 100;

/// A single student record as held in memory and persisted to the backing document.
///
/// Grades are kept as an ordered list of `(lesson, scores)` pairs so that lessons
/// keep the order in which they were first graded. On disk they are written as a
/// JSON object mapping lesson name to scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(
        default,
        serialize_with = "serialize_grades",
        deserialize_with = "deserialize_grades"
    )]
    pub grades: Vec<(String, Vec<i32>)>,
    #[serde(default)]
    pub absence_count: u32,
    #[serde(default = "now", deserialize_with = "deserialize_timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(default = "now", deserialize_with = "deserialize_timestamp")]
    pub updated_at: NaiveDateTime,
}

impl Student {
    pub fn new(name: &str, surname: &str, class_name: &str) -> Self {
        let created = now();
        Self {
            id: new_id(),
            name: name.to_string(),
            surname: surname.to_string(),
            class_name: class_name.to_string(),
            grades: Vec::new(),
            absence_count: 0,
            created_at: created,
            updated_at: created,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }

    /// Refreshes `updated_at` after a mutation.
    pub fn touch(&mut self) {
        self.updated_at = now();
    }

    pub fn lesson_grades(&self, lesson: &str) -> Option<&[i32]> {
        self.grades
            .iter()
            .find(|(name, _)| name == lesson)
            .map(|(_, scores)| scores.as_slice())
    }

    /// Appends a score to `lesson`, creating the lesson at the end of the list
    /// if it has not been graded before. Range checks are the caller's job.
    pub fn push_grade(&mut self, lesson: &str, grade: i32) {
        match self.grades.iter_mut().find(|(name, _)| name == lesson) {
            Some((_, scores)) => scores.push(grade),
            None => self.grades.push((lesson.to_string(), vec![grade])),
        }
    }

    pub fn all_grades(&self) -> impl Iterator<Item = i32> + '_ {
        self.grades.iter().flat_map(|(_, scores)| scores.iter().copied())
    }

    /// Mean of one lesson's grades, or of every grade flattened when `lesson`
    /// is `None`. Returns 0.0 when there is nothing to average.
    pub fn average(&self, lesson: Option<&str>) -> f64 {
        match lesson {
            Some(lesson) => mean(self.lesson_grades(lesson).unwrap_or_default().iter().copied()),
            None => mean(self.all_grades()),
        }
    }

    /// Renders the grades as `lesson: [a, b]; lesson: [c]`.
    pub fn grades_summary(&self) -> String {
        self.grades
            .iter()
            .map(|(lesson, scores)| format!("{}: {}", lesson, format_scores(scores)))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub fn format_scores(scores: &[i32]) -> String {
    let joined = scores
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{joined}]")
}

fn mean(values: impl Iterator<Item = i32>) -> f64 {
    let (sum, count) = values.fold((0i64, 0usize), |(sum, count), v| (sum + i64::from(v), count + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Optional profile changes for an update. A field that is `None` or an
/// empty string leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub class_name: Option<String>,
}

impl ProfileUpdate {
    /// Builds an update from form inputs, where empty means unchanged.
    /// Values are taken as given; front ends trim what the user typed.
    pub fn from_inputs(name: &str, surname: &str, class_name: &str) -> Self {
        let field = |value: &str| (!value.is_empty()).then(|| value.to_string());
        Self {
            name: field(name),
            surname: field(surname),
            class_name: field(class_name),
        }
    }

    pub fn apply_to(&self, student: &mut Student) {
        let apply = |target: &mut String, value: &Option<String>| {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                *target = value.to_string();
            }
        };
        apply(&mut student.name, &self.name);
        apply(&mut student.surname, &self.surname);
        apply(&mut student.class_name, &self.class_name);
    }
}

/// Ordering used when listing students.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Storage order.
    #[default]
    Insertion,
    /// Highest overall average first.
    AverageDesc,
    /// Most absences first.
    AbsenceDesc,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            SortKey::Insertion => SortKey::AverageDesc,
            SortKey::AverageDesc => SortKey::AbsenceDesc,
            SortKey::AbsenceDesc => SortKey::Insertion,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Insertion => "default",
            SortKey::AverageDesc => "average",
            SortKey::AbsenceDesc => "absence",
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn serialize_grades<S>(grades: &[(String, Vec<i32>)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(grades.len()))?;
    for (lesson, scores) in grades {
        map.serialize_entry(lesson, scores)?;
    }
    map.end()
}

fn deserialize_grades<'de, D>(deserializer: D) -> Result<Vec<(String, Vec<i32>)>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{MapAccess, Visitor};
    use std::fmt;

    struct GradesVisitor;

    impl<'de> Visitor<'de> for GradesVisitor {
        type Value = Vec<(String, Vec<i32>)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of lesson names to grade lists")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut grades: Vec<(String, Vec<i32>)> = Vec::new();
            while let Some((lesson, scores)) = map.next_entry::<String, Vec<i32>>()? {
                // Last duplicate key wins, first position is kept.
                match grades.iter_mut().find(|(name, _)| *name == lesson) {
                    Some(entry) => entry.1 = scores,
                    None => grades.push((lesson, scores)),
                }
            }
            Ok(grades)
        }
    }

    deserializer.deserialize_any(GradesVisitor)
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<NaiveDateTime>::deserialize(deserializer)?.unwrap_or_else(now))
}
