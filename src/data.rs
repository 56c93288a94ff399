use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::grade::Grade;
use crate::models::{Exam, Prediction, Role, User};

pub const EXAMS_FILE: &str = "exams.csv";
pub const GRADES_FILE: &str = "grades.csv";
pub const USERS_FILE: &str = "users.csv";
pub const PREDICTIONS_FILE: &str = "predictions.csv";

/// Raw records handed to the scoring engine.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub exams: Vec<Exam>,
    pub users: Vec<User>,
    pub predictions: Vec<Prediction>,
}

impl Dataset {
    pub fn exam(&self, id: Uuid) -> Option<&Exam> {
        self.exams.iter().find(|exam| exam.id == id)
    }

    pub fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ExamRow {
    id: Uuid,
    title: String,
    subject: String,
    description: Option<String>,
    #[serde(deserialize_with = "deserialize_calendar_date")]
    date: NaiveDate,
    is_closed: bool,
    closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GradeRow {
    exam_id: Uuid,
    student_id: Uuid,
    #[serde(deserialize_with = "crate::grade::deserialize_lenient")]
    grade: Option<Grade>,
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; the time of day is dropped.
fn deserialize_calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|_| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

fn read_rows<T>(path: &Path) -> anyhow::Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<T>().enumerate() {
        let row =
            result.with_context(|| format!("{}: bad record {}", path.display(), index + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn load(dir: &Path) -> anyhow::Result<Dataset> {
    let exam_rows: Vec<ExamRow> = read_rows(&dir.join(EXAMS_FILE))?;
    let grade_rows: Vec<GradeRow> = read_rows(&dir.join(GRADES_FILE))?;
    let users: Vec<User> = read_rows(&dir.join(USERS_FILE))?;
    let predictions: Vec<Prediction> = read_rows(&dir.join(PREDICTIONS_FILE))?;

    let mut exams: Vec<Exam> = exam_rows
        .into_iter()
        .map(|row| Exam {
            id: row.id,
            title: row.title,
            subject: row.subject,
            description: row.description.filter(|text| !text.trim().is_empty()),
            date: row.date,
            is_closed: row.is_closed,
            closed_at: row.closed_at,
            grades: HashMap::new(),
        })
        .collect();

    for row in grade_rows {
        let Some(exam) = exams.iter_mut().find(|exam| exam.id == row.exam_id) else {
            bail!("{GRADES_FILE}: grade for unknown exam {}", row.exam_id);
        };
        let Some(grade) = row.grade else {
            debug!(
                exam_id = %row.exam_id,
                student_id = %row.student_id,
                "skipping grade that is not a number"
            );
            continue;
        };
        exam.grades.insert(row.student_id, grade);
    }

    let mut seen = HashSet::new();
    for prediction in &predictions {
        if !seen.insert((prediction.exam_id, prediction.student_id)) {
            bail!(
                "{PREDICTIONS_FILE}: duplicate prediction for exam {} and student {}",
                prediction.exam_id,
                prediction.student_id
            );
        }
    }

    for grade in exams.iter().flat_map(|exam| exam.grades.values()) {
        if !grade.is_canonical() {
            debug!(grade = %grade, "grade outside the quarter-step scale");
        }
    }

    info!(
        exams = exams.len(),
        users = users.len(),
        predictions = predictions.len(),
        dir = %dir.display(),
        "dataset loaded"
    );

    Ok(Dataset {
        exams,
        users,
        predictions,
    })
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a small sample class to `dir`, dated relative to `today`.
pub fn seed(dir: &Path, today: NaiveDate) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let teacher = Uuid::parse_str("5b1f0f0e-6f41-4c55-9b0a-2f1f5a3c9d01")?;
    let avery = Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?;
    let jules = Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?;
    let kiara = Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?;

    let users = vec![
        User {
            id: teacher,
            name: "Dana Keller".to_string(),
            role: Role::Teacher,
        },
        User {
            id: avery,
            name: "Avery Lee".to_string(),
            role: Role::Student,
        },
        User {
            id: jules,
            name: "Jules Moreno".to_string(),
            role: Role::Student,
        },
        User {
            id: kiara,
            name: "Kiara Patel".to_string(),
            role: Role::Student,
        },
    ];

    let algebra = Uuid::parse_str("8a3e2c4d-1b7f-4f0a-9c6e-5d2b1a0f9e81")?;
    let essay = Uuid::parse_str("1f9c7b5a-3e2d-4c1b-8a09-7f6e5d4c3b22")?;
    let chemistry = Uuid::parse_str("6c5b4a39-2817-4605-b4a3-92817f6e5d43")?;

    let exams = vec![
        ExamRow {
            id: algebra,
            title: "Algebra midterm".to_string(),
            subject: "Mathematics".to_string(),
            description: Some("Linear equations and inequalities".to_string()),
            date: today - chrono::Duration::days(14),
            is_closed: true,
            closed_at: (today - chrono::Duration::days(9))
                .and_hms_opt(16, 0, 0)
                .map(|closed| closed.and_utc()),
        },
        ExamRow {
            id: essay,
            title: "Argumentative essay".to_string(),
            subject: "German".to_string(),
            description: None,
            date: today - chrono::Duration::days(2),
            is_closed: false,
            closed_at: None,
        },
        ExamRow {
            id: chemistry,
            title: "Acids and bases".to_string(),
            subject: "Chemistry".to_string(),
            description: None,
            date: today + chrono::Duration::days(5),
            is_closed: false,
            closed_at: None,
        },
    ];

    let grade = |value: f64| Grade::try_from(value);
    let grades = vec![
        GradeRow {
            exam_id: algebra,
            student_id: avery,
            grade: Some(grade(5.25)?),
        },
        GradeRow {
            exam_id: algebra,
            student_id: jules,
            grade: Some(grade(4.0)?),
        },
        GradeRow {
            exam_id: algebra,
            student_id: kiara,
            grade: Some(grade(4.75)?),
        },
        GradeRow {
            exam_id: essay,
            student_id: avery,
            grade: Some(grade(4.5)?),
        },
    ];

    let predictions = vec![
        Prediction {
            exam_id: algebra,
            student_id: avery,
            prediction1: Some(grade(5.0)?),
            prediction2: Some(grade(5.25)?),
            points1: None,
            points2: None,
        },
        Prediction {
            exam_id: algebra,
            student_id: jules,
            prediction1: Some(grade(5.0)?),
            prediction2: None,
            points1: Some(1),
            points2: None,
        },
        Prediction {
            exam_id: essay,
            student_id: kiara,
            prediction1: Some(grade(4.5)?),
            prediction2: None,
            points1: None,
            points2: None,
        },
    ];

    write_rows(&dir.join(USERS_FILE), &users)?;
    write_rows(&dir.join(EXAMS_FILE), &exams)?;
    write_rows(&dir.join(GRADES_FILE), &grades)?;
    write_rows(&dir.join(PREDICTIONS_FILE), &predictions)?;

    info!(dir = %dir.display(), "sample data written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).expect("valid date")
    }

    #[test]
    fn seeded_data_loads_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        seed(dir.path(), today()).expect("seed writes");

        let dataset = load(dir.path()).expect("dataset loads");
        assert_eq!(dataset.exams.len(), 3);
        assert_eq!(dataset.users.len(), 4);
        assert_eq!(dataset.predictions.len(), 3);

        let algebra = dataset
            .exams
            .iter()
            .find(|exam| exam.title == "Algebra midterm")
            .expect("algebra exam");
        assert_eq!(algebra.grades.len(), 3);
        assert!(algebra.is_closed);
        assert_eq!(algebra.date, today() - chrono::Duration::days(14));
    }

    #[test]
    fn timestamps_lose_their_time_of_day() {
        assert_eq!(parse_calendar_date("2024-06-12"), Ok(today()));
        assert_eq!(parse_calendar_date("2024-06-12T23:30:00+02:00"), Ok(today()));
        assert!(parse_calendar_date("12.06.2024").is_err());
    }

    #[test]
    fn duplicate_predictions_are_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        seed(dir.path(), today()).expect("seed writes");

        let path = dir.path().join(PREDICTIONS_FILE);
        let mut contents = std::fs::read_to_string(&path).expect("predictions readable");
        let duplicate = contents.lines().nth(1).expect("first record").to_string();
        contents.push_str(&duplicate);
        contents.push('\n');
        std::fs::write(&path, contents).expect("predictions writable");

        let err = load(dir.path()).expect_err("duplicate must fail");
        assert!(err.to_string().contains("duplicate prediction"));
    }

    fn replace_file(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).expect("file writable");
    }

    #[test]
    fn non_numeric_grades_load_as_missing() {
        let dir = tempfile::tempdir().expect("temp dir");
        seed(dir.path(), today()).expect("seed writes");

        let algebra = "8a3e2c4d-1b7f-4f0a-9c6e-5d2b1a0f9e81";
        let avery = "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2";
        let jules = "0c22f1f1-9184-4fd4-9b21-28c68a6a89dc";
        replace_file(
            dir.path(),
            GRADES_FILE,
            &format!("exam_id,student_id,grade\n{algebra},{avery},NaN\n{algebra},{jules},5\n"),
        );
        replace_file(
            dir.path(),
            PREDICTIONS_FILE,
            &format!(
                "exam_id,student_id,prediction1,prediction2,points1,points2\n\
                 {algebra},{avery},NaN,5.25,,\n{algebra},{jules},5,,,\n"
            ),
        );

        let dataset = load(dir.path()).expect("NaN cells do not fail the load");
        let exam = dataset
            .exam(Uuid::parse_str(algebra).expect("valid id"))
            .expect("algebra exam");
        let avery = Uuid::parse_str(avery).expect("valid id");
        let jules = Uuid::parse_str(jules).expect("valid id");
        assert_eq!(exam.grade_for(avery), None);
        assert_eq!(exam.grade_for(jules), Grade::from_f64(5.0));

        let tips = dataset
            .predictions
            .iter()
            .find(|prediction| prediction.student_id == avery)
            .expect("avery predicted");
        assert_eq!(tips.prediction1, None);
        assert_eq!(tips.prediction2, Grade::from_f64(5.25));

        let board = crate::ranking::global_leaderboard(
            &dataset.exams,
            &dataset.users,
            &dataset.predictions,
            today(),
        );
        let points_for = |id: Uuid| {
            board
                .iter()
                .find(|entry| entry.student_id == id)
                .map(|entry| entry.total_points)
        };
        assert_eq!(points_for(jules), Some(5));
        assert_eq!(points_for(avery), Some(0));
    }

    #[test]
    fn grades_for_unknown_exams_are_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        seed(dir.path(), today()).expect("seed writes");

        let stray = Uuid::new_v4();
        let avery = "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2";
        replace_file(
            dir.path(),
            GRADES_FILE,
            &format!("exam_id,student_id,grade\n{stray},{avery},4.5\n"),
        );

        let err = load(dir.path()).expect_err("unknown exam must fail");
        assert!(err.to_string().contains("unknown exam"));
        assert!(err.to_string().contains(&stray.to_string()));
    }

    #[test]
    fn missing_files_report_their_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load(dir.path()).expect_err("empty dir must fail");
        assert!(err.to_string().contains(EXAMS_FILE));
    }
}
