use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grade::Grade;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamStatus {
    Open,
    Evaluation,
    Closed,
}

impl ExamStatus {
    pub fn label(self) -> &'static str {
        match self {
            ExamStatus::Open => "open",
            ExamStatus::Evaluation => "evaluation",
            ExamStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Exam {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub is_closed: bool,
    pub closed_at: Option<DateTime<Utc>>,
    pub grades: HashMap<Uuid, Grade>,
}

impl Exam {
    pub fn grade_for(&self, student_id: Uuid) -> Option<Grade> {
        self.grades.get(&student_id).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub exam_id: Uuid,
    pub student_id: Uuid,
    #[serde(default, deserialize_with = "crate::grade::deserialize_lenient")]
    pub prediction1: Option<Grade>,
    #[serde(default, deserialize_with = "crate::grade::deserialize_lenient")]
    pub prediction2: Option<Grade>,
    pub points1: Option<u8>,
    pub points2: Option<u8>,
}

impl Prediction {
    pub fn matches(&self, exam_id: Uuid, student_id: Uuid) -> bool {
        self.exam_id == exam_id && self.student_id == student_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

impl User {
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub student_id: Uuid,
    pub student_name: String,
    pub total_points: u32,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamResult {
    pub grade: Option<Grade>,
    pub rank: usize,
    pub total_points: u32,
    pub prediction1: Option<Grade>,
    pub prediction2: Option<Grade>,
    pub points1: Option<u8>,
    pub points2: Option<u8>,
}
