//! Scoring and exam-lifecycle engine for student grade predictions.
//!
//! The core modules (`grade`, `points`, `status`, `eligibility`, `ranking`)
//! are pure: the current date is always passed in. `data`, `report` and
//! `telemetry` sit at the edge and are used by the command-line tool.

pub mod data;
pub mod eligibility;
pub mod grade;
pub mod models;
pub mod points;
pub mod ranking;
pub mod report;
pub mod status;
pub mod telemetry;

pub use grade::{format_grade, grade_domain, Grade};
pub use models::{Exam, ExamResult, ExamStatus, LeaderboardEntry, Prediction, Role, User};
