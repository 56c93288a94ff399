use std::cmp::Reverse;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::eligibility::find_prediction;
use crate::grade::Grade;
use crate::models::{Exam, ExamResult, ExamStatus, LeaderboardEntry, Prediction, User};
use crate::points::points;

/// Points for one tip: the stored value, else the value computed against
/// `grade`, else nothing.
pub fn resolved_points(
    stored: Option<u8>,
    tip: Option<Grade>,
    grade: Option<Grade>,
) -> Option<u8> {
    [stored, points(tip, grade)].into_iter().flatten().next()
}

/// Points a prediction contributes to the leaderboard; unresolved tips count as zero.
pub fn leaderboard_points(prediction: Option<&Prediction>, grade: Grade) -> u32 {
    let Some(prediction) = prediction else {
        return 0;
    };

    [
        resolved_points(prediction.points1, prediction.prediction1, Some(grade)),
        resolved_points(prediction.points2, prediction.prediction2, Some(grade)),
    ]
    .into_iter()
    .map(|value| value.map_or(0, u32::from))
    .sum()
}

/// Stored points only; used when ranking a single exam's cohort.
pub fn stored_points(prediction: Option<&Prediction>) -> u32 {
    prediction.map_or(0, |p| {
        u32::from(p.points1.unwrap_or(0)) + u32::from(p.points2.unwrap_or(0))
    })
}

/// Sorts totals descending, keeping input order between equal totals, and
/// only then assigns 1-based ranks.
fn rank_descending<T>(mut rows: Vec<(T, u32)>) -> Vec<(T, u32, usize)> {
    rows.sort_by_key(|(_, total)| Reverse(*total));
    rows.into_iter()
        .enumerate()
        .map(|(index, (item, total))| (item, total, index + 1))
        .collect()
}

/// Global ranking over every closed exam that graded the student.
pub fn global_leaderboard(
    exams: &[Exam],
    users: &[User],
    predictions: &[Prediction],
    today: NaiveDate,
) -> Vec<LeaderboardEntry> {
    let closed: Vec<&Exam> = exams
        .iter()
        .filter(|exam| exam.status(today) == ExamStatus::Closed)
        .collect();

    let totals: Vec<(&User, u32)> = users
        .iter()
        .filter(|user| user.is_student())
        .map(|student| {
            let total: u32 = closed
                .iter()
                .filter_map(|exam| {
                    let grade = exam.grade_for(student.id)?;
                    let prediction = find_prediction(predictions, exam.id, student.id);
                    Some(leaderboard_points(prediction, grade))
                })
                .sum();
            (student, total)
        })
        .collect();

    debug!(
        closed_exams = closed.len(),
        students = totals.len(),
        "computed leaderboard totals"
    );

    rank_descending(totals)
        .into_iter()
        .map(|(student, total_points, rank)| LeaderboardEntry {
            student_id: student.id,
            student_name: student.name.clone(),
            total_points,
            rank,
        })
        .collect()
}

/// One student's standing within a single exam's cohort.
///
/// Returns `None` when `student_id` is not a student in `users`.
pub fn exam_result(
    exam: &Exam,
    student_id: Uuid,
    users: &[User],
    predictions: &[Prediction],
) -> Option<ExamResult> {
    let totals: Vec<(Uuid, u32)> = users
        .iter()
        .filter(|user| user.is_student())
        .map(|student| {
            let prediction = find_prediction(predictions, exam.id, student.id);
            (student.id, stored_points(prediction))
        })
        .collect();

    let Some((_, total_points, rank)) = rank_descending(totals)
        .into_iter()
        .find(|(id, _, _)| *id == student_id)
    else {
        debug!(%student_id, exam_id = %exam.id, "student not part of exam cohort");
        return None;
    };

    let prediction = find_prediction(predictions, exam.id, student_id);
    Some(ExamResult {
        grade: exam.grade_for(student_id),
        rank,
        total_points,
        prediction1: prediction.and_then(|p| p.prediction1),
        prediction2: prediction.and_then(|p| p.prediction2),
        points1: prediction.and_then(|p| p.points1),
        points2: prediction.and_then(|p| p.points2),
    })
}

/// Every closed exam's result for one student, most recent exam first.
pub fn student_history<'a>(
    exams: &'a [Exam],
    student_id: Uuid,
    users: &[User],
    predictions: &[Prediction],
    today: NaiveDate,
) -> Vec<(&'a Exam, ExamResult)> {
    let mut history: Vec<(&Exam, ExamResult)> = exams
        .iter()
        .filter(|exam| exam.status(today) == ExamStatus::Closed)
        .filter_map(|exam| {
            exam_result(exam, student_id, users, predictions).map(|result| (exam, result))
        })
        .collect();
    history.sort_by_key(|(exam, _)| Reverse(exam.date));
    history
}
