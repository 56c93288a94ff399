use std::cmp::Reverse;

use chrono::NaiveDate;

use crate::models::{Exam, ExamStatus};

/// Whole days after the exam during which it stays in evaluation.
pub const EVALUATION_WINDOW_DAYS: i64 = 5;

/// Derives the lifecycle state of an exam on the calendar day `today`.
pub fn resolve_status(exam_date: NaiveDate, is_closed: bool, today: NaiveDate) -> ExamStatus {
    if is_closed {
        return ExamStatus::Closed;
    }

    match (today - exam_date).num_days() {
        days if days < 1 => ExamStatus::Open,
        days if days < EVALUATION_WINDOW_DAYS => ExamStatus::Evaluation,
        _ => ExamStatus::Closed,
    }
}

impl Exam {
    pub fn status(&self, today: NaiveDate) -> ExamStatus {
        resolve_status(self.date, self.is_closed, today)
    }
}

/// Orders exams for listing: active exams soonest first, then closed exams
/// most recent first. The input slice is left untouched.
pub fn order_for_display(exams: &[Exam], today: NaiveDate) -> Vec<&Exam> {
    let (mut active, mut closed): (Vec<&Exam>, Vec<&Exam>) = exams
        .iter()
        .partition(|exam| exam.status(today) != ExamStatus::Closed);

    active.sort_by_key(|exam| exam.date);
    closed.sort_by_key(|exam| Reverse(exam.date));

    active.extend(closed);
    active
}
