use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Exam, ExamStatus, Prediction};

/// Whether a prediction may be created or edited while the exam is in `status`.
pub fn can_submit(status: ExamStatus) -> bool {
    match status {
        ExamStatus::Open | ExamStatus::Evaluation => true,
        ExamStatus::Closed => false,
    }
}

impl Exam {
    pub fn accepts_predictions(&self, today: NaiveDate) -> bool {
        can_submit(self.status(today))
    }
}

pub fn find_prediction(
    predictions: &[Prediction],
    exam_id: Uuid,
    student_id: Uuid,
) -> Option<&Prediction> {
    predictions
        .iter()
        .find(|prediction| prediction.matches(exam_id, student_id))
}

/// True when the student has no record for the exam, or an empty one.
pub fn has_no_tips(predictions: &[Prediction], exam_id: Uuid, student_id: Uuid) -> bool {
    find_prediction(predictions, exam_id, student_id)
        .map_or(true, |p| p.prediction1.is_none() && p.prediction2.is_none())
}

pub fn has_both_tips(predictions: &[Prediction], exam_id: Uuid, student_id: Uuid) -> bool {
    find_prediction(predictions, exam_id, student_id)
        .is_some_and(|p| p.prediction1.is_some() && p.prediction2.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grade::Grade;
    use chrono::Duration;
    use std::collections::HashMap;

    fn prediction(exam_id: Uuid, student_id: Uuid, p1: Option<f64>, p2: Option<f64>) -> Prediction {
        Prediction {
            exam_id,
            student_id,
            prediction1: p1.and_then(Grade::from_f64),
            prediction2: p2.and_then(Grade::from_f64),
            points1: None,
            points2: None,
        }
    }

    #[test]
    fn only_closed_exams_reject_predictions() {
        assert!(can_submit(ExamStatus::Open));
        assert!(can_submit(ExamStatus::Evaluation));
        assert!(!can_submit(ExamStatus::Closed));
    }

    #[test]
    fn exam_gate_uses_resolved_status() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
        let mut exam = Exam {
            id: Uuid::new_v4(),
            title: "Algebra".to_string(),
            subject: "Math".to_string(),
            description: None,
            date: today - Duration::days(2),
            is_closed: false,
            closed_at: None,
            grades: HashMap::new(),
        };
        assert!(exam.accepts_predictions(today));
        exam.is_closed = true;
        assert!(!exam.accepts_predictions(today));
    }

    #[test]
    fn missing_and_empty_records_both_count_as_no_tips() {
        let exam_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        let other_student = Uuid::new_v4();
        let predictions = vec![
            prediction(exam_id, student_id, None, None),
            prediction(exam_id, other_student, Some(4.5), None),
        ];

        assert!(has_no_tips(&predictions, exam_id, student_id));
        assert!(has_no_tips(&predictions, Uuid::new_v4(), student_id));
        assert!(!has_no_tips(&predictions, exam_id, other_student));
        assert!(!has_both_tips(&predictions, exam_id, other_student));
    }

    #[test]
    fn both_tips_requires_both_predictions() {
        let exam_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        let predictions = vec![prediction(exam_id, student_id, Some(4.0), Some(4.25))];

        assert!(has_both_tips(&predictions, exam_id, student_id));
        assert!(!has_no_tips(&predictions, exam_id, student_id));
        assert!(!has_both_tips(&[], exam_id, student_id));
    }
}
