use std::fmt::Write;

use chrono::NaiveDate;

use crate::data::Dataset;
use crate::grade::format_grade;
use crate::models::{Exam, ExamStatus};
use crate::ranking::{self, resolved_points};
use crate::status;

#[derive(Debug, Clone, PartialEq)]
pub struct ExamPointsSummary {
    pub title: String,
    pub date: NaiveDate,
    pub scored_tips: usize,
    pub avg_points: f64,
}

/// Tip accuracy per closed exam, counting every tip that has both a guess
/// and an actual grade.
pub fn summarize_closed_exams(dataset: &Dataset, today: NaiveDate) -> Vec<ExamPointsSummary> {
    let mut summaries: Vec<ExamPointsSummary> = dataset
        .exams
        .iter()
        .filter(|exam| exam.status(today) == ExamStatus::Closed)
        .map(|exam| summarize_exam(exam, dataset))
        .collect();

    summaries.sort_by(|a, b| b.date.cmp(&a.date));
    summaries
}

fn summarize_exam(exam: &Exam, dataset: &Dataset) -> ExamPointsSummary {
    let scored: Vec<u8> = dataset
        .predictions
        .iter()
        .filter(|prediction| prediction.exam_id == exam.id)
        .flat_map(|prediction| {
            let grade = exam.grade_for(prediction.student_id);
            [
                resolved_points(prediction.points1, prediction.prediction1, grade),
                resolved_points(prediction.points2, prediction.prediction2, grade),
            ]
        })
        .flatten()
        .collect();

    let total: u32 = scored.iter().map(|&value| u32::from(value)).sum();
    ExamPointsSummary {
        title: exam.title.clone(),
        date: exam.date,
        scored_tips: scored.len(),
        avg_points: if scored.is_empty() {
            0.0
        } else {
            f64::from(total) / scored.len() as f64
        },
    }
}

pub fn build_report(dataset: &Dataset, today: NaiveDate) -> String {
    let leaderboard = ranking::global_leaderboard(
        &dataset.exams,
        &dataset.users,
        &dataset.predictions,
        today,
    );
    let summaries = summarize_closed_exams(dataset, today);

    let mut output = String::new();

    let _ = writeln!(output, "# Grade Prediction Report");
    let _ = writeln!(output, "Generated for {}", today);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Exams");

    if dataset.exams.is_empty() {
        let _ = writeln!(output, "No exams scheduled.");
    } else {
        for exam in status::order_for_display(&dataset.exams, today) {
            let state = exam.status(today);
            let tips = if exam.accepts_predictions(today) {
                "predictions open"
            } else {
                "predictions closed"
            };
            let _ = writeln!(
                output,
                "- {} ({}) on {}: {}, {}",
                exam.title,
                exam.subject,
                exam.date,
                state.label(),
                tips
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Leaderboard");

    if leaderboard.is_empty() {
        let _ = writeln!(output, "No students enrolled.");
    } else {
        for entry in leaderboard.iter() {
            let _ = writeln!(
                output,
                "{}. {} with {} points",
                entry.rank, entry.student_name, entry.total_points
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Closed Exam Accuracy");

    if summaries.is_empty() {
        let _ = writeln!(output, "No closed exams yet.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {} on {}: {} scored tips (avg {:.1} points)",
                summary.title, summary.date, summary.scored_tips, summary.avg_points
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Scale");
    let scale: Vec<String> = crate::grade::grade_domain()
        .into_iter()
        .map(|grade| format_grade(Some(grade)))
        .collect();
    let _ = writeln!(output, "{}", scale.join(", "));

    output
}
