use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use grade_predictor::eligibility::{find_prediction, has_both_tips, has_no_tips};
use grade_predictor::grade::{format_grade, grade_domain};
use grade_predictor::{data, ranking, report, status, telemetry};

#[derive(Parser)]
#[command(name = "grade-predictor")]
#[command(about = "Score exam grade predictions and rank students", long_about = None)]
struct Cli {
    /// Directory holding exams.csv, grades.csv, users.csv and predictions.csv
    #[arg(long, global = true, env = "GRADE_PREDICTOR_DATA", default_value = "data")]
    data_dir: PathBuf,
    /// Calendar date to evaluate exam status against (defaults to today)
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,
    #[arg(long, global = true, env = "GRADE_PREDICTOR_LOG", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample class to a directory
    Seed {
        #[arg(long)]
        out: PathBuf,
    },
    /// List exams with their status
    Exams,
    /// Print the global leaderboard
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Show one student's result for an exam
    Result {
        #[arg(long)]
        exam: Uuid,
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        json: bool,
    },
    /// Print one student's results across closed exams
    History {
        #[arg(long)]
        student: Uuid,
    },
    /// Print the valid grade scale
    Grades,
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    data::parse_calendar_date(raw)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level)?;

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    info!(%today, "evaluating");

    match cli.command {
        Commands::Seed { out } => {
            data::seed(&out, today)?;
            println!("Sample data written to {}.", out.display());
        }
        Commands::Grades => {
            let scale: Vec<String> = grade_domain()
                .into_iter()
                .map(|grade| format_grade(Some(grade)))
                .collect();
            println!("{}", scale.join(" "));
        }
        Commands::Exams => {
            let dataset = data::load(&cli.data_dir)?;
            if dataset.exams.is_empty() {
                println!("No exams found.");
                return Ok(());
            }

            for exam in status::order_for_display(&dataset.exams, today) {
                let accepts = if exam.accepts_predictions(today) {
                    "accepting predictions"
                } else {
                    "locked"
                };
                println!(
                    "- {} [{}] {} ({}) on {}: {}",
                    exam.id,
                    exam.status(today).label(),
                    exam.title,
                    exam.subject,
                    exam.date,
                    accepts
                );
            }
        }
        Commands::Leaderboard { limit, json } => {
            let dataset = data::load(&cli.data_dir)?;
            let board = ranking::global_leaderboard(
                &dataset.exams,
                &dataset.users,
                &dataset.predictions,
                today,
            );

            if json {
                let rows: Vec<_> = board.iter().take(limit).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }

            if board.is_empty() {
                println!("No students found.");
                return Ok(());
            }

            println!("Leaderboard:");
            for entry in board.iter().take(limit) {
                println!(
                    "{:>3}. {} with {} points",
                    entry.rank, entry.student_name, entry.total_points
                );
            }
        }
        Commands::Result {
            exam,
            student,
            json,
        } => {
            let dataset = data::load(&cli.data_dir)?;
            let exam = dataset
                .exam(exam)
                .with_context(|| format!("no exam with id {exam}"))?;
            let result =
                ranking::exam_result(exam, student, &dataset.users, &dataset.predictions)
                    .with_context(|| format!("{student} is not a student"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            let tips = if has_no_tips(&dataset.predictions, exam.id, student) {
                "no tips"
            } else if has_both_tips(&dataset.predictions, exam.id, student) {
                "both tips"
            } else {
                "one tip"
            };

            println!("{} ({}) on {}", exam.title, exam.status(today).label(), exam.date);
            println!("Grade: {}", format_grade(result.grade));
            println!(
                "Before exam: {} ({} points)",
                format_grade(result.prediction1),
                points_label(result.points1)
            );
            println!(
                "After exam: {} ({} points)",
                format_grade(result.prediction2),
                points_label(result.points2)
            );
            println!(
                "Rank {} with {} points, {}",
                result.rank, result.total_points, tips
            );
        }
        Commands::History { student } => {
            let dataset = data::load(&cli.data_dir)?;
            let name = dataset
                .user(student)
                .map(|user| user.name.clone())
                .with_context(|| format!("no user with id {student}"))?;
            let history = ranking::student_history(
                &dataset.exams,
                student,
                &dataset.users,
                &dataset.predictions,
                today,
            );

            if history.is_empty() {
                println!("No closed exams for {name}.");
                return Ok(());
            }

            println!("Closed exams for {name}:");
            for (exam, result) in history {
                let tipped = find_prediction(&dataset.predictions, exam.id, student).is_some();
                println!(
                    "- {} on {}: grade {}, rank {} with {} points{}",
                    exam.title,
                    exam.date,
                    format_grade(result.grade),
                    result.rank,
                    result.total_points,
                    if tipped { "" } else { " (no prediction)" }
                );
            }
        }
        Commands::Report { out } => {
            let dataset = data::load(&cli.data_dir)?;
            let report = report::build_report(&dataset, today);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn points_label(points: Option<u8>) -> String {
    points.map_or_else(|| "-".to_string(), |value| value.to_string())
}
