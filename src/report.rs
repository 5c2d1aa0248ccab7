use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::engine::{self, GradeEngine};

pub fn build_report(engine: &GradeEngine, generated_at: DateTime<Utc>) -> String {
    let snapshot = engine.snapshot();
    let summaries = engine::course_summaries(&snapshot.records);

    let mut output = String::new();
    let source_label = snapshot.source.as_deref().unwrap_or("no upload");

    let _ = writeln!(output, "# Grade Advisor Report");
    let _ = writeln!(
        output,
        "Generated {} from {} ({} records)",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        source_label,
        snapshot.records.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Performance Indicators");

    match engine::performance_indicators(&snapshot.records) {
        Ok(indicators) => {
            let _ = writeln!(
                output,
                "- Average current grade: {:.2}",
                indicators.average_current_grade
            );
            let _ = writeln!(output, "- Average GPA: {:.2}", indicators.average_gpa);
            let _ = writeln!(
                output,
                "- Average target grade: {}",
                optional(indicators.average_target_grade)
            );
            let _ = writeln!(
                output,
                "- Average course weight: {}",
                optional(indicators.average_course_weight)
            );
        }
        Err(_) => {
            let _ = writeln!(output, "No grades loaded.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Course Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No courses recorded.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} records (avg grade {:.2}, avg GPA {:.2}, {} below target)",
                summary.course,
                summary.records,
                summary.average_current_grade,
                summary.average_gpa,
                summary.below_target
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grades");

    if snapshot.is_empty() {
        let _ = writeln!(output, "No grades loaded.");
    } else {
        for record in snapshot.records.iter() {
            let _ = writeln!(
                output,
                "- {} / {}: {:.2}% (GPA {:.2}, target {})",
                record.student_name,
                record.course,
                record.current_grade,
                record.gpa,
                record.target_grade
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Course of Action");
    for recommendation in engine::recommendations_for(&snapshot.records, engine.topics()) {
        let _ = writeln!(output, "- {recommendation}");
    }

    output
}

fn optional(value: Option<f64>) -> String {
    value
        .map(|number| format!("{number:.2}"))
        .unwrap_or_else(|| "n/a".to_string())
}
