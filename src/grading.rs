use crate::error::{EngineError, RowError};
use crate::models::{EvaluatedRecord, GradeValue, RawRow};
use crate::table::Cell;

pub const MAX_SUB_SCORE: f64 = 5.0;
pub const TOTAL_POSSIBLE: f64 = 30.0;

pub const STUDENT_NAME: &str = "Student Name";
pub const COURSE: &str = "Course";
pub const QUIZZES: [&str; 3] = ["Quiz 1", "Quiz 2", "Quiz 3"];
pub const ASSIGNMENTS: [&str; 3] = ["Assignment 1", "Assignment 2", "Assignment 3"];
pub const TARGET_GRADE: &str = "Target Grade";
pub const COURSE_WEIGHT: &str = "Course Weight";

pub const REQUIRED_COLUMNS: [&str; 10] = [
    STUDENT_NAME,
    COURSE,
    QUIZZES[0],
    QUIZZES[1],
    QUIZZES[2],
    ASSIGNMENTS[0],
    ASSIGNMENTS[1],
    ASSIGNMENTS[2],
    TARGET_GRADE,
    COURSE_WEIGHT,
];

/// Lower bound of each GPA band, checked top-down. Anything under 60 earns 0.0.
const GPA_BANDS: [(f64, f64); 7] = [
    (90.0, 4.0),
    (85.0, 3.67),
    (80.0, 3.33),
    (75.0, 3.0),
    (70.0, 2.67),
    (65.0, 2.33),
    (60.0, 2.0),
];

pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, MAX_SUB_SCORE)
}

pub fn gpa_for(percentage: f64) -> f64 {
    GPA_BANDS
        .iter()
        .find(|(floor, _)| percentage >= *floor)
        .map(|(_, gpa)| *gpa)
        .unwrap_or(0.0)
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn evaluate_row(row: &RawRow) -> EvaluatedRecord {
    let total_obtained: f64 = row
        .quizzes
        .iter()
        .chain(row.assignments.iter())
        .map(|score| clamp_score(*score))
        .sum();
    let percentage = (total_obtained / TOTAL_POSSIBLE * 100.0).min(100.0);

    EvaluatedRecord {
        student_name: row.student_name.clone(),
        course: row.course.clone(),
        current_grade: round_to(percentage, 2),
        gpa: gpa_for(percentage),
        target_grade: row.target_grade.clone(),
        course_weight: row.course_weight.clone(),
    }
}

/// Recommended study time: twice the square root of the weighted deficit, to one decimal.
pub fn study_hours(deficit: f64, course_weight: f64) -> Option<f64> {
    let scaled = deficit * course_weight;
    if !scaled.is_finite() || scaled < 0.0 {
        return None;
    }
    Some(round_to(scaled.sqrt() * 2.0, 1))
}

/// Positions of the required columns, resolved once per upload.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    student_name: usize,
    course: usize,
    quizzes: [usize; 3],
    assignments: [usize; 3],
    target_grade: usize,
    course_weight: usize,
}

impl ColumnIndex {
    pub fn resolve(headers: &[String]) -> Result<Self, EngineError> {
        let find = |name: &str| headers.iter().position(|header| header == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| find(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::Schema { missing });
        }

        let at = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            student_name: at(STUDENT_NAME),
            course: at(COURSE),
            quizzes: QUIZZES.map(at),
            assignments: ASSIGNMENTS.map(at),
            target_grade: at(TARGET_GRADE),
            course_weight: at(COURSE_WEIGHT),
        })
    }

    pub fn extract(&self, row: &[Cell]) -> Result<RawRow, RowError> {
        let cell = |index: usize| row.get(index).unwrap_or(&Cell::Empty);

        let mut quizzes = [0.0; 3];
        for (slot, (index, column)) in quizzes.iter_mut().zip(self.quizzes.iter().zip(QUIZZES)) {
            *slot = score(cell(*index), column)?;
        }
        let mut assignments = [0.0; 3];
        for (slot, (index, column)) in assignments
            .iter_mut()
            .zip(self.assignments.iter().zip(ASSIGNMENTS))
        {
            *slot = score(cell(*index), column)?;
        }

        Ok(RawRow {
            student_name: cell(self.student_name).to_text(),
            course: cell(self.course).to_text(),
            quizzes,
            assignments,
            target_grade: carried(cell(self.target_grade)),
            course_weight: carried(cell(self.course_weight)),
        })
    }
}

/// Blank cells score zero; anything else that is not a finite number rejects the row.
fn score(cell: &Cell, column: &'static str) -> Result<f64, RowError> {
    match cell {
        Cell::Empty => Ok(0.0),
        Cell::Number(value) if value.is_finite() => Ok(*value),
        Cell::Number(value) => Err(RowError::NotNumeric {
            column,
            value: value.to_string(),
        }),
        Cell::Text(text) => Err(RowError::NotNumeric {
            column,
            value: text.clone(),
        }),
    }
}

fn carried(cell: &Cell) -> GradeValue {
    match cell {
        Cell::Number(value) => GradeValue::Number(*value),
        other => GradeValue::Text(other.to_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(quizzes: [f64; 3], assignments: [f64; 3]) -> RawRow {
        RawRow {
            student_name: "Avery Lee".to_string(),
            course: "Calculus".to_string(),
            quizzes,
            assignments,
            target_grade: GradeValue::Number(85.0),
            course_weight: GradeValue::Number(3.0),
        }
    }

    fn headers() -> Vec<String> {
        REQUIRED_COLUMNS.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn clamps_into_score_range() {
        assert_eq!(clamp_score(-5.0), 0.0);
        assert_eq!(clamp_score(7.0), 5.0);
        assert_eq!(clamp_score(3.0), 3.0);
    }

    #[test]
    fn gpa_follows_band_boundaries() {
        assert_eq!(gpa_for(100.0), 4.0);
        assert_eq!(gpa_for(90.0), 4.0);
        assert_eq!(gpa_for(89.99), 3.67);
        assert_eq!(gpa_for(85.0), 3.67);
        assert_eq!(gpa_for(80.0), 3.33);
        assert_eq!(gpa_for(75.0), 3.0);
        assert_eq!(gpa_for(70.0), 2.67);
        assert_eq!(gpa_for(65.0), 2.33);
        assert_eq!(gpa_for(60.0), 2.0);
        assert_eq!(gpa_for(59.99), 0.0);
        assert_eq!(gpa_for(0.0), 0.0);
    }

    #[test]
    fn perfect_scores_reach_full_marks() {
        let record = evaluate_row(&sample_row([5.0; 3], [5.0; 3]));
        assert_eq!(record.current_grade, 100.0);
        assert_eq!(record.gpa, 4.0);
    }

    #[test]
    fn half_marks_fall_below_passing_band() {
        let record = evaluate_row(&sample_row([3.0; 3], [2.0; 3]));
        assert_eq!(record.current_grade, 50.0);
        assert_eq!(record.gpa, 0.0);
    }

    #[test]
    fn out_of_range_scores_are_clamped_not_rejected() {
        let record = evaluate_row(&sample_row([9.0, -2.0, 5.0], [12.0, 5.0, 5.0]));
        assert_eq!(record.current_grade, round_to(25.0 / 30.0 * 100.0, 2));
        assert!((0.0..=100.0).contains(&record.current_grade));
        assert_eq!(record.current_grade, 83.33);
        assert_eq!(record.gpa, 3.33);
    }

    #[test]
    fn carried_fields_pass_through_untouched() {
        let mut row = sample_row([4.0; 3], [4.0; 3]);
        row.student_name = "  Kiara Patel ".to_string();
        row.target_grade = GradeValue::Text(" 90 ".to_string());
        let record = evaluate_row(&row);
        assert_eq!(record.student_name, "  Kiara Patel ");
        assert_eq!(record.target_grade, GradeValue::Text(" 90 ".to_string()));
        assert_eq!(record.course_weight, GradeValue::Number(3.0));
    }

    #[test]
    fn study_hours_scale_with_square_root() {
        assert_eq!(study_hours(20.0, 4.0), Some(17.9));
        assert_eq!(study_hours(0.5, 2.0), Some(2.0));
        assert_eq!(study_hours(10.0, -1.0), None);
    }

    #[test]
    fn resolve_reports_every_missing_column() {
        let mut headers = headers();
        headers.retain(|name| name != COURSE_WEIGHT && name != QUIZZES[1]);

        match ColumnIndex::resolve(&headers) {
            Err(EngineError::Schema { missing }) => {
                assert_eq!(missing, vec!["Quiz 2".to_string(), "Course Weight".to_string()]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn extract_reads_columns_in_any_order() {
        let mut headers = headers();
        headers.reverse();
        let index = ColumnIndex::resolve(&headers).unwrap();
        let row = vec![
            Cell::Number(2.0),
            Cell::Number(80.0),
            Cell::Number(5.0),
            Cell::Number(4.0),
            Cell::Number(3.0),
            Cell::Number(2.0),
            Cell::Number(1.0),
            Cell::Number(0.0),
            Cell::Text("Physics".to_string()),
            Cell::Text("Jules Moreno".to_string()),
        ];

        let raw = index.extract(&row).unwrap();
        assert_eq!(raw.student_name, "Jules Moreno");
        assert_eq!(raw.course, "Physics");
        assert_eq!(raw.quizzes, [0.0, 1.0, 2.0]);
        assert_eq!(raw.assignments, [3.0, 4.0, 5.0]);
        assert_eq!(raw.target_grade, GradeValue::Number(80.0));
        assert_eq!(raw.course_weight, GradeValue::Number(2.0));
    }

    #[test]
    fn extract_rejects_text_scores() {
        let index = ColumnIndex::resolve(&headers()).unwrap();
        let mut row = vec![Cell::Number(4.0); 10];
        row[3] = Cell::Text("absent".to_string());
        assert_eq!(
            index.extract(&row),
            Err(RowError::NotNumeric {
                column: "Quiz 2",
                value: "absent".to_string()
            })
        );

        row[3] = Cell::Number(f64::INFINITY);
        assert!(matches!(
            index.extract(&row),
            Err(RowError::NotNumeric { column: "Quiz 2", .. })
        ));
    }

    #[test]
    fn blank_scores_count_as_zero() {
        let index = ColumnIndex::resolve(&headers()).unwrap();
        let mut row = vec![Cell::Number(5.0); 10];
        row[0] = Cell::Text("Avery".to_string());
        row[1] = Cell::Text("Math".to_string());
        row[2] = Cell::Empty;

        let raw = index.extract(&row).unwrap();
        assert_eq!(raw.quizzes, [0.0, 5.0, 5.0]);

        let short_row = vec![Cell::Text("Avery".to_string()), Cell::Text("Math".to_string())];
        let raw = index.extract(&short_row).unwrap();
        assert_eq!(raw.quizzes, [0.0; 3]);
        assert_eq!(raw.assignments, [0.0; 3]);
        assert_eq!(raw.target_grade, GradeValue::Text(String::new()));
    }
}
