use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::NumericParseError;

/// A target grade or course weight exactly as it arrived in the upload.
///
/// These are carried through evaluation untouched and only interpreted when
/// recommendations or statistics are computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GradeValue {
    Number(f64),
    Text(String),
}

impl GradeValue {
    pub fn parse(&self, field: &'static str) -> Result<f64, NumericParseError> {
        let invalid = |value: &str| NumericParseError::Invalid {
            field,
            value: value.to_string(),
        };
        match self {
            GradeValue::Number(value) if value.is_finite() => Ok(*value),
            GradeValue::Number(value) => Err(invalid(&value.to_string())),
            GradeValue::Text(text) => match text.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(invalid(text)),
            },
        }
    }
}

impl fmt::Display for GradeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeValue::Number(value) => write!(f, "{value}"),
            GradeValue::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub student_name: String,
    pub course: String,
    pub quizzes: [f64; 3],
    pub assignments: [f64; 3],
    pub target_grade: GradeValue,
    pub course_weight: GradeValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedRecord {
    #[serde(rename = "Student Name")]
    pub student_name: String,
    #[serde(rename = "Course")]
    pub course: String,
    #[serde(rename = "Current Grade")]
    pub current_grade: f64,
    #[serde(rename = "GPA")]
    pub gpa: f64,
    #[serde(rename = "Target Grade")]
    pub target_grade: GradeValue,
    #[serde(rename = "Course Weight")]
    pub course_weight: GradeValue,
}

/// The evaluated records of the most recent accepted upload.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    pub source: Option<String>,
    pub records: Vec<EvaluatedRecord>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            version: 0,
            loaded_at: Utc::now(),
            source: None,
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceIndicators {
    pub average_current_grade: f64,
    pub average_gpa: f64,
    pub average_target_grade: Option<f64>,
    pub average_course_weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    pub course: String,
    pub records: usize,
    pub average_current_grade: f64,
    pub average_gpa: f64,
    pub below_target: usize,
}
