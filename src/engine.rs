use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::Serialize;

use crate::error::{EngineError, NumericParseError, RowError};
use crate::grading::{self, round_to, ColumnIndex};
use crate::models::{
    CourseSummary, EvaluatedRecord, GradeValue, PerformanceIndicators, Snapshot,
};
use crate::table::RawTable;
use crate::topics::TopicMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    /// Spreadsheet row number; the header is row 1.
    pub row_number: usize,
    pub error: RowError,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub records: Vec<EvaluatedRecord>,
    pub failures: Vec<RowFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSummary {
    pub version: u64,
    pub accepted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    Study {
        course: String,
        hours: f64,
        topics: Vec<String>,
    },
    TargetMet {
        course: String,
    },
    Unavailable {
        course: String,
    },
    AllTargetsMet,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Study {
                course,
                hours,
                topics,
            } => write!(
                f,
                "📘 Study '{course}' for {hours:.1} hours. Focus on: {}.",
                topics.join(", ")
            ),
            Recommendation::TargetMet { course } => {
                write!(f, "✅ You have met the target for '{course}'. Great job!")
            }
            Recommendation::Unavailable { course } => {
                write!(f, "⚠️ Error processing course '{course}'.")
            }
            Recommendation::AllTargetsMet => {
                f.write_str("🎉 All targets are met. No additional study required.")
            }
        }
    }
}

/// Validate the schema once, then evaluate every row independently.
pub fn evaluate_table(table: &RawTable) -> Result<BatchOutcome, EngineError> {
    let columns = ColumnIndex::resolve(&table.headers)?;

    let mut records = Vec::with_capacity(table.rows.len());
    let mut failures = Vec::new();
    for (idx, row) in table.rows.iter().enumerate() {
        match columns.extract(row) {
            Ok(raw) => records.push(grading::evaluate_row(&raw)),
            Err(error) => {
                let row_number = idx + 2;
                tracing::warn!(row = row_number, error = %error, "skipping row");
                failures.push(RowFailure { row_number, error });
            }
        }
    }

    Ok(BatchOutcome { records, failures })
}

pub fn recommend(
    record: &EvaluatedRecord,
    topics: &TopicMap,
) -> Result<Recommendation, NumericParseError> {
    let target = record.target_grade.parse("Target Grade")?;
    let weight = record.course_weight.parse("Course Weight")?;

    let deficit = round_to(target - record.current_grade, 2);
    if deficit <= 0.0 {
        return Ok(Recommendation::TargetMet {
            course: record.course.clone(),
        });
    }

    let hours = grading::study_hours(deficit, weight)
        .ok_or(NumericParseError::NegativeScale { deficit, weight })?;
    Ok(Recommendation::Study {
        course: record.course.clone(),
        hours,
        topics: topics.topics_for(&record.course),
    })
}

/// Owns the topic map and the current snapshot.
///
/// Uploads build a complete snapshot off to the side and swap it in under the
/// write lock, so readers only ever observe a whole snapshot.
#[derive(Debug)]
pub struct GradeEngine {
    topics: TopicMap,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl GradeEngine {
    pub fn new(topics: TopicMap) -> Self {
        Self {
            topics,
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
        }
    }

    pub fn topics(&self) -> &TopicMap {
        &self.topics
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self
            .snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Evaluate an upload and replace the snapshot with its records.
    ///
    /// Schema failures and batches with no usable rows leave the previous
    /// snapshot in place.
    pub fn process_upload(
        &self,
        table: &RawTable,
        source: Option<&str>,
    ) -> Result<UploadSummary, EngineError> {
        let outcome = evaluate_table(table).inspect_err(|err| {
            tracing::warn!(source = source.unwrap_or("-"), error = %err, "upload rejected");
        })?;
        self.install(outcome, source)
    }

    /// Swap in the records of an evaluated batch as the new snapshot.
    pub fn install(
        &self,
        outcome: BatchOutcome,
        source: Option<&str>,
    ) -> Result<UploadSummary, EngineError> {
        if outcome.records.is_empty() {
            tracing::warn!(
                source = source.unwrap_or("-"),
                skipped = outcome.failures.len(),
                "upload produced no valid records"
            );
            return Err(EngineError::NoValidRows);
        }

        let accepted = outcome.records.len();
        let skipped = outcome.failures.len();

        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let version = guard.version + 1;
        *guard = Arc::new(Snapshot {
            version,
            loaded_at: Utc::now(),
            source: source.map(str::to_string),
            records: outcome.records,
        });
        drop(guard);

        tracing::info!(
            source = source.unwrap_or("-"),
            version,
            accepted,
            skipped,
            "snapshot replaced"
        );

        Ok(UploadSummary {
            version,
            accepted,
            skipped,
        })
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        recommendations_for(&self.snapshot().records, &self.topics)
    }

    pub fn recommendation_messages(&self) -> Vec<String> {
        self.recommendations()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn performance_indicators(&self) -> Result<PerformanceIndicators, EngineError> {
        performance_indicators(&self.snapshot().records)
    }

    pub fn course_summaries(&self) -> Vec<CourseSummary> {
        course_summaries(&self.snapshot().records)
    }
}

/// One recommendation per record, collapsed to a single message when nothing needs study.
pub fn recommendations_for(records: &[EvaluatedRecord], topics: &TopicMap) -> Vec<Recommendation> {
    let advice: Vec<Recommendation> = records
        .iter()
        .map(|record| {
            recommend(record, topics).unwrap_or_else(|err| {
                tracing::warn!(course = %record.course, error = %err, "cannot build recommendation");
                Recommendation::Unavailable {
                    course: record.course.clone(),
                }
            })
        })
        .collect();

    let all_met = advice
        .iter()
        .all(|item| matches!(item, Recommendation::TargetMet { .. }));
    if all_met {
        return vec![Recommendation::AllTargetsMet];
    }
    advice
}

pub fn performance_indicators(
    records: &[EvaluatedRecord],
) -> Result<PerformanceIndicators, EngineError> {
    if records.is_empty() {
        return Err(EngineError::NoData);
    }

    let current: Vec<f64> = records.iter().map(|record| record.current_grade).collect();
    let gpa: Vec<f64> = records.iter().map(|record| record.gpa).collect();

    Ok(PerformanceIndicators {
        average_current_grade: mean(&current).map(|avg| round_to(avg, 2)).unwrap_or_default(),
        average_gpa: mean(&gpa).map(|avg| round_to(avg, 2)).unwrap_or_default(),
        average_target_grade: parsed_mean(
            "Target Grade",
            records.iter().map(|record| (record, &record.target_grade)),
        ),
        average_course_weight: parsed_mean(
            "Course Weight",
            records.iter().map(|record| (record, &record.course_weight)),
        ),
    })
}

pub fn course_summaries(records: &[EvaluatedRecord]) -> Vec<CourseSummary> {
    let mut map: HashMap<&str, (usize, f64, f64, usize)> = HashMap::new();

    for record in records {
        let entry = map.entry(record.course.as_str()).or_insert((0, 0.0, 0.0, 0));
        entry.0 += 1;
        entry.1 += record.current_grade;
        entry.2 += record.gpa;
        let below = record
            .target_grade
            .parse("Target Grade")
            .map(|target| round_to(target - record.current_grade, 2) > 0.0)
            .unwrap_or(false);
        if below {
            entry.3 += 1;
        }
    }

    let mut summaries: Vec<CourseSummary> = map
        .into_iter()
        .map(|(course, (count, grade_total, gpa_total, below_target))| CourseSummary {
            course: course.to_string(),
            records: count,
            average_current_grade: round_to(grade_total / count as f64, 2),
            average_gpa: round_to(gpa_total / count as f64, 2),
            below_target,
        })
        .collect();

    summaries.sort_by(|a, b| b.records.cmp(&a.records).then_with(|| a.course.cmp(&b.course)));
    summaries
}

/// Mean of the values that parse as numbers; unparsable ones are logged and left out.
fn parsed_mean<'a>(
    field: &'static str,
    values: impl Iterator<Item = (&'a EvaluatedRecord, &'a GradeValue)>,
) -> Option<f64> {
    let parsed: Vec<f64> = values
        .filter_map(|(record, value)| match value.parse(field) {
            Ok(number) => Some(number),
            Err(err) => {
                tracing::warn!(
                    student = %record.student_name,
                    course = %record.course,
                    error = %err,
                    "excluded from average"
                );
                None
            }
        })
        .collect();
    mean(&parsed).map(|avg| round_to(avg, 2))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
