use std::collections::HashMap;
use std::path::Path;

use crate::error::EngineError;
use crate::table::RawTable;

pub const FALLBACK_TOPIC: &str = "General Review";

const COURSE_COLUMN: &str = "Course";
const TOPIC_COLUMN: &str = "Topic";

/// Study topics per course, in the order they appear in the reference sheet.
#[derive(Debug, Clone, Default)]
pub struct TopicMap {
    topics: HashMap<String, Vec<String>>,
}

impl TopicMap {
    /// Load the reference sheet, degrading to an empty map when it is unusable.
    pub fn load(path: &Path) -> Self {
        let table = match RawTable::from_path(path) {
            Ok(table) => table,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to load study topics");
                return Self::default();
            }
        };

        match Self::from_table(&table) {
            Ok(map) => {
                tracing::info!(path = %path.display(), courses = map.len(), "study topics loaded");
                map
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "study topics sheet is unusable");
                Self::default()
            }
        }
    }

    pub fn from_table(table: &RawTable) -> Result<Self, EngineError> {
        let course_idx = table.column(COURSE_COLUMN);
        let topic_idx = table.column(TOPIC_COLUMN);
        let (Some(course_idx), Some(topic_idx)) = (course_idx, topic_idx) else {
            let missing = [(COURSE_COLUMN, course_idx), (TOPIC_COLUMN, topic_idx)]
                .into_iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(EngineError::Schema { missing });
        };

        let mut topics: HashMap<String, Vec<String>> = HashMap::new();
        for row in &table.rows {
            let course = row.get(course_idx).map(|cell| cell.to_text()).unwrap_or_default();
            let topic = row.get(topic_idx).map(|cell| cell.to_text()).unwrap_or_default();
            if course.is_empty() || topic.is_empty() {
                continue;
            }
            topics.entry(course).or_default().push(topic);
        }

        Ok(Self { topics })
    }

    pub fn topics_for(&self, course: &str) -> Vec<String> {
        self.topics
            .get(course)
            .cloned()
            .unwrap_or_else(|| vec![FALLBACK_TOPIC.to_string()])
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl FromIterator<(String, String)> for TopicMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut topics: HashMap<String, Vec<String>> = HashMap::new();
        for (course, topic) in iter {
            topics.entry(course).or_default().push(topic);
        }
        Self { topics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_topics_in_sheet_order() {
        let data = b"Course,Topic\nMath,Algebra\nPhysics,Kinematics\nMath,Geometry\nMath,Calculus\n";
        let table = RawTable::from_bytes(data, "topics.csv").unwrap();
        let map = TopicMap::from_table(&table).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.topics_for("Math"), vec!["Algebra", "Geometry", "Calculus"]);
        assert_eq!(map.topics_for("Physics"), vec!["Kinematics"]);
    }

    #[test]
    fn unknown_course_falls_back_to_general_review() {
        let map = TopicMap::default();
        assert_eq!(map.topics_for("History"), vec![FALLBACK_TOPIC]);
    }

    #[test]
    fn course_lookup_is_exact() {
        let map: TopicMap = [("Math".to_string(), "Algebra".to_string())]
            .into_iter()
            .collect();
        assert_eq!(map.topics_for("math"), vec![FALLBACK_TOPIC]);
        assert_eq!(map.topics_for("Math "), vec![FALLBACK_TOPIC]);
    }

    #[test]
    fn missing_topic_column_is_a_schema_error() {
        let table = RawTable::from_bytes(b"Course,Subject\nMath,Algebra\n", "topics.csv").unwrap();
        match TopicMap::from_table(&table) {
            Err(EngineError::Schema { missing }) => assert_eq!(missing, vec!["Topic"]),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_file_degrades_to_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let map = TopicMap::load(&dir.path().join("missing.xlsx"));
        assert!(map.is_empty());
        assert_eq!(map.topics_for("Math"), vec![FALLBACK_TOPIC]);
    }

    #[test]
    fn loads_workbook_reference_sheet_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study_topics.xlsx");
        let bytes = crate::test_support::workbook(&[
            &["Course", "Topic"],
            &["Math", "Algebra"],
            &["Biology", "Cells"],
            &["Math", "Geometry"],
        ]);
        std::fs::write(&path, bytes).unwrap();

        let map = TopicMap::load(&path);
        assert_eq!(map.len(), 2);
        assert_eq!(map.topics_for("Math"), vec!["Algebra", "Geometry"]);
        assert_eq!(map.topics_for("Biology"), vec!["Cells"]);
    }

    #[test]
    fn loads_csv_reference_sheet_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study_topics.csv");
        std::fs::write(&path, "Course,Topic\nChemistry,Stoichiometry\n").unwrap();

        let map = TopicMap::load(&path);
        assert_eq!(map.topics_for("Chemistry"), vec!["Stoichiometry"]);
    }
}
