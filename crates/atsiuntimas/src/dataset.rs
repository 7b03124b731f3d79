//! Schedule document model and its validation.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::FetchError;

/// One month of schedule data for every teacher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleDataset {
    pub year: i32,

    /// Month number, 1-12
    pub month: u32,

    /// Localized month name used in titles (e.g. "Balandis")
    #[serde(rename = "monthName", default)]
    pub month_name: String,

    /// Teachers in display order
    pub teachers: Vec<Teacher>,
}

/// A teacher and their status code per day of the month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Teacher {
    pub name: String,

    /// Day number -> status code. JSON keys are the day numbers as strings.
    #[serde(default)]
    pub schedule: BTreeMap<u32, String>,
}

impl Teacher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schedule: BTreeMap::new(),
        }
    }

    /// Status code for a day; a missing entry is the empty status.
    pub fn status(&self, day: u32) -> &str {
        self.schedule.get(&day).map(String::as_str).unwrap_or("")
    }
}

impl ScheduleDataset {
    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn teacher(&self, index: usize) -> Option<&Teacher> {
        self.teachers.get(index)
    }

    /// Title shown above the calendar, e.g. "2025 Balandis".
    pub fn title(&self) -> String {
        if self.month_name.is_empty() {
            format!("{}-{:02}", self.year, self.month)
        } else {
            format!("{} {}", self.year, self.month_name)
        }
    }
}

/// Number of days in a Gregorian month, or 0 when the month does not exist.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match next {
        Some(next) => (next - first).num_days() as u32,
        // Last representable month: count forward instead
        None => (first.day()..=31)
            .take_while(|d| NaiveDate::from_ymd_opt(year, month, *d).is_some())
            .count() as u32,
    }
}

/// Fields a document must carry to be accepted.
const REQUIRED_FIELDS: &[&str] = &["teachers", "year", "month"];

/// Parse and validate a downloaded body as a schedule document.
///
/// Callers have already rejected markup; anything failing here is a schema
/// error and is not worth retrying against another candidate.
pub fn parse_document(body: &str) -> Result<ScheduleDataset, FetchError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| FetchError::Schema(format!("not valid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| FetchError::Schema("top-level value is not an object".to_string()))?;

    for field in REQUIRED_FIELDS {
        if object.get(*field).map_or(true, |v| v.is_null()) {
            return Err(FetchError::Schema(format!("missing field '{}'", field)));
        }
    }

    let dataset: ScheduleDataset =
        serde_json::from_value(value).map_err(|e| FetchError::Schema(e.to_string()))?;

    validate(&dataset)?;
    Ok(dataset)
}

fn validate(dataset: &ScheduleDataset) -> Result<(), FetchError> {
    let days = dataset.days_in_month();
    if days == 0 {
        return Err(FetchError::Schema(format!(
            "{}-{} is not a calendar month",
            dataset.year, dataset.month
        )));
    }

    for teacher in &dataset.teachers {
        if let Some(day) = teacher.schedule.keys().find(|d| **d == 0 || **d > days) {
            return Err(FetchError::Schema(format!(
                "teacher '{}' has day {} outside 1..={}",
                teacher.name, day, days
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "year": 2025,
            "month": 4,
            "monthName": "Balandis",
            "teachers": [
                {"name": "Ona", "schedule": {"1": "D1", "2": "P", "3": "DN"}},
                {"name": "Rasa", "schedule": {"7": "M"}}
            ]
        }"#
    }

    #[test]
    fn test_parse_document_valid() {
        let dataset = parse_document(sample_json()).unwrap();

        assert_eq!(dataset.year, 2025);
        assert_eq!(dataset.month, 4);
        assert_eq!(dataset.month_name, "Balandis");
        assert_eq!(dataset.teachers.len(), 2);
        assert_eq!(dataset.teachers[0].name, "Ona");
        assert_eq!(dataset.teachers[0].status(1), "D1");
        assert_eq!(dataset.teachers[0].status(3), "DN");
        assert_eq!(dataset.teachers[1].status(7), "M");
    }

    #[test]
    fn test_missing_day_is_empty_status() {
        let dataset = parse_document(sample_json()).unwrap();
        assert_eq!(dataset.teachers[1].status(1), "");
    }

    #[test]
    fn test_teacher_order_preserved() {
        let dataset = parse_document(sample_json()).unwrap();
        let names: Vec<_> = dataset.teachers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Ona", "Rasa"]);
    }

    #[test]
    fn test_missing_teachers_is_schema_error() {
        let result = parse_document(r#"{"year": 2025, "month": 4, "monthName": "Balandis"}"#);
        match result {
            Err(FetchError::Schema(msg)) => assert!(msg.contains("teachers")),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_year_is_schema_error() {
        let result = parse_document(r#"{"month": 4, "teachers": []}"#);
        assert!(matches!(result, Err(FetchError::Schema(_))));
    }

    #[test]
    fn test_null_month_is_schema_error() {
        let result = parse_document(r#"{"year": 2025, "month": null, "teachers": []}"#);
        assert!(matches!(result, Err(FetchError::Schema(_))));
    }

    #[test]
    fn test_not_json_is_schema_error() {
        let result = parse_document("year=2025");
        assert!(matches!(result, Err(FetchError::Schema(_))));
    }

    #[test]
    fn test_invalid_month_rejected() {
        let result = parse_document(r#"{"year": 2025, "month": 13, "teachers": []}"#);
        assert!(matches!(result, Err(FetchError::Schema(_))));
    }

    #[test]
    fn test_day_outside_month_rejected() {
        let json = r#"{"year": 2025, "month": 2, "teachers": [{"name": "Ona", "schedule": {"29": "D1"}}]}"#;
        match parse_document(json) {
            Err(FetchError::Schema(msg)) => assert!(msg.contains("29")),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_day_rejected() {
        let json = r#"{"year": 2025, "month": 2, "teachers": [{"name": "Ona", "schedule": {"x": "D1"}}]}"#;
        assert!(matches!(parse_document(json), Err(FetchError::Schema(_))));
    }

    #[test]
    fn test_month_name_optional() {
        let dataset = parse_document(r#"{"year": 2025, "month": 1, "teachers": []}"#).unwrap();
        assert!(dataset.month_name.is_empty());
        assert_eq!(dataset.title(), "2025-01");
    }

    #[test]
    fn test_serialization_keeps_wire_names() {
        let dataset = parse_document(sample_json()).unwrap();
        let json = serde_json::to_string(&dataset).unwrap();

        assert!(json.contains("\"monthName\":\"Balandis\""));
        assert!(json.contains("\"1\":\"D1\""));
        assert_eq!(parse_document(&json).unwrap(), dataset);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(2025, 0), 0);
        assert_eq!(days_in_month(2025, 13), 0);
    }
}
