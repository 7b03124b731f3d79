//! View models handed to the renderers.
//!
//! Both views merge the fetched schedule with local substitution marks; the
//! renderers only decide how cells look.

use atsiuntimas::ScheduleDataset;
use chrono::Weekday;
use serde::Serialize;

use crate::annotations::{AnnotationKey, Annotations};
use crate::holidays;
use crate::status::{classify, display_text, DisplayCategory};

/// Monday-first weekday abbreviations.
pub const WEEKDAY_LABELS: [&str; 7] = ["Pr", "An", "Tr", "Kt", "Pn", "Št", "Sk"];

pub fn weekday_label(weekday: Weekday) -> &'static str {
    WEEKDAY_LABELS[weekday.num_days_from_monday() as usize]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub day: u32,
    pub weekday: &'static str,
    pub category: DisplayCategory,
    pub text: String,
    pub editable: bool,
}

/// One teacher's month, every day included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarView {
    pub title: String,
    pub teacher: usize,
    pub teacher_name: String,
    /// Empty slots before day 1 in a Monday-first week
    pub leading_blanks: u32,
    pub cells: Vec<DayCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridColumn {
    pub day: u32,
    pub weekday: &'static str,
    /// Last column of its week (Friday); renderers draw a separator after it
    pub ends_week: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow {
    pub teacher: usize,
    pub name: String,
    pub cells: Vec<DayCell>,
}

/// All teachers over working days only; weekends and holidays have no column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridView {
    pub title: String,
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
}

fn day_cell(
    dataset: &ScheduleDataset,
    annotations: &Annotations,
    teacher: usize,
    day: u32,
) -> Option<DayCell> {
    let (year, month) = (dataset.year, dataset.month);
    let weekday = holidays::weekday(year, month, day)?;
    let status = dataset.teacher(teacher)?.status(day);
    let weekend = holidays::is_weekend(year, month, day);
    let holiday = holidays::is_holiday(year, month, day);
    let marked = annotations.is_marked(&AnnotationKey::for_dataset(dataset, teacher, day));

    let classification = classify(status, weekend, holiday, marked);
    Some(DayCell {
        day,
        weekday: weekday_label(weekday),
        category: classification.category,
        text: display_text(status, weekend, holiday, marked),
        editable: classification.editable,
    })
}

/// Calendar of one teacher, or `None` if the index is out of range.
pub fn calendar_view(
    dataset: &ScheduleDataset,
    annotations: &Annotations,
    teacher: usize,
) -> Option<CalendarView> {
    let name = dataset.teacher(teacher)?.name.clone();
    let leading_blanks = holidays::weekday(dataset.year, dataset.month, 1)
        .map(|w| w.num_days_from_monday())
        .unwrap_or(0);

    let cells = (1..=dataset.days_in_month())
        .filter_map(|day| day_cell(dataset, annotations, teacher, day))
        .collect();

    Some(CalendarView {
        title: dataset.title(),
        teacher,
        teacher_name: name,
        leading_blanks,
        cells,
    })
}

pub fn grid_view(dataset: &ScheduleDataset, annotations: &Annotations) -> GridView {
    let days = holidays::working_days(dataset.year, dataset.month);

    let columns = days
        .iter()
        .filter_map(|&day| {
            let weekday = holidays::weekday(dataset.year, dataset.month, day)?;
            Some(GridColumn {
                day,
                weekday: weekday_label(weekday),
                ends_week: weekday == Weekday::Fri,
            })
        })
        .collect();

    let rows = dataset
        .teachers
        .iter()
        .enumerate()
        .map(|(index, teacher)| GridRow {
            teacher: index,
            name: teacher.name.clone(),
            cells: days
                .iter()
                .filter_map(|&day| day_cell(dataset, annotations, index, day))
                .collect(),
        })
        .collect();

    GridView {
        title: dataset.title(),
        columns,
        rows,
    }
}
