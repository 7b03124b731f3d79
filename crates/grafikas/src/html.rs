use anyhow::Result;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

use crate::app::App;
use crate::status::DisplayCategory;
use crate::store::LocalStore;
use crate::view::{CalendarView, DayCell, GridView, WEEKDAY_LABELS};

/// A toast shown at the top of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
}

/// Everything one page render needs.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub teachers: Vec<String>,
    pub selected: usize,
    pub calendar: Option<CalendarView>,
    pub grid: Option<GridView>,
    pub notice: Option<Notice>,
    pub source_url: String,
    /// Render forms for toggling and refreshing (false for static builds)
    pub interactive: bool,
}

impl Page {
    pub fn from_app<S: LocalStore>(app: &App<S>, teacher: usize, interactive: bool) -> Self {
        let teachers = app
            .dataset()
            .map(|ds| ds.teachers.iter().map(|t| t.name.clone()).collect())
            .unwrap_or_default();

        Self {
            teachers,
            selected: teacher,
            calendar: app.calendar_view(teacher),
            grid: app.grid_view(),
            notice: None,
            source_url: app.source_url(),
            interactive,
        }
    }

    pub fn with_notice(mut self, notice: Option<Notice>) -> Self {
        self.notice = notice;
        self
    }
}

/// Write a static page to disk
pub fn generate_html(page: &Page, path: &Path) -> Result<()> {
    let html = render_page(page);
    fs::write(path, html.into_string())?;
    Ok(())
}

pub fn render_page(page: &Page) -> Markup {
    let title = page
        .calendar
        .as_ref()
        .map(|c| c.title.clone())
        .unwrap_or_else(|| "Grafikas".to_string());

    html! {
        (DOCTYPE)
        html lang="lt" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Grafikas" }
                style { (PreEscaped(CSS)) }
            }
            body {
                div.container {
                    header {
                        h1 #title { (title) }
                        @if page.interactive {
                            form.refresh method="post" action="/refresh" {
                                button type="submit" { "Atnaujinti" }
                            }
                        }
                    }
                    @if let Some(notice) = &page.notice {
                        div.toast.error[notice.is_error].success[!notice.is_error] { (notice.message) }
                    }
                    @match (&page.calendar, &page.grid) {
                        (Some(calendar), Some(grid)) => {
                            @if page.interactive {
                                (render_teacher_select(page))
                            } @else {
                                h2.teacher-name { (calendar.teacher_name) }
                            }
                            (render_calendar(calendar, page.interactive))
                            (render_grid(grid))
                        }
                        _ => {
                            div.no-data #"no-data" {
                                p { "Duomenų nėra." }
                                @if page.source_url.is_empty() {
                                    p.hint { "Nustatykite šaltinį: grafikas set-url <nuoroda>" }
                                } @else {
                                    p.hint { "Šaltinis: " (page.source_url) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn render_teacher_select(page: &Page) -> Markup {
    html! {
        form.teacher-select method="get" action="/" {
            select name="teacher" onchange="this.form.submit()" {
                @for (index, name) in page.teachers.iter().enumerate() {
                    option value=(index) selected[index == page.selected] { (name) }
                }
            }
            noscript { button type="submit" { "Rodyti" } }
        }
    }
}

fn render_calendar(calendar: &CalendarView, interactive: bool) -> Markup {
    html! {
        section.calendar #"calendar-view" {
            div.weekdays {
                @for (i, label) in WEEKDAY_LABELS.iter().enumerate() {
                    div.weekday.weekend[i >= 5] { (label) }
                }
            }
            div.days {
                @for _ in 0..calendar.leading_blanks {
                    div.day.empty-cell {}
                }
                @for cell in &calendar.cells {
                    (render_day(calendar.teacher, cell, interactive))
                }
            }
        }
    }
}

fn render_day(teacher: usize, cell: &DayCell, interactive: bool) -> Markup {
    let class = format!(
        "day {}{}",
        cell.category.css_class(),
        if cell.editable { " editable" } else { "" }
    );
    let content = html! {
        span.number { (cell.day) }
        @if !cell.text.is_empty() {
            span.status { (cell.text) }
        }
    };

    html! {
        @if interactive && cell.editable {
            form class=(class) method="post" action="/toggle" {
                input type="hidden" name="teacher" value=(teacher);
                input type="hidden" name="day" value=(cell.day);
                button type="submit" { (content) }
            }
        } @else {
            div class=(class) { (content) }
        }
    }
}

fn grid_class(category: DisplayCategory) -> &'static str {
    match category {
        DisplayCategory::Substitution => "pav",
        DisplayCategory::SpecialLeave => "mam",
        DisplayCategory::NoContact => "dnc",
        DisplayCategory::Working => "wrk",
        DisplayCategory::Weekend | DisplayCategory::Off => "",
    }
}

fn cell_class(category: DisplayCategory, ends_week: bool) -> String {
    let mut class = format!("data-cell {}", grid_class(category));
    if ends_week {
        class.push_str(" week-sep");
    }
    class
}

fn render_grid(grid: &GridView) -> Markup {
    html! {
        section.all-teachers #"all-teachers-view" {
            table.schedule-table {
                thead {
                    tr {
                        th.corner-cell { "Auklėtoja" }
                        @for column in &grid.columns {
                            th.day-header.week-sep[column.ends_week] {
                                div { (column.day) }
                                div.dn { (column.weekday) }
                            }
                        }
                    }
                }
                tbody {
                    @for row in &grid.rows {
                        tr.even[row.teacher % 2 == 0].odd[row.teacher % 2 == 1] {
                            td.teacher-cell { (row.name) }
                            @for (cell, column) in row.cells.iter().zip(&grid.columns) {
                                td class=(cell_class(cell.category, column.ends_week)) {
                                    (cell.text)
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

const CSS: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
    background: #f4f6f8;
    color: #1d2733;
    line-height: 1.4;
}

.container {
    max-width: 1100px;
    margin: 0 auto;
    padding: 24px 16px 48px;
}

header {
    display: flex;
    align-items: center;
    justify-content: space-between;
    margin-bottom: 16px;
}

h1 {
    font-size: 1.6em;
    font-weight: 700;
}

button {
    font: inherit;
    cursor: pointer;
}

.refresh button {
    padding: 6px 14px;
    border: none;
    border-radius: 6px;
    background: #2f6fde;
    color: #fff;
}

.toast {
    padding: 10px 14px;
    border-radius: 6px;
    margin-bottom: 16px;
}

.toast.success { background: #dff5e3; color: #1f6b33; }
.toast.error { background: #fde2e1; color: #8a1c17; }

.teacher-name {
    font-size: 1.2em;
    margin-bottom: 16px;
}

.teacher-select select {
    font: inherit;
    padding: 6px 10px;
    margin-bottom: 16px;
    min-width: 240px;
}

.weekdays, .days {
    display: grid;
    grid-template-columns: repeat(7, 1fr);
    gap: 4px;
}

.weekday {
    text-align: center;
    font-weight: 700;
    font-size: 0.85em;
    padding: 4px 0;
}

.weekday.weekend { color: #b03a2e; }

.day {
    min-height: 56px;
    border-radius: 6px;
    background: #fff;
    padding: 4px 6px;
    position: relative;
}

.day button {
    all: unset;
    display: block;
    width: 100%;
    height: 100%;
    cursor: pointer;
}

.day .number { font-size: 0.8em; color: #5b6775; }
.day .status { display: block; font-weight: 700; text-align: center; margin-top: 4px; }

.day.empty-cell { background: transparent; }
.day.weekend { background: #eceff2; color: #9aa5b1; }
.day.working { background: #dbe9ff; }
.day.pavadavimas { background: #ffe8b3; }
.day.mamadienis { background: #f3d9ff; }
.day.no-contact { background: #ffd6d6; }
.day.off { background: #fff; }
.day.editable { outline: 1px dashed #9aa5b1; }

.all-teachers {
    margin-top: 32px;
    overflow-x: auto;
}

.schedule-table {
    border-collapse: collapse;
    font-size: 0.8em;
    background: #fff;
}

.schedule-table th, .schedule-table td {
    border: 1px solid #e1e5ea;
    padding: 3px 5px;
    text-align: center;
}

.schedule-table .teacher-cell, .schedule-table .corner-cell {
    text-align: left;
    white-space: nowrap;
    position: sticky;
    left: 0;
    background: #fff;
}

.schedule-table tr.odd td { background: #f8f9fb; }
.schedule-table .dn { color: #5b6775; font-weight: 400; }
.schedule-table .week-sep { border-right: 2px solid #5b6775; }
.schedule-table td.pav { background: #ffe8b3; }
.schedule-table td.mam { background: #f3d9ff; }
.schedule-table td.dnc { background: #ffd6d6; }
.schedule-table td.wrk { background: #dbe9ff; }

.no-data {
    text-align: center;
    padding: 60px 20px;
    color: #5b6775;
}

.no-data .hint { margin-top: 8px; font-size: 0.9em; }
"#;
