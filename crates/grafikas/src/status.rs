use serde::Serialize;
use std::fmt;

/// Status code for a substitution, fetched or added locally.
pub const SUBSTITUTION: &str = "P";
/// Special leave day ("mamadienis").
pub const SPECIAL_LEAVE: &str = "M";
/// Teacher is not reachable.
pub const NO_CONTACT: &str = "DN";

/// How a (teacher, day) cell is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayCategory {
    /// Weekend or public holiday; status text is suppressed
    Weekend,
    Substitution,
    SpecialLeave,
    NoContact,
    /// Shift codes ("D1", "D2", ...) and any other unrecognized code
    Working,
    /// Nothing scheduled
    Off,
}

impl DisplayCategory {
    /// CSS class used by the HTML renderer.
    pub fn css_class(&self) -> &'static str {
        match self {
            DisplayCategory::Weekend => "weekend",
            DisplayCategory::Substitution => "pavadavimas",
            DisplayCategory::SpecialLeave => "mamadienis",
            DisplayCategory::NoContact => "no-contact",
            DisplayCategory::Working => "working",
            DisplayCategory::Off => "off",
        }
    }
}

impl fmt::Display for DisplayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_class())
    }
}

/// Result of classifying one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: DisplayCategory,
    /// Whether the substitution mark may be toggled on this cell
    pub editable: bool,
}

/// Whether a fetched status leaves room for a local substitution mark.
pub fn accepts_mark(status: &str) -> bool {
    status.is_empty() || status == SUBSTITUTION
}

/// The status shown for a cell: a mark fills an empty fetched status.
pub fn effective_status(status: &str, has_mark: bool) -> &str {
    if has_mark && status.is_empty() {
        SUBSTITUTION
    } else {
        status
    }
}

/// Classify a cell from its fetched status and calendar context.
pub fn classify(status: &str, is_weekend: bool, is_holiday: bool, has_mark: bool) -> Classification {
    if is_weekend || is_holiday {
        return Classification {
            category: DisplayCategory::Weekend,
            editable: false,
        };
    }

    let category = match effective_status(status, has_mark) {
        SUBSTITUTION => DisplayCategory::Substitution,
        SPECIAL_LEAVE => DisplayCategory::SpecialLeave,
        NO_CONTACT => DisplayCategory::NoContact,
        "" => DisplayCategory::Off,
        // "D..." shift codes and opaque codes alike
        _ => DisplayCategory::Working,
    };

    let editable = category == DisplayCategory::Off || (has_mark && accepts_mark(status));

    Classification { category, editable }
}

/// Text shown inside a cell; empty on weekends and holidays.
pub fn display_text(status: &str, is_weekend: bool, is_holiday: bool, has_mark: bool) -> String {
    if is_weekend || is_holiday {
        String::new()
    } else {
        effective_status(status, has_mark).to_string()
    }
}
