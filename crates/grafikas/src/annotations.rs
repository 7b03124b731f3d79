//! Locally added substitution marks ("P" on otherwise free days).

use atsiuntimas::ScheduleDataset;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info, warn};

use crate::holidays;
use crate::status::accepts_mark;
use crate::store::{LocalStore, StoreError, KEY_MARKS};

/// Identifies one marked cell. Scoped to a month, so marks of other months
/// stay stored but never show up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnotationKey {
    pub year: i32,
    pub month: u32,
    pub teacher: usize,
    pub day: u32,
}

impl AnnotationKey {
    pub fn new(year: i32, month: u32, teacher: usize, day: u32) -> Self {
        Self {
            year,
            month,
            teacher,
            day,
        }
    }

    /// Key for a cell of the given dataset.
    pub fn for_dataset(dataset: &ScheduleDataset, teacher: usize, day: u32) -> Self {
        Self::new(dataset.year, dataset.month, teacher, day)
    }

    /// Persisted form: `{year}-{month:02}_{teacher}_{day}`.
    pub fn canonical(&self) -> String {
        format!(
            "{}-{:02}_{}_{}",
            self.year, self.month, self.teacher, self.day
        )
    }

    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('_');
        let (year, month) = parts.next()?.split_once('-')?;
        let teacher = parts.next()?.parse().ok()?;
        let day = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(year.parse().ok()?, month.parse().ok()?, teacher, day))
    }
}

impl fmt::Display for AnnotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Set,
    Cleared,
    /// Nothing changed
    Rejected(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Key belongs to a different month than the loaded dataset
    OtherMonth,
    UnknownTeacher,
    InvalidDay,
    /// Weekend or holiday
    NotWorkingDay,
    /// The fetched schedule already has a real code here
    FetchedStatus(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::OtherMonth => write!(f, "day is not in the loaded month"),
            RejectReason::UnknownTeacher => write!(f, "no such teacher"),
            RejectReason::InvalidDay => write!(f, "no such day"),
            RejectReason::NotWorkingDay => write!(f, "weekend or holiday"),
            RejectReason::FetchedStatus(code) => write!(f, "day already has status {}", code),
        }
    }
}

/// The set of marks, persisted as one JSON object of `key -> true`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    marks: BTreeSet<AnnotationKey>,
}

impl Annotations {
    /// Load marks; unreadable or corrupt data counts as no marks.
    pub fn load<S: LocalStore + ?Sized>(store: &S) -> Self {
        let raw = match store.get(KEY_MARKS) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read substitution marks");
                return Self::default();
            }
        };

        let map: BTreeMap<String, bool> = match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "Stored substitution marks are corrupt, ignoring them");
                return Self::default();
            }
        };

        let marks: BTreeSet<AnnotationKey> = map
            .iter()
            .filter(|(_, set)| **set)
            .filter_map(|(key, _)| {
                let parsed = AnnotationKey::parse(key);
                if parsed.is_none() {
                    debug!(key = %key, "Skipping unrecognized mark key");
                }
                parsed
            })
            .collect();

        debug!(count = marks.len(), "Loaded substitution marks");
        Self { marks }
    }

    pub fn is_marked(&self, key: &AnnotationKey) -> bool {
        self.marks.contains(key)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Flip the mark on a cell and persist all marks.
    ///
    /// The cell is checked against `dataset` as it is now; if the fetched
    /// status has meanwhile become a real code the toggle is rejected. When
    /// persisting fails the flip is undone before the error is returned.
    pub fn toggle<S: LocalStore + ?Sized>(
        &mut self,
        store: &S,
        dataset: &ScheduleDataset,
        key: AnnotationKey,
    ) -> Result<ToggleOutcome, StoreError> {
        if let Some(reason) = check_editable(dataset, &key) {
            debug!(key = %key, reason = %reason, "Toggle rejected");
            return Ok(ToggleOutcome::Rejected(reason));
        }

        let outcome = if self.marks.remove(&key) {
            ToggleOutcome::Cleared
        } else {
            self.marks.insert(key);
            ToggleOutcome::Set
        };

        if let Err(e) = self.save(store) {
            match outcome {
                ToggleOutcome::Set => self.marks.remove(&key),
                _ => self.marks.insert(key),
            };
            return Err(e);
        }

        info!(key = %key, outcome = ?outcome, "Substitution mark toggled");
        Ok(outcome)
    }

    fn save<S: LocalStore + ?Sized>(&self, store: &S) -> Result<(), StoreError> {
        let map: BTreeMap<String, bool> = self
            .marks
            .iter()
            .map(|key| (key.canonical(), true))
            .collect();
        store.set(KEY_MARKS, &serde_json::to_string(&map)?)
    }
}

fn check_editable(dataset: &ScheduleDataset, key: &AnnotationKey) -> Option<RejectReason> {
    if key.year != dataset.year || key.month != dataset.month {
        return Some(RejectReason::OtherMonth);
    }
    let teacher = match dataset.teacher(key.teacher) {
        Some(t) => t,
        None => return Some(RejectReason::UnknownTeacher),
    };
    if key.day == 0 || key.day > dataset.days_in_month() {
        return Some(RejectReason::InvalidDay);
    }
    if !holidays::is_working_day(key.year, key.month, key.day) {
        return Some(RejectReason::NotWorkingDay);
    }
    let status = teacher.status(key.day);
    if !accepts_mark(status) {
        return Some(RejectReason::FetchedStatus(status.to_string()));
    }
    None
}
