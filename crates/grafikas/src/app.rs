//! Application state and the operations the outer surfaces call.

use atsiuntimas::{FetchError, Fetcher, Retriever, ScheduleDataset};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::annotations::{AnnotationKey, Annotations, RejectReason, ToggleOutcome};
use crate::cache::{FailureRecord, ScheduleCache};
use crate::store::{LocalStore, StoreError, KEY_SOURCE_URL, KEY_TEACHER};
use crate::view::{self, CalendarView, GridView};

/// Handed out when a refresh starts; must be returned with its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    pub generation: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New dataset is live and cached
    Updated,
    /// Refresh failed; the previous dataset stays on screen
    Stale { message: String },
    /// Refresh failed and there is nothing to show
    NoData { message: String },
    /// A newer refresh already completed, successfully or not; this result
    /// was dropped
    Superseded,
}

impl RefreshOutcome {
    /// One-line notice for the user.
    pub fn notice(&self) -> String {
        match self {
            RefreshOutcome::Updated => "Duomenys atnaujinti!".to_string(),
            RefreshOutcome::Stale { message } => {
                format!("Klaida atnaujinant. Rodomi seni duomenys. ({})", message)
            }
            RefreshOutcome::NoData { message } => format!("Klaida: {}", message),
            RefreshOutcome::Superseded => "Atnaujinimas pasenęs, praleistas.".to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            RefreshOutcome::Stale { .. } | RefreshOutcome::NoData { .. }
        )
    }
}

/// Everything the viewer knows, owned in one place.
///
/// The dataset sits behind an `Arc` and is swapped whole on refresh, so a
/// reader holding the old `Arc` keeps a consistent month.
pub struct App<S> {
    store: S,
    dataset: Option<Arc<ScheduleDataset>>,
    annotations: Annotations,
    selected_teacher: usize,
    issued_generation: u64,
    completed_generation: u64,
}

impl<S: LocalStore> App<S> {
    /// Restore state from the store. Nothing here fails: unreadable values
    /// fall back to defaults.
    pub fn open(store: S) -> Self {
        let dataset = ScheduleCache::new(&store).load().map(Arc::new);
        let annotations = Annotations::load(&store);
        let selected_teacher = store
            .get(KEY_TEACHER)
            .ok()
            .flatten()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);

        info!(
            cached = dataset.is_some(),
            marks = annotations.len(),
            teacher = selected_teacher,
            "State restored"
        );

        Self {
            store,
            dataset,
            annotations,
            selected_teacher,
            issued_generation: 0,
            completed_generation: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn dataset(&self) -> Option<Arc<ScheduleDataset>> {
        self.dataset.clone()
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn last_failure(&self) -> Option<FailureRecord> {
        ScheduleCache::new(&self.store).last_failure()
    }

    pub fn source_url(&self) -> String {
        self.store
            .get(KEY_SOURCE_URL)
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str::<String>(&raw).ok())
            .unwrap_or_default()
    }

    pub fn set_source_url(&mut self, url: &str) -> Result<(), StoreError> {
        let url = url.trim();
        self.store
            .set(KEY_SOURCE_URL, &serde_json::to_string(url)?)?;
        info!(url = %url, "Source URL saved");
        Ok(())
    }

    /// Selected teacher, clamped to the current dataset.
    pub fn selected_teacher(&self) -> usize {
        match &self.dataset {
            Some(ds) if self.selected_teacher < ds.teachers.len() => self.selected_teacher,
            _ => 0,
        }
    }

    pub fn select_teacher(&mut self, index: usize) -> Result<(), StoreError> {
        self.selected_teacher = index;
        self.store.set(KEY_TEACHER, &index.to_string())
    }

    /// Start a refresh. The caller fetches without holding the app and then
    /// passes the result to [`App::complete_refresh`].
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued_generation += 1;
        let ticket = RefreshTicket {
            generation: self.issued_generation,
            url: self.source_url(),
        };
        debug!(generation = ticket.generation, url = %ticket.url, "Refresh started");
        ticket
    }

    /// Apply a finished refresh.
    ///
    /// A result is dropped when a newer refresh has already completed, with
    /// either outcome. Failures never touch the cached dataset; they are
    /// recorded and the previous dataset, if any, stays live.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<ScheduleDataset, FetchError>,
    ) -> RefreshOutcome {
        if ticket.generation <= self.completed_generation {
            debug!(
                generation = ticket.generation,
                completed = self.completed_generation,
                "Dropping superseded refresh"
            );
            return RefreshOutcome::Superseded;
        }
        self.completed_generation = ticket.generation;

        let cache = ScheduleCache::new(&self.store);
        let error = match result {
            Ok(dataset) => match cache.save(&dataset) {
                Ok(()) => {
                    info!(
                        generation = ticket.generation,
                        title = %dataset.title(),
                        teachers = dataset.teachers.len(),
                        "Dataset replaced"
                    );
                    self.dataset = Some(Arc::new(dataset));
                    return RefreshOutcome::Updated;
                }
                Err(e) => format!("nepavyko išsaugoti duomenų: {}", e),
            },
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Refresh failed");
                e.to_string()
            }
        };

        if let Err(e) = cache.record_failure(&error) {
            warn!(error = %e, "Failed to record refresh failure");
        }

        match &self.dataset {
            Some(_) => RefreshOutcome::Stale { message: error },
            None => RefreshOutcome::NoData { message: error },
        }
    }

    /// Fetch and apply in one go, for callers that own the app exclusively.
    pub async fn refresh<F: Fetcher>(&mut self, retriever: &Retriever<F>) -> RefreshOutcome {
        let ticket = self.begin_refresh();
        let result = retriever.resolve_and_fetch(&ticket.url).await;
        self.complete_refresh(ticket, result)
    }

    /// Toggle the substitution mark of a teacher's day in the current month.
    pub fn toggle(&mut self, teacher: usize, day: u32) -> Result<ToggleOutcome, StoreError> {
        let Some(dataset) = self.dataset.clone() else {
            return Ok(ToggleOutcome::Rejected(RejectReason::OtherMonth));
        };
        let key = AnnotationKey::for_dataset(&dataset, teacher, day);
        self.annotations.toggle(&self.store, &dataset, key)
    }

    pub fn calendar_view(&self, teacher: usize) -> Option<CalendarView> {
        let dataset = self.dataset.as_ref()?;
        view::calendar_view(dataset, &self.annotations, teacher)
    }

    pub fn grid_view(&self) -> Option<GridView> {
        let dataset = self.dataset.as_ref()?;
        Some(view::grid_view(dataset, &self.annotations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::DisplayCategory;
    use crate::store::MemoryStore;
    use atsiuntimas::{AttemptError, Teacher};

    fn dataset(month: u32) -> ScheduleDataset {
        let mut ona = Teacher::new("Ona");
        ona.schedule.insert(8, "DN".to_string());
        ScheduleDataset {
            year: 2025,
            month,
            month_name: String::new(),
            teachers: vec![ona, Teacher::new("Rasa")],
        }
    }

    fn transport_error() -> FetchError {
        FetchError::Transport {
            attempts: 9,
            url: "https://corsproxy.io/".to_string(),
            last: AttemptError::Status(503),
        }
    }

    #[test]
    fn test_open_empty_store() {
        let app = App::open(MemoryStore::new());
        assert!(app.dataset().is_none());
        assert_eq!(app.source_url(), "");
        assert_eq!(app.selected_teacher(), 0);
        assert!(app.calendar_view(0).is_none());
    }

    #[test]
    fn test_successful_refresh_replaces_and_caches() {
        let mut app = App::open(MemoryStore::new());

        let ticket = app.begin_refresh();
        let outcome = app.complete_refresh(ticket, Ok(dataset(4)));

        assert_eq!(outcome, RefreshOutcome::Updated);
        assert_eq!(app.dataset().unwrap().month, 4);
        assert_eq!(
            ScheduleCache::new(app.store()).load(),
            Some(dataset(4))
        );
    }

    #[test]
    fn test_failed_refresh_keeps_cached_dataset() {
        let mut app = App::open(MemoryStore::new());
        let t = app.begin_refresh();
        app.complete_refresh(t, Ok(dataset(4)));

        let t = app.begin_refresh();
        let outcome = app.complete_refresh(t, Err(transport_error()));

        assert!(matches!(outcome, RefreshOutcome::Stale { .. }));
        assert!(outcome.is_error());
        assert_eq!(app.dataset().unwrap().month, 4);
        assert!(app.last_failure().unwrap().message.contains("503"));
    }

    #[test]
    fn test_failed_refresh_without_cache_is_no_data() {
        let mut app = App::open(MemoryStore::new());

        let t = app.begin_refresh();
        let outcome = app.complete_refresh(t, Err(FetchError::Schema("missing field 'teachers'".into())));

        match outcome {
            RefreshOutcome::NoData { message } => assert!(message.contains("teachers")),
            other => panic!("expected no-data, got {:?}", other),
        }
        assert!(ScheduleCache::new(app.store()).load().is_none());
    }

    #[test]
    fn test_superseded_refresh_is_dropped() {
        let mut app = App::open(MemoryStore::new());

        let older = app.begin_refresh();
        let newer = app.begin_refresh();
        assert_eq!(app.complete_refresh(newer, Ok(dataset(5))), RefreshOutcome::Updated);

        let outcome = app.complete_refresh(older, Ok(dataset(4)));

        assert_eq!(outcome, RefreshOutcome::Superseded);
        assert_eq!(app.dataset().unwrap().month, 5);
        assert_eq!(ScheduleCache::new(app.store()).load().unwrap().month, 5);
    }

    #[test]
    fn test_older_success_dropped_after_newer_failure() {
        let mut app = App::open(MemoryStore::new());

        let older = app.begin_refresh();
        let newer = app.begin_refresh();
        assert!(matches!(
            app.complete_refresh(newer, Err(transport_error())),
            RefreshOutcome::NoData { .. }
        ));

        let outcome = app.complete_refresh(older, Ok(dataset(4)));

        assert_eq!(outcome, RefreshOutcome::Superseded);
        assert!(app.dataset().is_none());
        assert!(ScheduleCache::new(app.store()).load().is_none());
        assert!(app.last_failure().unwrap().message.contains("503"));
    }

    #[test]
    fn test_failure_after_success_keeps_generation_order() {
        let mut app = App::open(MemoryStore::new());
        let first = app.begin_refresh();
        app.complete_refresh(first, Ok(dataset(4)));

        let failed = app.begin_refresh();
        app.complete_refresh(failed, Err(transport_error()));
        let next = app.begin_refresh();

        assert_eq!(app.complete_refresh(next, Ok(dataset(5))), RefreshOutcome::Updated);
        assert_eq!(app.dataset().unwrap().month, 5);
        assert!(app.last_failure().is_none());
    }

    /// Keeps values but refuses to delete them.
    struct NoRemoveStore(MemoryStore);

    impl LocalStore for NoRemoveStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: key.into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    #[test]
    fn test_refresh_applies_when_old_failure_cannot_be_cleared() {
        let mut app = App::open(NoRemoveStore(MemoryStore::new()));
        let t = app.begin_refresh();
        app.complete_refresh(t, Err(transport_error()));

        let t = app.begin_refresh();
        let outcome = app.complete_refresh(t, Ok(dataset(4)));

        assert_eq!(outcome, RefreshOutcome::Updated);
        assert_eq!(app.dataset().unwrap().month, 4);
        assert_eq!(ScheduleCache::new(app.store()).load().unwrap().month, 4);
    }

    #[test]
    fn test_state_survives_reopen() {
        let mut app = App::open(MemoryStore::new());
        app.set_source_url("  https://example.com/g.json ").unwrap();
        let t = app.begin_refresh();
        app.complete_refresh(t, Ok(dataset(4)));
        app.select_teacher(1).unwrap();
        app.toggle(1, 7).unwrap();

        let reopened = App::open(app.store);

        assert_eq!(reopened.source_url(), "https://example.com/g.json");
        assert_eq!(reopened.selected_teacher(), 1);
        assert_eq!(reopened.dataset().unwrap().month, 4);
        assert!(reopened
            .annotations()
            .is_marked(&AnnotationKey::new(2025, 4, 1, 7)));
    }

    #[test]
    fn test_begin_refresh_carries_url() {
        let mut app = App::open(MemoryStore::new());
        app.set_source_url("local").unwrap();

        let ticket = app.begin_refresh();
        assert_eq!(ticket.url, "local");
        assert_eq!(ticket.generation, 1);
    }

    #[test]
    fn test_selected_teacher_clamped() {
        let mut app = App::open(MemoryStore::new());
        let t = app.begin_refresh();
        app.complete_refresh(t, Ok(dataset(4)));

        app.select_teacher(7).unwrap();
        assert_eq!(app.selected_teacher(), 0);
    }

    #[test]
    fn test_toggle_without_dataset_rejected() {
        let mut app = App::open(MemoryStore::new());
        assert!(matches!(
            app.toggle(0, 7).unwrap(),
            ToggleOutcome::Rejected(_)
        ));
    }

    #[test]
    fn test_toggle_revalidates_against_new_dataset() {
        let mut app = App::open(MemoryStore::new());
        let t = app.begin_refresh();
        app.complete_refresh(t, Ok(dataset(4)));
        assert_eq!(app.toggle(0, 9).unwrap(), ToggleOutcome::Set);

        // The day gets a real code in the next fetch
        let mut updated = dataset(4);
        updated.teachers[0].schedule.insert(9, "D1".to_string());
        let t = app.begin_refresh();
        app.complete_refresh(t, Ok(updated));

        let cell = &app.calendar_view(0).unwrap().cells[8];
        assert_eq!(cell.category, DisplayCategory::Working);
        assert!(!cell.editable);
        assert!(matches!(
            app.toggle(0, 9).unwrap(),
            ToggleOutcome::Rejected(RejectReason::FetchedStatus(_))
        ));
    }

    #[test]
    fn test_marks_hidden_in_other_month() {
        let mut app = App::open(MemoryStore::new());
        let t = app.begin_refresh();
        app.complete_refresh(t, Ok(dataset(4)));
        app.toggle(0, 7).unwrap();

        let t = app.begin_refresh();
        app.complete_refresh(t, Ok(dataset(5)));

        // 2025-05-07 is a Wednesday with no fetched status
        let cell = &app.calendar_view(0).unwrap().cells[6];
        assert_eq!(cell.category, DisplayCategory::Off);
        assert_eq!(app.annotations().len(), 1);
    }

    #[test]
    fn test_notice_texts() {
        assert_eq!(RefreshOutcome::Updated.notice(), "Duomenys atnaujinti!");
        assert!(RefreshOutcome::NoData {
            message: "x".to_string()
        }
        .notice()
        .starts_with("Klaida"));
    }
}
