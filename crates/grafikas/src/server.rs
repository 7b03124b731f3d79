use atsiuntimas::{Fetcher, Retriever};
use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::annotations::ToggleOutcome;
use crate::app::App;
use crate::html::{self, Notice, Page};
use crate::store::LocalStore;

/// Application state shared across requests
pub struct AppState<S, F> {
    pub app: RwLock<App<S>>,
    pub retriever: Retriever<F>,
    /// Shown once on the next page load
    pub notice: Mutex<Option<Notice>>,
}

impl<S, F> AppState<S, F> {
    pub fn new(app: App<S>, retriever: Retriever<F>) -> Self {
        Self {
            app: RwLock::new(app),
            retriever,
            notice: Mutex::new(None),
        }
    }
}

pub fn router<S, F>(state: Arc<AppState<S, F>>) -> Router
where
    S: LocalStore + 'static,
    F: Fetcher + 'static,
{
    Router::new()
        .route("/", get(index_handler::<S, F>))
        .route("/toggle", post(toggle_handler::<S, F>))
        .route("/refresh", post(refresh_handler::<S, F>))
        .route("/api/data", get(data_handler::<S, F>))
        .route("/api/calendar", get(calendar_handler::<S, F>))
        .with_state(state)
}

/// Start the web server, refreshing once in the background if a source is set
pub async fn serve<S, F>(port: u16, state: Arc<AppState<S, F>>) -> anyhow::Result<()>
where
    S: LocalStore + 'static,
    F: Fetcher + 'static,
{
    if !state.app.read().await.source_url().is_empty() {
        let startup = state.clone();
        tokio::spawn(async move {
            let notice = run_refresh(&startup).await;
            *startup.notice.lock().await = Some(notice);
        });
    }

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!(%addr, "Server running");
    println!("\nServer running at http://{}", addr);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Fetch without holding the app lock, then apply the result under it.
async fn run_refresh<S: LocalStore, F: Fetcher>(state: &AppState<S, F>) -> Notice {
    let ticket = state.app.write().await.begin_refresh();
    let result = state.retriever.resolve_and_fetch(&ticket.url).await;
    let outcome = state.app.write().await.complete_refresh(ticket, result);

    Notice {
        message: outcome.notice(),
        is_error: outcome.is_error(),
    }
}

#[derive(Debug, Deserialize)]
pub struct TeacherQuery {
    pub teacher: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub teacher: usize,
    pub day: u32,
}

/// Serve the main HTML page
async fn index_handler<S: LocalStore, F: Fetcher>(
    State(state): State<Arc<AppState<S, F>>>,
    Query(query): Query<TeacherQuery>,
) -> Html<String> {
    if let Some(teacher) = query.teacher {
        if let Err(e) = state.app.write().await.select_teacher(teacher) {
            warn!(error = %e, "Failed to save selected teacher");
        }
    }

    let notice = state.notice.lock().await.take();
    let app = state.app.read().await;
    let page = Page::from_app(&*app, app.selected_teacher(), true).with_notice(notice);
    Html(html::render_page(&page).into_string())
}

async fn toggle_handler<S: LocalStore, F: Fetcher>(
    State(state): State<Arc<AppState<S, F>>>,
    Form(form): Form<ToggleForm>,
) -> Redirect {
    let outcome = state.app.write().await.toggle(form.teacher, form.day);

    let notice = match outcome {
        Ok(ToggleOutcome::Set) | Ok(ToggleOutcome::Cleared) => None,
        Ok(ToggleOutcome::Rejected(reason)) => Some(Notice {
            message: reason.to_string(),
            is_error: true,
        }),
        Err(e) => {
            warn!(error = %e, "Failed to save mark");
            Some(Notice {
                message: format!("Nepavyko išsaugoti žymos: {}", e),
                is_error: true,
            })
        }
    };
    *state.notice.lock().await = notice;

    Redirect::to(&format!("/?teacher={}", form.teacher))
}

/// Refresh from the configured source (manual trigger)
async fn refresh_handler<S: LocalStore, F: Fetcher>(
    State(state): State<Arc<AppState<S, F>>>,
) -> Redirect {
    let notice = run_refresh(&state).await;
    *state.notice.lock().await = Some(notice);
    Redirect::to("/")
}

/// Return the current dataset as JSON
async fn data_handler<S: LocalStore, F: Fetcher>(
    State(state): State<Arc<AppState<S, F>>>,
) -> Response {
    match state.app.read().await.dataset() {
        Some(dataset) => Json(dataset.as_ref().clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "no data").into_response(),
    }
}

async fn calendar_handler<S: LocalStore, F: Fetcher>(
    State(state): State<Arc<AppState<S, F>>>,
    Query(query): Query<TeacherQuery>,
) -> Response {
    let app = state.app.read().await;
    let teacher = query.teacher.unwrap_or_else(|| app.selected_teacher());
    match app.calendar_view(teacher) {
        Some(view) => Json(view).into_response(),
        None => (StatusCode::NOT_FOUND, "no data").into_response(),
    }
}
