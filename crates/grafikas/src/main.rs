use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

use atsiuntimas::{HttpFetcher, Retriever, Settings};
use grafikas::annotations::ToggleOutcome;
use grafikas::app::App;
use grafikas::html::{self, Page};
use grafikas::server::{self, AppState};
use grafikas::store::FileStore;
use grafikas::view::{CalendarView, WEEKDAY_LABELS};

#[derive(Parser, Debug)]
#[command(name = "grafikas")]
#[command(about = "View a monthly teacher work schedule and mark substitutions")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory of the local store (overrides GRAFIKAS_DATA_DIR)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Fetch the schedule from the configured source
    Refresh,

    /// Print a teacher's calendar
    Show {
        /// Teacher index (defaults to the last selected one)
        #[arg(short, long)]
        teacher: Option<usize>,
    },

    /// Toggle the substitution mark of a day
    Toggle {
        /// Teacher index
        teacher: usize,
        /// Day of the month
        day: u32,
    },

    /// Set the schedule source: "local", a JSON URL, or a Drive/OneDrive link
    SetUrl { url: String },

    /// Generate static HTML (no server)
    Build {
        /// Output file
        #[arg(short, long, default_value = "index.html")]
        output: PathBuf,
    },
}

fn init_tracing(log_level: &str) {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    for directive in ["hyper=warn", "reqwest=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level);

    let mut settings = Settings::from_env().context("Failed to load settings")?;
    if let Some(dir) = args.data_dir {
        settings.data_dir = dir;
    }

    let store = FileStore::open(&settings.data_dir)
        .with_context(|| format!("Failed to open store in {}", settings.data_dir.display()))?;
    let mut app = App::open(store);
    let retriever = Retriever::new(
        HttpFetcher::new(settings.timeout),
        settings.relays.clone(),
        settings.local_dir.clone(),
    );

    match args.command {
        None => {
            let state = Arc::new(AppState::new(app, retriever));
            server::serve(8080, state).await?;
        }
        Some(Commands::Serve { port }) => {
            let state = Arc::new(AppState::new(app, retriever));
            server::serve(port, state).await?;
        }
        Some(Commands::Refresh) => {
            let outcome = app.refresh(&retriever).await;
            if outcome.is_error() {
                warn!("{}", outcome.notice());
                bail!("{}", outcome.notice());
            }
            info!("{}", outcome.notice());
        }
        Some(Commands::Show { teacher }) => {
            let teacher = teacher.unwrap_or_else(|| app.selected_teacher());
            match app.calendar_view(teacher) {
                Some(view) => print!("{}", render_text(&view)),
                None if app.dataset().is_none() => {
                    bail!("No data. Run `grafikas set-url <url>` and `grafikas refresh` first")
                }
                None => bail!("No teacher with index {}", teacher),
            }
            if let Some(failure) = app.last_failure() {
                println!("\nPaskutinė klaida ({}): {}", failure.at, failure.message);
            }
        }
        Some(Commands::Toggle { teacher, day }) => match app.toggle(teacher, day)? {
            ToggleOutcome::Set => info!(teacher, day, "Marked as substitution"),
            ToggleOutcome::Cleared => info!(teacher, day, "Mark cleared"),
            ToggleOutcome::Rejected(reason) => bail!("Cannot toggle: {}", reason),
        },
        Some(Commands::SetUrl { url }) => {
            atsiuntimas::RetrievalSource::classify(&url)
                .with_context(|| format!("Unusable source: {}", url))?;
            app.set_source_url(&url)?;
        }
        Some(Commands::Build { output }) => {
            let page = Page::from_app(&app, app.selected_teacher(), false);
            html::generate_html(&page, &output)?;
            info!(path = %output.display(), "HTML saved");
        }
    }

    Ok(())
}

/// Plain-text month grid for the terminal.
fn render_text(view: &CalendarView) -> String {
    let mut out = format!("{} - {}\n", view.title, view.teacher_name);
    for label in WEEKDAY_LABELS {
        out.push_str(&format!("{:>7}", label));
    }
    out.push('\n');

    let mut column = view.leading_blanks;
    out.push_str(&" ".repeat(7 * column as usize));
    for cell in &view.cells {
        let mark = if cell.editable { "*" } else { " " };
        let label = format!("{}{}{}", cell.day, mark, cell.text);
        out.push_str(&format!("{:>7}", label));
        column += 1;
        if column == 7 {
            out.push('\n');
            column = 0;
        }
    }
    if column != 0 {
        out.push('\n');
    }
    out
}
