use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use directories::ProjectDirs;
use pageview_core::config::project_dirs;
use pageview_core::{
    Command, DocumentView, FileStateStore, LinkAction, SearchResult, Session, StateStore,
    ViewerConfig, WindowPos,
};
use pageview_render::{PdfiumProvider, PooledSearchWorker};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};
use url::Url;

#[derive(Debug, Parser)]
#[command(
    name = "pageview",
    version,
    about = "Inspect documents through a continuous-scroll viewport"
)]
struct Cli {
    /// Viewer config file (TOML); defaults to the platform config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Page count, page sizes and total height
    Info { file: PathBuf },
    /// Pages visible through the viewport
    Visible {
        file: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Full-text search, starting from `--page` or the current page
    Search {
        file: PathBuf,
        query: String,
        /// Page to start from (0-based)
        #[arg(long)]
        page: Option<usize>,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Text inside the rectangle spanned by two window pixels
    Select {
        file: PathBuf,
        #[arg(long, value_parser = parse_point)]
        from: WindowPos,
        #[arg(long, value_parser = parse_point)]
        to: WindowPos,
        /// Copy the selected text to the clipboard
        #[arg(long)]
        copy: bool,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Link under a window pixel
    Link {
        file: PathBuf,
        #[arg(long, value_parser = parse_point)]
        at: WindowPos,
        #[command(flatten)]
        view: ViewArgs,
    },
}

/// Viewport overrides. Unset values come from the document's saved state.
#[derive(Debug, Clone, Args)]
struct ViewArgs {
    #[arg(long)]
    zoom: Option<f32>,
    #[arg(long, allow_hyphen_values = true)]
    offset_x: Option<f32>,
    #[arg(long, allow_hyphen_values = true)]
    offset_y: Option<f32>,
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 1000)]
    height: u32,
}

impl ViewArgs {
    fn apply(&self, view: &mut DocumentView) {
        if let Some(zoom) = self.zoom {
            view.set_zoom_level(zoom);
        }
        if let Some(offset_x) = self.offset_x {
            view.set_offset_x(offset_x);
        }
        if let Some(offset_y) = self.offset_y {
            view.set_offset_y(offset_y);
        }
    }
}

impl Action {
    fn target(&self) -> (&PathBuf, Option<&ViewArgs>) {
        match self {
            Action::Info { file } => (file, None),
            Action::Visible { file, view }
            | Action::Search { file, view, .. }
            | Action::Select { file, view, .. }
            | Action::Link { file, view, .. } => (file, Some(view)),
        }
    }
}

fn parse_point(value: &str) -> Result<WindowPos, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {value:?}"))?;
    let x = x.trim().parse::<f32>().map_err(|err| format!("bad x: {err}"))?;
    let y = y.trim().parse::<f32>().map_err(|err| format!("bad y: {err}"))?;
    Ok(WindowPos::new(x, y))
}

#[derive(Serialize)]
struct InfoReport {
    path: PathBuf,
    title: Option<String>,
    author: Option<String>,
    pages: Vec<PageReport>,
    total_height: f32,
}

#[derive(Serialize)]
struct PageReport {
    index: usize,
    width: f32,
    height: f32,
    top: f32,
}

#[derive(Serialize)]
struct VisibleReport {
    zoom_level: f32,
    offset_y: f32,
    current_page: Option<usize>,
    visible_pages: Vec<usize>,
}

#[derive(Serialize)]
struct MatchReport {
    page: usize,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl From<SearchResult> for MatchReport {
    fn from(result: SearchResult) -> Self {
        Self {
            page: result.page,
            x0: result.rect.x0,
            y0: result.rect.y0,
            x1: result.rect.x1,
            y1: result.rect.y1,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let project_dirs =
        project_dirs().ok_or_else(|| anyhow!("unable to resolve platform data directories"))?;
    let _log_guard = init_logging(&project_dirs)?;
    let config = ViewerConfig::load_or_default(cli.config.as_deref())?;

    let state_dir = project_dirs.data_local_dir().join("state");
    let store: Arc<dyn StateStore> = Arc::new(FileStateStore::new(state_dir)?);
    let worker = Arc::new(PooledSearchWorker::new());

    let (file, view_args) = cli.action.target();
    let view_size = view_args
        .map(|view| (view.width, view.height))
        .unwrap_or((800, 1000));
    let mut session = Session::new(store, worker, config.clone(), view_size);

    let provider = PdfiumProvider::new()?;
    session
        .open_with(&provider, file.clone())
        .await
        .with_context(|| format!("failed to open {:?}", file))?;

    let view = session
        .active_mut()
        .ok_or_else(|| anyhow!("no document is open"))?;
    if let Some(view_args) = view_args {
        view_args.apply(view);
    }

    match &cli.action {
        Action::Info { .. } => print_info(view, cli.json)?,
        Action::Visible { .. } => print_visible(view, cli.json)?,
        Action::Search { query, page, .. } => {
            session.apply(Command::Search {
                query: query.clone(),
                start_page: *page,
            })?;
            wait_for_search(&mut session, &config).await;
            let view = session
                .active()
                .ok_or_else(|| anyhow!("no document is open"))?;
            print_matches(view.search().results(), cli.json)?;
        }
        Action::Select { from, to, copy, .. } => {
            let text = view.select_window_range(*from, *to)?.text.clone();
            if cli.json {
                println!("{}", serde_json::to_string(&text)?);
            } else {
                println!("{text}");
            }
            if *copy && !text.is_empty() {
                let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
                clipboard.set_text(text).context("failed to copy selection")?;
            }
        }
        Action::Link { at, .. } => print_link(view, *at, cli.json)?,
    }

    session.persist()?;
    Ok(())
}

async fn wait_for_search(session: &mut Session, config: &ViewerConfig) {
    loop {
        session.poll_searches();
        match session.active().and_then(|view| view.search().is_searching()) {
            Some(percent_done) => debug!(percent_done, "searching"),
            None => break,
        }
        tokio::time::sleep(config.search_poll_interval).await;
    }
}

fn print_info(view: &DocumentView, json: bool) -> Result<()> {
    let (Some(info), Some(document)) = (view.info(), view.document()) else {
        bail!("no document is open");
    };
    let layout = document.layout();
    let report = InfoReport {
        path: info.path.clone(),
        title: info.metadata.title.clone(),
        author: info.metadata.author.clone(),
        pages: (0..layout.num_pages())
            .map(|index| PageReport {
                index,
                width: layout.page_width(index),
                height: layout.page_height(index),
                top: layout.accumulated_height(index),
            })
            .collect(),
        total_height: layout.total_height(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("{}", report.path.display());
    if let Some(title) = &report.title {
        println!("title: {title}");
    }
    if let Some(author) = &report.author {
        println!("author: {author}");
    }
    println!("pages: {}", report.pages.len());
    for page in &report.pages {
        println!(
            "  {:>4}  {:>8.2} x {:<8.2} top {:.2}",
            page.index, page.width, page.height, page.top
        );
    }
    println!("total height: {:.2}", report.total_height);
    Ok(())
}

fn print_visible(view: &DocumentView, json: bool) -> Result<()> {
    let report = VisibleReport {
        zoom_level: view.zoom_level(),
        offset_y: view.viewport().offset_y(),
        current_page: view.current_page_number(),
        visible_pages: view.visible_pages_in_view(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    let pages: Vec<String> = report.visible_pages.iter().map(usize::to_string).collect();
    println!("visible: {}", pages.join(" "));
    match report.current_page {
        Some(page) => println!("current: {page}"),
        None => println!("current: none"),
    }
    Ok(())
}

fn print_matches(results: Vec<SearchResult>, json: bool) -> Result<()> {
    let matches: Vec<MatchReport> = results.into_iter().map(MatchReport::from).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }
    for found in &matches {
        println!(
            "page {:>4}  ({:.1}, {:.1}) - ({:.1}, {:.1})",
            found.page, found.x0, found.y0, found.x1, found.y1
        );
    }
    println!("{} matches", matches.len());
    Ok(())
}

fn print_link(view: &DocumentView, at: WindowPos, json: bool) -> Result<()> {
    let Some(link) = view.link_at(at) else {
        if !json {
            println!("no link");
        } else {
            println!("null");
        }
        return Ok(());
    };

    if let LinkAction::Uri { uri } = &link.action {
        if let Err(err) = Url::parse(uri) {
            warn!(%uri, %err, "link target is not a valid URL");
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&link)?);
        return Ok(());
    }
    match &link.action {
        LinkAction::Uri { uri } => match Url::parse(uri) {
            Ok(url) => println!("uri {url}"),
            Err(_) => println!("uri {uri} (invalid)"),
        },
        LinkAction::GoTo { page, y } => println!("page {page} at y {y:.1}"),
    }
    Ok(())
}

fn init_logging(project_dirs: &ProjectDirs) -> Result<WorkerGuard> {
    let log_dir = project_dirs.data_local_dir().join("logs");
    fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, "pageview.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(guard)
}
