use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::TimeDelta;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tokio::runtime::Runtime;
use tracing::info;

use blockwatch::app::{write_snapshot, App, View};
use blockwatch::ingest::note_source_error;
use blockwatch::logging::{self, LogTarget};
use blockwatch::{
    events, ui, CommandSource, DataSource, FileSource, Ingestor, Registry, Settings,
    SharedRegistry, StreamSource,
};

#[derive(Parser, Debug)]
#[command(name = "blockwatch")]
#[command(about = "Live monitor for replicated block-storage resources")]
struct Args {
    /// Tail a captured event log instead of running the event command
    #[arg(short, long, conflicts_with_all = ["connect", "command"])]
    file: Option<PathBuf>,

    /// Read event lines from a TCP endpoint (host:port)
    #[arg(short, long, conflicts_with_all = ["file", "command"])]
    connect: Option<String>,

    /// Event stream command (overrides the settings file)
    #[arg(long)]
    command: Option<String>,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Refresh interval, e.g. "1s" or "500ms"
    #[arg(short, long)]
    refresh: Option<String>,

    /// Flag connections without events for this long, e.g. "30s"
    #[arg(long)]
    stale_after: Option<String>,

    /// Samples kept per rate history
    #[arg(long)]
    history_len: Option<usize>,

    /// Print one JSON snapshot per refresh instead of running the TUI
    #[arg(long, conflicts_with = "export")]
    headless: bool,

    /// Replay --file and write the final state to this JSON file
    #[arg(short, long, requires = "file")]
    export: Option<PathBuf>,

    /// Log file used while the TUI is running
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of file and environment settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(ref command) = self.command {
            settings.command = command.clone();
        }
        if let Some(ref refresh) = self.refresh {
            settings.refresh = refresh.clone();
        }
        if let Some(ref stale_after) = self.stale_after {
            settings.stale_after = stale_after.clone();
        }
        if let Some(history_len) = self.history_len {
            settings.history_len = history_len;
        }
        if let Some(ref log_file) = self.log_file {
            settings.log_file = log_file.clone();
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;

    let stale_after = settings.stale_after()?;
    let refresh = settings.refresh()?;
    let registry = Registry::new(settings.history_len).shared();

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        logging::init(LogTarget::Stderr)?;
        let path = args.file.as_deref().context("--export requires --file")?;
        return export_to_file(path, export_path, &registry, stale_after);
    }

    let _log_guard = if args.headless {
        logging::init(LogTarget::Stderr)?
    } else {
        logging::init(LogTarget::File(&settings.log_file))?
    };

    // Sources spawn tasks onto this runtime while the UI runs on the main thread
    let rt = Runtime::new()?;
    let _enter = rt.enter();

    let (source, ui_refresh) = open_source(&rt, &args, &settings, refresh)?;
    info!(source = source.description(), "Monitoring");

    if args.headless {
        run_headless(&rt, source, registry, stale_after, refresh)
    } else {
        run_tui(source, registry, stale_after, ui_refresh)
    }
}

/// Pick the data source and how often the UI should drain it.
fn open_source(
    rt: &Runtime,
    args: &Args,
    settings: &Settings,
    refresh: Duration,
) -> Result<(Box<dyn DataSource>, Duration)> {
    if let Some(ref path) = args.file {
        return Ok((Box::new(FileSource::new(path)), refresh));
    }

    // Live sources are drained continuously
    let live = Duration::from_millis(100);

    if let Some(ref addr) = args.connect {
        let stream = rt
            .block_on(tokio::net::TcpStream::connect(addr))
            .with_context(|| format!("Failed to connect to {}", addr))?;
        info!(addr, "Connected");
        return Ok((Box::new(StreamSource::spawn(stream, addr)), live));
    }

    let source = CommandSource::spawn(&settings.command, settings.poll_command(), refresh)
        .with_context(|| format!("Failed to run {}", settings.command))?;
    Ok((Box::new(source), live))
}

/// Print one snapshot per line until interrupted.
fn run_headless(
    rt: &Runtime,
    source: Box<dyn DataSource>,
    registry: SharedRegistry,
    stale_after: TimeDelta,
    refresh: Duration,
) -> Result<()> {
    rt.block_on(async {
        tokio::select! {
            result = headless_loop(source, registry, stale_after, refresh) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                Ok(())
            }
        }
    })
}

async fn headless_loop(
    mut source: Box<dyn DataSource>,
    registry: SharedRegistry,
    stale_after: TimeDelta,
    refresh: Duration,
) -> Result<()> {
    let mut ingestor = Ingestor::default();
    let mut last_error = None;
    let mut ticker = tokio::time::interval(refresh);

    loop {
        ticker.tick().await;

        ingestor.drain_all(source.as_mut(), &registry);
        note_source_error(&mut last_error, source.error());

        let snapshot = registry.read().snapshot(stale_after);
        let mut out = io::stdout().lock();
        serde_json::to_writer(&mut out, &snapshot)?;
        writeln!(out)?;
        out.flush()?;
    }
}

/// Run the TUI with the given data source
fn run_tui(
    source: Box<dyn DataSource>,
    registry: SharedRegistry,
    stale_after: TimeDelta,
    refresh_interval: Duration,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let mut app = App::new(source, registry, stale_after);
    let _ = app.reload_data();

    let result = run_app(&mut terminal, &mut app, refresh_interval);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Resources => ui::resources::render(frame, app, chunks[2]),
                View::Replication => ui::replication::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_detail_overlay {
                ui::detail::render_overlay(frame, app, area);
            }

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    // Content starts after header (1) + tabs (1) + table border (1)
                    events::handle_mouse_event(app, mouse, 3);
                }
                _ => {}
            }
        }

        if last_refresh.elapsed() >= refresh_interval {
            let _ = app.reload_data();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Replay a captured event log and write the final state as JSON.
fn export_to_file(
    log_path: &Path,
    export_path: &Path,
    registry: &SharedRegistry,
    stale_after: TimeDelta,
) -> Result<()> {
    let mut source = FileSource::replay(log_path);
    let mut ingestor = Ingestor::default();
    let replayed = ingestor.drain_all(&mut source, registry);

    if let Some(err) = source.error() {
        if replayed == 0 {
            anyhow::bail!("Failed to read {}: {}", log_path.display(), err);
        }
    }
    if ingestor.errors() > 0 {
        info!(
            errors = ingestor.errors(),
            last = ingestor.last_error().unwrap_or_default(),
            "Some events were rejected"
        );
    }

    let snapshot = registry.read().snapshot(stale_after);
    write_snapshot(&snapshot, export_path)?;

    println!(
        "Exported {} resources ({} events) to: {}",
        snapshot.len(),
        replayed,
        export_path.display()
    );
    Ok(())
}
