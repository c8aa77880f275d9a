use crossterm::{
    event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

mod app;
mod markdown;
mod ui;

use app::App;
use concierge_config::{Config, ConfigManager, FallbackKind};
use concierge_observability::LogManager;
use concierge_session::{
    ApologyResponder, ConciergeResponder, EngineOptions, FallbackResponder, HttpQueryClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().await?;

    // stdout belongs to the terminal UI, so logs only go to the file
    let mut log_config = concierge_observability::Config::from_concierge("concierge-tui", &config);
    log_config.logging.stdout = false;
    let _log_manager = match LogManager::new(&log_config) {
        Ok(manager) => Some(manager),
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    };

    let mut app = build_app(&config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.open_widget();
    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn load_config() -> anyhow::Result<Config> {
    let manager = match std::env::var("CONCIERGE_CONFIG") {
        Ok(path) => ConfigManager::load(&PathBuf::from(path)).await?,
        Err(_) => ConfigManager::load_default().await?,
    };
    let mut config = manager.snapshot().await;

    if let Ok(url) = std::env::var("CONCIERGE_SERVER_URL") {
        config.remote.base_url = url;
    }
    ConfigManager::validate(&config)?;

    Ok(config)
}

fn build_app(config: &Config) -> App {
    let remote = &config.remote;
    let mut client = HttpQueryClient::new(&remote.base_url)
        .with_query_path(&remote.query_path)
        .with_thread_header(&remote.thread_header)
        .with_greeting(&remote.handshake_greeting);
    if let Some(timeout) = remote.timeout() {
        client = client.with_timeout(timeout);
    }

    let responder: Arc<dyn FallbackResponder> = match config.widget.fallback {
        FallbackKind::Concierge => Arc::new(ConciergeResponder),
        FallbackKind::Apology => Arc::new(ApologyResponder::default()),
    };

    let mut options = EngineOptions::default().with_rich_text(config.widget.rich_text);
    if let Some(welcome) = &config.widget.welcome_message {
        options = options.with_welcome_message(welcome);
    }

    App::new(Arc::new(client), responder, options)
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    let mut last_tick = tokio::time::Instant::now();
    let tick_rate = tokio::time::Duration::from_millis(100);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| tokio::time::Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = crossterm::event::read()? {
                if key.kind == KeyEventKind::Press && handle_key_event(app, key) {
                    return Ok(());
                }
            }
        }

        // Apply completions from background calls
        app.process_events();

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = tokio::time::Instant::now();
        }

        // let spawned calls make progress between frames
        tokio::task::yield_now().await;
    }
}

/// Returns `true` when the app should quit.
fn handle_key_event(app: &mut App, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => return true,
        KeyCode::Char('o') if ctrl => app.open_widget(),
        KeyCode::Esc => app.close_widget(),
        KeyCode::Enter => app.send_message(),
        KeyCode::Char(c) if !ctrl => app.push_input(c),
        KeyCode::Backspace => app.pop_input(),
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::PageUp => app.scroll_page_up(),
        KeyCode::PageDown => app.scroll_page_down(),
        _ => {}
    }
    false
}
