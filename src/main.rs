#![warn(clippy::all, clippy::pedantic)]

use std::io;
use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, error, info, warn};
use mineralfall::Time;
use mineralfall::app::{App, AppResult};
use mineralfall::auth::{self, PlayerIdentity};
use mineralfall::catalog::Catalog;
use mineralfall::config::{self, Config};
use mineralfall::persistence::{FileRewardStore, RewardWorker};
use mineralfall::{systems, ui};
use ratatui::{Terminal, prelude::*};

fn main() -> AppResult<()> {
    // Create log file and redirect stderr to it
    let log_path = "mineralfall.log";
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)
        .expect("Failed to create log file");

    let stderr_handle = std::io::stderr();
    let stderr_fd = stderr_handle.as_raw_fd();
    let log_file_fd = log_file.as_raw_fd();

    // Safety: We're redirecting stderr to our log file using standard POSIX operations
    unsafe {
        libc::dup2(log_file_fd, stderr_fd);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_module_path(false)
        .init();

    info!("Starting Mineralfall");

    let app_config = match config::loader::load_config_from_file() {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(err) => {
            error!("Failed to load configuration: {err}");
            Config::default()
        }
    };

    let catalog = match &app_config.catalog_path {
        Some(path) => match Catalog::load_from_file(path) {
            Ok(catalog) => {
                info!("Catalog loaded from {}", path.display());
                catalog
            }
            Err(err) => {
                error!("Failed to load catalog from {}: {err}", path.display());
                Catalog::builtin()
            }
        },
        None => Catalog::builtin(),
    };

    let identity = authenticate(&app_config);
    let rewards = identity.as_ref().and_then(|_| {
        match FileRewardStore::open(FileRewardStore::default_path()) {
            Ok(store) => Some(RewardWorker::spawn(Box::new(store))),
            Err(err) => {
                error!("Could not open reward store: {err}");
                None
            }
        }
    });

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(33); // ~30 FPS render
    let game_tick_rate = Duration::from_millis(50); // Game logic updates less often

    let app = App::new(&catalog, &app_config, identity, rewards)?;
    let res = run_app(&mut terminal, app, tick_rate, game_tick_rate);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Game error: {err:?}");
    }

    Ok(())
}

/// Verifies the Telegram launch payload from the environment. Any failure
/// degrades to an unauthenticated guest session.
fn authenticate(config: &Config) -> Option<PlayerIdentity> {
    let bot_token = std::env::var(&config.bot_token_env).ok()?;
    let init_data = std::env::var(&config.init_data_env).ok()?;
    match auth::verify_init_data(&init_data, &bot_token) {
        Ok(identity) => {
            info!(
                "Authenticated {} ({})",
                identity.display_name, identity.external_id
            );
            Some(identity)
        }
        Err(err) => {
            warn!("Launch payload rejected: {err}; playing as guest");
            None
        }
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tick_rate: Duration,
    game_tick_rate: Duration,
) -> AppResult<()> {
    let mut last_render = Instant::now();
    let mut last_game_tick = Instant::now();

    // Flush any pending input events that might be in the buffer
    while crossterm::event::poll(Duration::from_millis(0))? {
        let _ = event::read()?;
    }

    loop {
        // Draw the UI
        if last_render.elapsed() >= tick_rate {
            terminal.draw(|f| ui::render(f, &mut app))?;
            last_render = Instant::now();
        }

        // Advance the game
        if last_game_tick.elapsed() >= game_tick_rate {
            let delta_seconds = last_game_tick.elapsed().as_secs_f32();
            last_game_tick = Instant::now();

            {
                let mut time = app.world.resource_mut::<Time>();
                time.update();
            }

            if app.should_quit {
                return Ok(());
            }

            systems::game_tick_system(&mut app.world, delta_seconds);
            app.on_tick();
        }

        // Process input
        if crossterm::event::poll(Duration::from_millis(5))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    debug!("Key event: {key:?}");
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Enter if app.is_over() => {
                            info!("Starting a new round");
                            app.reset();
                        }
                        _ => {}
                    }
                }
                Event::Mouse(mouse) => {
                    if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
                        app.handle_click(mouse.column, mouse.row);
                    }
                }
                _ => {}
            }
        }
    }
}
