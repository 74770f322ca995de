mod net;
mod state;
mod tick;
mod tui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ed25519_dalek::SigningKey;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use trek::{crypto, persist, Galaxy, World, DEFAULT_PORT, GALAXY_FILE, MASTER_KEY_ENV};

use state::Shared;

#[derive(Parser)]
#[command(name = "trek-server")]
#[command(about = "Authoritative galaxy simulation server")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(long, default_value = GALAXY_FILE, help = "Galaxy snapshot path")]
    data: PathBuf,

    #[arg(long)]
    headless: bool,

    #[arg(short = 'd', long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let Ok(key_value) = std::env::var(MASTER_KEY_ENV) else {
        bail!("subspace key ({MASTER_KEY_ENV}) not found in environment; refusing to start");
    };
    let master_key = crypto::master_key_from_env(&key_value);
    let signing = SigningKey::generate(&mut rand::rngs::OsRng);

    let galaxy = match persist::load(&args.data) {
        Ok(galaxy) => {
            log::info!("persistent galaxy loaded from {}", args.data.display());
            galaxy
        }
        Err(err) => {
            log::warn!("snapshot unavailable ({err}); generating a fresh galaxy");
            let galaxy = Galaxy::generate();
            if let Err(err) = persist::save(&galaxy, &args.data) {
                log::error!("initial snapshot write failed: {err}");
            }
            galaxy
        }
    };
    let world = World::new(galaxy);

    let listener = net::bind(&args.bind, args.port)?;
    log::info!("trek server listening on {}:{}", args.bind, args.port);

    let shared = Arc::new(Shared::new(world, master_key, signing, args.data.clone()));

    let tick_shared = Arc::clone(&shared);
    let tick_handle = std::thread::Builder::new()
        .name("tick".to_string())
        .spawn(move || tick::run(tick_shared))?;

    let net_shared = Arc::clone(&shared);
    let net_handle = std::thread::Builder::new()
        .name("reactor".to_string())
        .spawn(move || {
            if let Err(err) = net::run(net_shared, listener) {
                log::error!("network reactor failed: {err}");
            }
        })?;

    if args.headless {
        while shared.is_running() {
            std::thread::sleep(Duration::from_millis(250));
        }
    } else {
        run_dashboard(&shared)?;
        shared.shutdown();
    }

    let _ = tick_handle.join();
    let _ = net_handle.join();
    log::info!("server shut down");
    Ok(())
}

fn run_dashboard(shared: &Shared) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    while shared.is_running() {
        let stats = shared.stats();
        terminal.draw(|frame| tui::render(frame, &stats))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                {
                    break;
                }
            }
        }
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;
    Ok(())
}
